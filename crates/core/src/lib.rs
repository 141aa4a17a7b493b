//! Pure domain logic for the club service.
//!
//! Identifier formats, caller roles, domain response codes and trace
//! context parsing. Nothing in this crate performs I/O.

pub mod codes;
pub mod error;
pub mod ids;
pub mod paging;
pub mod roles;
pub mod trace;
pub mod types;
