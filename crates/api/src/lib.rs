pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod state;
