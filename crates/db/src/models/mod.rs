//! Row types and DTOs for the five club tables.

pub mod club;
pub mod club_inform;
pub mod club_member;
pub mod club_recruitment;
pub mod recruit_member;

/// `true` when an optional revision field carries a usable value.
///
/// Empty strings count as "not provided" so clients can send blank form
/// fields without wiping stored values.
pub(crate) fn is_provided(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}
