//! Identifier formats used across the club service.
//!
//! Every entity key is a lowercase prefix followed by exactly twelve ASCII
//! digits, e.g. `club-123412341234`. Student and admin identities share the
//! same shape and double as the caller identity carried in access tokens.

use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;

use crate::error::CoreError;

/// Number of digits after the prefix of every identifier.
pub const ID_DIGITS: usize = 12;

pub const CLUB_PREFIX: &str = "club";
pub const RECRUITMENT_PREFIX: &str = "recruitment";
pub const STUDENT_PREFIX: &str = "student";
pub const ADMIN_PREFIX: &str = "admin";

static CLUB_UUID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^club-\d{12}$").expect("valid regex"));

static RECRUITMENT_UUID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^recruitment-\d{12}$").expect("valid regex"));

static STUDENT_UUID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^student-\d{12}$").expect("valid regex"));

static ADMIN_UUID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^admin-\d{12}$").expect("valid regex"));

pub fn is_club_uuid(value: &str) -> bool {
    CLUB_UUID_RE.is_match(value)
}

pub fn is_recruitment_uuid(value: &str) -> bool {
    RECRUITMENT_UUID_RE.is_match(value)
}

pub fn is_student_uuid(value: &str) -> bool {
    STUDENT_UUID_RE.is_match(value)
}

pub fn is_admin_uuid(value: &str) -> bool {
    ADMIN_UUID_RE.is_match(value)
}

/// A club leader may be either a student or an admin account.
pub fn is_leader_uuid(value: &str) -> bool {
    is_student_uuid(value) || is_admin_uuid(value)
}

pub fn validate_club_uuid(value: &str) -> Result<(), CoreError> {
    check(is_club_uuid(value), "club_uuid", value)
}

pub fn validate_recruitment_uuid(value: &str) -> Result<(), CoreError> {
    check(is_recruitment_uuid(value), "recruitment_uuid", value)
}

pub fn validate_student_uuid(value: &str) -> Result<(), CoreError> {
    check(is_student_uuid(value), "student_uuid", value)
}

pub fn validate_leader_uuid(value: &str) -> Result<(), CoreError> {
    check(is_leader_uuid(value), "leader_uuid", value)
}

/// Members share the leader pattern: an admin leading a club is also listed
/// among its members.
pub fn validate_member_uuid(value: &str) -> Result<(), CoreError> {
    check(is_leader_uuid(value), "student_uuid", value)
}

fn check(ok: bool, field: &str, value: &str) -> Result<(), CoreError> {
    if ok {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{field} has an invalid format: '{value}'"
        )))
    }
}

/// Generate a fresh random identifier with the given prefix.
pub fn generate(prefix: &str) -> String {
    let mut rng = rand::rng();
    let digits: String = (0..ID_DIGITS)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect();
    format!("{prefix}-{digits}")
}

pub fn generate_club_uuid() -> String {
    generate(CLUB_PREFIX)
}

pub fn generate_recruitment_uuid() -> String {
    generate(RECRUITMENT_PREFIX)
}
