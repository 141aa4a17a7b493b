//! Club member entity model and DTOs.

use club_core::error::CoreError;
use club_core::ids;
use club_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `club_member` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ClubMember {
    pub club_uuid: String,
    pub student_uuid: String,
    pub created_at: Timestamp,
}

/// DTO for adding a student to a club.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateClubMember {
    pub club_uuid: String,
    pub student_uuid: String,
}

impl CreateClubMember {
    pub fn validate(&self) -> Result<(), CoreError> {
        ids::validate_club_uuid(&self.club_uuid)?;
        ids::validate_member_uuid(&self.student_uuid)
    }

    /// Value reported for the composite `(club_uuid, student_uuid)` key,
    /// formatted the way the database reports it.
    pub fn key_value(&self) -> String {
        format!("{}, {}", self.club_uuid, self.student_uuid)
    }
}
