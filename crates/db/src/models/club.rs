//! Club entity model and DTOs.

use club_core::error::CoreError;
use club_core::ids;
use club_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `club` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Club {
    pub uuid: String,
    pub leader_uuid: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a club.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateClub {
    pub uuid: String,
    pub leader_uuid: String,
}

impl CreateClub {
    pub fn validate(&self) -> Result<(), CoreError> {
        ids::validate_club_uuid(&self.uuid)?;
        ids::validate_leader_uuid(&self.leader_uuid)
    }
}
