//! Recruit member entity model and DTOs.
//!
//! A recruit member row describes one open position of a recruitment:
//! how many students of a given grade and field the club is looking for.

use club_core::error::CoreError;
use club_core::ids;
use club_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lowest and highest school grade a recruitment may target.
pub const MIN_GRADE: i32 = 1;
pub const MAX_GRADE: i32 = 3;

/// A row from the `recruit_member` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct RecruitMember {
    pub recruitment_uuid: String,
    pub grade: i32,
    pub field: String,
    pub number: i32,
    pub created_at: Timestamp,
}

/// DTO for adding a position to a recruitment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateRecruitMember {
    pub recruitment_uuid: String,
    pub grade: i32,
    pub field: String,
    pub number: i32,
}

impl CreateRecruitMember {
    pub fn validate(&self) -> Result<(), CoreError> {
        ids::validate_recruitment_uuid(&self.recruitment_uuid)?;
        if !(MIN_GRADE..=MAX_GRADE).contains(&self.grade) {
            return Err(CoreError::Validation(format!(
                "grade must be between {MIN_GRADE} and {MAX_GRADE}, got {}",
                self.grade
            )));
        }
        if self.field.trim().is_empty() {
            return Err(CoreError::Validation("field must not be empty".into()));
        }
        if self.number <= 0 {
            return Err(CoreError::Validation(format!(
                "number must be positive, got {}",
                self.number
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(grade: i32, number: i32) -> CreateRecruitMember {
        CreateRecruitMember {
            recruitment_uuid: "recruitment-000000000001".into(),
            grade,
            field: "SW".into(),
            number,
        }
    }

    #[test]
    fn grade_must_be_in_range() {
        assert!(position(1, 2).validate().is_ok());
        assert!(position(3, 2).validate().is_ok());
        assert!(position(0, 2).validate().is_err());
        assert!(position(4, 2).validate().is_err());
    }

    #[test]
    fn number_must_be_positive() {
        assert!(position(2, 0).validate().is_err());
    }
}
