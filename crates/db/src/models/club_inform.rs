//! Club inform entity model and DTOs.
//!
//! The descriptive half of a club: name, concept, where it meets. Exactly
//! one inform row exists per club, keyed by `club_uuid`.

use club_core::error::CoreError;
use club_core::ids;
use club_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::is_provided;

/// A row from the `club_inform` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ClubInform {
    pub club_uuid: String,
    pub name: String,
    pub club_concept: String,
    pub introduction: String,
    pub field: String,
    pub location: String,
    pub floor: String,
    pub link: String,
    pub logo_uri: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a club inform.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateClubInform {
    pub club_uuid: String,
    pub name: String,
    pub club_concept: String,
    #[serde(default)]
    pub introduction: String,
    pub field: String,
    pub location: String,
    pub floor: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub logo_uri: String,
}

impl CreateClubInform {
    pub fn validate(&self) -> Result<(), CoreError> {
        ids::validate_club_uuid(&self.club_uuid)?;
        for (field, value) in [
            ("name", &self.name),
            ("club_concept", &self.club_concept),
            ("field", &self.field),
            ("location", &self.location),
            ("floor", &self.floor),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::Validation(format!("{field} must not be empty")));
            }
        }
        Ok(())
    }
}

/// Partial update for a club inform. Only provided, non-empty fields are
/// written.
///
/// `club_uuid` exists only so attempts to re-key an inform can be detected
/// and rejected; it is never written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClubInformRevision {
    pub club_uuid: Option<String>,
    pub name: Option<String>,
    pub club_concept: Option<String>,
    pub introduction: Option<String>,
    pub field: Option<String>,
    pub location: Option<String>,
    pub floor: Option<String>,
    pub link: Option<String>,
    pub logo_uri: Option<String>,
}

impl ClubInformRevision {
    /// Reject revisions that try to change an immutable key.
    pub fn validate(&self) -> Result<(), CoreError> {
        if is_provided(&self.club_uuid) {
            return Err(CoreError::Validation(
                "club_uuid of a club inform cannot be changed".into(),
            ));
        }
        Ok(())
    }

    /// Field mask: the `(column, value)` pairs this revision sets.
    pub fn changes(&self) -> Vec<(&'static str, &str)> {
        [
            ("name", &self.name),
            ("club_concept", &self.club_concept),
            ("introduction", &self.introduction),
            ("field", &self.field),
            ("location", &self.location),
            ("floor", &self.floor),
            ("link", &self.link),
            ("logo_uri", &self.logo_uri),
        ]
        .into_iter()
        .filter_map(|(column, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (column, v))
        })
        .collect()
    }

    pub fn provided_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|v| !v.is_empty())
    }

    pub fn provided_location(&self) -> Option<&str> {
        self.location.as_deref().filter(|v| !v.is_empty())
    }
}

/// Optional filter for club listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClubInformFilter {
    /// Exact match on the club's field of activity.
    Field(String),
    /// Case-insensitive substring match on the club name.
    Name(String),
}

/// One page of a club listing, newest update first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InformPage {
    pub offset: i64,
    pub limit: i64,
    pub filter: Option<ClubInformFilter>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changes_skip_missing_and_empty_fields() {
        let revision = ClubInformRevision {
            name: Some("DMS".into()),
            club_concept: Some(String::new()),
            floor: Some("3".into()),
            ..Default::default()
        };
        assert_eq!(revision.changes(), vec![("name", "DMS"), ("floor", "3")]);
    }

    #[test]
    fn club_uuid_cannot_be_revised() {
        let revision = ClubInformRevision {
            club_uuid: Some("club-000000000002".into()),
            ..Default::default()
        };
        assert!(revision.validate().is_err());

        let blank = ClubInformRevision {
            club_uuid: Some(String::new()),
            ..Default::default()
        };
        assert!(blank.validate().is_ok());
    }
}
