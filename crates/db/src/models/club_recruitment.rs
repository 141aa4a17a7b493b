//! Club recruitment entity model and DTOs.

use club_core::error::CoreError;
use club_core::ids;
use club_core::types::{Period, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::is_provided;

/// A row from the `club_recruitment` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ClubRecruitment {
    pub uuid: String,
    pub club_uuid: String,
    pub recruit_concept: String,
    pub start_period: Option<Period>,
    pub end_period: Option<Period>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for opening a recruitment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateClubRecruitment {
    pub uuid: String,
    pub club_uuid: String,
    pub recruit_concept: String,
    pub start_period: Option<Period>,
    pub end_period: Option<Period>,
}

impl CreateClubRecruitment {
    pub fn validate(&self) -> Result<(), CoreError> {
        ids::validate_recruitment_uuid(&self.uuid)?;
        ids::validate_club_uuid(&self.club_uuid)?;
        if self.recruit_concept.trim().is_empty() {
            return Err(CoreError::Validation(
                "recruit_concept must not be empty".into(),
            ));
        }
        validate_period(self.start_period, self.end_period)
    }
}

/// How a revision treats the recruitment period.
///
/// Periods are always written as a pair so a recruitment never ends up
/// with only one bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PeriodChange {
    /// Leave both bounds as stored.
    #[default]
    Keep,
    /// Replace both bounds.
    Set { start: Period, end: Period },
    /// Turn the recruitment into an open-ended one (both bounds NULL).
    Clear,
}

impl PeriodChange {
    /// Whether a recruitment is current on `today` once this change is
    /// applied. A kept period never changes the answer, so it is `false`.
    pub fn opens_on(&self, today: Period) -> bool {
        match self {
            PeriodChange::Keep => false,
            PeriodChange::Set { end, .. } => *end >= today,
            PeriodChange::Clear => true,
        }
    }
}

/// Partial update for a recruitment.
///
/// `uuid` and `club_uuid` exist only so attempts to re-key the row can be
/// rejected; they are never written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecruitmentRevision {
    pub uuid: Option<String>,
    pub club_uuid: Option<String>,
    pub recruit_concept: Option<String>,
    pub period: PeriodChange,
}

impl RecruitmentRevision {
    pub fn validate(&self) -> Result<(), CoreError> {
        if is_provided(&self.uuid) {
            return Err(CoreError::Validation(
                "uuid of a recruitment cannot be changed".into(),
            ));
        }
        if is_provided(&self.club_uuid) {
            return Err(CoreError::Validation(
                "club_uuid of a recruitment cannot be changed".into(),
            ));
        }
        if let PeriodChange::Set { start, end } = self.period {
            validate_period(Some(start), Some(end))?;
        }
        Ok(())
    }

    pub fn provided_concept(&self) -> Option<&str> {
        self.recruit_concept.as_deref().filter(|v| !v.is_empty())
    }
}

fn validate_period(start: Option<Period>, end: Option<Period>) -> Result<(), CoreError> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => Err(CoreError::Validation(format!(
            "start_period {start} is after end_period {end}"
        ))),
        (Some(_), None) | (None, Some(_)) => Err(CoreError::Validation(
            "start_period and end_period must be given together".into(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn date(d: u32) -> Period {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn create(start: Option<Period>, end: Option<Period>) -> CreateClubRecruitment {
        CreateClubRecruitment {
            uuid: "recruitment-000000000001".into(),
            club_uuid: "club-000000000001".into(),
            recruit_concept: "backend developers".into(),
            start_period: start,
            end_period: end,
        }
    }

    #[test]
    fn period_bounds_come_in_pairs() {
        assert!(create(None, None).validate().is_ok());
        assert!(create(Some(date(1)), Some(date(20))).validate().is_ok());
        assert!(create(Some(date(1)), None).validate().is_err());
        assert!(create(Some(date(20)), Some(date(1))).validate().is_err());
    }

    #[test]
    fn only_open_ended_or_unfinished_periods_open() {
        let today = date(10);
        assert!(!PeriodChange::Keep.opens_on(today));
        assert!(PeriodChange::Clear.opens_on(today));
        assert!(PeriodChange::Set { start: date(1), end: date(10) }.opens_on(today));
        assert!(!PeriodChange::Set { start: date(1), end: date(9) }.opens_on(today));
    }

    #[test]
    fn revision_rejects_key_changes() {
        let revision = RecruitmentRevision {
            club_uuid: Some("club-000000000009".into()),
            ..Default::default()
        };
        assert!(revision.validate().is_err());

        let revision = RecruitmentRevision {
            uuid: Some("recruitment-000000000009".into()),
            ..Default::default()
        };
        assert!(revision.validate().is_err());
    }

    #[test]
    fn revision_checks_new_period() {
        let revision = RecruitmentRevision {
            period: PeriodChange::Set {
                start: date(10),
                end: date(2),
            },
            ..Default::default()
        };
        assert!(revision.validate().is_err());
    }
}
