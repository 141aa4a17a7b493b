//! Handlers for club recruitments and their open positions.

use axum::extract::State;
use club_core::codes::DomainCode;
use club_core::ids;
use club_core::roles::Capability;
use club_core::types::{Period, Timestamp};
use club_db::models::club_recruitment::{
    ClubRecruitment, CreateClubRecruitment, PeriodChange, RecruitmentRevision,
};
use club_db::models::recruit_member::{CreateRecruitMember, RecruitMember};
use club_db::ClubAccessor;
use serde::{Deserialize, Serialize};

use super::{require_club, require_recruitment};
use crate::context::RequestContext;
use crate::error::{Failure, OpResult};
use crate::extract::{Json, Path};
use crate::response::Success;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// One open position: `number` students of `grade` in `field`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub grade: i32,
    pub field: String,
    pub number: i32,
}

impl From<RecruitMember> for Position {
    fn from(member: RecruitMember) -> Self {
        Self {
            grade: member.grade,
            field: member.field,
            number: member.number,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRecruitmentRequest {
    pub recruit_concept: String,
    pub start_period: Option<Period>,
    pub end_period: Option<Period>,
    #[serde(default)]
    pub recruit_members: Vec<Position>,
}

#[derive(Debug, Serialize)]
pub struct RecruitmentRegistered {
    pub recruitment_uuid: String,
}

/// Partial update. Send both period bounds to replace them, or
/// `clear_period` to make the recruitment open-ended. A supplied
/// `recruit_members` list replaces every existing position.
#[derive(Debug, Default, Deserialize)]
pub struct ModifyRecruitmentRequest {
    pub uuid: Option<String>,
    pub club_uuid: Option<String>,
    pub recruit_concept: Option<String>,
    pub start_period: Option<Period>,
    pub end_period: Option<Period>,
    #[serde(default)]
    pub clear_period: bool,
    pub recruit_members: Option<Vec<Position>>,
}

impl ModifyRecruitmentRequest {
    fn period_change(&self) -> OpResult<PeriodChange> {
        match (self.clear_period, self.start_period, self.end_period) {
            (false, None, None) => Ok(PeriodChange::Keep),
            (false, Some(start), Some(end)) => Ok(PeriodChange::Set { start, end }),
            (true, None, None) => Ok(PeriodChange::Clear),
            (true, _, _) => Err(Failure::bad_request(
                "clear_period cannot be combined with period bounds",
            )),
            _ => Err(Failure::bad_request(
                "start_period and end_period must be given together",
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecruitmentView {
    pub recruitment_uuid: String,
    pub club_uuid: String,
    pub recruit_concept: String,
    pub start_period: Option<Period>,
    pub end_period: Option<Period>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub recruit_members: Vec<Position>,
}

impl RecruitmentView {
    fn new(recruitment: ClubRecruitment, members: Vec<RecruitMember>) -> Self {
        Self {
            recruitment_uuid: recruitment.uuid,
            club_uuid: recruitment.club_uuid,
            recruit_concept: recruitment.recruit_concept,
            start_period: recruitment.start_period,
            end_period: recruitment.end_period,
            created_at: recruitment.created_at,
            updated_at: recruitment.updated_at,
            recruit_members: members.into_iter().map(Position::from).collect(),
        }
    }
}

fn positions_for(recruitment_uuid: &str, positions: &[Position]) -> OpResult<Vec<CreateRecruitMember>> {
    positions
        .iter()
        .map(|p| {
            let member = CreateRecruitMember {
                recruitment_uuid: recruitment_uuid.to_string(),
                grade: p.grade,
                field: p.field.clone(),
                number: p.number,
            };
            member.validate()?;
            Ok(member)
        })
        .collect()
}

async fn create_positions(
    ctx: &RequestContext,
    tx: &mut dyn ClubAccessor,
    positions: &[CreateRecruitMember],
) -> OpResult<()> {
    for position in positions {
        ctx.step("create recruit member", tx.create_recruit_member(position))
            .await?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/clubs/uuid/{club_uuid}/recruitments
///
/// A club has at most one current recruitment at a time.
#[tracing::instrument(
    name = "register_recruitment",
    skip_all,
    fields(request_id = %ctx.trace.request_id, trace_id = %ctx.trace_id())
)]
pub async fn register_recruitment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(club_uuid): Path<String>,
    Json(input): Json<RegisterRecruitmentRequest>,
) -> OpResult<Success<RecruitmentRegistered>> {
    ctx.authorize(Capability::LeaderOrAdmin)?;
    let recruitment = CreateClubRecruitment {
        uuid: ids::generate_recruitment_uuid(),
        club_uuid,
        recruit_concept: input.recruit_concept,
        start_period: input.start_period,
        end_period: input.end_period,
    };
    recruitment.validate()?;
    let positions = positions_for(&recruitment.uuid, &input.recruit_members)?;

    let mut tx = ctx.begin(&state.accessors).await?;
    let result: OpResult<()> = async {
        let club = require_club(&ctx, tx.as_mut(), &recruitment.club_uuid).await?;
        ctx.ensure_leader(&club.leader_uuid)?;

        let current = ctx
            .step(
                "get current recruitment",
                tx.get_current_club_recruitment_with_club_uuid(&recruitment.club_uuid),
            )
            .await?;
        if let Some(current) = current {
            return Err(Failure::conflict(
                DomainCode::RecruitmentAlreadyOpen,
                format!("recruitment '{}' is still open", current.uuid),
            ));
        }

        ctx.step("create recruitment", tx.create_club_recruitment(&recruitment))
            .await?;
        create_positions(&ctx, tx.as_mut(), &positions).await
    }
    .await;

    ctx.finish(tx, result).await?;
    tracing::info!(
        recruitment_uuid = %recruitment.uuid,
        club_uuid = %recruitment.club_uuid,
        "Recruitment registered"
    );
    Ok(Success::created(
        "recruitment registered",
        RecruitmentRegistered {
            recruitment_uuid: recruitment.uuid,
        },
    ))
}

/// GET /v1/recruitments/uuid/{recruitment_uuid}
#[tracing::instrument(
    name = "get_recruitment_with_uuid",
    skip_all,
    fields(request_id = %ctx.trace.request_id, trace_id = %ctx.trace_id())
)]
pub async fn get_recruitment_with_uuid(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(recruitment_uuid): Path<String>,
) -> OpResult<Success<RecruitmentView>> {
    ctx.authorize(Capability::StudentOrAdmin)?;
    ids::validate_recruitment_uuid(&recruitment_uuid)?;

    let mut tx = ctx.begin(&state.accessors).await?;
    let result: OpResult<RecruitmentView> = async {
        let recruitment = require_recruitment(&ctx, tx.as_mut(), &recruitment_uuid).await?;
        let members = ctx
            .step(
                "get recruit members",
                tx.get_recruit_members_with_recruitment_uuid(&recruitment_uuid),
            )
            .await?;
        Ok(RecruitmentView::new(recruitment, members))
    }
    .await;

    let view = ctx.finish(tx, result).await?;
    Ok(Success::ok("recruitment found", view))
}

/// GET /v1/clubs/uuid/{club_uuid}/recruitments/current
///
/// A club without an open recruitment answers 409, not 404.
#[tracing::instrument(
    name = "get_current_recruitment",
    skip_all,
    fields(request_id = %ctx.trace.request_id, trace_id = %ctx.trace_id())
)]
pub async fn get_current_recruitment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(club_uuid): Path<String>,
) -> OpResult<Success<RecruitmentView>> {
    ctx.authorize(Capability::StudentOrAdmin)?;
    ids::validate_club_uuid(&club_uuid)?;

    let mut tx = ctx.begin(&state.accessors).await?;
    let result: OpResult<RecruitmentView> = async {
        require_club(&ctx, tx.as_mut(), &club_uuid).await?;
        let recruitment = ctx
            .step(
                "get current recruitment",
                tx.get_current_club_recruitment_with_club_uuid(&club_uuid),
            )
            .await?
            .ok_or_else(|| {
                Failure::conflict(
                    DomainCode::NoCurrentRecruitment,
                    format!("club '{club_uuid}' has no open recruitment"),
                )
            })?;
        let members = ctx
            .step(
                "get recruit members",
                tx.get_recruit_members_with_recruitment_uuid(&recruitment.uuid),
            )
            .await?;
        Ok(RecruitmentView::new(recruitment, members))
    }
    .await;

    let view = ctx.finish(tx, result).await?;
    Ok(Success::ok("current recruitment found", view))
}

/// PATCH /v1/recruitments/uuid/{recruitment_uuid}
#[tracing::instrument(
    name = "modify_recruitment",
    skip_all,
    fields(request_id = %ctx.trace.request_id, trace_id = %ctx.trace_id())
)]
pub async fn modify_recruitment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(recruitment_uuid): Path<String>,
    Json(input): Json<ModifyRecruitmentRequest>,
) -> OpResult<Success<()>> {
    ctx.authorize(Capability::LeaderOrAdmin)?;
    ids::validate_recruitment_uuid(&recruitment_uuid)?;
    let revision = RecruitmentRevision {
        period: input.period_change()?,
        uuid: input.uuid,
        club_uuid: input.club_uuid,
        recruit_concept: input.recruit_concept,
    };
    revision.validate()?;
    let positions = input
        .recruit_members
        .as_deref()
        .map(|p| positions_for(&recruitment_uuid, p))
        .transpose()?;

    let mut tx = ctx.begin(&state.accessors).await?;
    let result: OpResult<()> = async {
        let recruitment = require_recruitment(&ctx, tx.as_mut(), &recruitment_uuid).await?;
        let club = require_club(&ctx, tx.as_mut(), &recruitment.club_uuid).await?;
        ctx.ensure_leader(&club.leader_uuid)?;

        // A club keeps at most one current recruitment, so a period that
        // (re)opens this one must not collide with another.
        if revision.period.opens_on(chrono::Utc::now().date_naive()) {
            let current = ctx
                .step(
                    "get current recruitment",
                    tx.get_current_club_recruitment_with_club_uuid(&recruitment.club_uuid),
                )
                .await?;
            if let Some(current) = current.filter(|c| c.uuid != recruitment_uuid) {
                return Err(Failure::conflict(
                    DomainCode::RecruitmentAlreadyOpen,
                    format!("recruitment '{}' is still open", current.uuid),
                ));
            }
        }

        let rows = ctx
            .step(
                "modify recruitment",
                tx.modify_club_recruitment(&recruitment_uuid, &revision),
            )
            .await?;
        if rows == 0 {
            return Err(Failure::not_found(
                DomainCode::RecruitmentNotFound,
                format!("recruitment '{recruitment_uuid}' does not exist"),
            ));
        }

        if let Some(positions) = &positions {
            ctx.step(
                "delete recruit members",
                tx.delete_recruit_members_with_recruitment_uuid(&recruitment_uuid),
            )
            .await?;
            create_positions(&ctx, tx.as_mut(), positions).await?;
        }
        Ok(())
    }
    .await;

    ctx.finish(tx, result).await?;
    Ok(Success::done("recruitment modified"))
}

/// DELETE /v1/recruitments/uuid/{recruitment_uuid}
#[tracing::instrument(
    name = "delete_recruitment",
    skip_all,
    fields(request_id = %ctx.trace.request_id, trace_id = %ctx.trace_id())
)]
pub async fn delete_recruitment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(recruitment_uuid): Path<String>,
) -> OpResult<Success<()>> {
    ctx.authorize(Capability::LeaderOrAdmin)?;
    ids::validate_recruitment_uuid(&recruitment_uuid)?;

    let mut tx = ctx.begin(&state.accessors).await?;
    let result: OpResult<()> = async {
        let recruitment = require_recruitment(&ctx, tx.as_mut(), &recruitment_uuid).await?;
        let club = require_club(&ctx, tx.as_mut(), &recruitment.club_uuid).await?;
        ctx.ensure_leader(&club.leader_uuid)?;

        ctx.step(
            "delete recruit members",
            tx.delete_recruit_members_with_recruitment_uuid(&recruitment_uuid),
        )
        .await?;
        ctx.step(
            "delete recruitment",
            tx.delete_club_recruitment(&recruitment_uuid),
        )
        .await?;
        Ok(())
    }
    .await;

    ctx.finish(tx, result).await?;
    tracing::info!(%recruitment_uuid, "Recruitment deleted");
    Ok(Success::done("recruitment deleted"))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn date(d: u32) -> Period {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn period_bounds_travel_together() {
        let keep = ModifyRecruitmentRequest::default();
        assert_eq!(keep.period_change().unwrap(), PeriodChange::Keep);

        let set = ModifyRecruitmentRequest {
            start_period: Some(date(1)),
            end_period: Some(date(15)),
            ..Default::default()
        };
        assert_eq!(
            set.period_change().unwrap(),
            PeriodChange::Set {
                start: date(1),
                end: date(15)
            }
        );

        let clear = ModifyRecruitmentRequest {
            clear_period: true,
            ..Default::default()
        };
        assert_eq!(clear.period_change().unwrap(), PeriodChange::Clear);

        let half = ModifyRecruitmentRequest {
            end_period: Some(date(15)),
            ..Default::default()
        };
        assert!(half.period_change().is_err());

        let mixed = ModifyRecruitmentRequest {
            clear_period: true,
            start_period: Some(date(1)),
            end_period: Some(date(15)),
            ..Default::default()
        };
        assert!(mixed.period_change().is_err());
    }

    #[test]
    fn invalid_position_is_rejected_before_any_write() {
        let positions = vec![Position {
            grade: 4,
            field: "backend".into(),
            number: 2,
        }];
        let err = positions_for("recruitment-000000000001", &positions).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }
}
