//! Handlers for `/clubs/uuid/{club_uuid}/members`.

use axum::extract::State;
use club_core::codes::DomainCode;
use club_core::ids;
use club_core::roles::Capability;
use club_db::models::club_member::CreateClubMember;
use serde::{Deserialize, Serialize};

use super::{confirm_student, map_duplicate, require_club};
use crate::context::RequestContext;
use crate::error::{Failure, OpResult};
use crate::extract::{Json, Path};
use crate::response::Success;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub student_uuid: String,
}

#[derive(Debug, Serialize)]
pub struct MemberAdded {
    pub club_uuid: String,
    pub student_uuid: String,
}

/// POST /v1/clubs/uuid/{club_uuid}/members
#[tracing::instrument(
    name = "add_club_member",
    skip_all,
    fields(request_id = %ctx.trace.request_id, trace_id = %ctx.trace_id())
)]
pub async fn add_club_member(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(club_uuid): Path<String>,
    Json(input): Json<AddMemberRequest>,
) -> OpResult<Success<MemberAdded>> {
    ctx.authorize(Capability::LeaderOrAdmin)?;
    let member = CreateClubMember {
        club_uuid,
        student_uuid: input.student_uuid,
    };
    member.validate()?;
    ids::validate_student_uuid(&member.student_uuid)?;

    let mut tx = ctx.begin(&state.accessors).await?;
    let result: OpResult<()> = async {
        let club = require_club(&ctx, tx.as_mut(), &member.club_uuid).await?;
        ctx.ensure_leader(&club.leader_uuid)?;

        confirm_student(&ctx, &state, &member.student_uuid).await?;

        ctx.step("create club member", tx.create_club_member(&member))
            .await
            .map_err(|e| {
                map_duplicate(e, |_| {
                    Some(Failure::conflict(
                        DomainCode::AlreadyMember,
                        format!("'{}' is already a member", member.student_uuid),
                    ))
                })
            })?;
        Ok(())
    }
    .await;

    ctx.finish(tx, result).await?;
    tracing::info!(club_uuid = %member.club_uuid, student_uuid = %member.student_uuid, "Member added");
    Ok(Success::created(
        "club member added",
        MemberAdded {
            club_uuid: member.club_uuid,
            student_uuid: member.student_uuid,
        },
    ))
}

/// DELETE /v1/clubs/uuid/{club_uuid}/members/{student_uuid}
///
/// The leader cannot be removed; hand leadership over first.
#[tracing::instrument(
    name = "delete_club_member",
    skip_all,
    fields(request_id = %ctx.trace.request_id, trace_id = %ctx.trace_id())
)]
pub async fn delete_club_member(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((club_uuid, student_uuid)): Path<(String, String)>,
) -> OpResult<Success<()>> {
    ctx.authorize(Capability::LeaderOrAdmin)?;
    ids::validate_club_uuid(&club_uuid)?;
    ids::validate_member_uuid(&student_uuid)?;

    let mut tx = ctx.begin(&state.accessors).await?;
    let result: OpResult<()> = async {
        let club = require_club(&ctx, tx.as_mut(), &club_uuid).await?;
        ctx.ensure_leader(&club.leader_uuid)?;

        if club.leader_uuid == student_uuid {
            return Err(Failure::conflict(
                DomainCode::CannotRemoveLeader,
                "the club leader cannot be removed",
            ));
        }

        let rows = ctx
            .step(
                "delete club member",
                tx.delete_club_member(&club_uuid, &student_uuid),
            )
            .await?;
        if rows == 0 {
            return Err(Failure::conflict(
                DomainCode::NotMember,
                format!("'{student_uuid}' is not a member of this club"),
            ));
        }
        Ok(())
    }
    .await;

    ctx.finish(tx, result).await?;
    tracing::info!(%club_uuid, %student_uuid, "Member removed");
    Ok(Success::done("club member removed"))
}
