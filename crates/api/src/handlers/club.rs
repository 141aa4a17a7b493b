//! Handlers for the `/clubs` and `/leaders` resources.

use axum::extract::State;
use club_core::codes::DomainCode;
use club_core::ids;
use club_core::paging::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use club_core::roles::Capability;
use club_core::types::Timestamp;
use club_db::models::club::CreateClub;
use club_db::models::club_inform::{
    ClubInform, ClubInformFilter, ClubInformRevision, CreateClubInform, InformPage,
};
use club_db::models::club_member::CreateClubMember;
use serde::{Deserialize, Serialize};

use super::{confirm_students, map_duplicate, require_club};
use crate::context::RequestContext;
use crate::error::{Failure, OpResult};
use crate::extract::{Json, Path, Query};
use crate::response::Success;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateClubRequest {
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
    pub leader_uuid: String,
    pub member_uuids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ClubCreated {
    pub club_uuid: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClubListQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    pub field: Option<String>,
    pub name: Option<String>,
}

impl ClubListQuery {
    fn page(&self) -> InformPage {
        let filter = match (self.field.as_deref(), self.name.as_deref()) {
            (Some(field), _) if !field.is_empty() => Some(ClubInformFilter::Field(field.into())),
            (_, Some(name)) if !name.is_empty() => Some(ClubInformFilter::Name(name.into())),
            _ => None,
        };
        InformPage {
            offset: clamp_offset(self.offset),
            limit: clamp_limit(self.limit, DEFAULT_LIMIT, MAX_LIMIT),
            filter,
        }
    }
}

/// A club as shown in listings and detail views.
#[derive(Debug, Serialize)]
pub struct ClubView {
    pub club_uuid: String,
    pub leader_uuid: Option<String>,
    pub name: String,
    pub club_concept: String,
    pub introduction: String,
    pub field: String,
    pub location: String,
    pub floor: String,
    pub link: String,
    pub logo_uri: String,
    pub updated_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_uuids: Option<Vec<String>>,
}

impl ClubView {
    fn new(inform: ClubInform, leader_uuid: Option<String>) -> Self {
        Self {
            club_uuid: inform.club_uuid,
            leader_uuid,
            name: inform.name,
            club_concept: inform.club_concept,
            introduction: inform.introduction,
            field: inform.field,
            location: inform.location,
            floor: inform.floor,
            link: inform.link,
            logo_uri: inform.logo_uri,
            updated_at: inform.updated_at,
            member_uuids: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ClubUuidsQuery {
    /// Comma-separated club uuids.
    pub club_uuids: String,
}

#[derive(Debug, Serialize)]
pub struct ClubUuid {
    pub club_uuid: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangeLeaderRequest {
    pub new_leader_uuid: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/clubs
#[tracing::instrument(
    name = "create_new_club",
    skip_all,
    fields(request_id = %ctx.trace.request_id, trace_id = %ctx.trace_id())
)]
pub async fn create_new_club(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<CreateClubRequest>,
) -> OpResult<Success<ClubCreated>> {
    ctx.authorize(Capability::Admin)?;

    let club = CreateClub {
        uuid: ids::generate_club_uuid(),
        leader_uuid: input.leader_uuid.clone(),
    };
    club.validate()?;
    let inform = CreateClubInform {
        club_uuid: club.uuid.clone(),
        name: input.name,
        club_concept: input.club_concept,
        introduction: input.introduction,
        field: input.field,
        location: input.location,
        floor: input.floor,
        link: input.link,
        logo_uri: input.logo_uri,
    };
    inform.validate()?;

    let mut member_uuids: Vec<String> = Vec::with_capacity(input.member_uuids.len());
    for uuid in input.member_uuids {
        ids::validate_member_uuid(&uuid)?;
        if !member_uuids.contains(&uuid) {
            member_uuids.push(uuid);
        }
    }
    if !member_uuids.contains(&club.leader_uuid) {
        return Err(Failure::conflict(
            DomainCode::LeaderNotInMembers,
            format!("leader '{}' is not among the members", club.leader_uuid),
        ));
    }
    let students: Vec<String> = member_uuids
        .iter()
        .filter(|uuid| ids::is_student_uuid(uuid))
        .cloned()
        .collect();

    let mut tx = ctx.begin(&state.accessors).await?;
    let result: OpResult<ClubCreated> = async {
        confirm_students(&ctx, &state, &students).await?;

        ctx.step("create club", tx.create_club(&club))
            .await
            .map_err(|e| {
                map_duplicate(e, |field| {
                    Some(match field {
                        "leader_uuid" => Failure::conflict(
                            DomainCode::LeaderAlreadyExists,
                            format!("'{}' already leads a club", club.leader_uuid),
                        ),
                        other => Failure::internal(format!("generated club {other} collided")),
                    })
                })
            })?;

        ctx.step("create club inform", tx.create_club_inform(&inform))
            .await
            .map_err(|e| {
                map_duplicate(e, |field| {
                    Some(match field {
                        "name" => Failure::conflict(
                            DomainCode::NameDuplicate,
                            format!("club name '{}' is taken", inform.name),
                        ),
                        "location" => Failure::conflict(
                            DomainCode::LocationDuplicate,
                            format!("location '{}' is taken", inform.location),
                        ),
                        other => Failure::internal(format!("club inform {other} collided")),
                    })
                })
            })?;

        for student_uuid in &member_uuids {
            let member = CreateClubMember {
                club_uuid: club.uuid.clone(),
                student_uuid: student_uuid.clone(),
            };
            ctx.step("create club member", tx.create_club_member(&member))
                .await
                .map_err(|e| {
                    map_duplicate(e, |_| {
                        Some(Failure::conflict(
                            DomainCode::AlreadyMember,
                            format!("'{student_uuid}' is already a member"),
                        ))
                    })
                })?;
        }

        Ok(ClubCreated {
            club_uuid: club.uuid.clone(),
        })
    }
    .await;

    let created = ctx.finish(tx, result).await?;
    tracing::info!(club_uuid = %created.club_uuid, "Club created");
    Ok(Success::created("club created", created))
}

/// GET /v1/clubs/sorted-by/update-time
///
/// An empty page is a success.
#[tracing::instrument(
    name = "get_clubs_sort_by_update_time",
    skip_all,
    fields(request_id = %ctx.trace.request_id, trace_id = %ctx.trace_id())
)]
pub async fn get_clubs_sort_by_update_time(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<ClubListQuery>,
) -> OpResult<Success<Vec<ClubView>>> {
    ctx.authorize(Capability::StudentOrAdmin)?;
    let page = query.page();

    let mut tx = ctx.begin(&state.accessors).await?;
    let result: OpResult<Vec<ClubView>> = async {
        let informs = ctx
            .step("list club informs", tx.get_club_informs_sort_by_update_time(&page))
            .await?;

        let mut views = Vec::with_capacity(informs.len());
        for inform in informs {
            let leader = ctx
                .step("get club", tx.get_club_with_uuid(&inform.club_uuid))
                .await?
                .map(|club| club.leader_uuid);
            views.push(ClubView::new(inform, leader));
        }
        Ok(views)
    }
    .await;

    let views = ctx.finish(tx, result).await?;
    Ok(Success::ok("clubs listed", views))
}

/// GET /v1/clubs/uuid/{club_uuid}
#[tracing::instrument(
    name = "get_club_inform_with_uuid",
    skip_all,
    fields(request_id = %ctx.trace.request_id, trace_id = %ctx.trace_id())
)]
pub async fn get_club_inform_with_uuid(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(club_uuid): Path<String>,
) -> OpResult<Success<ClubView>> {
    ctx.authorize(Capability::StudentOrAdmin)?;
    ids::validate_club_uuid(&club_uuid)?;

    let mut tx = ctx.begin(&state.accessors).await?;
    let result: OpResult<ClubView> = async {
        let club = require_club(&ctx, tx.as_mut(), &club_uuid).await?;
        let inform = ctx
            .step(
                "get club inform",
                tx.get_club_inform_with_club_uuid(&club_uuid),
            )
            .await?
            .ok_or_else(|| {
                Failure::not_found(
                    DomainCode::ClubNotFound,
                    format!("club '{club_uuid}' has no inform"),
                )
            })?;
        let members = ctx
            .step(
                "get club members",
                tx.get_club_members_with_club_uuid(&club_uuid),
            )
            .await?;

        let mut view = ClubView::new(inform, Some(club.leader_uuid));
        view.member_uuids = Some(members.into_iter().map(|m| m.student_uuid).collect());
        Ok(view)
    }
    .await;

    let view = ctx.finish(tx, result).await?;
    Ok(Success::ok("club found", view))
}

/// GET /v1/clubs/uuids?club_uuids=a,b
///
/// Unknown uuids are silently left out of the result.
#[tracing::instrument(
    name = "get_club_informs_with_uuids",
    skip_all,
    fields(request_id = %ctx.trace.request_id, trace_id = %ctx.trace_id())
)]
pub async fn get_club_informs_with_uuids(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<ClubUuidsQuery>,
) -> OpResult<Success<Vec<ClubInform>>> {
    ctx.authorize(Capability::StudentOrAdmin)?;
    let club_uuids: Vec<String> = query
        .club_uuids
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    for uuid in &club_uuids {
        ids::validate_club_uuid(uuid)?;
    }

    let mut tx = ctx.begin(&state.accessors).await?;
    let result = ctx
        .step(
            "get club informs",
            tx.get_club_informs_with_club_uuids(&club_uuids),
        )
        .await
        .map_err(Failure::from);

    let informs = ctx.finish(tx, result).await?;
    Ok(Success::ok("club informs found", informs))
}

/// GET /v1/leaders/uuid/{leader_uuid}/club-uuid
#[tracing::instrument(
    name = "get_club_uuid_with_leader_uuid",
    skip_all,
    fields(request_id = %ctx.trace.request_id, trace_id = %ctx.trace_id())
)]
pub async fn get_club_uuid_with_leader_uuid(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(leader_uuid): Path<String>,
) -> OpResult<Success<ClubUuid>> {
    ctx.authorize(Capability::StudentOrAdmin)?;
    ids::validate_leader_uuid(&leader_uuid)?;

    let mut tx = ctx.begin(&state.accessors).await?;
    let result: OpResult<ClubUuid> = async {
        let club = ctx
            .step("get club by leader", tx.get_club_with_leader_uuid(&leader_uuid))
            .await?
            .ok_or_else(|| {
                Failure::not_found(
                    DomainCode::ClubNotFound,
                    format!("'{leader_uuid}' leads no club"),
                )
            })?;
        Ok(ClubUuid {
            club_uuid: club.uuid,
        })
    }
    .await;

    let found = ctx.finish(tx, result).await?;
    Ok(Success::ok("club found", found))
}

/// DELETE /v1/clubs/uuid/{club_uuid}
///
/// Nothing cascades in storage, so children are removed explicitly:
/// recruit members and recruitments, then members, inform and the club.
#[tracing::instrument(
    name = "delete_club_with_uuid",
    skip_all,
    fields(request_id = %ctx.trace.request_id, trace_id = %ctx.trace_id())
)]
pub async fn delete_club_with_uuid(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(club_uuid): Path<String>,
) -> OpResult<Success<()>> {
    ctx.authorize(Capability::Admin)?;
    ids::validate_club_uuid(&club_uuid)?;

    let mut tx = ctx.begin(&state.accessors).await?;
    let result: OpResult<()> = async {
        require_club(&ctx, tx.as_mut(), &club_uuid).await?;

        let recruitments = ctx
            .step(
                "get club recruitments",
                tx.get_club_recruitments_with_club_uuid(&club_uuid),
            )
            .await?;
        for recruitment in &recruitments {
            ctx.step(
                "delete recruit members",
                tx.delete_recruit_members_with_recruitment_uuid(&recruitment.uuid),
            )
            .await?;
            ctx.step(
                "delete recruitment",
                tx.delete_club_recruitment(&recruitment.uuid),
            )
            .await?;
        }

        ctx.step(
            "delete club members",
            tx.delete_club_members_with_club_uuid(&club_uuid),
        )
        .await?;
        ctx.step("delete club inform", tx.delete_club_inform(&club_uuid))
            .await?;
        let rows = ctx.step("delete club", tx.delete_club(&club_uuid)).await?;
        if rows == 0 {
            return Err(Failure::not_found(
                DomainCode::ClubNotFound,
                format!("club '{club_uuid}' does not exist"),
            ));
        }
        Ok(())
    }
    .await;

    ctx.finish(tx, result).await?;
    tracing::info!(%club_uuid, "Club deleted");
    Ok(Success::done("club deleted"))
}

/// PUT /v1/clubs/uuid/{club_uuid}/leader
#[tracing::instrument(
    name = "change_club_leader",
    skip_all,
    fields(request_id = %ctx.trace.request_id, trace_id = %ctx.trace_id())
)]
pub async fn change_club_leader(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(club_uuid): Path<String>,
    Json(input): Json<ChangeLeaderRequest>,
) -> OpResult<Success<()>> {
    ctx.authorize(Capability::LeaderOrAdmin)?;
    ids::validate_club_uuid(&club_uuid)?;
    let new_leader = input.new_leader_uuid;
    ids::validate_leader_uuid(&new_leader)?;

    let mut tx = ctx.begin(&state.accessors).await?;
    let result: OpResult<()> = async {
        let club = require_club(&ctx, tx.as_mut(), &club_uuid).await?;
        ctx.ensure_leader(&club.leader_uuid)?;

        if club.leader_uuid == new_leader {
            return Err(Failure::conflict(
                DomainCode::SameLeader,
                format!("'{new_leader}' already leads this club"),
            ));
        }

        let members = ctx
            .step(
                "get club members",
                tx.get_club_members_with_club_uuid(&club_uuid),
            )
            .await?;
        if !members.iter().any(|m| m.student_uuid == new_leader) {
            return Err(Failure::conflict(
                DomainCode::NewLeaderNotMember,
                format!("'{new_leader}' is not a member of this club"),
            ));
        }

        let rows = ctx
            .step(
                "change club leader",
                tx.change_club_leader(&club_uuid, &new_leader),
            )
            .await
            .map_err(|e| {
                map_duplicate(e, |field| {
                    (field == "leader_uuid").then(|| {
                        Failure::conflict(
                            DomainCode::LeaderAlreadyExists,
                            format!("'{new_leader}' already leads another club"),
                        )
                    })
                })
            })?;
        if rows == 0 {
            return Err(Failure::not_found(
                DomainCode::ClubNotFound,
                format!("club '{club_uuid}' does not exist"),
            ));
        }
        Ok(())
    }
    .await;

    ctx.finish(tx, result).await?;
    tracing::info!(%club_uuid, %new_leader, "Club leader changed");
    Ok(Success::done("club leader changed"))
}

/// PATCH /v1/clubs/uuid/{club_uuid}
///
/// Only non-empty fields of the revision are written.
#[tracing::instrument(
    name = "modify_club_inform",
    skip_all,
    fields(request_id = %ctx.trace.request_id, trace_id = %ctx.trace_id())
)]
pub async fn modify_club_inform(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(club_uuid): Path<String>,
    Json(revision): Json<ClubInformRevision>,
) -> OpResult<Success<()>> {
    ctx.authorize(Capability::LeaderOrAdmin)?;
    ids::validate_club_uuid(&club_uuid)?;
    revision.validate()?;

    let mut tx = ctx.begin(&state.accessors).await?;
    let result: OpResult<()> = async {
        let club = require_club(&ctx, tx.as_mut(), &club_uuid).await?;
        ctx.ensure_leader(&club.leader_uuid)?;

        let rows = ctx
            .step(
                "modify club inform",
                tx.modify_club_inform(&club_uuid, &revision),
            )
            .await
            .map_err(|e| {
                map_duplicate(e, |field| match field {
                    "name" => Some(Failure::conflict(
                        DomainCode::NameDuplicate,
                        "club name is taken",
                    )),
                    "location" => Some(Failure::conflict(
                        DomainCode::LocationDuplicate,
                        "location is taken",
                    )),
                    _ => None,
                })
            })?;
        if rows == 0 {
            return Err(Failure::not_found(
                DomainCode::ClubNotFound,
                format!("club '{club_uuid}' has no inform"),
            ));
        }
        Ok(())
    }
    .await;

    ctx.finish(tx, result).await?;
    Ok(Success::done("club inform modified"))
}
