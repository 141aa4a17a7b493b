//! One handler per business operation.
//!
//! Not-found handling differs per operation and is spelled out in each
//! handler: listing endpoints treat absence as an empty result, lookups by
//! key answer 404, and "no current recruitment" is a 409 conflict.

pub mod club;
pub mod member;
pub mod recruitment;

use club_core::codes::DomainCode;
use club_db::models::club::Club;
use club_db::models::club_recruitment::ClubRecruitment;
use club_db::ClubAccessor;
use club_remote::DirectoryResponse;

use crate::context::RequestContext;
use crate::error::{Failure, OpResult, StepError};
use crate::state::AppState;

/// Read a club that must exist.
pub(crate) async fn require_club(
    ctx: &RequestContext,
    tx: &mut dyn ClubAccessor,
    club_uuid: &str,
) -> OpResult<Club> {
    ctx.step("get club", tx.get_club_with_uuid(club_uuid))
        .await?
        .ok_or_else(|| {
            Failure::not_found(
                DomainCode::ClubNotFound,
                format!("club '{club_uuid}' does not exist"),
            )
        })
}

/// Read a recruitment that must exist.
pub(crate) async fn require_recruitment(
    ctx: &RequestContext,
    tx: &mut dyn ClubAccessor,
    recruitment_uuid: &str,
) -> OpResult<ClubRecruitment> {
    ctx.step(
        "get recruitment",
        tx.get_club_recruitment_with_uuid(recruitment_uuid),
    )
    .await?
    .ok_or_else(|| {
        Failure::not_found(
            DomainCode::RecruitmentNotFound,
            format!("recruitment '{recruitment_uuid}' does not exist"),
        )
    })
}

/// Turn a duplicate-entry failure into the operation's own conflict.
///
/// `conflict` receives the duplicated field; returning `None` falls back to
/// the generic classification.
pub(crate) fn map_duplicate(
    err: StepError,
    conflict: impl FnOnce(&str) -> Option<Failure>,
) -> Failure {
    match err.duplicate_field().and_then(conflict) {
        Some(failure) => failure,
        None => err.into(),
    }
}

/// Confirm every student exists in the student directory.
///
/// Two remote steps: resolve a directory node, then look the students up.
/// A 404 from the directory, or a reply missing any requested student, is
/// a 409 conflict; any other non-200 status is relayed as is.
pub(crate) async fn confirm_students(
    ctx: &RequestContext,
    state: &AppState,
    student_uuids: &[String],
) -> OpResult<()> {
    if student_uuids.is_empty() {
        return Ok(());
    }

    let service = &state.config.student_service_name;
    let node = ctx
        .step(
            "discover student service",
            state.remote.next_service_node(service),
        )
        .await?;

    let meta = ctx.call_metadata();
    let reply = ctx
        .step(
            "look up students",
            state
                .remote
                .student_informs_with_uuids(&node, &meta, student_uuids),
        )
        .await?;

    check_directory_reply(&reply, student_uuids)
}

/// Single-student variant of [`confirm_students`].
pub(crate) async fn confirm_student(
    ctx: &RequestContext,
    state: &AppState,
    student_uuid: &str,
) -> OpResult<()> {
    let service = &state.config.student_service_name;
    let node = ctx
        .step(
            "discover student service",
            state.remote.next_service_node(service),
        )
        .await?;

    let meta = ctx.call_metadata();
    let reply = ctx
        .step(
            "look up student",
            state
                .remote
                .student_inform_with_uuid(&node, &meta, student_uuid),
        )
        .await?;

    check_directory_reply(&reply, &[student_uuid.to_string()])
}

fn check_directory_reply(reply: &DirectoryResponse, student_uuids: &[String]) -> OpResult<()> {
    match reply.status {
        200 => {
            let missing: Vec<&str> = student_uuids
                .iter()
                .filter(|uuid| !reply.student_informs.iter().any(|s| &s.student_uuid == *uuid))
                .map(String::as_str)
                .collect();
            if missing.is_empty() {
                Ok(())
            } else {
                Err(Failure::conflict(
                    DomainCode::StudentNotFound,
                    format!("students not found: {}", missing.join(", ")),
                ))
            }
        }
        404 => Err(Failure::conflict(
            DomainCode::StudentNotFound,
            format!("student directory: {}", reply.message),
        )),
        status => Err(Failure::relayed(
            status,
            format!("student directory returned {status}: {}", reply.message),
        )),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use club_remote::StudentInform;

    use super::*;

    fn student(uuid: &str) -> StudentInform {
        StudentInform {
            student_uuid: uuid.to_string(),
            student_number: 1101,
            name: "kim".to_string(),
            profile_uri: String::new(),
        }
    }

    #[test]
    fn partial_directory_reply_is_a_conflict() {
        let wanted = vec![
            "student-000000000001".to_string(),
            "student-000000000002".to_string(),
        ];
        let reply = DirectoryResponse::found(vec![student("student-000000000001")]);

        let err = check_directory_reply(&reply, &wanted).unwrap_err();
        assert_eq!(err.code, Some(DomainCode::StudentNotFound));
        assert!(err.message.contains("student-000000000002"));
    }

    #[test]
    fn other_statuses_are_relayed() {
        let wanted = vec!["student-000000000001".to_string()];
        let reply = DirectoryResponse::with_status(503, "maintenance");

        let err = check_directory_reply(&reply, &wanted).unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code, None);
    }
}
