//! Route definitions for the `/leaders` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::club;
use crate::state::AppState;

/// Routes mounted at `/leaders`.
///
/// ```text
/// GET    /uuid/{leader_uuid}/club-uuid    -> get_club_uuid_with_leader_uuid
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/uuid/{leader_uuid}/club-uuid",
        get(club::get_club_uuid_with_leader_uuid),
    )
}
