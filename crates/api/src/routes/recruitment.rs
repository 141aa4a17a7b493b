//! Route definitions for the `/recruitments` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::recruitment;
use crate::state::AppState;

/// Routes mounted at `/recruitments`.
///
/// ```text
/// GET    /uuid/{recruitment_uuid}    -> get_recruitment_with_uuid
/// PATCH  /uuid/{recruitment_uuid}    -> modify_recruitment
/// DELETE /uuid/{recruitment_uuid}    -> delete_recruitment
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/uuid/{recruitment_uuid}",
        get(recruitment::get_recruitment_with_uuid)
            .patch(recruitment::modify_recruitment)
            .delete(recruitment::delete_recruitment),
    )
}
