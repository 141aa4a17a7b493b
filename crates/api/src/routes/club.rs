//! Route definitions for the `/clubs` resource.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::{club, member, recruitment};
use crate::state::AppState;

/// Routes mounted at `/clubs`.
///
/// ```text
/// POST   /                                              -> create_new_club
/// GET    /sorted-by/update-time                         -> get_clubs_sort_by_update_time
/// GET    /uuids                                         -> get_club_informs_with_uuids
/// GET    /uuid/{club_uuid}                              -> get_club_inform_with_uuid
/// PATCH  /uuid/{club_uuid}                              -> modify_club_inform
/// DELETE /uuid/{club_uuid}                              -> delete_club_with_uuid
/// PUT    /uuid/{club_uuid}/leader                       -> change_club_leader
/// POST   /uuid/{club_uuid}/members                      -> add_club_member
/// DELETE /uuid/{club_uuid}/members/{student_uuid}       -> delete_club_member
/// POST   /uuid/{club_uuid}/recruitments                 -> register_recruitment
/// GET    /uuid/{club_uuid}/recruitments/current         -> get_current_recruitment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(club::create_new_club))
        .route(
            "/sorted-by/update-time",
            get(club::get_clubs_sort_by_update_time),
        )
        .route("/uuids", get(club::get_club_informs_with_uuids))
        .route(
            "/uuid/{club_uuid}",
            get(club::get_club_inform_with_uuid)
                .patch(club::modify_club_inform)
                .delete(club::delete_club_with_uuid),
        )
        .route("/uuid/{club_uuid}/leader", put(club::change_club_leader))
        .route("/uuid/{club_uuid}/members", post(member::add_club_member))
        .route(
            "/uuid/{club_uuid}/members/{student_uuid}",
            delete(member::delete_club_member),
        )
        .route(
            "/uuid/{club_uuid}/recruitments",
            post(recruitment::register_recruitment),
        )
        .route(
            "/uuid/{club_uuid}/recruitments/current",
            get(recruitment::get_current_recruitment),
        )
}
