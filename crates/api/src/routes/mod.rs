pub mod club;
pub mod health;
pub mod leader;
pub mod recruitment;

use axum::Router;

use crate::state::AppState;

/// Build the `/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /clubs                                              create (admin)
/// /clubs/sorted-by/update-time                        list (?offset, limit, field, name)
/// /clubs/uuids                                        batch get (?club_uuids=a,b)
/// /clubs/uuid/{club_uuid}                             get, modify, delete
/// /clubs/uuid/{club_uuid}/leader                      change leader (PUT)
/// /clubs/uuid/{club_uuid}/members                     add member (POST)
/// /clubs/uuid/{club_uuid}/members/{student_uuid}      remove member (DELETE)
/// /clubs/uuid/{club_uuid}/recruitments                register recruitment (POST)
/// /clubs/uuid/{club_uuid}/recruitments/current        current recruitment (GET)
///
/// /leaders/uuid/{leader_uuid}/club-uuid               club led by (GET)
///
/// /recruitments/uuid/{recruitment_uuid}               get, modify, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/clubs", club::router())
        .nest("/leaders", leader::router())
        .nest("/recruitments", recruitment::router())
}
