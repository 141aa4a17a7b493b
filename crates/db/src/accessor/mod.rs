//! Transaction-bound data access.
//!
//! A [`ClubAccessor`] owns exactly one open transaction. It is created by
//! [`crate::AccessorManager::begin_tx`] and closed by [`ClubAccessor::commit`]
//! or [`ClubAccessor::rollback`], both of which consume it, so a transaction
//! can never be closed twice. Dropping an accessor without closing it rolls
//! the transaction back.
//!
//! Conventions shared by every implementation:
//!
//! - `create_*` validates the input, runs the uniqueness pre-checks inside
//!   the transaction, then inserts. A late unique failure from the insert is
//!   classified into the same [`StorageError::DuplicateEntry`] the
//!   pre-check would have produced.
//! - `get_*` returns `Ok(None)` / an empty `Vec` for absence.
//! - `modify_*`, `change_*` and `delete_*` return affected rows; `0` is a
//!   normal outcome meaning "no such key".
//!
//! The accessor is not reentrant; drive it from the task that owns the
//! request.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::models::club::{Club, CreateClub};
use crate::models::club_inform::{ClubInform, ClubInformRevision, CreateClubInform, InformPage};
use crate::models::club_member::{ClubMember, CreateClubMember};
use crate::models::club_recruitment::{
    ClubRecruitment, CreateClubRecruitment, RecruitmentRevision,
};
use crate::models::recruit_member::{CreateRecruitMember, RecruitMember};

pub mod postgres;
pub mod recording;

pub use postgres::PgClubAccessor;
pub use recording::{AccessorCall, CallLog, RecordingAccessor, Reply};

pub type AccessResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait ClubAccessor: Send {
    // --- club ---
    async fn create_club(&mut self, input: &CreateClub) -> AccessResult<Club>;
    async fn get_club_with_uuid(&mut self, uuid: &str) -> AccessResult<Option<Club>>;
    async fn get_club_with_leader_uuid(&mut self, leader_uuid: &str)
        -> AccessResult<Option<Club>>;
    async fn change_club_leader(&mut self, uuid: &str, leader_uuid: &str) -> AccessResult<u64>;
    async fn delete_club(&mut self, uuid: &str) -> AccessResult<u64>;

    // --- club inform ---
    async fn create_club_inform(&mut self, input: &CreateClubInform)
        -> AccessResult<ClubInform>;
    async fn get_club_inform_with_club_uuid(
        &mut self,
        club_uuid: &str,
    ) -> AccessResult<Option<ClubInform>>;
    async fn get_club_informs_with_club_uuids(
        &mut self,
        club_uuids: &[String],
    ) -> AccessResult<Vec<ClubInform>>;
    async fn get_club_informs_sort_by_update_time(
        &mut self,
        page: &InformPage,
    ) -> AccessResult<Vec<ClubInform>>;
    async fn modify_club_inform(
        &mut self,
        club_uuid: &str,
        revision: &ClubInformRevision,
    ) -> AccessResult<u64>;
    async fn delete_club_inform(&mut self, club_uuid: &str) -> AccessResult<u64>;

    // --- club member ---
    async fn create_club_member(&mut self, input: &CreateClubMember)
        -> AccessResult<ClubMember>;
    async fn get_club_members_with_club_uuid(
        &mut self,
        club_uuid: &str,
    ) -> AccessResult<Vec<ClubMember>>;
    async fn delete_club_member(&mut self, club_uuid: &str, student_uuid: &str)
        -> AccessResult<u64>;
    async fn delete_club_members_with_club_uuid(&mut self, club_uuid: &str) -> AccessResult<u64>;

    // --- club recruitment ---
    async fn create_club_recruitment(
        &mut self,
        input: &CreateClubRecruitment,
    ) -> AccessResult<ClubRecruitment>;
    async fn get_club_recruitment_with_uuid(
        &mut self,
        uuid: &str,
    ) -> AccessResult<Option<ClubRecruitment>>;
    async fn get_current_club_recruitment_with_club_uuid(
        &mut self,
        club_uuid: &str,
    ) -> AccessResult<Option<ClubRecruitment>>;
    async fn get_club_recruitments_with_club_uuid(
        &mut self,
        club_uuid: &str,
    ) -> AccessResult<Vec<ClubRecruitment>>;
    async fn modify_club_recruitment(
        &mut self,
        uuid: &str,
        revision: &RecruitmentRevision,
    ) -> AccessResult<u64>;
    async fn delete_club_recruitment(&mut self, uuid: &str) -> AccessResult<u64>;

    // --- recruit member ---
    async fn create_recruit_member(
        &mut self,
        input: &CreateRecruitMember,
    ) -> AccessResult<RecruitMember>;
    async fn get_recruit_members_with_recruitment_uuid(
        &mut self,
        recruitment_uuid: &str,
    ) -> AccessResult<Vec<RecruitMember>>;
    async fn delete_recruit_members_with_recruitment_uuid(
        &mut self,
        recruitment_uuid: &str,
    ) -> AccessResult<u64>;

    // --- transaction ---
    async fn commit(self: Box<Self>) -> AccessResult<()>;
    async fn rollback(self: Box<Self>) -> AccessResult<()>;
}
