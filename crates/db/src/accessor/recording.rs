//! Recording test double for [`ClubAccessor`].
//!
//! A [`RecordingAccessor`] is scripted with the exact sequence of calls it
//! expects and the reply to give for each. Every call, including `commit`
//! and `rollback`, is appended to a shared [`CallLog`] so tests can assert
//! on what the orchestration actually did after the accessor is gone.
//!
//! ```ignore
//! let log = CallLog::default();
//! let accessor = RecordingAccessor::new(&log)
//!     .expect(
//!         AccessorCall::GetClubWithUuid("club-000000000001".into()),
//!         Reply::MaybeClub(Ok(None)),
//!     );
//! let manager = AccessorManager::recording(vec![accessor]);
//! // ... run the operation ...
//! assert_eq!(log.rollbacks(), 1);
//! log.assert_finished();
//! ```
//!
//! Calls whose arguments are generated inside the operation (fresh club or
//! recruitment uuids) are scripted with [`RecordingAccessor::expect_matching`].
//!
//! Writes validate their input first, like the Postgres accessor: malformed
//! input fails with `StorageError::Validation` without consuming the script.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{AccessResult, ClubAccessor};
use crate::models::club::{Club, CreateClub};
use crate::models::club_inform::{ClubInform, ClubInformRevision, CreateClubInform, InformPage};
use crate::models::club_member::{ClubMember, CreateClubMember};
use crate::models::club_recruitment::{
    ClubRecruitment, CreateClubRecruitment, RecruitmentRevision,
};
use crate::models::recruit_member::{CreateRecruitMember, RecruitMember};

/// One accessor invocation with owned arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessorCall {
    CreateClub(CreateClub),
    GetClubWithUuid(String),
    GetClubWithLeaderUuid(String),
    ChangeClubLeader {
        uuid: String,
        leader_uuid: String,
    },
    DeleteClub(String),

    CreateClubInform(CreateClubInform),
    GetClubInformWithClubUuid(String),
    GetClubInformsWithClubUuids(Vec<String>),
    GetClubInformsSortByUpdateTime(InformPage),
    ModifyClubInform {
        club_uuid: String,
        revision: ClubInformRevision,
    },
    DeleteClubInform(String),

    CreateClubMember(CreateClubMember),
    GetClubMembersWithClubUuid(String),
    DeleteClubMember {
        club_uuid: String,
        student_uuid: String,
    },
    DeleteClubMembersWithClubUuid(String),

    CreateClubRecruitment(CreateClubRecruitment),
    GetClubRecruitmentWithUuid(String),
    GetCurrentClubRecruitmentWithClubUuid(String),
    GetClubRecruitmentsWithClubUuid(String),
    ModifyClubRecruitment {
        uuid: String,
        revision: RecruitmentRevision,
    },
    DeleteClubRecruitment(String),

    CreateRecruitMember(CreateRecruitMember),
    GetRecruitMembersWithRecruitmentUuid(String),
    DeleteRecruitMembersWithRecruitmentUuid(String),

    Commit,
    Rollback,
}

/// Canned result for a scripted call. The variant must match the return
/// type of the method being answered.
#[derive(Debug)]
pub enum Reply {
    Club(AccessResult<Club>),
    MaybeClub(AccessResult<Option<Club>>),
    Inform(AccessResult<ClubInform>),
    MaybeInform(AccessResult<Option<ClubInform>>),
    Informs(AccessResult<Vec<ClubInform>>),
    Member(AccessResult<ClubMember>),
    Members(AccessResult<Vec<ClubMember>>),
    Recruitment(AccessResult<ClubRecruitment>),
    MaybeRecruitment(AccessResult<Option<ClubRecruitment>>),
    Recruitments(AccessResult<Vec<ClubRecruitment>>),
    RecruitMember(AccessResult<RecruitMember>),
    RecruitMembers(AccessResult<Vec<RecruitMember>>),
    Rows(AccessResult<u64>),
    Closed(AccessResult<()>),
}

type Matcher = Box<dyn Fn(&AccessorCall) -> bool + Send>;

/// What the next call must look like.
enum Expectation {
    Exact(AccessorCall),
    Matching { label: &'static str, matcher: Matcher },
}

impl Expectation {
    fn accepts(&self, call: &AccessorCall) -> bool {
        match self {
            Expectation::Exact(expected) => expected == call,
            Expectation::Matching { matcher, .. } => matcher(call),
        }
    }
}

impl std::fmt::Debug for Expectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expectation::Exact(call) => write!(f, "{call:?}"),
            Expectation::Matching { label, .. } => write!(f, "<{label}>"),
        }
    }
}

#[derive(Debug, Default)]
struct LogState {
    begun: usize,
    calls: Vec<AccessorCall>,
    unmet: Vec<String>,
}

/// Shared, clonable record of everything the scripted accessors saw.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    state: Arc<Mutex<LogState>>,
}

impl CallLog {
    fn lock(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn record_begin(&self) {
        self.lock().begun += 1;
    }

    fn record(&self, call: AccessorCall) {
        self.lock().calls.push(call);
    }

    fn record_unmet(&self, expectations: impl IntoIterator<Item = String>) {
        self.lock().unmet.extend(expectations);
    }

    /// Every call in the order it was made.
    pub fn calls(&self) -> Vec<AccessorCall> {
        self.lock().calls.clone()
    }

    /// Number of transactions handed out by the manager.
    pub fn transactions_begun(&self) -> usize {
        self.lock().begun
    }

    pub fn commits(&self) -> usize {
        self.count(&AccessorCall::Commit)
    }

    pub fn rollbacks(&self) -> usize {
        self.count(&AccessorCall::Rollback)
    }

    fn count(&self, wanted: &AccessorCall) -> usize {
        self.lock().calls.iter().filter(|c| *c == wanted).count()
    }

    /// Panic if any scripted expectation was never exercised.
    pub fn assert_finished(&self) {
        let state = self.lock();
        assert!(
            state.unmet.is_empty(),
            "scripted accessor calls never made: {:?}",
            state.unmet
        );
    }
}

/// Scripted [`ClubAccessor`] that never touches storage.
#[derive(Debug)]
pub struct RecordingAccessor {
    log: CallLog,
    script: VecDeque<(Expectation, Reply)>,
}

impl RecordingAccessor {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            script: VecDeque::new(),
        }
    }

    /// Append an expected call and the reply to give for it.
    pub fn expect(mut self, call: AccessorCall, reply: Reply) -> Self {
        self.script.push_back((Expectation::Exact(call), reply));
        self
    }

    /// Like [`expect`](Self::expect), but any call accepted by `matcher`
    /// satisfies the expectation. `label` names it in failure messages.
    pub fn expect_matching(
        mut self,
        label: &'static str,
        matcher: impl Fn(&AccessorCall) -> bool + Send + 'static,
        reply: Reply,
    ) -> Self {
        let matcher: Matcher = Box::new(matcher);
        self.script
            .push_back((Expectation::Matching { label, matcher }, reply));
        self
    }

    pub(crate) fn log(&self) -> &CallLog {
        &self.log
    }

    fn answer(&mut self, call: AccessorCall) -> Reply {
        self.log.record(call.clone());
        match self.script.pop_front() {
            Some((expected, reply)) if expected.accepts(&call) => reply,
            Some((expected, _)) => {
                panic!("unexpected accessor call: expected {expected:?}, got {call:?}")
            }
            None => panic!("unexpected accessor call: script exhausted, got {call:?}"),
        }
    }

    /// Commit and rollback succeed unless the script holds a reply for them.
    fn close(&mut self, call: AccessorCall) -> AccessResult<()> {
        self.log.record(call.clone());
        let scripted = matches!(self.script.front(), Some((expected, _)) if expected.accepts(&call));
        if !scripted {
            return Ok(());
        }
        match self.script.pop_front() {
            Some((_, Reply::Closed(result))) => result,
            other => panic!("reply shape mismatch for {call:?}: {other:?}"),
        }
    }
}

impl Drop for RecordingAccessor {
    fn drop(&mut self) {
        self.log
            .record_unmet(self.script.drain(..).map(|(expected, _)| format!("{expected:?}")));
    }
}

macro_rules! answer {
    ($self:ident, $call:expr, $variant:ident) => {
        match $self.answer($call) {
            Reply::$variant(result) => result,
            other => panic!(
                "reply shape mismatch: expected Reply::{}, got {:?}",
                stringify!($variant),
                other
            ),
        }
    };
}

#[async_trait]
impl ClubAccessor for RecordingAccessor {
    async fn create_club(&mut self, input: &CreateClub) -> AccessResult<Club> {
        input.validate()?;
        answer!(self, AccessorCall::CreateClub(input.clone()), Club)
    }

    async fn get_club_with_uuid(&mut self, uuid: &str) -> AccessResult<Option<Club>> {
        answer!(self, AccessorCall::GetClubWithUuid(uuid.into()), MaybeClub)
    }

    async fn get_club_with_leader_uuid(
        &mut self,
        leader_uuid: &str,
    ) -> AccessResult<Option<Club>> {
        answer!(
            self,
            AccessorCall::GetClubWithLeaderUuid(leader_uuid.into()),
            MaybeClub
        )
    }

    async fn change_club_leader(&mut self, uuid: &str, leader_uuid: &str) -> AccessResult<u64> {
        answer!(
            self,
            AccessorCall::ChangeClubLeader {
                uuid: uuid.into(),
                leader_uuid: leader_uuid.into(),
            },
            Rows
        )
    }

    async fn delete_club(&mut self, uuid: &str) -> AccessResult<u64> {
        answer!(self, AccessorCall::DeleteClub(uuid.into()), Rows)
    }

    async fn create_club_inform(&mut self, input: &CreateClubInform) -> AccessResult<ClubInform> {
        input.validate()?;
        answer!(self, AccessorCall::CreateClubInform(input.clone()), Inform)
    }

    async fn get_club_inform_with_club_uuid(
        &mut self,
        club_uuid: &str,
    ) -> AccessResult<Option<ClubInform>> {
        answer!(
            self,
            AccessorCall::GetClubInformWithClubUuid(club_uuid.into()),
            MaybeInform
        )
    }

    async fn get_club_informs_with_club_uuids(
        &mut self,
        club_uuids: &[String],
    ) -> AccessResult<Vec<ClubInform>> {
        answer!(
            self,
            AccessorCall::GetClubInformsWithClubUuids(club_uuids.to_vec()),
            Informs
        )
    }

    async fn get_club_informs_sort_by_update_time(
        &mut self,
        page: &InformPage,
    ) -> AccessResult<Vec<ClubInform>> {
        answer!(
            self,
            AccessorCall::GetClubInformsSortByUpdateTime(page.clone()),
            Informs
        )
    }

    async fn modify_club_inform(
        &mut self,
        club_uuid: &str,
        revision: &ClubInformRevision,
    ) -> AccessResult<u64> {
        revision.validate()?;
        answer!(
            self,
            AccessorCall::ModifyClubInform {
                club_uuid: club_uuid.into(),
                revision: revision.clone(),
            },
            Rows
        )
    }

    async fn delete_club_inform(&mut self, club_uuid: &str) -> AccessResult<u64> {
        answer!(self, AccessorCall::DeleteClubInform(club_uuid.into()), Rows)
    }

    async fn create_club_member(&mut self, input: &CreateClubMember) -> AccessResult<ClubMember> {
        input.validate()?;
        answer!(self, AccessorCall::CreateClubMember(input.clone()), Member)
    }

    async fn get_club_members_with_club_uuid(
        &mut self,
        club_uuid: &str,
    ) -> AccessResult<Vec<ClubMember>> {
        answer!(
            self,
            AccessorCall::GetClubMembersWithClubUuid(club_uuid.into()),
            Members
        )
    }

    async fn delete_club_member(
        &mut self,
        club_uuid: &str,
        student_uuid: &str,
    ) -> AccessResult<u64> {
        answer!(
            self,
            AccessorCall::DeleteClubMember {
                club_uuid: club_uuid.into(),
                student_uuid: student_uuid.into(),
            },
            Rows
        )
    }

    async fn delete_club_members_with_club_uuid(&mut self, club_uuid: &str) -> AccessResult<u64> {
        answer!(
            self,
            AccessorCall::DeleteClubMembersWithClubUuid(club_uuid.into()),
            Rows
        )
    }

    async fn create_club_recruitment(
        &mut self,
        input: &CreateClubRecruitment,
    ) -> AccessResult<ClubRecruitment> {
        input.validate()?;
        answer!(
            self,
            AccessorCall::CreateClubRecruitment(input.clone()),
            Recruitment
        )
    }

    async fn get_club_recruitment_with_uuid(
        &mut self,
        uuid: &str,
    ) -> AccessResult<Option<ClubRecruitment>> {
        answer!(
            self,
            AccessorCall::GetClubRecruitmentWithUuid(uuid.into()),
            MaybeRecruitment
        )
    }

    async fn get_current_club_recruitment_with_club_uuid(
        &mut self,
        club_uuid: &str,
    ) -> AccessResult<Option<ClubRecruitment>> {
        answer!(
            self,
            AccessorCall::GetCurrentClubRecruitmentWithClubUuid(club_uuid.into()),
            MaybeRecruitment
        )
    }

    async fn get_club_recruitments_with_club_uuid(
        &mut self,
        club_uuid: &str,
    ) -> AccessResult<Vec<ClubRecruitment>> {
        answer!(
            self,
            AccessorCall::GetClubRecruitmentsWithClubUuid(club_uuid.into()),
            Recruitments
        )
    }

    async fn modify_club_recruitment(
        &mut self,
        uuid: &str,
        revision: &RecruitmentRevision,
    ) -> AccessResult<u64> {
        revision.validate()?;
        answer!(
            self,
            AccessorCall::ModifyClubRecruitment {
                uuid: uuid.into(),
                revision: revision.clone(),
            },
            Rows
        )
    }

    async fn delete_club_recruitment(&mut self, uuid: &str) -> AccessResult<u64> {
        answer!(self, AccessorCall::DeleteClubRecruitment(uuid.into()), Rows)
    }

    async fn create_recruit_member(
        &mut self,
        input: &CreateRecruitMember,
    ) -> AccessResult<RecruitMember> {
        input.validate()?;
        answer!(
            self,
            AccessorCall::CreateRecruitMember(input.clone()),
            RecruitMember
        )
    }

    async fn get_recruit_members_with_recruitment_uuid(
        &mut self,
        recruitment_uuid: &str,
    ) -> AccessResult<Vec<RecruitMember>> {
        answer!(
            self,
            AccessorCall::GetRecruitMembersWithRecruitmentUuid(recruitment_uuid.into()),
            RecruitMembers
        )
    }

    async fn delete_recruit_members_with_recruitment_uuid(
        &mut self,
        recruitment_uuid: &str,
    ) -> AccessResult<u64> {
        answer!(
            self,
            AccessorCall::DeleteRecruitMembersWithRecruitmentUuid(recruitment_uuid.into()),
            Rows
        )
    }

    async fn commit(mut self: Box<Self>) -> AccessResult<()> {
        self.close(AccessorCall::Commit)
    }

    async fn rollback(mut self: Box<Self>) -> AccessResult<()> {
        self.close(AccessorCall::Rollback)
    }
}
