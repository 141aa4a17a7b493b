//! Postgres-backed [`ClubAccessor`] bound to one `sqlx` transaction.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use super::{AccessResult, ClubAccessor};
use crate::classify::{classify, Statement};
use crate::error::StorageError;
use crate::models::club::{Club, CreateClub};
use crate::models::club_inform::{
    ClubInform, ClubInformFilter, ClubInformRevision, CreateClubInform, InformPage,
};
use crate::models::club_member::{ClubMember, CreateClubMember};
use crate::models::club_recruitment::{
    ClubRecruitment, CreateClubRecruitment, PeriodChange, RecruitmentRevision,
};
use crate::models::recruit_member::{CreateRecruitMember, RecruitMember};

/// Escape `LIKE` wildcards so caller text matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

const CLUB_COLUMNS: &str = "uuid, leader_uuid, created_at, updated_at";

const INFORM_COLUMNS: &str = "club_uuid, name, club_concept, introduction, field, location, \
    floor, link, logo_uri, created_at, updated_at";

const MEMBER_COLUMNS: &str = "club_uuid, student_uuid, created_at";

const RECRUITMENT_COLUMNS: &str =
    "uuid, club_uuid, recruit_concept, start_period, end_period, created_at, updated_at";

const RECRUIT_MEMBER_COLUMNS: &str = "recruitment_uuid, grade, field, number, created_at";

/// Accessor owning an open Postgres transaction.
pub struct PgClubAccessor {
    tx: Transaction<'static, Postgres>,
}

impl PgClubAccessor {
    /// Open a new transaction on `pool`.
    pub async fn begin(pool: &PgPool) -> AccessResult<Self> {
        let tx = pool
            .begin()
            .await
            .map_err(|e| classify(e, Statement::Begin))?;
        Ok(Self { tx })
    }

    async fn inform_with_name(&mut self, name: &str) -> AccessResult<Option<ClubInform>> {
        let query = format!("SELECT {INFORM_COLUMNS} FROM club_inform WHERE name = $1");
        sqlx::query_as::<_, ClubInform>(&query)
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| classify(e, Statement::Select))
    }

    async fn inform_with_location(&mut self, location: &str) -> AccessResult<Option<ClubInform>> {
        let query = format!("SELECT {INFORM_COLUMNS} FROM club_inform WHERE location = $1");
        sqlx::query_as::<_, ClubInform>(&query)
            .bind(location)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| classify(e, Statement::Select))
    }

    async fn member_exists(&mut self, club_uuid: &str, student_uuid: &str) -> AccessResult<bool> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM club_member WHERE club_uuid = $1 AND student_uuid = $2)",
        )
        .bind(club_uuid)
        .bind(student_uuid)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| classify(e, Statement::Select))?;
        Ok(row.0)
    }
}

#[async_trait]
impl ClubAccessor for PgClubAccessor {
    // -----------------------------------------------------------------------
    // club
    // -----------------------------------------------------------------------

    async fn create_club(&mut self, input: &CreateClub) -> AccessResult<Club> {
        input.validate()?;

        if self.get_club_with_uuid(&input.uuid).await?.is_some() {
            return Err(StorageError::duplicate("uuid", &input.uuid));
        }
        if self
            .get_club_with_leader_uuid(&input.leader_uuid)
            .await?
            .is_some()
        {
            return Err(StorageError::duplicate("leader_uuid", &input.leader_uuid));
        }

        let query = format!(
            "INSERT INTO club (uuid, leader_uuid) VALUES ($1, $2) RETURNING {CLUB_COLUMNS}"
        );
        sqlx::query_as::<_, Club>(&query)
            .bind(&input.uuid)
            .bind(&input.leader_uuid)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| classify(e, Statement::Insert))
    }

    async fn get_club_with_uuid(&mut self, uuid: &str) -> AccessResult<Option<Club>> {
        let query = format!("SELECT {CLUB_COLUMNS} FROM club WHERE uuid = $1");
        sqlx::query_as::<_, Club>(&query)
            .bind(uuid)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| classify(e, Statement::Select))
    }

    async fn get_club_with_leader_uuid(
        &mut self,
        leader_uuid: &str,
    ) -> AccessResult<Option<Club>> {
        let query = format!("SELECT {CLUB_COLUMNS} FROM club WHERE leader_uuid = $1");
        sqlx::query_as::<_, Club>(&query)
            .bind(leader_uuid)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| classify(e, Statement::Select))
    }

    async fn change_club_leader(&mut self, uuid: &str, leader_uuid: &str) -> AccessResult<u64> {
        club_core::ids::validate_club_uuid(uuid)?;
        club_core::ids::validate_leader_uuid(leader_uuid)?;

        if let Some(existing) = self.get_club_with_leader_uuid(leader_uuid).await? {
            if existing.uuid != uuid {
                return Err(StorageError::duplicate("leader_uuid", leader_uuid));
            }
        }

        let result =
            sqlx::query("UPDATE club SET leader_uuid = $2, updated_at = NOW() WHERE uuid = $1")
                .bind(uuid)
                .bind(leader_uuid)
                .execute(&mut *self.tx)
                .await
                .map_err(|e| classify(e, Statement::Update))?;
        Ok(result.rows_affected())
    }

    async fn delete_club(&mut self, uuid: &str) -> AccessResult<u64> {
        let result = sqlx::query("DELETE FROM club WHERE uuid = $1")
            .bind(uuid)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| classify(e, Statement::Delete))?;
        Ok(result.rows_affected())
    }

    // -----------------------------------------------------------------------
    // club inform
    // -----------------------------------------------------------------------

    async fn create_club_inform(&mut self, input: &CreateClubInform) -> AccessResult<ClubInform> {
        input.validate()?;

        if self
            .get_club_inform_with_club_uuid(&input.club_uuid)
            .await?
            .is_some()
        {
            return Err(StorageError::duplicate("club_uuid", &input.club_uuid));
        }
        if self.inform_with_name(&input.name).await?.is_some() {
            return Err(StorageError::duplicate("name", &input.name));
        }
        if self.inform_with_location(&input.location).await?.is_some() {
            return Err(StorageError::duplicate("location", &input.location));
        }

        let query = format!(
            "INSERT INTO club_inform \
                (club_uuid, name, club_concept, introduction, field, location, floor, link, logo_uri) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {INFORM_COLUMNS}"
        );
        sqlx::query_as::<_, ClubInform>(&query)
            .bind(&input.club_uuid)
            .bind(&input.name)
            .bind(&input.club_concept)
            .bind(&input.introduction)
            .bind(&input.field)
            .bind(&input.location)
            .bind(&input.floor)
            .bind(&input.link)
            .bind(&input.logo_uri)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| classify(e, Statement::Insert))
    }

    async fn get_club_inform_with_club_uuid(
        &mut self,
        club_uuid: &str,
    ) -> AccessResult<Option<ClubInform>> {
        let query = format!("SELECT {INFORM_COLUMNS} FROM club_inform WHERE club_uuid = $1");
        sqlx::query_as::<_, ClubInform>(&query)
            .bind(club_uuid)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| classify(e, Statement::Select))
    }

    async fn get_club_informs_with_club_uuids(
        &mut self,
        club_uuids: &[String],
    ) -> AccessResult<Vec<ClubInform>> {
        let query = format!(
            "SELECT {INFORM_COLUMNS} FROM club_inform \
             WHERE club_uuid = ANY($1) ORDER BY updated_at DESC"
        );
        sqlx::query_as::<_, ClubInform>(&query)
            .bind(club_uuids)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| classify(e, Statement::Select))
    }

    async fn get_club_informs_sort_by_update_time(
        &mut self,
        page: &InformPage,
    ) -> AccessResult<Vec<ClubInform>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {INFORM_COLUMNS} FROM club_inform"
        ));
        match &page.filter {
            Some(ClubInformFilter::Field(field)) => {
                qb.push(" WHERE field = ").push_bind(field.clone());
            }
            Some(ClubInformFilter::Name(name)) => {
                qb.push(" WHERE name ILIKE '%' || ")
                    .push_bind(escape_like(name))
                    .push(" || '%' ESCAPE '\\'");
            }
            None => {}
        }
        qb.push(" ORDER BY updated_at DESC, club_uuid LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);

        qb.build_query_as::<ClubInform>()
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| classify(e, Statement::Select))
    }

    async fn modify_club_inform(
        &mut self,
        club_uuid: &str,
        revision: &ClubInformRevision,
    ) -> AccessResult<u64> {
        revision.validate()?;

        if let Some(name) = revision.provided_name() {
            if let Some(existing) = self.inform_with_name(name).await? {
                if existing.club_uuid != club_uuid {
                    return Err(StorageError::duplicate("name", name));
                }
            }
        }
        if let Some(location) = revision.provided_location() {
            if let Some(existing) = self.inform_with_location(location).await? {
                if existing.club_uuid != club_uuid {
                    return Err(StorageError::duplicate("location", location));
                }
            }
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE club_inform SET updated_at = NOW()");
        for (column, value) in revision.changes() {
            qb.push(", ")
                .push(column)
                .push(" = ")
                .push_bind(value.to_string());
        }
        qb.push(" WHERE club_uuid = ").push_bind(club_uuid.to_string());

        let result = qb
            .build()
            .execute(&mut *self.tx)
            .await
            .map_err(|e| classify(e, Statement::Update))?;
        Ok(result.rows_affected())
    }

    async fn delete_club_inform(&mut self, club_uuid: &str) -> AccessResult<u64> {
        let result = sqlx::query("DELETE FROM club_inform WHERE club_uuid = $1")
            .bind(club_uuid)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| classify(e, Statement::Delete))?;
        Ok(result.rows_affected())
    }

    // -----------------------------------------------------------------------
    // club member
    // -----------------------------------------------------------------------

    async fn create_club_member(&mut self, input: &CreateClubMember) -> AccessResult<ClubMember> {
        input.validate()?;

        if self
            .member_exists(&input.club_uuid, &input.student_uuid)
            .await?
        {
            return Err(StorageError::duplicate(
                "club_uuid_student_uuid",
                input.key_value(),
            ));
        }

        let query = format!(
            "INSERT INTO club_member (club_uuid, student_uuid) VALUES ($1, $2) \
             RETURNING {MEMBER_COLUMNS}"
        );
        sqlx::query_as::<_, ClubMember>(&query)
            .bind(&input.club_uuid)
            .bind(&input.student_uuid)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| classify(e, Statement::Insert))
    }

    async fn get_club_members_with_club_uuid(
        &mut self,
        club_uuid: &str,
    ) -> AccessResult<Vec<ClubMember>> {
        let query = format!(
            "SELECT {MEMBER_COLUMNS} FROM club_member WHERE club_uuid = $1 \
             ORDER BY created_at, student_uuid"
        );
        sqlx::query_as::<_, ClubMember>(&query)
            .bind(club_uuid)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| classify(e, Statement::Select))
    }

    async fn delete_club_member(
        &mut self,
        club_uuid: &str,
        student_uuid: &str,
    ) -> AccessResult<u64> {
        let result =
            sqlx::query("DELETE FROM club_member WHERE club_uuid = $1 AND student_uuid = $2")
                .bind(club_uuid)
                .bind(student_uuid)
                .execute(&mut *self.tx)
                .await
                .map_err(|e| classify(e, Statement::Delete))?;
        Ok(result.rows_affected())
    }

    async fn delete_club_members_with_club_uuid(&mut self, club_uuid: &str) -> AccessResult<u64> {
        let result = sqlx::query("DELETE FROM club_member WHERE club_uuid = $1")
            .bind(club_uuid)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| classify(e, Statement::Delete))?;
        Ok(result.rows_affected())
    }

    // -----------------------------------------------------------------------
    // club recruitment
    // -----------------------------------------------------------------------

    async fn create_club_recruitment(
        &mut self,
        input: &CreateClubRecruitment,
    ) -> AccessResult<ClubRecruitment> {
        input.validate()?;

        if self
            .get_club_recruitment_with_uuid(&input.uuid)
            .await?
            .is_some()
        {
            return Err(StorageError::duplicate("uuid", &input.uuid));
        }

        let query = format!(
            "INSERT INTO club_recruitment \
                (uuid, club_uuid, recruit_concept, start_period, end_period) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {RECRUITMENT_COLUMNS}"
        );
        sqlx::query_as::<_, ClubRecruitment>(&query)
            .bind(&input.uuid)
            .bind(&input.club_uuid)
            .bind(&input.recruit_concept)
            .bind(input.start_period)
            .bind(input.end_period)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| classify(e, Statement::Insert))
    }

    async fn get_club_recruitment_with_uuid(
        &mut self,
        uuid: &str,
    ) -> AccessResult<Option<ClubRecruitment>> {
        let query = format!("SELECT {RECRUITMENT_COLUMNS} FROM club_recruitment WHERE uuid = $1");
        sqlx::query_as::<_, ClubRecruitment>(&query)
            .bind(uuid)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| classify(e, Statement::Select))
    }

    async fn get_current_club_recruitment_with_club_uuid(
        &mut self,
        club_uuid: &str,
    ) -> AccessResult<Option<ClubRecruitment>> {
        let query = format!(
            "SELECT {RECRUITMENT_COLUMNS} FROM club_recruitment \
             WHERE club_uuid = $1 AND (end_period IS NULL OR end_period >= CURRENT_DATE) \
             ORDER BY created_at DESC LIMIT 1"
        );
        sqlx::query_as::<_, ClubRecruitment>(&query)
            .bind(club_uuid)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| classify(e, Statement::Select))
    }

    async fn get_club_recruitments_with_club_uuid(
        &mut self,
        club_uuid: &str,
    ) -> AccessResult<Vec<ClubRecruitment>> {
        let query = format!(
            "SELECT {RECRUITMENT_COLUMNS} FROM club_recruitment \
             WHERE club_uuid = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, ClubRecruitment>(&query)
            .bind(club_uuid)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| classify(e, Statement::Select))
    }

    async fn modify_club_recruitment(
        &mut self,
        uuid: &str,
        revision: &RecruitmentRevision,
    ) -> AccessResult<u64> {
        revision.validate()?;

        let mut qb =
            QueryBuilder::<Postgres>::new("UPDATE club_recruitment SET updated_at = NOW()");
        if let Some(concept) = revision.provided_concept() {
            qb.push(", recruit_concept = ").push_bind(concept.to_string());
        }
        match revision.period {
            PeriodChange::Keep => {}
            PeriodChange::Set { start, end } => {
                qb.push(", start_period = ")
                    .push_bind(start)
                    .push(", end_period = ")
                    .push_bind(end);
            }
            PeriodChange::Clear => {
                qb.push(", start_period = NULL, end_period = NULL");
            }
        }
        qb.push(" WHERE uuid = ").push_bind(uuid.to_string());

        let result = qb
            .build()
            .execute(&mut *self.tx)
            .await
            .map_err(|e| classify(e, Statement::Update))?;
        Ok(result.rows_affected())
    }

    async fn delete_club_recruitment(&mut self, uuid: &str) -> AccessResult<u64> {
        let result = sqlx::query("DELETE FROM club_recruitment WHERE uuid = $1")
            .bind(uuid)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| classify(e, Statement::Delete))?;
        Ok(result.rows_affected())
    }

    // -----------------------------------------------------------------------
    // recruit member
    // -----------------------------------------------------------------------

    async fn create_recruit_member(
        &mut self,
        input: &CreateRecruitMember,
    ) -> AccessResult<RecruitMember> {
        input.validate()?;

        let query = format!(
            "INSERT INTO recruit_member (recruitment_uuid, grade, field, number) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {RECRUIT_MEMBER_COLUMNS}"
        );
        sqlx::query_as::<_, RecruitMember>(&query)
            .bind(&input.recruitment_uuid)
            .bind(input.grade)
            .bind(&input.field)
            .bind(input.number)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| classify(e, Statement::Insert))
    }

    async fn get_recruit_members_with_recruitment_uuid(
        &mut self,
        recruitment_uuid: &str,
    ) -> AccessResult<Vec<RecruitMember>> {
        let query = format!(
            "SELECT {RECRUIT_MEMBER_COLUMNS} FROM recruit_member \
             WHERE recruitment_uuid = $1 ORDER BY grade, field"
        );
        sqlx::query_as::<_, RecruitMember>(&query)
            .bind(recruitment_uuid)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| classify(e, Statement::Select))
    }

    async fn delete_recruit_members_with_recruitment_uuid(
        &mut self,
        recruitment_uuid: &str,
    ) -> AccessResult<u64> {
        let result = sqlx::query("DELETE FROM recruit_member WHERE recruitment_uuid = $1")
            .bind(recruitment_uuid)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| classify(e, Statement::Delete))?;
        Ok(result.rows_affected())
    }

    // -----------------------------------------------------------------------
    // transaction
    // -----------------------------------------------------------------------

    async fn commit(self: Box<Self>) -> AccessResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| classify(e, Statement::Commit))
    }

    async fn rollback(self: Box<Self>) -> AccessResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| classify(e, Statement::Rollback))
    }
}
