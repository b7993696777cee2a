use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, Sqlite, SqliteConnection, SqlitePool, Transaction};
use uuid::Uuid;

use crate::{
    domain::{Membership, Outcome, Role, RoleStep, StepEffect},
    error::{AppError, Result},
    repository::{parse_uuid, MembershipRepository},
};

#[derive(FromRow)]
struct MembershipRow {
    user_id: String,
    club_id: String,
    level: i64,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteMembershipRepository {
    pool: SqlitePool,
}

impl SqliteMembershipRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// A transaction that already holds the database write lock. Concurrent
    /// transitions wait on the busy timeout for it.
    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    fn row_to_membership(row: MembershipRow) -> Result<Membership> {
        Ok(Membership {
            user_id: parse_uuid(&row.user_id)?,
            club_id: parse_uuid(&row.club_id)?,
            role: Role::from_level(row.level)
                .ok_or_else(|| AppError::Database(format!("Invalid membership level: {}", row.level)))?,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    async fn rows_for(
        conn: &mut SqliteConnection,
        user_id: Uuid,
        club_id: Uuid,
    ) -> Result<Vec<Membership>> {
        let rows = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT user_id, club_id, level, created_at, updated_at
            FROM memberships
            WHERE user_id = ? AND club_id = ?
            "#,
        )
        .bind(user_id.to_string())
        .bind(club_id.to_string())
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter().map(Self::row_to_membership).collect()
    }

    /// At most one row, or an integrity fault.
    async fn single_row(
        conn: &mut SqliteConnection,
        user_id: Uuid,
        club_id: Uuid,
    ) -> Result<Option<Membership>> {
        let mut rows = Self::rows_for(conn, user_id, club_id).await?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            n => {
                tracing::error!(%user_id, %club_id, rows = n, "Duplicate membership rows");
                Err(AppError::Integrity { user_id, club_id, rows: n })
            }
        }
    }

    pub(crate) async fn owner_of(conn: &mut SqliteConnection, club_id: Uuid) -> Result<Uuid> {
        let owner = sqlx::query_scalar::<_, String>("SELECT owner_id FROM clubs WHERE id = ?")
            .bind(club_id.to_string())
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Club not found".to_string()))?;

        parse_uuid(&owner)
    }

    pub(crate) async fn insert_row(
        conn: &mut SqliteConnection,
        user_id: Uuid,
        club_id: Uuid,
        role: Role,
    ) -> Result<()> {
        let now_naive = Utc::now().naive_utc();
        sqlx::query(
            r#"
            INSERT INTO memberships (user_id, club_id, level, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id.to_string())
        .bind(club_id.to_string())
        .bind(role.level())
        .bind(now_naive)
        .bind(now_naive)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    async fn delete_row(conn: &mut SqliteConnection, user_id: Uuid, club_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM memberships WHERE user_id = ? AND club_id = ?")
            .bind(user_id.to_string())
            .bind(club_id.to_string())
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl MembershipRepository for SqliteMembershipRepository {
    async fn find(&self, user_id: Uuid, club_id: Uuid) -> Result<Vec<Membership>> {
        let mut conn = self.pool.acquire().await?;
        Self::rows_for(&mut conn, user_id, club_id).await
    }

    async fn list_for_club(&self, club_id: Uuid) -> Result<Vec<Membership>> {
        let rows = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT user_id, club_id, level, created_at, updated_at
            FROM memberships
            WHERE club_id = ?
            ORDER BY level DESC, created_at
            "#,
        )
        .bind(club_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_membership).collect()
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Membership>> {
        let rows = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT user_id, club_id, level, created_at, updated_at
            FROM memberships
            WHERE user_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_membership).collect()
    }

    async fn insert(&self, user_id: Uuid, club_id: Uuid, role: Role) -> Result<Membership> {
        let mut tx = self.begin_write().await?;
        Self::insert_row(&mut tx, user_id, club_id, role).await?;
        let membership = Self::single_row(&mut tx, user_id, club_id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created membership".to_string()))?;
        tx.commit().await?;

        Ok(membership)
    }

    async fn apply(&self, user_id: Uuid, club_id: Uuid) -> Result<Outcome> {
        let mut tx = self.begin_write().await?;

        if Self::owner_of(&mut tx, club_id).await? == user_id {
            return Ok(Outcome::AlreadyInState);
        }
        if !Self::rows_for(&mut tx, user_id, club_id).await?.is_empty() {
            return Ok(Outcome::AlreadyInState);
        }

        Self::insert_row(&mut tx, user_id, club_id, Role::Applicant).await?;
        tx.commit().await?;

        Ok(Outcome::Applied)
    }

    async fn step(&self, user_id: Uuid, club_id: Uuid, step: RoleStep) -> Result<Outcome> {
        let mut tx = self.begin_write().await?;

        let Some(current) = Self::single_row(&mut tx, user_id, club_id).await? else {
            return Ok(Outcome::PreconditionViolated);
        };

        let effect = step.effect_on(current.role);
        if let StepEffect::Set(role) = effect {
            sqlx::query(
                "UPDATE memberships SET level = ?, updated_at = ? WHERE user_id = ? AND club_id = ?",
            )
            .bind(role.level())
            .bind(Utc::now().naive_utc())
            .bind(user_id.to_string())
            .bind(club_id.to_string())
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
        }

        Ok(effect.into())
    }

    async fn leave(&self, user_id: Uuid, club_id: Uuid) -> Result<Outcome> {
        let mut tx = self.begin_write().await?;

        if Self::single_row(&mut tx, user_id, club_id).await?.is_none() {
            return Ok(Outcome::PreconditionViolated);
        }

        Self::delete_row(&mut tx, user_id, club_id).await?;
        tx.commit().await?;

        Ok(Outcome::Applied)
    }

    async fn transfer_ownership(&self, club_id: Uuid, new_owner_id: Uuid) -> Result<Outcome> {
        let mut tx = self.begin_write().await?;

        let old_owner_id = Self::owner_of(&mut tx, club_id).await?;
        if old_owner_id == new_owner_id {
            return Ok(Outcome::AlreadyInState);
        }

        match Self::single_row(&mut tx, new_owner_id, club_id).await? {
            Some(row) if row.is_officer() => {}
            _ => return Ok(Outcome::PreconditionViolated),
        }

        Self::delete_row(&mut tx, new_owner_id, club_id).await?;
        Self::insert_row(&mut tx, old_owner_id, club_id, Role::Officer).await?;
        sqlx::query("UPDATE clubs SET owner_id = ?, updated_at = ? WHERE id = ?")
            .bind(new_owner_id.to_string())
            .bind(Utc::now().naive_utc())
            .bind(club_id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Outcome::Applied)
    }
}
