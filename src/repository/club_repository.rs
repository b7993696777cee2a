use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Club, CreateClubRequest},
    error::{AppError, Result},
    repository::{parse_uuid, ClubRepository},
};

#[derive(FromRow)]
struct ClubRow {
    id: String,
    name: String,
    location: String,
    description: String,
    owner_id: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl ClubRow {
    fn into_club(self) -> Result<Club> {
        Ok(Club {
            id: parse_uuid(&self.id)?,
            name: self.name,
            location: self.location,
            description: self.description,
            owner_id: parse_uuid(&self.owner_id)?,
            created_at: DateTime::from_naive_utc_and_offset(self.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(self.updated_at, Utc),
        })
    }
}

pub struct SqliteClubRepository {
    pool: SqlitePool,
}

impl SqliteClubRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClubRepository for SqliteClubRepository {
    async fn create(&self, request: CreateClubRequest, owner_id: Uuid) -> Result<Club> {
        let id = Uuid::new_v4();
        let now_naive = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO clubs (id, name, location, description, owner_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&request.name)
        .bind(&request.location)
        .bind(&request.description)
        .bind(owner_id.to_string())
        .bind(now_naive)
        .bind(now_naive)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created club".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Club>> {
        let row = sqlx::query_as::<_, ClubRow>(
            r#"
            SELECT id, name, location, description, owner_id, created_at, updated_at
            FROM clubs
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ClubRow::into_club).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Club>> {
        let row = sqlx::query_as::<_, ClubRow>(
            r#"
            SELECT id, name, location, description, owner_id, created_at, updated_at
            FROM clubs
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ClubRow::into_club).transpose()
    }

    async fn list(&self) -> Result<Vec<Club>> {
        let rows = sqlx::query_as::<_, ClubRow>(
            r#"
            SELECT id, name, location, description, owner_id, created_at, updated_at
            FROM clubs
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ClubRow::into_club).collect()
    }

    async fn list_owned_by(&self, owner_id: Uuid) -> Result<Vec<Club>> {
        let rows = sqlx::query_as::<_, ClubRow>(
            r#"
            SELECT id, name, location, description, owner_id, created_at, updated_at
            FROM clubs
            WHERE owner_id = ?
            ORDER BY name
            "#,
        )
        .bind(owner_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ClubRow::into_club).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM clubs WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
