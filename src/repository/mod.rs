use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::domain::*;
use crate::error::{AppError, Result};

pub mod user_repository;
pub mod club_repository;
pub mod membership_repository;

pub use user_repository::SqliteUserRepository;
pub use club_repository::SqliteClubRepository;
pub use membership_repository::SqliteMembershipRepository;

/// Open a pool against `config.url` and bring the schema up to date.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

pub(crate) fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| AppError::Database(e.to_string()))
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: CreateUserRequest, password_hash: &str) -> Result<User>;
    /// Create the user and their applicant row in `club_id` in one
    /// transaction. Nothing is written when the club does not exist.
    async fn create_applicant(
        &self,
        user: CreateUserRequest,
        password_hash: &str,
        club_id: Uuid,
    ) -> Result<User>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>>;
    /// The owner plus every user holding a membership row in the club.
    async fn list_for_club(&self, club_id: Uuid) -> Result<Vec<User>>;
    async fn update_profile(&self, id: Uuid, update: UpdateProfileRequest) -> Result<User>;
    async fn set_active(&self, id: Uuid, active: bool) -> Result<User>;
    async fn password_hash(&self, id: Uuid) -> Result<Option<String>>;
    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait ClubRepository: Send + Sync {
    async fn create(&self, club: CreateClubRequest, owner_id: Uuid) -> Result<Club>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Club>>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Club>>;
    async fn list(&self) -> Result<Vec<Club>>;
    async fn list_owned_by(&self, owner_id: Uuid) -> Result<Vec<Club>>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// Membership reads and the atomic transitions over them.
///
/// Every mutating method runs as one read-modify-write transaction and
/// fails with [`AppError::Integrity`] when it finds more than one row for
/// a (user, club) pair.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    async fn find(&self, user_id: Uuid, club_id: Uuid) -> Result<Vec<Membership>>;
    async fn list_for_club(&self, club_id: Uuid) -> Result<Vec<Membership>>;
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Membership>>;
    /// Insert a row with an explicit role. Used for seeding.
    async fn insert(&self, user_id: Uuid, club_id: Uuid, role: Role) -> Result<Membership>;
    /// Create an applicant row unless the user is already part of the club.
    async fn apply(&self, user_id: Uuid, club_id: Uuid) -> Result<Outcome>;
    async fn step(&self, user_id: Uuid, club_id: Uuid, step: RoleStep) -> Result<Outcome>;
    /// Delete the user's row outright.
    async fn leave(&self, user_id: Uuid, club_id: Uuid) -> Result<Outcome>;
    /// Swap the current owner and `new_owner_id`: the old owner gets an
    /// officer row, the new owner's row is deleted and the club's owner is
    /// reassigned, all in one transaction.
    async fn transfer_ownership(&self, club_id: Uuid, new_owner_id: Uuid) -> Result<Outcome>;
}
