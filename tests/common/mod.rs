#![allow(dead_code)]

use rookery::{
    auth::Actor,
    domain::{ChessLevel, Club, CreateClubRequest, CreateUserRequest, Role, User},
    service::ServiceContext,
};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

pub const PASSWORD: &str = "Password123";

/// A single connection, since every `:memory:` connection is its own database.
pub async fn memory_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

pub async fn context() -> anyhow::Result<ServiceContext> {
    Ok(ServiceContext::new(memory_pool().await?))
}

pub fn profile(email: &str, first_name: &str, level: ChessLevel) -> CreateUserRequest {
    CreateUserRequest {
        email: email.to_string(),
        first_name: first_name.to_string(),
        last_name: "Kerman".to_string(),
        bio: String::new(),
        chess_level: level,
        personal_statement: String::new(),
    }
}

pub async fn user(ctx: &ServiceContext, email: &str, first_name: &str) -> anyhow::Result<User> {
    Ok(ctx
        .user_service
        .create_user(profile(email, first_name, ChessLevel::Beginner), PASSWORD)
        .await?)
}

pub async fn club(ctx: &ServiceContext, owner: &User, name: &str) -> anyhow::Result<Club> {
    Ok(ctx
        .club_service
        .create_club(
            &Actor::from(owner.clone()),
            CreateClubRequest {
                name: name.to_string(),
                location: "Kerbin".to_string(),
                description: "Rocket chess".to_string(),
            },
        )
        .await?)
}

/// A club with an owner and one user per role.
pub struct Fixture {
    pub club: Club,
    pub owner: User,
    pub officer: User,
    pub member: User,
    pub applicant: User,
    pub removed: User,
    pub outsider: User,
}

pub async fn fixture(ctx: &ServiceContext) -> anyhow::Result<Fixture> {
    let owner = user(ctx, "owner@example.org", "Gemsbok").await?;
    let officer = user(ctx, "officer@example.org", "Jebediah").await?;
    let member = user(ctx, "member@example.org", "Valentina").await?;
    let applicant = user(ctx, "applicant@example.org", "Billie").await?;
    let removed = user(ctx, "removed@example.org", "Bob").await?;
    let outsider = user(ctx, "outsider@example.org", "Bill").await?;

    let club = club(ctx, &owner, "Kerbal Chess Club").await?;
    for (u, role) in [
        (&officer, Role::Officer),
        (&member, Role::Member),
        (&applicant, Role::Applicant),
        (&removed, Role::Removed),
    ] {
        ctx.membership_repo.insert(u.id, club.id, role).await?;
    }

    Ok(Fixture { club, owner, officer, member, applicant, removed, outsider })
}

pub fn actor(user: &User) -> Actor {
    Actor::from(user.clone())
}
