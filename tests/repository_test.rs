mod common;

use common::{memory_pool, profile};
use rookery::{
    domain::{ChessLevel, CreateClubRequest, Outcome, Role, RoleStep, UpdateProfileRequest},
    error::AppError,
    repository::{
        ClubRepository, MembershipRepository, SqliteClubRepository, SqliteMembershipRepository,
        SqliteUserRepository, UserRepository,
    },
};
use uuid::Uuid;

#[tokio::test]
async fn test_user_crud() -> anyhow::Result<()> {
    let pool = memory_pool().await?;
    let repo = SqliteUserRepository::new(pool.clone());

    let user = repo
        .create(profile("test@example.com", "Test", ChessLevel::Master), "hash")
        .await?;
    assert_eq!(user.email, "test@example.com");
    assert_eq!(user.chess_level, ChessLevel::Master);
    assert!(user.is_active);

    let found = repo.find_by_id(user.id).await?;
    assert_eq!(found.map(|u| u.id), Some(user.id));

    let found_by_email = repo.find_by_email("test@example.com").await?;
    assert_eq!(found_by_email.map(|u| u.email), Some("test@example.com".to_string()));

    assert_eq!(repo.list(10, 0).await?.len(), 1);
    assert_eq!(repo.password_hash(user.id).await?.as_deref(), Some("hash"));

    let update = UpdateProfileRequest {
        first_name: Some("Renamed".to_string()),
        chess_level: Some(ChessLevel::Beginner),
        ..Default::default()
    };
    let updated = repo.update_profile(user.id, update).await?;
    assert_eq!(updated.first_name, "Renamed");
    assert_eq!(updated.last_name, "Kerman");
    assert_eq!(updated.chess_level, ChessLevel::Beginner);

    let inactive = repo.set_active(user.id, false).await?;
    assert!(!inactive.is_active);

    repo.delete(user.id).await?;
    assert!(repo.find_by_id(user.id).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_club_crud_and_cascade() -> anyhow::Result<()> {
    let pool = memory_pool().await?;
    let users = SqliteUserRepository::new(pool.clone());
    let clubs = SqliteClubRepository::new(pool.clone());
    let memberships = SqliteMembershipRepository::new(pool.clone());

    let owner = users
        .create(profile("owner@example.org", "Owner", ChessLevel::Beginner), "hash")
        .await?;
    let member = users
        .create(profile("member@example.org", "Member", ChessLevel::Beginner), "hash")
        .await?;

    let club = clubs
        .create(
            CreateClubRequest {
                name: "Eve Endgames".to_string(),
                location: "Eve".to_string(),
                description: "Purple".to_string(),
            },
            owner.id,
        )
        .await?;
    assert_eq!(clubs.find_by_name("Eve Endgames").await?.map(|c| c.id), Some(club.id));
    assert_eq!(clubs.list_owned_by(owner.id).await?.len(), 1);

    memberships.insert(member.id, club.id, Role::Member).await?;

    let club_users = users.list_for_club(club.id).await?;
    assert_eq!(club_users.len(), 2);

    clubs.delete(club.id).await?;
    assert!(clubs.find_by_id(club.id).await?.is_none());
    assert!(memberships.list_for_user(member.id).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_membership_steps() -> anyhow::Result<()> {
    let pool = memory_pool().await?;
    let users = SqliteUserRepository::new(pool.clone());
    let clubs = SqliteClubRepository::new(pool.clone());
    let memberships = SqliteMembershipRepository::new(pool.clone());

    let owner = users
        .create(profile("owner@example.org", "Owner", ChessLevel::Beginner), "hash")
        .await?;
    let player = users
        .create(profile("player@example.org", "Player", ChessLevel::Beginner), "hash")
        .await?;
    let club = clubs
        .create(
            CreateClubRequest {
                name: "Tylo Tacticians".to_string(),
                location: "Tylo".to_string(),
                description: "Heavy".to_string(),
            },
            owner.id,
        )
        .await?;

    assert_eq!(
        memberships.step(player.id, club.id, RoleStep::Accept).await?,
        Outcome::PreconditionViolated
    );

    assert_eq!(memberships.apply(player.id, club.id).await?, Outcome::Applied);
    assert_eq!(memberships.apply(player.id, club.id).await?, Outcome::AlreadyInState);
    assert_eq!(memberships.apply(owner.id, club.id).await?, Outcome::AlreadyInState);

    let steps = [
        (RoleStep::Promote, Outcome::PreconditionViolated),
        (RoleStep::Accept, Outcome::Applied),
        (RoleStep::Accept, Outcome::AlreadyInState),
        (RoleStep::Promote, Outcome::Applied),
    ];
    for (step, expected) in steps {
        let outcome = memberships.step(player.id, club.id, step).await?;
        assert_eq!(outcome, expected, "{:?}", step);
    }

    let rows = memberships.find(player.id, club.id).await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].role, Role::Officer);

    assert_eq!(memberships.leave(player.id, club.id).await?, Outcome::Applied);
    assert!(memberships.find(player.id, club.id).await?.is_empty());

    memberships.insert(player.id, club.id, Role::Member).await?;
    let second_row = memberships.insert(player.id, club.id, Role::Member).await;
    assert!(matches!(second_row, Err(AppError::Database(_))));

    Ok(())
}

#[tokio::test]
async fn test_create_applicant_is_all_or_nothing() -> anyhow::Result<()> {
    let pool = memory_pool().await?;
    let users = SqliteUserRepository::new(pool.clone());
    let clubs = SqliteClubRepository::new(pool.clone());
    let memberships = SqliteMembershipRepository::new(pool.clone());

    let missing = users
        .create_applicant(
            profile("early@example.org", "Early", ChessLevel::Beginner),
            "hash",
            Uuid::new_v4(),
        )
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
    assert!(users.find_by_email("early@example.org").await?.is_none());

    let owner = users
        .create(profile("owner@example.org", "Owner", ChessLevel::Beginner), "hash")
        .await?;
    let club = clubs
        .create(
            CreateClubRequest {
                name: "Laythe Lancers".to_string(),
                location: "Laythe".to_string(),
                description: "Ocean moon".to_string(),
            },
            owner.id,
        )
        .await?;

    let user = users
        .create_applicant(
            profile("early@example.org", "Early", ChessLevel::Beginner),
            "hash",
            club.id,
        )
        .await?;
    let rows = memberships.find(user.id, club.id).await?;
    assert_eq!(rows.iter().map(|m| m.role).collect::<Vec<_>>(), vec![Role::Applicant]);

    Ok(())
}

#[tokio::test]
async fn test_password_hashing() -> anyhow::Result<()> {
    use rookery::auth;

    let hash = auth::hash_password("my_Secure_password1")?;

    assert!(auth::verify_password("my_Secure_password1", &hash)?);
    assert!(!auth::verify_password("wrong_password", &hash)?);

    Ok(())
}
