mod common;

use common::{actor, context, fixture, profile, user, PASSWORD};
use rookery::{
    auth::Actor,
    authz::{Denial, PermissionReason},
    domain::{ChessLevel, CreateClubRequest, Role, UpdateProfileRequest},
    error::AppError,
    service::Verdict,
};
use uuid::Uuid;

#[tokio::test]
async fn test_create_club() -> anyhow::Result<()> {
    let ctx = context().await?;
    let owner = user(&ctx, "gemsbok@owners.org", "Gemsbok").await?;

    let request = CreateClubRequest {
        name: "Mun Knights".to_string(),
        location: "Mun".to_string(),
        description: "Low gravity openings".to_string(),
    };

    let anonymous = ctx.club_service.create_club(&Actor::Anonymous, request.clone()).await;
    assert!(matches!(anonymous, Err(AppError::Unauthorized)));

    let club = ctx.club_service.create_club(&actor(&owner), request.clone()).await?;
    assert_eq!(club.owner_id, owner.id);
    assert!(ctx.membership_service.membership(owner.id, club.id).await?.is_none());
    assert!(ctx.membership_service.is_part_of(owner.id, club.id).await?);

    let duplicate = ctx.club_service.create_club(&actor(&owner), request).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let blank = ctx
        .club_service
        .create_club(
            &actor(&owner),
            CreateClubRequest {
                name: "   ".to_string(),
                location: "Minmus".to_string(),
                description: "Mint".to_string(),
            },
        )
        .await;
    assert!(matches!(blank, Err(AppError::Validation(_))));

    Ok(())
}

#[tokio::test]
async fn test_directory_visibility() -> anyhow::Result<()> {
    let ctx = context().await?;
    let f = fixture(&ctx).await?;

    let as_member = ctx
        .club_service
        .directory(&actor(&f.member), f.club.id)
        .await?
        .granted()
        .ok_or_else(|| anyhow::anyhow!("member should see the directory"))?;
    assert_eq!(as_member.officers.len(), 1);
    assert_eq!(as_member.members.len(), 1);
    assert!(as_member.applicants.is_empty());
    assert!(as_member.removed.is_empty());
    assert!(!as_member.viewer_is_owner);

    let as_officer = ctx
        .club_service
        .directory(&actor(&f.officer), f.club.id)
        .await?
        .granted()
        .ok_or_else(|| anyhow::anyhow!("officer should see the directory"))?;
    assert_eq!(as_officer.applicants.len(), 1);
    assert!(as_officer.removed.is_empty());

    let as_owner = ctx
        .club_service
        .directory(&actor(&f.owner), f.club.id)
        .await?
        .granted()
        .ok_or_else(|| anyhow::anyhow!("owner should see the directory"))?;
    assert!(as_owner.viewer_is_owner);
    assert_eq!(as_owner.removed.len(), 1);

    let as_applicant = ctx.club_service.directory(&actor(&f.applicant), f.club.id).await?;
    assert_eq!(
        as_applicant.denial(),
        Some(Denial::PermissionDenied(PermissionReason::NotAuthorizedRole))
    );

    let anonymous = ctx.club_service.directory(&Actor::Anonymous, f.club.id).await?;
    assert_eq!(anonymous.denial(), Some(Denial::Unauthenticated));

    Ok(())
}

#[tokio::test]
async fn test_directory_hides_inactive_users() -> anyhow::Result<()> {
    let ctx = context().await?;
    let f = fixture(&ctx).await?;

    ctx.user_service.set_active(f.member.id, false).await?;

    let as_owner = ctx
        .club_service
        .directory(&actor(&f.owner), f.club.id)
        .await?
        .granted()
        .ok_or_else(|| anyhow::anyhow!("owner should see the directory"))?;
    assert!(as_owner.members.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_overview_counts() -> anyhow::Result<()> {
    let ctx = context().await?;
    let f = fixture(&ctx).await?;

    ctx.user_service
        .update_profile(
            f.officer.id,
            UpdateProfileRequest {
                chess_level: Some(ChessLevel::GrandMaster),
                ..Default::default()
            },
        )
        .await?;

    let overview = ctx.club_service.overview(&actor(&f.outsider), f.club.id).await?;
    assert_eq!(overview.applicant_count, 1);
    // Officer, member and owner.
    assert_eq!(overview.member_count, 3);
    assert_eq!(overview.master_count, 1);
    assert_eq!(overview.owner.map(|u| u.id), Some(f.owner.id));
    assert!(overview.viewer_can_apply);

    let as_removed = ctx.club_service.overview(&actor(&f.removed), f.club.id).await?;
    assert!(!as_removed.viewer_can_apply);

    let anonymous = ctx.club_service.overview(&Actor::Anonymous, f.club.id).await?;
    assert!(anonymous.viewer_can_apply);

    Ok(())
}

#[tokio::test]
async fn test_partition_for_user() -> anyhow::Result<()> {
    let ctx = context().await?;
    let f = fixture(&ctx).await?;
    let second = common::club(&ctx, &f.outsider, "Duna Dragons").await?;

    let member = ctx.club_service.partition_for(f.member.id).await?;
    assert_eq!(member.yours.iter().map(|c| c.id).collect::<Vec<_>>(), vec![f.club.id]);
    assert_eq!(member.others.iter().map(|c| c.id).collect::<Vec<_>>(), vec![second.id]);

    // Removed rows do not count as yours.
    let removed = ctx.club_service.partition_for(f.removed.id).await?;
    assert!(removed.yours.is_empty());
    assert_eq!(removed.others.len(), 2);

    let owner = ctx.club_service.partition_for(f.outsider.id).await?;
    assert_eq!(owner.yours.iter().map(|c| c.id).collect::<Vec<_>>(), vec![second.id]);

    Ok(())
}

#[tokio::test]
async fn test_profile_visibility() -> anyhow::Result<()> {
    let ctx = context().await?;
    let f = fixture(&ctx).await?;

    let denied = ctx
        .club_service
        .profile(&actor(&f.member), f.club.id, f.applicant.id)
        .await?;
    assert_eq!(
        denied,
        Verdict::Denied(Denial::PermissionDenied(PermissionReason::NotAuthorizedRole))
    );

    let seen = ctx
        .club_service
        .profile(&actor(&f.officer), f.club.id, f.applicant.id)
        .await?
        .granted()
        .ok_or_else(|| anyhow::anyhow!("officer should see applicants"))?;
    assert_eq!(seen.user.id, f.applicant.id);
    assert_eq!(seen.membership.map(|m| m.role), Some(Role::Applicant));
    assert!(!seen.is_owner);

    let owner = ctx
        .club_service
        .profile(&actor(&f.member), f.club.id, f.owner.id)
        .await?
        .granted()
        .ok_or_else(|| anyhow::anyhow!("member should see the owner"))?;
    assert!(owner.is_owner);
    assert!(owner.membership.is_none());

    Ok(())
}

#[tokio::test]
async fn test_sign_up_and_log_in() -> anyhow::Result<()> {
    let ctx = context().await?;
    let f = fixture(&ctx).await?;

    let new_user = profile("newbie@example.org", "Newbie", ChessLevel::Intermediate);
    let request = rookery::domain::SignUpRequest {
        email: new_user.email.clone(),
        first_name: new_user.first_name.clone(),
        last_name: new_user.last_name.clone(),
        bio: String::new(),
        chess_level: new_user.chess_level,
        personal_statement: "I like rockets".to_string(),
        password: PASSWORD.to_string(),
        password_confirmation: PASSWORD.to_string(),
        club_id: f.club.id,
    };

    let mismatched = ctx
        .user_service
        .sign_up(rookery::domain::SignUpRequest {
            password_confirmation: "Password124".to_string(),
            ..request.clone()
        })
        .await;
    assert!(matches!(mismatched, Err(AppError::Validation(_))));

    let created = ctx.user_service.sign_up(request.clone()).await?;
    let row = ctx.membership_service.membership(created.id, f.club.id).await?;
    assert_eq!(row.map(|m| m.role), Some(Role::Applicant));

    let duplicate = ctx.user_service.sign_up(request).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let logged_in = ctx.user_service.authenticate("newbie@example.org", PASSWORD).await?;
    assert_eq!(logged_in.map(|u| u.id), Some(created.id));
    assert!(ctx
        .user_service
        .authenticate("newbie@example.org", "Wrong1234")
        .await?
        .is_none());

    ctx.user_service.set_active(created.id, false).await?;
    assert!(ctx
        .user_service
        .authenticate("newbie@example.org", PASSWORD)
        .await?
        .is_none());

    Ok(())
}

#[tokio::test]
async fn test_sign_up_to_missing_club_leaves_no_account() -> anyhow::Result<()> {
    let ctx = context().await?;
    let f = fixture(&ctx).await?;

    let request = rookery::domain::SignUpRequest {
        email: "late@example.org".to_string(),
        first_name: "Late".to_string(),
        last_name: "Kerman".to_string(),
        bio: String::new(),
        chess_level: ChessLevel::Beginner,
        personal_statement: String::new(),
        password: PASSWORD.to_string(),
        password_confirmation: PASSWORD.to_string(),
        club_id: Uuid::new_v4(),
    };

    let missing = ctx.user_service.sign_up(request.clone()).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
    assert!(ctx.user_repo.find_by_email("late@example.org").await?.is_none());

    // Retrying against a real club is not blocked by a half-made account.
    let user = ctx
        .user_service
        .sign_up(rookery::domain::SignUpRequest { club_id: f.club.id, ..request })
        .await?;
    let row = ctx.membership_service.membership(user.id, f.club.id).await?;
    assert_eq!(row.map(|m| m.role), Some(Role::Applicant));

    Ok(())
}

#[tokio::test]
async fn test_change_password() -> anyhow::Result<()> {
    let ctx = context().await?;
    let jeb = user(&ctx, "jeb@example.org", "Jebediah").await?;

    let wrong = ctx
        .user_service
        .change_password(
            jeb.id,
            rookery::domain::ChangePasswordRequest {
                current_password: "Nope12345".to_string(),
                new_password: "Boosters42".to_string(),
                password_confirmation: "Boosters42".to_string(),
            },
        )
        .await;
    assert!(matches!(wrong, Err(AppError::Unauthorized)));

    ctx.user_service
        .change_password(
            jeb.id,
            rookery::domain::ChangePasswordRequest {
                current_password: PASSWORD.to_string(),
                new_password: "Boosters42".to_string(),
                password_confirmation: "Boosters42".to_string(),
            },
        )
        .await?;

    assert!(ctx.user_service.authenticate("jeb@example.org", PASSWORD).await?.is_none());
    assert!(ctx
        .user_service
        .authenticate("jeb@example.org", "Boosters42")
        .await?
        .is_some());

    Ok(())
}

#[tokio::test]
async fn test_update_profile_rejects_taken_email() -> anyhow::Result<()> {
    let ctx = context().await?;
    let jeb = user(&ctx, "jeb@example.org", "Jebediah").await?;
    user(&ctx, "val@example.org", "Valentina").await?;

    let taken = ctx
        .user_service
        .update_profile(
            jeb.id,
            UpdateProfileRequest {
                email: Some("val@example.org".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(taken, Err(AppError::Conflict(_))));

    let updated = ctx
        .user_service
        .update_profile(
            jeb.id,
            UpdateProfileRequest {
                bio: Some("Pilot".to_string()),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(updated.bio, "Pilot");
    assert_eq!(updated.email, "jeb@example.org");

    Ok(())
}
