use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::Actor,
    authz::{self, Decision, Denial},
    domain::*,
    error::{AppError, Result},
    repository::{ClubRepository, MembershipRepository, UserRepository},
    service::membership_service::Verdict,
};

/// The club's user list as one viewer is allowed to see it. Only active
/// users are listed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClubDirectory {
    pub club: Club,
    pub viewer_is_owner: bool,
    pub viewer_membership: Option<Membership>,
    pub officers: Vec<User>,
    pub members: Vec<User>,
    /// Empty unless the viewer is an officer or the owner.
    pub applicants: Vec<User>,
    /// Empty unless the viewer is the owner.
    pub removed: Vec<User>,
}

/// Headline numbers for a club's public page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClubOverview {
    pub club: Club,
    pub owner: Option<User>,
    pub applicant_count: usize,
    /// Members and officers, plus the owner.
    pub member_count: usize,
    /// Members, officers and owner at Master level or above.
    pub master_count: usize,
    pub viewer_can_apply: bool,
}

/// One user's clubs split in two.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClubPartition {
    /// Clubs the user owns or holds a non-removed membership in.
    pub yours: Vec<Club>,
    pub others: Vec<Club>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub user: User,
    pub membership: Option<Membership>,
    pub is_owner: bool,
}

pub struct ClubService {
    users: Arc<dyn UserRepository>,
    clubs: Arc<dyn ClubRepository>,
    memberships: Arc<dyn MembershipRepository>,
}

impl ClubService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        clubs: Arc<dyn ClubRepository>,
        memberships: Arc<dyn MembershipRepository>,
    ) -> Self {
        Self { users, clubs, memberships }
    }

    /// The creator becomes owner and gets no membership row. One user may
    /// own any number of clubs.
    pub async fn create_club(&self, actor: &Actor, request: CreateClubRequest) -> Result<Club> {
        let owner = actor.user().ok_or(AppError::Unauthorized)?;
        request.validate()?;

        if self.clubs.find_by_name(&request.name).await?.is_some() {
            return Err(AppError::Conflict("Club name already exists".to_string()));
        }

        let club = self.clubs.create(request, owner.id).await?;
        tracing::info!(club_id = %club.id, owner_id = %owner.id, name = %club.name, "Club created");

        Ok(club)
    }

    pub async fn get(&self, club_id: Uuid) -> Result<Club> {
        self.clubs
            .find_by_id(club_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Club not found".to_string()))
    }

    pub async fn list(&self) -> Result<Vec<Club>> {
        self.clubs.list().await
    }

    pub async fn partition_for(&self, user_id: Uuid) -> Result<ClubPartition> {
        let clubs = self.clubs.list().await?;
        let active_rows: HashSet<Uuid> = self
            .memberships
            .list_for_user(user_id)
            .await?
            .into_iter()
            .filter(|m| !m.is_removed())
            .map(|m| m.club_id)
            .collect();

        let (yours, others): (Vec<Club>, Vec<Club>) = clubs
            .into_iter()
            .partition(|club| club.is_owner(user_id) || active_rows.contains(&club.id));

        Ok(ClubPartition { yours, others })
    }

    pub async fn directory(&self, actor: &Actor, club_id: Uuid) -> Result<Verdict<ClubDirectory>> {
        let Some((roster, users)) = self.load(club_id).await? else {
            return Ok(Verdict::Denied(Denial::NotFound));
        };

        if let Decision::Deny(denial) = authz::can_view_roster(actor, &roster) {
            return Ok(Verdict::Denied(denial));
        }

        let viewer_id = actor.user_id().ok_or(AppError::Unauthorized)?;
        let viewer_is_owner = roster.is_owner(viewer_id);
        let viewer_membership = roster.membership_of(viewer_id).cloned();
        let sees_applicants =
            viewer_is_owner || viewer_membership.as_ref().is_some_and(Membership::is_officer);

        let active = |role: Role| -> Vec<User> {
            roster
                .with_role(role)
                .into_iter()
                .filter_map(|m| users.get(&m.user_id))
                .filter(|u| u.is_active)
                .cloned()
                .collect()
        };

        Ok(Verdict::Granted(ClubDirectory {
            officers: active(Role::Officer),
            members: active(Role::Member),
            applicants: if sees_applicants { active(Role::Applicant) } else { Vec::new() },
            removed: if viewer_is_owner { active(Role::Removed) } else { Vec::new() },
            club: roster.club.clone(),
            viewer_is_owner,
            viewer_membership,
        }))
    }

    pub async fn overview(&self, actor: &Actor, club_id: Uuid) -> Result<ClubOverview> {
        let (roster, users) = self
            .load(club_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Club not found".to_string()))?;

        let owner = users.get(&roster.club.owner_id).cloned();
        let accepted: Vec<&User> = roster
            .memberships
            .iter()
            .filter(|m| m.role.is_accepted())
            .filter_map(|m| users.get(&m.user_id))
            .chain(owner.iter())
            .collect();

        let viewer_can_apply = match actor.user_id() {
            Some(id) => !roster.is_part_of(id),
            None => true,
        };

        Ok(ClubOverview {
            applicant_count: roster.with_role(Role::Applicant).len(),
            member_count: accepted.len(),
            master_count: accepted.iter().filter(|u| u.chess_level.is_master()).count(),
            club: roster.club.clone(),
            owner,
            viewer_can_apply,
        })
    }

    pub async fn profile(
        &self,
        actor: &Actor,
        club_id: Uuid,
        user_id: Uuid,
    ) -> Result<Verdict<UserProfile>> {
        let Some(club) = self.clubs.find_by_id(club_id).await? else {
            return Ok(Verdict::Denied(Denial::NotFound));
        };
        let roster = ClubRoster::new(club, self.memberships.list_for_club(club_id).await?);
        let target = self.users.find_by_id(user_id).await?;

        if let Decision::Deny(denial) = authz::can_view_profile(actor, target.as_ref(), &roster) {
            return Ok(Verdict::Denied(denial));
        }

        let user = target.ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        Ok(Verdict::Granted(UserProfile {
            is_owner: roster.is_owner(user.id),
            membership: roster.membership_of(user.id).cloned(),
            user,
        }))
    }

    async fn load(&self, club_id: Uuid) -> Result<Option<(ClubRoster, HashMap<Uuid, User>)>> {
        let Some(club) = self.clubs.find_by_id(club_id).await? else {
            return Ok(None);
        };
        let memberships = self.memberships.list_for_club(club_id).await?;
        let users = self
            .users
            .list_for_club(club_id)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(Some((ClubRoster::new(club, memberships), users)))
    }
}
