use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    auth::Actor,
    authz::{self, Decision, Denial, Transition},
    domain::*,
    error::{AppError, Result},
    repository::{ClubRepository, MembershipRepository, UserRepository},
};

/// What the caller gets back from a gated request: either the denial that
/// stopped it or the value produced once it was allowed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict<T = Outcome> {
    Denied(Denial),
    Granted(T),
}

impl<T> Verdict<T> {
    pub fn denial(&self) -> Option<Denial> {
        match self {
            Verdict::Denied(denial) => Some(*denial),
            Verdict::Granted(_) => None,
        }
    }

    pub fn granted(self) -> Option<T> {
        match self {
            Verdict::Denied(_) => None,
            Verdict::Granted(value) => Some(value),
        }
    }
}

/// Membership transitions and the authorization around them.
///
/// The operation methods (`apply`, `accept`, ...) assume the caller already
/// obtained [`Decision::Allow`] for them and do not check permissions again.
/// [`MembershipService::request`] does both steps.
pub struct MembershipService {
    users: Arc<dyn UserRepository>,
    clubs: Arc<dyn ClubRepository>,
    memberships: Arc<dyn MembershipRepository>,
}

impl MembershipService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        clubs: Arc<dyn ClubRepository>,
        memberships: Arc<dyn MembershipRepository>,
    ) -> Self {
        Self { users, clubs, memberships }
    }

    /// Load a club and all of its membership rows with two queries.
    pub async fn roster(&self, club_id: Uuid) -> Result<Option<ClubRoster>> {
        let Some(club) = self.clubs.find_by_id(club_id).await? else {
            return Ok(None);
        };
        let memberships = self.memberships.list_for_club(club_id).await?;

        Ok(Some(ClubRoster::new(club, memberships)))
    }

    /// The membership row for the pair, if any.
    pub async fn membership(&self, user_id: Uuid, club_id: Uuid) -> Result<Option<Membership>> {
        let mut rows = self.memberships.find(user_id, club_id).await?;
        match rows.len() {
            0 | 1 => Ok(rows.pop()),
            n => Err(AppError::Integrity { user_id, club_id, rows: n }),
        }
    }

    pub async fn is_owner(&self, user_id: Uuid, club_id: Uuid) -> Result<bool> {
        Ok(self
            .clubs
            .find_by_id(club_id)
            .await?
            .is_some_and(|club| club.is_owner(user_id)))
    }

    pub async fn is_part_of(&self, user_id: Uuid, club_id: Uuid) -> Result<bool> {
        if self.is_owner(user_id, club_id).await? {
            return Ok(true);
        }
        Ok(!self.memberships.find(user_id, club_id).await?.is_empty())
    }

    /// Resolve the club and target and run the authorization engine.
    ///
    /// An unknown club or target id is reported as [`Denial::NotFound`].
    pub async fn authorize(
        &self,
        transition: Transition,
        actor: &Actor,
        club_id: Uuid,
        target_id: Option<Uuid>,
    ) -> Result<Decision> {
        if !actor.is_authenticated() {
            return Ok(Decision::Deny(Denial::Unauthenticated));
        }

        let Some(roster) = self.roster(club_id).await? else {
            return Ok(Decision::Deny(Denial::NotFound));
        };

        let target = match target_id {
            Some(id) if !transition.is_self_directed() => self.users.find_by_id(id).await?,
            _ => None,
        };

        Ok(authz::authorize(transition, actor, target.as_ref(), &roster))
    }

    /// Authorize and, when allowed, perform `transition`.
    ///
    /// For `Apply` and `Leave` the acting user is the subject and
    /// `target_id` is ignored.
    pub async fn request(
        &self,
        transition: Transition,
        actor: &Actor,
        club_id: Uuid,
        target_id: Option<Uuid>,
    ) -> Result<Verdict> {
        let decision = self.authorize(transition, actor, club_id, target_id).await?;

        if let Decision::Deny(denial) = decision {
            tracing::warn!(
                %transition,
                %club_id,
                actor_id = ?actor.user_id(),
                target_id = ?target_id,
                reason = denial.code(),
                "Membership transition denied"
            );
            return Ok(Verdict::Denied(denial));
        }

        let actor_id = actor.user_id().ok_or(AppError::Unauthorized)?;
        let subject_id = if transition.is_self_directed() {
            actor_id
        } else {
            target_id.ok_or_else(|| AppError::Internal("Allowed without a target".to_string()))?
        };

        let outcome = self.perform(transition, club_id, subject_id).await?;
        Ok(Verdict::Granted(outcome))
    }

    async fn perform(&self, transition: Transition, club_id: Uuid, subject_id: Uuid) -> Result<Outcome> {
        match transition {
            Transition::Apply => self.apply(subject_id, club_id).await,
            Transition::Leave => self.leave(subject_id, club_id).await,
            Transition::TransferOwnership => self.transfer_ownership(club_id, subject_id).await,
            Transition::Accept
            | Transition::Promote
            | Transition::Demote
            | Transition::Remove
            | Transition::Reinstate => {
                let step = transition.role_step().ok_or_else(|| {
                    AppError::Internal(format!("No role step for {}", transition))
                })?;
                self.step(subject_id, club_id, step).await
            }
        }
    }

    pub async fn apply(&self, user_id: Uuid, club_id: Uuid) -> Result<Outcome> {
        let outcome = self.memberships.apply(user_id, club_id).await?;
        tracing::debug!(%user_id, %club_id, ?outcome, "Applied to club");
        Ok(outcome)
    }

    pub async fn accept(&self, user_id: Uuid, club_id: Uuid) -> Result<Outcome> {
        self.step(user_id, club_id, RoleStep::Accept).await
    }

    pub async fn promote(&self, user_id: Uuid, club_id: Uuid) -> Result<Outcome> {
        self.step(user_id, club_id, RoleStep::Promote).await
    }

    pub async fn demote(&self, user_id: Uuid, club_id: Uuid) -> Result<Outcome> {
        self.step(user_id, club_id, RoleStep::Demote).await
    }

    /// Soft removal. Removing a removed row is a no-op.
    pub async fn remove(&self, user_id: Uuid, club_id: Uuid) -> Result<Outcome> {
        self.step(user_id, club_id, RoleStep::Remove).await
    }

    /// Back to applicant. Only removed rows change.
    pub async fn reinstate(&self, user_id: Uuid, club_id: Uuid) -> Result<Outcome> {
        self.step(user_id, club_id, RoleStep::Reinstate).await
    }

    pub async fn transfer_ownership(&self, club_id: Uuid, new_owner_id: Uuid) -> Result<Outcome> {
        let outcome = self.memberships.transfer_ownership(club_id, new_owner_id).await?;
        if outcome.is_applied() {
            tracing::info!(%club_id, %new_owner_id, "Club ownership transferred");
        }
        Ok(outcome)
    }

    pub async fn leave(&self, user_id: Uuid, club_id: Uuid) -> Result<Outcome> {
        let outcome = self.memberships.leave(user_id, club_id).await?;
        tracing::debug!(%user_id, %club_id, ?outcome, "Left club");
        Ok(outcome)
    }

    async fn step(&self, user_id: Uuid, club_id: Uuid, step: RoleStep) -> Result<Outcome> {
        let outcome = self.memberships.step(user_id, club_id, step).await?;
        tracing::debug!(%user_id, %club_id, ?step, ?outcome, "Membership step");
        Ok(outcome)
    }
}
