use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// One user's standing in one club. Identity is the (user, club) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Membership {
    pub user_id: Uuid,
    pub club_id: Uuid,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    pub fn is_removed(&self) -> bool {
        self.role.is_removed()
    }

    pub fn is_applicant(&self) -> bool {
        self.role.is_applicant()
    }

    pub fn is_member(&self) -> bool {
        self.role.is_member()
    }

    pub fn is_officer(&self) -> bool {
        self.role.is_officer()
    }
}

/// In-place role changes applied to an existing membership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleStep {
    Accept,
    Promote,
    Demote,
    Remove,
    Reinstate,
}

/// What a [`RoleStep`] does to a given current role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEffect {
    Set(Role),
    AlreadyInState,
    Violated,
}

impl RoleStep {
    pub fn target_role(self) -> Role {
        match self {
            RoleStep::Accept => Role::Member,
            RoleStep::Promote => Role::Officer,
            RoleStep::Demote => Role::Member,
            RoleStep::Remove => Role::Removed,
            RoleStep::Reinstate => Role::Applicant,
        }
    }

    pub fn effect_on(self, current: Role) -> StepEffect {
        use Role::*;

        match (self, current) {
            (RoleStep::Accept, Applicant) => StepEffect::Set(Member),
            (RoleStep::Accept, Member) => StepEffect::AlreadyInState,
            (RoleStep::Accept, _) => StepEffect::Violated,

            (RoleStep::Promote, Member) => StepEffect::Set(Officer),
            (RoleStep::Promote, Officer) => StepEffect::AlreadyInState,
            (RoleStep::Promote, _) => StepEffect::Violated,

            (RoleStep::Demote, Officer) => StepEffect::Set(Member),
            (RoleStep::Demote, Member) => StepEffect::AlreadyInState,
            (RoleStep::Demote, _) => StepEffect::Violated,

            (RoleStep::Remove, Removed) => StepEffect::AlreadyInState,
            (RoleStep::Remove, _) => StepEffect::Set(Removed),

            // Reinstating anything but a removed row leaves it untouched.
            (RoleStep::Reinstate, Removed) => StepEffect::Set(Applicant),
            (RoleStep::Reinstate, _) => StepEffect::AlreadyInState,
        }
    }
}

/// Result of a transition operation that passed authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Applied,
    AlreadyInState,
    PreconditionViolated,
}

impl Outcome {
    pub fn is_applied(self) -> bool {
        self == Outcome::Applied
    }
}

impl From<StepEffect> for Outcome {
    fn from(effect: StepEffect) -> Self {
        match effect {
            StepEffect::Set(_) => Outcome::Applied,
            StepEffect::AlreadyInState => Outcome::AlreadyInState,
            StepEffect::Violated => Outcome::PreconditionViolated,
        }
    }
}
