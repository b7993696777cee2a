//! Authorization for membership transitions.
//!
//! [`authorize`] is pure: it looks at the acting user, the target user and a
//! [`ClubRoster`] and returns a [`Decision`]. It never touches the store and
//! never mutates anything. Callers act on the decision by invoking the
//! matching operation on `MembershipService`.

use serde::{Deserialize, Serialize};

use crate::{
    auth::Actor,
    domain::{ClubRoster, Role, RoleStep, Standing, User},
};

/// A named, authorization-gated state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Apply,
    Accept,
    Promote,
    Demote,
    Remove,
    Reinstate,
    TransferOwnership,
    Leave,
}

impl Transition {
    pub const ALL: [Transition; 8] = [
        Transition::Apply,
        Transition::Accept,
        Transition::Promote,
        Transition::Demote,
        Transition::Remove,
        Transition::Reinstate,
        Transition::TransferOwnership,
        Transition::Leave,
    ];

    /// Apply and leave act on the actor; every other transition names a
    /// separate target user.
    pub fn is_self_directed(self) -> bool {
        matches!(self, Transition::Apply | Transition::Leave)
    }

    pub fn role_step(self) -> Option<RoleStep> {
        match self {
            Transition::Accept => Some(RoleStep::Accept),
            Transition::Promote => Some(RoleStep::Promote),
            Transition::Demote => Some(RoleStep::Demote),
            Transition::Remove => Some(RoleStep::Remove),
            Transition::Reinstate => Some(RoleStep::Reinstate),
            Transition::Apply | Transition::Leave | Transition::TransferOwnership => None,
        }
    }

    fn rule(self) -> Option<TargetRule> {
        use Role::*;

        let rule = match self {
            Transition::Apply | Transition::Leave => return None,
            Transition::Accept => TargetRule {
                actor: Authority::OfficerOrOwner,
                target_roles: &[Applicant],
                target_must_be_active: true,
            },
            Transition::Promote | Transition::Demote => TargetRule {
                actor: Authority::Owner,
                target_roles: &[Member, Officer],
                target_must_be_active: true,
            },
            Transition::Remove => TargetRule {
                actor: Authority::Owner,
                target_roles: &[Removed, Applicant, Member, Officer],
                target_must_be_active: false,
            },
            Transition::Reinstate => TargetRule {
                actor: Authority::Owner,
                target_roles: &[Removed],
                target_must_be_active: false,
            },
            Transition::TransferOwnership => TargetRule {
                actor: Authority::Owner,
                target_roles: &[Officer],
                target_must_be_active: true,
            },
        };

        Some(rule)
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Transition::Apply => "apply",
            Transition::Accept => "accept",
            Transition::Promote => "promote",
            Transition::Demote => "demote",
            Transition::Remove => "remove",
            Transition::Reinstate => "reinstate",
            Transition::TransferOwnership => "transfer_ownership",
            Transition::Leave => "leave",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Authority {
    OfficerOrOwner,
    Owner,
}

impl Authority {
    fn admits(self, standing: Standing) -> bool {
        match (self, standing) {
            (_, Standing::Owner) => true,
            (Authority::OfficerOrOwner, Standing::Holder(Role::Officer)) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct TargetRule {
    actor: Authority,
    target_roles: &'static [Role],
    target_must_be_active: bool,
}

/// Why a permission check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionReason {
    NotAuthorizedRole,
    TargetInactive,
    SelfTargetForbidden,
    TargetWrongState,
}

impl PermissionReason {
    pub fn code(self) -> &'static str {
        match self {
            PermissionReason::NotAuthorizedRole => "not-authorized-role",
            PermissionReason::TargetInactive => "target-inactive",
            PermissionReason::SelfTargetForbidden => "self-target-forbidden",
            PermissionReason::TargetWrongState => "target-wrong-state",
        }
    }
}

/// A stable, enumerable reason a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "reason")]
pub enum Denial {
    Unauthenticated,
    NotFound,
    PermissionDenied(PermissionReason),
    /// More than one membership row exists for a single (user, club) pair.
    IntegrityFault,
}

impl Denial {
    pub fn code(self) -> &'static str {
        match self {
            Denial::Unauthenticated => "unauthenticated",
            Denial::NotFound => "not-found",
            Denial::PermissionDenied(reason) => reason.code(),
            Denial::IntegrityFault => "integrity-fault",
        }
    }
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }

    pub fn denial(self) -> Option<Denial> {
        match self {
            Decision::Allow => None,
            Decision::Deny(denial) => Some(denial),
        }
    }
}

fn deny(reason: PermissionReason) -> Decision {
    Decision::Deny(Denial::PermissionDenied(reason))
}

fn integrity_fault(roster: &ClubRoster, user: &User, rows: usize) -> Decision {
    tracing::error!(
        club_id = %roster.club_id(),
        user_id = %user.id,
        rows,
        "Duplicate membership rows for a single user and club"
    );
    Decision::Deny(Denial::IntegrityFault)
}

/// Decide whether `actor` may perform `transition` on `target` in the club.
///
/// `target` is `None` when the caller could not resolve the requested user;
/// that yields [`Denial::NotFound`] for every targeted transition regardless
/// of who is asking. For self-directed transitions the target is ignored.
pub fn authorize(
    transition: Transition,
    actor: &Actor,
    target: Option<&User>,
    roster: &ClubRoster,
) -> Decision {
    let Some(acting) = actor.user() else {
        return Decision::Deny(Denial::Unauthenticated);
    };

    let actor_standing = roster.standing_of(acting.id);
    if let Standing::Conflicted(rows) = actor_standing {
        return integrity_fault(roster, acting, rows);
    }

    let Some(rule) = transition.rule() else {
        return authorize_self_directed(transition, actor_standing);
    };

    let Some(target) = target else {
        return Decision::Deny(Denial::NotFound);
    };

    if target.id == acting.id {
        return deny(PermissionReason::SelfTargetForbidden);
    }

    if !rule.actor.admits(actor_standing) {
        return deny(PermissionReason::NotAuthorizedRole);
    }

    if rule.target_must_be_active && !target.is_active {
        return deny(PermissionReason::TargetInactive);
    }

    match roster.standing_of(target.id) {
        Standing::Conflicted(rows) => integrity_fault(roster, target, rows),
        Standing::Holder(role) if rule.target_roles.contains(&role) => Decision::Allow,
        Standing::Holder(_) | Standing::Owner | Standing::Outsider => {
            deny(PermissionReason::TargetWrongState)
        }
    }
}

fn authorize_self_directed(transition: Transition, standing: Standing) -> Decision {
    match (transition, standing) {
        (Transition::Apply, Standing::Outsider) => Decision::Allow,
        (Transition::Apply, _) => deny(PermissionReason::TargetWrongState),

        (Transition::Leave, Standing::Holder(_)) => Decision::Allow,
        (Transition::Leave, Standing::Owner) => deny(PermissionReason::NotAuthorizedRole),
        (Transition::Leave, _) => deny(PermissionReason::TargetWrongState),

        _ => deny(PermissionReason::NotAuthorizedRole),
    }
}

/// Listing a club's users needs the owner or an accepted member.
pub fn can_view_roster(actor: &Actor, roster: &ClubRoster) -> Decision {
    let Some(acting) = actor.user() else {
        return Decision::Deny(Denial::Unauthenticated);
    };

    match roster.standing_of(acting.id) {
        Standing::Owner => Decision::Allow,
        Standing::Holder(role) if role.is_accepted() => Decision::Allow,
        Standing::Conflicted(rows) => integrity_fault(roster, acting, rows),
        Standing::Holder(_) | Standing::Outsider => deny(PermissionReason::NotAuthorizedRole),
    }
}

/// Roster viewers may open any profile except that a plain member may not
/// look at an applicant.
pub fn can_view_profile(actor: &Actor, target: Option<&User>, roster: &ClubRoster) -> Decision {
    let viewer = can_view_roster(actor, roster);
    if !viewer.is_allowed() {
        return viewer;
    }

    let Some(target) = target else {
        return Decision::Deny(Denial::NotFound);
    };

    let viewer_role = actor.user_id().map(|id| roster.standing_of(id));
    match (viewer_role, roster.standing_of(target.id)) {
        (_, Standing::Conflicted(rows)) => integrity_fault(roster, target, rows),
        (Some(Standing::Holder(Role::Member)), Standing::Holder(Role::Applicant)) => {
            deny(PermissionReason::NotAuthorizedRole)
        }
        _ => Decision::Allow,
    }
}
