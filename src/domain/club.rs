use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{validate_not_blank, Membership, Role};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Club {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub description: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Club {
    /// Key comparison against the owner attribute, never a role check.
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }
}

impl std::fmt::Display for Club {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateClubRequest {
    #[validate(length(min = 1, max = 50), custom(function = "validate_not_blank"))]
    pub name: String,
    #[validate(length(min = 1, max = 50), custom(function = "validate_not_blank"))]
    pub location: String,
    #[validate(length(min = 1, max = 50), custom(function = "validate_not_blank"))]
    pub description: String,
}

/// A user's position relative to one club.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    Owner,
    Holder(Role),
    Outsider,
    /// More than one membership row for the pair.
    Conflicted(usize),
}

/// A club together with every membership row it has, fetched in one go.
///
/// All per-user lookups and role groupings are answered from memory so
/// callers never re-query the store inside a loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClubRoster {
    pub club: Club,
    pub memberships: Vec<Membership>,
}

impl ClubRoster {
    pub fn new(club: Club, memberships: Vec<Membership>) -> Self {
        Self { club, memberships }
    }

    pub fn club_id(&self) -> Uuid {
        self.club.id
    }

    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.club.is_owner(user_id)
    }

    /// True for the owner and for anyone holding a row of any role,
    /// `Removed` included.
    pub fn is_part_of(&self, user_id: Uuid) -> bool {
        self.is_owner(user_id) || self.memberships.iter().any(|m| m.user_id == user_id)
    }

    pub fn rows_for(&self, user_id: Uuid) -> Vec<&Membership> {
        self.memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .collect()
    }

    /// The single row for `user_id`, if exactly one exists.
    pub fn membership_of(&self, user_id: Uuid) -> Option<&Membership> {
        match self.rows_for(user_id).as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    pub fn standing_of(&self, user_id: Uuid) -> Standing {
        if self.is_owner(user_id) {
            return Standing::Owner;
        }

        match self.rows_for(user_id).as_slice() {
            [] => Standing::Outsider,
            [only] => Standing::Holder(only.role),
            rows => Standing::Conflicted(rows.len()),
        }
    }

    pub fn with_role(&self, role: Role) -> Vec<&Membership> {
        self.memberships.iter().filter(|m| m.role == role).collect()
    }

    pub fn by_role(&self) -> BTreeMap<Role, Vec<&Membership>> {
        let mut groups: BTreeMap<Role, Vec<&Membership>> = BTreeMap::new();
        for membership in &self.memberships {
            groups.entry(membership.role).or_default().push(membership);
        }
        groups
    }
}
