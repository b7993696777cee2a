use serde::{Deserialize, Serialize};

/// Standing of a membership row within a club, ordered by privilege.
///
/// The club owner has no role. Ownership lives on the club itself and the
/// owner never holds a membership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Removed,
    Applicant,
    Member,
    Officer,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Removed, Role::Applicant, Role::Member, Role::Officer];

    /// Stored level, `0` (removed) through `3` (officer).
    pub fn level(self) -> i64 {
        match self {
            Role::Removed => 0,
            Role::Applicant => 1,
            Role::Member => 2,
            Role::Officer => 3,
        }
    }

    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            0 => Some(Role::Removed),
            1 => Some(Role::Applicant),
            2 => Some(Role::Member),
            3 => Some(Role::Officer),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Removed => "removed",
            Role::Applicant => "applicant",
            Role::Member => "member",
            Role::Officer => "officer",
        }
    }

    pub fn is_removed(self) -> bool {
        self == Role::Removed
    }

    pub fn is_applicant(self) -> bool {
        self == Role::Applicant
    }

    pub fn is_member(self) -> bool {
        self == Role::Member
    }

    pub fn is_officer(self) -> bool {
        self == Role::Officer
    }

    /// Member or officer: someone who has been accepted and not removed.
    pub fn is_accepted(self) -> bool {
        matches!(self, Role::Member | Role::Officer)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
