use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const MINI_GRAVATAR_SIZE: u32 = 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    /// Unique login handle, an email address.
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub chess_level: ChessLevel,
    pub personal_statement: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn gravatar(&self, size: u32) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.email.trim().to_lowercase().as_bytes());
        let digest = hex::encode(hasher.finalize());
        format!("https://www.gravatar.com/avatar/{}?size={}&default=identicon", digest, size)
    }

    pub fn mini_gravatar(&self) -> String {
        self.gravatar(MINI_GRAVATAR_SIZE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChessLevel {
    #[default]
    Beginner,
    Intermediate,
    Master,
    GrandMaster,
    SuperGrandMaster,
}

impl ChessLevel {
    pub fn value(self) -> i64 {
        match self {
            ChessLevel::Beginner => 1,
            ChessLevel::Intermediate => 2,
            ChessLevel::Master => 3,
            ChessLevel::GrandMaster => 4,
            ChessLevel::SuperGrandMaster => 5,
        }
    }

    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            1 => Some(ChessLevel::Beginner),
            2 => Some(ChessLevel::Intermediate),
            3 => Some(ChessLevel::Master),
            4 => Some(ChessLevel::GrandMaster),
            5 => Some(ChessLevel::SuperGrandMaster),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChessLevel::Beginner => "Beginner",
            ChessLevel::Intermediate => "Intermediate",
            ChessLevel::Master => "Master",
            ChessLevel::GrandMaster => "Grand Master",
            ChessLevel::SuperGrandMaster => "Super Grand Master",
        }
    }

    /// Master and above.
    pub fn is_master(self) -> bool {
        self >= ChessLevel::Master
    }
}

impl TryFrom<i64> for ChessLevel {
    type Error = crate::error::AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_value(value).ok_or_else(|| {
            crate::error::AppError::Validation("Level must be between 1 and 5".to_string())
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(custom(function = "validate_handle"))]
    pub email: String,
    #[validate(length(min = 1, max = 50), custom(function = "validate_not_blank"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50), custom(function = "validate_not_blank"))]
    pub last_name: String,
    #[validate(length(max = 520))]
    pub bio: String,
    pub chess_level: ChessLevel,
    #[validate(length(max = 520))]
    pub personal_statement: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
    #[validate(must_match(other = "password"))]
    pub password_confirmation: String,
    /// Club the new user applies to.
    pub club_id: Uuid,
}

/// Profile fields persisted for a new user. The credential travels
/// separately as an already-hashed string.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(custom(function = "validate_handle"))]
    pub email: String,
    #[validate(length(min = 1, max = 50), custom(function = "validate_not_blank"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50), custom(function = "validate_not_blank"))]
    pub last_name: String,
    #[validate(length(max = 520))]
    pub bio: String,
    pub chess_level: ChessLevel,
    #[validate(length(max = 520))]
    pub personal_statement: String,
}

impl From<&SignUpRequest> for CreateUserRequest {
    fn from(request: &SignUpRequest) -> Self {
        Self {
            email: request.email.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            bio: request.bio.clone(),
            chess_level: request.chess_level,
            personal_statement: request.personal_statement.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, Validate)]
pub struct UpdateProfileRequest {
    #[validate(custom(function = "validate_handle"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 50), custom(function = "validate_not_blank"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50), custom(function = "validate_not_blank"))]
    pub last_name: Option<String>,
    #[validate(length(max = 520))]
    pub bio: Option<String>,
    pub chess_level: Option<ChessLevel>,
    #[validate(length(max = 520))]
    pub personal_statement: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub new_password: String,
    #[validate(must_match(other = "new_password"))]
    pub password_confirmation: String,
}

/// `local@domain.tld`: exactly one `@`, a non-empty local part and a
/// dot-separated host with no empty labels.
pub fn validate_handle(value: &str) -> Result<(), ValidationError> {
    if is_valid_handle(value) {
        Ok(())
    } else {
        Err(ValidationError::new("handle")
            .with_message("Enter a valid email address.".into()))
    }
}

pub fn is_valid_handle(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }

    let mut parts = value.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    if local.is_empty() || !domain.contains('.') {
        return false;
    }

    domain.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

/// At least one uppercase letter, one lowercase letter and one digit.
pub fn validate_password_strength(value: &str) -> Result<(), ValidationError> {
    let has_upper = value.chars().any(|c| c.is_uppercase());
    let has_lower = value.chars().any(|c| c.is_lowercase());
    let has_digit = value.chars().any(|c| c.is_ascii_digit());

    if has_upper && has_lower && has_digit {
        Ok(())
    } else {
        Err(ValidationError::new("password_strength").with_message(
            "Password must contain an uppercase character, a lowercase character and a number."
                .into(),
        ))
    }
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank").with_message("This field cannot be blank.".into()))
    } else {
        Ok(())
    }
}
