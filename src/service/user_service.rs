use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{hash_password, verify_password},
    domain::*,
    error::{AppError, Result},
    repository::UserRepository,
};

pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Create the account and apply to the chosen club, both or neither.
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<User> {
        request.validate()?;

        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let password_hash = hash_password(&request.password)?;
        let user = self
            .users
            .create_applicant(CreateUserRequest::from(&request), &password_hash, request.club_id)
            .await?;

        tracing::info!(user_id = %user.id, club_id = %request.club_id, "User signed up");

        Ok(user)
    }

    /// Create an account without applying anywhere.
    pub async fn create_user(&self, request: CreateUserRequest, password: &str) -> Result<User> {
        request.validate()?;
        validate_password_strength(password)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let password_hash = hash_password(password)?;
        self.users.create(request, &password_hash).await
    }

    /// The user behind a handle and password, if both check out and the
    /// account is active.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.users.find_by_email(email).await? else {
            return Ok(None);
        };

        if !user.is_active {
            tracing::debug!(user_id = %user.id, "Login refused for inactive user");
            return Ok(None);
        }

        let Some(hash) = self.users.password_hash(user.id).await? else {
            return Ok(None);
        };

        if verify_password(password, &hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    pub async fn change_password(&self, user_id: Uuid, request: ChangePasswordRequest) -> Result<()> {
        request.validate()?;

        let hash = self
            .users
            .password_hash(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !verify_password(&request.current_password, &hash)? {
            return Err(AppError::Unauthorized);
        }

        let new_hash = hash_password(&request.new_password)?;
        self.users.set_password_hash(user_id, &new_hash).await
    }

    pub async fn update_profile(&self, user_id: Uuid, update: UpdateProfileRequest) -> Result<User> {
        update.validate()?;

        if let Some(email) = &update.email {
            if let Some(existing) = self.users.find_by_email(email).await? {
                if existing.id != user_id {
                    return Err(AppError::Conflict("Email already exists".to_string()));
                }
            }
        }

        self.users.update_profile(user_id, update).await
    }

    pub async fn set_active(&self, user_id: Uuid, active: bool) -> Result<User> {
        let user = self.users.set_active(user_id, active).await?;
        tracing::info!(%user_id, active, "User active flag changed");
        Ok(user)
    }

    pub async fn get(&self, user_id: Uuid) -> Result<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
