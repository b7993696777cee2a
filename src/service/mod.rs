pub mod membership_service;
pub mod club_service;
pub mod user_service;

use std::sync::Arc;
use sqlx::SqlitePool;
use crate::repository::*;

pub use membership_service::{MembershipService, Verdict};
pub use club_service::{ClubDirectory, ClubOverview, ClubPartition, ClubService, UserProfile};
pub use user_service::UserService;

pub struct ServiceContext {
    pub user_repo: Arc<dyn UserRepository>,
    pub club_repo: Arc<dyn ClubRepository>,
    pub membership_repo: Arc<dyn MembershipRepository>,
    pub membership_service: Arc<MembershipService>,
    pub club_service: Arc<ClubService>,
    pub user_service: Arc<UserService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(db_pool: SqlitePool) -> Self {
        let user_repo: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(db_pool.clone()));
        let club_repo: Arc<dyn ClubRepository> = Arc::new(SqliteClubRepository::new(db_pool.clone()));
        let membership_repo: Arc<dyn MembershipRepository> =
            Arc::new(SqliteMembershipRepository::new(db_pool.clone()));

        let membership_service = Arc::new(MembershipService::new(
            user_repo.clone(),
            club_repo.clone(),
            membership_repo.clone(),
        ));
        let club_service = Arc::new(ClubService::new(
            user_repo.clone(),
            club_repo.clone(),
            membership_repo.clone(),
        ));
        let user_service = Arc::new(UserService::new(user_repo.clone()));

        Self {
            user_repo,
            club_repo,
            membership_repo,
            membership_service,
            club_service,
            user_service,
            db_pool,
        }
    }
}
