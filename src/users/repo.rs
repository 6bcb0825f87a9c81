use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{NewUser, Role, User};

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Signups counted for one calendar month (UTC). `month` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCount {
    pub year: i32,
    pub month: u8,
    pub count: i64,
}

/// Persistence boundary for user records.
///
/// Implementations must enforce email uniqueness themselves and report a
/// collision as [`RepoError::DuplicateEmail`].
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;
    async fn create(&self, new_user: NewUser) -> Result<User, RepoError>;
    /// All users, newest first.
    async fn list(&self) -> Result<Vec<User>, RepoError>;
    /// Returns `false` when no user had this id.
    async fn delete(&self, id: Uuid) -> Result<bool, RepoError>;
    async fn update_role(&self, id: Uuid, role: Role) -> Result<Option<User>, RepoError>;

    async fn count_all(&self) -> Result<i64, RepoError>;
    async fn count_by_role(&self, role: Role) -> Result<i64, RepoError>;
    async fn count_created_since(&self, since: OffsetDateTime) -> Result<i64, RepoError>;
    /// Per-month signup buckets for users created at or after `since`, oldest first.
    async fn monthly_signups_since(&self, since: OffsetDateTime)
        -> Result<Vec<MonthCount>, RepoError>;
}
