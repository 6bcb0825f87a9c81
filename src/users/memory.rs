use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    repo::{MonthCount, RepoError, UserRepository},
    NewUser, Role, User,
};

/// Process-local store with the same contract as the Postgres one.
#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully formed record, keeping its id and timestamps.
    pub async fn insert(&self, user: User) -> Result<(), RepoError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(RepoError::DuplicateEmail);
        }
        users.insert(user.id, user);
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            name: new_user.name,
            created_at: now,
            updated_at: now,
        };
        self.insert(user.clone()).await?;
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, RepoError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.users.write().await.remove(&id).is_some())
    }

    async fn update_role(&self, id: Uuid, role: Role) -> Result<Option<User>, RepoError> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|u| {
            u.role = role;
            u.updated_at = OffsetDateTime::now_utc();
            u.clone()
        }))
    }

    async fn count_all(&self) -> Result<i64, RepoError> {
        Ok(self.users.read().await.len() as i64)
    }

    async fn count_by_role(&self, role: Role) -> Result<i64, RepoError> {
        let users = self.users.read().await;
        Ok(users.values().filter(|u| u.role == role).count() as i64)
    }

    async fn count_created_since(&self, since: OffsetDateTime) -> Result<i64, RepoError> {
        let users = self.users.read().await;
        Ok(users.values().filter(|u| u.created_at >= since).count() as i64)
    }

    async fn monthly_signups_since(
        &self,
        since: OffsetDateTime,
    ) -> Result<Vec<MonthCount>, RepoError> {
        let users = self.users.read().await;
        let mut buckets: HashMap<(i32, u8), i64> = HashMap::new();
        for u in users.values().filter(|u| u.created_at >= since) {
            let at = u.created_at.to_offset(time::UtcOffset::UTC);
            *buckets.entry((at.year(), u8::from(at.month()))).or_default() += 1;
        }
        let mut out: Vec<MonthCount> = buckets
            .into_iter()
            .map(|((year, month), count)| MonthCount { year, month, count })
            .collect();
        out.sort_by_key(|m| (m.year, m.month));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn new_user(email: &str, role: Role) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "hash".into(),
            role,
            name: String::new(),
        }
    }

    fn user_at(email: &str, created_at: OffsetDateTime) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: "hash".into(),
            role: Role::User,
            name: String::new(),
            created_at,
            updated_at: created_at,
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let repo = MemoryUserRepository::new();
        repo.create(new_user("a@x.io", Role::User)).await.unwrap();
        let err = repo.create(new_user("a@x.io", Role::Admin)).await.unwrap_err();
        assert!(matches!(err, RepoError::DuplicateEmail));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn delete_and_update_report_missing_ids() {
        let repo = MemoryUserRepository::new();
        assert!(!repo.delete(Uuid::new_v4()).await.unwrap());
        assert!(repo.update_role(Uuid::new_v4(), Role::Admin).await.unwrap().is_none());

        let u = repo.create(new_user("b@x.io", Role::User)).await.unwrap();
        let updated = repo.update_role(u.id, Role::Admin).await.unwrap().unwrap();
        assert_eq!(updated.role, Role::Admin);
        assert_eq!(updated.password_hash, "hash");
        assert!(repo.delete(u.id).await.unwrap());
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let repo = MemoryUserRepository::new();
        repo.insert(user_at("old@x.io", datetime!(2024-01-01 0:00 UTC))).await.unwrap();
        repo.insert(user_at("new@x.io", datetime!(2024-06-01 0:00 UTC))).await.unwrap();
        let emails: Vec<String> = repo.list().await.unwrap().into_iter().map(|u| u.email).collect();
        assert_eq!(emails, vec!["new@x.io", "old@x.io"]);
    }

    #[tokio::test]
    async fn monthly_buckets_group_by_utc_month() {
        let repo = MemoryUserRepository::new();
        repo.insert(user_at("a@x.io", datetime!(2024-01-31 23:30 -2))).await.unwrap();
        repo.insert(user_at("b@x.io", datetime!(2024-02-10 8:00 UTC))).await.unwrap();
        repo.insert(user_at("c@x.io", datetime!(2023-12-10 8:00 UTC))).await.unwrap();

        let buckets = repo
            .monthly_signups_since(datetime!(2024-01-01 0:00 UTC))
            .await
            .unwrap();
        assert_eq!(buckets, vec![MonthCount { year: 2024, month: 2, count: 2 }]);
    }
}
