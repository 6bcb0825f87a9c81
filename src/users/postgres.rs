use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    repo::{MonthCount, RepoError, UserRepository},
    NewUser, Role, User,
};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, name, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, name, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        let res = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, role, name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password_hash, role, name, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.role)
        .bind(&new_user.name)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(user) => Ok(user),
            Err(e) if is_unique_violation(&e) => Err(RepoError::DuplicateEmail),
            Err(e) => Err(anyhow::Error::new(e).context("insert user").into()),
        }
    }

    async fn list(&self) -> Result<Vec<User>, RepoError> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, name, created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(rows)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let res = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete user")?;
        Ok(res.rows_affected() > 0)
    }

    async fn update_role(&self, id: Uuid, role: Role) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET role = $2, updated_at = now()
             WHERE id = $1
            RETURNING id, email, password_hash, role, name, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(role)
        .fetch_optional(&self.db)
        .await
        .context("update user role")?;
        Ok(user)
    }

    async fn count_all(&self) -> Result<i64, RepoError> {
        let n: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM users"#)
            .fetch_one(&self.db)
            .await
            .context("count users")?;
        Ok(n)
    }

    async fn count_by_role(&self, role: Role) -> Result<i64, RepoError> {
        let n: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM users WHERE role = $1"#)
            .bind(role)
            .fetch_one(&self.db)
            .await
            .context("count users by role")?;
        Ok(n)
    }

    async fn count_created_since(&self, since: OffsetDateTime) -> Result<i64, RepoError> {
        let n: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM users WHERE created_at >= $1"#)
            .bind(since)
            .fetch_one(&self.db)
            .await
            .context("count recent users")?;
        Ok(n)
    }

    async fn monthly_signups_since(
        &self,
        since: OffsetDateTime,
    ) -> Result<Vec<MonthCount>, RepoError> {
        let rows = sqlx::query_as::<_, (i32, i32, i64)>(
            r#"
            SELECT EXTRACT(YEAR FROM created_at AT TIME ZONE 'UTC')::INT4  AS year,
                   EXTRACT(MONTH FROM created_at AT TIME ZONE 'UTC')::INT4 AS month,
                   COUNT(*)                                               AS count
              FROM users
             WHERE created_at >= $1
             GROUP BY 1, 2
             ORDER BY 1, 2
            "#,
        )
        .bind(since)
        .fetch_all(&self.db)
        .await
        .context("monthly signups")?;

        rows.into_iter()
            .map(|(year, month, count)| -> Result<MonthCount, RepoError> {
                let month = u8::try_from(month).context("month out of range")?;
                Ok(MonthCount { year, month, count })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("database error {code}")]
    struct FakeDbError {
        code: &'static str,
    }

    impl DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "fake"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    fn db_error(code: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError { code }))
    }

    #[test]
    fn only_sqlstate_23505_counts_as_duplicate() {
        assert!(is_unique_violation(&db_error("23505")));
        assert!(!is_unique_violation(&db_error("23503")));
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
