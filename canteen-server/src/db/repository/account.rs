//! Account Repository

use chrono::Utc;
use shared::models::{Account, Role};
use sqlx::SqlitePool;

use super::{BaseRepository, RepoError, RepoResult};

#[derive(Clone)]
pub struct AccountRepository {
    base: BaseRepository,
}

impl AccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            base: BaseRepository::new(pool),
        }
    }

    /// Create a new account
    ///
    /// A taken email surfaces as [`RepoError::Duplicate`] via the UNIQUE
    /// constraint on `accounts.email`.
    pub async fn create(
        &self,
        name: Option<String>,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> RepoResult<Account> {
        let account = sqlx::query_as::<_, Account>(
            "INSERT INTO accounts (name, email, password_hash, role, created_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .bind(Utc::now())
        .fetch_one(self.base.pool())
        .await
        .map_err(|e| match RepoError::from(e) {
            RepoError::Duplicate(_) => RepoError::Duplicate(format!("email {email} already registered")),
            other => other,
        })?;

        Ok(account)
    }

    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = ?")
            .bind(email)
            .fetch_optional(self.base.pool())
            .await?;
        Ok(account)
    }

    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(self.base.pool())
            .await?;
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    async fn test_pool() -> (SqlitePool, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("accounts.db");
        let db = DbService::new(path.to_str().unwrap()).await.expect("db init");
        (db.pool, dir)
    }

    #[tokio::test]
    async fn create_and_find_account() {
        let (pool, _dir) = test_pool().await;
        let repo = AccountRepository::new(pool);

        let created = repo
            .create(Some("Ada".into()), "ada@campus.edu", "hash", Role::Student)
            .await
            .unwrap();
        assert_eq!(created.email, "ada@campus.edu");
        assert_eq!(created.role, Role::Student);

        let found = repo.find_by_email("ada@campus.edu").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.name.as_deref(), Some("Ada"));

        assert!(repo.find_by_email("nobody@campus.edu").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let (pool, _dir) = test_pool().await;
        let repo = AccountRepository::new(pool);

        repo.create(None, "dup@campus.edu", "hash", Role::Student)
            .await
            .unwrap();
        let err = repo
            .create(None, "dup@campus.edu", "hash2", Role::Provider)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }
}
