use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::model::{NewUser, User, UserKey};
use crate::repo::{RepoError, Repository};

/// Postgres-backed user store. The `users` table carries a UNIQUE constraint
/// on email, so duplicate detection happens atomically server-side; the insert
/// is never preceded by an application-level existence check.
#[derive(Clone)]
pub struct PgUsers {
    pool: PgPool,
}

impl PgUsers {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PgUsers {
    type Record = User;
    type New = NewUser;
    type Key = UserKey;

    async fn add(&self, record: NewUser) -> Result<User, RepoError> {
        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, is_active, created_at
            "#,
        )
        .bind(&record.email)
        .bind(&record.password_hash)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(user) => Ok(user),
            Err(e) if is_unique_violation(&e) => Err(RepoError::DuplicateKey),
            Err(e) => Err(RepoError::Unavailable(e)),
        }
    }

    async fn get(&self, key: UserKey) -> Result<Option<User>, RepoError> {
        let query = match key {
            UserKey::Id(id) => sqlx::query_as::<_, User>(
                r#"
                SELECT id, email, password_hash, is_active, created_at
                FROM users
                WHERE id = $1
                "#,
            )
            .bind(id),
            UserKey::Email(email) => sqlx::query_as::<_, User>(
                r#"
                SELECT id, email, password_hash, is_active, created_at
                FROM users
                WHERE email = $1
                "#,
            )
            .bind(email),
        };

        query
            .fetch_optional(&self.pool)
            .await
            .map_err(RepoError::Unavailable)
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map_or(false, |db| db.is_unique_violation())
}

/// In-memory user store, used as a stand-in for Postgres in tests.
#[derive(Default)]
pub struct MemoryUsers {
    rows: Mutex<Vec<User>>,
}

impl MemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryUsers {
    type Record = User;
    type New = NewUser;
    type Key = UserKey;

    async fn add(&self, record: NewUser) -> Result<User, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|u| u.email == record.email) {
            return Err(RepoError::DuplicateKey);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: record.email,
            password_hash: record.password_hash,
            is_active: false,
            created_at: OffsetDateTime::now_utc(),
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn get(&self, key: UserKey) -> Result<Option<User>, RepoError> {
        let rows = self.rows.lock().unwrap();
        let found = match key {
            UserKey::Id(id) => rows.iter().find(|u| u.id == id),
            UserKey::Email(email) => rows.iter().find(|u| u.email == email),
        };
        Ok(found.cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "fake-hash".into(),
        }
    }

    #[tokio::test]
    async fn add_assigns_id_and_defaults_inactive() {
        let store = MemoryUsers::new();
        let user = store.add(new_user("a@example.com")).await.expect("add");
        assert!(!user.is_active);
        assert_eq!(user.email, "a@example.com");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryUsers::new();
        store.add(new_user("a@example.com")).await.expect("first add");
        let err = store.add(new_user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, RepoError::DuplicateKey));

        // the collision must not have created a second record
        let found = store
            .get(UserKey::Email("a@example.com".into()))
            .await
            .expect("get");
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn get_by_id_and_email_find_the_same_record() {
        let store = MemoryUsers::new();
        let user = store.add(new_user("b@example.com")).await.expect("add");

        let by_id = store.get(UserKey::Id(user.id)).await.expect("get by id");
        let by_email = store
            .get(UserKey::Email("b@example.com".into()))
            .await
            .expect("get by email");
        assert_eq!(by_id.map(|u| u.id), Some(user.id));
        assert_eq!(by_email.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn get_miss_is_none_not_an_error() {
        let store = MemoryUsers::new();
        let found = store
            .get(UserKey::Email("nobody@example.com".into()))
            .await
            .expect("get");
        assert!(found.is_none());
    }
}
