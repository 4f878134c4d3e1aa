use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::User;

/// Emails are matched case-insensitively; store them lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone)]
pub struct UserRepository {
    pool: Arc<SqlitePool>,
}

impl UserRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, email: &str, password_hash: &str, name: &str) -> Result<User> {
        let id = Uuid::new_v4();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, datetime('now'), datetime('now'))
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(normalize_email(email))
        .bind(password_hash)
        .bind(name.trim())
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(normalize_email(email))
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(user)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<User> {
        self.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    /// Page through users by name or email, skipping `exclude`
    pub async fn search(
        &self,
        query: Option<&str>,
        exclude: &[Uuid],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM users WHERE 1 = 1");

        if let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", query.to_lowercase());
            builder
                .push(" AND (lower(name) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR email LIKE ")
                .push_bind(pattern)
                .push(")");
        }

        if !exclude.is_empty() {
            builder.push(" AND id NOT IN (");
            let mut ids = builder.separated(", ");
            for id in exclude {
                ids.push_bind(*id);
            }
            ids.push_unseparated(")");
        }

        builder
            .push(" ORDER BY name ASC, email ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let users = builder
            .build_query_as::<User>()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(users)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
            .bind(normalize_email(email))
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::state::AppState;
    use crate::test_utils::{create_test_pool, create_test_user};

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[tokio::test]
    async fn search_matches_name_or_email_and_skips_excluded() {
        let state = AppState::new(create_test_pool().await);
        let ada = create_test_user(&state, "ada@example.com", "Ada Lovelace").await;
        let alan = create_test_user(&state, "alan@example.com", "Alan Turing").await;
        create_test_user(&state, "grace@navy.mil", "Grace Hopper").await;

        let found = state.users.search(Some("EXAMPLE"), &[], 10, 0).await.unwrap();
        assert_eq!(found.len(), 2);

        let found = state.users.search(Some("turing"), &[], 10, 0).await.unwrap();
        assert_eq!(found[0].id, alan);

        let found = state.users.search(None, &[ada, alan], 10, 0).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Grace Hopper");

        let second_page = state.users.search(None, &[], 2, 2).await.unwrap();
        assert_eq!(second_page.len(), 1);
    }
}
