use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, ProfileUpdate, User};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Any user with this email, active or not.
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_active_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_active_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn create(&self, user: NewUser) -> anyhow::Result<User>;
    async fn update_profile(&self, id: Uuid, profile: ProfileUpdate) -> anyhow::Result<Option<User>>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()>;
}

const USER_COLUMNS: &str =
    "id, name, email, password_hash, cellphone, category, is_active, created_at";

pub struct SqlxUserRepository {
    pub pool: PgPool,
}

impl SqlxUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_active_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND is_active"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("find active user by email")?;
        Ok(user)
    }

    async fn find_active_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND is_active"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("find active user by id")?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, cellphone, category)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.cellphone)
        .bind(&user.category)
        .fetch_one(&self.pool)
        .await
        .context("insert user")?;
        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, profile: ProfileUpdate) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET name = $2, email = $3, cellphone = $4, category = $5
             WHERE id = $1 AND is_active
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.cellphone)
        .bind(&profile.category)
        .fetch_optional(&self.pool)
        .await
        .context("update user profile")?;
        Ok(user)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .context("update user password")?;
        Ok(())
    }
}
