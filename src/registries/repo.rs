use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use time::Date;
use uuid::Uuid;

use crate::db::push_sort_and_page;
use crate::pagination::PageRequest;
use crate::registries::repo_types::{Registry, RegistryInput, RegistryRow, RegistrySortField};

#[async_trait]
pub trait RegistryRepository: Send + Sync {
    /// One page of active registries plus the number of active registries.
    async fn list_active(
        &self,
        page: &PageRequest<RegistrySortField>,
    ) -> anyhow::Result<(Vec<Registry>, i64)>;
    /// Looks up a registry whether or not it is active.
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Registry>>;
    async fn find_active_by_category_and_date(
        &self,
        category: &str,
        date: Date,
    ) -> anyhow::Result<Option<Registry>>;
    async fn create(&self, input: RegistryInput) -> anyhow::Result<Registry>;
    async fn update(&self, id: Uuid, input: RegistryInput) -> anyhow::Result<Option<Registry>>;
    /// Soft delete: flips `is_active` off and returns the record.
    async fn deactivate(&self, id: Uuid) -> anyhow::Result<Option<Registry>>;
}

const REGISTRY_COLUMNS: &str = "id, created_at, category, is_active, contacts";

pub struct SqlxRegistryRepository {
    pub pool: PgPool,
}

impl SqlxRegistryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegistryRepository for SqlxRegistryRepository {
    async fn list_active(
        &self,
        page: &PageRequest<RegistrySortField>,
    ) -> anyhow::Result<(Vec<Registry>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM registries WHERE is_active")
            .fetch_one(&self.pool)
            .await
            .context("count registries")?;

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {REGISTRY_COLUMNS} FROM registries WHERE is_active"
        ));
        push_sort_and_page(&mut qb, page);
        let rows = qb
            .build_query_as::<RegistryRow>()
            .fetch_all(&self.pool)
            .await
            .context("list registries")?;
        Ok((rows.into_iter().map(Registry::from).collect(), total))
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Registry>> {
        let row = sqlx::query_as::<_, RegistryRow>(&format!(
            "SELECT {REGISTRY_COLUMNS} FROM registries WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("find registry")?;
        Ok(row.map(Registry::from))
    }

    async fn find_active_by_category_and_date(
        &self,
        category: &str,
        date: Date,
    ) -> anyhow::Result<Option<Registry>> {
        let row = sqlx::query_as::<_, RegistryRow>(&format!(
            r#"
            SELECT {REGISTRY_COLUMNS}
              FROM registries
             WHERE category = $1 AND created_at = $2 AND is_active
            "#
        ))
        .bind(category)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .context("find active registry by category and date")?;
        Ok(row.map(Registry::from))
    }

    async fn create(&self, input: RegistryInput) -> anyhow::Result<Registry> {
        let row = sqlx::query_as::<_, RegistryRow>(&format!(
            r#"
            INSERT INTO registries (id, created_at, category, contacts)
            VALUES ($1, $2, $3, $4)
            RETURNING {REGISTRY_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(input.created_at)
        .bind(&input.category)
        .bind(Json(&input.contacts))
        .fetch_one(&self.pool)
        .await
        .context("insert registry")?;
        Ok(row.into())
    }

    async fn update(&self, id: Uuid, input: RegistryInput) -> anyhow::Result<Option<Registry>> {
        let row = sqlx::query_as::<_, RegistryRow>(&format!(
            r#"
            UPDATE registries
               SET created_at = $2, category = $3, contacts = $4
             WHERE id = $1
            RETURNING {REGISTRY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(input.created_at)
        .bind(&input.category)
        .bind(Json(&input.contacts))
        .fetch_optional(&self.pool)
        .await
        .context("update registry")?;
        Ok(row.map(Registry::from))
    }

    async fn deactivate(&self, id: Uuid) -> anyhow::Result<Option<Registry>> {
        let row = sqlx::query_as::<_, RegistryRow>(&format!(
            "UPDATE registries SET is_active = FALSE WHERE id = $1 RETURNING {REGISTRY_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("deactivate registry")?;
        Ok(row.map(Registry::from))
    }
}
