use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::contacts::repo_types::{Contact, ContactInput, ContactSortField};
use crate::db::push_sort_and_page;
use crate::pagination::PageRequest;

#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// One page of contacts plus the total number of contacts.
    async fn list(&self, page: &PageRequest<ContactSortField>) -> anyhow::Result<(Vec<Contact>, i64)>;
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Contact>>;
    async fn find_by_name_and_cellphone(
        &self,
        name: &str,
        cellphone: &str,
    ) -> anyhow::Result<Option<Contact>>;
    async fn create(&self, input: ContactInput) -> anyhow::Result<Contact>;
    async fn update(&self, id: Uuid, input: ContactInput) -> anyhow::Result<Option<Contact>>;
    /// Physically removes the contact, returning what was deleted.
    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<Contact>>;
}

const CONTACT_COLUMNS: &str = "id, name, cellphone, category, created_at";

pub struct SqlxContactRepository {
    pub pool: PgPool,
}

impl SqlxContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactRepository for SqlxContactRepository {
    async fn list(&self, page: &PageRequest<ContactSortField>) -> anyhow::Result<(Vec<Contact>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contacts")
            .fetch_one(&self.pool)
            .await
            .context("count contacts")?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {CONTACT_COLUMNS} FROM contacts"));
        push_sort_and_page(&mut qb, page);
        let rows = qb
            .build_query_as::<Contact>()
            .fetch_all(&self.pool)
            .await
            .context("list contacts")?;
        Ok((rows, total))
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Contact>> {
        let row = sqlx::query_as::<_, Contact>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("find contact")?;
        Ok(row)
    }

    async fn find_by_name_and_cellphone(
        &self,
        name: &str,
        cellphone: &str,
    ) -> anyhow::Result<Option<Contact>> {
        let row = sqlx::query_as::<_, Contact>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE name = $1 AND cellphone = $2"
        ))
        .bind(name)
        .bind(cellphone)
        .fetch_optional(&self.pool)
        .await
        .context("find contact by name and cellphone")?;
        Ok(row)
    }

    async fn create(&self, input: ContactInput) -> anyhow::Result<Contact> {
        let row = sqlx::query_as::<_, Contact>(&format!(
            r#"
            INSERT INTO contacts (id, name, cellphone, category)
            VALUES ($1, $2, $3, $4)
            RETURNING {CONTACT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.cellphone)
        .bind(&input.category)
        .fetch_one(&self.pool)
        .await
        .context("insert contact")?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, input: ContactInput) -> anyhow::Result<Option<Contact>> {
        let row = sqlx::query_as::<_, Contact>(&format!(
            r#"
            UPDATE contacts
               SET name = $2, cellphone = $3, category = $4
             WHERE id = $1
            RETURNING {CONTACT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.cellphone)
        .bind(&input.category)
        .fetch_optional(&self.pool)
        .await
        .context("update contact")?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<Contact>> {
        let row = sqlx::query_as::<_, Contact>(&format!(
            "DELETE FROM contacts WHERE id = $1 RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("delete contact")?;
        Ok(row)
    }
}
