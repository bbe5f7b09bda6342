use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};

use crate::config::AppConfig;
use crate::pagination::{PageRequest, SortField};

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")?;
    Ok(pool)
}

pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("run migrations")?;
    Ok(())
}

/// Appends `ORDER BY` (only when a sort was requested) and `LIMIT/OFFSET`.
/// Ties are broken by `id` so pages do not overlap.
pub fn push_sort_and_page<F: SortField>(qb: &mut QueryBuilder<'_, Postgres>, page: &PageRequest<F>) {
    if let Some(sort) = page.sort {
        qb.push(" ORDER BY ")
            .push(sort.field.column())
            .push(" ")
            .push(sort.order.as_sql())
            .push(", id ASC");
    }
    qb.push(" LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
}
