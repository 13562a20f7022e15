use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

use crate::models::PoolRow;

#[derive(Debug, Clone, Default)]
pub struct PoolFilter {
    pub region: Option<String>,
    pub name: Option<String>,
}

pub async fn list<'e>(executor: impl PgExecutor<'e>, filter: PoolFilter) -> SqlxResult<Vec<PoolRow>> {
    // Name search is a case-insensitive substring match
    let name_pattern = filter.name.map(|n| format!("%{}%", n));

    sqlx::query_as::<_, PoolRow>(
        r#"
        SELECT id, name, "desc", address, status, length, starting_block, region, created_at
        FROM pools
        WHERE ($1::text IS NULL OR region = $1)
          AND ($2::text IS NULL OR name ILIKE $2)
        ORDER BY name ASC
        "#,
    )
    .bind(filter.region)
    .bind(name_pattern)
    .fetch_all(executor)
    .await
}

pub async fn list_by_ids<'e>(executor: impl PgExecutor<'e>, ids: &[Uuid]) -> SqlxResult<Vec<PoolRow>> {
    sqlx::query_as::<_, PoolRow>(
        r#"
        SELECT id, name, "desc", address, status, length, starting_block, region, created_at
        FROM pools
        WHERE id = ANY($1)
        ORDER BY name ASC
        "#,
    )
    .bind(ids)
    .fetch_all(executor)
    .await
}
