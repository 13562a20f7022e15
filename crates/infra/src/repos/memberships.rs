use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

use crate::models::{MembershipRow, MembershipStatus};

#[derive(Debug, Clone)]
pub struct CreateMembership {
    pub admin_id: Uuid,
    pub pool_id: Uuid,
}

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateMembership,
) -> SqlxResult<MembershipRow> {
    sqlx::query_as::<_, MembershipRow>(
        r#"
        INSERT INTO membership (admin_id, pool_id)
        VALUES ($1, $2)
        ON CONFLICT (admin_id, pool_id) DO UPDATE SET status = 'active'
        RETURNING id, admin_id, pool_id, status, created_at
        "#,
    )
    .bind(data.admin_id)
    .bind(data.pool_id)
    .fetch_one(executor)
    .await
}

pub async fn is_active_member<'e>(
    executor: impl PgExecutor<'e>,
    admin_id: Uuid,
    pool_id: Uuid,
) -> SqlxResult<bool> {
    let result: (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM membership
            WHERE admin_id = $1 AND pool_id = $2 AND status = 'active'
        )
        "#,
    )
    .bind(admin_id)
    .bind(pool_id)
    .fetch_one(executor)
    .await?;

    Ok(result.0)
}

pub async fn list_active_pool_ids<'e>(
    executor: impl PgExecutor<'e>,
    admin_id: Uuid,
) -> SqlxResult<Vec<Uuid>> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT pool_id
        FROM membership
        WHERE admin_id = $1 AND status = 'active'
        ORDER BY created_at
        "#,
    )
    .bind(admin_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn set_status<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    status: MembershipStatus,
) -> SqlxResult<Option<MembershipRow>> {
    sqlx::query_as::<_, MembershipRow>(
        r#"
        UPDATE membership
        SET status = $2
        WHERE id = $1
        RETURNING id, admin_id, pool_id, status, created_at
        "#,
    )
    .bind(id)
    .bind(status)
    .fetch_optional(executor)
    .await
}
