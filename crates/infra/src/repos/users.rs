use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

use crate::models::{AdminUserRow, AppUserRow};

#[derive(Debug, Clone)]
pub struct CreateProfile {
    pub id: Uuid,
    pub display_name: String,
    pub phone: Option<String>,
}

pub async fn insert_app_user<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateProfile,
) -> SqlxResult<AppUserRow> {
    sqlx::query_as::<_, AppUserRow>(
        r#"
        INSERT INTO app_user (id, display_name, phone)
        VALUES ($1, $2, $3)
        RETURNING id, display_name, phone, created_at
        "#,
    )
    .bind(data.id)
    .bind(data.display_name)
    .bind(data.phone)
    .fetch_one(executor)
    .await
}

pub async fn insert_admin_user<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateProfile,
) -> SqlxResult<AdminUserRow> {
    sqlx::query_as::<_, AdminUserRow>(
        r#"
        INSERT INTO admin_user (id, display_name, phone, status)
        VALUES ($1, $2, $3, 'use')
        RETURNING id, display_name, phone, status, created_at
        "#,
    )
    .bind(data.id)
    .bind(data.display_name)
    .bind(data.phone)
    .fetch_one(executor)
    .await
}
