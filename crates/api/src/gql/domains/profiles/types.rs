use async_graphql::{InputObject, SimpleObject, ID};
use chrono::{DateTime, Utc};
use infra::models::{AdminUserRow, AppUserRow};

#[derive(InputObject)]
pub struct RegisterProfileInput {
    pub display_name: String,
    pub phone: Option<String>,
}

#[derive(SimpleObject, Clone)]
pub struct UserProfile {
    pub id: ID,
    pub display_name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AppUserRow> for UserProfile {
    fn from(row: AppUserRow) -> Self {
        Self {
            id: row.id.into(),
            display_name: row.display_name,
            phone: row.phone,
            created_at: row.created_at,
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct AdminProfile {
    pub id: ID,
    pub display_name: String,
    pub phone: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<AdminUserRow> for AdminProfile {
    fn from(row: AdminUserRow) -> Self {
        Self {
            id: row.id.into(),
            display_name: row.display_name,
            phone: row.phone,
            status: row.status.as_str().to_string(),
            created_at: row.created_at,
        }
    }
}
