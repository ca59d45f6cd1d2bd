use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Fields for a review insert.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub title: String,
    pub content: String,
    pub user_id: Uuid,
}

/// Partial update; `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct ReviewChanges {
    pub title: Option<String>,
    pub content: Option<String>,
}
