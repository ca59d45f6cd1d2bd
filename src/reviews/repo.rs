use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{NewReview, Review, ReviewChanges};
use crate::db::StoreError;

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Review>, StoreError>;
    async fn create(&self, review: NewReview) -> Result<Review, StoreError>;
    async fn find(&self, id: i32) -> Result<Option<Review>, StoreError>;
    /// Returns `None` when no review has this id.
    async fn update(&self, id: i32, changes: ReviewChanges) -> Result<Option<Review>, StoreError>;
    /// Returns whether a row was deleted.
    async fn delete(&self, id: i32) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgReviewStore {
    db: PgPool,
}

impl PgReviewStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReviewStore for PgReviewStore {
    async fn list(&self) -> Result<Vec<Review>, StoreError> {
        let rows = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, title, content, user_id, created_at
            FROM reviews
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn create(&self, review: NewReview) -> Result<Review, StoreError> {
        let row = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (title, content, user_id)
            VALUES ($1, $2, $3)
            RETURNING id, title, content, user_id, created_at
            "#,
        )
        .bind(review.title)
        .bind(review.content)
        .bind(review.user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn find(&self, id: i32) -> Result<Option<Review>, StoreError> {
        let row = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, title, content, user_id, created_at
            FROM reviews
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: i32, changes: ReviewChanges) -> Result<Option<Review>, StoreError> {
        let row = sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews
               SET title = COALESCE($2, title),
                   content = COALESCE($3, content)
             WHERE id = $1
            RETURNING id, title, content, user_id, created_at
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.content)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
