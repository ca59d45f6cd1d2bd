use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{
    repo::ReviewStore,
    repo_types::{NewReview, Review, ReviewChanges},
};
use crate::db::StoreError;

/// In-process review store for tests, ids assigned like a SERIAL column.
#[derive(Default)]
pub struct MemoryReviewStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i32,
    rows: Vec<Review>,
}

#[async_trait]
impl ReviewStore for MemoryReviewStore {
    async fn list(&self) -> Result<Vec<Review>, StoreError> {
        Ok(self.inner.read().await.rows.clone())
    }

    async fn create(&self, review: NewReview) -> Result<Review, StoreError> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let row = Review {
            id: inner.next_id,
            title: review.title,
            content: review.content,
            user_id: review.user_id,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.rows.push(row.clone());
        Ok(row)
    }

    async fn find(&self, id: i32) -> Result<Option<Review>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.rows.iter().find(|r| r.id == id).cloned())
    }

    async fn update(&self, id: i32, changes: ReviewChanges) -> Result<Option<Review>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(row) = inner.rows.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            row.title = title;
        }
        if let Some(content) = changes.content {
            row.content = content;
        }
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.rows.len();
        inner.rows.retain(|r| r.id != id);
        Ok(inner.rows.len() != before)
    }
}
