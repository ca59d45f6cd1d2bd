use axum::{extract::State, routing::get, Router};
use tracing::{info, instrument};

use super::{
    dto::{CreateReviewRequest, MessageResponse, UpdateReviewRequest},
    repo_types::{NewReview, Review, ReviewChanges},
};
use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    extract::{Json, Path},
    state::AppState,
};

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", get(list_reviews).post(create_review))
        .route(
            "/reviews/:id",
            get(get_review).put(update_review).delete(delete_review),
        )
}

#[instrument(skip(state))]
pub async fn list_reviews(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<Review>>, ApiError> {
    Ok(Json(state.reviews.list().await?))
}

#[instrument(skip(state, body))]
pub async fn create_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateReviewRequest>,
) -> Result<Json<Review>, ApiError> {
    let review = state
        .reviews
        .create(NewReview {
            title: body.title,
            content: body.content,
            user_id: body.user_id.unwrap_or(user_id),
        })
        .await?;

    info!(review_id = review.id, author = %review.user_id, "review created");
    Ok(Json(review))
}

#[instrument(skip(state))]
pub async fn get_review(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<Review>, ApiError> {
    state
        .reviews
        .find(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Review"))
}

#[instrument(skip(state, body))]
pub async fn update_review(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i32>,
    Json(body): Json<UpdateReviewRequest>,
) -> Result<Json<Review>, ApiError> {
    let changes = ReviewChanges {
        title: body.title,
        content: body.content,
    };
    let review = state
        .reviews
        .update(id, changes)
        .await?
        .ok_or(ApiError::NotFound("Review"))?;

    info!(review_id = review.id, "review updated");
    Ok(Json(review))
}

#[instrument(skip(state))]
pub async fn delete_review(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !state.reviews.delete(id).await? {
        return Err(ApiError::NotFound("Review"));
    }

    info!(review_id = id, "review deleted");
    Ok(Json(MessageResponse {
        message: "Review deleted".into(),
    }))
}
