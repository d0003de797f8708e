use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::permissions::{PostAction, can_act};
use super::validation::validate_post_body;
use super::{ApiError, ApiResponse, AppState, CreatePostRequest, PostDto, UpdatePostRequest};
use crate::entities::posts;

/// GET /api/posts
/// List all posts, newest first
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<PostDto>>>, ApiError> {
    let posts = state.store().list_posts().await?;

    let mut dtos = Vec::with_capacity(posts.len());
    for post in posts {
        dtos.push(super::serialize_post(&state, &post, &user).await?);
    }

    Ok(Json(ApiResponse::success(dtos)))
}

/// POST /api/posts
/// Create a post authored by the current principal
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let body = validate_post_body(payload.body.as_deref())?;

    let post = state.store().create_post(user.id, body).await?;

    tracing::info!("Post {} created by {}", post.public_id, user.username);

    let dto = super::serialize_post(&state, &post, &user).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(dto))))
}

/// GET /api/posts/{public_id}
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(public_id): Path<String>,
) -> Result<Json<ApiResponse<PostDto>>, ApiError> {
    let post = load_post(&state, &public_id).await?;
    check_permission(&user, &post, PostAction::Read)?;

    let dto = super::serialize_post(&state, &post, &user).await?;
    Ok(Json(ApiResponse::success(dto)))
}

/// PUT /api/posts/{public_id}
/// Replace the body; marks the post as edited. Author or superuser only.
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(public_id): Path<String>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<ApiResponse<PostDto>>, ApiError> {
    let post = load_post(&state, &public_id).await?;
    check_permission(&user, &post, PostAction::Edit)?;

    let body = validate_post_body(payload.body.as_deref())?;
    let post = state.store().update_post_body(post, body).await?;

    let dto = super::serialize_post(&state, &post, &user).await?;
    Ok(Json(ApiResponse::success(dto)))
}

/// DELETE /api/posts/{public_id}
/// Author or superuser only.
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(public_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post = load_post(&state, &public_id).await?;
    check_permission(&user, &post, PostAction::Delete)?;

    state.store().delete_post(post.id).await?;

    tracing::info!("Post {} deleted by {}", public_id, user.username);

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/posts/{public_id}/like
/// Add the (user, post) pair to the like relation. Idempotent: repeated
/// calls leave the count unchanged after the first.
pub async fn like_post(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(public_id): Path<String>,
) -> Result<Json<ApiResponse<PostDto>>, ApiError> {
    let post = load_post(&state, &public_id).await?;
    check_permission(&user, &post, PostAction::Like)?;

    state.store().like_post(user.id, post.id).await?;

    let dto = super::serialize_post(&state, &post, &user).await?;
    Ok(Json(ApiResponse::success(dto)))
}

/// POST /api/posts/{public_id}/remove_like
/// Remove the (user, post) pair from the like relation. No-op when the
/// pair is absent.
pub async fn remove_like(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(public_id): Path<String>,
) -> Result<Json<ApiResponse<PostDto>>, ApiError> {
    let post = load_post(&state, &public_id).await?;
    check_permission(&user, &post, PostAction::Like)?;

    state.store().remove_like(user.id, post.id).await?;

    let dto = super::serialize_post(&state, &post, &user).await?;
    Ok(Json(ApiResponse::success(dto)))
}

// ============================================================================
// Helpers
// ============================================================================

/// Resolve a post by its public identifier, 404 when unknown
async fn load_post(state: &AppState, public_id: &str) -> Result<posts::Model, ApiError> {
    state
        .store()
        .get_post_by_public_id(public_id)
        .await?
        .ok_or_else(|| ApiError::post_not_found(public_id))
}

fn check_permission(
    user: &crate::db::User,
    post: &posts::Model,
    action: PostAction,
) -> Result<(), ApiError> {
    if can_act(user, post.author_id, action) {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "You do not have permission to perform this action",
        ))
    }
}
