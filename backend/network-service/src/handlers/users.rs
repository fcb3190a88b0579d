/// User handlers - member directory and profile edits
use super::{parse_id, ApiResponse};
use crate::error::{AppError, Result};
use crate::models::ProfileUpdate;
use crate::services::MAX_ACCOUNT_LIST;
use crate::state::AppState;
use actix_middleware::UserId;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

/// GET /api/users
pub async fn list_users(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    let users = state
        .accounts
        .list(query.limit.unwrap_or(MAX_ACCOUNT_LIST))
        .await?;

    Ok(ApiResponse::success(serde_json::json!({ "users": users }))
        .with_results(users.len())
        .ok())
}

/// GET /api/users/{id}
pub async fn get_user(state: web::Data<AppState>, id: web::Path<String>) -> Result<HttpResponse> {
    let user_id = parse_id(&id, AppError::user_not_found)?;
    let user = state.accounts.get_by_id(user_id).await?;

    Ok(ApiResponse::success(serde_json::json!({ "user": user })).ok())
}

/// PATCH /api/users/{id}
///
/// Only the account owner may edit a profile.
pub async fn update_user(
    state: web::Data<AppState>,
    subject: UserId,
    id: web::Path<String>,
    body: web::Json<ProfileUpdate>,
) -> Result<HttpResponse> {
    let user_id = parse_id(&id, AppError::user_not_found)?;
    if user_id != subject.0 {
        return Err(AppError::Forbidden(
            "You can only update your own profile".to_string(),
        ));
    }

    let user = state
        .accounts
        .update_profile(user_id, body.into_inner())
        .await?;

    Ok(ApiResponse::success(serde_json::json!({ "user": user })).ok())
}

/// GET /api/users/{id}/posts
///
/// Every post by the member, uncapped. An id that is not a UUID names no
/// author, so it yields an empty list rather than 404.
pub async fn get_user_posts(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let posts = match parse_id(&id, AppError::user_not_found) {
        Ok(author_id) => state.posts.list_by_author(author_id).await?,
        Err(_) => Vec::new(),
    };

    Ok(ApiResponse::success(serde_json::json!({ "posts": posts }))
        .with_results(posts.len())
        .ok())
}
