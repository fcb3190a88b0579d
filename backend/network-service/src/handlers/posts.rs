/// Post handlers - feed, creation, likes and comments
use super::{acting_user, parse_id, ApiResponse};
use crate::error::{AppError, Result};
use crate::models::PostType;
use crate::services::{PostDraft, MAX_FEED_LIMIT};
use crate::state::AppState;
use actix_middleware::UserId;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub content: Option<String>,
    pub image: Option<String>,
    pub tags: Option<Vec<String>>,
    pub post_type: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    #[serde(default)]
    pub content: String,
    pub user_id: Option<String>,
}

fn parse_post_type(raw: Option<&str>) -> Result<Option<PostType>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| {
            AppError::Validation(
                "Post type must be one of post, article, achievement, question".to_string(),
            )
        }),
    }
}

/// GET /api/posts
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<FeedQuery>,
) -> Result<HttpResponse> {
    let posts = state
        .posts
        .list(query.limit.unwrap_or(MAX_FEED_LIMIT))
        .await?;

    Ok(ApiResponse::success(serde_json::json!({ "posts": posts }))
        .with_results(posts.len())
        .ok())
}

/// GET /api/posts/{id}
pub async fn get_post(state: web::Data<AppState>, id: web::Path<String>) -> Result<HttpResponse> {
    let post_id = parse_id(&id, AppError::post_not_found)?;
    let post = state.posts.get_by_id(post_id).await?;

    Ok(ApiResponse::success(serde_json::json!({ "post": post })).ok())
}

/// POST /api/posts
pub async fn create_post(
    state: web::Data<AppState>,
    user_id: UserId,
    body: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let req = body.into_inner();
    let author_id = acting_user(user_id, req.user_id.as_deref())?;
    let post_type = parse_post_type(req.post_type.as_deref())?;

    let post = state
        .posts
        .create(
            author_id,
            PostDraft {
                content: req.content,
                image: req.image,
                tags: req.tags,
                post_type,
            },
        )
        .await?;

    Ok(ApiResponse::success(serde_json::json!({ "post": post })).created())
}

/// POST /api/posts/{id}/like
///
/// The body is optional; the token subject is the liker.
pub async fn toggle_like(
    state: web::Data<AppState>,
    user_id: UserId,
    id: web::Path<String>,
    body: Option<web::Json<LikeRequest>>,
) -> Result<HttpResponse> {
    let post_id = parse_id(&id, AppError::post_not_found)?;
    let claimed = body.and_then(|b| b.into_inner().user_id);
    let liker = acting_user(user_id, claimed.as_deref())?;

    let toggle = state.posts.toggle_like(post_id, liker).await?;

    Ok(ApiResponse::success(toggle).ok())
}

/// GET /api/posts/{id}/comments
pub async fn list_comments(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_id(&id, AppError::post_not_found)?;
    let comments = state.posts.list_comments(post_id).await?;

    Ok(ApiResponse::success(serde_json::json!({ "comments": comments }))
        .with_results(comments.len())
        .ok())
}

/// POST /api/posts/{id}/comments
pub async fn add_comment(
    state: web::Data<AppState>,
    user_id: UserId,
    id: web::Path<String>,
    body: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    let post_id = parse_id(&id, AppError::post_not_found)?;
    let req = body.into_inner();
    let commenter = acting_user(user_id, req.user_id.as_deref())?;

    let added = state
        .posts
        .add_comment(post_id, commenter, &req.content)
        .await?;

    Ok(ApiResponse::success(added).ok())
}
