use super::ApiResponse;
use crate::error::{AppError, Result};
use crate::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use crypto_core::hash::secrets_match;

pub const SERVICE_NAME: &str = "network-service";
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// GET /api
pub async fn index(state: web::Data<AppState>) -> Result<HttpResponse> {
    let stats = state.posts.stats().await?;
    let users = state.accounts.count().await?;

    Ok(ApiResponse::success(serde_json::json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.backend,
        "stats": {
            "users": users,
            "posts": stats.posts,
            "totalLikes": stats.total_likes,
            "totalComments": stats.total_comments,
        },
        "endpoints": {
            "auth": ["POST /api/auth/register", "POST /api/auth/login"],
            "posts": [
                "GET /api/posts",
                "POST /api/posts",
                "GET /api/posts/:id",
                "POST /api/posts/:id/like",
                "GET /api/posts/:id/comments",
                "POST /api/posts/:id/comments",
            ],
            "users": [
                "GET /api/users",
                "GET /api/users/:id",
                "PATCH /api/users/:id",
                "GET /api/users/:id/posts",
            ],
            "system": ["GET /api/health", "GET /metrics"],
        },
    }))
    .with_message("Aura API is running")
    .ok())
}

/// GET /api/health
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "OK",
        "service": SERVICE_NAME,
        "backend": state.backend,
        "uptime": state.uptime_secs(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// POST /api/admin/reset
///
/// Hidden (404) unless an admin token is configured.
pub async fn admin_reset(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Ok(super::not_found(req).await);
    };

    let presented = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !secrets_match(expected, presented) {
        tracing::warn!("admin reset rejected");
        return Err(AppError::Unauthorized("Invalid admin token".to_string()));
    }

    let summary = state.admin.reset().await?;

    Ok(ApiResponse::success(summary)
        .with_message("Store reset and demo data seeded")
        .ok())
}
