use super::ApiResponse;
use crate::error::Result;
use crate::services::{Credentials, Registration};
use crate::state::AppState;
use actix_web::{web, HttpResponse};

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<Registration>,
) -> Result<HttpResponse> {
    let account = state.accounts.register(body.into_inner()).await?;
    let session = state.accounts.issue_session(account)?;

    Ok(ApiResponse::success(serde_json::json!({ "user": session.account }))
        .with_token(session.token)
        .created())
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<Credentials>,
) -> Result<HttpResponse> {
    let session = state.accounts.authenticate(body.into_inner()).await?;

    Ok(ApiResponse::success(serde_json::json!({ "user": session.account }))
        .with_token(session.token)
        .ok())
}
