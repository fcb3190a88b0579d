/// HTTP handlers for the REST gateway
///
/// - auth: register and login, both answer with a bearer token
/// - posts: feed, post creation, likes and comments
/// - users: member directory and profile edits
/// - system: API index, health and the admin reset
///
/// Every response uses the `{status, data?, token?, results?, message?}`
/// envelope.
pub mod auth;
pub mod posts;
pub mod system;
pub mod users;

use crate::error::{AppError, Result};
use crate::metrics::serve_metrics;
use actix_middleware::{JwtAuthMiddleware, UserId};
use actix_web::{error::InternalError, guard, web, HttpRequest, HttpResponse};
use crypto_core::jwt::JwtKeys;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Request body size ceiling
const MAX_JSON_BYTES: usize = 256 * 1024;

/// Success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success",
            token: None,
            results: None,
            message: None,
            data,
        }
    }

    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_results(mut self, results: usize) -> Self {
        self.results = Some(results);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn ok(self) -> HttpResponse {
        HttpResponse::Ok().json(self)
    }

    pub fn created(self) -> HttpResponse {
        HttpResponse::Created().json(self)
    }
}

fn error_body(message: &str) -> serde_json::Value {
    serde_json::json!({ "status": "error", "message": message })
}

/// Path ids that are not UUIDs cannot name a stored resource
pub(crate) fn parse_id(raw: &str, missing: fn() -> AppError) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| missing())
}

/// Resolve the acting account. A body `userId` is accepted but must be the
/// token subject.
pub(crate) fn acting_user(subject: UserId, claimed: Option<&str>) -> Result<Uuid> {
    match claimed.map(str::trim).filter(|c| !c.is_empty()) {
        None => Ok(subject.0),
        Some(raw) => match Uuid::parse_str(raw) {
            Ok(id) if id == subject.0 => Ok(id),
            _ => Err(AppError::Forbidden(
                "You can only act on behalf of your own account".to_string(),
            )),
        },
    }
}

/// JSON body errors answer 400 in the error envelope
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_JSON_BYTES)
        .error_handler(|err, _req| {
            tracing::debug!(error = %err, "rejected request body");
            let response = HttpResponse::BadRequest().json(error_body("Invalid JSON request body"));
            InternalError::from_response(err, response).into()
        })
}

/// Fallback for unmatched routes
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    tracing::debug!(path = %req.path(), method = %req.method(), "no route");
    HttpResponse::NotFound().json(error_body("API route not found"))
}

/// Register every route. Mutating routes sit behind the bearer-token
/// middleware; their public siblings on the same path are separate
/// resources selected by method guard.
pub fn configure(cfg: &mut web::ServiceConfig, keys: Arc<JwtKeys>) {
    let auth = JwtAuthMiddleware::new(keys);

    cfg.app_data(json_config())
        .route("/metrics", web::get().to(serve_metrics))
        .service(
            web::scope("/api")
                .route("", web::get().to(system::index))
                .route("/health", web::get().to(system::health))
                .route("/admin/reset", web::post().to(system::admin_reset))
                .service(
                    web::scope("/auth")
                        .route("/register", web::post().to(auth::register))
                        .route("/login", web::post().to(auth::login)),
                )
                .service(
                    web::resource("/posts")
                        .guard(guard::Post())
                        .wrap(auth.clone())
                        .route(web::post().to(posts::create_post)),
                )
                .service(
                    web::resource("/posts")
                        .guard(guard::Get())
                        .route(web::get().to(posts::list_posts)),
                )
                .service(
                    web::resource("/posts/{id}")
                        .guard(guard::Get())
                        .route(web::get().to(posts::get_post)),
                )
                .service(
                    web::resource("/posts/{id}/like")
                        .guard(guard::Post())
                        .wrap(auth.clone())
                        .route(web::post().to(posts::toggle_like)),
                )
                .service(
                    web::resource("/posts/{id}/comments")
                        .guard(guard::Post())
                        .wrap(auth.clone())
                        .route(web::post().to(posts::add_comment)),
                )
                .service(
                    web::resource("/posts/{id}/comments")
                        .guard(guard::Get())
                        .route(web::get().to(posts::list_comments)),
                )
                .service(
                    web::resource("/users")
                        .guard(guard::Get())
                        .route(web::get().to(users::list_users)),
                )
                .service(
                    web::resource("/users/{id}")
                        .guard(guard::Patch())
                        .wrap(auth)
                        .route(web::patch().to(users::update_user)),
                )
                .service(
                    web::resource("/users/{id}")
                        .guard(guard::Get())
                        .route(web::get().to(users::get_user)),
                )
                .service(
                    web::resource("/users/{id}/posts")
                        .guard(guard::Get())
                        .route(web::get().to(users::get_user_posts)),
                ),
        );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_skips_absent_fields() {
        let body = serde_json::to_value(ApiResponse::success(serde_json::json!({"x": 1}))).unwrap();
        assert_eq!(body, serde_json::json!({"status": "success", "data": {"x": 1}}));

        let body = serde_json::to_value(
            ApiResponse::success(serde_json::json!({}))
                .with_token("t".into())
                .with_results(2),
        )
        .unwrap();
        assert_eq!(body["token"], "t");
        assert_eq!(body["results"], 2);
        assert!(body.get("message").is_none());
    }

    #[test]
    fn acting_user_must_match_subject() {
        let me = Uuid::new_v4();
        assert_eq!(acting_user(UserId(me), None).unwrap(), me);
        assert_eq!(acting_user(UserId(me), Some("")).unwrap(), me);
        assert_eq!(acting_user(UserId(me), Some(&me.to_string())).unwrap(), me);

        let other = Uuid::new_v4().to_string();
        assert!(matches!(
            acting_user(UserId(me), Some(&other)),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            acting_user(UserId(me), Some("1")),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn non_uuid_ids_are_not_found() {
        assert!(matches!(
            parse_id("abc", AppError::post_not_found),
            Err(AppError::NotFound("Post"))
        ));
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), AppError::post_not_found).unwrap(), id);
    }
}
