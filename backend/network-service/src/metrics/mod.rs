//! Prometheus metrics for network-service.
//!
//! Domain counters plus the `/metrics` handler. HTTP request metrics come
//! from `actix_middleware::MetricsMiddleware`.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    /// Posts created.
    pub static ref POSTS_CREATED_TOTAL: IntCounter = register_int_counter!(
        "posts_created_total",
        "Total posts created"
    )
    .expect("failed to register posts_created_total");

    /// Like toggles segmented by resulting action (like/unlike).
    pub static ref POST_LIKES_TOGGLED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_likes_toggled_total",
        "Like toggles segmented by action",
        &["action"]
    )
    .expect("failed to register post_likes_toggled_total");

    pub static ref POST_COMMENTS_CREATED_TOTAL: IntCounter = register_int_counter!(
        "post_comments_created_total",
        "Total comments appended to posts"
    )
    .expect("failed to register post_comments_created_total");

    /// Register/login attempts segmented by outcome.
    pub static ref AUTH_ATTEMPTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "auth_attempts_total",
        "Authentication attempts segmented by outcome",
        &["outcome"]
    )
    .expect("failed to register auth_attempts_total");
}

pub fn record_post_created() {
    POSTS_CREATED_TOTAL.inc();
}

pub fn record_like_toggled(liked: bool) {
    let action = if liked { "like" } else { "unlike" };
    POST_LIKES_TOGGLED_TOTAL.with_label_values(&[action]).inc();
}

pub fn record_comment_created() {
    POST_COMMENTS_CREATED_TOTAL.inc();
}

/// `outcome` is one of `register_ok`, `register_rejected`, `login_ok`, `login_failed`
pub fn record_auth_attempt(outcome: &str) {
    AUTH_ATTEMPTS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn renders_recorded_counters() {
        record_post_created();
        record_like_toggled(true);

        let resp = serve_metrics().await;
        assert!(resp.status().is_success());

        let body = to_bytes(resp.into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("posts_created_total"));
        assert!(text.contains("post_likes_toggled_total{action=\"like\"}"));
    }
}
