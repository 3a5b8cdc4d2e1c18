use actix_web::{HttpResponse, error, web};
use serde_json::json;

pub mod auth_handlers;
pub mod follow_handlers;
pub mod message_handlers;
pub mod post_handlers;
pub mod user_handlers;

/// Every error response carries the same `{ "error": <message> }` body.
pub(crate) fn error_json(msg: &str) -> serde_json::Value {
    json!({ "error": msg })
}

/// Malformed JSON bodies get the same error shape as handler-level
/// rejections instead of actix's plain-text default.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let msg = err.to_string();
        error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(json!({ "error": msg })),
        )
        .into()
    })
}
