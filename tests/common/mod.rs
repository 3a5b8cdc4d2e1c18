//! Shared fixtures for the handler-level tests: an `AppConfig` pointing at a
//! wiremock stand-in for the Supabase surface, plus a helper that teaches the
//! identity endpoint to resolve a bearer token to a user id.

#![allow(dead_code)]

use linkup_be::config::AppConfig;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn test_config(base_url: &str) -> AppConfig {
    AppConfig {
        supabase_url: base_url.trim_end_matches('/').to_string(),
        service_role_key: "service-key".to_string(),
        anon_key: "anon-key".to_string(),
        storage_bucket: "uploads".to_string(),
        port: 0,
        allowed_origins: Vec::new(),
    }
}

/// Makes `GET /auth/v1/user` with the given bearer token resolve to
/// `user_id`, the way the identity provider validates access tokens.
pub async fn mount_identity(server: &MockServer, token: &str, user_id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": user_id })))
        .mount(server)
        .await;
}

/// Any other token is rejected by the provider.
pub async fn mount_identity_rejection(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "msg": "invalid JWT" })),
        )
        .mount(server)
        .await;
}

pub fn user_row(id: Uuid, username: &str) -> serde_json::Value {
    json!({ "id": id, "username": username, "profile_pic_url": null })
}

pub fn conversation_row(id: Uuid, created_by: Uuid, created_at: &str) -> serde_json::Value {
    json!({ "id": id, "created_by": created_by, "created_at": created_at })
}

pub fn message_row(
    id: Uuid,
    conversation_id: Uuid,
    sender_id: Uuid,
    receiver_id: Uuid,
    content: &str,
    created_at: &str,
) -> serde_json::Value {
    json!({
        "id": id,
        "conversation_id": conversation_id,
        "sender_id": sender_id,
        "receiver_id": receiver_id,
        "content": content,
        "created_at": created_at,
    })
}

pub fn post_row(id: Uuid, user_id: Uuid, likes: i64) -> serde_json::Value {
    json!({
        "id": id,
        "user_id": user_id,
        "description": "a post",
        "image_url": "https://cdn.example/img.png",
        "tags": null,
        "visibility": true,
        "likes": likes,
        "created_at": "2024-05-01T10:00:00Z",
        "updated_at": null,
    })
}
