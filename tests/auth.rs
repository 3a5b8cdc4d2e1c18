//! Handler-level tests for signup, login and token refresh against a
//! wiremock stand-in for the identity provider.

mod common;

use actix_web::{App, test, web};
use linkup_be::handlers::json_config;
use linkup_be::services::auth_service::AuthService;
use linkup_be::{AppState, configure_routes};
use serde_json::{Value, json};
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

macro_rules! spawn_app {
    ($server:expr) => {{
        let config = common::test_config(&$server.uri());
        let client = reqwest::Client::new();
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(client.clone(), &config)))
                .app_data(web::Data::new(AuthService::new(client, &config)))
                .app_data(json_config())
                .configure(configure_routes),
        )
        .await
    }};
}

fn token_response(user_id: Uuid, email: &str) -> Value {
    json!({
        "access_token": "access-1",
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "refresh-1",
        "user": { "id": user_id, "email": email },
    })
}

#[actix_web::test]
async fn signup_rejects_malformed_input() {
    let server = MockServer::start().await;
    let app = spawn_app!(server);

    let cases = [
        json!({ "email": "not-an-email", "password": "secret1", "username": "ada" }),
        json!({ "email": "ada@example.com", "password": "short", "username": "ada" }),
        json!({ "email": "ada@example.com", "password": "secret1", "username": "  " }),
    ];
    for body in cases {
        let req = test::TestRequest::post()
            .uri("/api/auth/signup")
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400, "{} should be rejected", body);
    }
}

#[actix_web::test]
async fn signup_mirrors_the_identity_into_the_users_table() {
    let id = Uuid::new_v4();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .and(body_partial_json(json!({ "email": "ada@example.com" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "user": { "id": id } })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .and(body_partial_json(json!({ "id": id, "username": "ada" })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!([common::user_row(id, "ada")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let app = spawn_app!(server);
    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(json!({
            "email": "Ada@Example.com",
            "password": "secret1",
            "username": "ada",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["id"], json!(id));
    assert_eq!(body["user"]["email"], json!("ada@example.com"));
    assert_eq!(body["user"]["username"], json!("ada"));
}

#[actix_web::test]
async fn signup_with_a_taken_username_is_400() {
    let id = Uuid::new_v4();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "user": { "id": id } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint",
        })))
        .mount(&server)
        .await;

    let app = spawn_app!(server);
    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(json!({
            "email": "ada@example.com",
            "password": "secret1",
            "username": "ada",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], json!("Username already taken"));
}

#[actix_web::test]
async fn login_returns_tokens_and_sets_both_cookies() {
    let id = Uuid::new_v4();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(body_partial_json(json!({ "email": "ada@example.com" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_response(id, "ada@example.com")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([common::user_row(id, "ada")])),
        )
        .mount(&server)
        .await;

    let app = spawn_app!(server);
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "ada@example.com", "password": "secret1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let cookie_names: Vec<String> = resp
        .response()
        .cookies()
        .map(|c| c.name().to_string())
        .collect();
    assert!(cookie_names.contains(&"authToken".to_string()));
    assert!(cookie_names.contains(&"refreshToken".to_string()));

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["token"], json!("access-1"));
    assert_eq!(body["refreshToken"], json!("refresh-1"));
    assert_eq!(body["user"]["id"], json!(id));
    assert_eq!(body["user"]["username"], json!("ada"));
}

#[actix_web::test]
async fn login_with_bad_credentials_is_400() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials",
        })))
        .mount(&server)
        .await;

    let app = spawn_app!(server);
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "ada@example.com", "password": "wrong" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], json!("Invalid login credentials"));
}

#[actix_web::test]
async fn login_without_a_profile_row_is_rejected() {
    let id = Uuid::new_v4();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_response(id, "ada@example.com")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let app = spawn_app!(server);
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "ada@example.com", "password": "secret1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], json!("User not found in the database."));
}

#[actix_web::test]
async fn refresh_without_a_token_is_401() {
    let server = MockServer::start().await;
    let app = spawn_app!(server);

    let req = test::TestRequest::post().uri("/api/auth/refresh").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn refresh_accepts_the_token_in_the_body() {
    let id = Uuid::new_v4();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_partial_json(json!({ "refresh_token": "refresh-0" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_response(id, "ada@example.com")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let app = spawn_app!(server);
    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(json!({ "refreshToken": "refresh-0" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let cookie_names: Vec<String> = resp
        .response()
        .cookies()
        .map(|c| c.name().to_string())
        .collect();
    assert!(cookie_names.contains(&"authToken".to_string()));

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["id"], json!(id));
}

#[actix_web::test]
async fn current_user_requires_a_valid_token() {
    let server = MockServer::start().await;
    common::mount_identity_rejection(&server).await;

    let app = spawn_app!(server);
    let req = test::TestRequest::get()
        .uri("/api/auth/user")
        .insert_header(("Authorization", "Bearer bogus"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}
