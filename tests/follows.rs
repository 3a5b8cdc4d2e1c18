//! Handler-level tests for the follow graph endpoints.

mod common;

use actix_web::{App, test, web};
use linkup_be::handlers::json_config;
use linkup_be::services::auth_service::AuthService;
use linkup_be::{AppState, configure_routes};
use serde_json::{Value, json};
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "token-a";

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

#[actix_web::test]
async fn following_yourself_is_rejected() {
    let me = Uuid::new_v4();
    let server = MockServer::start().await;
    common::mount_identity(&server, TOKEN, me).await;

    let app = spawn_app!(server);
    let req = test::TestRequest::post()
        .uri("/api/follow")
        .insert_header(("Authorization", format!("Bearer {}", TOKEN)))
        .set_json(json!({ "followingId": me }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], json!("You cannot follow yourself."));
}

#[actix_web::test]
async fn follow_inserts_the_edge() {
    let me = Uuid::new_v4();
    let them = Uuid::new_v4();

    let server = MockServer::start().await;
    common::mount_identity(&server, TOKEN, me).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/follows"))
        .and(body_partial_json(json!({ "follower_id": me, "following_id": them })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "follower_id": me,
            "following_id": them,
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let app = spawn_app!(server);
    let req = test::TestRequest::post()
        .uri("/api/follow")
        .insert_header(("Authorization", format!("Bearer {}", TOKEN)))
        .set_json(json!({ "followingId": them }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["follow"]["following_id"], json!(them));
}

#[actix_web::test]
async fn following_twice_maps_the_unique_violation_to_400() {
    let me = Uuid::new_v4();
    let them = Uuid::new_v4();

    let server = MockServer::start().await;
    common::mount_identity(&server, TOKEN, me).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/follows"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint",
        })))
        .mount(&server)
        .await;

    let app = spawn_app!(server);
    let req = test::TestRequest::post()
        .uri("/api/follow")
        .insert_header(("Authorization", format!("Bearer {}", TOKEN)))
        .set_json(json!({ "followingId": them }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], json!("Already following this user."));
}

#[actix_web::test]
async fn unfollowing_a_missing_edge_is_404() {
    let me = Uuid::new_v4();
    let them = Uuid::new_v4();

    let server = MockServer::start().await;
    common::mount_identity(&server, TOKEN, me).await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/follows"))
        .and(query_param("follower_id", format!("eq.{}", me)))
        .and(query_param("following_id", format!("eq.{}", them)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let app = spawn_app!(server);
    let req = test::TestRequest::delete()
        .uri(&format!("/api/follow/{}", them))
        .insert_header(("Authorization", format!("Bearer {}", TOKEN)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn unfollow_removes_the_edge() {
    let me = Uuid::new_v4();
    let them = Uuid::new_v4();

    let server = MockServer::start().await;
    common::mount_identity(&server, TOKEN, me).await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/follows"))
        .and(query_param("follower_id", format!("eq.{}", me)))
        .and(query_param("following_id", format!("eq.{}", them)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "follower_id": me,
            "following_id": them,
        }])))
        .mount(&server)
        .await;

    let app = spawn_app!(server);
    let req = test::TestRequest::delete()
        .uri(&format!("/api/follow/{}", them))
        .insert_header(("Authorization", format!("Bearer {}", TOKEN)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn check_reports_the_follow_state() {
    let me = Uuid::new_v4();
    let them = Uuid::new_v4();

    let server = MockServer::start().await;
    common::mount_identity(&server, TOKEN, me).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/follows"))
        .and(query_param("follower_id", format!("eq.{}", me)))
        .and(query_param("following_id", format!("eq.{}", them)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "follower_id": me }])),
        )
        .mount(&server)
        .await;

    let app = spawn_app!(server);
    let req = test::TestRequest::get()
        .uri(&format!("/api/follow/check/{}", them))
        .insert_header(("Authorization", format!("Bearer {}", TOKEN)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["isFollowing"], json!(true));
}

#[actix_web::test]
async fn follower_listing_embeds_profiles_and_counts_them() {
    let them = Uuid::new_v4();
    let fan = Uuid::new_v4();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/follows"))
        .and(query_param("following_id", format!("eq.{}", them)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "follower_id": fan,
            "users": common::user_row(fan, "fan"),
        }])))
        .mount(&server)
        .await;

    let app = spawn_app!(server);
    let req = test::TestRequest::get()
        .uri(&format!("/api/follow/{}/followers", them))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["followers"][0]["users"]["username"], json!("fan"));
}
