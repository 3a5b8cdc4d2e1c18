use actix_web::{HttpResponse, delete, get, post, web};
use log::error;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::AppState;
use crate::handlers::error_json;
use crate::middleware::auth_extractor::AuthenticatedUser;

#[derive(Debug, Deserialize)]
pub struct FollowIn {
    #[serde(rename = "followingId")]
    pub following_id: Option<Uuid>,
}

/// POST /api/follow
#[post("")]
pub async fn follow_user(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<FollowIn>,
) -> HttpResponse {
    let Some(following_id) = body.following_id else {
        return HttpResponse::BadRequest().json(error_json("followingId is required"));
    };
    if following_id == user.user_id {
        return HttpResponse::BadRequest().json(error_json("You cannot follow yourself."));
    }

    match state.follows.follow(user.user_id, following_id).await {
        Ok(follow) => HttpResponse::Created().json(json!({
            "message": "Followed successfully.",
            "follow": follow,
        })),
        Err(e) if e.is_unique_violation() => {
            HttpResponse::BadRequest().json(error_json("Already following this user."))
        }
        Err(e) => {
            error!("failed to follow {}: {}", following_id, e);
            HttpResponse::InternalServerError().json(error_json("Failed to follow user."))
        }
    }
}

/// DELETE /api/follow/{followingId}
#[delete("/{following_id}")]
pub async fn unfollow_user(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> HttpResponse {
    let following_id = path.into_inner();

    match state.follows.unfollow(user.user_id, following_id).await {
        Ok(true) => HttpResponse::Ok().json(json!({ "message": "Unfollowed successfully." })),
        Ok(false) => {
            HttpResponse::NotFound().json(error_json("Follow relationship not found."))
        }
        Err(e) => {
            error!("failed to unfollow {}: {}", following_id, e);
            HttpResponse::InternalServerError().json(error_json("Failed to unfollow user."))
        }
    }
}

/// GET /api/follow/check/{followingId}: whether the caller follows them.
#[get("/check/{following_id}")]
pub async fn check_following(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> HttpResponse {
    let following_id = path.into_inner();
    match state.follows.is_following(user.user_id, following_id).await {
        Ok(is_following) => HttpResponse::Ok().json(json!({ "isFollowing": is_following })),
        Err(e) => {
            error!("failed to check follow state for {}: {}", following_id, e);
            HttpResponse::InternalServerError()
                .json(error_json("Failed to check following status."))
        }
    }
}

/// GET /api/follow/{userId}/followers, public.
#[get("/{user_id}/followers")]
pub async fn get_followers(state: web::Data<AppState>, path: web::Path<Uuid>) -> HttpResponse {
    let user_id = path.into_inner();
    match state.follows.followers_of(user_id).await {
        Ok(followers) => HttpResponse::Ok().json(json!({
            "count": followers.len(),
            "followers": followers,
        })),
        Err(e) => {
            error!("failed to fetch followers of {}: {}", user_id, e);
            HttpResponse::InternalServerError().json(error_json("Failed to fetch followers."))
        }
    }
}

/// GET /api/follow/{userId}/following, public.
#[get("/{user_id}/following")]
pub async fn get_following(state: web::Data<AppState>, path: web::Path<Uuid>) -> HttpResponse {
    let user_id = path.into_inner();
    match state.follows.following_of(user_id).await {
        Ok(following) => HttpResponse::Ok().json(json!({
            "count": following.len(),
            "following": following,
        })),
        Err(e) => {
            error!("failed to fetch following of {}: {}", user_id, e);
            HttpResponse::InternalServerError().json(error_json("Failed to fetch following."))
        }
    }
}
