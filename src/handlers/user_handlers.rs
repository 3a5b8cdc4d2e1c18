use actix_web::{HttpResponse, get, put, web};
use chrono::Utc;
use log::error;
use serde_json::json;
use uuid::Uuid;

use crate::AppState;
use crate::dtos::user_dtos::{SearchQuery, UpdateUserIn};
use crate::handlers::error_json;
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::repositories::supabase::RepoError;

/// GET /api/users/search?query=: case-insensitive username search, public.
#[get("/search")]
pub async fn search_users(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> HttpResponse {
    let Some(q) = query.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) else {
        return HttpResponse::BadRequest().json(error_json("Query parameter is required"));
    };

    match state.users.search(q).await {
        Ok(users) => HttpResponse::Ok().json(users),
        Err(e) => {
            error!("user search failed for {:?}: {}", q, e);
            HttpResponse::InternalServerError().json(error_json(&e.to_string()))
        }
    }
}

/// GET /api/users/{id}: public profile lookup.
#[get("/{id}")]
pub async fn get_user_profile(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    let id = path.into_inner();
    match state.users.get_public(id).await {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(RepoError::NotFound) => HttpResponse::NotFound().json(error_json("User not found")),
        Err(e) => {
            error!("failed to fetch user {}: {}", id, e);
            HttpResponse::InternalServerError().json(error_json(&e.to_string()))
        }
    }
}

/// PUT /api/users/{id}
///
/// Updates username and/or profile picture. Only the authenticated owner
/// may update their row; a new picture goes to storage first and only its
/// public URL is persisted.
#[put("/{id}")]
pub async fn update_user(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateUserIn>,
) -> HttpResponse {
    let id = path.into_inner();
    if id != user.user_id {
        return HttpResponse::Forbidden()
            .json(error_json("You can only update your own profile"));
    }

    let existing = match state.users.get_public(id).await {
        Ok(u) => u,
        Err(RepoError::NotFound) => {
            return HttpResponse::NotFound().json(error_json("User not found"));
        }
        Err(e) => {
            error!("failed to fetch user {}: {}", id, e);
            return HttpResponse::InternalServerError().json(error_json(&e.to_string()));
        }
    };

    let mut patch = json!({ "updated_at": Utc::now() });
    let mut has_changes = false;

    if let Some(username) = body.username.as_deref().map(str::trim) {
        if !username.is_empty() && Some(username) != existing.username.as_deref() {
            patch["username"] = json!(username);
            has_changes = true;
        }
    }

    if let Some(upload) = &body.profile_pic {
        match state.storage.upload_image(id, upload).await {
            Ok(url) => {
                patch["profile_pic_url"] = json!(url);
                has_changes = true;
            }
            Err(e) => {
                error!("profile picture upload failed for {}: {}", id, e);
                return HttpResponse::BadRequest().json(error_json(&e.to_string()));
            }
        }
    }

    if !has_changes {
        return HttpResponse::Ok().json(json!({
            "message": "No changes to update",
            "user": existing,
        }));
    }

    match state.users.update(id, patch).await {
        Ok(updated) => HttpResponse::Ok().json(json!({
            "message": "User updated successfully",
            "user": updated,
        })),
        Err(e) if e.is_unique_violation() => {
            HttpResponse::BadRequest().json(error_json("Username already taken"))
        }
        Err(e) => {
            error!("failed to update user {}: {}", id, e);
            HttpResponse::BadRequest().json(error_json(&e.to_string()))
        }
    }
}
