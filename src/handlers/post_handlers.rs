use actix_web::{HttpResponse, delete, get, patch, post, put, web};
use chrono::Utc;
use log::error;
use serde_json::json;
use uuid::Uuid;

use crate::AppState;
use crate::dtos::post_dtos::{CreatePostIn, PostOut, ToggleLikeOut, UpdatePostIn};
use crate::handlers::error_json;
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::repositories::post_repository::PostWithAuthor;
use crate::repositories::supabase::RepoError;

/// Pulls the author's username out of the embedded join, with the original
/// feed's placeholder when the join came back empty.
fn flatten_post(post: PostWithAuthor) -> PostOut {
    let username = post
        .users
        .and_then(|u| u.username)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "Unknown User".to_string());

    PostOut {
        id: post.id,
        user_id: post.user_id,
        description: post.description,
        image_url: post.image_url,
        tags: post.tags,
        visibility: post.visibility,
        likes: post.likes,
        created_at: post.created_at,
        updated_at: post.updated_at,
        username,
    }
}

/// GET /api/posts: the public feed, newest first.
#[get("")]
pub async fn list_posts(state: web::Data<AppState>) -> HttpResponse {
    match state.posts.list_with_authors().await {
        Ok(posts) => {
            let out: Vec<PostOut> = posts.into_iter().map(flatten_post).collect();
            HttpResponse::Ok().json(out)
        }
        Err(e) => {
            error!("failed to fetch posts: {}", e);
            HttpResponse::InternalServerError().json(error_json("Failed to fetch posts"))
        }
    }
}

/// POST /api/posts: upload the image, then insert the post row pointing at
/// its public URL.
#[post("")]
pub async fn create_post(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<CreatePostIn>,
) -> HttpResponse {
    let description = body.description.trim();
    if description.is_empty() {
        return HttpResponse::BadRequest().json(error_json("Missing required fields"));
    }

    let image_url = match state.storage.upload_image(user.user_id, &body.image).await {
        Ok(url) => url,
        Err(e) => {
            error!("image upload failed for {}: {}", user.user_id, e);
            return HttpResponse::InternalServerError().json(error_json("Failed to upload image"));
        }
    };

    match state
        .posts
        .create(user.user_id, description, &image_url)
        .await
    {
        Ok(post) => HttpResponse::Created().json(post),
        Err(e) => {
            error!("failed to create post for {}: {}", user.user_id, e);
            HttpResponse::InternalServerError().json(error_json("Failed to create post"))
        }
    }
}

/// GET /api/posts/{id}
#[get("/{id}")]
pub async fn get_post(state: web::Data<AppState>, path: web::Path<Uuid>) -> HttpResponse {
    let id = path.into_inner();
    match state.posts.get(id).await {
        Ok(post) => HttpResponse::Ok().json(post),
        Err(RepoError::NotFound) => HttpResponse::NotFound().json(error_json("Post not found")),
        Err(e) => {
            error!("failed to fetch post {}: {}", id, e);
            HttpResponse::InternalServerError().json(error_json("Failed to fetch post"))
        }
    }
}

/// PUT /api/posts/{id}: description/tags/visibility, owner only.
#[put("/{id}")]
pub async fn update_post(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostIn>,
) -> HttpResponse {
    let id = path.into_inner();

    let existing = match state.posts.get(id).await {
        Ok(p) => p,
        Err(RepoError::NotFound) => {
            return HttpResponse::NotFound().json(error_json("Post not found"));
        }
        Err(e) => {
            error!("failed to fetch post {}: {}", id, e);
            return HttpResponse::InternalServerError().json(error_json("Failed to fetch post"));
        }
    };
    if existing.user_id != user.user_id {
        return HttpResponse::Forbidden().json(error_json("You can only update your own posts"));
    }

    let mut patch = json!({ "updated_at": Utc::now() });
    if let Some(description) = &body.description {
        patch["description"] = json!(description);
    }
    if let Some(tags) = &body.tags {
        patch["tags"] = json!(tags);
    }
    if let Some(visibility) = body.visibility {
        patch["visibility"] = json!(visibility);
    }

    match state.posts.update(id, patch).await {
        Ok(post) => HttpResponse::Ok().json(post),
        Err(e) => {
            error!("failed to update post {}: {}", id, e);
            HttpResponse::InternalServerError().json(error_json("Failed to update post"))
        }
    }
}

/// DELETE /api/posts/{id}, owner only.
#[delete("/{id}")]
pub async fn delete_post(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> HttpResponse {
    let id = path.into_inner();

    let existing = match state.posts.get(id).await {
        Ok(p) => p,
        Err(RepoError::NotFound) => {
            return HttpResponse::NotFound().json(error_json("Post not found"));
        }
        Err(e) => {
            error!("failed to fetch post {}: {}", id, e);
            return HttpResponse::InternalServerError().json(error_json("Failed to fetch post"));
        }
    };
    if existing.user_id != user.user_id {
        return HttpResponse::Forbidden().json(error_json("You can only delete your own posts"));
    }

    match state.posts.delete(id).await {
        Ok(post) => HttpResponse::Ok().json(json!({
            "message": "Post deleted successfully",
            "post": post,
        })),
        Err(e) => {
            error!("failed to delete post {}: {}", id, e);
            HttpResponse::InternalServerError().json(error_json("Failed to delete post"))
        }
    }
}

/// PATCH /api/posts/{id}/toggle-like
///
/// Inserts or removes the caller's like row, then recounts the detail rows
/// and writes the count into the post's denormalized counter. The steps are
/// separate store calls, so a concurrent toggle can be observed between
/// them, but the counter always converges to the row count last written.
#[patch("/{id}/toggle-like")]
pub async fn toggle_like(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> HttpResponse {
    let post_id = path.into_inner();

    if let Err(e) = state.posts.get(post_id).await {
        return match e {
            RepoError::NotFound => {
                HttpResponse::NotFound().json(error_json("Post not found"))
            }
            other => {
                error!("failed to fetch post {}: {}", post_id, other);
                HttpResponse::InternalServerError().json(error_json("Failed to fetch post"))
            }
        };
    }

    let liked = match state.posts.has_like(user.user_id, post_id).await {
        Ok(liked) => liked,
        Err(e) => {
            error!("failed to check like state for {}: {}", post_id, e);
            return HttpResponse::InternalServerError().json(error_json("Failed to like post"));
        }
    };

    let toggle_result = if liked {
        state.posts.remove_like(user.user_id, post_id).await
    } else {
        state.posts.add_like(user.user_id, post_id).await
    };
    if let Err(e) = toggle_result {
        error!("failed to toggle like on {}: {}", post_id, e);
        return HttpResponse::InternalServerError().json(error_json("Failed to like post"));
    }

    let count = match state.posts.count_likes(post_id).await {
        Ok(c) => c,
        Err(e) => {
            error!("failed to count likes for {}: {}", post_id, e);
            return HttpResponse::InternalServerError().json(error_json("Failed to like post"));
        }
    };
    if let Err(e) = state.posts.set_like_count(post_id, count).await {
        error!("failed to store like count for {}: {}", post_id, e);
        return HttpResponse::InternalServerError().json(error_json("Failed to like post"));
    }

    HttpResponse::Ok().json(ToggleLikeOut {
        liked: !liked,
        likes: count,
    })
}

/// GET /api/liked-posts: posts the caller has liked, flattened like the
/// feed. A like whose post has been deleted since is dropped.
#[get("")]
pub async fn get_liked_posts(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> HttpResponse {
    match state.posts.liked_posts(user.user_id).await {
        Ok(rows) => {
            let out: Vec<PostOut> = rows
                .into_iter()
                .filter_map(|row| row.posts)
                .map(flatten_post)
                .collect();
            HttpResponse::Ok().json(out)
        }
        Err(e) => {
            error!("failed to fetch liked posts for {}: {}", user.user_id, e);
            HttpResponse::InternalServerError().json(error_json("Failed to fetch liked posts"))
        }
    }
}
