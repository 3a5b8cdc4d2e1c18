use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dtos::upload_dtos::ImageUpload;

#[derive(Debug, Deserialize)]
pub struct CreatePostIn {
    pub description: String,
    pub image: ImageUpload,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostIn {
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub visibility: Option<bool>,
}

/// Feed entry: the post row with the author's username pulled up from the
/// embedded `users` join.
#[derive(Debug, Serialize)]
pub struct PostOut {
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub visibility: Option<bool>,
    pub likes: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct ToggleLikeOut {
    pub liked: bool,
    pub likes: i64,
}
