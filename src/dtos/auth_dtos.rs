use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dtos::upload_dtos::ImageUpload;

#[derive(Debug, Deserialize)]
pub struct SignupIn {
    pub email: String,
    pub password: String,
    pub username: String,
    /// Optional profile picture, uploaded to storage before the users row
    /// is inserted.
    pub profile_pic: Option<ImageUpload>,
}

#[derive(Debug, Deserialize)]
pub struct LoginIn {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshIn {
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AuthUserOut {
    pub id: Uuid,
    pub email: Option<String>,
    pub username: Option<String>,
    pub profile_pic_url: Option<String>,
}

/// Login response: the user's public profile plus the tokens, which are also
/// set as `authToken` / `refreshToken` cookies.
#[derive(Debug, Serialize)]
pub struct LoginOut {
    pub user: AuthUserOut,
    pub token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,
}
