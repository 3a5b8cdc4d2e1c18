use serde::Deserialize;

use crate::dtos::upload_dtos::ImageUpload;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserIn {
    pub username: Option<String>,
    pub profile_pic: Option<ImageUpload>,
}
