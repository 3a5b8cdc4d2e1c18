use serde::Deserialize;

/// Image payload carried inside a JSON body: base64 data (with or without a
/// `data:image/...;base64,` prefix), the client-side file name and the
/// declared content type.
#[derive(Debug, Deserialize)]
pub struct ImageUpload {
    pub image_data: String,
    pub file_name: String,
    pub content_type: String,
}
