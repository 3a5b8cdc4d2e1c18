use base64::Engine as _;
use base64::engine::general_purpose;
use mime::Mime;
use reqwest::Client;
use thiserror::Error;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::dtos::upload_dtos::ImageUpload;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("invalid image payload: {0}")]
    InvalidPayload(String),
}

const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Client for the object storage service. Files go into a single bucket and
/// are served back through its public URL.
#[derive(Clone)]
pub struct StorageService {
    client: Client,
    storage_url: String,
    service_role_key: String,
    bucket: String,
}

impl StorageService {
    pub fn new(client: Client, config: &AppConfig) -> Self {
        Self {
            client,
            storage_url: config.storage_url(),
            service_role_key: config.service_role_key.clone(),
            bucket: config.storage_bucket.clone(),
        }
    }

    /// Validates, decodes and uploads a JSON-carried image, returning its
    /// public URL. The object name is prefixed with the owner's id and a
    /// fresh uuid so concurrent uploads never collide.
    pub async fn upload_image(
        &self,
        owner: Uuid,
        upload: &ImageUpload,
    ) -> Result<String, StorageError> {
        let content_type = validate_image_type(&upload.content_type)?;
        let bytes = decode_image_data(&upload.image_data)?;

        let object_name = format!(
            "{}-{}-{}",
            owner,
            Uuid::new_v4(),
            sanitize_file_name(&upload.file_name)
        );

        let url = format!("{}/object/{}/{}", self.storage_url, self.bucket, object_name);
        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.service_role_key)
            .header(
                "Authorization",
                format!("Bearer {}", self.service_role_key),
            )
            .header("Content-Type", content_type.to_string())
            .body(bytes)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(StorageError::Storage(format!(
                "{} -> {}",
                status.as_u16(),
                text
            )));
        }

        Ok(self.public_url(&object_name))
    }

    pub fn public_url(&self, object_name: &str) -> String {
        format!(
            "{}/object/public/{}/{}",
            self.storage_url, self.bucket, object_name
        )
    }
}

fn validate_image_type(content_type: &str) -> Result<Mime, StorageError> {
    let mime: Mime = content_type
        .parse()
        .map_err(|_| StorageError::InvalidPayload(format!("bad content type: {}", content_type)))?;
    if !ALLOWED_IMAGE_TYPES.contains(&mime.essence_str()) {
        return Err(StorageError::InvalidPayload(
            "Only JPEG, PNG, GIF and WEBP images are allowed.".to_string(),
        ));
    }
    Ok(mime)
}

/// Accepts bare base64 or a `data:image/...;base64,` data URL.
fn decode_image_data(data: &str) -> Result<Vec<u8>, StorageError> {
    let raw = match data.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    general_purpose::STANDARD
        .decode(raw.trim())
        .map_err(|e| StorageError::InvalidPayload(format!("invalid base64 image data: {}", e)))
}

/// Keeps object names flat and URL-safe; anything suspicious becomes '-'.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_image_types() {
        for t in ["image/jpeg", "image/png", "image/gif", "image/webp"] {
            assert!(validate_image_type(t).is_ok(), "{} should be allowed", t);
        }
    }

    #[test]
    fn rejects_non_image_types() {
        assert!(validate_image_type("application/pdf").is_err());
        assert!(validate_image_type("text/html").is_err());
        assert!(validate_image_type("not a mime").is_err());
    }

    #[test]
    fn decodes_bare_base64() {
        let encoded = general_purpose::STANDARD.encode(b"hello");
        assert_eq!(decode_image_data(&encoded).unwrap(), b"hello");
    }

    #[test]
    fn strips_data_url_prefix() {
        let encoded = general_purpose::STANDARD.encode(b"hello");
        let data_url = format!("data:image/png;base64,{}", encoded);
        assert_eq!(decode_image_data(&data_url).unwrap(), b"hello");
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(decode_image_data("%%%not-base64%%%").is_err());
    }

    #[test]
    fn sanitizes_path_separators_in_file_names() {
        assert_eq!(sanitize_file_name("../etc/passwd"), "..-etc-passwd");
        assert_eq!(sanitize_file_name("photo 1.png"), "photo-1.png");
        assert_eq!(sanitize_file_name(""), "upload");
    }
}
