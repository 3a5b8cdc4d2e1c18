use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("supabase error: {0}")]
    Supabase(String),
    #[error("not found")]
    NotFound,
}

impl RepoError {
    /// PostgREST surfaces constraint violations inside the error body;
    /// 23505 is the Postgres unique-violation code.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, RepoError::Supabase(msg) if msg.contains("23505"))
    }
}

/// Shared PostgREST access: one `reqwest::Client`, the REST base URL and the
/// header set every table call needs. Repositories hold a clone of this.
#[derive(Clone)]
pub struct SupabaseDb {
    client: Client,
    rest_url: String,
    service_role_key: String,
    anon_key: String,
}

impl SupabaseDb {
    pub fn new(client: Client, config: &AppConfig) -> Self {
        Self {
            client,
            rest_url: config.rest_url(),
            service_role_key: config.service_role_key.clone(),
            anon_key: config.anon_key.clone(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url, table)
    }

    /// Service-role headers: the server talks to PostgREST with full access
    /// and enforces authorization itself at the handler layer.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("apikey", HeaderValue::from_str(&self.anon_key).unwrap());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.service_role_key)).unwrap(),
        );
        headers
    }

    /// Decodes a PostgREST response into rows, turning any non-2xx status
    /// into `RepoError::Supabase` carrying the status and body.
    pub async fn rows<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<Vec<T>, RepoError> {
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(RepoError::Supabase(format!(
                "{} -> {}",
                status.as_u16(),
                text
            )));
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Like `rows`, but expects exactly one row and maps an empty result to
    /// `RepoError::NotFound`.
    pub async fn single<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, RepoError> {
        let rows: Vec<T> = self.rows(resp).await?;
        rows.into_iter().next().ok_or(RepoError::NotFound)
    }
}
