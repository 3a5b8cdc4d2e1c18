use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("auth provider error: {0}")]
    Provider(String),
    #[error("parse uuid error: {0}")]
    Uuid(#[from] uuid::Error),
}

/// A session issued by the identity provider. Password hashing, token
/// issuance and expiry all live on the provider side; this is just the
/// slice of its response the handlers need.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub user_id: Uuid,
    pub email: Option<String>,
}

/// Client for the identity provider (GoTrue, `/auth/v1`).
#[derive(Clone)]
pub struct AuthService {
    client: Client,
    auth_url: String,
    anon_key: String,
}

#[derive(Deserialize)]
struct TokenResp {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    user: Option<TokenUser>,
}

#[derive(Deserialize)]
struct TokenUser {
    id: String,
    email: Option<String>,
}

impl AuthService {
    pub fn new(client: Client, config: &AppConfig) -> Self {
        Self {
            client,
            auth_url: config.auth_url(),
            anon_key: config.anon_key.clone(),
        }
    }

    /// Creates the identity record; the caller mirrors it into `users`.
    pub async fn signup(&self, email: &str, password: &str) -> Result<Uuid, AuthError> {
        #[derive(Serialize)]
        struct Body<'a> {
            email: &'a str,
            password: &'a str,
        }

        let url = format!("{}/signup", self.auth_url);
        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&Body { email, password })
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AuthError::Provider(provider_message(
                &text,
                "Failed to sign up.",
            )));
        }

        let body: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| AuthError::Provider(format!("invalid json: {}", e)))?;

        // Depending on email-confirmation settings the id is either nested
        // under `user` or at the top level.
        let id = body
            .get("user")
            .and_then(|u| u.get("id"))
            .or_else(|| body.get("id"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| AuthError::Provider("signup returned no user id".to_string()))?;

        Ok(Uuid::parse_str(id)?)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        #[derive(Serialize)]
        struct Body<'a> {
            email: &'a str,
            password: &'a str,
        }

        let url = format!("{}/token?grant_type=password", self.auth_url);
        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&Body { email, password })
            .send()
            .await?;

        self.session_from(resp).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        #[derive(Serialize)]
        struct Body<'a> {
            refresh_token: &'a str,
        }

        let url = format!("{}/token?grant_type=refresh_token", self.auth_url);
        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&Body { refresh_token })
            .send()
            .await?;

        self.session_from(resp).await
    }

    /// Resolves an access token to its user id by asking the provider,
    /// which also checks signature and expiry.
    pub async fn get_user(&self, access_token: &str) -> Result<Uuid, AuthError> {
        let url = format!("{}/user", self.auth_url);
        let resp = self
            .client
            .get(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AuthError::Provider(provider_message(
                &text,
                "Invalid authentication",
            )));
        }

        let body: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| AuthError::Provider(format!("invalid json: {}", e)))?;
        let id = body
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AuthError::Provider("user response has no id".to_string()))?;

        Ok(Uuid::parse_str(id)?)
    }

    async fn session_from(&self, resp: reqwest::Response) -> Result<Session, AuthError> {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AuthError::Provider(provider_message(
                &text,
                "Invalid login credentials",
            )));
        }

        let tr: TokenResp = serde_json::from_str(&text)
            .map_err(|e| AuthError::Provider(format!("invalid json in token response: {}", e)))?;
        let user = tr
            .user
            .ok_or_else(|| AuthError::Provider("no user info in token response".to_string()))?;

        Ok(Session {
            access_token: tr.access_token,
            refresh_token: tr.refresh_token,
            expires_in: tr.expires_in,
            user_id: Uuid::parse_str(&user.id)?,
            email: user.email,
        })
    }
}

/// Pulls the human-readable message out of a GoTrue error body, falling back
/// to a fixed message when the body is not the expected shape.
fn provider_message(text: &str, fallback: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| {
            v.get("msg")
                .or_else(|| v.get("message"))
                .or_else(|| v.get("error_description"))
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| fallback.to_string())
}
