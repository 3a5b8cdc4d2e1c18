use std::env;

use anyhow::{Context, Result};

/// Process configuration, collected once at startup from the environment
/// and handed to every service through `web::Data` instead of being read
/// ad hoc from `env::var` at call sites.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base Supabase project URL, without a trailing slash.
    pub supabase_url: String,
    /// Server-only key; bypasses row level security on the REST layer.
    pub service_role_key: String,
    /// Public key sent as `apikey` on identity calls.
    pub anon_key: String,
    /// Storage bucket holding uploaded images.
    pub storage_bucket: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let raw_url = env::var("SUPABASE_URL").context("SUPABASE_URL not set")?;
        let supabase_url = raw_url.trim().trim_end_matches('/').to_string();

        let service_role_key = env::var("SUPABASE_SERVICE_ROLE_KEY")
            .context("SUPABASE_SERVICE_ROLE_KEY not set")?
            .trim()
            .to_string();

        // Falls back to the service role key when no separate anon key is
        // configured, matching a single-key deployment.
        let anon_key = env::var("SUPABASE_ANON_KEY")
            .map(|k| k.trim().to_string())
            .unwrap_or_else(|_| service_role_key.clone());

        let storage_bucket =
            env::var("SUPABASE_BUCKET").unwrap_or_else(|_| "uploads".to_string());

        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .context("PORT must be a number")?;

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            supabase_url,
            service_role_key,
            anon_key,
            storage_bucket,
            port,
            allowed_origins,
        })
    }

    /// PostgREST endpoint for table access.
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.supabase_url)
    }

    /// GoTrue endpoint for signup, login, refresh and token validation.
    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.supabase_url)
    }

    /// Object storage endpoint.
    pub fn storage_url(&self) -> String {
        format!("{}/storage/v1", self.supabase_url)
    }
}
