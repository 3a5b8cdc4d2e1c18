use chrono::Utc;
use serde_json::{Value, json};
use urlencoding::encode;
use uuid::Uuid;

use crate::models::user::{User, UserPublic};
use crate::repositories::supabase::{RepoError, SupabaseDb};

/// Repository for the `users` table via PostgREST.
#[derive(Clone)]
pub struct UserRepository {
    db: SupabaseDb,
}

impl UserRepository {
    pub fn new(db: SupabaseDb) -> Self {
        Self { db }
    }

    /// Mirrors a freshly signed-up identity into the `users` table, reusing
    /// the id issued by the identity provider.
    pub async fn insert(
        &self,
        id: Uuid,
        username: &str,
        profile_pic_url: Option<&str>,
    ) -> Result<User, RepoError> {
        let payload = json!({
            "id": id,
            "username": username,
            "profile_pic_url": profile_pic_url,
            "created_at": Utc::now(),
            "updated_at": Utc::now(),
        });

        let resp = self
            .db
            .client()
            .post(self.db.table_url("users"))
            .headers(self.db.headers())
            .header("Prefer", "return=representation")
            .json(&payload)
            .send()
            .await?;

        self.db.single(resp).await
    }

    pub async fn get_public(&self, id: Uuid) -> Result<UserPublic, RepoError> {
        let url = format!(
            "{}?id=eq.{}&select=id,username,profile_pic_url",
            self.db.table_url("users"),
            id
        );
        let resp = self
            .db
            .client()
            .get(&url)
            .headers(self.db.headers())
            .send()
            .await?;
        self.db.single(resp).await
    }

    /// Case-insensitive username search. PostgREST uses `*` as the wildcard
    /// in `ilike` patterns; the pattern is percent-encoded as a whole.
    pub async fn search(&self, query: &str) -> Result<Vec<UserPublic>, RepoError> {
        let pattern = format!("*{}*", query);
        let url = format!(
            "{}?username=ilike.{}&select=id,username,profile_pic_url",
            self.db.table_url("users"),
            encode(&pattern)
        );
        let resp = self
            .db
            .client()
            .get(&url)
            .headers(self.db.headers())
            .send()
            .await?;
        self.db.rows(resp).await
    }

    /// Applies a partial update and returns the updated row. `NotFound` when
    /// the filter matched nothing.
    pub async fn update(&self, id: Uuid, patch: Value) -> Result<User, RepoError> {
        let url = format!("{}?id=eq.{}", self.db.table_url("users"), id);
        let resp = self
            .db
            .client()
            .patch(&url)
            .headers(self.db.headers())
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        self.db.single(resp).await
    }
}
