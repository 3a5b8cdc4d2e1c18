use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::models::post::Post;
use crate::repositories::supabase::{RepoError, SupabaseDb};

/// Post row with the author's profile embedded by a PostgREST join
/// (`select=*,users(username)`).
#[derive(Debug, Deserialize)]
pub struct PostWithAuthor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub visibility: Option<bool>,
    #[serde(default)]
    pub likes: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub users: Option<AuthorEmbed>,
}

#[derive(Debug, Deserialize)]
pub struct AuthorEmbed {
    pub username: Option<String>,
}

/// Row shape of the liked-posts join: one `likes` row with its post (and the
/// post's author) embedded.
#[derive(Debug, Deserialize)]
pub struct LikedPostRow {
    pub post_id: Uuid,
    pub posts: Option<PostWithAuthor>,
}

#[derive(Debug, Deserialize)]
struct LikeKey {
    #[allow(dead_code)]
    post_id: Uuid,
}

/// Repository for the `posts` and `likes` tables via PostgREST.
#[derive(Clone)]
pub struct PostRepository {
    db: SupabaseDb,
}

impl PostRepository {
    pub fn new(db: SupabaseDb) -> Self {
        Self { db }
    }

    pub async fn list_with_authors(&self) -> Result<Vec<PostWithAuthor>, RepoError> {
        let url = format!(
            "{}?select=*,users(username)&order=created_at.desc",
            self.db.table_url("posts")
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

    pub async fn create(
        &self,
        user_id: Uuid,
        description: &str,
        image_url: &str,
    ) -> Result<Post, RepoError> {
        let payload = json!({
            "user_id": user_id,
            "description": description,
            "image_url": image_url,
            "created_at": Utc::now(),
            "updated_at": Utc::now(),
        });
        let resp = self
            .db
            .client()
            .post(self.db.table_url("posts"))
            .headers(self.db.headers())
            .header("Prefer", "return=representation")
            .json(&payload)
            .send()
            .await?;
        self.db.single(resp).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Post, RepoError> {
        let url = format!("{}?id=eq.{}&select=*", self.db.table_url("posts"), id);
        let resp = self
            .db
            .client()
            .get(&url)
            .headers(self.db.headers())
            .send()
            .await?;
        self.db.single(resp).await
    }

    pub async fn update(&self, id: Uuid, patch: Value) -> Result<Post, RepoError> {
        let url = format!("{}?id=eq.{}", self.db.table_url("posts"), id);
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

    /// Deletes and returns the row; `NotFound` when the id matched nothing.
    pub async fn delete(&self, id: Uuid) -> Result<Post, RepoError> {
        let url = format!("{}?id=eq.{}", self.db.table_url("posts"), id);
        let resp = self
            .db
            .client()
            .delete(&url)
            .headers(self.db.headers())
            .header("Prefer", "return=representation")
            .send()
            .await?;
        self.db.single(resp).await
    }

    pub async fn has_like(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, RepoError> {
        let url = format!(
            "{}?user_id=eq.{}&post_id=eq.{}&select=post_id",
            self.db.table_url("likes"),
            user_id,
            post_id
        );
        let resp = self
            .db
            .client()
            .get(&url)
            .headers(self.db.headers())
            .send()
            .await?;
        let rows: Vec<LikeKey> = self.db.rows(resp).await?;
        Ok(!rows.is_empty())
    }

    pub async fn add_like(&self, user_id: Uuid, post_id: Uuid) -> Result<(), RepoError> {
        let payload = json!({ "user_id": user_id, "post_id": post_id });
        let resp = self
            .db
            .client()
            .post(self.db.table_url("likes"))
            .headers(self.db.headers())
            .header("Prefer", "return=minimal")
            .json(&payload)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await?;
            return Err(RepoError::Supabase(format!(
                "{} -> {}",
                status.as_u16(),
                text
            )));
        }
        Ok(())
    }

    pub async fn remove_like(&self, user_id: Uuid, post_id: Uuid) -> Result<(), RepoError> {
        let url = format!(
            "{}?user_id=eq.{}&post_id=eq.{}",
            self.db.table_url("likes"),
            user_id,
            post_id
        );
        let resp = self
            .db
            .client()
            .delete(&url)
            .headers(self.db.headers())
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await?;
            return Err(RepoError::Supabase(format!(
                "{} -> {}",
                status.as_u16(),
                text
            )));
        }
        Ok(())
    }

    /// Counts the `likes` rows for a post. The toggle handler writes this
    /// count back into the post's denormalized counter, so the counter is
    /// always derived from the detail rows rather than incremented blindly.
    pub async fn count_likes(&self, post_id: Uuid) -> Result<i64, RepoError> {
        let url = format!(
            "{}?post_id=eq.{}&select=post_id",
            self.db.table_url("likes"),
            post_id
        );
        let resp = self
            .db
            .client()
            .get(&url)
            .headers(self.db.headers())
            .send()
            .await?;
        let rows: Vec<LikeKey> = self.db.rows(resp).await?;
        Ok(rows.len() as i64)
    }

    pub async fn set_like_count(&self, post_id: Uuid, count: i64) -> Result<Post, RepoError> {
        self.update(post_id, json!({ "likes": count })).await
    }

    pub async fn liked_posts(&self, user_id: Uuid) -> Result<Vec<LikedPostRow>, RepoError> {
        let url = format!(
            "{}?user_id=eq.{}&select=post_id,posts(*,users(username))",
            self.db.table_url("likes"),
            user_id
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
}
