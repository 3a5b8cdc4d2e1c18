use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::models::post::Follow;
use crate::models::user::UserPublic;
use crate::repositories::supabase::{RepoError, SupabaseDb};

/// One follower edge with the follower's profile embedded.
#[derive(Debug, Serialize, Deserialize)]
pub struct FollowerRow {
    pub follower_id: Uuid,
    pub users: Option<UserPublic>,
}

/// One following edge with the followed user's profile embedded.
#[derive(Debug, Serialize, Deserialize)]
pub struct FollowingRow {
    pub following_id: Uuid,
    pub users: Option<UserPublic>,
}

#[derive(Debug, Deserialize)]
struct FollowKey {
    #[allow(dead_code)]
    follower_id: Uuid,
}

/// Repository for the `follows` table via PostgREST.
#[derive(Clone)]
pub struct FollowRepository {
    db: SupabaseDb,
}

impl FollowRepository {
    pub fn new(db: SupabaseDb) -> Self {
        Self { db }
    }

    pub async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> Result<Follow, RepoError> {
        let payload = json!({ "follower_id": follower_id, "following_id": following_id });
        let resp = self
            .db
            .client()
            .post(self.db.table_url("follows"))
            .headers(self.db.headers())
            .header("Prefer", "return=representation")
            .json(&payload)
            .send()
            .await?;
        self.db.single(resp).await
    }

    /// Returns whether a relationship row was actually deleted.
    pub async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool, RepoError> {
        let url = format!(
            "{}?follower_id=eq.{}&following_id=eq.{}",
            self.db.table_url("follows"),
            follower_id,
            following_id
        );
        let resp = self
            .db
            .client()
            .delete(&url)
            .headers(self.db.headers())
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let deleted: Vec<Follow> = self.db.rows(resp).await?;
        Ok(!deleted.is_empty())
    }

    pub async fn followers_of(&self, user_id: Uuid) -> Result<Vec<FollowerRow>, RepoError> {
        let url = format!(
            "{}?following_id=eq.{}&select=follower_id,users:follower_id(id,username,profile_pic_url)",
            self.db.table_url("follows"),
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

    pub async fn following_of(&self, user_id: Uuid) -> Result<Vec<FollowingRow>, RepoError> {
        let url = format!(
            "{}?follower_id=eq.{}&select=following_id,users:following_id(id,username,profile_pic_url)",
            self.db.table_url("follows"),
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

    pub async fn is_following(
        &self,
        follower_id: Uuid,
        following_id: Uuid,
    ) -> Result<bool, RepoError> {
        let url = format!(
            "{}?follower_id=eq.{}&following_id=eq.{}&select=follower_id",
            self.db.table_url("follows"),
            follower_id,
            following_id
        );
        let resp = self
            .db
            .client()
            .get(&url)
            .headers(self.db.headers())
            .send()
            .await?;
        let rows: Vec<FollowKey> = self.db.rows(resp).await?;
        Ok(!rows.is_empty())
    }
}
