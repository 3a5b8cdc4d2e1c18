use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::models::message::{Conversation, Message};
use crate::repositories::supabase::{RepoError, SupabaseDb};

#[derive(Debug, Deserialize)]
struct MemberConversationId {
    conversation_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct MemberUserId {
    user_id: Uuid,
}

/// Repository for the `conversations`, `conversation_members` and `messages`
/// tables via PostgREST. Every direct conversation is expected to carry
/// exactly two membership rows; callers handle the anomaly where it does not.
#[derive(Clone)]
pub struct ConversationRepository {
    db: SupabaseDb,
}

impl ConversationRepository {
    pub fn new(db: SupabaseDb) -> Self {
        Self { db }
    }

    /// Ids of every conversation the user belongs to.
    pub async fn conversation_ids_for(&self, user_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
        let url = format!(
            "{}?user_id=eq.{}&select=conversation_id",
            self.db.table_url("conversation_members"),
            user_id
        );
        let resp = self
            .db
            .client()
            .get(&url)
            .headers(self.db.headers())
            .send()
            .await?;
        let rows: Vec<MemberConversationId> = self.db.rows(resp).await?;
        Ok(rows.into_iter().map(|r| r.conversation_id).collect())
    }

    /// Single conversation row; `NotFound` when the id does not exist.
    pub async fn conversation(&self, id: Uuid) -> Result<Conversation, RepoError> {
        let url = format!(
            "{}?id=eq.{}&select=*",
            self.db.table_url("conversations"),
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

    pub async fn conversations_by_ids(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<Conversation>, RepoError> {
        let list = ids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!(
            "{}?id=in.({})&select=*",
            self.db.table_url("conversations"),
            list
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

    /// User ids of a conversation's members.
    pub async fn member_ids_of(&self, conversation_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
        let url = format!(
            "{}?conversation_id=eq.{}&select=user_id",
            self.db.table_url("conversation_members"),
            conversation_id
        );
        let resp = self
            .db
            .client()
            .get(&url)
            .headers(self.db.headers())
            .send()
            .await?;
        let rows: Vec<MemberUserId> = self.db.rows(resp).await?;
        Ok(rows.into_iter().map(|r| r.user_id).collect())
    }

    pub async fn create(&self, created_by: Uuid) -> Result<Conversation, RepoError> {
        let payload = json!({ "created_by": created_by });
        let resp = self
            .db
            .client()
            .post(self.db.table_url("conversations"))
            .headers(self.db.headers())
            .header("Prefer", "return=representation")
            .json(&payload)
            .send()
            .await?;
        self.db.single(resp).await
    }

    /// Inserts both membership rows in one PostgREST call. This and `create`
    /// are still two separate network writes with no transaction around
    /// them; a failure here leaves a memberless conversation behind.
    pub async fn add_members(
        &self,
        conversation_id: Uuid,
        user_ids: [Uuid; 2],
    ) -> Result<(), RepoError> {
        let payload = json!([
            { "conversation_id": conversation_id, "user_id": user_ids[0] },
            { "conversation_id": conversation_id, "user_id": user_ids[1] },
        ]);
        let resp = self
            .db
            .client()
            .post(self.db.table_url("conversation_members"))
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

    /// Most recent message of a conversation, or `None` when it has none.
    pub async fn last_message(&self, conversation_id: Uuid) -> Result<Option<Message>, RepoError> {
        let url = format!(
            "{}?conversation_id=eq.{}&select=*&order=created_at.desc&limit=1",
            self.db.table_url("messages"),
            conversation_id
        );
        let resp = self
            .db
            .client()
            .get(&url)
            .headers(self.db.headers())
            .send()
            .await?;
        let rows: Vec<Message> = self.db.rows(resp).await?;
        Ok(rows.into_iter().next())
    }

    /// All messages of a conversation, ascending by creation time.
    pub async fn messages_of(&self, conversation_id: Uuid) -> Result<Vec<Message>, RepoError> {
        let url = format!(
            "{}?conversation_id=eq.{}&select=*&order=created_at.asc",
            self.db.table_url("messages"),
            conversation_id
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

    pub async fn insert_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> Result<Message, RepoError> {
        let payload = json!({
            "conversation_id": conversation_id,
            "sender_id": sender_id,
            "receiver_id": receiver_id,
            "content": content,
            "created_at": Utc::now(),
        });
        let resp = self
            .db
            .client()
            .post(self.db.table_url("messages"))
            .headers(self.db.headers())
            .header("Prefer", "return=representation")
            .json(&payload)
            .send()
            .await?;
        self.db.single(resp).await
    }
}

/// First conversation id shared by both membership lists. The dataset is
/// expected to hold at most one shared direct conversation for a user pair;
/// nothing below the application enforces that, so concurrent creates can
/// still race (known gap).
pub fn shared_conversation(mine: &[Uuid], theirs: &[Uuid]) -> Option<Uuid> {
    mine.iter().find(|id| theirs.contains(id)).copied()
}

/// The member of a direct conversation that is not `me`, or `None` for the
/// single-member anomaly.
pub fn other_member(members: &[Uuid], me: Uuid) -> Option<Uuid> {
    members.iter().find(|&&id| id != me).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn shared_conversation_picks_first_common_id() {
        let common = Uuid::new_v4();
        let mut mine = ids(2);
        mine.push(common);
        let mut theirs = ids(3);
        theirs.insert(1, common);
        assert_eq!(shared_conversation(&mine, &theirs), Some(common));
    }

    #[test]
    fn shared_conversation_is_commutative() {
        let common = Uuid::new_v4();
        let mine = vec![Uuid::new_v4(), common];
        let theirs = vec![common, Uuid::new_v4()];
        assert_eq!(
            shared_conversation(&mine, &theirs),
            shared_conversation(&theirs, &mine)
        );
    }

    #[test]
    fn shared_conversation_none_when_disjoint() {
        assert_eq!(shared_conversation(&ids(3), &ids(3)), None);
    }

    #[test]
    fn shared_conversation_none_when_either_is_empty() {
        let some = ids(2);
        assert_eq!(shared_conversation(&[], &some), None);
        assert_eq!(shared_conversation(&some, &[]), None);
    }

    #[test]
    fn other_member_excludes_me() {
        let me = Uuid::new_v4();
        let them = Uuid::new_v4();
        assert_eq!(other_member(&[me, them], me), Some(them));
        assert_eq!(other_member(&[them, me], me), Some(them));
    }

    #[test]
    fn other_member_none_for_single_member_anomaly() {
        let me = Uuid::new_v4();
        assert_eq!(other_member(&[me], me), None);
        assert_eq!(other_member(&[], me), None);
    }
}
