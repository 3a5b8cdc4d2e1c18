use actix_web::{HttpResponse, get, post, web};
use log::{error, info, warn};
use uuid::Uuid;

use crate::AppState;
use crate::dtos::message_dtos::{ConversationIdOut, ConversationSummary, CreateConversationIn, SendMessageIn};
use crate::handlers::error_json;
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::models::message::Conversation;
use crate::repositories::conversation_repository::{
    ConversationRepository, other_member, shared_conversation,
};
use crate::repositories::supabase::RepoError;
use crate::repositories::user_repository::UserRepository;

/// GET /api/messages/conversations
///
/// Every conversation the caller belongs to, annotated with the other
/// member's profile and a preview of the most recent message, newest
/// activity first. A conversation that cannot be fully resolved (missing
/// other member, failed profile or message lookup) is logged and skipped
/// rather than failing the listing; only a failure of the initial
/// membership query aborts the request.
#[get("/conversations")]
pub async fn get_conversations(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> HttpResponse {
    let caller = user.user_id;

    let ids = match state.conversations.conversation_ids_for(caller).await {
        Ok(ids) => ids,
        Err(e) => {
            error!("failed to fetch conversation ids for {}: {}", caller, e);
            return HttpResponse::InternalServerError().json(error_json(&e.to_string()));
        }
    };

    if ids.is_empty() {
        return HttpResponse::Ok().json(Vec::<ConversationSummary>::new());
    }

    let conversations = match state.conversations.conversations_by_ids(&ids).await {
        Ok(convs) => convs,
        Err(e) => {
            error!("failed to fetch conversations for {}: {}", caller, e);
            return HttpResponse::InternalServerError().json(error_json(&e.to_string()));
        }
    };

    let mut summaries = Vec::with_capacity(conversations.len());
    for conversation in &conversations {
        match build_summary(&state.conversations, &state.users, caller, conversation).await {
            Ok(Some(summary)) => summaries.push(summary),
            Ok(None) => {
                warn!(
                    "conversation {} has no member other than {}; skipping",
                    conversation.id, caller
                );
            }
            Err(e) => {
                warn!("skipping conversation {}: {}", conversation.id, e);
            }
        }
    }

    // Newest activity first.
    summaries.sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));

    HttpResponse::Ok().json(summaries)
}

async fn build_summary(
    conversations: &ConversationRepository,
    users: &UserRepository,
    caller: Uuid,
    conversation: &Conversation,
) -> Result<Option<ConversationSummary>, RepoError> {
    let members = conversations.member_ids_of(conversation.id).await?;

    let Some(other_id) = other_member(&members, caller) else {
        return Ok(None);
    };

    let other = users.get_public(other_id).await?;
    let last = conversations.last_message(conversation.id).await?;

    Ok(Some(ConversationSummary {
        conversation_id: conversation.id,
        users: other,
        last_message: last.as_ref().map(|m| m.content.clone()),
        last_message_time: last
            .as_ref()
            .map(|m| m.created_at)
            .unwrap_or(conversation.created_at),
        is_sender: last.map(|m| m.sender_id == caller).unwrap_or(false),
    }))
}

/// POST /api/messages/conversations
///
/// Find-or-create for the direct conversation between the caller and the
/// recipient: intersect the two membership lists and return the shared
/// conversation when one exists (200), otherwise create a conversation plus
/// both membership rows (201). The two creation writes are separate calls
/// with no transaction; a failure between them leaves a memberless
/// conversation behind, and concurrent identical requests can still create
/// duplicates.
#[post("/conversations")]
pub async fn create_or_fetch_conversation(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<CreateConversationIn>,
) -> HttpResponse {
    let sender = user.user_id;
    let Some(recipient) = body.recipient_id else {
        return HttpResponse::BadRequest().json(error_json("recipientId is required"));
    };

    let sender_ids = match state.conversations.conversation_ids_for(sender).await {
        Ok(ids) => ids,
        Err(e) => {
            error!("failed to fetch sender conversations: {}", e);
            return HttpResponse::InternalServerError().json(error_json(&e.to_string()));
        }
    };
    let recipient_ids = match state.conversations.conversation_ids_for(recipient).await {
        Ok(ids) => ids,
        Err(e) => {
            error!("failed to fetch recipient conversations: {}", e);
            return HttpResponse::InternalServerError().json(error_json(&e.to_string()));
        }
    };

    if let Some(existing) = shared_conversation(&sender_ids, &recipient_ids) {
        info!("found existing conversation {} for {} and {}", existing, sender, recipient);
        return HttpResponse::Ok().json(ConversationIdOut {
            conversation_id: existing,
        });
    }

    let conversation = match state.conversations.create(sender).await {
        Ok(c) => c,
        Err(e) => {
            error!("failed to create conversation: {}", e);
            return HttpResponse::InternalServerError().json(error_json(&e.to_string()));
        }
    };

    if let Err(e) = state
        .conversations
        .add_members(conversation.id, [sender, recipient])
        .await
    {
        error!(
            "failed to add members to conversation {}: {}",
            conversation.id, e
        );
        return HttpResponse::InternalServerError().json(error_json(&e.to_string()));
    }

    info!("created conversation {} for {} and {}", conversation.id, sender, recipient);
    HttpResponse::Created().json(ConversationIdOut {
        conversation_id: conversation.id,
    })
}

/// GET /api/messages/{conversation_id}/messages
///
/// All messages of a conversation, ascending by creation time. 404 when the
/// conversation does not exist, 403 when the caller is not one of its
/// members.
#[get("/{conversation_id}/messages")]
pub async fn get_messages(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> HttpResponse {
    let conversation_id = path.into_inner();

    match state.conversations.conversation(conversation_id).await {
        Ok(_) => {}
        Err(RepoError::NotFound) => {
            return HttpResponse::NotFound().json(error_json("Conversation not found."));
        }
        Err(e) => {
            error!("failed to fetch conversation {}: {}", conversation_id, e);
            return HttpResponse::InternalServerError().json(error_json(&e.to_string()));
        }
    }

    let members = match state.conversations.member_ids_of(conversation_id).await {
        Ok(m) => m,
        Err(e) => {
            error!("failed to fetch members of {}: {}", conversation_id, e);
            return HttpResponse::InternalServerError().json(error_json(&e.to_string()));
        }
    };
    if !members.contains(&user.user_id) {
        return HttpResponse::Forbidden()
            .json(error_json("You are not a member of this conversation."));
    }

    match state.conversations.messages_of(conversation_id).await {
        Ok(messages) => HttpResponse::Ok().json(messages),
        Err(e) => {
            error!("failed to fetch messages of {}: {}", conversation_id, e);
            HttpResponse::InternalServerError().json(error_json(&e.to_string()))
        }
    }
}

/// POST /api/messages/{conversation_id}/messages
///
/// Appends one message. The receiver is the member that is not the sender;
/// a conversation where no such member exists rejects the send with 400.
#[post("/{conversation_id}/messages")]
pub async fn send_message(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<SendMessageIn>,
) -> HttpResponse {
    let conversation_id = path.into_inner();
    let sender = user.user_id;

    let content = body.content.trim();
    if content.is_empty() {
        return HttpResponse::BadRequest().json(error_json("Message content is required."));
    }

    let members = match state.conversations.member_ids_of(conversation_id).await {
        Ok(m) => m,
        Err(e) => {
            error!("failed to fetch members of {}: {}", conversation_id, e);
            return HttpResponse::BadRequest()
                .json(error_json("Failed to fetch conversation members."));
        }
    };

    if !members.contains(&sender) {
        return HttpResponse::Forbidden()
            .json(error_json("You are not a member of this conversation."));
    }

    let Some(receiver) = other_member(&members, sender) else {
        return HttpResponse::BadRequest()
            .json(error_json("Receiver not found in the conversation."));
    };

    match state
        .conversations
        .insert_message(conversation_id, sender, receiver, content)
        .await
    {
        Ok(message) => HttpResponse::Created().json(message),
        Err(e) => {
            error!("failed to insert message into {}: {}", conversation_id, e);
            HttpResponse::InternalServerError().json(error_json(&e.to_string()))
        }
    }
}
