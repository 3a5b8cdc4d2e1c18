pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;

use actix_web::web;
use reqwest::Client;

use crate::config::AppConfig;
use crate::repositories::conversation_repository::ConversationRepository;
use crate::repositories::follow_repository::FollowRepository;
use crate::repositories::post_repository::PostRepository;
use crate::repositories::supabase::SupabaseDb;
use crate::repositories::user_repository::UserRepository;
use crate::services::storage_service::StorageService;

/// Shared application state: one repository per table group plus the
/// storage client, all built over a single `reqwest::Client`. Constructed
/// once at startup and injected through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub users: UserRepository,
    pub posts: PostRepository,
    pub follows: FollowRepository,
    pub conversations: ConversationRepository,
    pub storage: StorageService,
}

impl AppState {
    pub fn new(client: Client, config: &AppConfig) -> Self {
        let db = SupabaseDb::new(client.clone(), config);
        Self {
            users: UserRepository::new(db.clone()),
            posts: PostRepository::new(db.clone()),
            follows: FollowRepository::new(db.clone()),
            conversations: ConversationRepository::new(db),
            storage: StorageService::new(client, config),
        }
    }
}

/// Registers every route scope. Shared between `main` and the integration
/// tests so both serve the identical routing table.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    use crate::handlers::{
        auth_handlers, follow_handlers, message_handlers, post_handlers, user_handlers,
    };

    cfg.service(
        web::scope("/api/auth")
            .service(auth_handlers::signup)
            .service(auth_handlers::login)
            .service(auth_handlers::get_current_user)
            .service(auth_handlers::refresh_token),
    )
    .service(
        web::scope("/api/users")
            .service(user_handlers::search_users)
            .service(user_handlers::get_user_profile)
            .service(user_handlers::update_user),
    )
    .service(
        web::scope("/api/liked-posts").service(post_handlers::get_liked_posts),
    )
    .service(
        web::scope("/api/posts")
            .service(post_handlers::list_posts)
            .service(post_handlers::create_post)
            .service(post_handlers::toggle_like)
            .service(post_handlers::get_post)
            .service(post_handlers::update_post)
            .service(post_handlers::delete_post),
    )
    .service(
        web::scope("/api/follow")
            .service(follow_handlers::follow_user)
            .service(follow_handlers::check_following)
            .service(follow_handlers::get_followers)
            .service(follow_handlers::get_following)
            .service(follow_handlers::unfollow_user),
    )
    .service(
        web::scope("/api/messages")
            .service(message_handlers::get_conversations)
            .service(message_handlers::create_or_fetch_conversation)
            .service(message_handlers::get_messages)
            .service(message_handlers::send_message),
    );
}
