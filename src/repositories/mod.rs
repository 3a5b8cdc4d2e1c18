pub mod conversation_repository;
pub mod follow_repository;
pub mod post_repository;
pub mod supabase;
pub mod user_repository;
