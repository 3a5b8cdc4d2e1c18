pub mod auth_dtos;
pub mod message_dtos;
pub mod post_dtos;
pub mod upload_dtos;
pub mod user_dtos;
