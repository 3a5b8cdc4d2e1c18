use actix_web::http::header;
use actix_web::{Error, FromRequest, HttpRequest, HttpResponse, dev::Payload, error, web};
use futures::future::LocalBoxFuture;
use log::warn;
use serde_json::json;
use uuid::Uuid;

use crate::services::auth_service::AuthService;

/// Authenticated caller, resolved by validating the bearer credential
/// against the identity provider. Extracting this in a handler makes the
/// route require authentication; use `Option<AuthenticatedUser>` for routes
/// that also serve anonymous callers.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<AuthenticatedUser, Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let auth = req.app_data::<web::Data<AuthService>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let auth = auth.ok_or_else(|| {
                error::ErrorInternalServerError("auth service not configured")
            })?;
            let token = token.ok_or_else(|| unauthorized("Unauthorized"))?;

            match auth.get_user(&token).await {
                Ok(user_id) => Ok(AuthenticatedUser { user_id }),
                Err(e) => {
                    warn!("token validation failed: {}", e);
                    Err(unauthorized("Invalid authentication"))
                }
            }
        })
    }
}

/// Credential lookup order: `Authorization: Bearer` header first, then the
/// `authToken` cookie set at login.
fn bearer_token(req: &HttpRequest) -> Option<String> {
    if let Some(value) = req.headers().get(header::AUTHORIZATION) {
        if let Ok(s) = value.to_str() {
            if let Some(token) = s.strip_prefix("Bearer ") {
                let token = token.trim();
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }
    req.cookie("authToken").map(|c| c.value().to_string())
}

fn unauthorized(msg: &str) -> Error {
    error::InternalError::from_response(
        msg.to_string(),
        HttpResponse::Unauthorized().json(json!({ "error": msg })),
    )
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn reads_bearer_token_from_header() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc123"))
            .to_http_request();
        assert_eq!(bearer_token(&req), Some("abc123".to_string()));
    }

    #[test]
    fn falls_back_to_auth_token_cookie() {
        let req = TestRequest::default()
            .cookie(actix_web::cookie::Cookie::new("authToken", "cookie-token"))
            .to_http_request();
        assert_eq!(bearer_token(&req), Some("cookie-token".to_string()));
    }

    #[test]
    fn header_wins_over_cookie() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer from-header"))
            .cookie(actix_web::cookie::Cookie::new("authToken", "from-cookie"))
            .to_http_request();
        assert_eq!(bearer_token(&req), Some("from-header".to_string()));
    }

    #[test]
    fn none_without_credential() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(bearer_token(&req), None);
    }

    #[test]
    fn none_for_malformed_header_without_cookie() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic abc"))
            .to_http_request();
        assert_eq!(bearer_token(&req), None);
    }
}
