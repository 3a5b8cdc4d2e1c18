use actix_web::cookie::time::Duration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use log::{error, warn};
use regex::Regex;

use crate::AppState;
use crate::dtos::auth_dtos::{AuthUserOut, LoginIn, LoginOut, RefreshIn, SignupIn};
use crate::handlers::error_json;
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::repositories::supabase::RepoError;
use crate::services::auth_service::{AuthService, Session};

fn looks_like_email(email: &str) -> bool {
    let re = Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").unwrap();
    re.is_match(email)
}

/// Access token cookie for a day, refresh token for thirty; the refresh
/// cookie is http-only since only this server ever reads it back.
fn session_cookies(session: &Session) -> (Cookie<'static>, Option<Cookie<'static>>) {
    let auth_cookie = Cookie::build("authToken", session.access_token.clone())
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(Duration::days(1))
        .finish();

    let refresh_cookie = session.refresh_token.as_ref().map(|token| {
        Cookie::build("refreshToken", token.clone())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(Duration::days(30))
            .finish()
    });

    (auth_cookie, refresh_cookie)
}

/// POST /api/auth/signup
///
/// Creates the identity record with the provider, uploads the optional
/// profile picture, then mirrors the user into the `users` table under the
/// provider-issued id.
#[post("/signup")]
pub async fn signup(
    state: web::Data<AppState>,
    auth: web::Data<AuthService>,
    body: web::Json<SignupIn>,
) -> HttpResponse {
    let email = body.email.trim().to_lowercase();
    if !looks_like_email(&email) {
        return HttpResponse::BadRequest().json(error_json("Invalid email format"));
    }
    if body.password.len() < 6 {
        return HttpResponse::BadRequest()
            .json(error_json("Password must be at least 6 characters long"));
    }
    let username = body.username.trim();
    if username.is_empty() {
        return HttpResponse::BadRequest().json(error_json("Username is required"));
    }

    let user_id = match auth.signup(&email, &body.password).await {
        Ok(id) => id,
        Err(e) => {
            warn!("signup rejected for {}: {}", email, e);
            return HttpResponse::BadRequest().json(error_json(&e.to_string()));
        }
    };

    let mut profile_pic_url = None;
    if let Some(upload) = &body.profile_pic {
        match state.storage.upload_image(user_id, upload).await {
            Ok(url) => profile_pic_url = Some(url),
            Err(e) => {
                error!("profile picture upload failed for {}: {}", user_id, e);
                return HttpResponse::BadRequest().json(error_json(&e.to_string()));
            }
        }
    }

    match state
        .users
        .insert(user_id, username, profile_pic_url.as_deref())
        .await
    {
        Ok(user) => HttpResponse::Created().json(serde_json::json!({
            "user": {
                "id": user.id,
                "email": email,
                "username": user.username,
                "profile_pic_url": user.profile_pic_url,
            }
        })),
        Err(e) => {
            error!("failed to insert users row for {}: {}", user_id, e);
            if e.is_unique_violation() {
                return HttpResponse::BadRequest().json(error_json("Username already taken"));
            }
            HttpResponse::BadRequest().json(error_json(&e.to_string()))
        }
    }
}

/// POST /api/auth/login
///
/// Delegates the credential check to the identity provider, then loads the
/// caller's profile row. Tokens are returned in the body and set as
/// cookies.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    auth: web::Data<AuthService>,
    body: web::Json<LoginIn>,
) -> HttpResponse {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return HttpResponse::BadRequest().json(error_json("Email and password are required"));
    }

    let session = match auth.login(body.email.trim(), &body.password).await {
        Ok(s) => s,
        Err(e) => {
            warn!("login failed for {}: {}", body.email, e);
            return HttpResponse::BadRequest().json(error_json("Invalid login credentials"));
        }
    };

    let profile = match state.users.get_public(session.user_id).await {
        Ok(p) => p,
        Err(RepoError::NotFound) => {
            return HttpResponse::BadRequest().json(error_json("User not found in the database."));
        }
        Err(e) => {
            error!("failed to fetch profile for {}: {}", session.user_id, e);
            return HttpResponse::BadRequest().json(error_json("Error fetching user data."));
        }
    };

    let (auth_cookie, refresh_cookie) = session_cookies(&session);
    let mut response = HttpResponse::Ok();
    response.cookie(auth_cookie);
    if let Some(cookie) = refresh_cookie {
        response.cookie(cookie);
    }

    response.json(LoginOut {
        user: AuthUserOut {
            id: session.user_id,
            email: session.email.clone(),
            username: profile.username,
            profile_pic_url: profile.profile_pic_url,
        },
        token: session.access_token,
        refresh_token: session.refresh_token,
    })
}

/// GET /api/auth/user, the authenticated caller's own profile.
#[get("/user")]
pub async fn get_current_user(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> HttpResponse {
    match state.users.get_public(user.user_id).await {
        Ok(profile) => HttpResponse::Ok().json(profile),
        Err(RepoError::NotFound) => {
            HttpResponse::NotFound().json(error_json("User not found"))
        }
        Err(e) => {
            error!("failed to fetch profile for {}: {}", user.user_id, e);
            HttpResponse::InternalServerError().json(error_json(&e.to_string()))
        }
    }
}

/// POST /api/auth/refresh
///
/// Exchanges the refresh token (cookie, or body for clients without cookie
/// support) for a fresh session and re-sets both cookies.
#[post("/refresh")]
pub async fn refresh_token(
    req: HttpRequest,
    auth: web::Data<AuthService>,
    body: Option<web::Json<RefreshIn>>,
) -> HttpResponse {
    let token = req
        .cookie("refreshToken")
        .map(|c| c.value().to_string())
        .or_else(|| body.map(|b| b.into_inner().refresh_token));

    let Some(token) = token else {
        return HttpResponse::Unauthorized().json(error_json("No refresh token provided"));
    };

    let session = match auth.refresh(&token).await {
        Ok(s) => s,
        Err(e) => {
            warn!("token refresh failed: {}", e);
            return HttpResponse::Unauthorized()
                .json(error_json("Invalid or expired refresh token"));
        }
    };

    let (auth_cookie, refresh_cookie) = session_cookies(&session);
    let mut response = HttpResponse::Ok();
    response.cookie(auth_cookie);
    if let Some(cookie) = refresh_cookie {
        response.cookie(cookie);
    }

    response.json(serde_json::json!({
        "message": "Token refreshed successfully",
        "user": { "id": session.user_id },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(looks_like_email("ada@example.com"));
        assert!(looks_like_email("first.last+tag@sub.example.co"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!looks_like_email("not-an-email"));
        assert!(!looks_like_email("missing@tld"));
        assert!(!looks_like_email("@example.com"));
    }
}
