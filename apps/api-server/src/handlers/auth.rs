//! Authentication handlers.

use actix_web::{HttpResponse, web};
use std::sync::Arc;

use scribe_core::domain::User;
use scribe_core::ports::TokenService;
use scribe_core::services::{RegisterUser, UserProfile};
use scribe_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest};

use super::views;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn issue_token(
    tokens: &dyn TokenService,
    user: User,
    post_count: u64,
) -> AppResult<AuthResponse> {
    let access_token = tokens.generate_token(user.id, &user.username, vec!["user".to_string()])?;

    Ok(AuthResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: u64::try_from(tokens.expiration_seconds()).unwrap_or_default(),
        user: views::user(UserProfile { user, post_count }),
    })
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    tokens: web::Data<Arc<dyn TokenService>>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let user = state
        .blog
        .register_user(RegisterUser {
            email: req.email,
            username: req.username,
            password: req.password,
            password_confirm: req.password_confirm,
            first_name: req.first_name,
            last_name: req.last_name,
            bio: req.bio,
            location: req.location,
            birth_date: req.birth_date,
        })
        .await?;

    Ok(HttpResponse::Created().json(issue_token(tokens.get_ref().as_ref(), user, 0)?))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    tokens: web::Data<Arc<dyn TokenService>>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let user = state.blog.authenticate(&req.email, &req.password).await?;
    let profile = state.blog.get_user(user.id).await?;

    Ok(HttpResponse::Ok().json(issue_token(
        tokens.get_ref().as_ref(),
        user,
        profile.post_count,
    )?))
}

/// GET /api/auth/me
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let profile = state.blog.current_user(&identity.actor()).await?;
    Ok(HttpResponse::Ok().json(views::user(profile)))
}
