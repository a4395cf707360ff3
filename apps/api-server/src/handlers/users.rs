//! User handlers.

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

use scribe_core::domain::PostStatus;
use scribe_core::services::UserChanges;
use scribe_shared::dto::UpdateUserRequest;

use super::{parse_page, parse_param, views};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub search: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserPostsQuery {
    pub status: Option<String>,
    pub page: Option<String>,
}

fn changes(req: UpdateUserRequest) -> UserChanges {
    UserChanges {
        username: req.username,
        first_name: req.first_name,
        last_name: req.last_name,
        bio: req.bio,
        location: req.location,
        birth_date: req.birth_date,
        avatar: req.avatar,
    }
}

/// GET /api/v1/users?search=&page=
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<UserListQuery>,
) -> AppResult<HttpResponse> {
    let page = parse_page(query.page.as_deref())?;
    let users = state.blog.list_users(query.search.as_deref(), page).await?;
    Ok(HttpResponse::Ok().json(views::paginated(users, views::user)))
}

/// GET /api/v1/users/me
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let profile = state.blog.current_user(&identity.actor()).await?;
    Ok(HttpResponse::Ok().json(views::user(profile)))
}

/// PATCH /api/v1/users/me
pub async fn update_me(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<UpdateUserRequest>,
) -> AppResult<HttpResponse> {
    let profile = state
        .blog
        .update_user(&identity.actor(), identity.user_id, changes(body.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(views::user(profile)))
}

/// GET /api/v1/users/{id}
pub async fn get(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let profile = state.blog.get_user(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(views::user(profile)))
}

/// PUT/PATCH /api/v1/users/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdateUserRequest>,
) -> AppResult<HttpResponse> {
    let profile = state
        .blog
        .update_user(&identity.actor(), path.into_inner(), changes(body.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(views::user(profile)))
}

/// DELETE /api/v1/users/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .blog
        .delete_user(&identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/v1/users/{id}/posts?status=&page=
pub async fn posts(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<Uuid>,
    query: web::Query<UserPostsQuery>,
) -> AppResult<HttpResponse> {
    let status = parse_param::<PostStatus>("status", query.status.as_deref())?;
    let page = parse_page(query.page.as_deref())?;
    let posts = state
        .blog
        .user_posts(&identity.actor(), path.into_inner(), status, page)
        .await?;
    Ok(HttpResponse::Ok().json(views::paginated(posts, views::post_summary)))
}
