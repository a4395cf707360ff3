//! Comment handlers.

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

use scribe_core::services::{CommentChanges, NewComment};
use scribe_shared::dto::{CreateCommentRequest, ModerateCommentRequest, UpdateCommentRequest};

use super::{parse_page, parse_param, views};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CommentListQuery {
    pub post: Option<String>,
    pub is_approved: Option<String>,
    pub page: Option<String>,
}

/// GET /api/v1/comments?post=&is_approved=&page=
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<CommentListQuery>,
) -> AppResult<HttpResponse> {
    let post_id = parse_param::<Uuid>("post", query.post.as_deref())?;
    let is_approved = parse_param::<bool>("is_approved", query.is_approved.as_deref())?;
    let page = parse_page(query.page.as_deref())?;

    let comments = state.blog.list_comments(post_id, is_approved, page).await?;
    Ok(HttpResponse::Ok().json(views::paginated(comments, views::comment)))
}

/// POST /api/v1/comments
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let comment = state
        .blog
        .create_comment(
            &identity.actor(),
            NewComment {
                post_id: req.post_id,
                content: req.content,
                parent_id: req.parent_id,
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(views::comment(comment)))
}

/// GET /api/v1/comments/{id}
pub async fn get(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let comment = state.blog.get_comment(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(views::comment(comment)))
}

/// PUT/PATCH /api/v1/comments/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCommentRequest>,
) -> AppResult<HttpResponse> {
    let comment = state
        .blog
        .update_comment(
            &identity.actor(),
            path.into_inner(),
            CommentChanges {
                content: body.into_inner().content,
            },
        )
        .await?;
    Ok(HttpResponse::Ok().json(views::comment(comment)))
}

/// DELETE /api/v1/comments/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .blog
        .delete_comment(&identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/v1/comments/{id}/replies
pub async fn replies(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let replies = state.blog.comment_replies(path.into_inner()).await?;
    let body: Vec<_> = replies.into_iter().map(views::comment).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// POST /api/v1/comments/{id}/moderate
pub async fn moderate(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<ModerateCommentRequest>,
) -> AppResult<HttpResponse> {
    let comment = state
        .blog
        .moderate_comment(&identity.actor(), path.into_inner(), body.is_approved)
        .await?;
    Ok(HttpResponse::Ok().json(views::comment(comment)))
}
