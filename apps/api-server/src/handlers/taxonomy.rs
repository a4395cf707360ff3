//! Category and tag handlers.

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

use scribe_core::DomainError;
use scribe_core::query::TaxonomySort;
use scribe_core::services::{CategoryChanges, NewCategory, NewTag, TagChanges};
use scribe_shared::dto::{CreateCategoryRequest, CreateTagRequest, UpdateCategoryRequest, UpdateTagRequest};

use super::{PageQuery, parse_page, views};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// `?search=&ordering=&page=` on the category and tag listings.
/// `ordering` is `name`, `created_at` or `post_count`, `-` prefixed for
/// descending; the default is by name.
#[derive(Debug, Default, Deserialize)]
pub struct TaxonomyListQuery {
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<String>,
}

impl TaxonomyListQuery {
    fn parse(&self) -> Result<(TaxonomySort, u64), DomainError> {
        let sort = match self.ordering.as_deref().map(str::trim) {
            None | Some("") => TaxonomySort::default(),
            Some(ordering) => ordering.parse()?,
        };
        Ok((sort, parse_page(self.page.as_deref())?))
    }
}

/// GET /api/v1/categories
pub async fn list_categories(
    state: web::Data<AppState>,
    query: web::Query<TaxonomyListQuery>,
) -> AppResult<HttpResponse> {
    let (sort, page) = query.parse()?;
    let categories = state
        .blog
        .list_categories(query.search.as_deref(), sort, page)
        .await?;
    Ok(HttpResponse::Ok().json(views::paginated(categories, views::category)))
}

/// POST /api/v1/categories
pub async fn create_category(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreateCategoryRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let category = state
        .blog
        .create_category(
            &identity.actor(),
            NewCategory {
                name: req.name,
                slug: req.slug,
                description: req.description,
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(views::category(category)))
}

/// GET /api/v1/categories/{id}
pub async fn get_category(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let category = state.blog.get_category(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(views::category(category)))
}

/// PUT/PATCH /api/v1/categories/{id}
pub async fn update_category(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCategoryRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let category = state
        .blog
        .update_category(
            &identity.actor(),
            path.into_inner(),
            CategoryChanges {
                name: req.name,
                slug: req.slug,
                description: req.description,
            },
        )
        .await?;
    Ok(HttpResponse::Ok().json(views::category(category)))
}

/// DELETE /api/v1/categories/{id}
pub async fn delete_category(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .blog
        .delete_category(&identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/v1/categories/{id}/posts
pub async fn category_posts(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<Uuid>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let posts = state
        .blog
        .category_posts(&identity.actor(), path.into_inner(), query.number()?)
        .await?;
    Ok(HttpResponse::Ok().json(views::paginated(posts, views::post_summary)))
}

/// GET /api/v1/tags
pub async fn list_tags(
    state: web::Data<AppState>,
    query: web::Query<TaxonomyListQuery>,
) -> AppResult<HttpResponse> {
    let (sort, page) = query.parse()?;
    let tags = state.blog.list_tags(query.search.as_deref(), sort, page).await?;
    Ok(HttpResponse::Ok().json(views::paginated(tags, views::tag)))
}

/// POST /api/v1/tags
pub async fn create_tag(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreateTagRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let tag = state
        .blog
        .create_tag(
            &identity.actor(),
            NewTag {
                name: req.name,
                slug: req.slug,
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(views::tag(tag)))
}

/// GET /api/v1/tags/{id}
pub async fn get_tag(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let tag = state.blog.get_tag(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(views::tag(tag)))
}

/// PUT/PATCH /api/v1/tags/{id}
pub async fn update_tag(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdateTagRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let tag = state
        .blog
        .update_tag(
            &identity.actor(),
            path.into_inner(),
            TagChanges {
                name: req.name,
                slug: req.slug,
            },
        )
        .await?;
    Ok(HttpResponse::Ok().json(views::tag(tag)))
}

/// DELETE /api/v1/tags/{id}
pub async fn delete_tag(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .blog
        .delete_tag(&identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/v1/tags/{id}/posts
pub async fn tag_posts(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<Uuid>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let posts = state
        .blog
        .tag_posts(&identity.actor(), path.into_inner(), query.number()?)
        .await?;
    Ok(HttpResponse::Ok().json(views::paginated(posts, views::post_summary)))
}
