//! Post handlers.

use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use scribe_core::DomainError;
use scribe_core::domain::PostStatus;
use scribe_core::query::{CountRange, DateRange, PostFilter, PostSort};
use scribe_core::services::{NewPost, PostChanges};
use scribe_shared::dto::{CreatePostRequest, UpdatePostRequest};

use super::{PageQuery, parse_page, parse_param, views};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Query string of `GET /posts`.
///
/// Everything arrives as text so that malformed values surface as validation
/// errors naming the parameter.
#[derive(Debug, Default, Deserialize)]
pub struct PostListQuery {
    pub search: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub tags: Option<String>,
    pub status: Option<String>,
    pub is_featured: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub published_from: Option<String>,
    pub published_to: Option<String>,
    pub views_count: Option<String>,
    #[serde(rename = "views_count__gte")]
    pub views_count_gte: Option<String>,
    #[serde(rename = "views_count__lte")]
    pub views_count_lte: Option<String>,
    pub likes_count: Option<String>,
    #[serde(rename = "likes_count__gte")]
    pub likes_count_gte: Option<String>,
    #[serde(rename = "likes_count__lte")]
    pub likes_count_lte: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<String>,
}

fn parse_date(name: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, DomainError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Some).map_err(|_| {
            DomainError::validation(format!("Invalid date '{s}' for '{name}' (expected YYYY-MM-DD)"))
        }),
    }
}

fn parse_bool(name: &str, raw: Option<&str>) -> Result<Option<bool>, DomainError> {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") => Ok(None),
        Some("true" | "1") => Ok(Some(true)),
        Some("false" | "0") => Ok(Some(false)),
        Some(other) => Err(DomainError::validation(format!(
            "Invalid value '{other}' for '{name}'"
        ))),
    }
}

impl PostListQuery {
    pub fn into_parts(self) -> Result<(PostFilter, PostSort, u64), DomainError> {
        let filter = PostFilter {
            author_id: None,
            category_id: parse_param::<Uuid>("category", self.category.as_deref())?,
            tags: self
                .tags
                .as_deref()
                .map(|t| {
                    t.split(',')
                        .map(str::trim)
                        .filter(|slug| !slug.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            status: parse_param::<PostStatus>("status", self.status.as_deref())?,
            is_featured: parse_bool("is_featured", self.is_featured.as_deref())?,
            created: DateRange::from_dates(
                parse_date("date_from", self.date_from.as_deref())?,
                parse_date("date_to", self.date_to.as_deref())?,
            ),
            published: DateRange::from_dates(
                parse_date("published_from", self.published_from.as_deref())?,
                parse_date("published_to", self.published_to.as_deref())?,
            ),
            views: CountRange {
                exact: parse_param("views_count", self.views_count.as_deref())?,
                min: parse_param("views_count__gte", self.views_count_gte.as_deref())?,
                max: parse_param("views_count__lte", self.views_count_lte.as_deref())?,
            },
            likes: CountRange {
                exact: parse_param("likes_count", self.likes_count.as_deref())?,
                min: parse_param("likes_count__gte", self.likes_count_gte.as_deref())?,
                max: parse_param("likes_count__lte", self.likes_count_lte.as_deref())?,
            },
            search: self.search,
            title: self.title,
            content: self.content,
            author: self.author,
        };

        let sort = match self.ordering.as_deref().map(str::trim) {
            None | Some("") => PostSort::default(),
            Some(ordering) => ordering.parse()?,
        };

        Ok((filter, sort, parse_page(self.page.as_deref())?))
    }
}

/// GET /api/v1/posts
pub async fn list(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    query: web::Query<PostListQuery>,
) -> AppResult<HttpResponse> {
    let (filter, sort, page) = query.into_inner().into_parts()?;
    let posts = state
        .blog
        .list_posts(&identity.actor(), filter, sort, page)
        .await?;
    Ok(HttpResponse::Ok().json(views::paginated(posts, views::post_summary)))
}

/// POST /api/v1/posts
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let status = parse_param::<PostStatus>("status", req.status.as_deref())?.unwrap_or_default();

    let detail = state
        .blog
        .create_post(
            &identity.actor(),
            NewPost {
                title: req.title,
                slug: req.slug,
                content: req.content,
                excerpt: req.excerpt,
                category_id: req.category_id,
                tag_ids: req.tag_ids,
                status,
                featured_image: req.featured_image,
                is_featured: req.is_featured,
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(views::post_detail(detail)))
}

/// GET /api/v1/posts/{id}
///
/// Counts a view when the post is published.
pub async fn retrieve(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let detail = state
        .blog
        .retrieve_post(&identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(views::post_detail(detail)))
}

/// PUT/PATCH /api/v1/posts/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let changes = PostChanges {
        status: parse_param::<PostStatus>("status", req.status.as_deref())?,
        title: req.title,
        slug: req.slug,
        content: req.content,
        excerpt: req.excerpt,
        category_id: req.category_id,
        tag_ids: req.tag_ids,
        featured_image: req.featured_image,
        is_featured: req.is_featured,
    };

    let detail = state
        .blog
        .update_post(&identity.actor(), path.into_inner(), changes)
        .await?;
    Ok(HttpResponse::Ok().json(views::post_detail(detail)))
}

/// DELETE /api/v1/posts/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .blog
        .delete_post(&identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/v1/posts/{id}/like
///
/// 201 when the like was created, 200 when it was withdrawn.
pub async fn toggle_like(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let toggle = state.blog.toggle_like(&identity.actor(), post_id).await?;
    let body = views::like(post_id, toggle);

    Ok(if body.liked {
        HttpResponse::Created().json(body)
    } else {
        HttpResponse::Ok().json(body)
    })
}

/// GET /api/v1/posts/featured
pub async fn featured(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let posts = state
        .blog
        .featured_posts(&identity.actor(), query.number()?)
        .await?;
    Ok(HttpResponse::Ok().json(views::paginated(posts, views::post_summary)))
}

/// GET /api/v1/posts/popular
pub async fn popular(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let posts = state.blog.popular_posts(&identity.actor()).await?;
    let body: Vec<_> = posts.into_iter().map(views::post_summary).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/v1/posts/trending
pub async fn trending(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let posts = state.blog.trending_posts(&identity.actor()).await?;
    let body: Vec<_> = posts.into_iter().map(views::post_summary).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/v1/posts/my_posts
pub async fn mine(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let posts = state
        .blog
        .my_posts(&identity.actor(), query.number()?)
        .await?;
    Ok(HttpResponse::Ok().json(views::paginated(posts, views::post_summary)))
}
