//! HTTP handlers and route configuration.

mod auth;
mod comments;
mod health;
mod posts;
mod stats;
mod taxonomy;
mod users;
mod views;

#[cfg(test)]
mod tests;

use actix_web::{HttpMessage, HttpRequest, HttpResponse, error::InternalError, web};
use serde::Deserialize;

use scribe_core::DomainError;
use scribe_shared::ErrorResponse;

use crate::observability::RequestId;

/// `?page=` on every paginated listing; 1-based, defaults to the first page.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn number(&self) -> Result<u64, DomainError> {
        parse_page(self.page.as_deref())
    }
}

pub(crate) fn parse_page(raw: Option<&str>) -> Result<u64, DomainError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(1),
        Some(s) => s
            .parse::<u64>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| DomainError::validation(format!("Invalid page '{s}'"))),
    }
}

/// Parse a query-string value, naming the parameter on failure.
pub(crate) fn parse_param<T: std::str::FromStr>(
    name: &str,
    raw: Option<&str>,
) -> Result<Option<T>, DomainError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| DomainError::validation(format!("Invalid value '{s}' for '{name}'"))),
    }
}

/// Problem body for a request that failed to deserialize, pointing at the
/// offending path and carrying the request id when one was assigned.
fn rejection(err: impl std::fmt::Display, req: &HttpRequest) -> ErrorResponse {
    let body = ErrorResponse::bad_request(err.to_string()).with_instance(req.path());
    match req.extensions().get::<RequestId>() {
        Some(id) => body.with_request_id(id.as_str()),
        None => body,
    }
}

/// Malformed JSON bodies become RFC 7807 400s instead of plain-text errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, req| {
        let body = rejection(&err, req);
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, req| {
        let body = rejection(&err, req);
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}

/// Configure all application routes.
///
/// Fixed segments (`featured`, `me`, ...) are registered before `{id}` so they
/// are never captured as ids.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            .service(
                web::scope("/v1")
                    .service(
                        web::scope("/users")
                            .route("", web::get().to(users::list))
                            .route("/me", web::get().to(users::me))
                            .route("/me", web::patch().to(users::update_me))
                            .route("/{id}", web::get().to(users::get))
                            .route("/{id}", web::put().to(users::update))
                            .route("/{id}", web::patch().to(users::update))
                            .route("/{id}", web::delete().to(users::delete))
                            .route("/{id}/posts", web::get().to(users::posts)),
                    )
                    .service(
                        web::scope("/posts")
                            .route("", web::get().to(posts::list))
                            .route("", web::post().to(posts::create))
                            .route("/featured", web::get().to(posts::featured))
                            .route("/popular", web::get().to(posts::popular))
                            .route("/trending", web::get().to(posts::trending))
                            .route("/my_posts", web::get().to(posts::mine))
                            .route("/{id}", web::get().to(posts::retrieve))
                            .route("/{id}", web::put().to(posts::update))
                            .route("/{id}", web::patch().to(posts::update))
                            .route("/{id}", web::delete().to(posts::delete))
                            .route("/{id}/like", web::post().to(posts::toggle_like)),
                    )
                    .service(
                        web::scope("/categories")
                            .route("", web::get().to(taxonomy::list_categories))
                            .route("", web::post().to(taxonomy::create_category))
                            .route("/{id}", web::get().to(taxonomy::get_category))
                            .route("/{id}", web::put().to(taxonomy::update_category))
                            .route("/{id}", web::patch().to(taxonomy::update_category))
                            .route("/{id}", web::delete().to(taxonomy::delete_category))
                            .route("/{id}/posts", web::get().to(taxonomy::category_posts)),
                    )
                    .service(
                        web::scope("/tags")
                            .route("", web::get().to(taxonomy::list_tags))
                            .route("", web::post().to(taxonomy::create_tag))
                            .route("/{id}", web::get().to(taxonomy::get_tag))
                            .route("/{id}", web::put().to(taxonomy::update_tag))
                            .route("/{id}", web::patch().to(taxonomy::update_tag))
                            .route("/{id}", web::delete().to(taxonomy::delete_tag))
                            .route("/{id}/posts", web::get().to(taxonomy::tag_posts)),
                    )
                    .service(
                        web::scope("/comments")
                            .route("", web::get().to(comments::list))
                            .route("", web::post().to(comments::create))
                            .route("/{id}", web::get().to(comments::get))
                            .route("/{id}", web::put().to(comments::update))
                            .route("/{id}", web::patch().to(comments::update))
                            .route("/{id}", web::delete().to(comments::delete))
                            .route("/{id}/replies", web::get().to(comments::replies))
                            .route("/{id}/moderate", web::post().to(comments::moderate)),
                    )
                    .service(
                        web::scope("/analytics")
                            .route("", web::get().to(stats::overview))
                            .route("/post_stats", web::get().to(stats::post_stats))
                            .route("/user_stats", web::get().to(stats::user_stats)),
                    ),
            ),
    );
}
