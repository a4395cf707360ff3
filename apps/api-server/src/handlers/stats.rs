//! Site statistics. Open to every caller.

use actix_web::{HttpResponse, web};

use super::views;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/v1/analytics
pub async fn overview(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let stats = state.blog.get_stats().await?;
    Ok(HttpResponse::Ok().json(views::stats(stats)))
}

/// GET /api/v1/analytics/post_stats
pub async fn post_stats(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let stats = state.blog.get_stats().await?;
    Ok(HttpResponse::Ok().json(views::post_stats(&stats)))
}

/// GET /api/v1/analytics/user_stats
pub async fn user_stats(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let stats = state.blog.get_stats().await?;
    Ok(HttpResponse::Ok().json(views::user_stats(&stats)))
}
