use chrono::Utc;
use serde::Serialize;

use super::BlogService;
use super::users::active_window;
use crate::error::DomainError;
use crate::ports::{PostStats, UserStats};

/// Site-wide counters.
#[derive(Debug, Clone, Serialize)]
pub struct BlogStats {
    pub posts: PostStats,
    pub total_likes: u64,
    /// Approved comments only.
    pub total_comments: u64,
    pub users: UserStats,
}

impl BlogService {
    pub async fn get_stats(&self) -> Result<BlogStats, DomainError> {
        let posts = self.repos.posts.stats().await?;
        let total_likes = self.repos.likes.count_all().await?;
        let total_comments = self.repos.comments.count_approved().await?;
        let users = self
            .repos
            .users
            .stats(Utc::now() - active_window())
            .await?;

        Ok(BlogStats {
            posts,
            total_likes,
            total_comments,
            users,
        })
    }
}
