use uuid::Uuid;

use super::BlogService;
use crate::authz::Actor;
use crate::domain::Like;
use crate::error::DomainError;

/// Outcome of a like toggle, with the recomputed `likes_count`.
#[derive(Debug, Clone)]
pub enum LikeToggle {
    Liked { like: Like, likes_count: u64 },
    Unliked { likes_count: u64 },
}

impl LikeToggle {
    pub fn likes_count(&self) -> u64 {
        match self {
            LikeToggle::Liked { likes_count, .. } | LikeToggle::Unliked { likes_count } => *likes_count,
        }
    }
}

impl BlogService {
    /// Switch the caller between liking and not liking a post.
    ///
    /// When two toggles race from the not-liked state, the uniqueness of
    /// (user, post) lets exactly one insert through; the other surfaces as
    /// `Conflict` without writing anything.
    pub async fn toggle_like(&self, actor: &Actor, post_id: Uuid) -> Result<LikeToggle, DomainError> {
        let user_id = actor.require_user()?;
        let post = self.load_post(post_id).await?;

        match self.repos.likes.find(user_id, post.id).await? {
            None => {
                let (like, likes_count) = self.repos.likes.create(Like::new(user_id, post.id)).await?;
                tracing::debug!(post_id = %post.id, user_id = %user_id, likes_count, "Post liked");
                Ok(LikeToggle::Liked { like, likes_count })
            }
            Some(_) => {
                let likes_count = self.repos.likes.remove(user_id, post.id).await?;
                tracing::debug!(post_id = %post.id, user_id = %user_id, likes_count, "Post unliked");
                Ok(LikeToggle::Unliked { likes_count })
            }
        }
    }
}
