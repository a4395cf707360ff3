use async_trait::async_trait;
use uuid::Uuid;

use scribe_core::domain::Like;
use scribe_core::error::RepoError;
use scribe_core::ports::LikeRepository;

use super::{SharedTables, duplicate, missing_reference};

/// In-memory like repository. Insert and recount share one write guard.
pub struct InMemoryLikeRepository {
    tables: SharedTables,
}

impl InMemoryLikeRepository {
    pub(super) fn new(tables: SharedTables) -> Self {
        Self { tables }
    }
}

#[async_trait]
impl LikeRepository for InMemoryLikeRepository {
    async fn find(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<Like>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .likes
            .values()
            .find(|l| l.user_id == user_id && l.post_id == post_id)
            .cloned())
    }

    async fn create(&self, like: Like) -> Result<(Like, u64), RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&like.user_id) {
            return Err(missing_reference("user"));
        }
        if !tables.posts.contains_key(&like.post_id) {
            return Err(missing_reference("post"));
        }
        if tables
            .likes
            .values()
            .any(|l| l.user_id == like.user_id && l.post_id == like.post_id)
        {
            return Err(duplicate("Like for this post"));
        }

        tables.likes.insert(like.id, like.clone());
        let count = tables.recount_likes(like.post_id);
        Ok((like, count))
    }

    async fn remove(&self, user_id: Uuid, post_id: Uuid) -> Result<u64, RepoError> {
        let mut tables = self.tables.write().await;
        tables
            .likes
            .retain(|_, l| !(l.user_id == user_id && l.post_id == post_id));
        Ok(tables.recount_likes(post_id))
    }

    async fn count_all(&self) -> Result<u64, RepoError> {
        Ok(self.tables.read().await.likes.len() as u64)
    }
}
