use async_trait::async_trait;
use uuid::Uuid;

use scribe_core::domain::Comment;
use scribe_core::error::RepoError;
use scribe_core::ports::{BaseRepository, CommentRepository};
use scribe_core::query::{Page, PageRequest};

use super::{SharedTables, Tables, duplicate, missing_reference};

/// In-memory comment repository.
pub struct InMemoryCommentRepository {
    tables: SharedTables,
}

impl InMemoryCommentRepository {
    pub(super) fn new(tables: SharedTables) -> Self {
        Self { tables }
    }
}

fn check_references(tables: &Tables, comment: &Comment) -> Result<(), RepoError> {
    if !tables.posts.contains_key(&comment.post_id) {
        return Err(missing_reference("post"));
    }
    if !tables.users.contains_key(&comment.author_id) {
        return Err(missing_reference("author"));
    }
    if comment
        .parent_id
        .is_some_and(|id| !tables.comments.contains_key(&id))
    {
        return Err(missing_reference("parent comment"));
    }
    Ok(())
}

fn newest_first(a: &Comment, b: &Comment) -> std::cmp::Ordering {
    b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryCommentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn insert(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.comments.contains_key(&comment.id) {
            return Err(duplicate("Comment"));
        }
        check_references(&tables, &comment)?;
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn update(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.comments.contains_key(&comment.id) {
            return Err(RepoError::NotFound);
        }
        check_references(&tables, &comment)?;
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        if self.tables.write().await.remove_comment_tree(id) {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn list(
        &self,
        post_id: Option<Uuid>,
        is_approved: Option<bool>,
        page: PageRequest,
    ) -> Result<Page<Comment>, RepoError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| post_id.is_none_or(|id| c.post_id == id))
            .filter(|c| is_approved.is_none_or(|a| c.is_approved == a))
            .cloned()
            .collect();
        comments.sort_by(newest_first);
        Ok(Page::from_sorted(comments, page))
    }

    async fn for_post(&self, post_id: Uuid, approved_only: bool) -> Result<Vec<Comment>, RepoError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id && (!approved_only || c.is_approved))
            .cloned()
            .collect();
        comments.sort_by(newest_first);
        Ok(comments)
    }

    async fn replies(&self, parent_id: Uuid, approved_only: bool) -> Result<Vec<Comment>, RepoError> {
        let tables = self.tables.read().await;
        let mut replies: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.parent_id == Some(parent_id) && (!approved_only || c.is_approved))
            .cloned()
            .collect();
        replies.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(replies)
    }

    async fn count_for_post(&self, post_id: Uuid, approved_only: bool) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id && (!approved_only || c.is_approved))
            .count() as u64)
    }

    async fn count_replies(&self, parent_id: Uuid) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .values()
            .filter(|c| c.parent_id == Some(parent_id))
            .count() as u64)
    }

    async fn count_approved(&self) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.comments.values().filter(|c| c.is_approved).count() as u64)
    }
}
