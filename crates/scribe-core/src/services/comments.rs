use chrono::Utc;
use uuid::Uuid;

use super::{BlogService, require_present};
use crate::authz::Actor;
use crate::domain::{Comment, User};
use crate::error::DomainError;
use crate::query::{Page, PageRequest};

/// Input for a new comment. The author is always the calling actor.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: Uuid,
    pub content: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct CommentChanges {
    pub content: Option<String>,
}

/// A comment with its author and direct reply count.
#[derive(Debug, Clone)]
pub struct CommentView {
    pub comment: Comment,
    pub author: User,
    pub replies_count: u64,
}

impl BlogService {
    pub async fn create_comment(&self, actor: &Actor, input: NewComment) -> Result<CommentView, DomainError> {
        let author_id = actor.require_user()?;
        require_present("Content", &input.content)?;

        let post = self.load_post(input.post_id).await?;
        if let Some(parent_id) = input.parent_id {
            let parent = self.load_comment(parent_id).await?;
            if parent.post_id != post.id {
                return Err(DomainError::validation(
                    "A reply must belong to the same post as its parent",
                ));
            }
        }

        let comment = Comment::new(post.id, author_id, input.parent_id, input.content);
        let comment = self.repos.comments.insert(comment).await?;
        tracing::info!(
            comment_id = %comment.id,
            post_id = %post.id,
            is_reply = comment.is_reply(),
            "Comment created"
        );

        self.comment_view(comment).await
    }

    pub async fn get_comment(&self, id: Uuid) -> Result<CommentView, DomainError> {
        let comment = self.load_comment(id).await?;
        self.comment_view(comment).await
    }

    pub async fn list_comments(
        &self,
        post_id: Option<Uuid>,
        is_approved: Option<bool>,
        page: u64,
    ) -> Result<Page<CommentView>, DomainError> {
        let request = PageRequest::new(page, self.settings.page_size)?;
        let comments = self.repos.comments.list(post_id, is_approved, request).await?;
        let views = self.comment_views(comments.items).await?;
        Ok(Page::new(views, comments.total, request))
    }

    /// Approved direct replies to a comment.
    pub async fn comment_replies(&self, id: Uuid) -> Result<Vec<CommentView>, DomainError> {
        let comment = self.load_comment(id).await?;
        let replies = self.repos.comments.replies(comment.id, true).await?;
        self.comment_views(replies).await
    }

    /// Author-only edit.
    pub async fn update_comment(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: CommentChanges,
    ) -> Result<CommentView, DomainError> {
        actor.require_user()?;
        let mut comment = self.load_comment(id).await?;
        actor.require_owner(comment.author_id)?;

        if let Some(content) = changes.content {
            require_present("Content", &content)?;
            comment.content = content;
        }
        comment.updated_at = Utc::now();

        let comment = self.repos.comments.update(comment).await?;
        self.comment_view(comment).await
    }

    /// Author-only delete; replies are removed with it.
    pub async fn delete_comment(&self, actor: &Actor, id: Uuid) -> Result<(), DomainError> {
        actor.require_user()?;
        let comment = self.load_comment(id).await?;
        actor.require_owner(comment.author_id)?;

        self.repos.comments.delete(comment.id).await?;
        tracing::info!(comment_id = %comment.id, "Comment deleted");
        Ok(())
    }

    /// Approve or withdraw a comment. Only the author of the post it sits on
    /// may moderate it.
    pub async fn moderate_comment(
        &self,
        actor: &Actor,
        id: Uuid,
        approved: bool,
    ) -> Result<CommentView, DomainError> {
        actor.require_user()?;
        let mut comment = self.load_comment(id).await?;
        let post = self.load_post(comment.post_id).await?;
        actor.require_owner(post.author_id)?;

        if comment.is_approved != approved {
            comment.is_approved = approved;
            comment.updated_at = Utc::now();
            comment = self.repos.comments.update(comment).await?;
            tracing::info!(comment_id = %comment.id, approved, "Comment moderated");
        }

        self.comment_view(comment).await
    }

    pub(super) async fn comment_views(&self, comments: Vec<Comment>) -> Result<Vec<CommentView>, DomainError> {
        let mut views = Vec::with_capacity(comments.len());
        for comment in comments {
            views.push(self.comment_view(comment).await?);
        }
        Ok(views)
    }

    async fn comment_view(&self, comment: Comment) -> Result<CommentView, DomainError> {
        let author = self.load_user(comment.author_id).await?;
        let replies_count = self.repos.comments.count_replies(comment.id).await?;
        Ok(CommentView {
            comment,
            author,
            replies_count,
        })
    }

    async fn load_comment(&self, id: Uuid) -> Result<Comment, DomainError> {
        self.repos
            .comments
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Comment", id))
    }
}
