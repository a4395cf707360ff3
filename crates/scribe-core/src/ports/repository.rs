use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Category, Comment, Like, Post, Tag, User};
use crate::error::RepoError;
use crate::query::{Page, PageRequest, PostQuery, TaxonomyQuery};

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity. Uniqueness violations surface as `Constraint`.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity. A missing row surfaces as `NotFound`.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID, applying the schema's cascade rules.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// Aggregate post counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostStats {
    pub total_posts: u64,
    pub published_posts: u64,
    pub draft_posts: u64,
    pub total_views: u64,
}

/// Aggregate user counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub total_users: u64,
    pub verified_users: u64,
    pub active_users: u64,
}

/// User repository.
///
/// Deleting a user removes their posts, comments and likes, and recomputes
/// `likes_count` on every post that lost a like, in one unit of work.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Newest first; `search` matches username, names or email, case-insensitively.
    async fn list(&self, search: Option<&str>, page: PageRequest) -> Result<Page<User>, RepoError>;

    /// Stamp `last_login` only.
    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), RepoError>;

    async fn count_posts(&self, id: Uuid) -> Result<u64, RepoError>;

    /// `active_users` counts users whose last login is at or after `active_since`.
    async fn stats(&self, active_since: DateTime<Utc>) -> Result<UserStats, RepoError>;
}

/// Category repository. Deleting a category clears it from its posts.
#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, Uuid> {
    /// Searched over name and description.
    async fn list(&self, query: &TaxonomyQuery) -> Result<Page<Category>, RepoError>;

    async fn published_post_count(&self, id: Uuid) -> Result<u64, RepoError>;
}

/// Tag repository. Deleting a tag detaches it from its posts.
#[async_trait]
pub trait TagRepository: BaseRepository<Tag, Uuid> {
    /// Searched over name.
    async fn list(&self, query: &TaxonomyQuery) -> Result<Page<Tag>, RepoError>;

    /// The subset of `ids` that exist.
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Tag>, RepoError>;

    async fn published_post_count(&self, id: Uuid) -> Result<u64, RepoError>;
}

/// Post repository.
///
/// `update` never replaces a `published_at` that is already stored, and never
/// writes the derived counters; those move only through `record_view` and the
/// like repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    /// Visibility-scoped, filtered, ordered page.
    async fn search(&self, query: &PostQuery) -> Result<Page<Post>, RepoError>;

    /// Tags of a post, ordered by name.
    async fn tags_of(&self, post_id: Uuid) -> Result<Vec<Tag>, RepoError>;

    /// Replace the tag set of a post.
    async fn set_tags(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepoError>;

    /// Atomically add one view to a *published* post.
    ///
    /// Returns the new count, or `None` when the post is absent or not
    /// published (in which case nothing is written).
    async fn record_view(&self, post_id: Uuid) -> Result<Option<u64>, RepoError>;

    async fn stats(&self) -> Result<PostStats, RepoError>;
}

/// Comment repository. Deleting a comment deletes its replies.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Newest first.
    async fn list(
        &self,
        post_id: Option<Uuid>,
        is_approved: Option<bool>,
        page: PageRequest,
    ) -> Result<Page<Comment>, RepoError>;

    /// Comments on a post, newest first.
    async fn for_post(&self, post_id: Uuid, approved_only: bool) -> Result<Vec<Comment>, RepoError>;

    /// Direct replies, oldest first.
    async fn replies(&self, parent_id: Uuid, approved_only: bool) -> Result<Vec<Comment>, RepoError>;

    async fn count_for_post(&self, post_id: Uuid, approved_only: bool) -> Result<u64, RepoError>;

    async fn count_replies(&self, parent_id: Uuid) -> Result<u64, RepoError>;

    async fn count_approved(&self) -> Result<u64, RepoError>;
}

/// Like repository.
///
/// Each mutation recomputes the owning post's `likes_count` from the like
/// rows in the same unit of work and returns the recomputed value.
#[async_trait]
pub trait LikeRepository: Send + Sync {
    async fn find(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<Like>, RepoError>;

    /// Insert the like. A second like for the same (user, post) pair fails
    /// with `Constraint` and changes nothing.
    async fn create(&self, like: Like) -> Result<(Like, u64), RepoError>;

    /// Delete the (user, post) like if present; recomputes either way.
    async fn remove(&self, user_id: Uuid, post_id: Uuid) -> Result<u64, RepoError>;

    async fn count_all(&self) -> Result<u64, RepoError>;
}
