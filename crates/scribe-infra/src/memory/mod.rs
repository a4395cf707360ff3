//! In-memory store - used when no database is configured, and by tests.
//!
//! All tables live behind one async `RwLock`, so every repository call is a
//! single atomic unit: a like insert and the recount of its post happen under
//! the same write guard. Uniqueness, foreign keys and cascades mirror the
//! PostgreSQL schema created by the migration crate.
//!
//! Note: Data is lost on process restart.

mod comments;
mod likes;
mod posts;
mod taxonomy;
mod users;

#[cfg(test)]
mod tests;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use scribe_core::domain::{Category, Comment, Like, Post, Tag, User};
use scribe_core::error::RepoError;
use scribe_core::services::Repositories;

pub use comments::InMemoryCommentRepository;
pub use likes::InMemoryLikeRepository;
pub use posts::InMemoryPostRepository;
pub use taxonomy::{InMemoryCategoryRepository, InMemoryTagRepository};
pub use users::InMemoryUserRepository;

#[derive(Default)]
pub(crate) struct Tables {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    tags: HashMap<Uuid, Tag>,
    posts: HashMap<Uuid, Post>,
    /// (post_id, tag_id)
    post_tags: HashSet<(Uuid, Uuid)>,
    comments: HashMap<Uuid, Comment>,
    likes: HashMap<Uuid, Like>,
}

type SharedTables = Arc<RwLock<Tables>>;

/// Handle to one in-memory database. Clones share the same tables.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: SharedTables,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository::new(self.tables.clone())
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryPostRepository::new(self.tables.clone())
    }

    pub fn categories(&self) -> InMemoryCategoryRepository {
        InMemoryCategoryRepository::new(self.tables.clone())
    }

    pub fn tags(&self) -> InMemoryTagRepository {
        InMemoryTagRepository::new(self.tables.clone())
    }

    pub fn comments(&self) -> InMemoryCommentRepository {
        InMemoryCommentRepository::new(self.tables.clone())
    }

    pub fn likes(&self) -> InMemoryLikeRepository {
        InMemoryLikeRepository::new(self.tables.clone())
    }

    /// Every repository port, backed by this store.
    pub fn repositories(&self) -> Repositories {
        Repositories {
            users: Arc::new(self.users()),
            posts: Arc::new(self.posts()),
            categories: Arc::new(self.categories()),
            tags: Arc::new(self.tags()),
            comments: Arc::new(self.comments()),
            likes: Arc::new(self.likes()),
        }
    }
}

impl Tables {
    fn tag_slugs_of(&self, post_id: Uuid) -> Vec<String> {
        self.post_tags
            .iter()
            .filter(|(p, _)| *p == post_id)
            .filter_map(|(_, t)| self.tags.get(t))
            .map(|t| t.slug.clone())
            .collect()
    }

    /// Recompute a post's `likes_count` from its like rows.
    fn recount_likes(&mut self, post_id: Uuid) -> u64 {
        let count = self.likes.values().filter(|l| l.post_id == post_id).count() as u64;
        if let Some(post) = self.posts.get_mut(&post_id) {
            post.likes_count = count;
        }
        count
    }

    fn count_published(&self, predicate: impl Fn(&Post) -> bool) -> u64 {
        self.posts
            .values()
            .filter(|p| p.is_published() && predicate(p))
            .count() as u64
    }

    /// Remove a post with its comments, likes and tag links.
    fn remove_post(&mut self, post_id: Uuid) -> bool {
        if self.posts.remove(&post_id).is_none() {
            return false;
        }
        self.comments.retain(|_, c| c.post_id != post_id);
        self.likes.retain(|_, l| l.post_id != post_id);
        self.post_tags.retain(|(p, _)| *p != post_id);
        true
    }

    /// Remove a comment and, transitively, its replies.
    fn remove_comment_tree(&mut self, comment_id: Uuid) -> bool {
        if self.comments.remove(&comment_id).is_none() {
            return false;
        }
        let replies: Vec<Uuid> = self
            .comments
            .values()
            .filter(|c| c.parent_id == Some(comment_id))
            .map(|c| c.id)
            .collect();
        for reply in replies {
            self.remove_comment_tree(reply);
        }
        true
    }

    /// Remove a user and everything they own, then heal the like counters of
    /// posts that lost one of their likes.
    fn remove_user(&mut self, user_id: Uuid) -> bool {
        if self.users.remove(&user_id).is_none() {
            return false;
        }

        let liked_posts: HashSet<Uuid> = self
            .likes
            .values()
            .filter(|l| l.user_id == user_id)
            .map(|l| l.post_id)
            .collect();
        self.likes.retain(|_, l| l.user_id != user_id);

        let own_posts: Vec<Uuid> = self
            .posts
            .values()
            .filter(|p| p.author_id == user_id)
            .map(|p| p.id)
            .collect();
        for post_id in own_posts {
            self.remove_post(post_id);
        }

        let own_comments: Vec<Uuid> = self
            .comments
            .values()
            .filter(|c| c.author_id == user_id)
            .map(|c| c.id)
            .collect();
        for comment_id in own_comments {
            self.remove_comment_tree(comment_id);
        }

        for post_id in liked_posts {
            self.recount_likes(post_id);
        }
        true
    }
}

fn duplicate(what: &str) -> RepoError {
    RepoError::Constraint(format!("{what} already exists"))
}

fn missing_reference(what: &str) -> RepoError {
    RepoError::Constraint(format!("Referenced {what} does not exist"))
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}
