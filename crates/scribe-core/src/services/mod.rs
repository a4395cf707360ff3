//! Core operations of the blog.
//!
//! [`BlogService`] is the single entry point the API surface calls. Each
//! operation authorizes the actor first, validates input second, and only then
//! touches storage; derived counters are recomputed by the same call that
//! performed the triggering mutation.

mod comments;
mod likes;
mod posts;
mod stats;
mod taxonomy;
mod users;

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::User;
use crate::error::DomainError;
use crate::ports::{
    CategoryRepository, CommentRepository, LikeRepository, PasswordService, PostRepository,
    TagRepository, UserRepository,
};
use crate::query::DEFAULT_PAGE_SIZE;

pub use comments::{CommentChanges, CommentView, NewComment};
pub use likes::LikeToggle;
pub use posts::{NewPost, PostChanges, PostDetail, PostSummary};
pub use stats::BlogStats;
pub use taxonomy::{CategoryChanges, CategoryView, NewCategory, NewTag, TagChanges, TagView};
pub use users::{RegisterUser, UserChanges, UserProfile};

/// Storage ports the service works against.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub likes: Arc<dyn LikeRepository>,
}

/// Tunables for the service.
#[derive(Debug, Clone)]
pub struct BlogSettings {
    /// Fixed page size for listings.
    pub page_size: u64,
    /// Length of the popular / trending shortlists.
    pub shortlist_len: u64,
    pub min_password_len: usize,
}

impl Default for BlogSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            shortlist_len: 10,
            min_password_len: 8,
        }
    }
}

/// The blog application service.
pub struct BlogService {
    repos: Repositories,
    passwords: Arc<dyn PasswordService>,
    settings: BlogSettings,
}

impl BlogService {
    pub fn new(repos: Repositories, passwords: Arc<dyn PasswordService>, settings: BlogSettings) -> Self {
        Self {
            repos,
            passwords,
            settings,
        }
    }

    pub fn settings(&self) -> &BlogSettings {
        &self.settings
    }

    async fn load_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.repos
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }
}

/// Reject blank values.
fn require_present(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} must not be blank")));
    }
    Ok(())
}

/// Reject values longer than `max` characters.
fn require_max_len(field: &str, value: &str, max: usize) -> Result<(), DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Use the supplied slug or derive one from `source`.
fn resolve_slug(field: &str, supplied: Option<String>, source: &str, max: usize) -> Result<String, DomainError> {
    let slug = match supplied {
        Some(s) => s.trim().to_string(),
        None => crate::domain::slugify(source),
    };
    if !crate::domain::is_valid_slug(&slug) {
        return Err(DomainError::validation(format!(
            "{field} may only contain letters, digits, '-' and '_'"
        )));
    }
    require_max_len(field, &slug, max)?;
    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_is_derived_when_missing() {
        assert_eq!(
            resolve_slug("slug", None, "Hello World", 200).unwrap(),
            "hello-world"
        );
        assert_eq!(
            resolve_slug("slug", Some(" custom-1 ".into()), "ignored", 200).unwrap(),
            "custom-1"
        );
    }

    #[test]
    fn unusable_slugs_are_rejected() {
        assert!(resolve_slug("slug", None, "!!!", 200).is_err());
        assert!(resolve_slug("slug", Some("two words".into()), "x", 200).is_err());
        assert!(resolve_slug("slug", Some("abcdef".into()), "x", 3).is_err());
    }

    #[test]
    fn length_checks_count_characters() {
        assert!(require_max_len("bio", "ééé", 3).is_ok());
        assert!(require_max_len("bio", "éééé", 3).is_err());
        assert!(require_present("title", "   ").is_err());
    }
}
