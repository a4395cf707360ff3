//! Visibility and authorization rules.
//!
//! Every core operation evaluates these checks explicitly at its entry; nothing
//! is inherited from the transport layer.

use uuid::Uuid;

use crate::domain::Post;
use crate::error::DomainError;

/// The identity making a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    User(Uuid),
}

impl Actor {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Actor::Anonymous => None,
            Actor::User(id) => Some(*id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Actor::User(_))
    }

    /// The caller's id, or `Unauthorized` for anonymous callers.
    pub fn require_user(&self) -> Result<Uuid, DomainError> {
        self.user_id().ok_or(DomainError::Unauthorized)
    }

    /// The caller's id when it owns the resource.
    ///
    /// Anonymous callers get `Unauthorized`; authenticated non-owners get
    /// `Forbidden`. Existence is never hidden from an authenticated caller.
    pub fn require_owner(&self, owner_id: Uuid) -> Result<Uuid, DomainError> {
        let user_id = self.require_user()?;
        if user_id != owner_id {
            tracing::warn!(actor = %user_id, owner = %owner_id, "Ownership check failed");
            return Err(DomainError::Forbidden);
        }
        Ok(user_id)
    }
}

impl From<Option<Uuid>> for Actor {
    fn from(user_id: Option<Uuid>) -> Self {
        user_id.map_or(Actor::Anonymous, Actor::User)
    }
}

/// Which post rows a read may observe.
///
/// Listings apply this before any caller-supplied filter so that a filter can
/// only narrow the visible set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Published posts only.
    PublishedOnly,
    /// Published posts plus every post authored by the given user.
    PublishedOrAuthoredBy(Uuid),
}

impl Visibility {
    /// Listing visibility for an actor.
    pub fn for_listing(actor: &Actor) -> Self {
        match actor {
            Actor::Anonymous => Visibility::PublishedOnly,
            Actor::User(id) => Visibility::PublishedOrAuthoredBy(*id),
        }
    }

    pub fn permits(&self, post: &Post) -> bool {
        match self {
            Visibility::PublishedOnly => post.is_published(),
            Visibility::PublishedOrAuthoredBy(user_id) => {
                post.is_published() || post.is_authored_by(*user_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PostStatus;

    fn post_by(author: Uuid, status: PostStatus) -> Post {
        let mut post = Post::new(author, "Title".into(), "title".into(), "body".into());
        post.status = status;
        post
    }

    #[test]
    fn anonymous_listing_sees_published_only() {
        let author = Uuid::new_v4();
        let visibility = Visibility::for_listing(&Actor::Anonymous);

        assert!(visibility.permits(&post_by(author, PostStatus::Published)));
        assert!(!visibility.permits(&post_by(author, PostStatus::Draft)));
        assert!(!visibility.permits(&post_by(author, PostStatus::Archived)));
    }

    #[test]
    fn authenticated_listing_adds_own_posts_of_any_status() {
        let me = Uuid::new_v4();
        let someone_else = Uuid::new_v4();
        let visibility = Visibility::for_listing(&Actor::User(me));

        assert!(visibility.permits(&post_by(me, PostStatus::Draft)));
        assert!(visibility.permits(&post_by(me, PostStatus::Archived)));
        assert!(visibility.permits(&post_by(someone_else, PostStatus::Published)));
        assert!(!visibility.permits(&post_by(someone_else, PostStatus::Draft)));
    }

    #[test]
    fn ownership_distinguishes_unauthorized_from_forbidden() {
        let owner = Uuid::new_v4();

        assert!(matches!(
            Actor::Anonymous.require_owner(owner),
            Err(DomainError::Unauthorized)
        ));
        assert!(matches!(
            Actor::User(Uuid::new_v4()).require_owner(owner),
            Err(DomainError::Forbidden)
        ));
        assert_eq!(Actor::User(owner).require_owner(owner).unwrap(), owner);
    }
}
