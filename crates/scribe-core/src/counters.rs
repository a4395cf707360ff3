//! Derived-field rules for posts.
//!
//! `likes_count` is always recomputed from the like rows by the repository
//! that mutated them; `views_count` only moves by one on a counted view;
//! `published_at` is written once and then frozen. The functions here are the
//! pure half of those rules, shared by every storage adapter.

use chrono::{DateTime, Utc};

use crate::domain::Post;

/// Whether a view of this post may be counted.
pub fn counts_views(post: &Post) -> bool {
    post.is_published()
}

/// Set `published_at` if the post is published and has never been stamped.
///
/// Returns `true` when the stamp was applied.
pub fn stamp_publication(post: &mut Post, now: DateTime<Utc>) -> bool {
    if post.is_published() && post.published_at.is_none() {
        post.published_at = Some(now);
        return true;
    }
    false
}

/// The `published_at` value a write may persist given what is already stored.
///
/// A stored stamp always wins, so a write racing with an earlier publish
/// cannot move or clear it.
pub fn settle_publication(
    stored: Option<DateTime<Utc>>,
    incoming: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    stored.or(incoming)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PostStatus;
    use chrono::TimeDelta;
    use uuid::Uuid;

    fn draft() -> Post {
        Post::new(Uuid::new_v4(), "T".into(), "t".into(), "c".into())
    }

    #[test]
    fn first_publish_stamps_once() {
        let mut post = draft();
        let first = Utc::now();

        assert!(!stamp_publication(&mut post, first));
        assert!(post.published_at.is_none());

        post.status = PostStatus::Published;
        assert!(stamp_publication(&mut post, first));
        assert_eq!(post.published_at, Some(first));

        // Archive and republish later: the original stamp is kept.
        post.status = PostStatus::Archived;
        assert!(!stamp_publication(&mut post, first + TimeDelta::hours(1)));
        post.status = PostStatus::Published;
        assert!(!stamp_publication(&mut post, first + TimeDelta::hours(2)));
        assert_eq!(post.published_at, Some(first));
    }

    #[test]
    fn stored_stamp_wins_over_incoming() {
        let stored = Utc::now();
        let later = stored + TimeDelta::minutes(5);

        assert_eq!(settle_publication(Some(stored), Some(later)), Some(stored));
        assert_eq!(settle_publication(Some(stored), None), Some(stored));
        assert_eq!(settle_publication(None, Some(later)), Some(later));
        assert_eq!(settle_publication(None, None), None);
    }

    #[test]
    fn only_published_posts_count_views() {
        let mut post = draft();
        assert!(!counts_views(&post));
        post.status = PostStatus::Archived;
        assert!(!counts_views(&post));
        post.status = PostStatus::Published;
        assert!(counts_views(&post));
    }
}
