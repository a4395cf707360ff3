use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

const WORDS_PER_MINUTE: usize = 200;

/// Publication state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            other => Err(DomainError::validation(format!(
                "Unknown post status '{other}' (expected draft, published or archived)"
            ))),
        }
    }
}

/// Post entity - a blog article.
///
/// `views_count` and `likes_count` are derived counters; they are only ever
/// written by the counter maintenance paths, never from caller input.
/// Tag membership lives in its own join table and is not part of this row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub status: PostStatus,
    pub featured_image: Option<String>,
    pub is_featured: bool,
    pub views_count: u64,
    pub likes_count: u64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new draft post owned by `author_id`.
    pub fn new(author_id: Uuid, title: String, slug: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            category_id: None,
            title,
            slug,
            content,
            excerpt: String::new(),
            status: PostStatus::Draft,
            featured_image: None,
            is_featured: false,
            views_count: 0,
            likes_count: 0,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }

    /// Estimated reading time in minutes, never below one.
    pub fn reading_time(&self) -> usize {
        (self.content.split_whitespace().count() / WORDS_PER_MINUTE).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing_is_case_insensitive() {
        assert_eq!("Published".parse::<PostStatus>().unwrap(), PostStatus::Published);
        assert_eq!(" draft ".parse::<PostStatus>().unwrap(), PostStatus::Draft);
        assert_eq!("ARCHIVED".parse::<PostStatus>().unwrap(), PostStatus::Archived);
    }

    #[test]
    fn unknown_status_is_a_validation_error() {
        let err = "scheduled".parse::<PostStatus>().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn reading_time_rounds_down_with_floor_of_one() {
        let mut post = Post::new(Uuid::new_v4(), "t".into(), "t".into(), "word ".repeat(10));
        assert_eq!(post.reading_time(), 1);

        post.content = "word ".repeat(450);
        assert_eq!(post.reading_time(), 2);
    }
}
