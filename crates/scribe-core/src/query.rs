//! Post query model: filters, sorting and pagination.
//!
//! Storage adapters translate a [`PostQuery`] into their own query language.
//! The in-memory adapter evaluates it directly with [`PostQuery::admits`] and
//! [`PostSort::compare`], which therefore define the reference semantics.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::authz::Visibility;
use crate::domain::{Post, PostStatus, User};
use crate::error::DomainError;

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    pub fn new(page: u64, page_size: u64) -> Result<Self, DomainError> {
        if page == 0 {
            return Err(DomainError::validation("Page numbers start at 1"));
        }
        if page_size == 0 {
            return Err(DomainError::validation("Page size must be positive"));
        }
        // SQL offsets are signed 64-bit.
        let in_range = (page - 1)
            .checked_mul(page_size)
            .is_some_and(|offset| offset <= i64::MAX as u64);
        if !in_range {
            return Err(DomainError::validation(format!("Page {page} is out of range")));
        }
        Ok(Self { page, page_size })
    }

    pub fn first(page_size: u64) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

/// One page of results plus the total row count.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
        }
    }

    /// Slice an already filtered and ordered collection.
    pub fn from_sorted(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.page_size as usize)
            .collect();
        Self::new(items, total, request)
    }

    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.page_size.max(1))
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Columns a caller may order by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    ViewsCount,
    LikesCount,
    PublishedAt,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::ViewsCount => "views_count",
            Self::LikesCount => "likes_count",
            Self::PublishedAt => "published_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Requested ordering. Ties are always broken by post id, ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl PostSort {
    pub const fn desc(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }

    pub const fn asc(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    /// Total order over posts. Missing `published_at` values sort last in
    /// either direction.
    pub fn compare(&self, a: &Post, b: &Post) -> Ordering {
        let primary = match self.field {
            SortField::CreatedAt => self.directed(a.created_at.cmp(&b.created_at)),
            SortField::UpdatedAt => self.directed(a.updated_at.cmp(&b.updated_at)),
            SortField::ViewsCount => self.directed(a.views_count.cmp(&b.views_count)),
            SortField::LikesCount => self.directed(a.likes_count.cmp(&b.likes_count)),
            SortField::PublishedAt => match (a.published_at, b.published_at) {
                (Some(x), Some(y)) => self.directed(x.cmp(&y)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }

    fn directed(&self, ordering: Ordering) -> Ordering {
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

impl Default for PostSort {
    fn default() -> Self {
        Self::desc(SortField::CreatedAt)
    }
}

impl FromStr for PostSort {
    type Err = DomainError;

    /// Parse `field` or `-field`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (direction, name) = match s.strip_prefix('-') {
            Some(rest) => (SortDirection::Desc, rest),
            None => (SortDirection::Asc, s),
        };
        let field = match name {
            "created_at" => SortField::CreatedAt,
            "updated_at" => SortField::UpdatedAt,
            "views_count" => SortField::ViewsCount,
            "likes_count" => SortField::LikesCount,
            "published_at" => SortField::PublishedAt,
            other => {
                return Err(DomainError::validation(format!(
                    "Cannot order by '{other}'"
                )));
            }
        };
        Ok(Self { field, direction })
    }
}

/// Columns a category or tag listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxonomyField {
    Name,
    CreatedAt,
    /// Published posts referencing the row.
    PostCount,
}

/// Ordering for category and tag listings; ties fall back to id, ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxonomySort {
    pub field: TaxonomyField,
    pub direction: SortDirection,
}

impl TaxonomySort {
    pub fn compare(&self, a: &TaxonomyKey<'_>, b: &TaxonomyKey<'_>) -> Ordering {
        let primary = match self.field {
            TaxonomyField::Name => a.name.cmp(b.name),
            TaxonomyField::CreatedAt => a.created_at.cmp(&b.created_at),
            TaxonomyField::PostCount => a.post_count.cmp(&b.post_count),
        };
        let primary = match self.direction {
            SortDirection::Asc => primary,
            SortDirection::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

impl Default for TaxonomySort {
    fn default() -> Self {
        Self {
            field: TaxonomyField::Name,
            direction: SortDirection::Asc,
        }
    }
}

impl FromStr for TaxonomySort {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (direction, name) = match s.strip_prefix('-') {
            Some(rest) => (SortDirection::Desc, rest),
            None => (SortDirection::Asc, s),
        };
        let field = match name {
            "name" => TaxonomyField::Name,
            "created_at" => TaxonomyField::CreatedAt,
            "post_count" => TaxonomyField::PostCount,
            other => {
                return Err(DomainError::validation(format!(
                    "Cannot order by '{other}'"
                )));
            }
        };
        Ok(Self { field, direction })
    }
}

/// The sortable attributes of one category or tag.
#[derive(Debug, Clone, Copy)]
pub struct TaxonomyKey<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub created_at: DateTime<Utc>,
    pub post_count: u64,
}

/// A category or tag listing request.
///
/// `search` is matched case-insensitively against the name, and against the
/// description for categories.
#[derive(Debug, Clone)]
pub struct TaxonomyQuery {
    pub search: Option<String>,
    pub sort: TaxonomySort,
    pub page: PageRequest,
}

/// Half-open timestamp window `[from, until)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Inclusive calendar-day bounds, both in UTC.
    pub fn from_dates(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        let start_of = |d: NaiveDate| d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        Self {
            from: from.and_then(start_of),
            until: to
                .and_then(|d| d.succ_opt())
                .and_then(start_of),
        }
    }

    pub fn since(from: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            until: None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.until.is_none()
    }

    pub fn contains(&self, value: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| value >= from) && self.until.is_none_or(|until| value < until)
    }

    /// A missing value only matches an unbounded range.
    pub fn contains_opt(&self, value: Option<DateTime<Utc>>) -> bool {
        match value {
            Some(v) => self.contains(v),
            None => self.is_unbounded(),
        }
    }
}

/// Exact / minimum / maximum bounds on a counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountRange {
    pub exact: Option<u64>,
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl CountRange {
    pub fn contains(&self, value: u64) -> bool {
        self.exact.is_none_or(|e| value == e)
            && self.min.is_none_or(|m| value >= m)
            && self.max.is_none_or(|m| value <= m)
    }
}

/// Caller-supplied narrowing of a post listing.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Case-insensitive substring over title, content and author display name.
    pub search: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    /// Case-insensitive substring of the author's username.
    pub author: Option<String>,
    pub author_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    /// Tag slugs; a post matches when it carries any of them.
    pub tags: Vec<String>,
    pub status: Option<PostStatus>,
    pub is_featured: Option<bool>,
    pub created: DateRange,
    pub published: DateRange,
    pub views: CountRange,
    pub likes: CountRange,
}

impl PostFilter {
    /// Drop blank text terms so `?search=` behaves like no search at all.
    pub fn normalized(mut self) -> Self {
        fn clean(term: Option<String>) -> Option<String> {
            term.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
        }
        self.search = clean(self.search);
        self.title = clean(self.title);
        self.content = clean(self.content);
        self.author = clean(self.author);
        self.tags = self
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        self
    }

    pub fn matches(&self, post: &Post, author: &User, tag_slugs: &[String]) -> bool {
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let hit = post.title.to_lowercase().contains(&term)
                || post.content.to_lowercase().contains(&term)
                || author.display_name_contains(&term);
            if !hit {
                return false;
            }
        }
        if !contains_ci(&post.title, self.title.as_deref())
            || !contains_ci(&post.content, self.content.as_deref())
            || !contains_ci(&author.username, self.author.as_deref())
        {
            return false;
        }
        if self.author_id.is_some_and(|id| post.author_id != id) {
            return false;
        }
        if self.category_id.is_some_and(|id| post.category_id != Some(id)) {
            return false;
        }
        if !self.tags.is_empty() && !self.tags.iter().any(|t| tag_slugs.contains(t)) {
            return false;
        }
        if self.status.is_some_and(|s| post.status != s) {
            return false;
        }
        if self.is_featured.is_some_and(|f| post.is_featured != f) {
            return false;
        }
        self.created.contains(post.created_at)
            && self.published.contains_opt(post.published_at)
            && self.views.contains(post.views_count)
            && self.likes.contains(post.likes_count)
    }
}

fn contains_ci(haystack: &str, needle: Option<&str>) -> bool {
    needle.is_none_or(|n| haystack.to_lowercase().contains(&n.to_lowercase()))
}

/// A bounded, visibility-scoped listing request.
#[derive(Debug, Clone)]
pub struct PostQuery {
    pub visibility: Visibility,
    pub filter: PostFilter,
    pub sort: PostSort,
    pub page: PageRequest,
}

impl PostQuery {
    pub fn new(visibility: Visibility, filter: PostFilter, sort: PostSort, page: PageRequest) -> Self {
        Self {
            visibility,
            filter: filter.normalized(),
            sort,
            page,
        }
    }

    /// Visibility first, then the caller's filter.
    pub fn admits(&self, post: &Post, author: &User, tag_slugs: &[String]) -> bool {
        self.visibility.permits(post) && self.filter.matches(post, author, tag_slugs)
    }
}

/// Start of the trending window relative to `now`.
pub fn trending_since(now: DateTime<Utc>) -> DateTime<Utc> {
    now - TimeDelta::days(7)
}
