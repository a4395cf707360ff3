use chrono::Utc;
use uuid::Uuid;

use super::comments::CommentView;
use super::{BlogService, require_max_len, require_present, resolve_slug};
use crate::authz::{Actor, Visibility};
use crate::counters;
use crate::domain::{Category, Post, PostStatus, Tag, User};
use crate::error::DomainError;
use crate::query::{DateRange, Page, PageRequest, PostFilter, PostQuery, PostSort, SortField, trending_since};

const MAX_TITLE_LEN: usize = 200;
const MAX_SLUG_LEN: usize = 200;
const MAX_EXCERPT_LEN: usize = 300;

/// Input for a new post. The author is always the calling actor.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub slug: Option<String>,
    pub content: String,
    pub excerpt: String,
    pub category_id: Option<Uuid>,
    pub tag_ids: Vec<Uuid>,
    pub status: PostStatus,
    pub featured_image: Option<String>,
    pub is_featured: bool,
}

/// Partial post edit; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub category_id: Option<Option<Uuid>>,
    pub tag_ids: Option<Vec<Uuid>>,
    pub status: Option<PostStatus>,
    pub featured_image: Option<Option<String>>,
    pub is_featured: Option<bool>,
}

/// A post with the related rows a listing shows.
#[derive(Debug, Clone)]
pub struct PostSummary {
    pub post: Post,
    pub author: User,
    pub category: Option<Category>,
    pub tags: Vec<Tag>,
    /// Approved comments only.
    pub comments_count: u64,
}

/// A post with everything the single-post view shows.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub summary: PostSummary,
    /// Approved comments, newest first.
    pub comments: Vec<CommentView>,
    /// Whether the calling actor likes this post.
    pub is_liked: bool,
}

impl BlogService {
    pub async fn create_post(&self, actor: &Actor, input: NewPost) -> Result<PostDetail, DomainError> {
        let author_id = actor.require_user()?;

        require_present("Title", &input.title)?;
        require_max_len("Title", &input.title, MAX_TITLE_LEN)?;
        require_present("Content", &input.content)?;
        require_max_len("Excerpt", &input.excerpt, MAX_EXCERPT_LEN)?;
        let slug = resolve_slug("Slug", input.slug, &input.title, MAX_SLUG_LEN)?;
        self.ensure_slug_free(&slug, None).await?;
        self.ensure_category_exists(input.category_id).await?;
        let tag_ids = self.existing_tag_ids(&input.tag_ids).await?;

        let mut post = Post::new(author_id, input.title, slug, input.content);
        post.excerpt = input.excerpt;
        post.category_id = input.category_id;
        post.status = input.status;
        post.featured_image = input.featured_image;
        post.is_featured = input.is_featured;
        let created_at = post.created_at;
        counters::stamp_publication(&mut post, created_at);

        let post = self.repos.posts.insert(post).await?;
        if !tag_ids.is_empty() {
            self.repos.posts.set_tags(post.id, &tag_ids).await?;
        }
        tracing::info!(post_id = %post.id, author_id = %author_id, status = %post.status, "Post created");

        self.detail(actor, post).await
    }

    /// Author-only edit. Publishing for the first time stamps `published_at`.
    pub async fn update_post(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: PostChanges,
    ) -> Result<PostDetail, DomainError> {
        actor.require_user()?;
        let mut post = self.load_post(id).await?;
        actor.require_owner(post.author_id)?;

        if let Some(title) = changes.title {
            require_present("Title", &title)?;
            require_max_len("Title", &title, MAX_TITLE_LEN)?;
            post.title = title;
        }
        if let Some(slug) = changes.slug {
            let slug = resolve_slug("Slug", Some(slug), &post.title, MAX_SLUG_LEN)?;
            if slug != post.slug {
                self.ensure_slug_free(&slug, Some(post.id)).await?;
            }
            post.slug = slug;
        }
        if let Some(content) = changes.content {
            require_present("Content", &content)?;
            post.content = content;
        }
        if let Some(excerpt) = changes.excerpt {
            require_max_len("Excerpt", &excerpt, MAX_EXCERPT_LEN)?;
            post.excerpt = excerpt;
        }
        if let Some(category_id) = changes.category_id {
            self.ensure_category_exists(category_id).await?;
            post.category_id = category_id;
        }
        let tag_ids = match changes.tag_ids {
            Some(ids) => Some(self.existing_tag_ids(&ids).await?),
            None => None,
        };
        if let Some(status) = changes.status {
            post.status = status;
        }
        if let Some(featured_image) = changes.featured_image {
            post.featured_image = featured_image;
        }
        if let Some(is_featured) = changes.is_featured {
            post.is_featured = is_featured;
        }

        let now = Utc::now();
        if counters::stamp_publication(&mut post, now) {
            tracing::info!(post_id = %post.id, "Post published for the first time");
        }
        post.updated_at = now;

        let post = self.repos.posts.update(post).await?;
        if let Some(tag_ids) = tag_ids {
            self.repos.posts.set_tags(post.id, &tag_ids).await?;
        }

        self.detail(actor, post).await
    }

    /// Author-only delete; comments, likes and tag links go with the post.
    pub async fn delete_post(&self, actor: &Actor, id: Uuid) -> Result<(), DomainError> {
        actor.require_user()?;
        let post = self.load_post(id).await?;
        actor.require_owner(post.author_id)?;

        self.repos.posts.delete(post.id).await?;
        tracing::info!(post_id = %post.id, "Post deleted");
        Ok(())
    }

    /// Direct lookup by id.
    ///
    /// Lookup is not scoped by listing visibility: any caller may address a
    /// post by id whatever its status. Only published posts count the view.
    pub async fn retrieve_post(&self, actor: &Actor, id: Uuid) -> Result<PostDetail, DomainError> {
        let mut post = self.load_post(id).await?;

        if counters::counts_views(&post) {
            if let Some(views) = self.repos.posts.record_view(post.id).await? {
                post.views_count = views;
            }
        }

        self.detail(actor, post).await
    }

    pub async fn list_posts(
        &self,
        actor: &Actor,
        filter: PostFilter,
        sort: PostSort,
        page: u64,
    ) -> Result<Page<PostSummary>, DomainError> {
        let request = PageRequest::new(page, self.settings.page_size)?;
        let query = PostQuery::new(Visibility::for_listing(actor), filter, sort, request);
        self.run_query(&query).await
    }

    /// Published, featured posts.
    pub async fn featured_posts(&self, actor: &Actor, page: u64) -> Result<Page<PostSummary>, DomainError> {
        let filter = PostFilter {
            status: Some(PostStatus::Published),
            is_featured: Some(true),
            ..Default::default()
        };
        self.list_posts(actor, filter, PostSort::default(), page).await
    }

    /// Most viewed published posts.
    pub async fn popular_posts(&self, actor: &Actor) -> Result<Vec<PostSummary>, DomainError> {
        let filter = PostFilter {
            status: Some(PostStatus::Published),
            ..Default::default()
        };
        self.shortlist(actor, filter, PostSort::desc(SortField::ViewsCount))
            .await
    }

    /// Most liked published posts created during the last week.
    pub async fn trending_posts(&self, actor: &Actor) -> Result<Vec<PostSummary>, DomainError> {
        let filter = PostFilter {
            status: Some(PostStatus::Published),
            created: DateRange::since(trending_since(Utc::now())),
            ..Default::default()
        };
        self.shortlist(actor, filter, PostSort::desc(SortField::LikesCount))
            .await
    }

    /// Every post of the caller, any status.
    pub async fn my_posts(&self, actor: &Actor, page: u64) -> Result<Page<PostSummary>, DomainError> {
        let user_id = actor.require_user()?;
        let filter = PostFilter {
            author_id: Some(user_id),
            ..Default::default()
        };
        self.list_posts(actor, filter, PostSort::default(), page).await
    }

    /// A user's posts as the caller is allowed to list them.
    pub async fn user_posts(
        &self,
        actor: &Actor,
        user_id: Uuid,
        status: Option<PostStatus>,
        page: u64,
    ) -> Result<Page<PostSummary>, DomainError> {
        self.load_user(user_id).await?;
        let filter = PostFilter {
            author_id: Some(user_id),
            status,
            ..Default::default()
        };
        self.list_posts(actor, filter, PostSort::default(), page).await
    }

    pub(super) async fn load_post(&self, id: Uuid) -> Result<Post, DomainError> {
        self.repos
            .posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))
    }

    pub(super) async fn run_query(&self, query: &PostQuery) -> Result<Page<PostSummary>, DomainError> {
        let page = self.repos.posts.search(query).await?;
        tracing::debug!(total = page.total, page = page.page, "Post query executed");

        let mut summaries = Vec::with_capacity(page.items.len());
        for post in page.items {
            summaries.push(self.summarize(post).await?);
        }
        Ok(Page::new(summaries, page.total, query.page))
    }

    async fn shortlist(
        &self,
        actor: &Actor,
        filter: PostFilter,
        sort: PostSort,
    ) -> Result<Vec<PostSummary>, DomainError> {
        let query = PostQuery::new(
            Visibility::for_listing(actor),
            filter,
            sort,
            PageRequest::first(self.settings.shortlist_len),
        );
        Ok(self.run_query(&query).await?.items)
    }

    async fn summarize(&self, post: Post) -> Result<PostSummary, DomainError> {
        let author = self.load_user(post.author_id).await?;
        let category = match post.category_id {
            Some(id) => self.repos.categories.find_by_id(id).await?,
            None => None,
        };
        let tags = self.repos.posts.tags_of(post.id).await?;
        let comments_count = self.repos.comments.count_for_post(post.id, true).await?;

        Ok(PostSummary {
            post,
            author,
            category,
            tags,
            comments_count,
        })
    }

    async fn detail(&self, actor: &Actor, post: Post) -> Result<PostDetail, DomainError> {
        let is_liked = match actor.user_id() {
            Some(user_id) => self.repos.likes.find(user_id, post.id).await?.is_some(),
            None => false,
        };
        let comments = self.repos.comments.for_post(post.id, true).await?;
        let comments = self.comment_views(comments).await?;
        let summary = self.summarize(post).await?;

        Ok(PostDetail {
            summary,
            comments,
            is_liked,
        })
    }

    async fn ensure_slug_free(&self, slug: &str, owner: Option<Uuid>) -> Result<(), DomainError> {
        match self.repos.posts.find_by_slug(slug).await? {
            Some(existing) if Some(existing.id) != owner => Err(DomainError::Conflict(format!(
                "A post with slug '{slug}' already exists"
            ))),
            _ => Ok(()),
        }
    }

    async fn ensure_category_exists(&self, category_id: Option<Uuid>) -> Result<(), DomainError> {
        if let Some(id) = category_id {
            if self.repos.categories.find_by_id(id).await?.is_none() {
                return Err(DomainError::validation(format!("Unknown category {id}")));
            }
        }
        Ok(())
    }

    /// Deduplicated tag ids, all of which must exist.
    async fn existing_tag_ids(&self, requested: &[Uuid]) -> Result<Vec<Uuid>, DomainError> {
        let mut ids = requested.to_vec();
        ids.sort();
        ids.dedup();
        if ids.is_empty() {
            return Ok(ids);
        }

        let found = self.repos.tags.find_many(&ids).await?;
        if let Some(missing) = ids.iter().find(|id| !found.iter().any(|t| t.id == **id)) {
            return Err(DomainError::validation(format!("Unknown tag {missing}")));
        }
        Ok(ids)
    }
}
