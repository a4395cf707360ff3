//! Categories and tags: administrative entities referenced by posts.

use chrono::Utc;
use uuid::Uuid;

use super::posts::PostSummary;
use super::{BlogService, require_max_len, require_present, resolve_slug};
use crate::authz::Actor;
use crate::domain::{Category, PostStatus, Tag};
use crate::error::DomainError;
use crate::query::{Page, PageRequest, PostFilter, PostSort, TaxonomyQuery, TaxonomySort};

const MAX_CATEGORY_NAME_LEN: usize = 100;
const MAX_TAG_NAME_LEN: usize = 50;

#[derive(Debug, Clone, Default)]
pub struct NewCategory {
    pub name: String,
    pub slug: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
}

/// A category with its count of published posts.
#[derive(Debug, Clone)]
pub struct CategoryView {
    pub category: Category,
    pub post_count: u64,
}

#[derive(Debug, Clone, Default)]
pub struct NewTag {
    pub name: String,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TagChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
}

/// A tag with its count of published posts.
#[derive(Debug, Clone)]
pub struct TagView {
    pub tag: Tag,
    pub post_count: u64,
}

impl BlogService {
    pub async fn create_category(&self, actor: &Actor, input: NewCategory) -> Result<CategoryView, DomainError> {
        actor.require_user()?;
        let name = input.name.trim().to_string();
        require_present("Name", &name)?;
        require_max_len("Name", &name, MAX_CATEGORY_NAME_LEN)?;
        let slug = resolve_slug("Slug", input.slug, &name, MAX_CATEGORY_NAME_LEN)?;

        let category = self
            .repos
            .categories
            .insert(Category::new(name, slug, input.description))
            .await?;
        tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");
        Ok(CategoryView {
            category,
            post_count: 0,
        })
    }

    pub async fn update_category(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: CategoryChanges,
    ) -> Result<CategoryView, DomainError> {
        actor.require_user()?;
        let mut category = self.load_category(id).await?;

        if let Some(name) = changes.name {
            let name = name.trim().to_string();
            require_present("Name", &name)?;
            require_max_len("Name", &name, MAX_CATEGORY_NAME_LEN)?;
            category.name = name;
        }
        if let Some(slug) = changes.slug {
            category.slug = resolve_slug("Slug", Some(slug), &category.name, MAX_CATEGORY_NAME_LEN)?;
        }
        if let Some(description) = changes.description {
            category.description = description;
        }
        category.updated_at = Utc::now();

        let category = self.repos.categories.update(category).await?;
        self.category_view(category).await
    }

    /// Posts that referenced the category keep existing, uncategorized.
    pub async fn delete_category(&self, actor: &Actor, id: Uuid) -> Result<(), DomainError> {
        actor.require_user()?;
        let category = self.load_category(id).await?;
        self.repos.categories.delete(category.id).await?;
        tracing::info!(category_id = %category.id, "Category deleted");
        Ok(())
    }

    pub async fn get_category(&self, id: Uuid) -> Result<CategoryView, DomainError> {
        let category = self.load_category(id).await?;
        self.category_view(category).await
    }

    /// `search` matches name or description; blank means no search.
    pub async fn list_categories(
        &self,
        search: Option<&str>,
        sort: TaxonomySort,
        page: u64,
    ) -> Result<Page<CategoryView>, DomainError> {
        let query = self.taxonomy_query(search, sort, page)?;
        let categories = self.repos.categories.list(&query).await?;

        let mut views = Vec::with_capacity(categories.items.len());
        for category in categories.items {
            views.push(self.category_view(category).await?);
        }
        Ok(Page::new(views, categories.total, query.page))
    }

    /// Published posts in a category.
    pub async fn category_posts(&self, actor: &Actor, id: Uuid, page: u64) -> Result<Page<PostSummary>, DomainError> {
        let category = self.load_category(id).await?;
        let filter = PostFilter {
            category_id: Some(category.id),
            status: Some(PostStatus::Published),
            ..Default::default()
        };
        self.list_posts(actor, filter, PostSort::default(), page).await
    }

    pub async fn create_tag(&self, actor: &Actor, input: NewTag) -> Result<TagView, DomainError> {
        actor.require_user()?;
        let name = input.name.trim().to_string();
        require_present("Name", &name)?;
        require_max_len("Name", &name, MAX_TAG_NAME_LEN)?;
        let slug = resolve_slug("Slug", input.slug, &name, MAX_TAG_NAME_LEN)?;

        let tag = self.repos.tags.insert(Tag::new(name, slug)).await?;
        tracing::info!(tag_id = %tag.id, slug = %tag.slug, "Tag created");
        Ok(TagView { tag, post_count: 0 })
    }

    pub async fn update_tag(&self, actor: &Actor, id: Uuid, changes: TagChanges) -> Result<TagView, DomainError> {
        actor.require_user()?;
        let mut tag = self.load_tag(id).await?;

        if let Some(name) = changes.name {
            let name = name.trim().to_string();
            require_present("Name", &name)?;
            require_max_len("Name", &name, MAX_TAG_NAME_LEN)?;
            tag.name = name;
        }
        if let Some(slug) = changes.slug {
            tag.slug = resolve_slug("Slug", Some(slug), &tag.name, MAX_TAG_NAME_LEN)?;
        }

        let tag = self.repos.tags.update(tag).await?;
        self.tag_view(tag).await
    }

    /// Detaches the tag from every post, then removes it.
    pub async fn delete_tag(&self, actor: &Actor, id: Uuid) -> Result<(), DomainError> {
        actor.require_user()?;
        let tag = self.load_tag(id).await?;
        self.repos.tags.delete(tag.id).await?;
        tracing::info!(tag_id = %tag.id, "Tag deleted");
        Ok(())
    }

    pub async fn get_tag(&self, id: Uuid) -> Result<TagView, DomainError> {
        let tag = self.load_tag(id).await?;
        self.tag_view(tag).await
    }

    pub async fn list_tags(
        &self,
        search: Option<&str>,
        sort: TaxonomySort,
        page: u64,
    ) -> Result<Page<TagView>, DomainError> {
        let query = self.taxonomy_query(search, sort, page)?;
        let tags = self.repos.tags.list(&query).await?;

        let mut views = Vec::with_capacity(tags.items.len());
        for tag in tags.items {
            views.push(self.tag_view(tag).await?);
        }
        Ok(Page::new(views, tags.total, query.page))
    }

    /// Published posts carrying a tag.
    pub async fn tag_posts(&self, actor: &Actor, id: Uuid, page: u64) -> Result<Page<PostSummary>, DomainError> {
        let tag = self.load_tag(id).await?;
        let filter = PostFilter {
            tags: vec![tag.slug],
            status: Some(PostStatus::Published),
            ..Default::default()
        };
        self.list_posts(actor, filter, PostSort::default(), page).await
    }

    fn taxonomy_query(&self, search: Option<&str>, sort: TaxonomySort, page: u64) -> Result<TaxonomyQuery, DomainError> {
        Ok(TaxonomyQuery {
            search: search.map(str::trim).filter(|s| !s.is_empty()).map(String::from),
            sort,
            page: PageRequest::new(page, self.settings.page_size)?,
        })
    }

    async fn category_view(&self, category: Category) -> Result<CategoryView, DomainError> {
        let post_count = self.repos.categories.published_post_count(category.id).await?;
        Ok(CategoryView { category, post_count })
    }

    async fn tag_view(&self, tag: Tag) -> Result<TagView, DomainError> {
        let post_count = self.repos.tags.published_post_count(tag.id).await?;
        Ok(TagView { tag, post_count })
    }

    async fn load_category(&self, id: Uuid) -> Result<Category, DomainError> {
        self.repos
            .categories
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Category", id))
    }

    async fn load_tag(&self, id: Uuid) -> Result<Tag, DomainError> {
        self.repos
            .tags
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Tag", id))
    }
}
