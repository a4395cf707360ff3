use async_trait::async_trait;
use uuid::Uuid;

use scribe_core::domain::{Category, Tag};
use scribe_core::error::RepoError;
use scribe_core::ports::{BaseRepository, CategoryRepository, TagRepository};
use scribe_core::query::{Page, TaxonomyKey, TaxonomyQuery};

use super::{SharedTables, contains_ci, duplicate};

/// In-memory category repository.
pub struct InMemoryCategoryRepository {
    tables: SharedTables,
}

impl InMemoryCategoryRepository {
    pub(super) fn new(tables: SharedTables) -> Self {
        Self { tables }
    }
}

fn category_clash(existing: &Category, candidate: &Category) -> bool {
    existing.id != candidate.id
        && (existing.name == candidate.name || existing.slug == candidate.slug)
}

#[async_trait]
impl BaseRepository<Category, Uuid> for InMemoryCategoryRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepoError> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn insert(&self, category: Category) -> Result<Category, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.categories.contains_key(&category.id)
            || tables.categories.values().any(|c| category_clash(c, &category))
        {
            return Err(duplicate("Category with this name or slug"));
        }
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update(&self, category: Category) -> Result<Category, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&category.id) {
            return Err(RepoError::NotFound);
        }
        if tables.categories.values().any(|c| category_clash(c, &category)) {
            return Err(duplicate("Category with this name or slug"));
        }
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.categories.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        for post in tables.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn list(&self, query: &TaxonomyQuery) -> Result<Page<Category>, RepoError> {
        let tables = self.tables.read().await;
        let needle = query.search.as_deref().map(str::to_lowercase);

        let mut rows: Vec<(Category, u64)> = tables
            .categories
            .values()
            .filter(|c| {
                needle
                    .as_deref()
                    .is_none_or(|n| contains_ci(&c.name, n) || contains_ci(&c.description, n))
            })
            .map(|c| (c.clone(), tables.count_published(|p| p.category_id == Some(c.id))))
            .collect();
        rows.sort_by(|(a, a_count), (b, b_count)| {
            query.sort.compare(
                &TaxonomyKey {
                    id: a.id,
                    name: &a.name,
                    created_at: a.created_at,
                    post_count: *a_count,
                },
                &TaxonomyKey {
                    id: b.id,
                    name: &b.name,
                    created_at: b.created_at,
                    post_count: *b_count,
                },
            )
        });

        Ok(Page::from_sorted(rows, query.page).map(|(category, _)| category))
    }

    async fn published_post_count(&self, id: Uuid) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.count_published(|p| p.category_id == Some(id)))
    }
}

/// In-memory tag repository.
pub struct InMemoryTagRepository {
    tables: SharedTables,
}

impl InMemoryTagRepository {
    pub(super) fn new(tables: SharedTables) -> Self {
        Self { tables }
    }
}

fn tag_clash(existing: &Tag, candidate: &Tag) -> bool {
    existing.id != candidate.id && (existing.name == candidate.name || existing.slug == candidate.slug)
}

#[async_trait]
impl BaseRepository<Tag, Uuid> for InMemoryTagRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tag>, RepoError> {
        Ok(self.tables.read().await.tags.get(&id).cloned())
    }

    async fn insert(&self, tag: Tag) -> Result<Tag, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.tags.contains_key(&tag.id) || tables.tags.values().any(|t| tag_clash(t, &tag)) {
            return Err(duplicate("Tag with this name or slug"));
        }
        tables.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn update(&self, tag: Tag) -> Result<Tag, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.tags.contains_key(&tag.id) {
            return Err(RepoError::NotFound);
        }
        if tables.tags.values().any(|t| tag_clash(t, &tag)) {
            return Err(duplicate("Tag with this name or slug"));
        }
        tables.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.tags.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        tables.post_tags.retain(|(_, t)| *t != id);
        Ok(())
    }
}

#[async_trait]
impl TagRepository for InMemoryTagRepository {
    async fn list(&self, query: &TaxonomyQuery) -> Result<Page<Tag>, RepoError> {
        let tables = self.tables.read().await;
        let needle = query.search.as_deref().map(str::to_lowercase);

        let mut rows: Vec<(Tag, u64)> = tables
            .tags
            .values()
            .filter(|t| needle.as_deref().is_none_or(|n| contains_ci(&t.name, n)))
            .map(|t| {
                let count = tables.count_published(|p| tables.post_tags.contains(&(p.id, t.id)));
                (t.clone(), count)
            })
            .collect();
        rows.sort_by(|(a, a_count), (b, b_count)| {
            query.sort.compare(
                &TaxonomyKey {
                    id: a.id,
                    name: &a.name,
                    created_at: a.created_at,
                    post_count: *a_count,
                },
                &TaxonomyKey {
                    id: b.id,
                    name: &b.name,
                    created_at: b.created_at,
                    post_count: *b_count,
                },
            )
        });

        Ok(Page::from_sorted(rows, query.page).map(|(tag, _)| tag))
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Tag>, RepoError> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.tags.get(id)).cloned().collect())
    }

    async fn published_post_count(&self, id: Uuid) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.count_published(|p| tables.post_tags.contains(&(p.id, id))))
    }
}
