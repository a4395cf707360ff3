use async_trait::async_trait;
use uuid::Uuid;

use scribe_core::counters::{counts_views, settle_publication};
use scribe_core::domain::{Post, PostStatus, Tag};
use scribe_core::error::RepoError;
use scribe_core::ports::{BaseRepository, PostRepository, PostStats};
use scribe_core::query::{Page, PostQuery};

use super::{SharedTables, Tables, duplicate, missing_reference};

/// In-memory post repository.
pub struct InMemoryPostRepository {
    tables: SharedTables,
}

impl InMemoryPostRepository {
    pub(super) fn new(tables: SharedTables) -> Self {
        Self { tables }
    }
}

fn check_references(tables: &Tables, post: &Post) -> Result<(), RepoError> {
    if !tables.users.contains_key(&post.author_id) {
        return Err(missing_reference("author"));
    }
    if post.category_id.is_some_and(|id| !tables.categories.contains_key(&id)) {
        return Err(missing_reference("category"));
    }
    if tables
        .posts
        .values()
        .any(|p| p.id != post.id && p.slug == post.slug)
    {
        return Err(duplicate("Post with this slug"));
    }
    Ok(())
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.posts.contains_key(&post.id) {
            return Err(duplicate("Post"));
        }
        check_references(&tables, &post)?;

        // Counters start from the rows that exist, which for a new post is none.
        let post = Post {
            views_count: 0,
            likes_count: 0,
            ..post
        };
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        check_references(&tables, &post)?;
        let stored = tables.posts.get_mut(&post.id).ok_or(RepoError::NotFound)?;

        let merged = Post {
            views_count: stored.views_count,
            likes_count: stored.likes_count,
            published_at: settle_publication(stored.published_at, post.published_at),
            ..post
        };
        *stored = merged.clone();
        Ok(merged)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        if self.tables.write().await.remove_post(id) {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.values().find(|p| p.slug == slug).cloned())
    }

    async fn search(&self, query: &PostQuery) -> Result<Page<Post>, RepoError> {
        let tables = self.tables.read().await;

        let mut matched: Vec<Post> = tables
            .posts
            .values()
            .filter(|post| {
                let Some(author) = tables.users.get(&post.author_id) else {
                    return false;
                };
                query.admits(post, author, &tables.tag_slugs_of(post.id))
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| query.sort.compare(a, b));

        Ok(Page::from_sorted(matched, query.page))
    }

    async fn tags_of(&self, post_id: Uuid) -> Result<Vec<Tag>, RepoError> {
        let tables = self.tables.read().await;
        let mut tags: Vec<Tag> = tables
            .post_tags
            .iter()
            .filter(|(p, _)| *p == post_id)
            .filter_map(|(_, t)| tables.tags.get(t))
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn set_tags(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post_id) {
            return Err(RepoError::NotFound);
        }
        if tag_ids.iter().any(|id| !tables.tags.contains_key(id)) {
            return Err(missing_reference("tag"));
        }
        tables.post_tags.retain(|(p, _)| *p != post_id);
        tables
            .post_tags
            .extend(tag_ids.iter().map(|tag_id| (post_id, *tag_id)));
        Ok(())
    }

    async fn record_view(&self, post_id: Uuid) -> Result<Option<u64>, RepoError> {
        let mut tables = self.tables.write().await;
        let Some(post) = tables.posts.get_mut(&post_id) else {
            return Ok(None);
        };
        if !counts_views(post) {
            return Ok(None);
        }
        post.views_count += 1;
        Ok(Some(post.views_count))
    }

    async fn stats(&self) -> Result<PostStats, RepoError> {
        let tables = self.tables.read().await;
        let mut stats = PostStats::default();
        for post in tables.posts.values() {
            stats.total_posts += 1;
            stats.total_views += post.views_count;
            match post.status {
                PostStatus::Published => stats.published_posts += 1,
                PostStatus::Draft => stats.draft_posts += 1,
                PostStatus::Archived => {}
            }
        }
        Ok(stats)
    }
}
