//! PostgreSQL post repository.
//!
//! Listing queries are built from a [`PostQuery`]: the visibility condition is
//! always applied, the caller's filter narrows it further, and every ordering
//! ends with `id ASC` so pages are stable.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, IntoColumnRef, NullOrdering, Query, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, DbConn, EntityTrait, JoinType,
    Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
    TransactionTrait,
};
use uuid::Uuid;

use scribe_core::authz::Visibility;
use scribe_core::counters::settle_publication;
use scribe_core::domain::{Post, PostStatus, Tag};
use scribe_core::error::RepoError;
use scribe_core::ports::{BaseRepository, PostRepository, PostStats};
use scribe_core::query::{
    CountRange, DateRange, Page, PostFilter, PostQuery, PostSort, SortDirection, SortField,
};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_tag::{self, Entity as PostTagEntity};
use super::entity::tag::{self, Entity as TagEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::entity::{from_db_count, to_db_count};
use super::likes::lock_post;
use super::{like_pattern, map_db_err};

pub struct PostgresPostRepository {
    db: Arc<DbConn>,
}

impl PostgresPostRepository {
    pub fn new(db: impl Into<Arc<DbConn>>) -> Self {
        Self { db: db.into() }
    }

    fn db(&self) -> &DbConn {
        &self.db
    }
}

fn ilike(column: impl IntoColumnRef, term: &str) -> SimpleExpr {
    Expr::col(column).ilike(like_pattern(term))
}

fn visibility_condition(visibility: &Visibility) -> Condition {
    let published = post::Column::Status.eq(post::Status::Published);
    match visibility {
        Visibility::PublishedOnly => Condition::all().add(published),
        Visibility::PublishedOrAuthoredBy(user_id) => Condition::any()
            .add(published)
            .add(post::Column::AuthorId.eq(*user_id)),
    }
}

fn with_date_bounds(condition: Condition, column: post::Column, range: &DateRange) -> Condition {
    let at = |d: DateTime<Utc>| DateTimeWithTimeZone::from(d);
    condition
        .add_option(range.from.map(|d| column.gte(at(d))))
        .add_option(range.until.map(|d| column.lt(at(d))))
}

fn with_count_bounds(condition: Condition, column: post::Column, range: &CountRange) -> Condition {
    condition
        .add_option(range.exact.map(|v| column.eq(to_db_count(v))))
        .add_option(range.min.map(|v| column.gte(to_db_count(v))))
        .add_option(range.max.map(|v| column.lte(to_db_count(v))))
}

/// Posts carrying any of the given tag slugs.
fn tagged_with(slugs: &[String]) -> SimpleExpr {
    post::Column::Id.in_subquery(
        Query::select()
            .column((PostTagEntity, post_tag::Column::PostId))
            .from(PostTagEntity)
            .inner_join(
                TagEntity,
                Expr::col((TagEntity, tag::Column::Id)).equals((PostTagEntity, post_tag::Column::TagId)),
            )
            .and_where(Expr::col((TagEntity, tag::Column::Slug)).is_in(slugs.iter().cloned()))
            .to_owned(),
    )
}

fn filter_condition(filter: &PostFilter) -> Condition {
    let mut condition = Condition::all();

    if let Some(term) = &filter.search {
        condition = condition.add(
            Condition::any()
                .add(ilike((PostEntity, post::Column::Title), term))
                .add(ilike((PostEntity, post::Column::Content), term))
                .add(ilike((UserEntity, user::Column::Username), term))
                .add(ilike((UserEntity, user::Column::FirstName), term))
                .add(ilike((UserEntity, user::Column::LastName), term)),
        );
    }
    if let Some(term) = &filter.title {
        condition = condition.add(ilike((PostEntity, post::Column::Title), term));
    }
    if let Some(term) = &filter.content {
        condition = condition.add(ilike((PostEntity, post::Column::Content), term));
    }
    if let Some(term) = &filter.author {
        condition = condition.add(ilike((UserEntity, user::Column::Username), term));
    }
    if !filter.tags.is_empty() {
        condition = condition.add(tagged_with(&filter.tags));
    }

    condition = condition
        .add_option(filter.author_id.map(|id| post::Column::AuthorId.eq(id)))
        .add_option(filter.category_id.map(|id| post::Column::CategoryId.eq(id)))
        .add_option(filter.status.map(|s| post::Column::Status.eq(post::Status::from(s))))
        .add_option(filter.is_featured.map(|f| post::Column::IsFeatured.eq(f)));
    condition = with_date_bounds(condition, post::Column::CreatedAt, &filter.created);
    condition = with_date_bounds(condition, post::Column::PublishedAt, &filter.published);
    condition = with_count_bounds(condition, post::Column::ViewsCount, &filter.views);
    with_count_bounds(condition, post::Column::LikesCount, &filter.likes)
}

fn apply_sort(select: Select<PostEntity>, sort: PostSort) -> Select<PostEntity> {
    let order = match sort.direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    };
    let select = match sort.field {
        SortField::CreatedAt => select.order_by(post::Column::CreatedAt, order),
        SortField::UpdatedAt => select.order_by(post::Column::UpdatedAt, order),
        SortField::ViewsCount => select.order_by(post::Column::ViewsCount, order),
        SortField::LikesCount => select.order_by(post::Column::LikesCount, order),
        SortField::PublishedAt => {
            select.order_by_with_nulls(post::Column::PublishedAt, order, NullOrdering::Last)
        }
    };
    select.order_by_asc(post::Column::Id)
}

#[async_trait]
impl BaseRepository<Post, Uuid> for PostgresPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find_by_id(id)
            .one(self.db())
            .await
            .map_err(map_db_err)?;
        Ok(result.map(Into::into))
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let fresh = Post {
            views_count: 0,
            likes_count: 0,
            ..post
        };
        let model = post::ActiveModel::from(fresh)
            .insert(self.db())
            .await
            .map_err(map_db_err)?;
        Ok(model.into())
    }

    /// Counters are left out of the `UPDATE`; the stored publication stamp
    /// is read under a row lock and wins over the incoming one.
    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let txn = self.db().begin().await.map_err(map_db_err)?;

        let stored = lock_post(&txn, post.id)
            .await
            .map_err(map_db_err)?
            .ok_or(RepoError::NotFound)?;
        let published_at = settle_publication(stored.published_at.map(Into::into), post.published_at);

        let mut active = post::ActiveModel::from(post);
        active.views_count = NotSet;
        active.likes_count = NotSet;
        active.published_at = Set(published_at.map(Into::into));
        let model = active.update(&txn).await.map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let result = PostEntity::delete_by_id(id)
            .exec(self.db())
            .await
            .map_err(map_db_err)?;
        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::Slug.eq(slug))
            .one(self.db())
            .await
            .map_err(map_db_err)?;
        Ok(result.map(Into::into))
    }

    async fn search(&self, query: &PostQuery) -> Result<Page<Post>, RepoError> {
        let select = PostEntity::find()
            .join(JoinType::InnerJoin, post::Relation::Author.def())
            .filter(visibility_condition(&query.visibility))
            .filter(filter_condition(&query.filter));

        let paginator = apply_sort(select, query.sort).paginate(self.db(), query.page.page_size);
        let total = paginator.num_items().await.map_err(map_db_err)?;
        let items = paginator
            .fetch_page(query.page.page - 1)
            .await
            .map_err(map_db_err)?;

        Ok(Page::new(
            items.into_iter().map(Into::into).collect(),
            total,
            query.page,
        ))
    }

    async fn tags_of(&self, post_id: Uuid) -> Result<Vec<Tag>, RepoError> {
        let result = TagEntity::find()
            .join(JoinType::InnerJoin, tag::Relation::PostTags.def())
            .filter(post_tag::Column::PostId.eq(post_id))
            .order_by_asc(tag::Column::Name)
            .all(self.db())
            .await
            .map_err(map_db_err)?;
        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn set_tags(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepoError> {
        let txn = self.db().begin().await.map_err(map_db_err)?;

        let exists = PostEntity::find_by_id(post_id)
            .one(&txn)
            .await
            .map_err(map_db_err)?;
        if exists.is_none() {
            return Err(RepoError::NotFound);
        }

        PostTagEntity::delete_many()
            .filter(post_tag::Column::PostId.eq(post_id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;
        if !tag_ids.is_empty() {
            let rows = tag_ids.iter().map(|tag_id| post_tag::ActiveModel {
                post_id: Set(post_id),
                tag_id: Set(*tag_id),
            });
            PostTagEntity::insert_many(rows)
                .exec_without_returning(&txn)
                .await
                .map_err(map_db_err)?;
        }

        txn.commit().await.map_err(map_db_err)?;
        Ok(())
    }

    async fn record_view(&self, post_id: Uuid) -> Result<Option<u64>, RepoError> {
        let updated = PostEntity::update_many()
            .col_expr(
                post::Column::ViewsCount,
                Expr::col(post::Column::ViewsCount).add(1),
            )
            .filter(post::Column::Id.eq(post_id))
            .filter(post::Column::Status.eq(post::Status::Published))
            .exec_with_returning(self.db())
            .await
            .map_err(map_db_err)?;

        Ok(updated
            .into_iter()
            .next()
            .map(|model| from_db_count(model.views_count)))
    }

    async fn stats(&self) -> Result<PostStats, RepoError> {
        let count_status = |status: PostStatus| {
            PostEntity::find()
                .filter(post::Column::Status.eq(post::Status::from(status)))
                .count(self.db())
        };

        let total_posts = PostEntity::find()
            .count(self.db())
            .await
            .map_err(map_db_err)?;
        let published_posts = count_status(PostStatus::Published)
            .await
            .map_err(map_db_err)?;
        let draft_posts = count_status(PostStatus::Draft).await.map_err(map_db_err)?;
        let total_views: Option<i64> = PostEntity::find()
            .select_only()
            .column_as(Expr::cust("COALESCE(SUM(views_count), 0)::BIGINT"), "total_views")
            .into_tuple()
            .one(self.db())
            .await
            .map_err(map_db_err)?;

        Ok(PostStats {
            total_posts,
            published_posts,
            draft_posts,
            total_views: total_views.map(from_db_count).unwrap_or_default(),
        })
    }
}
