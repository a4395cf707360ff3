//! PostgreSQL repositories for users, taxonomy and comments.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, Query, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, DbConn, EntityTrait, JoinType, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, TransactionTrait,
};
use uuid::Uuid;

use scribe_core::domain::{Category, Comment, Tag, User};
use scribe_core::error::RepoError;
use scribe_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, TagRepository, UserRepository, UserStats,
};
use scribe_core::query::{Page, PageRequest, SortDirection, TaxonomyField, TaxonomyQuery};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::like::{self, Entity as LikeEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_tag;
use super::entity::tag::{self, Entity as TagEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::likes::{lock_post, recount_likes};
use super::postgres_base::PostgresBaseRepository;
use super::{like_pattern, map_db_err};

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<CategoryEntity>;

/// PostgreSQL tag repository.
pub type PostgresTagRepository = PostgresBaseRepository<TagEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// Mask the local part of an email so logs carry no PII.
fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => match local.chars().next() {
            Some(first) if local.chars().count() > 1 => format!("{first}***@{domain}"),
            _ => format!("***@{domain}"),
        },
        None => "***".to_string(),
    }
}

/// PostgreSQL user repository.
///
/// Deletion runs in a transaction so the like counters of posts the user had
/// liked are recomputed together with the cascade.
pub struct PostgresUserRepository {
    base: PostgresBaseRepository<UserEntity>,
}

impl PostgresUserRepository {
    pub fn new(db: impl Into<Arc<DbConn>>) -> Self {
        Self {
            base: PostgresBaseRepository::new(db),
        }
    }

    fn db(&self) -> &DbConn {
        self.base.db()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for PostgresUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        BaseRepository::<User, Uuid>::find_by_id(&self.base, id).await
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        BaseRepository::<User, Uuid>::insert(&self.base, user).await
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        BaseRepository::<User, Uuid>::update(&self.base, user).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let txn = self.db().begin().await.map_err(map_db_err)?;

        let mut liked: Vec<Uuid> = LikeEntity::find()
            .select_only()
            .column(like::Column::PostId)
            .filter(like::Column::UserId.eq(id))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(map_db_err)?;
        // Lock in id order.
        liked.sort_unstable();
        liked.dedup();
        for post_id in &liked {
            lock_post(&txn, *post_id).await.map_err(map_db_err)?;
        }

        let result = UserEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(map_db_err)?;
        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        for post_id in liked {
            recount_likes(&txn, post_id).await.map_err(map_db_err)?;
        }
        txn.commit().await.map_err(map_db_err)?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db())
            .await
            .map_err(map_db_err)?;
        Ok(result.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db())
            .await
            .map_err(map_db_err)?;
        Ok(result.map(Into::into))
    }

    async fn list(&self, search: Option<&str>, page: PageRequest) -> Result<Page<User>, RepoError> {
        let mut select = UserEntity::find();
        if let Some(term) = search {
            let pattern = like_pattern(term);
            select = select.filter(
                Condition::any()
                    .add(Expr::col(user::Column::Username).ilike(pattern.as_str()))
                    .add(Expr::col(user::Column::FirstName).ilike(pattern.as_str()))
                    .add(Expr::col(user::Column::LastName).ilike(pattern.as_str()))
                    .add(Expr::col(user::Column::Email).ilike(pattern.as_str())),
            );
        }

        let paginator = select
            .order_by_desc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
            .paginate(self.db(), page.page_size);
        let total = paginator.num_items().await.map_err(map_db_err)?;
        let items = paginator
            .fetch_page(page.page - 1)
            .await
            .map_err(map_db_err)?;

        Ok(Page::new(items.into_iter().map(Into::into).collect(), total, page))
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), RepoError> {
        let result = UserEntity::update_many()
            .col_expr(
                user::Column::LastLogin,
                Expr::value(Some(sea_orm::prelude::DateTimeWithTimeZone::from(at))),
            )
            .filter(user::Column::Id.eq(id))
            .exec(self.db())
            .await
            .map_err(map_db_err)?;
        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn count_posts(&self, id: Uuid) -> Result<u64, RepoError> {
        PostEntity::find()
            .filter(post::Column::AuthorId.eq(id))
            .count(self.db())
            .await
            .map_err(map_db_err)
    }

    async fn stats(&self, active_since: DateTime<Utc>) -> Result<UserStats, RepoError> {
        let db = self.db();
        let total_users = UserEntity::find().count(db).await.map_err(map_db_err)?;
        let verified_users = UserEntity::find()
            .filter(user::Column::IsVerified.eq(true))
            .count(db)
            .await
            .map_err(map_db_err)?;
        let active_since: sea_orm::prelude::DateTimeWithTimeZone = active_since.into();
        let active_users = UserEntity::find()
            .filter(user::Column::LastLogin.gte(active_since))
            .count(db)
            .await
            .map_err(map_db_err)?;

        Ok(UserStats {
            total_users,
            verified_users,
            active_users,
        })
    }
}

fn order_of(direction: SortDirection) -> Order {
    match direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    }
}

/// `(SELECT COUNT(posts.id) FROM posts ... WHERE <link> AND status = 'published')`,
/// correlated with the outer row through `link`.
fn published_count_expr(link: SimpleExpr, via_tags: bool) -> SimpleExpr {
    let mut select = Query::select();
    select
        .expr(Expr::col((PostEntity, post::Column::Id)).count())
        .from(PostEntity);
    if via_tags {
        select.inner_join(
            post_tag::Entity,
            Expr::col((post_tag::Entity, post_tag::Column::PostId)).equals((PostEntity, post::Column::Id)),
        );
    }
    select
        .and_where(link)
        .and_where(post::Column::Status.eq(post::Status::Published));
    SimpleExpr::SubQuery(None, Box::new(select.to_owned().into_sub_query_statement()))
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn list(&self, query: &TaxonomyQuery) -> Result<Page<Category>, RepoError> {
        let mut select = CategoryEntity::find();
        if let Some(term) = &query.search {
            let pattern = like_pattern(term);
            select = select.filter(
                Condition::any()
                    .add(Expr::col(category::Column::Name).ilike(pattern.as_str()))
                    .add(Expr::col(category::Column::Description).ilike(pattern.as_str())),
            );
        }

        let order = order_of(query.sort.direction);
        let select = match query.sort.field {
            TaxonomyField::Name => select.order_by(category::Column::Name, order),
            TaxonomyField::CreatedAt => select.order_by(category::Column::CreatedAt, order),
            TaxonomyField::PostCount => select.order_by(
                published_count_expr(
                    Expr::col((PostEntity, post::Column::CategoryId))
                        .equals((CategoryEntity, category::Column::Id)),
                    false,
                ),
                order,
            ),
        };

        let paginator = select
            .order_by_asc(category::Column::Id)
            .paginate(self.db(), query.page.page_size);
        let total = paginator.num_items().await.map_err(map_db_err)?;
        let items = paginator
            .fetch_page(query.page.page - 1)
            .await
            .map_err(map_db_err)?;

        Ok(Page::new(items.into_iter().map(Into::into).collect(), total, query.page))
    }

    async fn published_post_count(&self, id: Uuid) -> Result<u64, RepoError> {
        PostEntity::find()
            .filter(post::Column::CategoryId.eq(id))
            .filter(post::Column::Status.eq(post::Status::Published))
            .count(self.db())
            .await
            .map_err(map_db_err)
    }
}

#[async_trait]
impl TagRepository for PostgresTagRepository {
    async fn list(&self, query: &TaxonomyQuery) -> Result<Page<Tag>, RepoError> {
        let mut select = TagEntity::find();
        if let Some(term) = &query.search {
            select = select.filter(Expr::col(tag::Column::Name).ilike(like_pattern(term).as_str()));
        }

        let order = order_of(query.sort.direction);
        let select = match query.sort.field {
            TaxonomyField::Name => select.order_by(tag::Column::Name, order),
            TaxonomyField::CreatedAt => select.order_by(tag::Column::CreatedAt, order),
            TaxonomyField::PostCount => select.order_by(
                published_count_expr(
                    Expr::col((post_tag::Entity, post_tag::Column::TagId))
                        .equals((TagEntity, tag::Column::Id)),
                    true,
                ),
                order,
            ),
        };

        let paginator = select
            .order_by_asc(tag::Column::Id)
            .paginate(self.db(), query.page.page_size);
        let total = paginator.num_items().await.map_err(map_db_err)?;
        let items = paginator
            .fetch_page(query.page.page - 1)
            .await
            .map_err(map_db_err)?;

        Ok(Page::new(items.into_iter().map(Into::into).collect(), total, query.page))
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Tag>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let result = TagEntity::find()
            .filter(tag::Column::Id.is_in(ids.iter().copied()))
            .all(self.db())
            .await
            .map_err(map_db_err)?;
        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn published_post_count(&self, id: Uuid) -> Result<u64, RepoError> {
        PostEntity::find()
            .join(JoinType::InnerJoin, post::Relation::PostTags.def())
            .filter(post_tag::Column::TagId.eq(id))
            .filter(post::Column::Status.eq(post::Status::Published))
            .count(self.db())
            .await
            .map_err(map_db_err)
    }
}

fn approved_filter(approved_only: bool) -> Condition {
    let condition = Condition::all();
    if approved_only {
        condition.add(comment::Column::IsApproved.eq(true))
    } else {
        condition
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn list(
        &self,
        post_id: Option<Uuid>,
        is_approved: Option<bool>,
        page: PageRequest,
    ) -> Result<Page<Comment>, RepoError> {
        let condition = Condition::all()
            .add_option(post_id.map(|id| comment::Column::PostId.eq(id)))
            .add_option(is_approved.map(|a| comment::Column::IsApproved.eq(a)));

        let paginator = CommentEntity::find()
            .filter(condition)
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .paginate(self.db(), page.page_size);
        let total = paginator.num_items().await.map_err(map_db_err)?;
        let items = paginator
            .fetch_page(page.page - 1)
            .await
            .map_err(map_db_err)?;

        Ok(Page::new(items.into_iter().map(Into::into).collect(), total, page))
    }

    async fn for_post(&self, post_id: Uuid, approved_only: bool) -> Result<Vec<Comment>, RepoError> {
        let result = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .filter(approved_filter(approved_only))
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(self.db())
            .await
            .map_err(map_db_err)?;
        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn replies(&self, parent_id: Uuid, approved_only: bool) -> Result<Vec<Comment>, RepoError> {
        let result = CommentEntity::find()
            .filter(comment::Column::ParentId.eq(parent_id))
            .filter(approved_filter(approved_only))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(self.db())
            .await
            .map_err(map_db_err)?;
        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn count_for_post(&self, post_id: Uuid, approved_only: bool) -> Result<u64, RepoError> {
        CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .filter(approved_filter(approved_only))
            .count(self.db())
            .await
            .map_err(map_db_err)
    }

    async fn count_replies(&self, parent_id: Uuid) -> Result<u64, RepoError> {
        CommentEntity::find()
            .filter(comment::Column::ParentId.eq(parent_id))
            .count(self.db())
            .await
            .map_err(map_db_err)
    }

    async fn count_approved(&self) -> Result<u64, RepoError> {
        CommentEntity::find()
            .filter(comment::Column::IsApproved.eq(true))
            .count(self.db())
            .await
            .map_err(map_db_err)
    }
}

#[cfg(test)]
mod tests {
    use super::mask_email;

    #[test]
    fn test_mask_email_hides_local_part() {
        assert_eq!(mask_email("jane@example.com"), "j***@example.com");
        assert_eq!(mask_email("j@example.com"), "***@example.com");
        assert_eq!(mask_email("not-an-email"), "***");
    }
}
