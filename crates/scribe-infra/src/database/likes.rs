//! PostgreSQL like repository.
//!
//! Every mutation runs in one transaction: lock the post row, write the like
//! row, count its likes, store the count. The post lock is taken before the
//! like row is written. Inserting a like holds `FOR KEY SHARE` on the post
//! through the foreign key, so upgrading to a row lock afterwards would
//! deadlock two concurrent likers. `FOR NO KEY UPDATE` also leaves those
//! foreign-key checks unblocked. The unique index on (user_id, post_id) turns
//! a racing second insert into `Constraint`.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbConn, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use scribe_core::domain::Like;
use scribe_core::error::RepoError;
use scribe_core::ports::LikeRepository;

use super::entity::like::{self, Entity as LikeEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::to_db_count;
use super::map_db_err;

/// Take the row lock that serializes counter writes on one post.
///
/// Returns the locked row, or `None` when the post does not exist.
pub(crate) async fn lock_post<C>(conn: &C, post_id: Uuid) -> Result<Option<post::Model>, DbErr>
where
    C: ConnectionTrait,
{
    PostEntity::find_by_id(post_id)
        .lock(LockType::NoKeyUpdate)
        .one(conn)
        .await
}

/// Recompute `likes_count` of one post from its like rows.
///
/// The caller must already hold [`lock_post`] on `post_id`.
pub(crate) async fn recount_likes<C>(conn: &C, post_id: Uuid) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    let count = LikeEntity::find()
        .filter(like::Column::PostId.eq(post_id))
        .count(conn)
        .await?;
    PostEntity::update_many()
        .col_expr(post::Column::LikesCount, Expr::value(to_db_count(count)))
        .filter(post::Column::Id.eq(post_id))
        .exec(conn)
        .await?;

    Ok(count)
}

pub struct PostgresLikeRepository {
    db: Arc<DbConn>,
}

impl PostgresLikeRepository {
    pub fn new(db: impl Into<Arc<DbConn>>) -> Self {
        Self { db: db.into() }
    }

    fn db(&self) -> &DbConn {
        &self.db
    }
}

#[async_trait]
impl LikeRepository for PostgresLikeRepository {
    async fn find(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<Like>, RepoError> {
        let result = LikeEntity::find()
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::PostId.eq(post_id))
            .one(self.db())
            .await
            .map_err(map_db_err)?;
        Ok(result.map(Into::into))
    }

    async fn create(&self, like: Like) -> Result<(Like, u64), RepoError> {
        let post_id = like.post_id;
        let txn = self.db().begin().await.map_err(map_db_err)?;

        lock_post(&txn, post_id)
            .await
            .map_err(map_db_err)?
            .ok_or(RepoError::NotFound)?;
        let model = like::ActiveModel::from(like)
            .insert(&txn)
            .await
            .map_err(map_db_err)?;
        let count = recount_likes(&txn, post_id).await.map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;
        Ok((model.into(), count))
    }

    async fn remove(&self, user_id: Uuid, post_id: Uuid) -> Result<u64, RepoError> {
        let txn = self.db().begin().await.map_err(map_db_err)?;

        if lock_post(&txn, post_id).await.map_err(map_db_err)?.is_none() {
            return Ok(0);
        }
        LikeEntity::delete_many()
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::PostId.eq(post_id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;
        let count = recount_likes(&txn, post_id).await.map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;
        Ok(count)
    }

    async fn count_all(&self) -> Result<u64, RepoError> {
        LikeEntity::find().count(self.db()).await.map_err(map_db_err)
    }
}
