//! SeaORM entities, one per table created by the migration crate.

pub mod category;
pub mod comment;
pub mod like;
pub mod post;
pub mod post_tag;
pub mod tag;
pub mod user;

/// Counters are unsigned in the domain and `BIGINT` in storage.
pub(crate) fn to_db_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

pub(crate) fn from_db_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}
