//! Database connection management and PostgreSQL repositories.

mod connections;

#[cfg(feature = "postgres")]
pub mod entity;
#[cfg(feature = "postgres")]
mod likes;
#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
mod postgres_repo;
#[cfg(feature = "postgres")]
mod posts;

pub use connections::{DatabaseConfig, DatabaseConnections, NamedConnection, SecondaryDbConfig};

#[cfg(feature = "postgres")]
pub use likes::PostgresLikeRepository;
#[cfg(feature = "postgres")]
pub use postgres_base::PostgresBaseRepository;
#[cfg(feature = "postgres")]
pub use postgres_repo::{
    PostgresCategoryRepository, PostgresCommentRepository, PostgresTagRepository,
    PostgresUserRepository,
};
#[cfg(feature = "postgres")]
pub use posts::PostgresPostRepository;

#[cfg(feature = "postgres")]
use scribe_core::error::RepoError;

/// Translate a SeaORM error into the port-level error.
///
/// Unique and foreign-key violations become `Constraint`, so a racing
/// duplicate insert reads the same as one caught by a pre-check.
#[cfg(feature = "postgres")]
pub(crate) fn map_db_err(err: sea_orm::DbErr) -> RepoError {
    use sea_orm::{DbErr, SqlErr};

    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => {
            return RepoError::Constraint(format!("Duplicate value: {msg}"));
        }
        Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
            return RepoError::Constraint(format!("Referenced row missing: {msg}"));
        }
        _ => {}
    }

    match err {
        DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => RepoError::NotFound,
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => RepoError::Connection(err.to_string()),
        other => RepoError::Query(other.to_string()),
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
#[cfg(feature = "postgres")]
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
