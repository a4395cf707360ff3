//! # Scribe Core
//!
//! The domain layer of the Scribe blog API.
//! This crate contains the business rules (visibility, ownership, derived
//! counters, filtering) with zero infrastructure dependencies. Storage and
//! credentials are reached through the traits in [`ports`].

pub mod authz;
pub mod counters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod query;
pub mod services;

pub use authz::{Actor, Visibility};
pub use error::DomainError;
pub use services::BlogService;
