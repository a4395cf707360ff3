//! # Scribe Shared
//!
//! Wire types shared between the API server and its clients: request and
//! response DTOs plus RFC 7807 error bodies. Nothing here knows about the
//! domain crate, so clients can depend on it alone.

pub mod dto;
pub mod response;

pub use response::{ErrorResponse, PaginatedResponse};
