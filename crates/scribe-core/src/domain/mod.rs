//! Domain entities - the core business objects.

mod category;
mod comment;
mod like;
mod post;
mod slug;
mod tag;
mod user;

pub use category::Category;
pub use comment::Comment;
pub use like::Like;
pub use post::{Post, PostStatus};
pub use slug::{is_valid_slug, slugify};
pub use tag::Tag;
pub use user::User;
