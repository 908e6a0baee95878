//! Wire format.
//!
//! Requests are single UTF-8 frames of the form `<COMMAND>,<payload>`, split on
//! the first comma. Replies are single JSON objects tagged by `type`.

mod reply;
mod request;

pub use reply::Reply;
pub use request::{Command, Request};
