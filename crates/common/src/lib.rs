//! Shared identifier types used by both the catalog (write) and
//! search (read) services.

mod types;

pub use types::{ProductId, UserId};
