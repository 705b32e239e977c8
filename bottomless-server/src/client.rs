//! Client side of the replication protocol.

pub mod cache;
pub mod link;

pub use cache::{CachedEntry, ClientCache};
pub use link::ClientLink;
