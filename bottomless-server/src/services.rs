mod action;
mod persistence;
mod rate_limit;
mod store;

pub use action::{ActionOutcome, ActionPipeline};
pub use persistence::{DecodeReport, EntryError, STORE_FORMAT_VERSION, StorePersistence};
pub use rate_limit::RateLimiter;
pub use store::StoreService;
