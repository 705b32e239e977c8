pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod hardening;
pub mod models;
pub mod net;
pub mod services;
pub mod state;

// Convenient re-exports (so call sites can do `bottomless_server::Registry`, etc.)
pub use client::{ClientCache, ClientLink};
pub use net::protocol::{ActionKind, ActionRequest, PROTOCOL_VERSION, SyncMessage};
pub use state::{registry::Registry, session::Session};
