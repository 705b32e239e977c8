use chrono::{DateTime, Utc};
use crate::models::bounded::PlayerInventory;
use crate::models::inventory::UnboundedStore;
use crate::models::types::OwnerId;
use crate::net::output::SyncOutlet;
use crate::net::protocol::SyncMessage;

/// Everything the server holds for one online owner.
#[derive(Debug)]
pub struct Session {
    pub owner: OwnerId,
    /// Authoritative unbounded store
    pub store: UnboundedStore,
    /// Bounded inventory the store exchanges items with
    pub inventory: PlayerInventory,
    /// Sync messages to this owner's connection
    pub outlet: SyncOutlet,
    pub joined_at: DateTime<Utc>,
    /// Store changed since the last save
    pub dirty: bool,
}

impl Session {
    pub fn new(owner: OwnerId, store: UnboundedStore, outlet: SyncOutlet) -> Self {
        Self {
            owner,
            store,
            inventory: PlayerInventory::new(),
            outlet,
            joined_at: Utc::now(),
            dirty: false,
        }
    }

    /// Push the whole store to the client.
    pub fn send_full(&self) {
        self.outlet.send(SyncMessage::full(&self.store));
    }
}
