//! Message shapes exchanged between the authoritative store and a remote cache.
//!
//! Sync messages travel server → client only, action requests client → server
//! only. Both carry [`PROTOCOL_VERSION`]; a receiver drops any message whose
//! version differs from its own. The transport must deliver messages for one
//! owner in order and exactly once; nothing here reorders or deduplicates.

use std::fmt;
use bottomless_core::ItemStack;
use serde::{Deserialize, Serialize};
use crate::error::{AppResult, DomainError};
use crate::models::inventory::UnboundedStore;
use crate::models::types::OwnerId;

/// Version carried by every sync message and action request.
pub const PROTOCOL_VERSION: i32 = 1;

/// One (descriptor, count) pair on the wire. In an incremental sync a count
/// of 0 means "remove".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEntry {
    #[serde(with = "crate::net::codec::descriptor")]
    pub stack: ItemStack,
    pub count: u64,
}

impl SyncEntry {
    pub fn new(stack: ItemStack, count: u64) -> Self {
        Self { stack, count }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncBody {
    /// Replace the whole cache with these entries
    Full(Vec<SyncEntry>),
    /// Overwrite, insert or (count 0) remove these entries, in order
    Incremental(Vec<SyncEntry>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMessage {
    pub version: i32,
    pub body: SyncBody,
}

impl SyncMessage {
    /// Snapshot of every entry in the store.
    pub fn full(store: &UnboundedStore) -> Self {
        let entries = store
            .entries()
            .map(|e| SyncEntry::new(e.reference_stack(), e.count()))
            .collect();
        Self { version: PROTOCOL_VERSION, body: SyncBody::Full(entries) }
    }

    /// Full sync with no entries; clears the remote cache.
    pub fn empty() -> Self {
        Self { version: PROTOCOL_VERSION, body: SyncBody::Full(Vec::new()) }
    }

    pub fn incremental(entries: Vec<SyncEntry>) -> Self {
        Self { version: PROTOCOL_VERSION, body: SyncBody::Incremental(entries) }
    }

    /// Incremental sync announcing the new count of one item.
    pub fn item_changed(stack: &ItemStack, new_count: u64) -> Self {
        Self::incremental(vec![SyncEntry::new(stack.copy_with_count(1), new_count)])
    }

    pub fn item_removed(stack: &ItemStack) -> Self {
        Self::item_changed(stack, 0)
    }

    pub fn is_compatible_version(&self) -> bool {
        self.version == PROTOCOL_VERSION
    }

    pub fn entries(&self) -> &[SyncEntry] {
        match &self.body {
            SyncBody::Full(entries) | SyncBody::Incremental(entries) => entries,
        }
    }

    pub fn entry_count(&self) -> usize {
        self.entries().len()
    }

    pub fn is_full(&self) -> bool {
        matches!(self.body, SyncBody::Full(_))
    }

    pub fn kind_name(&self) -> &'static str {
        match self.body {
            SyncBody::Full(_) => "full",
            SyncBody::Incremental(_) => "incremental",
        }
    }
}

impl fmt::Display for SyncMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SyncMessage{{version={}, kind={}, entries={}}}",
            self.version,
            self.kind_name(),
            self.entry_count()
        )
    }
}

/// What the client asks the server to do with the target item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Move items from the unbounded store into the bounded inventory
    Take,
    /// Move items from the bounded inventory into the unbounded store
    Deposit,
    /// Shift-click: deposit if the item sits in a slot, otherwise take
    QuickMove,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionKind::Take => "take",
            ActionKind::Deposit => "deposit",
            ActionKind::QuickMove => "quick_move",
        })
    }
}

/// Why a request was refused before touching any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestFault {
    VersionMismatch(i32),
    EmptyStack,
    ZeroAmount,
}

impl fmt::Display for RequestFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestFault::VersionMismatch(v) => write!(f, "version {v} (expected {PROTOCOL_VERSION})"),
            RequestFault::EmptyStack => f.write_str("empty target stack"),
            RequestFault::ZeroAmount => f.write_str("amount must be positive"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub version: i32,
    pub kind: ActionKind,
    #[serde(with = "crate::net::codec::descriptor")]
    pub stack: ItemStack,
    pub amount: u64,
}

impl ActionRequest {
    pub fn new(kind: ActionKind, stack: &ItemStack, amount: u64) -> AppResult<Self> {
        if stack.is_empty() {
            return Err(DomainError::Validation {
                field: "stack",
                message: "target stack cannot be empty".to_string(),
            });
        }
        if amount == 0 {
            return Err(DomainError::Validation {
                field: "amount",
                message: "amount must be positive".to_string(),
            });
        }
        Ok(Self { version: PROTOCOL_VERSION, kind, stack: stack.clone(), amount })
    }

    pub fn take(stack: &ItemStack, amount: u64) -> AppResult<Self> {
        Self::new(ActionKind::Take, stack, amount)
    }

    pub fn deposit(stack: &ItemStack, amount: u64) -> AppResult<Self> {
        Self::new(ActionKind::Deposit, stack, amount)
    }

    pub fn quick_move(stack: &ItemStack, amount: u64) -> AppResult<Self> {
        Self::new(ActionKind::QuickMove, stack, amount)
    }

    /// Checks the request data only; game state is not consulted.
    pub fn validate(&self) -> Result<(), RequestFault> {
        if self.version != PROTOCOL_VERSION {
            return Err(RequestFault::VersionMismatch(self.version));
        }
        if self.stack.is_empty() {
            return Err(RequestFault::EmptyStack);
        }
        if self.amount == 0 {
            return Err(RequestFault::ZeroAmount);
        }
        Ok(())
    }
}

impl fmt::Display for ActionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ActionRequest{{version={}, kind={}, item={}, amount={}}}",
            self.version, self.kind, self.stack.item, self.amount
        )
    }
}

/// Payloads a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientFrame {
    /// First frame of every connection
    Hello { owner: OwnerId },
    Action(ActionRequest),
}
