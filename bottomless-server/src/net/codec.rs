//! Binary layout of protocol payloads.
//!
//! Messages are bincode (varint integers, little endian, no trailing bytes)
//! bounded by [`MAX_FRAME_BYTES`]. Item descriptors travel as a byte string
//! holding the encoded stack; an empty string is the empty stack.

use bincode::Options;
use bytes::Bytes;
use thiserror::Error;
use crate::hardening::{MAX_FRAME_BYTES, MAX_SYNC_ENTRIES};
use crate::net::protocol::{ClientFrame, SyncBody, SyncEntry, SyncMessage};

/// Room left in a frame for the version, the kind and the entry count.
const SYNC_HEADER_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum WireError {
    #[error(transparent)]
    Encoding(#[from] bincode::Error),

    #[error("too many entries: {0}")]
    TooManyEntries(usize),

    #[error("entry of {0} bytes does not fit in a frame")]
    EntryTooLarge(usize),
}

pub type WireResult<T> = Result<T, WireError>;

fn wire() -> impl Options {
    bincode::DefaultOptions::new().with_limit(MAX_FRAME_BYTES as u64)
}

/// Serde adapter for item stacks inside protocol messages.
pub mod descriptor {
    use std::fmt;
    use bottomless_core::{ItemStack, decode_stack, encode_stack};
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer, ser};
    use crate::hardening::MAX_DESCRIPTOR_BYTES;

    pub fn serialize<S>(stack: &ItemStack, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if stack.is_empty() {
            return serializer.serialize_bytes(&[]);
        }
        let bytes = encode_stack(stack).map_err(<S::Error as ser::Error>::custom)?;
        serializer.serialize_bytes(&bytes)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<ItemStack, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_byte_buf(DescriptorVisitor)
    }

    struct DescriptorVisitor;

    impl<'de> Visitor<'de> for DescriptorVisitor {
        type Value = ItemStack;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "an item descriptor of at most {MAX_DESCRIPTOR_BYTES} bytes")
        }

        fn visit_bytes<E>(self, bytes: &[u8]) -> Result<ItemStack, E>
        where
            E: de::Error,
        {
            if bytes.is_empty() {
                return Ok(ItemStack::empty());
            }
            if bytes.len() > MAX_DESCRIPTOR_BYTES {
                return Err(E::custom(format!("descriptor too large: {} bytes", bytes.len())));
            }
            decode_stack(bytes).map_err(E::custom)
        }

        fn visit_byte_buf<E>(self, bytes: Vec<u8>) -> Result<ItemStack, E>
        where
            E: de::Error,
        {
            self.visit_bytes(&bytes)
        }
    }
}

// ---------------------------------------------------------------------------
// sync messages

/// Encodes one sync message as one frame payload.
///
/// Refuses messages that a receiver would reject; use [`encode_sync_frames`]
/// for messages of arbitrary size.
pub fn encode_sync(msg: &SyncMessage) -> WireResult<Bytes> {
    if msg.entry_count() > MAX_SYNC_ENTRIES {
        return Err(WireError::TooManyEntries(msg.entry_count()));
    }
    Ok(Bytes::from(wire().serialize(msg)?))
}

pub fn decode_sync(buf: &[u8]) -> WireResult<SyncMessage> {
    let msg: SyncMessage = wire().deserialize(buf)?;
    if msg.entry_count() > MAX_SYNC_ENTRIES {
        return Err(WireError::TooManyEntries(msg.entry_count()));
    }
    Ok(msg)
}

/// Splits a sync message into messages holding at most `max_entries` entries
/// and encoding to at most `max_bytes` each.
///
/// A full sync becomes a full sync of the first chunk followed by incremental
/// syncs inserting the rest, so applying them in order rebuilds the same cache.
pub fn split_sync(msg: &SyncMessage, max_entries: usize, max_bytes: usize) -> WireResult<Vec<SyncMessage>> {
    let max_entries = max_entries.max(1);
    let mut chunks: Vec<Vec<SyncEntry>> = Vec::new();
    let mut current = Vec::new();
    let mut current_bytes = SYNC_HEADER_BYTES;

    for entry in msg.entries() {
        let size = wire().serialized_size(entry)? as usize;
        if size + SYNC_HEADER_BYTES > max_bytes {
            return Err(WireError::EntryTooLarge(size));
        }
        if !current.is_empty() && (current.len() == max_entries || current_bytes + size > max_bytes) {
            chunks.push(std::mem::take(&mut current));
            current_bytes = SYNC_HEADER_BYTES;
        }
        current_bytes += size;
        current.push(entry.clone());
    }
    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }

    let full = msg.is_full();
    Ok(chunks
        .into_iter()
        .enumerate()
        .map(|(i, entries)| {
            let body = if i == 0 && full { SyncBody::Full(entries) } else { SyncBody::Incremental(entries) };
            SyncMessage { version: msg.version, body }
        })
        .collect())
}

/// Frame payloads for a sync message of any size, in send order.
pub fn encode_sync_frames(msg: &SyncMessage) -> WireResult<Vec<Bytes>> {
    if msg.entry_count() <= MAX_SYNC_ENTRIES {
        if let Ok(payload) = wire().serialize(msg) {
            return Ok(vec![Bytes::from(payload)]);
        }
    }

    let parts = split_sync(msg, MAX_SYNC_ENTRIES, MAX_FRAME_BYTES)?;
    tracing::debug!(entries = msg.entry_count(), frames = parts.len(), "sync split across frames");
    parts.iter().map(encode_sync).collect()
}

// ---------------------------------------------------------------------------
// client frames

pub fn encode_client_frame(frame: &ClientFrame) -> WireResult<Bytes> {
    Ok(Bytes::from(wire().serialize(frame)?))
}

pub fn decode_client_frame(buf: &[u8]) -> WireResult<ClientFrame> {
    Ok(wire().deserialize(buf)?)
}
