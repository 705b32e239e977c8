//! Versioned durable record of an [`UnboundedStore`].
//!
//! Record layout, one per owner:
//!
//! ```json
//! { "Version": 1, "Items": [ { "Descriptor": { ... }, "Count": 1234 } ] }
//! ```
//!
//! Encoding skips entries it cannot write; decoding skips entries it cannot
//! read. Neither direction ever fails as a whole.

use std::borrow::Cow;
use bottomless_core::{CodecError, ItemStack, stack_from_value, stack_to_value};
use serde_json::{Map, Value};
use thiserror::Error;
use crate::models::inventory::{StoreEntry, UnboundedStore};

/// Current record format version. Bump when the layout changes and add a
/// migration step in [`StorePersistence::migrate`].
pub const STORE_FORMAT_VERSION: i32 = 1;

const KEY_VERSION: &str = "Version";
const KEY_ITEMS: &str = "Items";
const KEY_DESCRIPTOR: &str = "Descriptor";
const KEY_COUNT: &str = "Count";

/// Why a single record entry could not be written or read.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("entry is not an object")]
    NotAnObject,

    #[error("missing descriptor")]
    MissingDescriptor,

    #[error("missing count")]
    MissingCount,

    #[error("invalid count: {0}")]
    InvalidCount(Value),

    #[error("empty descriptor")]
    EmptyDescriptor,

    #[error(transparent)]
    Descriptor(#[from] CodecError),
}

/// Outcome counters of a bulk decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeReport {
    pub version: i32,
    pub loaded: usize,
    pub skipped: usize,
}

pub struct StorePersistence;

impl StorePersistence {
    /// Encode the whole store. Entries that fail to encode are logged and left out.
    pub fn encode(store: &UnboundedStore) -> Value {
        let mut items = Vec::with_capacity(store.unique_item_count());
        for entry in store.entries() {
            match Self::encode_entry(entry) {
                Ok(v) => items.push(v),
                Err(e) => tracing::error!(%entry, error = %e, "failed to encode store entry, skipping"),
            }
        }

        let mut record = Map::new();
        record.insert(KEY_VERSION.to_string(), Value::from(STORE_FORMAT_VERSION));
        record.insert(KEY_ITEMS.to_string(), Value::Array(items));
        Value::Object(record)
    }

    pub fn encode_entry(entry: &StoreEntry) -> Result<Value, EntryError> {
        if entry.is_empty() {
            return Err(EntryError::InvalidCount(Value::from(0u64)));
        }

        let descriptor = stack_to_value(entry.reference())?;
        let mut obj = Map::new();
        obj.insert(KEY_DESCRIPTOR.to_string(), descriptor);
        obj.insert(KEY_COUNT.to_string(), Value::from(entry.count()));
        Ok(Value::Object(obj))
    }

    /// Decode a record. A missing or malformed record yields an empty store.
    pub fn decode(record: Option<&Value>) -> UnboundedStore {
        Self::decode_with_report(record).0
    }

    pub fn decode_with_report(record: Option<&Value>) -> (UnboundedStore, DecodeReport) {
        let mut store = UnboundedStore::new();
        let mut report = DecodeReport::default();

        let Some(record) = record else {
            tracing::debug!("no stored record, starting with an empty store");
            return (store, report);
        };
        let Some(obj) = record.as_object() else {
            tracing::warn!("stored record is not an object, starting with an empty store");
            return (store, report);
        };

        let version = obj
            .get(KEY_VERSION)
            .and_then(Value::as_i64)
            .and_then(|v| i32::try_from(v).ok())
            .unwrap_or(0);
        report.version = version;

        if version > STORE_FORMAT_VERSION {
            tracing::warn!(
                version,
                current = STORE_FORMAT_VERSION,
                "loading store from a newer format version, some data may be lost"
            );
        }

        let record = if version > 0 && version < STORE_FORMAT_VERSION {
            tracing::info!(version, current = STORE_FORMAT_VERSION, "loading store from an older format version");
            Self::migrate(version, record)
        } else {
            Cow::Borrowed(record)
        };

        let Some(items) = record.get(KEY_ITEMS) else {
            tracing::warn!("stored record has no items list, starting with an empty store");
            return (store, report);
        };
        let Some(items) = items.as_array() else {
            tracing::warn!("stored items are not a list, starting with an empty store");
            return (store, report);
        };

        for (index, item) in items.iter().enumerate() {
            match Self::decode_entry(item) {
                Ok((stack, count)) => {
                    // add_item aggregates duplicate identities instead of overwriting
                    store.add_item(&stack, count);
                    report.loaded += 1;
                }
                Err(e) => {
                    tracing::warn!(index, error = %e, "skipping unreadable store entry");
                    report.skipped += 1;
                }
            }
        }

        if report.skipped > 0 {
            tracing::warn!(loaded = report.loaded, skipped = report.skipped, "store loaded with skipped entries");
        } else {
            tracing::debug!(loaded = report.loaded, "store loaded");
        }

        (store, report)
    }

    pub fn decode_entry(item: &Value) -> Result<(ItemStack, u64), EntryError> {
        let obj = item.as_object().ok_or(EntryError::NotAnObject)?;
        let descriptor = obj.get(KEY_DESCRIPTOR).ok_or(EntryError::MissingDescriptor)?;
        let count = obj.get(KEY_COUNT).ok_or(EntryError::MissingCount)?;

        let count = match count.as_u64() {
            Some(n) if n > 0 => n,
            _ => return Err(EntryError::InvalidCount(count.clone())),
        };

        let stack = stack_from_value(descriptor)?;
        if stack.is_empty() {
            return Err(EntryError::EmptyDescriptor);
        }

        Ok((stack, count))
    }

    /// Upgrade an older record layout to the current one. Version 1 is the
    /// first layout, so there is nothing to rewrite yet.
    fn migrate(from: i32, record: &Value) -> Cow<'_, Value> {
        tracing::debug!(from, to = STORE_FORMAT_VERSION, "no migration steps registered");
        Cow::Borrowed(record)
    }

    pub fn to_bytes(store: &UnboundedStore) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&Self::encode(store))
    }

    /// Decode from bytes. Unparseable input yields an empty store.
    pub fn from_bytes(bytes: &[u8]) -> UnboundedStore {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(record) => Self::decode(Some(&record)),
            Err(e) => {
                tracing::warn!(error = %e, "stored record is not valid json, starting with an empty store");
                UnboundedStore::new()
            }
        }
    }
}
