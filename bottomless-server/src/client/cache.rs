use std::collections::HashMap;
use std::fmt;
use bottomless_core::{ItemKey, ItemStack};
use crate::net::protocol::{PROTOCOL_VERSION, SyncBody, SyncEntry, SyncMessage};

/// Cached view of one stored item type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEntry {
    /// Reference stack, count 1
    pub stack: ItemStack,
    pub count: u64,
}

/// Read-only mirror of an owner's store, kept current by sync messages.
///
/// Mutation goes through `&mut self`, so the cache has exactly one writer:
/// whoever owns it, normally the presentation thread.
#[derive(Debug, Default)]
pub struct ClientCache {
    entries: HashMap<ItemKey, CachedEntry>,
}

impl ClientCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one message. Returns false if it was dropped for a version mismatch.
    pub fn apply(&mut self, msg: &SyncMessage) -> bool {
        if msg.version != PROTOCOL_VERSION {
            tracing::warn!(got = msg.version, expected = PROTOCOL_VERSION, "dropping sync with mismatched version");
            return false;
        }

        match &msg.body {
            SyncBody::Full(entries) => {
                self.entries.clear();
                for entry in entries {
                    if entry.count == 0 {
                        continue;
                    }
                    let Some(key) = key_for(&entry.stack) else { continue };
                    self.entries.insert(key, cached(entry));
                }
                tracing::debug!(entries = self.entries.len(), "full sync applied");
            }
            SyncBody::Incremental(entries) => {
                for entry in entries {
                    let Some(key) = key_for(&entry.stack) else { continue };
                    if entry.count == 0 {
                        self.entries.remove(&key);
                    } else {
                        self.entries
                            .entry(key)
                            .and_modify(|e| e.count = entry.count)
                            .or_insert_with(|| cached(entry));
                    }
                }
            }
        }
        true
    }

    pub fn count(&self, stack: &ItemStack) -> u64 {
        key_for(stack)
            .and_then(|k| self.entries.get(&k))
            .map(|e| e.count)
            .unwrap_or(0)
    }

    pub fn contains(&self, stack: &ItemStack) -> bool {
        self.count(stack) > 0
    }

    pub fn all_entries(&self) -> Vec<CachedEntry> {
        self.entries.values().cloned().collect()
    }

    /// Entries ordered by type id, then by components, for stable display.
    pub fn sorted_entries(&self) -> Vec<CachedEntry> {
        let mut keyed: Vec<(&ItemKey, &CachedEntry)> = self.entries.iter().collect();
        keyed.sort_by(|(ka, a), (kb, b)| {
            ka.display_key()
                .cmp(kb.display_key())
                .then_with(|| a.stack.components.to_string().cmp(&b.stack.components.to_string()))
        });
        keyed.into_iter().map(|(_, e)| e.clone()).collect()
    }

    pub fn unique_item_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

fn key_for(stack: &ItemStack) -> Option<ItemKey> {
    ItemKey::new(stack).ok()
}

fn cached(entry: &SyncEntry) -> CachedEntry {
    CachedEntry {
        stack: entry.stack.copy_with_count(1),
        count: entry.count,
    }
}

impl fmt::Display for ClientCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientCache{{unique={}}}", self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bottomless_core::ItemTypeId;

    fn stack(id: &str) -> ItemStack {
        ItemStack::new(ItemTypeId::parse(id).unwrap(), 1)
    }

    fn full(entries: Vec<(ItemStack, u64)>) -> SyncMessage {
        SyncMessage {
            version: PROTOCOL_VERSION,
            body: SyncBody::Full(entries.into_iter().map(|(s, c)| SyncEntry::new(s, c)).collect()),
        }
    }

    #[test]
    fn full_replaces_everything() {
        let mut cache = ClientCache::new();
        cache.apply(&full(vec![(stack("minecraft:sand"), 3)]));
        cache.apply(&full(vec![(stack("minecraft:glass"), 8)]));

        assert!(!cache.contains(&stack("minecraft:sand")));
        assert_eq!(cache.count(&stack("minecraft:glass")), 8);
        assert_eq!(cache.unique_item_count(), 1);
    }

    #[test]
    fn full_skips_invalid_pairs() {
        let mut cache = ClientCache::new();
        cache.apply(&full(vec![
            (stack("minecraft:sand"), 0),
            (ItemStack::empty(), 5),
            (stack("minecraft:glass"), 2),
        ]));
        assert_eq!(cache.unique_item_count(), 1);
    }

    #[test]
    fn incremental_overwrites_inserts_and_removes_in_order() {
        let mut cache = ClientCache::new();
        cache.apply(&full(vec![(stack("minecraft:sand"), 3)]));

        cache.apply(&SyncMessage::incremental(vec![
            SyncEntry::new(stack("minecraft:sand"), 10),
            SyncEntry::new(stack("minecraft:glass"), 4),
            SyncEntry::new(stack("minecraft:glass"), 0),
            SyncEntry::new(stack("minecraft:clay"), 0),
        ]));

        // overwrite, not add
        assert_eq!(cache.count(&stack("minecraft:sand")), 10);
        assert!(!cache.contains(&stack("minecraft:glass")));
        assert!(!cache.contains(&stack("minecraft:clay")));
    }

    #[test]
    fn mismatched_version_is_ignored_whole() {
        let mut cache = ClientCache::new();
        cache.apply(&full(vec![(stack("minecraft:sand"), 3)]));

        let mut msg = SyncMessage::empty();
        msg.version = PROTOCOL_VERSION + 1;
        assert!(!cache.apply(&msg));
        assert_eq!(cache.count(&stack("minecraft:sand")), 3);
    }

    #[test]
    fn sorted_entries_are_stable() {
        let mut cache = ClientCache::new();
        cache.apply(&full(vec![
            (stack("minecraft:stone"), 1),
            (stack("minecraft:apple"), 1),
            (stack("minecraft:stone").with_component("custom_name", "A"), 1),
            (stack("minecraft:dirt"), 1),
        ]));

        let ids: Vec<String> = cache.sorted_entries().iter().map(|e| e.stack.item.to_string()).collect();
        assert_eq!(ids, ["minecraft:apple", "minecraft:dirt", "minecraft:stone", "minecraft:stone"]);
        assert_eq!(cache.sorted_entries(), cache.sorted_entries());
    }

    #[test]
    fn clear_empties_cache() {
        let mut cache = ClientCache::new();
        cache.apply(&full(vec![(stack("minecraft:sand"), 3)]));
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.all_entries().is_empty());
    }
}
