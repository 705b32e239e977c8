use std::collections::HashMap;
use std::fmt;
use bottomless_core::{ItemKey, ItemStack};
use crate::error::{AppResult, DomainError};

/// One stored item type: a reference stack (count forced to 1) plus the logical count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    /// Template stack; its face-value count is always 1
    reference: ItemStack,
    /// Number of items stored, not limited by any stack size
    count: u64,
}

impl StoreEntry {
    pub fn new(stack: &ItemStack, count: u64) -> AppResult<Self> {
        if stack.is_empty() {
            return Err(DomainError::Validation {
                field: "stack",
                message: "reference stack cannot be empty".to_string(),
            });
        }

        Ok(Self {
            reference: stack.copy_with_count(1),
            count,
        })
    }

    /// Copy of the reference stack (count 1).
    pub fn reference_stack(&self) -> ItemStack {
        self.reference.clone()
    }

    pub fn reference(&self) -> &ItemStack {
        &self.reference
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn set_count(&mut self, count: u64) {
        self.count = count;
    }

    /// Counts saturate at `u64::MAX`.
    pub fn add_count(&mut self, amount: u64) {
        self.count = self.count.saturating_add(amount);
    }

    /// Removes up to `amount` and returns what was actually removed.
    pub fn remove_count(&mut self, amount: u64) -> u64 {
        let removed = amount.min(self.count);
        self.count -= removed;
        removed
    }

    /// A fresh stack holding `count` items, clamped to the natural stack size.
    ///
    /// This is the only place where the unbounded logical count turns into a
    /// quantity the bounded inventory can hold.
    pub fn stack_with_count(&self, count: u64) -> ItemStack {
        let max = u64::from(self.reference.max_stack_size());
        // max fits in u32, so the clamped value does too
        let clamped = count.min(max) as u32;
        self.reference.copy_with_count(clamped)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl fmt::Display for StoreEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreEntry{{item={}, count={}}}", self.reference.item, self.count)
    }
}

/// The authoritative per-owner store of unbounded item counts.
///
/// All mutation goes through [`UnboundedStore::add_item`] and
/// [`UnboundedStore::remove_item`], so an entry with a zero count never stays
/// in the map.
#[derive(Debug, Clone, Default)]
pub struct UnboundedStore {
    storage: HashMap<ItemKey, StoreEntry>,
}

impl UnboundedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `count` items of the stack's type. Returns false (and does nothing)
    /// for an empty stack or a zero count.
    pub fn add_item(&mut self, stack: &ItemStack, count: u64) -> bool {
        if count == 0 {
            return false;
        }
        let Ok(key) = ItemKey::new(stack) else {
            return false;
        };

        match self.storage.get_mut(&key) {
            Some(entry) => entry.add_count(count),
            None => {
                let entry = StoreEntry {
                    reference: stack.copy_with_count(1),
                    count,
                };
                self.storage.insert(key, entry);
            }
        }
        true
    }

    /// Removes up to `count` items and returns how many were removed.
    pub fn remove_item(&mut self, stack: &ItemStack, count: u64) -> u64 {
        if count == 0 {
            return 0;
        }
        let Ok(key) = ItemKey::new(stack) else {
            return 0;
        };
        let Some(entry) = self.storage.get_mut(&key) else {
            return 0;
        };

        let removed = entry.remove_count(count);
        if entry.is_empty() {
            self.storage.remove(&key);
        }
        removed
    }

    pub fn count(&self, stack: &ItemStack) -> u64 {
        let Ok(key) = ItemKey::new(stack) else {
            return 0;
        };
        self.storage.get(&key).map(StoreEntry::count).unwrap_or(0)
    }

    pub fn entry(&self, stack: &ItemStack) -> Option<&StoreEntry> {
        let key = ItemKey::new(stack).ok()?;
        self.storage.get(&key)
    }

    pub fn contains(&self, stack: &ItemStack) -> bool {
        self.count(stack) > 0
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn clear(&mut self) {
        self.storage.clear();
    }

    /// Number of distinct item identities.
    pub fn unique_item_count(&self) -> usize {
        self.storage.len()
    }

    /// Sum of all counts, saturating at `u64::MAX`.
    pub fn total_item_count(&self) -> u64 {
        self.storage
            .values()
            .fold(0u64, |acc, e| acc.saturating_add(e.count))
    }

    pub fn entries(&self) -> impl Iterator<Item = &StoreEntry> {
        self.storage.values()
    }

    /// Owned snapshot of every entry.
    pub fn all_entries(&self) -> Vec<StoreEntry> {
        self.storage.values().cloned().collect()
    }
}

impl fmt::Display for UnboundedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UnboundedStore{{unique_items={}, total_items={}}}",
            self.unique_item_count(),
            self.total_item_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bottomless_core::{ItemTypeId, MAX_STACK_SIZE_COMPONENT};

    fn item(id: &str, count: u32) -> ItemStack {
        ItemStack::new(ItemTypeId::parse(id).unwrap(), count)
    }

    fn diamond(count: u32) -> ItemStack {
        item("minecraft:diamond", count)
    }

    #[test]
    fn entry_normalises_reference_to_one() {
        let entry = StoreEntry::new(&diamond(17), 500).unwrap();
        assert_eq!(entry.reference().count, 1);
        assert_eq!(entry.count(), 500);
        assert!(StoreEntry::new(&ItemStack::empty(), 1).is_err());
    }

    #[test]
    fn entry_is_isolated_from_caller_mutation() {
        let mut stack = diamond(3).with_component("custom_name", "Shiny");
        let entry = StoreEntry::new(&stack, 10).unwrap();
        stack.components.insert("custom_name", "Dull");
        stack.set_count(9);
        assert_eq!(entry.reference().components.get("custom_name").and_then(|v| v.as_str()), Some("Shiny"));
        assert_eq!(entry.reference().count, 1);
    }

    #[test]
    fn entry_remove_never_goes_negative() {
        let mut entry = StoreEntry::new(&diamond(1), 5).unwrap();
        assert_eq!(entry.remove_count(3), 3);
        assert_eq!(entry.remove_count(10), 2);
        assert_eq!(entry.count(), 0);
        assert!(entry.is_empty());
    }

    #[test]
    fn entry_stack_with_count_clamps_to_stack_size() {
        let entry = StoreEntry::new(&diamond(1), 1_000).unwrap();
        assert_eq!(entry.stack_with_count(10).count, 10);
        assert_eq!(entry.stack_with_count(1_000).count, 64);

        let pearls = StoreEntry::new(&item("minecraft:ender_pearl", 1).with_component(MAX_STACK_SIZE_COMPONENT, 16i64), 99).unwrap();
        assert_eq!(pearls.stack_with_count(99).count, 16);
    }

    #[test]
    fn add_aggregates_counts() {
        let mut store = UnboundedStore::new();
        assert!(store.add_item(&diamond(1), 100));
        assert!(store.add_item(&diamond(64), 250));
        assert_eq!(store.count(&diamond(1)), 350);
        assert_eq!(store.unique_item_count(), 1);
    }

    #[test]
    fn add_rejects_empty_and_zero() {
        let mut store = UnboundedStore::new();
        assert!(!store.add_item(&ItemStack::empty(), 5));
        assert!(!store.add_item(&diamond(1), 0));
        assert!(store.is_empty());
    }

    #[test]
    fn variants_are_stored_separately() {
        let mut store = UnboundedStore::new();
        store.add_item(&diamond(1), 10);
        store.add_item(&diamond(1).with_component("custom_name", "Hope"), 1);
        assert_eq!(store.unique_item_count(), 2);
        assert_eq!(store.total_item_count(), 11);
        assert_eq!(store.count(&diamond(1)), 10);
    }

    #[test]
    fn remove_returns_actual_amount_and_drops_empty_entries() {
        let mut store = UnboundedStore::new();
        store.add_item(&diamond(1), 40);

        assert_eq!(store.remove_item(&diamond(1), 15), 15);
        assert_eq!(store.count(&diamond(1)), 25);

        assert_eq!(store.remove_item(&diamond(1), 64), 25);
        assert_eq!(store.count(&diamond(1)), 0);
        assert!(!store.contains(&diamond(1)));
        assert!(store.is_empty());
        assert_eq!(store.all_entries().len(), 0);
    }

    #[test]
    fn remove_of_absent_or_invalid_is_zero() {
        let mut store = UnboundedStore::new();
        assert_eq!(store.remove_item(&diamond(1), 5), 0);
        store.add_item(&diamond(1), 5);
        assert_eq!(store.remove_item(&diamond(1), 0), 0);
        assert_eq!(store.remove_item(&ItemStack::empty(), 5), 0);
        assert_eq!(store.count(&diamond(1)), 5);
    }

    #[test]
    fn counts_saturate_instead_of_wrapping() {
        let mut store = UnboundedStore::new();
        store.add_item(&diamond(1), u64::MAX - 1);
        store.add_item(&diamond(1), 10);
        assert_eq!(store.count(&diamond(1)), u64::MAX);

        store.add_item(&item("minecraft:emerald", 1), 10);
        assert_eq!(store.total_item_count(), u64::MAX);
    }

    #[test]
    fn snapshot_is_detached_from_store() {
        let mut store = UnboundedStore::new();
        store.add_item(&diamond(1), 3);
        let snapshot = store.all_entries();
        store.remove_item(&diamond(1), 3);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].count(), 3);
    }
}
