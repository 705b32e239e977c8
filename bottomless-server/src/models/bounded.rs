use bottomless_core::ItemStack;

/// Number of storage slots in a player's ordinary inventory (hotbar included).
pub const PLAYER_INVENTORY_SLOTS: usize = 36;

/// The ordinary, stack-size-limited inventory the unbounded store exchanges items with.
///
/// Implementations must never let a slot exceed the item's natural stack size.
pub trait BoundedInventory {
    fn slot_count(&self) -> usize;

    /// Stack in the given slot; empty for free or out-of-range slots.
    fn slot(&self, index: usize) -> &ItemStack;

    fn set_slot(&mut self, index: usize, stack: ItemStack);

    /// Shrinks the stack in a slot, clearing the slot once it is empty.
    fn shrink_slot(&mut self, index: usize, amount: u32);

    /// Places the whole stack respecting stack limits, or nothing at all.
    fn try_add(&mut self, stack: &ItemStack) -> bool;

    /// Item currently held on the cursor.
    fn carried(&self) -> &ItemStack;

    fn set_carried(&mut self, stack: ItemStack);
}

/// Slot-based inventory used for online players.
#[derive(Debug, Clone)]
pub struct PlayerInventory {
    slots: Vec<ItemStack>,
    carried: ItemStack,
    empty: ItemStack,
}

impl Default for PlayerInventory {
    fn default() -> Self {
        Self::with_slots(PLAYER_INVENTORY_SLOTS)
    }
}

impl PlayerInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slots(n: usize) -> Self {
        Self {
            slots: vec![ItemStack::empty(); n],
            carried: ItemStack::empty(),
            empty: ItemStack::empty(),
        }
    }

    /// Total quantity of matching items in the slots, ignoring the carried item.
    pub fn count_matching(&self, stack: &ItemStack) -> u64 {
        self.slots
            .iter()
            .filter(|s| ItemStack::is_same_item_same_components(s, stack))
            .map(|s| u64::from(s.count))
            .sum()
    }

    fn free_capacity_for(&self, stack: &ItemStack) -> u64 {
        let max = stack.max_stack_size();
        self.slots
            .iter()
            .map(|s| {
                if s.is_empty() {
                    u64::from(max)
                } else if ItemStack::is_same_item_same_components(s, stack) {
                    u64::from(max.saturating_sub(s.count))
                } else {
                    0
                }
            })
            .sum()
    }
}

impl BoundedInventory for PlayerInventory {
    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, index: usize) -> &ItemStack {
        self.slots.get(index).unwrap_or(&self.empty)
    }

    fn set_slot(&mut self, index: usize, stack: ItemStack) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = if stack.is_empty() { ItemStack::empty() } else { stack };
        }
    }

    fn shrink_slot(&mut self, index: usize, amount: u32) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.shrink(amount);
            if slot.is_empty() {
                *slot = ItemStack::empty();
            }
        }
    }

    fn try_add(&mut self, stack: &ItemStack) -> bool {
        if stack.is_empty() {
            return false;
        }
        if self.free_capacity_for(stack) < u64::from(stack.count) {
            return false;
        }

        let max = stack.max_stack_size();
        let mut remaining = stack.count;

        // top up matching stacks first
        for slot in self.slots.iter_mut() {
            if remaining == 0 {
                break;
            }
            if ItemStack::is_same_item_same_components(slot, stack) && slot.count < max {
                let moved = remaining.min(max - slot.count);
                slot.grow(moved);
                remaining -= moved;
            }
        }

        for slot in self.slots.iter_mut() {
            if remaining == 0 {
                break;
            }
            if slot.is_empty() {
                let moved = remaining.min(max);
                *slot = stack.copy_with_count(moved);
                remaining -= moved;
            }
        }

        debug_assert_eq!(remaining, 0);
        true
    }

    fn carried(&self) -> &ItemStack {
        &self.carried
    }

    fn set_carried(&mut self, stack: ItemStack) {
        self.carried = if stack.is_empty() { ItemStack::empty() } else { stack };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bottomless_core::{ItemTypeId, MAX_STACK_SIZE_COMPONENT};

    fn torch(count: u32) -> ItemStack {
        ItemStack::new(ItemTypeId::parse("minecraft:torch").unwrap(), count)
    }

    #[test]
    fn try_add_merges_then_fills_empty_slots() {
        let mut inv = PlayerInventory::with_slots(3);
        inv.set_slot(1, torch(60));

        assert!(inv.try_add(&torch(10)));
        assert_eq!(inv.slot(1).count, 64);
        assert_eq!(inv.slot(0).count, 6);
        assert!(inv.slot(2).is_empty());
        assert_eq!(inv.count_matching(&torch(1)), 70);
    }

    #[test]
    fn try_add_is_all_or_nothing() {
        let mut inv = PlayerInventory::with_slots(2);
        inv.set_slot(0, torch(64));
        inv.set_slot(1, torch(60));

        assert!(!inv.try_add(&torch(5)));
        assert_eq!(inv.count_matching(&torch(1)), 124);
        assert!(inv.try_add(&torch(4)));
        assert_eq!(inv.count_matching(&torch(1)), 128);
    }

    #[test]
    fn try_add_respects_item_stack_size() {
        let pearl = ItemStack::new(ItemTypeId::parse("minecraft:ender_pearl").unwrap(), 16)
            .with_component(MAX_STACK_SIZE_COMPONENT, 16i64);
        let mut inv = PlayerInventory::with_slots(2);
        assert!(inv.try_add(&pearl));
        assert!(inv.try_add(&pearl));
        assert!(!inv.try_add(&pearl.copy_with_count(1)));
        assert_eq!(inv.slot(0).count, 16);
        assert_eq!(inv.slot(1).count, 16);
    }

    #[test]
    fn different_components_do_not_merge() {
        let mut inv = PlayerInventory::with_slots(2);
        inv.set_slot(0, torch(10).with_component("custom_name", "Lamp"));
        assert!(inv.try_add(&torch(10)));
        assert_eq!(inv.slot(0).count, 10);
        assert_eq!(inv.slot(1).count, 10);
    }

    #[test]
    fn shrink_clears_empty_slots() {
        let mut inv = PlayerInventory::with_slots(1);
        inv.set_slot(0, torch(3));
        inv.shrink_slot(0, 3);
        assert!(inv.slot(0).is_empty());
        assert!(inv.slot(0).item.is_air());
        assert!(inv.slot(7).is_empty());
    }
}
