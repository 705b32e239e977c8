use std::fmt;
use serde::{Deserialize, Serialize};
use crate::{ComponentValue, Components, ItemTypeId};

/// Stack size used when an item does not declare its own.
pub const DEFAULT_MAX_STACK_SIZE: u32 = 64;

/// Component that overrides the natural maximum stack size of an item.
pub const MAX_STACK_SIZE_COMPONENT: &str = "max_stack_size";

/// An item descriptor: a type, a face-value quantity and its component payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: ItemTypeId,
    pub count: u32,
    #[serde(default, skip_serializing_if = "Components::is_empty")]
    pub components: Components,
}

impl Default for ItemStack {
    fn default() -> Self {
        Self::empty()
    }
}

impl ItemStack {
    pub fn new(item: ItemTypeId, count: u32) -> Self {
        Self { item, count, components: Components::new() }
    }

    pub fn empty() -> Self {
        Self::new(ItemTypeId::air(), 0)
    }

    /// Builder-style helper to attach a component.
    pub fn with_component(mut self, name: impl Into<String>, value: impl Into<ComponentValue>) -> Self {
        self.components.insert(name, value);
        self
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0 || self.item.is_air()
    }

    /// Natural maximum stack size, never less than 1.
    pub fn max_stack_size(&self) -> u32 {
        match self.components.get(MAX_STACK_SIZE_COMPONENT).and_then(ComponentValue::as_int) {
            Some(n) if n > 0 => u32::try_from(n).unwrap_or(u32::MAX),
            _ => DEFAULT_MAX_STACK_SIZE,
        }
    }

    /// Returns a copy of this stack with a different count.
    pub fn copy_with_count(&self, count: u32) -> Self {
        let mut copy = self.clone();
        copy.count = count;
        copy
    }

    pub fn set_count(&mut self, count: u32) {
        self.count = count;
    }

    pub fn grow(&mut self, amount: u32) {
        self.count = self.count.saturating_add(amount);
    }

    pub fn shrink(&mut self, amount: u32) {
        self.count = self.count.saturating_sub(amount);
    }

    /// Same type and same components, ignoring the count. Empty stacks never match.
    pub fn is_same_item_same_components(a: &ItemStack, b: &ItemStack) -> bool {
        if a.is_empty() || b.is_empty() {
            return false;
        }
        a.item == b.item && a.components == b.components
    }
}

impl fmt::Display for ItemStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            write!(f, "{} x{}", self.item, self.count)
        } else {
            write!(f, "{} x{} {}", self.item, self.count, self.components)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stone(count: u32) -> ItemStack {
        ItemStack::new(ItemTypeId::parse("minecraft:stone").unwrap(), count)
    }

    #[test]
    fn empty_detection() {
        assert!(ItemStack::empty().is_empty());
        assert!(stone(0).is_empty());
        assert!(ItemStack::new(ItemTypeId::air(), 5).is_empty());
        assert!(!stone(1).is_empty());
    }

    #[test]
    fn max_stack_size_override() {
        assert_eq!(stone(1).max_stack_size(), DEFAULT_MAX_STACK_SIZE);
        assert_eq!(stone(1).with_component(MAX_STACK_SIZE_COMPONENT, 16i64).max_stack_size(), 16);
        assert_eq!(stone(1).with_component(MAX_STACK_SIZE_COMPONENT, 0i64).max_stack_size(), DEFAULT_MAX_STACK_SIZE);
        assert_eq!(stone(1).with_component(MAX_STACK_SIZE_COMPONENT, "x").max_stack_size(), DEFAULT_MAX_STACK_SIZE);
    }

    #[test]
    fn same_item_ignores_count_but_not_components() {
        let named = stone(3).with_component("custom_name", "Rocky");
        assert!(ItemStack::is_same_item_same_components(&stone(1), &stone(40)));
        assert!(!ItemStack::is_same_item_same_components(&stone(1), &named));
        assert!(!ItemStack::is_same_item_same_components(&stone(0), &stone(0)));
    }

    #[test]
    fn shrink_never_underflows() {
        let mut s = stone(3);
        s.shrink(5);
        assert_eq!(s.count, 0);
        assert!(s.is_empty());
    }
}
