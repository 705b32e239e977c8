use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use thiserror::Error;
use crate::{Components, ItemStack, ItemTypeId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("cannot build an item key from an empty stack")]
    EmptyStack,
}

/// Hashable identity of an item descriptor: its type and components, never its count.
///
/// The value is immutable, so the structural hash is computed once and reused.
#[derive(Clone)]
pub struct ItemKey {
    item: ItemTypeId,
    components: Components,
    hash: u64,
}

impl ItemKey {
    pub fn new(stack: &ItemStack) -> Result<Self, KeyError> {
        if stack.is_empty() {
            return Err(KeyError::EmptyStack);
        }

        let mut hasher = DefaultHasher::new();
        stack.item.hash(&mut hasher);
        stack.components.hash(&mut hasher);

        Ok(Self {
            item: stack.item.clone(),
            components: stack.components.clone(),
            hash: hasher.finish(),
        })
    }

    pub fn item(&self) -> &ItemTypeId {
        &self.item
    }

    pub fn components(&self) -> &Components {
        &self.components
    }

    /// Stable key for deterministic display ordering.
    pub fn display_key(&self) -> &str {
        self.item.as_str()
    }
}

impl PartialEq for ItemKey {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.item == other.item && self.components == other.components
    }
}

impl Eq for ItemKey {}

impl Hash for ItemKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Debug for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemKey")
            .field("item", &self.item)
            .field("components", &self.components)
            .finish()
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            write!(f, "{}", self.item)
        } else {
            write!(f, "{}{}", self.item, self.components)
        }
    }
}
