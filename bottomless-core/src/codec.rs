use serde_json::Value;
use thiserror::Error;
use crate::ItemStack;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("empty item stack cannot be encoded")]
    Empty,

    #[error("malformed item stack: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Encode a single descriptor as an embeddable JSON value.
pub fn stack_to_value(stack: &ItemStack) -> Result<Value, CodecError> {
    if stack.is_empty() {
        return Err(CodecError::Empty);
    }
    Ok(serde_json::to_value(stack)?)
}

/// Decode a single descriptor from a JSON value. The result may be an empty stack;
/// callers decide whether that is acceptable.
pub fn stack_from_value(value: &Value) -> Result<ItemStack, CodecError> {
    let stack = <ItemStack as serde::Deserialize>::deserialize(value)?;
    tracing::trace!(%stack, "decoded item stack");
    Ok(stack)
}

/// Encode a single descriptor to bytes.
pub fn encode_stack(stack: &ItemStack) -> Result<Vec<u8>, CodecError> {
    if stack.is_empty() {
        return Err(CodecError::Empty);
    }
    Ok(serde_json::to_vec(stack)?)
}

/// Decode a single descriptor from bytes produced by [`encode_stack`].
pub fn decode_stack(bytes: &[u8]) -> Result<ItemStack, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComponentValue, ItemTypeId};
    use std::collections::BTreeMap;

    fn enchanted_book() -> ItemStack {
        let mut enchants = BTreeMap::new();
        enchants.insert("minecraft:mending".to_string(), ComponentValue::Int(1));
        ItemStack::new(ItemTypeId::parse("minecraft:enchanted_book").unwrap(), 1)
            .with_component("stored_enchantments", enchants)
            .with_component(crate::MAX_STACK_SIZE_COMPONENT, 1i64)
    }

    #[test]
    fn bytes_preserve_components() {
        let book = enchanted_book();
        let bytes = encode_stack(&book).unwrap();
        assert_eq!(decode_stack(&bytes).unwrap(), book);
    }

    #[test]
    fn empty_stacks_are_refused() {
        assert!(matches!(encode_stack(&ItemStack::empty()), Err(CodecError::Empty)));
        assert!(matches!(stack_to_value(&ItemStack::empty()), Err(CodecError::Empty)));
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(decode_stack(b"{\"item\":\"nope\",\"count\":1}").is_err());
        assert!(decode_stack(b"not json").is_err());
        let float_payload = serde_json::json!({
            "item": "minecraft:stone",
            "count": 1,
            "components": { "weight": 1.5 }
        });
        assert!(stack_from_value(&float_payload).is_err());
    }

    #[test]
    fn missing_components_default_to_empty() {
        let v = serde_json::json!({ "item": "minecraft:stone", "count": 3 });
        let stack = stack_from_value(&v).unwrap();
        assert!(stack.components.is_empty());
        assert_eq!(stack.count, 3);
    }
}
