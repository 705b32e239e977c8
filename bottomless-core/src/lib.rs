use std::fmt;

mod codec;
mod component;
mod item;
mod key;

pub use codec::{CodecError, decode_stack, encode_stack, stack_from_value, stack_to_value};
pub use component::{ComponentValue, Components};
pub use item::{DEFAULT_MAX_STACK_SIZE, ItemStack, MAX_STACK_SIZE_COMPONENT};
pub use key::{ItemKey, KeyError};


/// Namespaced item type identifier, e.g. `minecraft:cobblestone`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemTypeId(String);


impl fmt::Display for ItemTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}


impl ItemTypeId {
    /// The type id that marks an empty descriptor.
    pub const AIR: &'static str = "minecraft:air";

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (namespace, path) = s.split_once(':')?;
        if namespace.is_empty() || path.is_empty() { return None; }
        let valid = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | '.');
        if !namespace.chars().all(valid) { return None; }
        if !path.chars().all(|c| valid(c) || c == '/') { return None; }
        Some(Self(s.to_string()))
    }

    pub fn air() -> Self {
        Self(Self::AIR.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_air(&self) -> bool {
        self.0 == Self::AIR
    }
}


impl TryFrom<String> for ItemTypeId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s).ok_or_else(|| format!("invalid item type id: {s}"))
    }
}


impl From<ItemTypeId> for String {
    fn from(id: ItemTypeId) -> Self {
        id.0
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_namespaced_ids() {
        assert_eq!(ItemTypeId::parse("minecraft:stone").unwrap().as_str(), "minecraft:stone");
        assert_eq!(ItemTypeId::parse("  mymod:tools/wrench ").unwrap().as_str(), "mymod:tools/wrench");
        assert!(ItemTypeId::parse("stone").is_none());
        assert!(ItemTypeId::parse(":stone").is_none());
        assert!(ItemTypeId::parse("minecraft:").is_none());
        assert!(ItemTypeId::parse("Minecraft:Stone").is_none());
        assert!(ItemTypeId::parse("my/mod:stone").is_none());
    }

    #[test]
    fn air_is_recognised() {
        assert!(ItemTypeId::air().is_air());
        assert!(!ItemTypeId::parse("minecraft:dirt").unwrap().is_air());
    }

    #[test]
    fn serde_rejects_bad_ids() {
        let ok: ItemTypeId = serde_json::from_str("\"minecraft:dirt\"").unwrap();
        assert_eq!(ok.to_string(), "minecraft:dirt");
        assert!(serde_json::from_str::<ItemTypeId>("\"not an id\"").is_err());
    }
}
