pub mod bounded;
pub mod inventory;
pub mod types;
