pub mod store;
pub mod store_db;
pub mod store_mem;

pub use store::StoreRepo;
pub use store_db::StoreRepository;
pub use store_mem::MemoryStoreRepo;
