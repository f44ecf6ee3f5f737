pub mod app_config;
pub mod database;
pub mod shift_repo;
pub mod memory;
pub mod remote;

pub use database::DbClient;
pub use shift_repo::PgShieldStore;
pub use memory::MemoryStore;
pub use remote::ShieldApiClient;
