//! Database schema, initialization and repositories

pub mod init;
pub mod parameters;
pub mod providers;

pub use init::{create_schema, init_database, init_memory_database};
