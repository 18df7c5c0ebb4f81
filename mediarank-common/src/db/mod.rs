//! SQLite persistence

pub mod families;
pub mod init;
pub mod rankings;
pub mod settings;
pub mod users;

pub use init::{begin_write, init_database, init_schema, open_in_memory};
pub use rankings::SqliteRankingStore;
