//! SQLite-Backend

pub mod pool;
pub mod privileges;

pub use pool::SqliteDb;
