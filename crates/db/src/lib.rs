//! stammtisch-db – Persistenz der Kanal-Privilegien
//!
//! Speichert die Privilegien registrierter Konten in registrierten
//! Kanaelen in SQLite. Die Registry schreibt nie direkt in die Datenbank,
//! sondern ueber die [`PersistenzWarteschlange`]; ein Worker-Task arbeitet
//! die Auftraege der Reihe nach ab.

pub mod error;
pub mod queue;
pub mod repository;
pub mod sqlite;

pub use error::DbError;
pub use queue::{persistenz_worker_starten, PersistenzWarteschlange};
pub use repository::{DatabaseConfig, DbResult, PrivilegRepository};
pub use sqlite::SqliteDb;
