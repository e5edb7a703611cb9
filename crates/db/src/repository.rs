//! Repository-Trait und Datenbank-Konfiguration
//!
//! Das Repository entkoppelt die Ablage der Privilegien von SQLite. Die
//! einzige Implementierung ist [`SqliteDb`](crate::SqliteDb).

use serde::{Deserialize, Serialize};
use stammtisch_core::{ChannelId, PrivilegRecord};

use crate::error::DbError;

pub type DbResult<T> = std::result::Result<T, DbError>;

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://stammtisch.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob der WAL-Modus aktiviert werden soll
    pub sqlite_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://stammtisch.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

/// Dauerhafte Ablage der Privilegien registrierter Konten
///
/// Schluessel ist (Oberkanal, Konto). Unregistrierte Identitaeten werden
/// abgelehnt.
#[allow(async_fn_in_trait)]
pub trait PrivilegRepository: Send + Sync {
    /// Einfuegen oder ersetzen
    async fn speichern(&self, privileg: &PrivilegRecord) -> DbResult<()>;

    /// Alle Datensaetze einer Kanalgruppe
    async fn fuer_kanal(&self, kanal: ChannelId) -> DbResult<Vec<PrivilegRecord>>;

    /// Alle Datensaetze (Serverstart)
    async fn alle(&self) -> DbResult<Vec<PrivilegRecord>>;
}
