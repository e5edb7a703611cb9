//! SQLite-Pool der Privilegien-Datenbank

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::error::DbError;
use crate::repository::{DatabaseConfig, DbResult};

/// Wrapper um den SQLite Connection Pool
#[derive(Debug, Clone)]
pub struct SqliteDb {
    pub(crate) pool: SqlitePool,
}

impl SqliteDb {
    /// Oeffnet (oder erstellt) die Datenbank und fuehrt Migrationen aus
    pub async fn oeffnen(config: &DatabaseConfig) -> DbResult<Self> {
        if config.max_verbindungen == 0 {
            return Err(DbError::ungueltig("max_verbindungen muss groesser als 0 sein"));
        }
        let journal = if config.sqlite_wal {
            SqliteJournalMode::Wal
        } else {
            SqliteJournalMode::Delete
        };
        let opts = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .journal_mode(journal);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_verbindungen)
            .connect_with(opts)
            .await?;
        tracing::info!(url = %config.url, wal = config.sqlite_wal, "Privilegien-Datenbank geoeffnet");

        let db = Self { pool };
        db.migrationen_ausfuehren().await?;
        Ok(db)
    }

    /// In-Memory-Datenbank (Tests, Server ohne Datei)
    pub async fn in_memory() -> DbResult<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // Jede Verbindung haette sonst ihre eigene leere Datenbank
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .connect_with(opts)
            .await?;

        let db = Self { pool };
        db.migrationen_ausfuehren().await?;
        Ok(db)
    }

    async fn migrationen_ausfuehren(&self) -> DbResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::debug!("Datenbank-Migrationen abgeschlossen");
        Ok(())
    }

    /// Schliesst alle Verbindungen (Shutdown)
    pub async fn schliessen(&self) {
        self.pool.close().await;
        tracing::info!("Privilegien-Datenbank geschlossen");
    }
}
