//! Persistenz-Warteschlange
//!
//! Die Registry laeuft synchron unter einer Sperre und darf nicht auf die
//! Datenbank warten. Sie legt Datensaetze deshalb nur in eine unbegrenzte
//! Queue; ein Worker-Task schreibt sie in Eingangsreihenfolge nach SQLite.
//! Fehler des Workers werden protokolliert, nicht zurueckgemeldet.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use stammtisch_core::{PrivilegRecord, PrivilegSpeicher, Result, StammtischError};

use crate::repository::PrivilegRepository;
use crate::sqlite::SqliteDb;

/// Sendeseite der Queue, wird der Registry als [`PrivilegSpeicher`] uebergeben
#[derive(Debug, Clone)]
pub struct PersistenzWarteschlange {
    tx: mpsc::UnboundedSender<PrivilegRecord>,
}

impl PrivilegSpeicher for PersistenzWarteschlange {
    fn privileg_speichern(&self, privileg: &PrivilegRecord) -> Result<()> {
        self.tx
            .send(privileg.clone())
            .map_err(|_| StammtischError::Persistenz("Persistenz-Worker beendet".into()))
    }
}

/// Startet den Worker-Task
///
/// Der Task endet, sobald alle Klone der Warteschlange verworfen wurden
/// und die Queue leer ist. Muss innerhalb einer Tokio-Runtime aufgerufen
/// werden.
pub fn persistenz_worker_starten(db: SqliteDb) -> (PersistenzWarteschlange, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<PrivilegRecord>();

    let handle = tokio::spawn(async move {
        tracing::debug!("Persistenz-Worker gestartet");
        let mut geschrieben: u64 = 0;
        while let Some(privileg) = rx.recv().await {
            match db.speichern(&privileg).await {
                Ok(()) => geschrieben += 1,
                Err(e) => tracing::warn!(
                    kanal_id = %privileg.kanal,
                    fehler = %e,
                    "Privileg konnte nicht geschrieben werden"
                ),
            }
        }
        tracing::info!(geschrieben, "Persistenz-Worker beendet");
    });

    (PersistenzWarteschlange { tx }, handle)
}
