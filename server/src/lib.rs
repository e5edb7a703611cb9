//! stammtisch-server – Bibliotheks-Root
//!
//! Verdrahtet Konfiguration, Privilegien-Datenbank, Persistenz-Worker und
//! Registry. Die Registry selbst ist nicht thread-safe und liegt deshalb
//! als Ganzes hinter einer einzigen Sperre ([`GeteilteRegistry`]).

pub mod config;
pub mod logging;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use stammtisch_core::{ChannelId, PrivilegSpeicher};
use stammtisch_db::{persistenz_worker_starten, PrivilegRepository, SqliteDb};
use stammtisch_registry::Registry;

use config::ServerConfig;

/// Die Registry des Servers hinter der einen groben Sperre
pub type GeteilteRegistry = Arc<Mutex<Registry>>;

/// URL fuer eine Datenbank ohne Datei
pub const IN_MEMORY_URL: &str = "sqlite::memory:";

/// Haelt den Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

/// Ein vorbereiteter Server: Registry befuellt, Worker laeuft
pub struct LaufenderServer {
    pub registry: GeteilteRegistry,
    db: SqliteDb,
    worker: JoinHandle<()>,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Datenbank oeffnen, gespeicherte Privilegien lesen
    /// 2. Persistenz-Worker starten
    /// 3. Registry aus der Konfiguration aufbauen
    /// 4. Auf Ctrl-C warten, dann Worker leerlaufen lassen
    pub async fn starten(self) -> Result<()> {
        let laufend = self.vorbereiten().await?;
        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
        laufend.herunterfahren().await
    }

    /// Schritte 1 bis 3 von [`Server::starten`]
    pub async fn vorbereiten(self) -> Result<LaufenderServer> {
        tracing::info!(
            server_name = %self.config.server.name,
            kanaele = self.config.kanaele.len(),
            "Server startet"
        );

        let db = if self.config.datenbank.url == IN_MEMORY_URL {
            SqliteDb::in_memory().await
        } else {
            SqliteDb::oeffnen(&self.config.datenbank).await
        }
        .context("Privilegien-Datenbank konnte nicht geoeffnet werden")?;
        let gespeichert = db
            .alle()
            .await
            .context("Gespeicherte Privilegien konnten nicht gelesen werden")?;

        let (warteschlange, worker) = persistenz_worker_starten(db.clone());
        let mut registry = registry_aufbauen(&self.config, Arc::new(warteschlange))?;
        registry.privilegien_laden(gespeichert);
        registry.kanalbaum_protokollieren();

        Ok(LaufenderServer {
            registry: Arc::new(Mutex::new(registry)),
            db,
            worker,
        })
    }
}

impl LaufenderServer {
    /// Verwirft die Registry, wartet auf den Worker und schliesst die Datenbank
    ///
    /// Ausstehende Privilegien werden noch geschrieben, solange niemand
    /// sonst eine Referenz auf die Registry haelt.
    pub async fn herunterfahren(self) -> Result<()> {
        let Self { registry, db, worker } = self;
        if Arc::strong_count(&registry) > 1 {
            tracing::warn!("Registry wird noch referenziert, Persistenz-Worker wird abgebrochen");
            worker.abort();
        }
        drop(registry);
        if let Err(e) = worker.await {
            if !e.is_cancelled() {
                return Err(e).context("Persistenz-Worker ist abgestuerzt");
            }
        }
        db.schliessen().await;
        Ok(())
    }
}

/// Legt die konfigurierten Kanaele in einer neuen Registry an
pub fn registry_aufbauen(config: &ServerConfig, speicher: Arc<dyn PrivilegSpeicher>) -> Result<Registry> {
    config.validieren()?;
    let mut registry = Registry::neu(config.registry_config(), speicher);
    let mut nach_name: HashMap<&str, ChannelId> = HashMap::new();

    for kanal in &config.kanaele {
        let id = registry
            .channel_hinzufuegen(kanal.kanal_daten()?)
            .with_context(|| format!("Kanal '{}' konnte nicht angelegt werden", kanal.name))?;
        if let Some(passwort) = &kanal.passwort {
            registry
                .passwort_setzen(id, passwort.as_bytes())
                .with_context(|| format!("Passwort fuer '{}' ungueltig", kanal.name))?;
        }
        if let Some(eltern) = &kanal.eltern {
            let eltern_id = nach_name
                .get(eltern.as_str())
                .copied()
                .with_context(|| format!("Elternkanal '{eltern}' unbekannt"))?;
            registry
                .unterkanal_anhaengen(eltern_id, id)
                .with_context(|| format!("Kanal '{}' nicht unter '{eltern}' einhaengbar", kanal.name))?;
        }
        nach_name.insert(kanal.name.as_str(), id);
    }

    let standard = registry
        .default_channel()
        .map(|k| k.id())
        .context("Konfiguration enthaelt keinen Standardkanal")?;
    tracing::info!(standardkanal = %standard, anzahl = registry.kanal_anzahl(), "Kanaele angelegt");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::KanalEinstellungen;
    use stammtisch_core::{ChannelFlags, KeinSpeicher};

    fn baum_config() -> ServerConfig {
        let mut cfg = ServerConfig::default();
        cfg.datenbank.url = IN_MEMORY_URL.into();
        cfg.kanaele.push(KanalEinstellungen {
            name: "Keller".into(),
            flags: vec!["subchannels".into()],
            passwort: Some("bier".into()),
            ..KanalEinstellungen::default()
        });
        cfg.kanaele.push(KanalEinstellungen {
            name: "Weinkeller".into(),
            eltern: Some("Keller".into()),
            ..KanalEinstellungen::default()
        });
        cfg
    }

    #[test]
    fn registry_aus_konfiguration() {
        let registry = registry_aufbauen(&baum_config(), Arc::new(KeinSpeicher)).unwrap();
        assert_eq!(registry.kanal_anzahl(), 3);
        assert_eq!(registry.default_channel().unwrap().name(), "Standard");

        let wein = registry.kanaele().find(|k| k.name() == "Weinkeller").unwrap();
        let keller = wein.eltern().unwrap();
        assert!(registry
            .effektive_flags(wein.id())
            .unwrap()
            .contains(ChannelFlags::PASSWORD));
        assert!(registry.passwort_pruefen(wein.id(), b"bier").unwrap());
        assert_eq!(registry.channel_nach_id(keller).unwrap().name(), "Keller");
    }

    #[test]
    fn ohne_standardkanal_schlaegt_fehl() {
        let mut cfg = ServerConfig::default();
        cfg.kanaele = vec![KanalEinstellungen::default()];
        assert!(registry_aufbauen(&cfg, Arc::new(KeinSpeicher)).is_err());
    }

    #[tokio::test]
    async fn vorbereiten_und_herunterfahren() {
        let laufend = Server::neu(baum_config()).vorbereiten().await.unwrap();
        {
            let registry = laufend.registry.lock();
            assert_eq!(registry.kanal_anzahl(), 3);
        }
        laufend.herunterfahren().await.unwrap();
    }
}
