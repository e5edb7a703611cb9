//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Abschnitte haben
//! Standardwerte; ohne Datei startet der Server mit einem einzigen
//! Standardkanal.

use std::collections::HashMap;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use stammtisch_core::{ChannelDaten, ChannelFlags, Codec, MaxUsers};
use stammtisch_db::DatabaseConfig;
use stammtisch_registry::RegistryConfig;

use crate::logging::{log_format_gueltig, log_level_gueltig};

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Allgemeine Einstellungen und Kapazitaeten
    pub server: ServerEinstellungen,
    /// Privilegien-Datenbank
    pub datenbank: DatabaseConfig,
    pub logging: LoggingEinstellungen,
    /// Kanaele, die beim Start angelegt werden (Eltern vor Kindern)
    pub kanaele: Vec<KanalEinstellungen>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: ServerEinstellungen::default(),
            datenbank: DatabaseConfig::default(),
            logging: LoggingEinstellungen::default(),
            kanaele: vec![KanalEinstellungen::standardkanal()],
        }
    }
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers
    pub name: String,
    pub max_kanaele: usize,
    pub max_spieler: usize,
    pub max_bans: usize,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        let registry = RegistryConfig::default();
        Self {
            name: "Stammtisch".into(),
            max_kanaele: registry.max_kanaele,
            max_spieler: registry.max_spieler,
            max_bans: registry.max_bans,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Ein vorkonfigurierter Kanal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KanalEinstellungen {
    pub name: String,
    pub topic: String,
    pub beschreibung: String,
    /// Flag-Namen: "unregistered", "moderated", "password", "subchannels", "default"
    pub flags: Vec<String>,
    /// Codec als Wire-Wert (11 = Speex 19.5)
    pub codec: u16,
    pub sort_order: u16,
    /// `None` = unbegrenzt (nur beim Standardkanal erlaubt)
    pub max_users: Option<u16>,
    /// Setzt den Passwortschutz (nur Oberkanaele)
    pub passwort: Option<String>,
    /// Name des Elternkanals
    pub eltern: Option<String>,
}

impl Default for KanalEinstellungen {
    fn default() -> Self {
        let vorlage = ChannelDaten::vordefiniert();
        Self {
            name: vorlage.name,
            topic: vorlage.topic,
            beschreibung: vorlage.beschreibung,
            flags: Vec::new(),
            codec: vorlage.codec.als_u16(),
            sort_order: vorlage.sort_order,
            max_users: Some(vorlage.max_users.wire_wert()),
            passwort: None,
            eltern: None,
        }
    }
}

impl KanalEinstellungen {
    /// Standardkanal, falls die Konfiguration keine Kanaele nennt
    pub fn standardkanal() -> Self {
        Self {
            name: "Standard".into(),
            topic: "Willkommen".into(),
            beschreibung: String::new(),
            flags: vec!["default".into(), "subchannels".into()],
            max_users: None,
            ..Self::default()
        }
    }

    /// Flag-Namen in Bits uebersetzen
    pub fn flags(&self) -> anyhow::Result<ChannelFlags> {
        self.flags.iter().try_fold(ChannelFlags::empty(), |acc, name| -> anyhow::Result<ChannelFlags> {
            let flag = ChannelFlags::aus_name(name)
                .with_context(|| format!("Kanal '{}': unbekanntes Flag '{name}'", self.name))?;
            Ok(acc | flag)
        })
    }

    /// Metadaten fuer die Registry; das Passwort setzt der Aufrufer
    pub fn kanal_daten(&self) -> anyhow::Result<ChannelDaten> {
        let flags = self.flags()?;
        let max_users = match self.max_users {
            Some(max) => MaxUsers::Begrenzt(max),
            None => MaxUsers::Unbegrenzt,
        };
        ChannelDaten::neu(
            self.name.clone(),
            self.topic.clone(),
            self.beschreibung.clone(),
            flags,
            Codec::from_u16(self.codec),
            self.sort_order,
            max_users,
        )
        .with_context(|| format!("Kanal '{}' ist ungueltig", self.name))
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        let config = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str::<Self>(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Self::default()
            }
            Err(e) => bail!("Konfigurationsdatei '{pfad}' nicht lesbar: {e}"),
        };
        config.validieren()?;
        Ok(config)
    }

    /// Prueft Logging-Werte und den Kanalbaum
    ///
    /// Hoechstens ein Standardkanal; Elternkanaele muessen vorher deklariert
    /// sein, selbst Oberkanaele sein und `subchannels` tragen.
    pub fn validieren(&self) -> anyhow::Result<()> {
        if !log_level_gueltig(&self.logging.level) {
            bail!("Ungueltiger Log-Level '{}'", self.logging.level);
        }
        if !log_format_gueltig(&self.logging.format) {
            bail!("Ungueltiges Log-Format '{}'", self.logging.format);
        }

        // Name -> (Flags, ist Oberkanal)
        let mut bekannt: HashMap<&str, (ChannelFlags, bool)> = HashMap::new();
        let mut standard: Option<&str> = None;
        for kanal in &self.kanaele {
            let flags = kanal.kanal_daten()?.flags;
            if bekannt.contains_key(kanal.name.as_str()) {
                bail!("Kanal '{}' ist doppelt konfiguriert", kanal.name);
            }
            if flags.contains(ChannelFlags::DEFAULT) {
                if let Some(erster) = standard {
                    bail!(
                        "Mehrere Standardkanaele konfiguriert: '{erster}' und '{}'",
                        kanal.name
                    );
                }
                standard = Some(kanal.name.as_str());
            }
            if flags.contains(ChannelFlags::PASSWORD) && kanal.passwort.is_none() {
                bail!("Kanal '{}' hat das Flag 'password' aber kein Passwort", kanal.name);
            }
            if let Some(eltern) = &kanal.eltern {
                if flags.contains(ChannelFlags::DEFAULT) {
                    bail!("Standardkanal '{}' kann kein Unterkanal sein", kanal.name);
                }
                if kanal.passwort.is_some() {
                    bail!("Unterkanal '{}' erbt das Passwort seines Elternkanals", kanal.name);
                }
                match bekannt.get(eltern.as_str()) {
                    None => bail!(
                        "Elternkanal '{eltern}' von '{}' muss vorher konfiguriert sein",
                        kanal.name
                    ),
                    Some((_, false)) => bail!("Elternkanal '{eltern}' ist selbst ein Unterkanal"),
                    Some((eltern_flags, true)) if !eltern_flags.contains(ChannelFlags::SUBCHANNELS) => {
                        bail!("Elternkanal '{eltern}' erlaubt keine Unterkanaele")
                    }
                    Some(_) => {}
                }
            }
            bekannt.insert(kanal.name.as_str(), (flags, kanal.eltern.is_none()));
        }
        Ok(())
    }

    /// Kapazitaeten fuer die Registry
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            max_kanaele: self.server.max_kanaele,
            max_spieler: self.server.max_spieler,
            max_bans: self.server.max_bans,
        }
    }
}
