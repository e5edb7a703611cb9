//! Fehlertypen fuer Stammtisch
//!
//! Zentraler Fehler-Enum fuer Registry, Hierarchie, Mitgliedschaft,
//! Privilegien und Wire-Codec. Kein Fehler ist fatal: jede Operation
//! liefert ihr Ergebnis explizit zurueck.

use thiserror::Error;

use crate::types::ChannelId;

/// Globaler Result-Alias fuer Stammtisch
pub type Result<T> = std::result::Result<T, StammtischError>;

/// Alle moeglichen Fehler im Zustandskern
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StammtischError {
    // --- Kapazitaet ---
    #[error("Kanal {kanal} ist voll (maximal {max} Benutzer)")]
    KapazitaetUeberschritten { kanal: ChannelId, max: u16 },

    #[error("Ablage voll: maximal {max_slots} Eintraege")]
    AblageVoll { max_slots: usize },

    // --- Aufruferfehler ---
    #[error("Ungueltiges Argument: {0}")]
    UngueltigesArgument(String),

    #[error("Operation nicht unterstuetzt: {0}")]
    NichtUnterstuetzt(String),

    #[error("Nicht gefunden: {0}")]
    NichtGefunden(String),

    #[error("Kanal {0} ist nicht passwortgeschuetzt")]
    KeinPasswortschutz(ChannelId),

    // --- Eingabe ---
    #[error("Fehlerhafte Eingabe: {0}")]
    FehlerhafteEingabe(String),

    // --- Persistenz ---
    #[error("Persistenzfehler: {0}")]
    Persistenz(String),
}

impl StammtischError {
    pub fn ungueltig(msg: impl Into<String>) -> Self {
        Self::UngueltigesArgument(msg.into())
    }

    pub fn nicht_gefunden(msg: impl Into<String>) -> Self {
        Self::NichtGefunden(msg.into())
    }

    pub fn fehlerhaft(msg: impl Into<String>) -> Self {
        Self::FehlerhafteEingabe(msg.into())
    }

    /// Gibt true zurueck wenn der Aufrufer auf einen anderen Kanal
    /// ausweichen kann (Kanal oder Ablage voll)
    pub fn ist_kapazitaetsfehler(&self) -> bool {
        matches!(
            self,
            Self::KapazitaetUeberschritten { .. } | Self::AblageVoll { .. }
        )
    }
}
