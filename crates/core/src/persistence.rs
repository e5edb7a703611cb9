//! Persistenz-Schnittstelle fuer Privilegien
//!
//! Der Zustandskern ruft diese Schnittstelle synchron auf, sobald ein
//! Privileg eines registrierten Kontos in einem registrierten Kanal
//! entsteht oder sich aendert. Die Implementierung erfolgt im
//! Datenbank-Crate (Warteschlange + Worker-Task), fuer Tests genuegt
//! [`KeinSpeicher`].

use crate::error::Result;
use crate::privilege::PrivilegRecord;

/// Trait fuer die dauerhafte Ablage von Privilegien
///
/// Die Semantik ist "einfuegen oder ersetzen" pro (Kanal, Konto).
/// Fehler werden vom Aufrufer protokolliert und nicht zurueckgerollt.
pub trait PrivilegSpeicher: Send + Sync + 'static {
    /// Speichert einen Privileg-Datensatz
    fn privileg_speichern(&self, privileg: &PrivilegRecord) -> Result<()>;
}

/// Speicher der nichts speichert (Registry ohne Datenbank)
#[derive(Debug, Clone, Copy, Default)]
pub struct KeinSpeicher;

impl PrivilegSpeicher for KeinSpeicher {
    fn privileg_speichern(&self, _privileg: &PrivilegRecord) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privilege::PrivilegIdentitaet;
    use crate::types::{ChannelId, RegistrationId};

    #[test]
    fn kein_speicher_ist_immer_erfolgreich() {
        let rec = PrivilegRecord::neu(
            ChannelId(1),
            PrivilegIdentitaet::Registriert(RegistrationId(2)),
        );
        assert!(KeinSpeicher.privileg_speichern(&rec).is_ok());
    }
}
