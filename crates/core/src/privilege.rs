//! Privileg-Datensaetze pro (Identitaet, Kanalgruppe)
//!
//! Ein Privileg gehoert immer dem obersten Kanal einer Gruppe und gilt
//! fuer alle seine Unterkanaele. Die Identitaet ist entweder ein
//! registriertes Konto oder ein fluechtiger, unregistrierter Spieler.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::types::{ChannelId, PlayerId, RegistrationId};

bitflags! {
    /// Privilegien eines Spielers in einer Kanalgruppe
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KanalPrivilegien: u16 {
        const CHANADMIN     = 0x0001;
        const OPERATOR      = 0x0002;
        const VOICE         = 0x0004;
        const AUTO_OPERATOR = 0x0008;
        const AUTO_VOICE    = 0x0010;
    }
}

/// Wem ein Privileg-Datensatz gehoert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrivilegIdentitaet {
    /// Registriertes Konto, wird dauerhaft gespeichert
    Registriert(RegistrationId),
    /// Unregistrierter Spieler, lebt nur fuer die Sitzung
    Unregistriert(PlayerId),
}

impl PrivilegIdentitaet {
    pub fn ist_registriert(&self) -> bool {
        matches!(self, Self::Registriert(_))
    }
}

/// Privileg-Datensatz
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegRecord {
    /// Oberster Kanal der Gruppe
    pub kanal: ChannelId,
    pub identitaet: PrivilegIdentitaet,
    pub privilegien: KanalPrivilegien,
}

impl PrivilegRecord {
    /// Neuer Datensatz ohne Privilegien
    pub fn neu(kanal: ChannelId, identitaet: PrivilegIdentitaet) -> Self {
        Self {
            kanal,
            identitaet,
            privilegien: KanalPrivilegien::empty(),
        }
    }

    /// Prueft ob ein bestimmtes Privileg gesetzt ist
    pub fn hat_privileg(&self, privileg: KanalPrivilegien) -> bool {
        self.privilegien.contains(privileg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neuer_datensatz_ist_leer() {
        let rec = PrivilegRecord::neu(ChannelId(1), PrivilegIdentitaet::Unregistriert(PlayerId(9)));
        assert!(rec.privilegien.is_empty());
        assert!(!rec.identitaet.ist_registriert());
        assert!(!rec.hat_privileg(KanalPrivilegien::VOICE));
    }

    #[test]
    fn identitaet_varianten_sind_verschieden() {
        let a = PrivilegIdentitaet::Registriert(RegistrationId(5));
        let b = PrivilegIdentitaet::Unregistriert(PlayerId(5));
        assert_ne!(a, b);
        assert!(a.ist_registriert());
    }
}
