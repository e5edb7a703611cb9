//! Spieler-Entitaet der Registry

use bitflags::bitflags;

use stammtisch_core::{ChannelId, PlayerId, PrivilegIdentitaet, RegistrationId};

use crate::container::HatId;

bitflags! {
    /// Serverweite Flags eines Spielers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct GlobalFlags: u16 {
        const SERVERADMIN = 0x0001;
        const ALLOWREG    = 0x0002;
        const REGISTERED  = 0x0004;
    }
}

/// Daten zum Anlegen eines neuen Spielers
#[derive(Debug, Clone)]
pub struct NeuerSpieler<'a> {
    pub name: &'a str,
    pub machine: &'a str,
    /// Konto-Handle, nur bei registrierten Spielern gesetzt
    pub registrierung: Option<RegistrationId>,
    pub global_flags: GlobalFlags,
}

impl<'a> NeuerSpieler<'a> {
    /// Unregistrierter Gast
    pub fn gast(name: &'a str, machine: &'a str) -> Self {
        Self {
            name,
            machine,
            registrierung: None,
            global_flags: GlobalFlags::empty(),
        }
    }

    /// Spieler mit registriertem Konto
    pub fn registriert(name: &'a str, machine: &'a str, registrierung: RegistrationId) -> Self {
        Self {
            name,
            machine,
            registrierung: Some(registrierung),
            global_flags: GlobalFlags::REGISTERED,
        }
    }
}

/// Verbundener Spieler
#[derive(Debug, Clone)]
pub struct Player {
    public_id: PlayerId,
    private_id: u32,
    pub name: String,
    pub machine: String,
    pub registrierung: Option<RegistrationId>,
    pub global_flags: GlobalFlags,
    pub(crate) kanal: Option<ChannelId>,
}

impl HatId for Player {
    type Id = PlayerId;

    fn id(&self) -> PlayerId {
        self.public_id
    }
}

impl Player {
    pub(crate) fn neu(public_id: PlayerId, private_id: u32, daten: NeuerSpieler<'_>) -> Self {
        Self {
            public_id,
            private_id,
            name: daten.name.to_string(),
            machine: daten.machine.to_string(),
            registrierung: daten.registrierung,
            global_flags: daten.global_flags,
            kanal: None,
        }
    }

    pub fn public_id(&self) -> PlayerId {
        self.public_id
    }

    pub fn private_id(&self) -> u32 {
        self.private_id
    }

    /// Aktueller Kanal (nicht besitzende Rueckreferenz)
    pub fn kanal(&self) -> Option<ChannelId> {
        self.kanal
    }

    /// Registriert ist nur wer das Flag und ein Konto-Handle hat
    pub fn ist_registriert(&self) -> bool {
        self.global_flags.contains(GlobalFlags::REGISTERED) && self.registrierung.is_some()
    }

    /// Identitaet unter der Privilegien gesucht und angelegt werden
    pub fn privileg_identitaet(&self) -> PrivilegIdentitaet {
        match self.registrierung {
            Some(reg) if self.global_flags.contains(GlobalFlags::REGISTERED) => {
                PrivilegIdentitaet::Registriert(reg)
            }
            _ => PrivilegIdentitaet::Unregistriert(self.public_id),
        }
    }
}
