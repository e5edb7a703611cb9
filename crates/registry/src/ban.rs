//! Ban-Entitaet der Registry

use std::net::Ipv4Addr;

use stammtisch_core::BanId;

use crate::container::HatId;

/// Daten zum Anlegen eines neuen Bans
#[derive(Debug, Clone)]
pub struct NeuerBan<'a> {
    pub ip: Ipv4Addr,
    pub grund: &'a str,
    /// Dauer in Minuten, 0 = permanent
    pub dauer_min: u16,
}

/// IP-Sperre
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ban {
    id: BanId,
    pub ip: Ipv4Addr,
    pub grund: String,
    pub dauer_min: u16,
}

impl HatId for Ban {
    type Id = BanId;

    fn id(&self) -> BanId {
        self.id
    }
}

impl Ban {
    pub(crate) fn neu(id: BanId, daten: NeuerBan<'_>) -> Self {
        Self {
            id,
            ip: daten.ip,
            grund: daten.grund.to_string(),
            dauer_min: daten.dauer_min,
        }
    }

    pub fn id(&self) -> BanId {
        self.id
    }

    pub fn ist_permanent(&self) -> bool {
        self.dauer_min == 0
    }
}
