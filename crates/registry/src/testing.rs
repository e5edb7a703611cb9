//! Hilfen fuer die Unit-Tests der Registry

use std::sync::Mutex;

use stammtisch_core::{
    ChannelDaten, ChannelFlags, Codec, MaxUsers, PlayerId, PrivilegRecord, PrivilegSpeicher,
    Result, StammtischError,
};

use crate::player::NeuerSpieler;
use crate::registry::Registry;

/// Normaler Kanal mit Platz fuer 10 Spieler
pub(crate) fn kanal_daten(name: &str, flags: ChannelFlags) -> ChannelDaten {
    ChannelDaten {
        name: name.to_string(),
        topic: format!("{name} Topic"),
        beschreibung: String::new(),
        flags,
        codec: Codec::Speex19_5,
        sort_order: 0,
        max_users: MaxUsers::Begrenzt(10),
    }
}

/// Standardkanal ohne Obergrenze
pub(crate) fn standard_daten(name: &str) -> ChannelDaten {
    ChannelDaten {
        flags: ChannelFlags::DEFAULT,
        max_users: MaxUsers::Unbegrenzt,
        ..kanal_daten(name, ChannelFlags::empty())
    }
}

pub(crate) fn gast_anlegen(reg: &mut Registry, name: &str) -> PlayerId {
    reg.spieler_hinzufuegen(NeuerSpieler::gast(name, "test"))
        .expect("Gast muss angelegt werden")
}

/// Merkt sich jeden gespeicherten Datensatz
#[derive(Debug, Default)]
pub(crate) struct AufzeichnenderSpeicher {
    datensaetze: Mutex<Vec<PrivilegRecord>>,
}

impl AufzeichnenderSpeicher {
    pub(crate) fn gespeichert(&self) -> Vec<PrivilegRecord> {
        self.datensaetze.lock().expect("Mutex vergiftet").clone()
    }
}

impl PrivilegSpeicher for AufzeichnenderSpeicher {
    fn privileg_speichern(&self, privileg: &PrivilegRecord) -> Result<()> {
        self.datensaetze
            .lock()
            .expect("Mutex vergiftet")
            .push(privileg.clone());
        Ok(())
    }
}

/// Speicher der immer fehlschlaegt
#[derive(Debug)]
pub(crate) struct FehlerSpeicher;

impl PrivilegSpeicher for FehlerSpeicher {
    fn privileg_speichern(&self, _privileg: &PrivilegRecord) -> Result<()> {
        Err(StammtischError::Persistenz("Datenbank nicht erreichbar".into()))
    }
}
