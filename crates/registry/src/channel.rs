//! Kanal-Entitaet der Registry
//!
//! Ein Kanal haelt seine Metadaten, das Passwort (nur bei Oberkanaelen
//! massgeblich), die Mitgliederliste, die Unterkanal-Liste und die
//! Privilegien der Gruppe. Eltern- und Unterkanaele sowie Mitglieder
//! sind IDs in die Registry, keine besitzenden Referenzen.

use stammtisch_core::{
    ChannelDaten, ChannelFlags, ChannelId, Codec, MaxUsers, Passwort, PlayerId, PrivilegRecord,
    Result,
};
use stammtisch_protocol::{channel as wire, ChannelAnsicht};

use crate::container::HatId;

/// Kanal in der Registry
#[derive(Debug, Clone)]
pub struct Channel {
    id: ChannelId,
    daten: ChannelDaten,
    passwort: Passwort,
    pub(crate) eltern: Option<ChannelId>,
    pub(crate) unterkanaele: Vec<ChannelId>,
    pub(crate) spieler: Vec<PlayerId>,
    pub(crate) privilegien: Vec<PrivilegRecord>,
}

impl HatId for Channel {
    type Id = ChannelId;

    fn id(&self) -> ChannelId {
        self.id
    }
}

impl Channel {
    /// Wird nur von der Registry beim Einfuegen aufgerufen
    pub(crate) fn neu(id: ChannelId, daten: ChannelDaten) -> Self {
        Self {
            id,
            daten,
            passwort: Passwort::leer(),
            eltern: None,
            unterkanaele: Vec::new(),
            spieler: Vec::new(),
            privilegien: Vec::new(),
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn daten(&self) -> &ChannelDaten {
        &self.daten
    }

    pub fn name(&self) -> &str {
        &self.daten.name
    }

    pub fn topic(&self) -> &str {
        &self.daten.topic
    }

    pub fn beschreibung(&self) -> &str {
        &self.daten.beschreibung
    }

    /// Eigene Flags. Bei Unterkanaelen gelten stattdessen die
    /// effektiven Flags (siehe `Registry::effektive_flags`).
    pub fn gespeicherte_flags(&self) -> ChannelFlags {
        self.daten.flags
    }

    pub fn codec(&self) -> Codec {
        self.daten.codec
    }

    pub fn sort_order(&self) -> u16 {
        self.daten.sort_order
    }

    pub fn max_users(&self) -> MaxUsers {
        self.daten.max_users
    }

    pub fn eltern(&self) -> Option<ChannelId> {
        self.eltern
    }

    pub fn ist_oberkanal(&self) -> bool {
        self.eltern.is_none()
    }

    pub fn unterkanaele(&self) -> &[ChannelId] {
        &self.unterkanaele
    }

    pub fn spieler(&self) -> &[PlayerId] {
        &self.spieler
    }

    pub fn spieler_anzahl(&self) -> usize {
        self.spieler.len()
    }

    pub fn privilegien(&self) -> &[PrivilegRecord] {
        &self.privilegien
    }

    pub(crate) fn passwort(&self) -> &Passwort {
        &self.passwort
    }

    pub(crate) fn passwort_ersetzen(&mut self, passwort: Passwort) {
        self.passwort = passwort;
    }

    pub(crate) fn flags_ersetzen(&mut self, flags: ChannelFlags) {
        self.daten.flags = flags;
    }

    pub(crate) fn max_users_ersetzen(&mut self, max_users: MaxUsers) {
        self.daten.max_users = max_users;
    }

    pub fn topic_setzen(&mut self, topic: impl Into<String>) -> Result<()> {
        self.texte_aendern(|d, t| d.topic = t, topic.into())
    }

    pub fn beschreibung_setzen(&mut self, beschreibung: impl Into<String>) -> Result<()> {
        self.texte_aendern(|d, t| d.beschreibung = t, beschreibung.into())
    }

    pub fn name_setzen(&mut self, name: impl Into<String>) -> Result<()> {
        self.texte_aendern(|d, t| d.name = t, name.into())
    }

    pub fn sort_order_setzen(&mut self, sort_order: u16) {
        self.daten.sort_order = sort_order;
    }

    pub fn codec_setzen(&mut self, codec: Codec) {
        self.daten.codec = codec;
    }

    // Validiert auf einer Kopie, damit ein Fehler nichts veraendert
    fn texte_aendern(&mut self, setzen: impl FnOnce(&mut ChannelDaten, String), text: String) -> Result<()> {
        let mut neu = self.daten.clone();
        setzen(&mut neu, text);
        neu.validieren()?;
        self.daten = neu;
        Ok(())
    }

    /// Sicht fuer den Wire-Codec
    pub fn ansicht(&self) -> ChannelAnsicht<'_> {
        ChannelAnsicht {
            id: self.id,
            parent_id: self.eltern,
            daten: &self.daten,
        }
    }

    /// Groesse im Wire-Format, ohne zu kodieren
    pub fn encoded_size(&self) -> usize {
        wire::encoded_size(&self.daten)
    }

    /// Kodiert den Kanal ins Wire-Format
    pub fn encode(&self) -> Vec<u8> {
        wire::encode(self.ansicht())
    }
}
