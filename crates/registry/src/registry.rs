//! Entitaeten-Registry eines Servers
//!
//! Einziger Besitzer aller Kanaele, Spieler und Bans. Vergibt IDs beim
//! Einfuegen, bietet Lookups nach ID und sorgt dafuer, dass hoechstens
//! ein Kanal den Standardkanal-Flag traegt.
//!
//! Die Registry ist nicht thread-safe: jede Operation setzt exklusiven
//! Zugriff voraus. In einem Multi-Thread-Server wird sie als Ganzes hinter
//! eine einzige Sperre gelegt.

use std::net::Ipv4Addr;
use std::sync::Arc;

use bytes::BytesMut;
use tokio_util::codec::Encoder;

use stammtisch_core::{
    channel::MAX_USERS_UNBEGRENZT, BanId, ChannelDaten, ChannelFlags, ChannelId, KeinSpeicher,
    MaxUsers, PlayerId, PrivilegIdentitaet, PrivilegSpeicher, Result, StammtischError,
};
use stammtisch_protocol::KanalFrameCodec;

use crate::ban::{Ban, NeuerBan};
use crate::channel::Channel;
use crate::container::{kleinste_freie_id, Ablage};
use crate::player::{NeuerSpieler, Player};

/// Kapazitaeten der Registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    pub max_kanaele: usize,
    pub max_spieler: usize,
    pub max_bans: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_kanaele: 1024,
            max_spieler: 512,
            max_bans: 1024,
        }
    }
}

/// Entitaeten-Registry
pub struct Registry {
    config: RegistryConfig,
    pub(crate) kanaele: Ablage<Channel>,
    pub(crate) spieler: Ablage<Player>,
    pub(crate) bans: Ablage<Ban>,
    pub(crate) speicher: Arc<dyn PrivilegSpeicher>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("kanaele", &self.kanaele.used_slots())
            .field("spieler", &self.spieler.used_slots())
            .field("bans", &self.bans.used_slots())
            .finish()
    }
}

impl Registry {
    /// Erstellt eine leere Registry mit Persistenz-Anbindung
    pub fn neu(config: RegistryConfig, speicher: Arc<dyn PrivilegSpeicher>) -> Self {
        Self {
            config,
            kanaele: Ablage::neu(config.max_kanaele),
            spieler: Ablage::neu(config.max_spieler),
            bans: Ablage::neu(config.max_bans.min(u16::MAX as usize)),
            speicher,
        }
    }

    /// Registry ohne Datenbank (alle Privilegien leben nur im Speicher)
    pub fn ohne_persistenz(config: RegistryConfig) -> Self {
        Self::neu(config, Arc::new(KeinSpeicher))
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Kanaele
    // -----------------------------------------------------------------------

    pub fn channel_nach_id(&self, id: ChannelId) -> Option<&Channel> {
        self.kanaele.get(id)
    }

    pub fn channel_nach_id_mut(&mut self, id: ChannelId) -> Option<&mut Channel> {
        self.kanaele.get_mut(id)
    }

    /// Wie `channel_nach_id`, aber mit `NichtGefunden` als Fehler
    pub(crate) fn kanal(&self, id: ChannelId) -> Result<&Channel> {
        self.kanaele
            .get(id)
            .ok_or_else(|| StammtischError::nicht_gefunden(format!("Kanal {id}")))
    }

    pub(crate) fn kanal_mut(&mut self, id: ChannelId) -> Result<&mut Channel> {
        self.kanaele
            .get_mut(id)
            .ok_or_else(|| StammtischError::nicht_gefunden(format!("Kanal {id}")))
    }

    /// Alle Kanaele in Einfuegereihenfolge
    pub fn kanaele(&self) -> impl Iterator<Item = &Channel> {
        self.kanaele.iter()
    }

    pub fn kanal_anzahl(&self) -> usize {
        self.kanaele.used_slots()
    }

    /// Fuegt einen neuen Oberkanal ein und vergibt die naechste freie ID
    ///
    /// # Fehler
    /// - `UngueltigesArgument` bei ungueltigen Metadaten oder wenn bereits
    ///   ein Standardkanal existiert und `daten` ebenfalls `DEFAULT` traegt
    /// - `AblageVoll` wenn die Kanal-Ablage voll ist
    pub fn channel_hinzufuegen(&mut self, daten: ChannelDaten) -> Result<ChannelId> {
        let roh = kleinste_freie_id(self.kanaele.iter().map(|k| k.id().inner()), u32::MAX - 1)
            .ok_or(StammtischError::AblageVoll {
                max_slots: self.kanaele.max_slots(),
            })?;
        let id = ChannelId(roh);
        self.channel_mit_id_einfuegen(id, daten)?;
        tracing::info!(kanal_id = %id, "Kanal hinzugefuegt");
        Ok(id)
    }

    /// Fuegt einen Kanal unter einer vorgegebenen ID ein (Import)
    pub(crate) fn channel_mit_id_einfuegen(&mut self, id: ChannelId, daten: ChannelDaten) -> Result<()> {
        daten.validieren()?;
        // 0xFFFFFFFF markiert im Wire-Format "kein Elternkanal"
        if id.inner() == u32::MAX {
            return Err(StammtischError::ungueltig(format!("Kanal-ID {id} ist reserviert")));
        }
        if self.kanaele.enthaelt(id) {
            return Err(StammtischError::ungueltig(format!("Kanal-ID {id} ist bereits vergeben")));
        }
        if daten.flags.contains(ChannelFlags::DEFAULT) {
            if let Ok(vorhanden) = self.default_channel() {
                return Err(StammtischError::ungueltig(format!(
                    "Standardkanal existiert bereits: {}",
                    vorhanden.id()
                )));
            }
        }
        self.kanaele.einfuegen(Channel::neu(id, daten))
    }

    /// Zerstoert einen Kanal
    ///
    /// Mitglieder werden nur abgemeldet, nicht entfernt. Unterkanaele gehoeren
    /// der Registry: sie verlieren nur ihren Elternkanal und bleiben als
    /// Oberkanaele bestehen. Gibt die IDs dieser abgehaengten Kanaele zurueck.
    pub fn channel_zerstoeren(&mut self, id: ChannelId) -> Result<Vec<ChannelId>> {
        let eltern = self.kanal(id)?.eltern();
        if let Some(eltern) = eltern {
            self.unterkanal_abhaengen(eltern, id)?;
        }

        let kanal = self
            .kanaele
            .entfernen(id)
            .ok_or_else(|| StammtischError::nicht_gefunden(format!("Kanal {id}")))?;
        for spieler_id in &kanal.spieler {
            if let Some(spieler) = self.spieler.get_mut(*spieler_id) {
                if spieler.kanal == Some(id) {
                    spieler.kanal = None;
                }
            }
        }
        for unterkanal in &kanal.unterkanaele {
            if let Some(kind) = self.kanaele.get_mut(*unterkanal) {
                kind.eltern = None;
            }
        }
        tracing::info!(
            kanal_id = %id,
            abgehaengt = kanal.unterkanaele.len(),
            "Kanal zerstoert"
        );
        Ok(kanal.unterkanaele)
    }

    /// Der eindeutige Standardkanal
    ///
    /// # Fehler
    /// - `NichtGefunden` solange noch kein Standardkanal angelegt wurde
    pub fn default_channel(&self) -> Result<&Channel> {
        self.kanaele
            .finden(|k| k.ist_oberkanal() && k.gespeicherte_flags().contains(ChannelFlags::DEFAULT))
            .ok_or_else(|| StammtischError::nicht_gefunden("Standardkanal"))
    }

    /// Verschiebt den Standardkanal-Flag auf einen anderen Oberkanal
    pub fn default_channel_setzen(&mut self, id: ChannelId) -> Result<()> {
        if !self.kanal(id)?.ist_oberkanal() {
            return Err(StammtischError::ungueltig(format!(
                "Unterkanal {id} kann kein Standardkanal sein"
            )));
        }
        let alter = self.default_channel().map(|k| k.id()).ok();
        if alter == Some(id) {
            return Ok(());
        }
        if let Some(alter) = alter {
            let kanal = self.kanal_mut(alter)?;
            let flags = kanal.gespeicherte_flags() - ChannelFlags::DEFAULT;
            kanal.flags_ersetzen(flags);
            // Ohne DEFAULT ist "unbegrenzt" nicht darstellbar
            if kanal.max_users() == MaxUsers::Unbegrenzt {
                kanal.max_users_ersetzen(MaxUsers::Begrenzt(MAX_USERS_UNBEGRENZT));
            }
        }
        let kanal = self.kanal_mut(id)?;
        let flags = kanal.gespeicherte_flags() | ChannelFlags::DEFAULT;
        kanal.flags_ersetzen(flags);
        tracing::info!(alter = ?alter, neu = %id, "Standardkanal gewechselt");
        Ok(())
    }

    /// Kodiert alle Kanaele als Frame-Strom, Oberkanaele zuerst
    pub fn channels_exportieren(&self) -> Result<BytesMut> {
        let mut codec = KanalFrameCodec::new();
        let mut buf = BytesMut::new();
        let oberkanaele = self.kanaele.iter().filter(|k| k.ist_oberkanal());
        let unterkanaele = self.kanaele.iter().filter(|k| !k.ist_oberkanal());
        for kanal in oberkanaele.chain(unterkanaele) {
            codec
                .encode(kanal.ansicht(), &mut buf)
                .map_err(|e| StammtischError::ungueltig(format!("Kanal {}: {e}", kanal.id())))?;
        }
        Ok(buf)
    }

    /// Schreibt den Kanalbaum ins Log
    pub fn kanalbaum_protokollieren(&self) {
        for kanal in self.kanaele.iter().filter(|k| k.ist_oberkanal()) {
            self.kanal_protokollieren(kanal, 0);
            for unterkanal_id in kanal.unterkanaele() {
                if let Some(unterkanal) = self.kanaele.get(*unterkanal_id) {
                    self.kanal_protokollieren(unterkanal, 1);
                }
            }
        }
    }

    fn kanal_protokollieren(&self, kanal: &Channel, tiefe: usize) {
        tracing::info!(
            kanal_id = %kanal.id(),
            tiefe,
            name = kanal.name(),
            topic = kanal.topic(),
            beschreibung = kanal.beschreibung(),
            standard = kanal.ist_oberkanal()
                && kanal.gespeicherte_flags().contains(ChannelFlags::DEFAULT),
            spieler = kanal.spieler_anzahl(),
            "Kanal"
        );
    }

    // -----------------------------------------------------------------------
    // Spieler
    // -----------------------------------------------------------------------

    pub fn spieler_nach_ids(&self, public_id: PlayerId, private_id: u32) -> Option<&Player> {
        self.spieler
            .get(public_id)
            .filter(|p| p.private_id() == private_id)
    }

    pub fn spieler_nach_public_id(&self, public_id: PlayerId) -> Option<&Player> {
        self.spieler.get(public_id)
    }

    pub(crate) fn spieler_ref(&self, id: PlayerId) -> Result<&Player> {
        self.spieler
            .get(id)
            .ok_or_else(|| StammtischError::nicht_gefunden(format!("Spieler {id}")))
    }

    pub(crate) fn spieler_ref_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.spieler
            .get_mut(id)
            .ok_or_else(|| StammtischError::nicht_gefunden(format!("Spieler {id}")))
    }

    pub fn alle_spieler(&self) -> impl Iterator<Item = &Player> {
        self.spieler.iter()
    }

    /// Legt einen Spieler an (noch in keinem Kanal)
    ///
    /// Vergibt die naechste freie oeffentliche ID und eine zufaellige
    /// private ID.
    pub fn spieler_hinzufuegen(&mut self, daten: NeuerSpieler<'_>) -> Result<PlayerId> {
        let roh = kleinste_freie_id(self.spieler.iter().map(|p| p.public_id().inner()), u32::MAX)
            .ok_or(StammtischError::AblageVoll {
                max_slots: self.spieler.max_slots(),
            })?;
        let id = PlayerId(roh);
        let private_id: u32 = rand::random();
        self.spieler.einfuegen(Player::neu(id, private_id, daten))?;
        tracing::debug!(spieler_id = %id, "Spieler hinzugefuegt");
        Ok(id)
    }

    /// Entfernt einen Spieler
    ///
    /// Entfernt ihn aus allen Mitgliederlisten und verwirft seine
    /// Sitzungs-Privilegien.
    pub fn spieler_entfernen(&mut self, id: PlayerId) -> Option<Player> {
        let spieler = self.spieler.entfernen(id)?;
        let identitaet = PrivilegIdentitaet::Unregistriert(id);
        for kanal in self.kanaele.iter_mut() {
            kanal.spieler.retain(|p| *p != id);
            kanal.privilegien.retain(|p| p.identitaet != identitaet);
        }
        tracing::debug!(spieler_id = %id, "Spieler entfernt");
        Some(spieler)
    }

    // -----------------------------------------------------------------------
    // Bans
    // -----------------------------------------------------------------------

    pub fn ban_nach_id(&self, id: BanId) -> Option<&Ban> {
        self.bans.get(id)
    }

    pub fn ban_nach_ip(&self, ip: Ipv4Addr) -> Option<&Ban> {
        self.bans.finden(|b| b.ip == ip)
    }

    pub fn bans(&self) -> impl Iterator<Item = &Ban> {
        self.bans.iter()
    }

    pub fn ban_hinzufuegen(&mut self, daten: NeuerBan<'_>) -> Result<BanId> {
        let roh = kleinste_freie_id(
            self.bans.iter().map(|b| u32::from(b.id().0)),
            u32::from(u16::MAX),
        )
        .ok_or(StammtischError::AblageVoll {
            max_slots: self.bans.max_slots(),
        })?;
        // roh <= u16::MAX ist durch das Maximum garantiert
        let id = BanId(roh as u16);
        let ip = daten.ip;
        self.bans.einfuegen(Ban::neu(id, daten))?;
        tracing::info!(ban_id = %id, ip = %ip, "Ban hinzugefuegt");
        Ok(id)
    }

    pub fn ban_entfernen(&mut self, id: BanId) -> Option<Ban> {
        let ban = self.bans.entfernen(id)?;
        tracing::info!(ban_id = %id, "Ban aufgehoben");
        Some(ban)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
