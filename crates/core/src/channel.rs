//! Kanal-Metadaten
//!
//! Alles was einen Kanal unabhaengig von seiner Position in der Hierarchie
//! beschreibt: Flags, Codec, Kapazitaet, Sortierung und die drei Texte.
//! Die ID wird erst von der Registry beim Einfuegen vergeben und ist
//! deshalb nicht Teil von [`ChannelDaten`].

use bitflags::bitflags;

use crate::error::{Result, StammtischError};

/// Laenge des Passwort-Puffers in Bytes
pub const PASSWORT_LAENGE: usize = 30;

/// Wire-Wert fuer "keine feste Obergrenze" im `max_users`-Feld
pub const MAX_USERS_UNBEGRENZT: u16 = 0xFFFF;

bitflags! {
    /// Flags eines Kanals (u16, big-endian auf dem Draht)
    ///
    /// Unbekannte Bits bleiben beim Dekodieren erhalten und werden
    /// unveraendert wieder kodiert.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ChannelFlags: u16 {
        /// Kanal wird nicht dauerhaft gespeichert, Privilegien ebenfalls nicht
        const UNREGISTERED = 0x0001;
        /// Nur Spieler mit Voice duerfen sprechen
        const MODERATED    = 0x0002;
        /// Beitritt erfordert das Kanal-Passwort
        const PASSWORD     = 0x0004;
        /// Kanal darf Unterkanaele haben
        const SUBCHANNELS  = 0x0008;
        /// Standardkanal fuer neue Spieler
        const DEFAULT      = 0x0010;
    }
}

impl ChannelFlags {
    /// Flags die ein Unterkanal nie von seinem Elternkanal erbt
    pub const NICHT_VERERBBAR: Self = Self::SUBCHANNELS.union(Self::DEFAULT);

    /// Parst einen Flag-Namen wie er in der Konfiguration steht
    pub fn aus_name(name: &str) -> Option<Self> {
        match name {
            "unregistered" => Some(Self::UNREGISTERED),
            "moderated" => Some(Self::MODERATED),
            "password" => Some(Self::PASSWORD),
            "subchannels" => Some(Self::SUBCHANNELS),
            "default" => Some(Self::DEFAULT),
            _ => None,
        }
    }
}

/// Audio-Codec eines Kanals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    Celp5_1,
    Celp6_3,
    Gsm14_8,
    Gsm16_4,
    CelpWindows5_2,
    Speex3_4,
    Speex5_2,
    Speex7_2,
    Speex9_3,
    Speex12_3,
    Speex16_3,
    Speex19_5,
    Speex25_9,
    /// Vom Client gesendeter, hier nicht modellierter Wert
    Unbekannt(u16),
}

impl Codec {
    /// Konvertiert den Wire-Wert in einen `Codec`
    pub fn from_u16(wert: u16) -> Self {
        match wert {
            0 => Self::Celp5_1,
            1 => Self::Celp6_3,
            2 => Self::Gsm14_8,
            3 => Self::Gsm16_4,
            4 => Self::CelpWindows5_2,
            5 => Self::Speex3_4,
            6 => Self::Speex5_2,
            7 => Self::Speex7_2,
            8 => Self::Speex9_3,
            9 => Self::Speex12_3,
            10 => Self::Speex16_3,
            11 => Self::Speex19_5,
            12 => Self::Speex25_9,
            andere => Self::Unbekannt(andere),
        }
    }

    /// Gibt den Wire-Wert zurueck
    pub fn als_u16(&self) -> u16 {
        match self {
            Self::Celp5_1 => 0,
            Self::Celp6_3 => 1,
            Self::Gsm14_8 => 2,
            Self::Gsm16_4 => 3,
            Self::CelpWindows5_2 => 4,
            Self::Speex3_4 => 5,
            Self::Speex5_2 => 6,
            Self::Speex7_2 => 7,
            Self::Speex9_3 => 8,
            Self::Speex12_3 => 9,
            Self::Speex16_3 => 10,
            Self::Speex19_5 => 11,
            Self::Speex25_9 => 12,
            Self::Unbekannt(wert) => *wert,
        }
    }
}

/// Kapazitaet eines Kanals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaxUsers {
    /// Feste Obergrenze fuer die Anzahl der Mitglieder
    Begrenzt(u16),
    /// Keine Obergrenze – nur fuer den Standardkanal zulaessig
    Unbegrenzt,
}

impl MaxUsers {
    /// Wert fuer das `max_users`-Feld im Wire-Format
    pub fn wire_wert(&self) -> u16 {
        match self {
            Self::Begrenzt(max) => *max,
            Self::Unbegrenzt => MAX_USERS_UNBEGRENZT,
        }
    }

    /// Liest den Wire-Wert zurueck.
    ///
    /// `0xFFFF` bedeutet nur beim Standardkanal "unbegrenzt", bei allen
    /// anderen Kanaelen ist es eine gewoehnliche Obergrenze.
    pub fn aus_wire(wert: u16, flags: ChannelFlags) -> Self {
        if wert == MAX_USERS_UNBEGRENZT && flags.contains(ChannelFlags::DEFAULT) {
            Self::Unbegrenzt
        } else {
            Self::Begrenzt(wert)
        }
    }
}

/// Passwort-Puffer fester Groesse (mit Nullen aufgefuellt)
#[derive(Clone, PartialEq, Eq)]
pub struct Passwort([u8; PASSWORT_LAENGE]);

impl Passwort {
    /// Leerer Puffer
    pub fn leer() -> Self {
        Self([0u8; PASSWORT_LAENGE])
    }

    /// Kopiert die Bytes in den Puffer. Ein abschliessendes Null-Byte
    /// muss Platz haben, daher maximal `PASSWORT_LAENGE - 1` Bytes.
    pub fn aus_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() >= PASSWORT_LAENGE {
            return Err(StammtischError::ungueltig(format!(
                "Passwort zu lang: {} Bytes (maximal {})",
                bytes.len(),
                PASSWORT_LAENGE - 1
            )));
        }
        if bytes.contains(&0) {
            return Err(StammtischError::ungueltig("Passwort enthaelt ein Null-Byte"));
        }
        let mut puffer = [0u8; PASSWORT_LAENGE];
        puffer[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(puffer))
    }

    /// Nutzbarer Inhalt bis zum ersten Null-Byte
    pub fn als_bytes(&self) -> &[u8] {
        let ende = self
            .0
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(PASSWORT_LAENGE);
        &self.0[..ende]
    }

    /// Vergleicht mit einem vom Client gesendeten Passwort
    pub fn stimmt_ueberein(&self, kandidat: &[u8]) -> bool {
        self.als_bytes() == kandidat
    }
}

impl Default for Passwort {
    fn default() -> Self {
        Self::leer()
    }
}

// Inhalt wird nie ausgegeben
impl std::fmt::Debug for Passwort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Passwort(***)")
    }
}

/// Metadaten eines Kanals ohne ID und ohne Hierarchie-Verknuepfungen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDaten {
    pub name: String,
    pub topic: String,
    pub beschreibung: String,
    /// Eigene (gespeicherte) Flags – bei Unterkanaelen nicht massgeblich
    pub flags: ChannelFlags,
    pub codec: Codec,
    pub sort_order: u16,
    pub max_users: MaxUsers,
}

impl ChannelDaten {
    /// Erstellt validierte Kanal-Metadaten
    ///
    /// # Fehler
    /// - `UngueltigesArgument` wenn ein Text ein Null-Byte enthaelt
    /// - `UngueltigesArgument` bei unbegrenzter Kapazitaet ohne `DEFAULT`
    pub fn neu(
        name: impl Into<String>,
        topic: impl Into<String>,
        beschreibung: impl Into<String>,
        flags: ChannelFlags,
        codec: Codec,
        sort_order: u16,
        max_users: MaxUsers,
    ) -> Result<Self> {
        let daten = Self {
            name: name.into(),
            topic: topic.into(),
            beschreibung: beschreibung.into(),
            flags,
            codec,
            sort_order,
            max_users,
        };
        daten.validieren()?;
        Ok(daten)
    }

    /// Prueft die Invarianten der Metadaten
    pub fn validieren(&self) -> Result<()> {
        for (feld, text) in [
            ("name", &self.name),
            ("topic", &self.topic),
            ("beschreibung", &self.beschreibung),
        ] {
            if text.as_bytes().contains(&0) {
                return Err(StammtischError::ungueltig(format!(
                    "Feld '{feld}' enthaelt ein Null-Byte"
                )));
            }
        }
        if self.max_users == MaxUsers::Unbegrenzt && !self.flags.contains(ChannelFlags::DEFAULT) {
            return Err(StammtischError::ungueltig(
                "Unbegrenzte Kapazitaet ist nur fuer den Standardkanal zulaessig",
            ));
        }
        Ok(())
    }

    /// Kanal mit den Vorgabewerten fuer neue Kanaele
    pub fn vordefiniert() -> Self {
        Self {
            name: "Channel name".into(),
            topic: "Channel topic".into(),
            beschreibung: "Channel description".into(),
            flags: ChannelFlags::empty(),
            codec: Codec::Speex19_5,
            sort_order: 0,
            max_users: MaxUsers::Begrenzt(16),
        }
    }
}
