//! Wire-Format eines Kanals
//!
//! Direkte Byte-Serialisierung, kein serde. Alle Zahlen big-endian,
//! kein Padding.
//!
//! ```text
//! Offset  Len  Beschreibung
//! ------  ---  -----------
//!  0       4   Kanal-ID
//!  4       2   Flags
//!  6       2   Codec
//!  8       4   Eltern-ID (0xFFFFFFFF = kein Elternkanal)
//! 12       2   Sortierung
//! 14       2   max_users (0xFFFF beim Standardkanal = unbegrenzt)
//! 16+      N   name\0 topic\0 beschreibung\0
//! ```
//!
//! Dekodierte Kanaele sind noch nicht verknuepft: sie tragen nur die rohe
//! Eltern-ID. Die Registry loest diese in einem zweiten Durchlauf auf,
//! sobald alle Kanaele eines Stapels bekannt sind.

use bytes::{Buf, BufMut};

use stammtisch_core::{
    ChannelDaten, ChannelFlags, ChannelId, Codec, MaxUsers, Result, StammtischError,
};

/// Groesse des festen Kopfteils in Bytes
pub const KOPF_GROESSE: usize = 16;

/// Wire-Wert fuer "kein Elternkanal"
pub const KEIN_ELTERNKANAL: u32 = 0xFFFF_FFFF;

// ---------------------------------------------------------------------------
// Ansichten
// ---------------------------------------------------------------------------

/// Geliehene Sicht auf alles was ein Kanal auf dem Draht braucht
#[derive(Debug, Clone, Copy)]
pub struct ChannelAnsicht<'a> {
    pub id: ChannelId,
    pub parent_id: Option<ChannelId>,
    pub daten: &'a ChannelDaten,
}

/// Dekodierter, noch nicht verknuepfter Kanal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedChannel {
    pub id: ChannelId,
    /// Rohe Eltern-ID, wird erst von der Registry aufgeloest
    pub parent_id: Option<ChannelId>,
    pub daten: ChannelDaten,
}

impl UnresolvedChannel {
    pub fn ansicht(&self) -> ChannelAnsicht<'_> {
        ChannelAnsicht {
            id: self.id,
            parent_id: self.parent_id,
            daten: &self.daten,
        }
    }
}

// ---------------------------------------------------------------------------
// Kodieren
// ---------------------------------------------------------------------------

/// Anzahl der Bytes die `encode` schreiben wird
pub fn encoded_size(daten: &ChannelDaten) -> usize {
    KOPF_GROESSE
        + daten.name.len()
        + 1
        + daten.topic.len()
        + 1
        + daten.beschreibung.len()
        + 1
}

/// Schreibt einen Kanal in `dst` und gibt die Anzahl geschriebener Bytes zurueck
pub fn encode_into<B: BufMut>(kanal: ChannelAnsicht<'_>, dst: &mut B) -> usize {
    let daten = kanal.daten;
    let vorher = dst.remaining_mut();

    dst.put_u32(kanal.id.inner());
    dst.put_u16(daten.flags.bits());
    dst.put_u16(daten.codec.als_u16());
    dst.put_u32(kanal.parent_id.map_or(KEIN_ELTERNKANAL, |p| p.inner()));
    dst.put_u16(daten.sort_order);
    dst.put_u16(daten.max_users.wire_wert());
    for text in [&daten.name, &daten.topic, &daten.beschreibung] {
        dst.put_slice(text.as_bytes());
        dst.put_u8(0);
    }

    vorher - dst.remaining_mut()
}

/// Kodiert einen Kanal in einen neuen Byte-Vec
pub fn encode(kanal: ChannelAnsicht<'_>) -> Vec<u8> {
    let groesse = encoded_size(kanal.daten);
    let mut buf = Vec::with_capacity(groesse);
    let geschrieben = encode_into(kanal, &mut buf);
    assert_eq!(
        geschrieben, groesse,
        "Kanalgroesse weicht von den geschriebenen Bytes ab"
    );
    buf
}

// ---------------------------------------------------------------------------
// Dekodieren
// ---------------------------------------------------------------------------

/// Dekodiert einen Kanal vom Anfang von `buf`
///
/// Gibt den unverknuepften Kanal und die Anzahl verbrauchter Bytes zurueck.
///
/// # Fehler
/// - `FehlerhafteEingabe` wenn der Kopf unvollstaendig ist
/// - `FehlerhafteEingabe` wenn ein Text nicht innerhalb der Restlaenge
///   mit einem Null-Byte endet oder kein gueltiges UTF-8 ist
pub fn decode(buf: &[u8]) -> Result<(UnresolvedChannel, usize)> {
    // Kopf + mindestens drei Null-Bytes
    if buf.len() < KOPF_GROESSE + 3 {
        return Err(StammtischError::fehlerhaft(format!(
            "Kanal zu kurz: {} Bytes (mindestens {})",
            buf.len(),
            KOPF_GROESSE + 3
        )));
    }

    let mut kopf = &buf[..KOPF_GROESSE];
    let id = ChannelId(kopf.get_u32());
    let flags = ChannelFlags::from_bits_retain(kopf.get_u16());
    let codec = Codec::from_u16(kopf.get_u16());
    let parent_roh = kopf.get_u32();
    let sort_order = kopf.get_u16();
    let max_users = MaxUsers::aus_wire(kopf.get_u16(), flags);

    let mut pos = KOPF_GROESSE;
    // Jeder Text muss Platz fuer die Null-Bytes der folgenden Texte lassen
    let name = text_lesen(buf, &mut pos, buf.len() - 2, "name")?;
    let topic = text_lesen(buf, &mut pos, buf.len() - 1, "topic")?;
    let beschreibung = text_lesen(buf, &mut pos, buf.len(), "beschreibung")?;

    let parent_id = (parent_roh != KEIN_ELTERNKANAL).then_some(ChannelId(parent_roh));

    let kanal = UnresolvedChannel {
        id,
        parent_id,
        daten: ChannelDaten {
            name,
            topic,
            beschreibung,
            flags,
            codec,
            sort_order,
            max_users,
        },
    };
    Ok((kanal, pos))
}

/// Liest einen Null-terminierten Text aus `buf[*pos..grenze]`
fn text_lesen(buf: &[u8], pos: &mut usize, grenze: usize, feld: &str) -> Result<String> {
    let fenster = buf.get(*pos..grenze).unwrap_or(&[]);
    let laenge = fenster.iter().position(|b| *b == 0).ok_or_else(|| {
        StammtischError::fehlerhaft(format!(
            "Feld '{feld}' endet nicht innerhalb von {} Bytes",
            fenster.len()
        ))
    })?;

    let text = String::from_utf8(fenster[..laenge].to_vec())
        .map_err(|e| StammtischError::fehlerhaft(format!("Feld '{feld}' ist kein UTF-8: {e}")))?;
    *pos += laenge + 1;
    Ok(text)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lobby() -> ChannelDaten {
        ChannelDaten::neu(
            "Lobby",
            "t",
            "d",
            ChannelFlags::SUBCHANNELS,
            Codec::Celp6_3,
            0,
            MaxUsers::Begrenzt(10),
        )
        .unwrap()
    }

    fn lobby_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&5u32.to_be_bytes());
        buf.extend_from_slice(&0x0008u16.to_be_bytes());
        buf.extend_from_slice(&1u16.to_be_bytes());
        buf.extend_from_slice(&0xFFFF_FFFFu32.to_be_bytes());
        buf.extend_from_slice(&0u16.to_be_bytes());
        buf.extend_from_slice(&10u16.to_be_bytes());
        buf.extend_from_slice(b"Lobby\0t\0d\0");
        buf
    }

    #[test]
    fn lobby_dekodieren() {
        let (kanal, verbraucht) = decode(&lobby_bytes()).unwrap();
        assert_eq!(verbraucht, 26);
        assert_eq!(kanal.id, ChannelId(5));
        assert_eq!(kanal.parent_id, None);
        assert_eq!(kanal.daten, lobby());
    }

    #[test]
    fn lobby_kodieren_ist_bitgenau() {
        let daten = lobby();
        let bytes = encode(ChannelAnsicht {
            id: ChannelId(5),
            parent_id: None,
            daten: &daten,
        });
        assert_eq!(bytes, lobby_bytes());
        assert_eq!(encoded_size(&daten), bytes.len());
    }

    #[test]
    fn elternkanal_wird_als_rohe_id_gelesen() {
        let daten = ChannelDaten::vordefiniert();
        let bytes = encode(ChannelAnsicht {
            id: ChannelId(9),
            parent_id: Some(ChannelId(2)),
            daten: &daten,
        });
        assert_eq!(&bytes[8..12], &2u32.to_be_bytes());

        let (kanal, verbraucht) = decode(&bytes).unwrap();
        assert_eq!(kanal.parent_id, Some(ChannelId(2)));
        assert_eq!(verbraucht, bytes.len());
        assert_eq!(kanal.daten, daten);
    }

    #[test]
    fn unbekannte_flags_und_codec_bleiben_erhalten() {
        let mut bytes = lobby_bytes();
        bytes[4..6].copy_from_slice(&0x4008u16.to_be_bytes());
        bytes[6..8].copy_from_slice(&77u16.to_be_bytes());

        let (kanal, _) = decode(&bytes).unwrap();
        assert_eq!(kanal.daten.flags.bits(), 0x4008);
        assert_eq!(kanal.daten.codec, Codec::Unbekannt(77));
        assert_eq!(encode(kanal.ansicht()), bytes);
    }

    #[test]
    fn standardkanal_unbegrenzt() {
        let daten = ChannelDaten::neu(
            "Standard",
            "",
            "",
            ChannelFlags::DEFAULT,
            Codec::Speex19_5,
            0,
            MaxUsers::Unbegrenzt,
        )
        .unwrap();
        let bytes = encode(ChannelAnsicht {
            id: ChannelId(1),
            parent_id: None,
            daten: &daten,
        });
        assert_eq!(&bytes[14..16], &[0xFF, 0xFF]);
        let (kanal, _) = decode(&bytes).unwrap();
        assert_eq!(kanal.daten.max_users, MaxUsers::Unbegrenzt);
    }

    #[test]
    fn leere_texte() {
        let daten = ChannelDaten::neu(
            "",
            "",
            "",
            ChannelFlags::empty(),
            Codec::Gsm14_8,
            3,
            MaxUsers::Begrenzt(2),
        )
        .unwrap();
        let bytes = encode(ChannelAnsicht {
            id: ChannelId(1),
            parent_id: None,
            daten: &daten,
        });
        assert_eq!(bytes.len(), KOPF_GROESSE + 3);
        let (kanal, verbraucht) = decode(&bytes).unwrap();
        assert_eq!(verbraucht, KOPF_GROESSE + 3);
        assert_eq!(kanal.daten, daten);
    }

    #[test]
    fn verbraucht_nur_den_ersten_kanal() {
        let mut bytes = lobby_bytes();
        bytes.extend_from_slice(&lobby_bytes());
        let (_, verbraucht) = decode(&bytes).unwrap();
        assert_eq!(verbraucht, 26);
        let (zweiter, _) = decode(&bytes[verbraucht..]).unwrap();
        assert_eq!(zweiter.id, ChannelId(5));
    }

    #[test]
    fn zu_kurzer_kopf() {
        let res = decode(&lobby_bytes()[..10]);
        assert!(matches!(res, Err(StammtischError::FehlerhafteEingabe(_))));
    }

    #[test]
    fn fehlendes_null_byte() {
        let mut bytes = lobby_bytes();
        bytes.pop();
        bytes.push(b'x');
        let res = decode(&bytes);
        assert!(matches!(res, Err(StammtischError::FehlerhafteEingabe(_))));
    }

    #[test]
    fn name_ohne_platz_fuer_folgende_texte() {
        // "Lobby\0" und danach nur noch ein Byte: topic und desc passen nicht
        let mut bytes = lobby_bytes();
        bytes.truncate(KOPF_GROESSE + 6 + 1);
        let res = decode(&bytes);
        assert!(matches!(res, Err(StammtischError::FehlerhafteEingabe(_))));
    }

    #[test]
    fn ungueltiges_utf8() {
        let mut bytes = lobby_bytes();
        bytes[KOPF_GROESSE] = 0xFF;
        let res = decode(&bytes);
        assert!(matches!(res, Err(StammtischError::FehlerhafteEingabe(_))));
    }
}
