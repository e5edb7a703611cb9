//! Wire-Format fuer Kanal-Stroeme
//!
//! Frame-basiertes Protokoll: Length(u32 big-endian) + genau ein Kanal.
//!
//! ## Frame-Format
//!
//! ```text
//! +--------+--------+--------+--------+----...----+
//! | Laenge (u32 BE) | 4 Bytes        | Kanal      |
//! +--------+--------+--------+--------+----...----+
//! ```
//!
//! Ein fehlerhafter Kanal in einem korrekt gerahmten Frame beendet den
//! Strom nicht: der Decoder liefert ihn als `Err` aus und macht mit dem
//! naechsten Frame weiter. Nur ein zu grosser Frame ist ein IO-Fehler.

use bytes::{Buf, BufMut, BytesMut};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, Encoder};

use stammtisch_core::{Result, StammtischError};

use crate::channel::{self, ChannelAnsicht, UnresolvedChannel};

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Standard-maximale Frame-Groesse (64 KiB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

/// Groesse des Laengen-Felds in Bytes
pub const LENGTH_FIELD_SIZE: usize = 4;

/// Ergebnis eines einzelnen Frames
pub type DekodierterKanal = Result<UnresolvedChannel>;

// ---------------------------------------------------------------------------
// KanalFrameCodec
// ---------------------------------------------------------------------------

/// tokio-util Codec fuer Stroeme von Kanaelen
///
/// # Beispiel
///
/// ```rust,no_run
/// use tokio_util::codec::Framed;
/// use stammtisch_protocol::wire::KanalFrameCodec;
///
/// // let stream = TcpStream::connect(...).await?;
/// // let framed = Framed::new(stream, KanalFrameCodec::new());
/// ```
#[derive(Debug, Clone)]
pub struct KanalFrameCodec {
    max_frame_size: usize,
}

impl KanalFrameCodec {
    /// Erstellt einen neuen `KanalFrameCodec` mit Standard-Limits
    pub fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Erstellt einen `KanalFrameCodec` mit benutzerdefinierter maximaler Frame-Groesse
    pub fn with_max_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Default for KanalFrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn zu_gross(laenge: usize, max: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("Frame zu gross: {laenge} Bytes (Maximum: {max} Bytes)"),
    )
}

/// Dekodiert genau einen Kanal aus einem Frame-Inhalt
///
/// Restbytes hinter dem Kanal gelten als fehlerhafte Eingabe.
pub fn frame_inhalt_dekodieren(payload: &[u8]) -> DekodierterKanal {
    let (kanal, verbraucht) = channel::decode(payload)?;
    if verbraucht != payload.len() {
        return Err(StammtischError::fehlerhaft(format!(
            "{} ueberzaehlige Bytes nach Kanal {}",
            payload.len() - verbraucht,
            kanal.id
        )));
    }
    Ok(kanal)
}

// ---------------------------------------------------------------------------
// Decoder-Implementierung
// ---------------------------------------------------------------------------

impl Decoder for KanalFrameCodec {
    type Item = DekodierterKanal;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> std::result::Result<Option<Self::Item>, Self::Error> {
        if src.len() < LENGTH_FIELD_SIZE {
            return Ok(None);
        }

        let length = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;
        if length > self.max_frame_size {
            return Err(zu_gross(length, self.max_frame_size));
        }

        let total_size = LENGTH_FIELD_SIZE + length;
        if src.len() < total_size {
            src.reserve(total_size - src.len());
            return Ok(None);
        }

        src.advance(LENGTH_FIELD_SIZE);
        let payload = src.split_to(length);

        let ergebnis = frame_inhalt_dekodieren(&payload);
        if let Err(e) = &ergebnis {
            tracing::warn!(laenge = length, fehler = %e, "Fehlerhafter Kanal im Frame verworfen");
        }
        Ok(Some(ergebnis))
    }
}

// ---------------------------------------------------------------------------
// Encoder-Implementierung
// ---------------------------------------------------------------------------

impl<'a> Encoder<ChannelAnsicht<'a>> for KanalFrameCodec {
    type Error = io::Error;

    fn encode(&mut self, item: ChannelAnsicht<'a>, dst: &mut BytesMut) -> std::result::Result<(), Self::Error> {
        let groesse = channel::encoded_size(item.daten);
        if groesse > self.max_frame_size {
            return Err(zu_gross(groesse, self.max_frame_size));
        }

        dst.reserve(LENGTH_FIELD_SIZE + groesse);
        dst.put_u32(groesse as u32);
        channel::encode_into(item, dst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Hilfsfunktionen fuer direktes async Lesen/Schreiben
// ---------------------------------------------------------------------------

/// Liest einen einzelnen Frame aus einem `AsyncRead`
///
/// # Fehler
/// - `UnexpectedEof` wenn die Verbindung vor Abschluss des Frames getrennt wird
/// - `InvalidData` bei zu grossem Frame
///
/// Ein fehlerhafter Kanal ist kein IO-Fehler, sondern steckt im inneren `Result`.
pub async fn read_frame<R>(reader: &mut R, max_frame_size: usize) -> io::Result<DekodierterKanal>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; LENGTH_FIELD_SIZE];
    reader.read_exact(&mut len_buf).await?;
    let length = u32::from_be_bytes(len_buf) as usize;

    if length > max_frame_size {
        return Err(zu_gross(length, max_frame_size));
    }

    let mut payload = vec![0u8; length];
    reader.read_exact(&mut payload).await?;

    Ok(frame_inhalt_dekodieren(&payload))
}

/// Schreibt einen einzelnen Kanal als Frame in einen `AsyncWrite`
pub async fn write_frame<W>(
    writer: &mut W,
    kanal: ChannelAnsicht<'_>,
    max_frame_size: usize,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let bytes = channel::encode(kanal);
    if bytes.len() > max_frame_size {
        return Err(zu_gross(bytes.len(), max_frame_size));
    }

    writer.write_all(&(bytes.len() as u32).to_be_bytes()).await?;
    writer.write_all(&bytes).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
