//! stammtisch-protocol – Wire-Codec fuer Kanal-Entitaeten
//!
//! Dieses Crate definiert das bitgenaue Binaerformat eines Kanals
//! (fester Kopf + drei Null-terminierte Texte) und die Rahmung fuer
//! Stroeme solcher Kanaele ueber `tokio_util::codec`.

pub mod channel;
pub mod wire;

pub use channel::{decode, encode, encoded_size, ChannelAnsicht, UnresolvedChannel};
pub use wire::{DekodierterKanal, KanalFrameCodec};
