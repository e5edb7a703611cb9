//! stammtisch-core – Gemeinsame Typen, Fehlertypen und Kanal-Metadaten
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Stammtisch-Crates gemeinsam genutzt werden: Identifikatoren,
//! die Fehler-Taxonomie, die Metadaten eines Kanals (Flags, Codec,
//! Kapazitaet, Passwort), Privileg-Datensaetze und die Persistenz-Schnittstelle.

pub mod channel;
pub mod error;
pub mod persistence;
pub mod privilege;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use channel::{ChannelDaten, ChannelFlags, Codec, MaxUsers, Passwort};
pub use error::{Result, StammtischError};
pub use persistence::{KeinSpeicher, PrivilegSpeicher};
pub use privilege::{KanalPrivilegien, PrivilegIdentitaet, PrivilegRecord};
pub use types::{BanId, ChannelId, PlayerId, RegistrationId};
