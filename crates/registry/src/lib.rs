//! stammtisch-registry – Entitaeten-Registry eines Stammtisch-Servers
//!
//! Besitzt alle Kanaele, Spieler und Bans eines Servers und setzt die
//! Regeln der zweistufigen Kanalhierarchie durch: Flag- und
//! Passwort-Vererbung, Kapazitaet, Mitgliedschaft und Privilegien pro
//! Kanalgruppe. Alle Beziehungen laufen ueber IDs, die Registry ist die
//! einzige besitzende Stelle.

pub mod ban;
pub mod channel;
pub mod container;
mod hierarchy;
pub mod import;
mod membership;
pub mod player;
mod privilege;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use ban::{Ban, NeuerBan};
pub use channel::Channel;
pub use container::{Ablage, HatId};
pub use import::{ImportBericht, ImportFehler};
pub use player::{GlobalFlags, NeuerSpieler, Player};
pub use registry::{Registry, RegistryConfig};
