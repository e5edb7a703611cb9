//! Ablage – geordneter Container mit fester Slot-Anzahl
//!
//! Haelt die Entitaeten der Registry in Einfuegereihenfolge. Einfuegen
//! schlaegt fehl sobald `max_slots` erreicht ist, Entfernen eines nicht
//! vorhandenen Eintrags ist ein No-op.

use stammtisch_core::{Result, StammtischError};

/// Entitaet mit einer eindeutigen ID
pub trait HatId {
    type Id: Copy + Eq;

    fn id(&self) -> Self::Id;
}

/// Geordneter Container mit Kapazitaetszaehler
#[derive(Debug, Clone)]
pub struct Ablage<T: HatId> {
    eintraege: Vec<T>,
    max_slots: usize,
}

impl<T: HatId> Ablage<T> {
    pub fn neu(max_slots: usize) -> Self {
        Self {
            eintraege: Vec::new(),
            max_slots,
        }
    }

    pub fn max_slots(&self) -> usize {
        self.max_slots
    }

    pub fn used_slots(&self) -> usize {
        self.eintraege.len()
    }

    pub fn ist_voll(&self) -> bool {
        self.eintraege.len() >= self.max_slots
    }

    /// Fuegt am Ende ein
    ///
    /// # Fehler
    /// - `AblageVoll` wenn alle Slots belegt sind
    pub fn einfuegen(&mut self, eintrag: T) -> Result<()> {
        if self.ist_voll() {
            return Err(StammtischError::AblageVoll {
                max_slots: self.max_slots,
            });
        }
        self.eintraege.push(eintrag);
        Ok(())
    }

    /// Entfernt einen Eintrag und gibt ihn zurueck (None wenn nicht vorhanden)
    pub fn entfernen(&mut self, id: T::Id) -> Option<T> {
        let pos = self.eintraege.iter().position(|e| e.id() == id)?;
        Some(self.eintraege.remove(pos))
    }

    pub fn get(&self, id: T::Id) -> Option<&T> {
        self.eintraege.iter().find(|e| e.id() == id)
    }

    pub fn get_mut(&mut self, id: T::Id) -> Option<&mut T> {
        self.eintraege.iter_mut().find(|e| e.id() == id)
    }

    pub fn enthaelt(&self, id: T::Id) -> bool {
        self.get(id).is_some()
    }

    /// Iteriert in Einfuegereihenfolge
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.eintraege.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.eintraege.iter_mut()
    }

    pub fn finden(&self, mut praedikat: impl FnMut(&T) -> bool) -> Option<&T> {
        self.eintraege.iter().find(|e| praedikat(*e))
    }
}

/// Kleinste freie ID >= 1, die noch nicht vergeben ist
pub(crate) fn kleinste_freie_id(belegt: impl Iterator<Item = u32>, maximum: u32) -> Option<u32> {
    let mut ids: Vec<u32> = belegt.collect();
    ids.sort_unstable();
    let mut kandidat = 1u32;
    for id in ids {
        if id == kandidat {
            kandidat = kandidat.checked_add(1)?;
        } else if id > kandidat {
            break;
        }
    }
    (kandidat <= maximum).then_some(kandidat)
}
