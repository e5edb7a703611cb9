//! Kanalhierarchie
//!
//! Zwei Ebenen: Oberkanaele und deren Unterkanaele. Ein Unterkanal hat nie
//! eigene Unterkanaele, erbt Flags (ohne `SUBCHANNELS` und `DEFAULT`) und
//! Passwort von seinem Elternkanal. Die Tiefe wird beim Anhaengen
//! erzwungen, daher brauchen die Getter hoechstens einen Sprung.

use stammtisch_core::{ChannelFlags, ChannelId, MaxUsers, Passwort, Result, StammtischError};

use crate::registry::Registry;

impl Registry {
    /// Haengt `kind` als Unterkanal an `eltern` an
    ///
    /// Ein bestehender Elternkanal von `kind` wird vorher still abgehaengt.
    ///
    /// # Fehler
    /// - `NichtGefunden` wenn einer der Kanaele nicht existiert
    /// - `NichtUnterstuetzt` wenn `eltern` keine Unterkanaele haben darf
    ///   (auch wenn `eltern` selbst ein Unterkanal ist)
    /// - `UngueltigesArgument` wenn `kind` selbst Unterkanaele hat, der
    ///   Standardkanal ist oder mit `eltern` identisch ist
    pub fn unterkanal_anhaengen(&mut self, eltern: ChannelId, kind: ChannelId) -> Result<()> {
        let eltern_kanal = self.kanal(eltern)?;
        let kind_kanal = self.kanal(kind)?;

        if !self.effektive_flags(eltern)?.contains(ChannelFlags::SUBCHANNELS) {
            tracing::warn!(
                kanal_id = %eltern,
                name = eltern_kanal.name(),
                "Kanal kann keine Unterkanaele haben"
            );
            return Err(StammtischError::NichtUnterstuetzt(format!(
                "Kanal {eltern} kann keine Unterkanaele haben"
            )));
        }
        if eltern == kind {
            return Err(StammtischError::ungueltig(format!(
                "Kanal {kind} kann nicht sein eigener Unterkanal sein"
            )));
        }
        if !kind_kanal.unterkanaele().is_empty() {
            return Err(StammtischError::ungueltig(format!(
                "Kanal {kind} hat selbst Unterkanaele"
            )));
        }
        if kind_kanal.ist_oberkanal() && kind_kanal.gespeicherte_flags().contains(ChannelFlags::DEFAULT) {
            return Err(StammtischError::ungueltig(format!(
                "Standardkanal {kind} kann kein Unterkanal werden"
            )));
        }

        if let Some(alt) = kind_kanal.eltern() {
            self.unterkanal_abhaengen(alt, kind)?;
        }

        let kind_kanal = self.kanal_mut(kind)?;
        kind_kanal.eltern = Some(eltern);
        // Privilegien gelten ab jetzt ueber den Elternkanal
        kind_kanal.privilegien.clear();
        self.kanal_mut(eltern)?.unterkanaele.push(kind);

        tracing::debug!(eltern = %eltern, kind = %kind, "Unterkanal angehaengt");
        Ok(())
    }

    /// Loest `kind` von `eltern`
    ///
    /// # Fehler
    /// - `NichtGefunden` wenn `kind` nicht existiert
    /// - `UngueltigesArgument` wenn `kind` nicht an `eltern` haengt
    pub fn unterkanal_abhaengen(&mut self, eltern: ChannelId, kind: ChannelId) -> Result<()> {
        if self.kanal(kind)?.eltern() != Some(eltern) {
            tracing::warn!(eltern = %eltern, kind = %kind, "Elternkanal des Unterkanals stimmt nicht");
            return Err(StammtischError::ungueltig(format!(
                "Kanal {kind} ist kein Unterkanal von {eltern}"
            )));
        }

        self.kanal_mut(eltern)?.unterkanaele.retain(|k| *k != kind);
        self.kanal_mut(kind)?.eltern = None;
        tracing::debug!(eltern = %eltern, kind = %kind, "Unterkanal abgehaengt");
        Ok(())
    }

    /// Eigene Flags bei Oberkanaelen, sonst die des Elternkanals ohne
    /// `SUBCHANNELS` und `DEFAULT`
    pub fn effektive_flags(&self, id: ChannelId) -> Result<ChannelFlags> {
        let kanal = self.kanal(id)?;
        match kanal.eltern() {
            None => Ok(kanal.gespeicherte_flags()),
            Some(eltern) => {
                let flags = self.kanal(eltern)?.gespeicherte_flags();
                Ok(flags - ChannelFlags::NICHT_VERERBBAR)
            }
        }
    }

    /// Passwort des Kanals, bei Unterkanaelen das des Elternkanals
    ///
    /// # Fehler
    /// - `KeinPasswortschutz` wenn der massgebliche Kanal kein `PASSWORD` traegt
    pub fn effektives_passwort(&self, id: ChannelId) -> Result<&Passwort> {
        let kanal = self.kanal(id)?;
        let besitzer = match kanal.eltern() {
            Some(eltern) => self.kanal(eltern)?,
            None => kanal,
        };
        if besitzer.gespeicherte_flags().contains(ChannelFlags::PASSWORD) {
            Ok(besitzer.passwort())
        } else {
            tracing::warn!(kanal_id = %id, "Passwort eines ungeschuetzten Kanals angefragt");
            Err(StammtischError::KeinPasswortschutz(id))
        }
    }

    /// Setzt das Passwort eines Oberkanals und markiert ihn als geschuetzt
    pub fn passwort_setzen(&mut self, id: ChannelId, passwort: &[u8]) -> Result<()> {
        let puffer = Passwort::aus_bytes(passwort)?;
        let kanal = self.kanal_mut(id)?;
        if !kanal.ist_oberkanal() {
            return Err(StammtischError::NichtUnterstuetzt(format!(
                "Unterkanal {id} erbt das Passwort seines Elternkanals"
            )));
        }
        kanal.passwort_ersetzen(puffer);
        let flags = kanal.gespeicherte_flags() | ChannelFlags::PASSWORD;
        kanal.flags_ersetzen(flags);
        Ok(())
    }

    /// Hebt den Passwortschutz eines Oberkanals auf
    pub fn passwort_entfernen(&mut self, id: ChannelId) -> Result<()> {
        let kanal = self.kanal_mut(id)?;
        if !kanal.ist_oberkanal() {
            return Err(StammtischError::NichtUnterstuetzt(format!(
                "Unterkanal {id} erbt das Passwort seines Elternkanals"
            )));
        }
        kanal.passwort_ersetzen(Passwort::leer());
        let flags = kanal.gespeicherte_flags() - ChannelFlags::PASSWORD;
        kanal.flags_ersetzen(flags);
        Ok(())
    }

    /// Prueft ein vom Client gesendetes Passwort. Ungeschuetzte Kanaele
    /// akzeptieren jedes Passwort.
    pub fn passwort_pruefen(&self, id: ChannelId, kandidat: &[u8]) -> Result<bool> {
        if !self.effektive_flags(id)?.contains(ChannelFlags::PASSWORD) {
            return Ok(true);
        }
        Ok(self.effektives_passwort(id)?.stimmt_ueberein(kandidat))
    }

    /// Ist der Kanal voll? Der Standardkanal ist nie voll.
    pub fn ist_voll(&self, id: ChannelId) -> Result<bool> {
        if self.effektive_flags(id)?.contains(ChannelFlags::DEFAULT) {
            return Ok(false);
        }
        let kanal = self.kanal(id)?;
        Ok(match kanal.max_users() {
            MaxUsers::Unbegrenzt => false,
            MaxUsers::Begrenzt(max) => kanal.spieler_anzahl() >= usize::from(max),
        })
    }
}
