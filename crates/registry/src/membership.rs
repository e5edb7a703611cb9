//! Kanal-Mitgliedschaft der Spieler
//!
//! Der Kanal haelt die Mitgliederliste, der Spieler nur die Rueckreferenz
//! auf seinen aktuellen Kanal. Dass ein Spieler in hoechstens einem Kanal
//! ist, stellt `spieler_verschieben` sicher, nicht `spieler_in_kanal_aufnehmen`.

use stammtisch_core::{ChannelId, PlayerId, Result, StammtischError};

use crate::registry::Registry;

impl Registry {
    /// Nimmt einen Spieler in einen Kanal auf
    ///
    /// Meldet ihn nicht aus einem vorherigen Kanal ab: wer den Kanal
    /// wechseln will, nimmt `spieler_verschieben`. Ist der Spieler schon
    /// Mitglied, zeigt danach nur sein aktueller Kanal wieder hierher.
    ///
    /// # Fehler
    /// - `NichtGefunden` fuer unbekannte Kanaele oder Spieler
    /// - `KapazitaetUeberschritten` wenn der Kanal voll ist
    pub fn spieler_in_kanal_aufnehmen(&mut self, kanal: ChannelId, spieler: PlayerId) -> Result<()> {
        self.spieler_ref(spieler)?;
        let ziel = self.kanal(kanal)?;
        if ziel.spieler().contains(&spieler) {
            self.spieler_ref_mut(spieler)?.kanal = Some(kanal);
            return Ok(());
        }
        if self.ist_voll(kanal)? {
            tracing::debug!(kanal_id = %kanal, spieler_id = %spieler, "Kanal ist voll");
            return Err(StammtischError::KapazitaetUeberschritten {
                kanal,
                max: ziel.max_users().wire_wert(),
            });
        }

        self.kanal_mut(kanal)?.spieler.push(spieler);
        self.spieler_ref_mut(spieler)?.kanal = Some(kanal);
        tracing::debug!(spieler_id = %spieler, kanal_id = %kanal, "Spieler aufgenommen");
        Ok(())
    }

    /// Verschiebt einen Spieler in einen anderen Kanal
    ///
    /// Schlaegt die Aufnahme fehl, bleibt der Spieler in seinem alten Kanal.
    /// Ist er bereits im Zielkanal, passiert nichts.
    pub fn spieler_verschieben(&mut self, spieler: PlayerId, ziel: ChannelId) -> Result<()> {
        let aktuell = self.spieler_ref(spieler)?.kanal();
        let kanal = self.kanal(ziel)?;
        if aktuell == Some(ziel) {
            return Ok(());
        }
        if self.ist_voll(ziel)? {
            tracing::debug!(kanal_id = %ziel, spieler_id = %spieler, "Zielkanal ist voll");
            return Err(StammtischError::KapazitaetUeberschritten {
                kanal: ziel,
                max: kanal.max_users().wire_wert(),
            });
        }

        if let Some(alt) = aktuell {
            if let Some(alter_kanal) = self.kanaele.get_mut(alt) {
                alter_kanal.spieler.retain(|p| *p != spieler);
            }
        }
        self.spieler_in_kanal_aufnehmen(ziel, spieler)?;
        tracing::debug!(spieler_id = %spieler, von = ?aktuell, nach = %ziel, "Spieler verschoben");
        Ok(())
    }

    /// Meldet einen Spieler aus seinem Kanal ab
    ///
    /// Gibt den verlassenen Kanal zurueck.
    pub fn spieler_aus_kanal_entfernen(&mut self, spieler: PlayerId) -> Result<Option<ChannelId>> {
        let alt = self.spieler_ref_mut(spieler)?.kanal.take();
        if let Some(alt) = alt {
            if let Some(kanal) = self.kanaele.get_mut(alt) {
                kanal.spieler.retain(|p| *p != spieler);
            }
        }
        Ok(alt)
    }
}
