//! Privilegien-Aufloesung
//!
//! Privilegien liegen immer am Oberkanal einer Gruppe. Fehlt fuer einen
//! Spieler ein Datensatz, wird er leer angelegt. Datensaetze registrierter
//! Konten in registrierten Kanaelen gehen zusaetzlich an den
//! [`PrivilegSpeicher`](stammtisch_core::PrivilegSpeicher).

use stammtisch_core::{
    ChannelFlags, ChannelId, KanalPrivilegien, PlayerId, PrivilegRecord, Result,
};

use crate::registry::Registry;

impl Registry {
    /// Privileg-Datensatz eines Spielers fuer einen Kanal
    ///
    /// Bei Unterkanaelen wird der Datensatz des Elternkanals geliefert.
    /// Existiert noch keiner, wird ein leerer angelegt (idempotent).
    ///
    /// # Fehler
    /// - `NichtGefunden` fuer unbekannte Spieler oder Kanaele
    pub fn privileg_holen(&mut self, spieler: PlayerId, kanal: ChannelId) -> Result<&PrivilegRecord> {
        let (besitzer, index) = self.privileg_index(spieler, kanal)?;
        Ok(&self.kanal(besitzer)?.privilegien[index])
    }

    /// Setzt Privilegien zusaetzlich zu den vorhandenen
    pub fn privileg_setzen(
        &mut self,
        spieler: PlayerId,
        kanal: ChannelId,
        privileg: KanalPrivilegien,
    ) -> Result<KanalPrivilegien> {
        self.privileg_aendern(spieler, kanal, |p| p.insert(privileg))
    }

    /// Entzieht Privilegien
    pub fn privileg_entfernen(
        &mut self,
        spieler: PlayerId,
        kanal: ChannelId,
        privileg: KanalPrivilegien,
    ) -> Result<KanalPrivilegien> {
        self.privileg_aendern(spieler, kanal, |p| p.remove(privileg))
    }

    /// Uebernimmt gespeicherte Datensaetze beim Serverstart
    ///
    /// Nur Datensaetze registrierter Konten fuer vorhandene Oberkanaele
    /// werden uebernommen. Liefert die Anzahl uebernommener Datensaetze.
    pub fn privilegien_laden(&mut self, datensaetze: impl IntoIterator<Item = PrivilegRecord>) -> usize {
        let mut geladen = 0;
        for rec in datensaetze {
            if !rec.identitaet.ist_registriert() {
                continue;
            }
            let Some(kanal) = self.kanaele.get_mut(rec.kanal) else {
                tracing::debug!(kanal_id = %rec.kanal, "Privileg fuer unbekannten Kanal uebersprungen");
                continue;
            };
            if !kanal.ist_oberkanal() {
                tracing::debug!(kanal_id = %rec.kanal, "Privileg fuer Unterkanal uebersprungen");
                continue;
            }
            match kanal.privilegien.iter_mut().find(|p| p.identitaet == rec.identitaet) {
                Some(vorhanden) => vorhanden.privilegien = rec.privilegien,
                None => kanal.privilegien.push(rec),
            }
            geladen += 1;
        }
        tracing::info!(anzahl = geladen, "Privilegien geladen");
        geladen
    }

    fn privileg_aendern(
        &mut self,
        spieler: PlayerId,
        kanal: ChannelId,
        aenderung: impl FnOnce(&mut KanalPrivilegien),
    ) -> Result<KanalPrivilegien> {
        let (besitzer, index) = self.privileg_index(spieler, kanal)?;
        let besitzer_kanal = self.kanal_mut(besitzer)?;
        let dauerhaft = !besitzer_kanal.gespeicherte_flags().contains(ChannelFlags::UNREGISTERED);
        let rec = &mut besitzer_kanal.privilegien[index];
        aenderung(&mut rec.privilegien);
        let rec = rec.clone();

        tracing::debug!(
            spieler_id = %spieler,
            kanal_id = %besitzer,
            privilegien = ?rec.privilegien,
            "Privilegien geaendert"
        );
        if dauerhaft && rec.identitaet.ist_registriert() {
            self.persistieren(&rec);
        }
        Ok(rec.privilegien)
    }

    /// Sucht oder legt den Datensatz an; liefert (Oberkanal, Index)
    fn privileg_index(&mut self, spieler: PlayerId, kanal: ChannelId) -> Result<(ChannelId, usize)> {
        let identitaet = self.spieler_ref(spieler)?.privileg_identitaet();
        let besitzer = self.kanal(kanal)?.eltern().unwrap_or(kanal);

        let besitzer_kanal = self.kanal(besitzer)?;
        if let Some(index) = besitzer_kanal
            .privilegien
            .iter()
            .position(|p| p.identitaet == identitaet)
        {
            return Ok((besitzer, index));
        }
        let dauerhaft = !besitzer_kanal.gespeicherte_flags().contains(ChannelFlags::UNREGISTERED);

        tracing::info!(
            spieler_id = %spieler,
            kanal_id = %besitzer,
            "Noch keine Privilegien, lege Datensatz an"
        );
        let rec = PrivilegRecord::neu(besitzer, identitaet);
        if dauerhaft && identitaet.ist_registriert() {
            self.persistieren(&rec);
        }

        let besitzer_kanal = self.kanal_mut(besitzer)?;
        besitzer_kanal.privilegien.push(rec);
        Ok((besitzer, besitzer_kanal.privilegien.len() - 1))
    }

    /// Fehler der Persistenz werden nur protokolliert
    fn persistieren(&self, rec: &PrivilegRecord) {
        if let Err(e) = self.speicher.privileg_speichern(rec) {
            tracing::warn!(kanal_id = %rec.kanal, fehler = %e, "Privileg konnte nicht gespeichert werden");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::player::NeuerSpieler;
    use crate::registry::RegistryConfig;
    use crate::testing::{gast_anlegen, kanal_daten, AufzeichnenderSpeicher, FehlerSpeicher};
    use stammtisch_core::{PrivilegIdentitaet, RegistrationId, StammtischError};

    fn registry_mit(speicher: Arc<AufzeichnenderSpeicher>) -> Registry {
        Registry::neu(RegistryConfig::default(), speicher)
    }

    fn registrierter(reg: &mut Registry, konto: u32) -> PlayerId {
        reg.spieler_hinzufuegen(NeuerSpieler::registriert("anna", "pc", RegistrationId(konto)))
            .unwrap()
    }

    #[test]
    fn holen_ist_idempotent() {
        let speicher = Arc::new(AufzeichnenderSpeicher::default());
        let mut reg = registry_mit(speicher.clone());
        let kanal = reg.channel_hinzufuegen(kanal_daten("K", ChannelFlags::empty())).unwrap();
        let p = registrierter(&mut reg, 7);

        let erster = reg.privileg_holen(p, kanal).unwrap().clone();
        let zweiter = reg.privileg_holen(p, kanal).unwrap().clone();
        assert_eq!(erster, zweiter);
        assert_eq!(erster.identitaet, PrivilegIdentitaet::Registriert(RegistrationId(7)));
        assert_eq!(reg.channel_nach_id(kanal).unwrap().privilegien().len(), 1);
        assert_eq!(speicher.gespeichert().len(), 1);
    }

    #[test]
    fn unterkanal_nutzt_datensatz_des_elternkanals() {
        let speicher = Arc::new(AufzeichnenderSpeicher::default());
        let mut reg = registry_mit(speicher);
        let ober = reg.channel_hinzufuegen(kanal_daten("O", ChannelFlags::SUBCHANNELS)).unwrap();
        let unter = reg.channel_hinzufuegen(kanal_daten("U", ChannelFlags::empty())).unwrap();
        reg.unterkanal_anhaengen(ober, unter).unwrap();
        let p = gast_anlegen(&mut reg, "gast");

        reg.privileg_setzen(p, unter, KanalPrivilegien::VOICE).unwrap();
        let rec = reg.privileg_holen(p, ober).unwrap();
        assert_eq!(rec.kanal, ober);
        assert!(rec.hat_privileg(KanalPrivilegien::VOICE));
        assert!(reg.channel_nach_id(unter).unwrap().privilegien().is_empty());
    }

    #[test]
    fn gaeste_und_unregistrierte_kanaele_werden_nicht_gespeichert() {
        let speicher = Arc::new(AufzeichnenderSpeicher::default());
        let mut reg = registry_mit(speicher.clone());
        let offen = reg
            .channel_hinzufuegen(kanal_daten("Offen", ChannelFlags::UNREGISTERED))
            .unwrap();
        let normal = reg.channel_hinzufuegen(kanal_daten("Normal", ChannelFlags::empty())).unwrap();
        let gast = gast_anlegen(&mut reg, "gast");
        let konto = registrierter(&mut reg, 1);

        reg.privileg_holen(gast, normal).unwrap();
        reg.privileg_holen(konto, offen).unwrap();
        reg.privileg_setzen(konto, offen, KanalPrivilegien::OPERATOR).unwrap();
        assert!(speicher.gespeichert().is_empty());

        reg.privileg_setzen(konto, normal, KanalPrivilegien::OPERATOR).unwrap();
        let gespeichert = speicher.gespeichert();
        assert_eq!(gespeichert.len(), 2);
        assert_eq!(gespeichert[1].privilegien, KanalPrivilegien::OPERATOR);
    }

    #[test]
    fn setzen_und_entfernen() {
        let mut reg = Registry::ohne_persistenz(RegistryConfig::default());
        let kanal = reg.channel_hinzufuegen(kanal_daten("K", ChannelFlags::empty())).unwrap();
        let p = gast_anlegen(&mut reg, "p");

        let neu = reg
            .privileg_setzen(p, kanal, KanalPrivilegien::VOICE | KanalPrivilegien::OPERATOR)
            .unwrap();
        assert_eq!(neu, KanalPrivilegien::VOICE | KanalPrivilegien::OPERATOR);
        let neu = reg.privileg_entfernen(p, kanal, KanalPrivilegien::VOICE).unwrap();
        assert_eq!(neu, KanalPrivilegien::OPERATOR);
    }

    #[test]
    fn speicherfehler_wird_geschluckt() {
        let mut reg = Registry::neu(RegistryConfig::default(), Arc::new(FehlerSpeicher));
        let kanal = reg.channel_hinzufuegen(kanal_daten("K", ChannelFlags::empty())).unwrap();
        let p = registrierter(&mut reg, 3);

        assert!(reg.privileg_holen(p, kanal).is_ok());
        assert!(reg.privileg_setzen(p, kanal, KanalPrivilegien::CHANADMIN).is_ok());
    }

    #[test]
    fn sitzungsprivilegien_verschwinden_mit_dem_spieler() {
        let mut reg = Registry::ohne_persistenz(RegistryConfig::default());
        let kanal = reg.channel_hinzufuegen(kanal_daten("K", ChannelFlags::empty())).unwrap();
        let gast = gast_anlegen(&mut reg, "gast");
        let konto = registrierter(&mut reg, 4);
        reg.privileg_holen(gast, kanal).unwrap();
        reg.privileg_holen(konto, kanal).unwrap();

        reg.spieler_entfernen(gast);
        reg.spieler_entfernen(konto);
        let rest = reg.channel_nach_id(kanal).unwrap().privilegien();
        assert_eq!(rest.len(), 1);
        assert!(rest[0].identitaet.ist_registriert());
    }

    #[test]
    fn laden_uebernimmt_nur_passende_datensaetze() {
        let mut reg = Registry::ohne_persistenz(RegistryConfig::default());
        let ober = reg.channel_hinzufuegen(kanal_daten("O", ChannelFlags::SUBCHANNELS)).unwrap();
        let unter = reg.channel_hinzufuegen(kanal_daten("U", ChannelFlags::empty())).unwrap();
        reg.unterkanal_anhaengen(ober, unter).unwrap();

        let konto = PrivilegIdentitaet::Registriert(RegistrationId(9));
        let mut admin = PrivilegRecord::neu(ober, konto);
        admin.privilegien = KanalPrivilegien::CHANADMIN;
        let geladen = reg.privilegien_laden(vec![
            admin,
            PrivilegRecord::neu(unter, konto),
            PrivilegRecord::neu(ChannelId(99), konto),
            PrivilegRecord::neu(ober, PrivilegIdentitaet::Unregistriert(PlayerId(1))),
        ]);
        assert_eq!(geladen, 1);

        let p = reg
            .spieler_hinzufuegen(NeuerSpieler::registriert("anna", "pc", RegistrationId(9)))
            .unwrap();
        assert!(reg
            .privileg_holen(p, unter)
            .unwrap()
            .hat_privileg(KanalPrivilegien::CHANADMIN));
    }

    #[test]
    fn unbekannter_spieler() {
        let mut reg = Registry::ohne_persistenz(RegistryConfig::default());
        let kanal = reg.channel_hinzufuegen(kanal_daten("K", ChannelFlags::empty())).unwrap();
        assert!(matches!(
            reg.privileg_holen(PlayerId(42), kanal),
            Err(StammtischError::NichtGefunden(_))
        ));
    }
}
