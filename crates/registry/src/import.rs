//! Import dekodierter Kanaele
//!
//! Dekodierte Kanaele tragen nur eine rohe Eltern-ID. Der Import legt
//! zuerst alle Kanaele unter ihrer Wire-ID an und haengt danach die
//! Unterkanaele an. Dadurch duerfen Eltern-IDs auch auf Kanaele zeigen,
//! die erst spaeter im Strom kommen. Kanaele, die sich nicht einhaengen
//! lassen, werden wieder entfernt und im Bericht aufgefuehrt.

use std::collections::HashSet;

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use stammtisch_core::{ChannelId, StammtischError};
use stammtisch_protocol::{KanalFrameCodec, UnresolvedChannel};

use crate::registry::Registry;

/// Ergebnis eines Imports
#[derive(Debug, Default)]
pub struct ImportBericht {
    /// Erfolgreich uebernommene Kanaele in Eingabereihenfolge
    pub importiert: Vec<ChannelId>,
    pub fehler: Vec<ImportFehler>,
}

impl ImportBericht {
    pub fn ist_fehlerfrei(&self) -> bool {
        self.fehler.is_empty()
    }
}

/// Ein verworfener Kanal oder ein nicht lesbarer Frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFehler {
    /// `None` wenn schon das Dekodieren scheiterte
    pub kanal: Option<ChannelId>,
    pub fehler: StammtischError,
}

impl Registry {
    /// Uebernimmt dekodierte Kanaele und loest ihre Eltern-IDs auf
    pub fn channels_importieren(&mut self, kanaele: Vec<UnresolvedChannel>) -> ImportBericht {
        let mut bericht = ImportBericht::default();
        let mut offen: Vec<(ChannelId, ChannelId)> = Vec::new();

        for kanal in kanaele {
            match self.channel_mit_id_einfuegen(kanal.id, kanal.daten) {
                Ok(()) => {
                    bericht.importiert.push(kanal.id);
                    if let Some(eltern) = kanal.parent_id {
                        offen.push((kanal.id, eltern));
                    }
                }
                Err(fehler) => {
                    tracing::warn!(kanal_id = %kanal.id, fehler = %fehler, "Kanal nicht importiert");
                    bericht.fehler.push(ImportFehler {
                        kanal: Some(kanal.id),
                        fehler,
                    });
                }
            }
        }

        // Kinder, deren Elternkanal selbst noch angehaengt wird, zuletzt
        let kinder: HashSet<ChannelId> = offen.iter().map(|(kind, _)| *kind).collect();
        offen.sort_by_key(|(_, eltern)| kinder.contains(eltern));

        for (kind, eltern) in offen {
            if !self.kanaele.enthaelt(kind) {
                continue;
            }
            if let Err(fehler) = self.unterkanal_anhaengen(eltern, kind) {
                tracing::warn!(
                    kanal_id = %kind,
                    eltern = %eltern,
                    fehler = %fehler,
                    "Unterkanal nicht einhaengbar, verworfen"
                );
                self.verwerfen(kind, fehler, &mut bericht);
            }
        }

        tracing::info!(
            importiert = bericht.importiert.len(),
            fehler = bericht.fehler.len(),
            "Kanal-Import abgeschlossen"
        );
        bericht
    }

    /// Dekodiert einen Frame-Strom (siehe [`KanalFrameCodec`]) und importiert ihn
    ///
    /// Nicht lesbare Frames werden uebersprungen. Ein kaputter Rahmen
    /// (Laengenfeld zu gross, Strom abgeschnitten) beendet das Lesen.
    pub fn kanalstrom_importieren(&mut self, daten: &[u8]) -> ImportBericht {
        let mut codec = KanalFrameCodec::new();
        let mut buf = BytesMut::from(daten);
        let mut kanaele = Vec::new();
        let mut dekodierfehler = Vec::new();

        loop {
            match codec.decode(&mut buf) {
                Ok(Some(Ok(kanal))) => kanaele.push(kanal),
                Ok(Some(Err(fehler))) => dekodierfehler.push(ImportFehler { kanal: None, fehler }),
                Ok(None) => {
                    if !buf.is_empty() {
                        dekodierfehler.push(ImportFehler {
                            kanal: None,
                            fehler: StammtischError::fehlerhaft(format!(
                                "Strom endet mit {} Bytes eines unvollstaendigen Frames",
                                buf.len()
                            )),
                        });
                    }
                    break;
                }
                Err(e) => {
                    dekodierfehler.push(ImportFehler {
                        kanal: None,
                        fehler: StammtischError::fehlerhaft(e.to_string()),
                    });
                    break;
                }
            }
        }

        let mut bericht = self.channels_importieren(kanaele);
        dekodierfehler.append(&mut bericht.fehler);
        bericht.fehler = dekodierfehler;
        bericht
    }

    /// Entfernt einen importierten Kanal
    ///
    /// Schon an ihn angehaengte Kinder verlieren mit ihm ihren angegebenen
    /// Elternkanal und werden ebenfalls verworfen.
    fn verwerfen(&mut self, kanal: ChannelId, fehler: StammtischError, bericht: &mut ImportBericht) {
        let kinder = match self.channel_zerstoeren(kanal) {
            Ok(kinder) => kinder,
            Err(e) => {
                tracing::warn!(kanal_id = %kanal, fehler = %e, "Verwerfen fehlgeschlagen");
                return;
            }
        };
        bericht.importiert.retain(|k| *k != kanal);
        bericht.fehler.push(ImportFehler { kanal: Some(kanal), fehler });

        for kind in kinder {
            self.verwerfen(
                kind,
                StammtischError::ungueltig(format!("Elternkanal {kanal} wurde verworfen")),
                bericht,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryConfig;
    use crate::testing::{kanal_daten, standard_daten};
    use stammtisch_core::{ChannelDaten, ChannelFlags};
    use tokio_util::codec::Encoder;

    fn registry() -> Registry {
        Registry::ohne_persistenz(RegistryConfig::default())
    }

    fn unaufgeloest(id: u32, parent: Option<u32>, daten: ChannelDaten) -> UnresolvedChannel {
        UnresolvedChannel {
            id: ChannelId(id),
            parent_id: parent.map(ChannelId),
            daten,
        }
    }

    #[test]
    fn elternkanal_darf_spaeter_kommen() {
        let mut reg = registry();
        let bericht = reg.channels_importieren(vec![
            unaufgeloest(5, Some(2), kanal_daten("Kind", ChannelFlags::empty())),
            unaufgeloest(2, None, kanal_daten("Eltern", ChannelFlags::SUBCHANNELS)),
        ]);

        assert!(bericht.ist_fehlerfrei());
        assert_eq!(bericht.importiert, vec![ChannelId(5), ChannelId(2)]);
        assert_eq!(reg.channel_nach_id(ChannelId(5)).unwrap().eltern(), Some(ChannelId(2)));
        assert_eq!(
            reg.channel_nach_id(ChannelId(2)).unwrap().unterkanaele(),
            &[ChannelId(5)]
        );
    }

    #[test]
    fn elternkanal_darf_schon_registriert_sein() {
        let mut reg = registry();
        let eltern = reg
            .channel_hinzufuegen(ChannelDaten {
                topic: "Vorhanden".into(),
                ..kanal_daten("Eltern", ChannelFlags::SUBCHANNELS)
            })
            .unwrap();
        let vorher = reg.channel_nach_id(eltern).unwrap().daten().clone();

        let bericht = reg.channels_importieren(vec![
            unaufgeloest(10, Some(eltern.inner()), kanal_daten("Kind", ChannelFlags::empty())),
            unaufgeloest(11, Some(eltern.inner()), kanal_daten("Kind 2", ChannelFlags::empty())),
        ]);

        assert!(bericht.ist_fehlerfrei(), "{:?}", bericht.fehler);
        assert_eq!(bericht.importiert, vec![ChannelId(10), ChannelId(11)]);
        let kanal = reg.channel_nach_id(eltern).unwrap();
        assert_eq!(kanal.unterkanaele(), &[ChannelId(10), ChannelId(11)]);
        assert_eq!(kanal.daten(), &vorher);
        assert!(kanal.ist_oberkanal());
        assert_eq!(reg.channel_nach_id(ChannelId(10)).unwrap().eltern(), Some(eltern));
        assert_eq!(reg.channel_nach_id(ChannelId(11)).unwrap().eltern(), Some(eltern));
    }

    #[test]
    fn gegenseitige_eltern_werden_beide_verworfen() {
        let mut reg = registry();
        let bericht = reg.channels_importieren(vec![
            unaufgeloest(1, Some(2), kanal_daten("A", ChannelFlags::SUBCHANNELS)),
            unaufgeloest(2, Some(1), kanal_daten("B", ChannelFlags::SUBCHANNELS)),
        ]);

        assert!(bericht.importiert.is_empty());
        assert_eq!(bericht.fehler.len(), 2);
        assert_eq!(reg.kanal_anzahl(), 0);
    }

    #[test]
    fn fehlender_elternkanal_wird_gemeldet() {
        let mut reg = registry();
        let bericht = reg.channels_importieren(vec![
            unaufgeloest(1, None, kanal_daten("A", ChannelFlags::empty())),
            unaufgeloest(2, Some(77), kanal_daten("Waise", ChannelFlags::empty())),
        ]);

        assert_eq!(bericht.importiert, vec![ChannelId(1)]);
        assert_eq!(bericht.fehler.len(), 1);
        assert_eq!(bericht.fehler[0].kanal, Some(ChannelId(2)));
        assert!(matches!(bericht.fehler[0].fehler, StammtischError::NichtGefunden(_)));
        assert!(reg.channel_nach_id(ChannelId(2)).is_none());
    }

    #[test]
    fn doppelte_ids_und_zweiter_standardkanal() {
        let mut reg = registry();
        let bericht = reg.channels_importieren(vec![
            unaufgeloest(1, None, standard_daten("Standard")),
            unaufgeloest(1, None, kanal_daten("Doppelt", ChannelFlags::empty())),
            unaufgeloest(2, None, standard_daten("Noch ein Standard")),
        ]);
        assert_eq!(bericht.importiert, vec![ChannelId(1)]);
        assert_eq!(bericht.fehler.len(), 2);
        assert_eq!(reg.default_channel().unwrap().name(), "Standard");
    }

    #[test]
    fn tiefe_wird_auch_beim_import_erzwungen() {
        let mut reg = registry();
        let bericht = reg.channels_importieren(vec![
            unaufgeloest(1, None, kanal_daten("A", ChannelFlags::SUBCHANNELS)),
            unaufgeloest(2, Some(1), kanal_daten("B", ChannelFlags::SUBCHANNELS)),
            unaufgeloest(3, Some(2), kanal_daten("C", ChannelFlags::empty())),
        ]);
        assert_eq!(bericht.importiert, vec![ChannelId(1), ChannelId(2)]);
        assert_eq!(bericht.fehler[0].kanal, Some(ChannelId(3)));
        assert!(reg.kanaele().all(|k| k.ist_oberkanal() || k.unterkanaele().is_empty()));
    }

    #[test]
    fn strom_mit_kaputtem_frame() {
        let mut codec = KanalFrameCodec::new();
        let mut buf = BytesMut::new();
        let a = unaufgeloest(1, None, kanal_daten("A", ChannelFlags::empty()));
        codec.encode(a.ansicht(), &mut buf).unwrap();
        // Frame mit 3 Bytes Inhalt: zu kurz fuer einen Kanal
        buf.extend_from_slice(&[0, 0, 0, 3, 1, 2, 3]);
        let b = unaufgeloest(2, None, kanal_daten("B", ChannelFlags::empty()));
        codec.encode(b.ansicht(), &mut buf).unwrap();

        let mut reg = registry();
        let bericht = reg.kanalstrom_importieren(&buf);
        assert_eq!(bericht.importiert, vec![ChannelId(1), ChannelId(2)]);
        assert_eq!(bericht.fehler.len(), 1);
        assert_eq!(bericht.fehler[0].kanal, None);
        assert!(matches!(
            bericht.fehler[0].fehler,
            StammtischError::FehlerhafteEingabe(_)
        ));
    }

    #[test]
    fn abgeschnittener_strom() {
        let mut codec = KanalFrameCodec::new();
        let mut buf = BytesMut::new();
        let a = unaufgeloest(1, None, kanal_daten("A", ChannelFlags::empty()));
        codec.encode(a.ansicht(), &mut buf).unwrap();
        let laenge = buf.len();

        let mut reg = registry();
        let bericht = reg.kanalstrom_importieren(&buf[..laenge - 2]);
        assert!(bericht.importiert.is_empty());
        assert_eq!(bericht.fehler.len(), 1);
    }

    #[test]
    fn export_und_import_ergeben_denselben_baum() {
        let mut quelle = registry();
        let ober = quelle
            .channel_hinzufuegen(ChannelDaten {
                flags: ChannelFlags::DEFAULT | ChannelFlags::SUBCHANNELS,
                ..standard_daten("Lobby")
            })
            .unwrap();
        let unter = quelle
            .channel_hinzufuegen(kanal_daten("Ecke", ChannelFlags::MODERATED))
            .unwrap();
        quelle.unterkanal_anhaengen(ober, unter).unwrap();
        quelle
            .channel_hinzufuegen(kanal_daten("Keller", ChannelFlags::UNREGISTERED))
            .unwrap();

        let strom = quelle.channels_exportieren().unwrap();
        let mut ziel = registry();
        let bericht = ziel.kanalstrom_importieren(&strom);

        assert!(bericht.ist_fehlerfrei(), "{:?}", bericht.fehler);
        assert_eq!(ziel.kanal_anzahl(), 3);
        assert_eq!(ziel.default_channel().unwrap().id(), ober);
        assert_eq!(ziel.channel_nach_id(unter).unwrap().eltern(), Some(ober));
        for kanal in quelle.kanaele() {
            let kopie = ziel.channel_nach_id(kanal.id()).unwrap();
            assert_eq!(kopie.daten(), kanal.daten());
        }
    }
}
