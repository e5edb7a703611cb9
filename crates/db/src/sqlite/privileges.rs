//! SQLite-Implementierung des PrivilegRepository

use chrono::Utc;
use sqlx::Row;

use stammtisch_core::{
    ChannelId, KanalPrivilegien, PrivilegIdentitaet, PrivilegRecord, RegistrationId,
};

use crate::error::DbError;
use crate::repository::{DbResult, PrivilegRepository};
use crate::sqlite::pool::SqliteDb;

impl PrivilegRepository for SqliteDb {
    async fn speichern(&self, privileg: &PrivilegRecord) -> DbResult<()> {
        let PrivilegIdentitaet::Registriert(konto) = privileg.identitaet else {
            return Err(DbError::ungueltig(format!(
                "Sitzungs-Privileg fuer {} kann nicht gespeichert werden",
                privileg.kanal
            )));
        };

        sqlx::query(
            "INSERT INTO kanal_privilegien (kanal_id, konto_id, privilegien, geaendert_am)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (kanal_id, konto_id)
             DO UPDATE SET privilegien = excluded.privilegien, geaendert_am = excluded.geaendert_am",
        )
        .bind(i64::from(privileg.kanal.inner()))
        .bind(i64::from(konto.0))
        .bind(i64::from(privileg.privilegien.bits()))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::debug!(kanal_id = %privileg.kanal, konto = %konto, "Privileg gespeichert");
        Ok(())
    }

    async fn fuer_kanal(&self, kanal: ChannelId) -> DbResult<Vec<PrivilegRecord>> {
        let rows = sqlx::query(
            "SELECT kanal_id, konto_id, privilegien
             FROM kanal_privilegien WHERE kanal_id = ? ORDER BY konto_id",
        )
        .bind(i64::from(kanal.inner()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_privileg).collect()
    }

    async fn alle(&self) -> DbResult<Vec<PrivilegRecord>> {
        let rows = sqlx::query(
            "SELECT kanal_id, konto_id, privilegien
             FROM kanal_privilegien ORDER BY kanal_id, konto_id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_privileg).collect()
    }
}

fn row_to_privileg(row: &sqlx::sqlite::SqliteRow) -> DbResult<PrivilegRecord> {
    let kanal: i64 = row.try_get("kanal_id")?;
    let konto: i64 = row.try_get("konto_id")?;
    let bits: i64 = row.try_get("privilegien")?;

    let kanal = u32::try_from(kanal)
        .map_err(|_| DbError::intern(format!("Ungueltige kanal_id {kanal}")))?;
    let konto = u32::try_from(konto)
        .map_err(|_| DbError::intern(format!("Ungueltige konto_id {konto}")))?;
    let bits = u16::try_from(bits)
        .map_err(|_| DbError::intern(format!("Ungueltige Privilegien {bits}")))?;

    Ok(PrivilegRecord {
        kanal: ChannelId(kanal),
        identitaet: PrivilegIdentitaet::Registriert(RegistrationId(konto)),
        privilegien: KanalPrivilegien::from_bits_truncate(bits),
    })
}
