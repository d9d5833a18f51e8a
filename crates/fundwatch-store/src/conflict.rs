use crate::codec::{blob, id_col, key_cols, opt_ts_col, parsed_col, ts_col};
use crate::{SqliteStore, StoreError};
use fundwatch_domain::traits::ConflictStore;
use fundwatch_domain::{ClaimId, Conflict, ConflictId, ConflictStatus, EntityId, FieldKey};
use rusqlite::{params, OptionalExtension, Row};
use std::collections::BTreeSet;

const CONFLICT_COLUMNS: &str = "id, entity_id, field, round, detected_at, status, resolved_at";

fn conflict_row(row: &Row<'_>) -> rusqlite::Result<Conflict> {
    Ok(Conflict {
        id: ConflictId::from_value(id_col(row, 0)?),
        entity_id: EntityId::from_value(id_col(row, 1)?),
        key: key_cols(row, 2)?,
        detected_at: ts_col(row, 4)?,
        status: parsed_col(row, 5, ConflictStatus::parse)?,
        resolved_at: opt_ts_col(row, 6)?,
        contending_claims: Vec::new(),
    })
}

impl SqliteStore {
    fn with_claims(&self, mut conflict: Conflict) -> Result<Conflict, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT claim_id FROM conflict_claims WHERE conflict_id = ?1 ORDER BY claim_id",
        )?;
        conflict.contending_claims = stmt
            .query_map(params![blob(conflict.id.value())], |row| {
                Ok(ClaimId::from_value(id_col(row, 0)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(conflict)
    }
}

impl ConflictStore for SqliteStore {
    fn open_conflict_for(
        &self,
        entity: EntityId,
        key: &FieldKey,
    ) -> Result<Option<Conflict>, Self::Error> {
        let conflict = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM conflicts
                     WHERE entity_id = ?1 AND field = ?2 AND round = ?3 AND status = 'open'",
                    CONFLICT_COLUMNS
                ),
                params![blob(entity.value()), key.field.as_str(), key.round_label()],
                conflict_row,
            )
            .optional()?;
        conflict.map(|c| self.with_claims(c)).transpose()
    }

    fn insert_conflict(&mut self, conflict: &Conflict) -> Result<(), Self::Error> {
        let id_bytes = blob(conflict.id.value());
        let tx = self.conn.transaction()?;

        // The partial unique index rejects a second open conflict for the key
        tx.execute(
            &format!(
                "INSERT INTO conflicts ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                CONFLICT_COLUMNS
            ),
            params![
                &id_bytes,
                blob(conflict.entity_id.value()),
                conflict.key.field.as_str(),
                conflict.key.round_label(),
                conflict.detected_at as i64,
                conflict.status.as_str(),
                conflict.resolved_at.map(|t| t as i64),
            ],
        )?;
        for claim in &conflict.contending_claims {
            tx.execute(
                "INSERT OR IGNORE INTO conflict_claims (conflict_id, claim_id) VALUES (?1, ?2)",
                params![&id_bytes, blob(claim.value())],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn attach_claims(&mut self, id: ConflictId, claims: &[ClaimId]) -> Result<(), Self::Error> {
        let id_bytes = blob(id.value());
        let tx = self.conn.transaction()?;

        let exists = tx
            .query_row("SELECT 1 FROM conflicts WHERE id = ?1", params![&id_bytes], |_| Ok(true))
            .optional()?
            .unwrap_or(false);
        if !exists {
            return Err(StoreError::NotFound(format!("conflict {}", id)));
        }

        for claim in claims {
            tx.execute(
                "INSERT OR IGNORE INTO conflict_claims (conflict_id, claim_id) VALUES (?1, ?2)",
                params![&id_bytes, blob(claim.value())],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn resolve_conflict(&mut self, id: ConflictId, resolved_at: u64) -> Result<bool, Self::Error> {
        let changed = self.conn.execute(
            "UPDATE conflicts SET status = 'resolved', resolved_at = ?2
             WHERE id = ?1 AND status = 'open'",
            params![blob(id.value()), resolved_at as i64],
        )?;
        Ok(changed == 1)
    }

    fn get_conflict(&self, id: ConflictId) -> Result<Option<Conflict>, Self::Error> {
        let conflict = self
            .conn
            .query_row(
                &format!("SELECT {} FROM conflicts WHERE id = ?1", CONFLICT_COLUMNS),
                params![blob(id.value())],
                conflict_row,
            )
            .optional()?;
        conflict.map(|c| self.with_claims(c)).transpose()
    }

    fn adjudicated_claims(
        &self,
        entity: EntityId,
        key: &FieldKey,
    ) -> Result<BTreeSet<ClaimId>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT cc.claim_id FROM conflict_claims cc
             JOIN conflicts c ON c.id = cc.conflict_id
             WHERE c.status = 'resolved' AND c.field = ?2 AND c.round = ?3
               AND (c.entity_id = ?1
                    OR c.entity_id IN (SELECT id FROM entities WHERE merged_into = ?1))",
        )?;
        let claims = stmt
            .query_map(
                params![blob(entity.value()), key.field.as_str(), key.round_label()],
                |row| Ok(ClaimId::from_value(id_col(row, 0)?)),
            )?
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(claims)
    }
}
