use crate::codec::{blob, id_col, json_col, key_cols, parsed_col, ts_col};
use crate::{SqliteStore, StoreError};
use fundwatch_domain::traits::ClaimStore;
use fundwatch_domain::{ClaimId, EntityId, EntityKind, EntityRef, FactClaim, FieldKey, SourceKind};
use rusqlite::{params, OptionalExtension, Row};

const CLAIM_COLUMNS: &str = "id, entity_id, entity_kind, field, round, value, source_id, \
                             source_kind, observed_at, ingested_at, evidence";

fn claim_row(row: &Row<'_>) -> rusqlite::Result<FactClaim> {
    Ok(FactClaim {
        id: ClaimId::from_value(id_col(row, 0)?),
        entity: EntityRef::Id(EntityId::from_value(id_col(row, 1)?)),
        entity_kind: parsed_col(row, 2, EntityKind::parse)?,
        key: key_cols(row, 3)?,
        value: json_col(row, 5)?,
        source_id: row.get(6)?,
        source_kind: parsed_col(row, 7, SourceKind::parse)?,
        observed_at: ts_col(row, 8)?,
        ingested_at: ts_col(row, 9)?,
        evidence: row.get(10)?,
    })
}

impl ClaimStore for SqliteStore {
    fn append_claim(&mut self, claim: &FactClaim) -> Result<(), Self::Error> {
        let entity_id = claim.entity_id().ok_or_else(|| {
            StoreError::InvalidData(format!("claim {} has no resolved entity", claim.id))
        })?;
        let id_bytes = blob(claim.id.value());

        let exists = self
            .conn
            .query_row("SELECT 1 FROM claims WHERE id = ?1", params![&id_bytes], |_| Ok(true))
            .optional()?
            .unwrap_or(false);
        if exists {
            return Err(StoreError::Duplicate(format!("claim {}", claim.id)));
        }

        self.conn.execute(
            &format!(
                "INSERT INTO claims ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                CLAIM_COLUMNS
            ),
            params![
                &id_bytes,
                blob(entity_id.value()),
                claim.entity_kind.as_str(),
                claim.key.field.as_str(),
                claim.key.round_label(),
                serde_json::to_string(&claim.value)?,
                &claim.source_id,
                claim.source_kind.as_str(),
                claim.observed_at as i64,
                claim.ingested_at as i64,
                &claim.evidence,
            ],
        )?;

        Ok(())
    }

    fn get_claim(&self, id: ClaimId) -> Result<Option<FactClaim>, Self::Error> {
        let claim = self
            .conn
            .query_row(
                &format!("SELECT {} FROM claims WHERE id = ?1", CLAIM_COLUMNS),
                params![blob(id.value())],
                claim_row,
            )
            .optional()?;
        Ok(claim)
    }

    fn claims_for(&self, entity: EntityId, key: &FieldKey) -> Result<Vec<FactClaim>, Self::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM claims
             WHERE (entity_id = ?1
                    OR entity_id IN (SELECT id FROM entities WHERE merged_into = ?1))
               AND field = ?2 AND round = ?3
             ORDER BY observed_at, ingested_at, id",
            CLAIM_COLUMNS
        ))?;
        let claims = stmt
            .query_map(
                params![blob(entity.value()), key.field.as_str(), key.round_label()],
                claim_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(claims)
    }

    fn field_keys(&self, entity: EntityId) -> Result<Vec<FieldKey>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT field, round FROM claims
             WHERE entity_id = ?1
                OR entity_id IN (SELECT id FROM entities WHERE merged_into = ?1)",
        )?;
        let mut keys = stmt
            .query_map(params![blob(entity.value())], |row| key_cols(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        keys.sort();
        Ok(keys)
    }
}
