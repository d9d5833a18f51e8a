use crate::codec::{blob, id_col, json_col, key_cols, opt_id_col, parsed_col, ts_col};
use crate::{SqliteStore, StoreError};
use fundwatch_domain::traits::{CommitOutcome, CommitRequest, EntityStore};
use fundwatch_domain::{CommittedFact, Entity, EntityId, EntityKind, FactRecord, FieldKey};
use rusqlite::{params, OptionalExtension, Row};
use std::collections::{BTreeMap, BTreeSet};

const ENTITY_COLUMNS: &str = "id, kind, display_name, canonical_key, merged_into, created_at";

fn entity_row(row: &Row<'_>) -> rusqlite::Result<Entity> {
    Ok(Entity {
        id: EntityId::from_value(id_col(row, 0)?),
        kind: parsed_col(row, 1, EntityKind::parse)?,
        display_name: row.get(2)?,
        canonical_key: row.get(3)?,
        merged_into: opt_id_col(row, 4)?.map(EntityId::from_value),
        created_at: ts_col(row, 5)?,
        aliases: BTreeSet::new(),
        current_facts: BTreeMap::new(),
    })
}

// Columns: field, round, revision, value, provenance, committed_at
fn history_row(row: &Row<'_>, entity_id: EntityId) -> rusqlite::Result<FactRecord> {
    Ok(FactRecord {
        entity_id,
        key: key_cols(row, 0)?,
        revision: row.get::<_, i64>(2)? as u64,
        value: json_col(row, 3)?,
        provenance: json_col(row, 4)?,
        committed_at: ts_col(row, 5)?,
    })
}

impl SqliteStore {
    /// Attach aliases and current facts to a bare entity row
    fn hydrate(&self, mut entity: Entity) -> Result<Entity, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT alias FROM aliases WHERE entity_id = ?1 ORDER BY alias")?;
        entity.aliases = stmt
            .query_map(params![blob(entity.id.value())], |row| row.get::<_, String>(0))?
            .collect::<Result<BTreeSet<_>, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT h.field, h.round, h.revision, h.value, h.provenance, h.committed_at
             FROM fact_history h
             WHERE h.entity_id = ?1
               AND h.revision = (SELECT MAX(revision) FROM fact_history
                                 WHERE entity_id = h.entity_id
                                   AND field = h.field AND round = h.round)",
        )?;
        let id = entity.id;
        let records = stmt
            .query_map(params![blob(id.value())], |row| history_row(row, id))?
            .collect::<Result<Vec<_>, _>>()?;

        entity.current_facts = records
            .into_iter()
            .map(|r| {
                (
                    r.key,
                    CommittedFact {
                        value: r.value,
                        revision: r.revision,
                        provenance: r.provenance,
                        committed_at: r.committed_at,
                    },
                )
            })
            .collect();

        Ok(entity)
    }

    fn query_entity(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Option<Entity>, StoreError> {
        let entity = self.conn.query_row(sql, params, entity_row).optional()?;
        entity.map(|e| self.hydrate(e)).transpose()
    }
}

impl EntityStore for SqliteStore {
    fn get_entity(&self, id: EntityId) -> Result<Option<Entity>, Self::Error> {
        self.query_entity(
            &format!("SELECT {} FROM entities WHERE id = ?1", ENTITY_COLUMNS),
            params![blob(id.value())],
        )
    }

    fn find_by_key(&self, kind: EntityKind, key: &str) -> Result<Option<Entity>, Self::Error> {
        // Prefer live entities over merged ones that kept the same key
        self.query_entity(
            &format!(
                "SELECT {} FROM entities WHERE kind = ?1 AND canonical_key = ?2
                 ORDER BY merged_into IS NOT NULL, created_at, id LIMIT 1",
                ENTITY_COLUMNS
            ),
            params![kind.as_str(), key],
        )
    }

    fn find_by_alias(&self, kind: EntityKind, alias: &str) -> Result<Option<Entity>, Self::Error> {
        self.query_entity(
            "SELECT e.id, e.kind, e.display_name, e.canonical_key, e.merged_into, e.created_at
             FROM aliases a JOIN entities e ON e.id = a.entity_id
             WHERE e.kind = ?1 AND a.alias = ?2
             ORDER BY e.merged_into IS NOT NULL, e.created_at, e.id LIMIT 1",
            params![kind.as_str(), alias],
        )
    }

    fn list_entities(&self, kind: EntityKind) -> Result<Vec<Entity>, Self::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM entities WHERE kind = ?1 ORDER BY id",
            ENTITY_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![kind.as_str()], entity_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(|e| self.hydrate(e)).collect()
    }

    fn create_entity(&mut self, entity: &Entity) -> Result<(), Self::Error> {
        let id_bytes = blob(entity.id.value());
        let tx = self.conn.transaction()?;

        let exists = tx
            .query_row("SELECT 1 FROM entities WHERE id = ?1", params![&id_bytes], |_| Ok(true))
            .optional()?
            .unwrap_or(false);
        if exists {
            return Err(StoreError::Duplicate(format!("entity {}", entity.id)));
        }

        tx.execute(
            "INSERT INTO entities (id, kind, display_name, canonical_key, merged_into, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &id_bytes,
                entity.kind.as_str(),
                &entity.display_name,
                &entity.canonical_key,
                entity.merged_into.map(|m| blob(m.value())),
                entity.created_at as i64,
            ],
        )?;
        for alias in &entity.aliases {
            tx.execute(
                "INSERT OR IGNORE INTO aliases (entity_id, alias) VALUES (?1, ?2)",
                params![&id_bytes, alias],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn append_alias(&mut self, id: EntityId, alias: &str) -> Result<bool, Self::Error> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO aliases (entity_id, alias) VALUES (?1, ?2)",
            params![blob(id.value()), alias],
        )?;
        Ok(changed > 0)
    }

    fn merge_entities(&mut self, from: EntityId, into: EntityId) -> Result<(), Self::Error> {
        if from == into {
            return Err(StoreError::InvalidData(format!(
                "cannot merge entity {} into itself",
                from
            )));
        }
        let from_bytes = blob(from.value());
        let into_bytes = blob(into.value());
        let tx = self.conn.transaction()?;

        let mut kinds = Vec::with_capacity(2);
        for (id, bytes) in [(from, &from_bytes), (into, &into_bytes)] {
            let row = tx
                .query_row(
                    "SELECT kind, merged_into IS NOT NULL FROM entities WHERE id = ?1",
                    params![bytes],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?)),
                )
                .optional()?;
            let Some((kind, merged)) = row else {
                return Err(StoreError::NotFound(format!("entity {}", id)));
            };
            // Survivors are never merged themselves, so chains stay one level deep
            if merged {
                return Err(StoreError::InvalidData(format!(
                    "entity {} is already merged",
                    id
                )));
            }
            kinds.push(kind);
        }
        if kinds[0] != kinds[1] {
            return Err(StoreError::InvalidData(format!(
                "cannot merge {} {} into {} {}",
                kinds[0], from, kinds[1], into
            )));
        }

        tx.execute(
            "UPDATE entities SET merged_into = ?2 WHERE id = ?1 OR merged_into = ?1",
            params![&from_bytes, &into_bytes],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO aliases (entity_id, alias)
             SELECT ?2, alias FROM aliases WHERE entity_id = ?1",
            params![&from_bytes, &into_bytes],
        )?;

        tx.commit()?;
        tracing::debug!(from = %from, into = %into, "Entities merged");
        Ok(())
    }

    fn commit_fact(&mut self, request: &CommitRequest) -> Result<CommitOutcome, Self::Error> {
        let id_bytes = blob(request.entity_id.value());
        let field = request.key.field.as_str();
        let round = request.key.round_label();
        let value_json = serde_json::to_string(&request.value)?;
        let provenance_json = serde_json::to_string(&request.provenance)?;

        let tx = self.conn.transaction()?;

        let actual = tx
            .query_row(
                "SELECT MAX(revision) FROM fact_history
                 WHERE entity_id = ?1 AND field = ?2 AND round = ?3",
                params![&id_bytes, field, round],
                |row| row.get::<_, Option<i64>>(0),
            )?
            .unwrap_or(0) as u64;

        let duplicate = tx
            .query_row(
                "SELECT 1 FROM fact_history
                 WHERE entity_id = ?1 AND field = ?2 AND round = ?3
                   AND value = ?4 AND provenance = ?5
                 LIMIT 1",
                params![&id_bytes, field, round, &value_json, &provenance_json],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if duplicate {
            return Ok(CommitOutcome::Unchanged { revision: actual });
        }

        if let Some(expected) = request.expected_revision {
            if expected != actual {
                return Ok(CommitOutcome::Stale { expected, actual });
            }
        }

        let revision = actual + 1;
        tx.execute(
            "INSERT INTO fact_history
             (entity_id, field, round, revision, value, provenance, committed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &id_bytes,
                field,
                round,
                revision as i64,
                &value_json,
                &provenance_json,
                request.committed_at as i64,
            ],
        )?;
        tx.commit()?;

        Ok(CommitOutcome::Committed(FactRecord {
            entity_id: request.entity_id,
            key: request.key.clone(),
            value: request.value.clone(),
            revision,
            provenance: request.provenance.clone(),
            committed_at: request.committed_at,
        }))
    }

    fn current_fact(
        &self,
        id: EntityId,
        key: &FieldKey,
    ) -> Result<Option<CommittedFact>, Self::Error> {
        let record = self
            .conn
            .query_row(
                "SELECT field, round, revision, value, provenance, committed_at
                 FROM fact_history
                 WHERE entity_id = ?1 AND field = ?2 AND round = ?3
                 ORDER BY revision DESC LIMIT 1",
                params![blob(id.value()), key.field.as_str(), key.round_label()],
                |row| history_row(row, id),
            )
            .optional()?;

        Ok(record.map(|r| CommittedFact {
            value: r.value,
            revision: r.revision,
            provenance: r.provenance,
            committed_at: r.committed_at,
        }))
    }

    fn fact_history(&self, id: EntityId, key: &FieldKey) -> Result<Vec<FactRecord>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT field, round, revision, value, provenance, committed_at
             FROM fact_history
             WHERE entity_id = ?1 AND field = ?2 AND round = ?3
             ORDER BY revision",
        )?;
        let records = stmt
            .query_map(
                params![blob(id.value()), key.field.as_str(), key.round_label()],
                |row| history_row(row, id),
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}
