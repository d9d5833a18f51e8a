//! Column encoding helpers shared by the table modules

use crate::StoreError;
use fundwatch_domain::{Field, FieldKey};
use rusqlite::types::Type;
use rusqlite::Row;
use serde::de::DeserializeOwned;

/// Encode an identifier as a 16-byte big-endian blob
pub(crate) fn blob(value: u128) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

/// Decode a 16-byte identifier blob
pub(crate) fn from_blob(bytes: &[u8]) -> Result<u128, StoreError> {
    if bytes.len() != 16 {
        return Err(StoreError::InvalidData(format!(
            "Expected 16 bytes for identifier, got {}",
            bytes.len()
        )));
    }
    let mut arr = [0u8; 16];
    arr.copy_from_slice(bytes);
    Ok(u128::from_be_bytes(arr))
}

/// Conversion failure for column `idx`
pub(crate) fn invalid<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

/// Read an identifier column
pub(crate) fn id_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<u128> {
    let bytes: Vec<u8> = row.get(idx)?;
    from_blob(&bytes).map_err(|e| invalid(idx, e))
}

/// Read a nullable identifier column
pub(crate) fn opt_id_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<u128>> {
    let bytes: Option<Vec<u8>> = row.get(idx)?;
    bytes
        .map(|b| from_blob(&b).map_err(|e| invalid(idx, e)))
        .transpose()
}

/// Read a timestamp column
pub(crate) fn ts_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    Ok(row.get::<_, i64>(idx)? as u64)
}

/// Read a nullable timestamp column
pub(crate) fn opt_ts_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<u64>> {
    Ok(row.get::<_, Option<i64>>(idx)?.map(|t| t as u64))
}

/// Read a JSON text column
pub(crate) fn json_col<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text).map_err(|e| invalid(idx, e))
}

/// Read a nullable JSON text column
pub(crate) fn opt_json_col<T: DeserializeOwned>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| serde_json::from_str(&t).map_err(|e| invalid(idx, e)))
        .transpose()
}

/// Read a text column through a parser
pub(crate) fn parsed_col<T>(
    row: &Row<'_>,
    idx: usize,
    parse: impl Fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    parse(&text).ok_or_else(|| invalid(idx, format!("Unrecognized value: {}", text)))
}

/// Read a field key stored as (field, round) at `idx` and `idx + 1`
pub(crate) fn key_cols(row: &Row<'_>, idx: usize) -> rusqlite::Result<FieldKey> {
    let field: String = row.get(idx)?;
    let field: Field = field.parse().map_err(|e: String| invalid(idx, e))?;
    let round: String = row.get(idx + 1)?;
    Ok(FieldKey {
        field,
        round: if round.is_empty() { None } else { Some(round) },
    })
}
