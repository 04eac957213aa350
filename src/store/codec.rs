//! JSON row access shared by read and write transactions.

use redb::{ReadTransaction, ReadableTable, WriteTransaction};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::{map_err, StoreResult};
use super::tables::{JsonTable, SEQUENCES};

/// Read access to JSON tables, implemented for both transaction kinds so the
/// same lookup code runs inside a publish and inside a plain listing.
pub trait TableRead {
    fn get_json<V: DeserializeOwned>(&self, table: JsonTable, key: &str) -> StoreResult<Option<V>>;

    /// All rows whose key starts with `prefix`, in key order.
    fn scan_json<V: DeserializeOwned>(&self, table: JsonTable, prefix: &str) -> StoreResult<Vec<V>>;

    /// All keys starting with `prefix`, in key order.
    fn scan_keys(&self, table: JsonTable, prefix: &str) -> StoreResult<Vec<String>>;
}

impl TableRead for ReadTransaction {
    fn get_json<V: DeserializeOwned>(&self, table: JsonTable, key: &str) -> StoreResult<Option<V>> {
        let table = self.open_table(table).map_err(map_err!(Table))?;
        get_from(&table, key)
    }

    fn scan_json<V: DeserializeOwned>(&self, table: JsonTable, prefix: &str) -> StoreResult<Vec<V>> {
        let table = self.open_table(table).map_err(map_err!(Table))?;
        scan_from(&table, prefix)
    }

    fn scan_keys(&self, table: JsonTable, prefix: &str) -> StoreResult<Vec<String>> {
        let table = self.open_table(table).map_err(map_err!(Table))?;
        keys_from(&table, prefix)
    }
}

impl TableRead for WriteTransaction {
    fn get_json<V: DeserializeOwned>(&self, table: JsonTable, key: &str) -> StoreResult<Option<V>> {
        let table = self.open_table(table).map_err(map_err!(Table))?;
        get_from(&table, key)
    }

    fn scan_json<V: DeserializeOwned>(&self, table: JsonTable, prefix: &str) -> StoreResult<Vec<V>> {
        let table = self.open_table(table).map_err(map_err!(Table))?;
        scan_from(&table, prefix)
    }

    fn scan_keys(&self, table: JsonTable, prefix: &str) -> StoreResult<Vec<String>> {
        let table = self.open_table(table).map_err(map_err!(Table))?;
        keys_from(&table, prefix)
    }
}

fn get_from<T, V>(table: &T, key: &str) -> StoreResult<Option<V>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
    V: DeserializeOwned,
{
    match table.get(key).map_err(map_err!(Read))? {
        Some(guard) => {
            let row = serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
            Ok(Some(row))
        }
        None => Ok(None),
    }
}

fn scan_from<T, V>(table: &T, prefix: &str) -> StoreResult<Vec<V>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
    V: DeserializeOwned,
{
    let mut rows = Vec::new();
    for entry in table.range(prefix..).map_err(map_err!(Read))? {
        let (key, value) = entry.map_err(map_err!(Read))?;
        if !key.value().starts_with(prefix) {
            break;
        }
        rows.push(serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?);
    }
    Ok(rows)
}

fn keys_from<T>(table: &T, prefix: &str) -> StoreResult<Vec<String>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let mut keys = Vec::new();
    for entry in table.range(prefix..).map_err(map_err!(Read))? {
        let (key, _) = entry.map_err(map_err!(Read))?;
        let key = key.value();
        if !key.starts_with(prefix) {
            break;
        }
        keys.push(key.to_string());
    }
    Ok(keys)
}

/// Insert or replace a row.
pub fn put_json<V: Serialize>(
    txn: &WriteTransaction,
    table: JsonTable,
    key: &str,
    value: &V,
) -> StoreResult<()> {
    let bytes = serde_json::to_vec(value).map_err(map_err!(Serialize))?;
    let mut table = txn.open_table(table).map_err(map_err!(Table))?;
    table
        .insert(key, bytes.as_slice())
        .map_err(map_err!(Write))?;
    Ok(())
}

/// Remove a row. Returns true if it existed.
pub fn remove_key(txn: &WriteTransaction, table: JsonTable, key: &str) -> StoreResult<bool> {
    let mut table = txn.open_table(table).map_err(map_err!(Table))?;
    let existed = table.remove(key).map_err(map_err!(Write))?.is_some();
    Ok(existed)
}

/// Remove every row whose key starts with `prefix`. Returns the number removed.
pub fn remove_prefix(txn: &WriteTransaction, table: JsonTable, prefix: &str) -> StoreResult<usize> {
    let keys = txn.scan_keys(table, prefix)?;
    let mut table = txn.open_table(table).map_err(map_err!(Table))?;
    for key in &keys {
        table.remove(key.as_str()).map_err(map_err!(Write))?;
    }
    Ok(keys.len())
}

/// Allocate the next id of a sequence. Ids start at 1 and are never reused.
pub fn next_id(txn: &WriteTransaction, sequence: &str) -> StoreResult<u64> {
    let mut table = txn.open_table(SEQUENCES).map_err(map_err!(Table))?;
    let current = table
        .get(sequence)
        .map_err(map_err!(Read))?
        .map(|guard| guard.value())
        .unwrap_or(0);
    let next = current + 1;
    table.insert(sequence, next).map_err(map_err!(Write))?;
    Ok(next)
}
