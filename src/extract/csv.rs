//! CSV files with a header row.
//!
//! Rows become JSON objects keyed by header, in column order, and the whole
//! file is rendered as a pretty-printed JSON array. Short rows get empty
//! strings for the missing columns; cells beyond the header are keyed
//! `_<index>`. Keys are unique within a record: a repeated header (or an
//! overflow key a header already uses) gets a `_<n>` suffix.

use std::collections::HashSet;

use serde_json::{Map, Value};

use super::{BoxError, TextExtractor};

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExtractor;

impl TextExtractor for CsvExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, BoxError> {
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let mut taken = HashSet::new();
        let keys: Vec<String> = reader
            .headers()?
            .iter()
            .map(|header| claim_key(&mut taken, header))
            .collect();
        let mut records = Vec::new();

        for row in reader.records() {
            let row = row?;
            let mut record = Map::new();
            for (idx, key) in keys.iter().enumerate() {
                let cell = row.get(idx).unwrap_or_default();
                record.insert(key.clone(), Value::String(cell.to_string()));
            }
            let mut row_taken = taken.clone();
            for idx in keys.len()..row.len() {
                let cell = row.get(idx).unwrap_or_default();
                let key = claim_key(&mut row_taken, &format!("_{}", idx));
                record.insert(key, Value::String(cell.to_string()));
            }
            records.push(Value::Object(record));
        }

        Ok(serde_json::to_string_pretty(&records)?)
    }
}

/// Reserve `wanted`, or the first free `wanted_<n>` when it is already used.
fn claim_key(taken: &mut HashSet<String>, wanted: &str) -> String {
    let mut key = wanted.to_string();
    let mut n = 1;
    while taken.contains(&key) {
        key = format!("{}_{}", wanted, n);
        n += 1;
    }
    taken.insert(key.clone());
    key
}
