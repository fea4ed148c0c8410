//! Row records and the arena that owns them.
//!
//! Records are opaque key/value objects. Everything downstream (pipeline
//! stages, display rows, the renderer) refers to them by `RowId`, an index
//! into the `RowStore`, so nothing holds a reference back into the store.

use serde_json::{Map, Value};

/// One data record: field name to JSON value
pub type Record = Map<String, Value>;

/// Index of a record inside a `RowStore`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub usize);

/// Owns every loaded record in load order
#[derive(Debug, Clone, Default)]
pub struct RowStore {
    records: Vec<Record>,
}

impl RowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with a new batch of records
    pub fn load(&mut self, records: Vec<Record>) {
        self.records = records;
    }

    /// Append a record, returning its id
    pub fn push(&mut self, record: Record) -> RowId {
        self.records.push(record);
        RowId(self.records.len() - 1)
    }

    pub fn get(&self, id: RowId) -> Option<&Record> {
        self.records.get(id.0)
    }

    /// Field value for a record, `Value::Null` when absent
    pub fn value(&self, id: RowId, field: &str) -> &Value {
        self.get(id)
            .and_then(|record| record.get(field))
            .unwrap_or(&Value::Null)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All ids in load order
    pub fn ids(&self) -> Vec<RowId> {
        (0..self.records.len()).map(RowId).collect()
    }
}

/// Render a JSON value as plain cell text
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_store_lookup() {
        let mut store = RowStore::new();
        let a = store.push(record(json!({"name": "alpha", "qty": 3})));
        let b = store.push(record(json!({"name": "beta"})));

        assert_eq!(store.len(), 2);
        assert_eq!(store.value(a, "name"), &json!("alpha"));
        assert_eq!(store.value(b, "qty"), &Value::Null);
        assert_eq!(store.ids(), vec![a, b]);
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(value_to_text(&json!(null)), "");
        assert_eq!(value_to_text(&json!("x")), "x");
        assert_eq!(value_to_text(&json!(1.5)), "1.5");
        assert_eq!(value_to_text(&json!(true)), "true");
        assert_eq!(value_to_text(&json!([1, 2])), "[1,2]");
    }
}
