use serde::de::Unexpected;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Descriptive information about a known extension.
///
/// Every field is optional; the reference dataset is incomplete for many
/// entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    #[serde(
        rename = "original_name",
        alias = "display_name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub display_name: Option<String>,
    #[serde(
        rename = "extension_category",
        alias = "category",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
}

/// Read-only lookup table from extension identifier to metadata.
///
/// Records are kept as raw JSON and decoded on lookup, so a single malformed
/// entry only affects the candidate it belongs to.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct MetadataIndex {
    records: HashMap<String, Value>,
}

impl MetadataIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, record: Value) {
        self.records.insert(id.into(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the record for `id`, `Ok(None)` when the dataset has no entry.
    ///
    /// # Errors
    ///
    /// Returns an error when the entry exists but is not a decodable object.
    pub fn lookup(&self, id: &str) -> Result<Option<MetadataRecord>, serde_json::Error> {
        match self.records.get(id) {
            None | Some(Value::Null) => Ok(None),
            Some(value @ Value::Object(_)) => MetadataRecord::deserialize(value).map(Some),
            Some(other) => Err(serde::de::Error::invalid_type(
                unexpected(other),
                &"a metadata object",
            )),
        }
    }
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(_) => Unexpected::Other("number"),
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
        Value::Null | Value::Object(_) => Unexpected::Other("value"),
    }
}

impl FromIterator<(String, MetadataRecord)> for MetadataIndex {
    fn from_iter<I: IntoIterator<Item = (String, MetadataRecord)>>(iter: I) -> Self {
        let records = iter
            .into_iter()
            .filter_map(|(id, record)| serde_json::to_value(record).ok().map(|v| (id, v)))
            .collect();
        Self { records }
    }
}
