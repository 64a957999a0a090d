//! Publication records before and after normalization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Output columns of a [`NormalizedRecord`], in serialization order.
pub const COLUMNS: [&str; 10] = [
    "name",
    "doi",
    "has_identifier",
    "publication_type",
    "publication_type_group",
    "date_issued",
    "year",
    "license",
    "license_short",
    "license_short_group",
];

/// Borrowed view of one index entry in a search response.
#[derive(Debug, Clone, Copy)]
pub struct RawRecord<'a> {
    pub uuid: &'a str,
    pub name: &'a str,
    /// Metadata field name -> list of `{ "value": ... }` objects
    pub metadata: Option<&'a Map<String, Value>>,
}

impl<'a> RawRecord<'a> {
    /// Build a view over an `indexableObject` node.
    ///
    /// Returns `None` when the node is not a JSON object.
    pub fn from_value(value: &'a Value) -> Option<Self> {
        let object = value.as_object()?;
        Some(Self {
            uuid: object.get("uuid").and_then(Value::as_str).unwrap_or(""),
            name: object.get("name").and_then(Value::as_str).unwrap_or(""),
            metadata: object.get("metadata").and_then(Value::as_object),
        })
    }
}

/// Column a metadata field is extracted into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputField {
    Doi,
    PublicationType,
    DateIssued,
    License,
}

impl OutputField {
    /// Output column name
    pub fn column(&self) -> &'static str {
        match self {
            OutputField::Doi => "doi",
            OutputField::PublicationType => "publication_type",
            OutputField::DateIssued => "date_issued",
            OutputField::License => "license",
        }
    }
}

/// Ordered list of metadata fields to extract from every entry of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    fields: Vec<(String, OutputField)>,
}

impl FieldSpec {
    pub fn new(fields: Vec<(String, OutputField)>) -> Self {
        Self { fields }
    }

    /// Iterate over `(metadata field, output column)` pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, OutputField)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), *field))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for FieldSpec {
    fn default() -> Self {
        Self::new(vec![
            ("dc.identifier.doi".to_string(), OutputField::Doi),
            ("dc.type".to_string(), OutputField::PublicationType),
            ("dc.date.issued".to_string(), OutputField::DateIssued),
            ("dc.rights.license".to_string(), OutputField::License),
        ])
    }
}

/// Field values pulled out of one entry, before derivation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub doi: Option<String>,
    pub publication_type: Option<String>,
    pub date_issued: Option<String>,
    pub license: Option<String>,
}

impl ExtractedFields {
    pub fn set(&mut self, field: OutputField, value: Option<String>) {
        match field {
            OutputField::Doi => self.doi = value,
            OutputField::PublicationType => self.publication_type = value,
            OutputField::DateIssued => self.date_issued = value,
            OutputField::License => self.license = value,
        }
    }
}

/// One flat, analysis-ready publication row.
///
/// Field order matches [`COLUMNS`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub name: String,
    pub doi: Option<String>,
    pub has_identifier: bool,
    pub publication_type: Option<String>,
    pub publication_type_group: String,
    pub date_issued: Option<String>,
    pub year: Option<i32>,
    pub license: String,
    pub license_short: String,
    pub license_short_group: String,
}

impl NormalizedRecord {
    /// Human-readable form of `has_identifier`
    pub fn identifier_label(&self) -> &'static str {
        if self.has_identifier {
            "Has DOI"
        } else {
            "No DOI"
        }
    }
}

/// A normalized row together with the uuid of the entry it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedRecord {
    pub uuid: String,
    pub record: NormalizedRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_record_view() {
        let value = json!({
            "uuid": "u1",
            "name": "Paper A",
            "metadata": { "dc.type": [{ "value": "Dataset" }] }
        });
        let raw = RawRecord::from_value(&value).unwrap();
        assert_eq!(raw.uuid, "u1");
        assert_eq!(raw.name, "Paper A");
        assert!(raw.metadata.unwrap().contains_key("dc.type"));
    }

    #[test]
    fn test_raw_record_missing_parts() {
        let value = json!({});
        let raw = RawRecord::from_value(&value).unwrap();
        assert_eq!(raw.uuid, "");
        assert_eq!(raw.name, "");
        assert!(raw.metadata.is_none());

        assert!(RawRecord::from_value(&json!("not an object")).is_none());
    }

    #[test]
    fn test_default_field_spec_order() {
        let spec = FieldSpec::default();
        let columns: Vec<&str> = spec.iter().map(|(_, f)| f.column()).collect();
        assert_eq!(
            columns,
            vec!["doi", "publication_type", "date_issued", "license"]
        );
    }

    #[test]
    fn test_serialized_column_order() {
        let record = NormalizedRecord {
            name: "Paper A".to_string(),
            doi: None,
            has_identifier: false,
            publication_type: None,
            publication_type_group: "Other publication".to_string(),
            date_issued: Some("2015-06-01".to_string()),
            year: Some(2015),
            license: "No license".to_string(),
            license_short: "No license".to_string(),
            license_short_group: "No license".to_string(),
        };

        let value = serde_json::to_value(&record).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        // serde_json's Map is sorted unless preserve_order is on, so compare via the text
        let text = serde_json::to_string(&record).unwrap();
        let mut last = 0;
        for column in COLUMNS {
            let pos = text.find(&format!("\"{}\":", column)).unwrap();
            assert!(pos >= last, "column {} out of order", column);
            last = pos;
        }
        assert_eq!(keys.len(), COLUMNS.len());
        assert_eq!(record.identifier_label(), "No DOI");
    }
}
