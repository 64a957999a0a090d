//! Turns a nested search response into flat publication rows.
//!
//! The response is only ever borrowed. Per-record irregularities (missing
//! fields, unparsable dates, unknown licenses or types) are absorbed through
//! `None` values and table defaults; the only failure is a [`SchemaError`]
//! when the list of objects cannot be located at all.
//!
//! ```rust
//! use collection_stats::models::FieldSpec;
//! use collection_stats::normalize::Normalizer;
//! use serde_json::json;
//!
//! let response = json!({
//!     "_embedded": { "searchResult": { "_embedded": { "objects": [
//!         { "_embedded": { "indexableObject": {
//!             "uuid": "u1",
//!             "name": "Paper A",
//!             "metadata": { "dc.date.issued": [{ "value": "2015-06-01" }] }
//!         } } }
//!     ] } } }
//! });
//!
//! let rows = Normalizer::new(FieldSpec::default()).normalize(&response).unwrap();
//! assert_eq!(rows[0].year, Some(2015));
//! assert_eq!(rows[0].license_short_group, "No license");
//! ```

mod access;
pub mod lookup;
mod summary;

pub use access::{metadata_value, path};
pub use summary::{summarize, PublicationSummary};

use serde::Serialize;
use serde_json::Value;

use crate::models::{ExtractedFields, FieldSpec, KeyedRecord, NormalizedRecord, RawRecord};

/// Rows with a year at or below this value are dropped.
pub const DEFAULT_MIN_YEAR: i32 = 2010;

const OBJECTS_PATH: [&str; 4] = ["_embedded", "searchResult", "_embedded", "objects"];
const INDEXABLE_PATH: [&str; 2] = ["_embedded", "indexableObject"];

/// The search response does not have the expected shape
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Unexpected API response structure: missing `{0}`")]
    MissingPath(String),

    #[error("Unexpected API response structure: `{path}` is {found}, expected {expected}")]
    UnexpectedType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Counters describing what happened to the entries of one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    /// Index entries found in the response
    pub entries: usize,
    /// Wrappers without an indexable object, or whose object is not a JSON object
    pub skipped_entries: usize,
    /// Rows dropped because their year is at or below the cutoff
    pub dropped_before_cutoff: usize,
    /// Rows dropped because no year could be parsed
    pub dropped_unparsable_year: usize,
    /// Rows in the output
    pub kept: usize,
}

/// Normalized rows of one batch, still carrying their uuids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOutcome {
    pub records: Vec<KeyedRecord>,
    pub report: NormalizeReport,
}

impl NormalizeOutcome {
    /// Drop the uuids, keeping only the output rows
    pub fn into_records(self) -> Vec<NormalizedRecord> {
        self.records.into_iter().map(|keyed| keyed.record).collect()
    }
}

/// Extracts, recodes and filters publication rows
#[derive(Debug, Clone)]
pub struct Normalizer {
    fields: FieldSpec,
    min_year: i32,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(FieldSpec::default())
    }
}

impl Normalizer {
    pub fn new(fields: FieldSpec) -> Self {
        Self {
            fields,
            min_year: DEFAULT_MIN_YEAR,
        }
    }

    /// Set the exclusive year cutoff
    pub fn min_year(mut self, min_year: i32) -> Self {
        self.min_year = min_year;
        self
    }

    pub fn fields(&self) -> &FieldSpec {
        &self.fields
    }

    /// Normalize a search response into output rows, in source order.
    pub fn normalize(&self, response: &Value) -> Result<Vec<NormalizedRecord>, SchemaError> {
        self.normalize_keyed(response)
            .map(NormalizeOutcome::into_records)
    }

    /// Like [`Normalizer::normalize`], but keeps each row's uuid and reports
    /// how many entries were dropped and why.
    pub fn normalize_keyed(&self, response: &Value) -> Result<NormalizeOutcome, SchemaError> {
        let (objects, skipped_entries) = index_objects(response)?;

        let mut report = NormalizeReport {
            entries: objects.len(),
            skipped_entries,
            ..Default::default()
        };
        let mut records = Vec::with_capacity(objects.len());

        for object in objects {
            let Some(raw) = RawRecord::from_value(object) else {
                tracing::debug!("Skipping non-object index entry");
                report.skipped_entries += 1;
                continue;
            };

            let record = self.normalize_entry(&raw);
            match record.year {
                Some(year) if year > self.min_year => records.push(KeyedRecord {
                    uuid: raw.uuid.to_string(),
                    record,
                }),
                Some(_) => report.dropped_before_cutoff += 1,
                None => {
                    tracing::warn!(
                        name = %record.name,
                        date_issued = ?record.date_issued,
                        "Dropping record without a parsable year"
                    );
                    report.dropped_unparsable_year += 1;
                }
            }
        }

        report.kept = records.len();

        tracing::debug!(?report, "Normalized search response");

        Ok(NormalizeOutcome { records, report })
    }

    /// Build the output row for a single entry, without year filtering.
    pub fn normalize_entry(&self, raw: &RawRecord<'_>) -> NormalizedRecord {
        let mut extracted = ExtractedFields::default();
        for (field, output) in self.fields.iter() {
            extracted.set(output, metadata_value(raw.metadata, field));
        }

        derive_record(raw.name, extracted)
    }
}

/// Apply the derived columns, each depending only on columns computed before it.
fn derive_record(name: &str, fields: ExtractedFields) -> NormalizedRecord {
    let ExtractedFields {
        doi,
        publication_type,
        date_issued,
        license,
    } = fields;

    let year = date_issued.as_deref().and_then(parse_year);
    let license = license.unwrap_or_else(|| lookup::NO_LICENSE.to_string());
    let license_short = lookup::license_short(&license).to_string();
    let license_short_group = lookup::license_group(&license_short).to_string();
    let publication_type_group =
        lookup::publication_type_group(publication_type.as_deref()).to_string();
    let has_identifier = doi.is_some();

    NormalizedRecord {
        name: name.to_string(),
        doi,
        has_identifier,
        publication_type,
        publication_type_group,
        date_issued,
        year,
        license,
        license_short,
        license_short_group,
    }
}

/// Integer value of the first four characters of a date string
pub fn parse_year(date: &str) -> Option<i32> {
    let prefix: String = date.chars().take(4).collect();
    prefix.parse().ok()
}

/// Locate the indexable objects of a search response.
///
/// Returns the objects and the number of wrappers that had none.
fn index_objects(response: &Value) -> Result<(Vec<&Value>, usize), SchemaError> {
    for depth in 1..=OBJECTS_PATH.len() {
        if path(response, &OBJECTS_PATH[..depth]).is_none() {
            return Err(SchemaError::MissingPath(OBJECTS_PATH[..depth].join(".")));
        }
    }

    let wrappers: Vec<&Value> = match path(response, &OBJECTS_PATH) {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(wrapper @ Value::Object(_)) => vec![wrapper],
        Some(other) => {
            return Err(SchemaError::UnexpectedType {
                path: OBJECTS_PATH.join("."),
                expected: "a list or an object",
                found: kind(other),
            })
        }
        None => return Err(SchemaError::MissingPath(OBJECTS_PATH.join("."))),
    };

    let mut objects = Vec::with_capacity(wrappers.len());
    let mut skipped = 0;
    for wrapper in wrappers {
        match path(wrapper, &INDEXABLE_PATH) {
            Some(Value::Array(items)) => objects.extend(items.iter()),
            Some(object) => objects.push(object),
            None => {
                tracing::debug!("Skipping search result without an indexable object");
                skipped += 1;
            }
        }
    }

    Ok((objects, skipped))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
