//! Optional-returning accessors over dynamic JSON trees.

use serde_json::{Map, Value};

/// Follow a chain of object keys; `None` as soon as a segment is missing
/// or a node is not an object.
pub fn path<'a>(value: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(value, |node, segment| node.as_object()?.get(*segment))
}

/// First `value` of a metadata field.
///
/// Fields are normally a list of `{ "value": ... }` objects; a bare object
/// is accepted too. Absent fields, empty lists and null values give `None`.
pub fn metadata_value(metadata: Option<&Map<String, Value>>, field: &str) -> Option<String> {
    let entry = match metadata?.get(field)? {
        Value::Array(values) => values.first()?,
        object @ Value::Object(_) => object,
        _ => return None,
    };

    scalar_text(entry.get("value")?)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
