//! Value counts over normalized publication rows.

use serde::Serialize;
use std::collections::HashMap;

use crate::models::NormalizedRecord;

/// Counts of publications per type group and per license group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublicationSummary {
    pub total: usize,
    pub with_identifier: usize,
    pub by_type_group: Vec<(String, usize)>,
    pub by_license_group: Vec<(String, usize)>,
}

pub fn summarize(records: &[NormalizedRecord]) -> PublicationSummary {
    PublicationSummary {
        total: records.len(),
        with_identifier: records.iter().filter(|r| r.has_identifier).count(),
        by_type_group: value_counts(records.iter().map(|r| r.publication_type_group.as_str())),
        by_license_group: value_counts(records.iter().map(|r| r.license_short_group.as_str())),
    }
}

/// Count occurrences, most frequent first; ties ordered by label
fn value_counts<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }

    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(label, count)| (label.to_string(), count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}
