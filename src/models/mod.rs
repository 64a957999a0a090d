//! Core data models for collection records, searches and usage statistics.

mod record;
mod search;
mod stats;

pub use record::{
    ExtractedFields, FieldSpec, KeyedRecord, NormalizedRecord, OutputField, RawRecord, COLUMNS,
};
pub use search::{discovery_query, SearchRequest, DEFAULT_MAX_ITEMS};
pub use stats::{
    CountryVisitRow, CountryVisits, MonthlyVisitRow, MonthlyVisits, PublicationStats,
    PublicationStatsRow,
};
