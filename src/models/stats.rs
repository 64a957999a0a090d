//! Usage statistics models.

use serde::{Deserialize, Serialize};

/// Visits recorded for one month label (e.g. "March 2025")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyVisits {
    pub month: String,
    pub visits: u64,
}

/// Visits attributed to one country
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryVisits {
    pub country_code: String,
    pub country: String,
    pub visits: u64,
    /// Share of the publication's country visits, rounded to 2 decimals
    pub percentage: f64,
}

/// Usage statistics of a single publication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationStats {
    pub uuid: String,
    pub title: String,
    pub total_downloads: u64,
    pub total_visits: u64,
    pub monthly_visits: Vec<MonthlyVisits>,
    pub top_countries: Vec<CountryVisits>,
}

impl PublicationStats {
    /// Zeroed statistics, used when no usage report is available
    pub fn empty(uuid: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            title: title.into(),
            total_downloads: 0,
            total_visits: 0,
            monthly_visits: Vec::new(),
            top_countries: Vec::new(),
        }
    }
}

/// Row of the `publication_statistics` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationStatsRow {
    pub uuid: String,
    pub title: String,
    pub total_downloads: u64,
    pub total_visits: u64,
    pub num_months_with_data: usize,
    pub num_countries: usize,
}

/// Row of the `monthly_visits` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyVisitRow {
    pub uuid: String,
    pub title: String,
    pub month: String,
    pub visits: u64,
}

/// Row of the `country_statistics` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryVisitRow {
    pub uuid: String,
    pub title: String,
    pub country_code: String,
    pub country: String,
    pub visits: u64,
}
