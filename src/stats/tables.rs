//! Flat tables, monthly pivot and summary built from [`PublicationStats`].

use chrono::{Months, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::models::{CountryVisitRow, MonthlyVisitRow, PublicationStats, PublicationStatsRow};

/// The three statistics tables handed to downstream writers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsTables {
    pub publications: Vec<PublicationStatsRow>,
    pub monthly_visits: Vec<MonthlyVisitRow>,
    pub countries: Vec<CountryVisitRow>,
}

impl StatsTables {
    pub fn from_stats(stats: &[PublicationStats]) -> Self {
        let mut tables = Self::default();

        for entry in stats {
            tables.publications.push(PublicationStatsRow {
                uuid: entry.uuid.clone(),
                title: entry.title.clone(),
                total_downloads: entry.total_downloads,
                total_visits: entry.total_visits,
                num_months_with_data: entry.monthly_visits.len(),
                num_countries: entry.top_countries.len(),
            });

            tables
                .monthly_visits
                .extend(entry.monthly_visits.iter().map(|month| MonthlyVisitRow {
                    uuid: entry.uuid.clone(),
                    title: entry.title.clone(),
                    month: month.month.clone(),
                    visits: month.visits,
                }));

            tables
                .countries
                .extend(entry.top_countries.iter().map(|country| CountryVisitRow {
                    uuid: entry.uuid.clone(),
                    title: entry.title.clone(),
                    country_code: country.country_code.clone(),
                    country: country.country.clone(),
                    visits: country.visits,
                }));
        }

        tables
    }
}

/// One title's visits, aligned with [`MonthlyPivot::months`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotRow {
    pub title: String,
    pub visits: Vec<u64>,
}

/// Titles x months visit matrix
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonthlyPivot {
    /// Consecutive months as `YYYY-MM`, oldest first
    pub months: Vec<String>,
    pub rows: Vec<PivotRow>,
}

/// Parse a month label such as "March 2025" or "2025-03".
pub fn parse_month(label: &str) -> Option<NaiveDate> {
    let label = label.trim();
    NaiveDate::parse_from_str(&format!("01 {}", label), "%d %B %Y")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", label), "%Y-%m-%d"))
        .ok()
}

/// Pivot monthly visits into one row per title.
///
/// Months between the first and last observed month are all present;
/// missing cells are 0. Titles keep their first-seen order. Labels that
/// are not recognizable months are skipped.
pub fn monthly_pivot(rows: &[MonthlyVisitRow]) -> MonthlyPivot {
    let mut titles: Vec<&str> = Vec::new();
    let mut cells: HashMap<(&str, NaiveDate), u64> = HashMap::new();
    let mut observed: BTreeSet<NaiveDate> = BTreeSet::new();

    for row in rows {
        let Some(month) = parse_month(&row.month) else {
            tracing::debug!(label = %row.month, "Skipping unrecognized month label");
            continue;
        };
        if !titles.contains(&row.title.as_str()) {
            titles.push(&row.title);
        }
        observed.insert(month);
        *cells.entry((row.title.as_str(), month)).or_default() += row.visits;
    }

    let (Some(first), Some(last)) = (observed.first().copied(), observed.last().copied()) else {
        return MonthlyPivot::default();
    };

    let mut months = Vec::new();
    let mut current = first;
    while current <= last {
        months.push(current);
        match current.checked_add_months(Months::new(1)) {
            Some(next) => current = next,
            None => break,
        }
    }

    MonthlyPivot {
        months: months.iter().map(|m| m.format("%Y-%m").to_string()).collect(),
        rows: titles
            .into_iter()
            .map(|title| PivotRow {
                title: title.to_string(),
                visits: months
                    .iter()
                    .map(|month| cells.get(&(title, *month)).copied().unwrap_or(0))
                    .collect(),
            })
            .collect(),
    }
}

/// One title's estimated downloads, aligned with [`MonthlyDownloads::months`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadsRow {
    pub title: String,
    pub downloads: Vec<f64>,
}

/// Titles x months download estimate
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlyDownloads {
    pub months: Vec<String>,
    pub rows: Vec<DownloadsRow>,
}

/// Spread each title's total downloads over the pivot months in proportion
/// to its monthly visits.
///
/// Usage reports only carry download totals, so this is an estimate. Rows
/// whose title has no downloads, or no visits in the pivot, keep their
/// visit counts unchanged.
pub fn monthly_downloads_estimate(
    pivot: &MonthlyPivot,
    publications: &[PublicationStatsRow],
) -> MonthlyDownloads {
    let rows = pivot
        .rows
        .iter()
        .map(|row| {
            let visits: Vec<f64> = row.visits.iter().map(|v| *v as f64).collect();
            let total_visits: f64 = visits.iter().sum();
            let total_downloads = publications
                .iter()
                .rev()
                .find(|p| p.title == row.title && p.total_downloads > 0)
                .map(|p| p.total_downloads as f64);

            let downloads = match total_downloads {
                Some(total) if total_visits > 0.0 => visits
                    .iter()
                    .map(|v| v * total / total_visits)
                    .collect(),
                _ => visits,
            };

            DownloadsRow {
                title: row.title.clone(),
                downloads,
            }
        })
        .collect();

    MonthlyDownloads {
        months: pivot.months.clone(),
        rows,
    }
}

/// Headline numbers over a statistics run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSummary {
    pub publications: usize,
    pub total_downloads: u64,
    pub total_visits: u64,
    pub unique_countries: usize,
    pub top_by_downloads: Vec<PublicationStatsRow>,
    pub top_by_visits: Vec<PublicationStatsRow>,
    /// Countries by summed visits across publications
    pub top_countries: Vec<(String, u64)>,
}

impl StatsSummary {
    pub fn from_tables(tables: &StatsTables) -> Self {
        let top = |key: fn(&PublicationStatsRow) -> u64| {
            let mut rows = tables.publications.clone();
            rows.sort_by(|a, b| key(b).cmp(&key(a)));
            rows.truncate(3);
            rows
        };

        let mut country_totals: HashMap<&str, u64> = HashMap::new();
        for row in &tables.countries {
            *country_totals.entry(row.country.as_str()).or_default() += row.visits;
        }
        let mut top_countries: Vec<(String, u64)> = country_totals
            .iter()
            .map(|(country, visits)| (country.to_string(), *visits))
            .collect();
        top_countries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_countries.truncate(5);

        let unique_countries = tables
            .countries
            .iter()
            .map(|row| row.country.as_str())
            .collect::<HashSet<_>>()
            .len();

        Self {
            publications: tables.publications.len(),
            total_downloads: tables.publications.iter().map(|r| r.total_downloads).sum(),
            total_visits: tables.publications.iter().map(|r| r.total_visits).sum(),
            unique_countries,
            top_by_downloads: top(|row| row.total_downloads),
            top_by_visits: top(|row| row.total_visits),
            top_countries,
        }
    }
}
