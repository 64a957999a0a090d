//! Usage statistics: per-publication usage reports reduced to flat tables.
//!
//! A usage report groups several reports, each tagged with a `report-type`
//! and carrying a list of points:
//!
//! ```json
//! { "_embedded": { "usagereports": [
//!     { "report-type": "TotalVisits", "points": [ { "values": { "views": 12 } } ] },
//!     { "report-type": "TopCountries", "points": [
//!         { "id": "CH", "label": "Switzerland", "values": { "views": 9 } }
//!     ] }
//! ] } }
//! ```
//!
//! Unknown report types are ignored and missing reports leave their counters
//! at zero; a publication whose report cannot be fetched still gets a row.

mod tables;

pub use tables::{
    monthly_downloads_estimate, monthly_pivot, DownloadsRow, MonthlyDownloads, MonthlyPivot,
    PivotRow, StatsSummary, StatsTables,
};

use governor::{Quota, RateLimiter};
use serde_json::Value;
use std::time::Duration;

use crate::models::{CountryVisits, KeyedRecord, MonthlyVisits, PublicationStats};
use crate::sources::CollectionSource;

/// Default spacing between two usage-report requests.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(1000);

const TOTAL_DOWNLOADS: &str = "TotalDownloads";
const TOTAL_VISITS: &str = "TotalVisits";
const TOTAL_VISITS_PER_MONTH: &str = "TotalVisitsPerMonth";
const TOP_COUNTRIES: &str = "TopCountries";

/// Reduce one usage report to [`PublicationStats`].
pub fn extract_statistics(uuid: &str, title: &str, report: Option<&Value>) -> PublicationStats {
    let mut stats = PublicationStats::empty(uuid, title);

    let Some(reports) = report
        .and_then(|r| r.get("_embedded"))
        .and_then(|e| e.get("usagereports"))
        .and_then(Value::as_array)
    else {
        return stats;
    };

    for report in reports {
        let report_type = report
            .get("report-type")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let points: &[Value] = report
            .get("points")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        match report_type {
            TOTAL_DOWNLOADS => {
                // one point per bitstream
                stats.total_downloads += points.iter().map(views).sum::<u64>();
            }
            TOTAL_VISITS => {
                if let Some(last) = points.last() {
                    stats.total_visits = views(last);
                }
            }
            TOTAL_VISITS_PER_MONTH => {
                stats.monthly_visits = points
                    .iter()
                    .map(|point| MonthlyVisits {
                        month: text(point, "label"),
                        visits: views(point),
                    })
                    .collect();
            }
            TOP_COUNTRIES => {
                let total: u64 = points.iter().map(views).sum();
                stats.top_countries = points
                    .iter()
                    .map(|point| {
                        let visits = views(point);
                        CountryVisits {
                            country_code: text(point, "id"),
                            country: text(point, "label"),
                            visits,
                            percentage: percentage(visits, total),
                        }
                    })
                    .collect();
            }
            other => tracing::trace!(report_type = other, "Ignoring usage report"),
        }
    }

    stats
}

fn views(point: &Value) -> u64 {
    let Some(views) = point.get("values").and_then(|v| v.get("views")) else {
        return 0;
    };
    views
        .as_u64()
        .or_else(|| views.as_f64().filter(|v| *v >= 0.0).map(|v| v.round() as u64))
        .unwrap_or(0)
}

fn text(point: &Value, key: &str) -> String {
    point
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 10_000.0).round() / 100.0
}

/// Options for [`collect_statistics`]
#[derive(Debug, Clone, Copy)]
pub struct CollectOptions {
    /// Minimum spacing between two requests; zero disables rate limiting
    pub delay: Duration,
    /// Draw a progress bar on the terminal
    pub show_progress: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            delay: DEFAULT_REQUEST_DELAY,
            show_progress: false,
        }
    }
}

/// Fetch and reduce the usage report of every publication, one at a time.
///
/// A failed fetch is logged and yields zeroed statistics for that
/// publication, so the output has exactly one entry per input, in order.
pub async fn collect_statistics(
    source: &dyn CollectionSource,
    publications: &[KeyedRecord],
    options: CollectOptions,
) -> Vec<PublicationStats> {
    let limiter = Quota::with_period(options.delay).map(RateLimiter::direct);
    let progress = crate::ui::progress_bar(
        publications.len() as u64,
        "Fetching usage reports",
        options.show_progress,
    );

    let mut all_stats = Vec::with_capacity(publications.len());
    for publication in publications {
        if let Some(limiter) = &limiter {
            limiter.until_ready().await;
        }

        let title = &publication.record.name;
        let report = match source.usage_report(&publication.uuid).await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!(uuid = %publication.uuid, %title, "Failed to fetch usage report: {}", e);
                None
            }
        };

        all_stats.push(extract_statistics(&publication.uuid, title, report.as_ref()));
        progress.inc(1);
    }

    progress.finish_and_clear();
    all_stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NormalizedRecord;
    use crate::sources::MockSource;
    use serde_json::json;

    fn sample_report() -> Value {
        json!({
            "_embedded": {
                "usagereports": [
                    {
                        "report-type": "TotalDownloads",
                        "points": [
                            { "label": "file1.pdf", "values": { "views": 10 } },
                            { "label": "file2.pdf", "values": { "views": 5 } }
                        ]
                    },
                    {
                        "report-type": "TotalVisits",
                        "points": [ { "values": { "views": 42 } } ]
                    },
                    {
                        "report-type": "TotalVisitsPerMonth",
                        "points": [
                            { "label": "March 2025", "values": { "views": 3 } },
                            { "label": "April 2025", "values": { "views": 7 } }
                        ]
                    },
                    {
                        "report-type": "TopCountries",
                        "points": [
                            { "id": "CH", "label": "Switzerland", "values": { "views": 2 } },
                            { "id": "DE", "label": "Germany", "values": { "views": 1 } }
                        ]
                    },
                    { "report-type": "TopCities", "points": [] }
                ]
            }
        })
    }

    fn keyed(uuid: &str, name: &str) -> KeyedRecord {
        KeyedRecord {
            uuid: uuid.to_string(),
            record: NormalizedRecord {
                name: name.to_string(),
                doi: None,
                has_identifier: false,
                publication_type: None,
                publication_type_group: "Other publication".to_string(),
                date_issued: Some("2020".to_string()),
                year: Some(2020),
                license: "No license".to_string(),
                license_short: "No license".to_string(),
                license_short_group: "No license".to_string(),
            },
        }
    }

    #[test]
    fn test_extract_statistics() {
        let report = sample_report();
        let stats = extract_statistics("u1", "Paper A", Some(&report));

        assert_eq!(stats.total_downloads, 15);
        assert_eq!(stats.total_visits, 42);
        assert_eq!(
            stats.monthly_visits,
            vec![
                MonthlyVisits { month: "March 2025".to_string(), visits: 3 },
                MonthlyVisits { month: "April 2025".to_string(), visits: 7 },
            ]
        );
        assert_eq!(stats.top_countries.len(), 2);
        assert_eq!(stats.top_countries[0].country_code, "CH");
        assert_eq!(stats.top_countries[0].percentage, 66.67);
        assert_eq!(stats.top_countries[1].percentage, 33.33);
    }

    #[test]
    fn test_extract_statistics_missing_report() {
        assert_eq!(
            extract_statistics("u1", "Paper A", None),
            PublicationStats::empty("u1", "Paper A")
        );
        let stats = extract_statistics("u1", "Paper A", Some(&json!({ "page": {} })));
        assert_eq!(stats.total_visits, 0);
        assert!(stats.top_countries.is_empty());
    }

    #[test]
    fn test_extract_statistics_tolerates_sparse_points() {
        let report = json!({
            "_embedded": { "usagereports": [
                { "report-type": "TotalDownloads", "points": [ {}, { "values": { "views": 2.0 } } ] },
                { "report-type": "TopCountries", "points": [ { "values": { "views": 0 } } ] },
                { "points": [ { "values": { "views": 99 } } ] }
            ] }
        });
        let stats = extract_statistics("u1", "t", Some(&report));
        assert_eq!(stats.total_downloads, 2);
        assert_eq!(stats.top_countries[0].percentage, 0.0);
        assert_eq!(stats.top_countries[0].country, "");
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 5), 100.0);
    }

    #[tokio::test]
    async fn test_collect_statistics_keeps_failed_publications() {
        let source = MockSource::new();
        source.set_usage_report("u1", sample_report());

        let publications = vec![keyed("u1", "Reported"), keyed("u2", "Missing")];
        let options = CollectOptions {
            delay: Duration::ZERO,
            show_progress: false,
        };

        let stats = collect_statistics(&source, &publications, options).await;
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].title, "Reported");
        assert_eq!(stats[0].total_visits, 42);
        assert_eq!(stats[1], PublicationStats::empty("u2", "Missing"));
        assert_eq!(source.calls(), 2);
    }
}
