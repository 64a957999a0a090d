use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use collection_stats::config::{
    find_config_file, get_config, load_config, Config, API_KEY_ENV, GROUP_ID_ENV,
    LEGACY_ENV_VARS, MAX_ITEMS_ENV,
};
use collection_stats::models::{FieldSpec, NormalizedRecord, SearchRequest};
use collection_stats::normalize::{summarize, NormalizeReport, Normalizer, PublicationSummary};
use collection_stats::pipeline::fetch_publications;
use collection_stats::sources::ResearchCollectionSource;
use collection_stats::stats::{
    collect_statistics, monthly_downloads_estimate, monthly_pivot, CollectOptions,
    MonthlyDownloads, MonthlyPivot, StatsSummary, StatsTables,
};
use collection_stats::ui::{self, Status};
use collection_stats::utils::validate_group_id;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Collection Stats - Fetch and normalize research collection metadata and usage statistics
#[derive(Parser, Debug)]
#[command(name = "collection-stats")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fetch and normalize research collection metadata and usage statistics", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (overrides the config file)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if ui::is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch and normalize the publications of a group
    #[command(alias = "p")]
    Publications {
        /// Five-digit group identifier
        #[arg(long, short)]
        group_id: Option<String>,

        /// Maximum number of publications to request
        #[arg(long, short)]
        max_items: Option<usize>,

        /// Keep only publications issued after this year
        #[arg(long)]
        min_year: Option<i32>,

        /// Print publication counts per type and license group
        #[arg(long)]
        summary: bool,
    },

    /// Fetch usage statistics for the publications of a group
    #[command(alias = "s")]
    Stats {
        /// Five-digit group identifier
        #[arg(long, short)]
        group_id: Option<String>,

        /// Maximum number of publications to request
        #[arg(long, short)]
        max_items: Option<usize>,

        /// Only fetch statistics for the first N publications
        #[arg(long)]
        sample: Option<usize>,

        /// Delay between statistics requests in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Also print the titles x months visit and estimated download matrices
        #[arg(long)]
        pivot: bool,
    },

    /// Show recognized environment variables
    Env,
}

fn print_env_vars() {
    println!("Environment Variables:");
    println!();
    println!("API Access:");
    println!("  {:<36}API key for the research collection (required)", API_KEY_ENV);
    println!("  {:<36}Group identifier (default: 09746)", GROUP_ID_ENV);
    println!("  {:<36}Maximum publications per search (default: 150)", MAX_ITEMS_ENV);
    println!();
    println!("Deprecated Names (still read when the variable above is unset):");
    for (legacy, current) in LEGACY_ENV_VARS {
        println!("  {:<36}Use {}", legacy, current);
    }
    println!();
    println!("Layered Overrides (take precedence over the config file):");
    println!("  COLLECTION_STATS__API__SEARCH_URL           Discovery endpoint");
    println!("  COLLECTION_STATS__API__STATISTICS_URL       Usage report endpoint");
    println!("  COLLECTION_STATS__API__TIMEOUT_SECS         Request timeout (default: 30)");
    println!("  COLLECTION_STATS__FILTER__MIN_YEAR          Exclusive year cutoff (default: 2010)");
    println!("  COLLECTION_STATS__STATISTICS__REQUEST_DELAY_MS  Delay between statistics requests (default: 1000)");
    println!();
    println!("Other Settings:");
    println!("  RUST_LOG                            Rust logging level (e.g., debug, info, warn, error)");
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        load_config(config_path)
            .with_context(|| format!("Failed to load config file {}", config_path.display()))?
    } else if let Some(config_path) = find_config_file() {
        tracing::info!("Using config file: {}", config_path.display());
        load_config(&config_path)?
    } else {
        get_config()
    };

    if let Some(timeout) = cli.timeout {
        config.api.timeout_secs = timeout;
    }
    Ok(config)
}

fn build_source(config: &Config) -> Result<ResearchCollectionSource> {
    let api_key = config.api.api_key.clone().with_context(|| {
        format!(
            "API key not provided. Set the {} environment variable or api.api_key in the config file.",
            API_KEY_ENV
        )
    })?;

    Ok(ResearchCollectionSource::with_endpoints(
        api_key,
        config.api.endpoints(),
        config.api.timeout(),
    )?)
}

fn search_request(
    config: &Config,
    group_id: Option<&str>,
    max_items: Option<usize>,
) -> Result<SearchRequest> {
    let group_id = validate_group_id(group_id.unwrap_or(config.api.group_id.as_str()))?;
    Ok(SearchRequest::new(group_id).max_items(max_items.unwrap_or(config.api.max_items)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("collection_stats={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let format = cli.output.resolve();

    match &cli.command {
        Commands::Publications {
            group_id,
            max_items,
            min_year,
            summary,
        } => {
            let config = resolve_config(&cli)?;
            let source = build_source(&config)?;
            let request = search_request(&config, group_id.as_deref(), *max_items)?;
            let normalizer = Normalizer::new(FieldSpec::default())
                .min_year(min_year.unwrap_or(config.filter.min_year));

            let outcome = fetch_publications(&source, &request, &normalizer).await?;
            let report = outcome.report;
            let records = outcome.into_records();

            if !cli.quiet {
                print_report(&report);
            }

            let summary = summary.then(|| summarize(&records));
            output_publications(&records, summary.as_ref(), format)?;
        }

        Commands::Stats {
            group_id,
            max_items,
            sample,
            delay_ms,
            pivot,
        } => {
            let config = resolve_config(&cli)?;
            let source = build_source(&config)?;
            let request = search_request(&config, group_id.as_deref(), *max_items)?;
            let normalizer = Normalizer::default().min_year(config.filter.min_year);

            let outcome = fetch_publications(&source, &request, &normalizer).await?;
            let mut publications = outcome.records;
            if let Some(sample) = *sample {
                publications.truncate(sample);
            }

            let delay = delay_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.statistics.request_delay());
            if !cli.quiet {
                ui::print_status(
                    Status::Info,
                    &format!(
                        "Fetching statistics for {} publications ({}ms between requests)",
                        publications.len(),
                        delay.as_millis()
                    ),
                );
            }

            let options = CollectOptions {
                delay,
                show_progress: !cli.quiet && std::io::stderr().is_terminal(),
            };
            let stats = collect_statistics(&source, &publications, options).await;
            let tables = StatsTables::from_stats(&stats);
            let summary = StatsSummary::from_tables(&tables);
            let pivot = pivot.then(|| monthly_pivot(&tables.monthly_visits));
            let downloads = pivot
                .as_ref()
                .map(|pivot| monthly_downloads_estimate(pivot, &tables.publications));

            output_stats(&tables, &summary, pivot.as_ref(), downloads.as_ref(), format)?;
        }

        Commands::Env => print_env_vars(),
    }

    Ok(())
}

fn print_report(report: &NormalizeReport) {
    ui::print_status(
        Status::Success,
        &format!("Kept {} of {} publications", report.kept, report.entries),
    );
    if report.dropped_unparsable_year > 0 {
        ui::print_status(
            Status::Warning,
            &format!(
                "{} publications dropped without a parsable issue date",
                report.dropped_unparsable_year
            ),
        );
    }
}

fn output_publications(
    records: &[NormalizedRecord],
    summary: Option<&PublicationSummary>,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let body = match summary {
                Some(summary) => serde_json::json!({ "records": records, "summary": summary }),
                None => serde_json::to_value(records)?,
            };
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        _ => {
            use comfy_table::{Attribute, Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Name", "DOI", "Type group", "Year", "License"]);

            let title_width = (ui::terminal_width() / 3).max(30);
            for record in records {
                table.add_row(vec![
                    Cell::new(ui::truncate_with_ellipsis(&record.name, title_width))
                        .add_attribute(Attribute::Bold),
                    Cell::new(record.doi.as_deref().unwrap_or(record.identifier_label())),
                    Cell::new(&record.publication_type_group),
                    Cell::new(record.year.map(|y| y.to_string()).unwrap_or_default()),
                    Cell::new(&record.license_short),
                ]);
            }
            println!("{table}");

            if let Some(summary) = summary {
                ui::print_section("Publications by type");
                for (group, count) in &summary.by_type_group {
                    println!("  {:<24}{}", group, count);
                }
                ui::print_section("Publications by license");
                for (group, count) in &summary.by_license_group {
                    println!("  {:<24}{}", group, count);
                }
                ui::print_divider();
                println!(
                    "  {} publications, {} with DOI",
                    summary.total, summary.with_identifier
                );
            }
        }
    }
    Ok(())
}

fn month_matrix<'a>(
    months: &[String],
    rows: impl Iterator<Item = (&'a str, Vec<String>)>,
) -> comfy_table::Table {
    use comfy_table::{Cell, CellAlignment, Table};
    let mut matrix = Table::new();
    matrix.load_preset(comfy_table::presets::UTF8_FULL);
    let mut header = vec!["Title".to_string()];
    header.extend(months.iter().cloned());
    matrix.set_header(header);
    for (title, values) in rows {
        let mut cells = vec![Cell::new(ui::truncate_with_ellipsis(title, 40))];
        cells.extend(
            values
                .into_iter()
                .map(|v| Cell::new(v).set_alignment(CellAlignment::Right)),
        );
        matrix.add_row(cells);
    }
    matrix
}

fn output_stats(
    tables: &StatsTables,
    summary: &StatsSummary,
    pivot: Option<&MonthlyPivot>,
    downloads: Option<&MonthlyDownloads>,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "publication_statistics": tables.publications,
                "monthly_visits": tables.monthly_visits,
                "country_statistics": tables.countries,
                "summary": summary,
                "monthly_pivot": pivot,
                "monthly_downloads_estimate": downloads,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        _ => {
            use comfy_table::{Cell, CellAlignment, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Title", "Downloads", "Visits", "Months", "Countries"]);

            let title_width = (ui::terminal_width() / 2).max(30);
            for row in &tables.publications {
                table.add_row(vec![
                    Cell::new(ui::truncate_with_ellipsis(&row.title, title_width)),
                    Cell::new(ui::format_number(row.total_downloads))
                        .set_alignment(CellAlignment::Right),
                    Cell::new(ui::format_number(row.total_visits))
                        .set_alignment(CellAlignment::Right),
                    Cell::new(row.num_months_with_data),
                    Cell::new(row.num_countries),
                ]);
            }
            println!("{table}");

            if let Some(pivot) = pivot {
                let visits = pivot
                    .rows
                    .iter()
                    .map(|row| (row.title.as_str(), row.visits.iter().map(|v| v.to_string()).collect::<Vec<_>>()));
                ui::print_section("Monthly visits");
                println!("{}", month_matrix(&pivot.months, visits));
            }
            if let Some(downloads) = downloads {
                let estimates = downloads.rows.iter().map(|row| {
                    let cells: Vec<String> = row.downloads.iter().map(|d| format!("{:.1}", d)).collect();
                    (row.title.as_str(), cells)
                });
                ui::print_section("Estimated monthly downloads");
                println!("{}", month_matrix(&downloads.months, estimates));
            }

            ui::print_section("Summary");
            println!("  Publications processed: {}", summary.publications);
            println!(
                "  Total downloads:        {}",
                ui::format_number(summary.total_downloads)
            );
            println!(
                "  Total visits:           {}",
                ui::format_number(summary.total_visits)
            );
            println!("  Unique countries:       {}", summary.unique_countries);

            ui::print_section("Top publications by downloads");
            for row in &summary.top_by_downloads {
                println!(
                    "  • {} ({} downloads, {} visits)",
                    ui::truncate_with_ellipsis(&row.title, 50),
                    row.total_downloads,
                    row.total_visits
                );
            }
            ui::print_section("Top publications by visits");
            for row in &summary.top_by_visits {
                println!(
                    "  • {} ({} visits, {} downloads)",
                    ui::truncate_with_ellipsis(&row.title, 50),
                    row.total_visits,
                    row.total_downloads
                );
            }
            if !summary.top_countries.is_empty() {
                ui::print_section("Top countries by visits");
                for (country, visits) in &summary.top_countries {
                    println!("  • {}: {} visits", country, ui::format_number(*visits));
                }
            }
        }
    }
    Ok(())
}
