//! # Aid and Conflict Dashboard
//!
//! Binary entry point: loads the record sets once, applies the selections
//! given on the command line and prints the dashboard report.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use aid_dashboard::{Config, LogFormat, build_warehouse, load_record_sets, session_with, write_output};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Markdown,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "aid-dashboard")]
#[command(version, about = "US foreign aid and conflict dashboard")]
struct Args {
    /// Country for the aid sections ("All" for every country)
    #[arg(short, long)]
    country: Option<String>,

    /// Fiscal year for the aid sections
    #[arg(short, long)]
    year: Option<String>,

    /// Funding agency for the aid overview
    #[arg(short, long)]
    agency: Option<String>,

    /// Breakdown dimension: objective or purpose
    #[arg(long)]
    sort_by: Option<String>,

    /// Healthcare metric, e.g. workers_killed or supplies_looted
    #[arg(long)]
    health_metric: Option<String>,

    /// Weapon comparison category: weapon or location
    #[arg(long)]
    weapon_category: Option<String>,

    /// Extra selector changes, e.g. `political.year=2023`
    #[arg(short, long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "markdown")]
    format: OutputFormat,

    /// Print the selector options instead of the report
    #[arg(long)]
    options: bool,

    /// DuckDB database file (overrides DUCKDB_PATH)
    #[arg(long)]
    duckdb_path: Option<PathBuf>,

    /// Directory of extracts to import (overrides IMPORT_DIR)
    #[arg(long)]
    import_dir: Option<PathBuf>,
}

impl Args {
    /// Selector changes in application order; `--set` wins over shorthands.
    fn assignments(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(country) = &self.country {
            out.push(format!("aid.country={country}"));
            out.push(format!("breakdown.country={country}"));
        }
        if let Some(year) = &self.year {
            out.push(format!("aid.year={year}"));
            out.push(format!("breakdown.year={year}"));
        }
        if let Some(agency) = &self.agency {
            out.push(format!("aid.agency={agency}"));
        }
        if let Some(sort_by) = &self.sort_by {
            out.push(format!("breakdown.sort_by={sort_by}"));
        }
        if let Some(metric) = &self.health_metric {
            out.push(format!("health.metric={metric}"));
        }
        if let Some(category) = &self.weapon_category {
            out.push(format!("weapons.category={category}"));
        }
        out.extend(self.set.iter().cloned());
        out
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = Config::from_env()?;
    if args.duckdb_path.is_some() {
        config.duckdb_path.clone_from(&args.duckdb_path);
    }
    if args.import_dir.is_some() {
        config.import_dir.clone_from(&args.import_dir);
    }

    // Initialize tracing on stderr so reports stay pipeable
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Plain => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }

    tracing::info!(version = aid_dashboard::VERSION, "Starting aid dashboard");

    let warehouse = build_warehouse(&config).await?;
    let records = load_record_sets(warehouse.as_ref()).await?;

    let assignments = args.assignments();
    let mut session = session_with(records, &assignments)?;
    tracing::debug!(changes = assignments.len(), "Selections applied");

    let rendered = if args.options {
        format!("{}\n", serde_json::to_string_pretty(session.selector_options())?)
    } else {
        let report = session.report();
        match args.format {
            OutputFormat::Markdown => report.to_markdown(),
            OutputFormat::Json => format!("{}\n", report.to_json()?),
        }
    };

    write_output(&mut std::io::stdout().lock(), &rendered)?;
    Ok(())
}
