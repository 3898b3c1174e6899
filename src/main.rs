use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

mod config;
mod db;
mod layout;
mod metrics;
mod models;
mod pdf;
mod report;
mod style;
mod telemetry;
mod turnover;

use config::{AppConfig, DatabaseConfig};
use style::ReportStyle;

#[derive(Parser)]
#[command(name = "turnover-report")]
#[command(about = "HR admissions and terminations turnover report", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import admissions and/or terminations from CSV files
    #[command(group(
        ArgGroup::new("sources")
            .args(["admissions", "terminations"])
            .required(true)
            .multiple(true)
    ))]
    Import {
        #[arg(long)]
        admissions: Option<PathBuf>,
        #[arg(long)]
        terminations: Option<PathBuf>,
    },
    /// Render the turnover PDF
    Report {
        #[arg(long, default_value = "turnover.pdf")]
        out: PathBuf,
        /// Reference date for the week/month/year windows (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Print the aggregate figures as JSON
    Summary {
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

async fn connect(database: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let url = database.url()?;
    let pool = PgPoolOptions::new()
        .max_connections(database.max_connections)
        .connect(url)
        .await
        .context("failed to connect to Postgres")?;
    info!(max_connections = database.max_connections, "connected to Postgres");
    Ok(pool)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let pool = connect(&config.database).await?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import {
            admissions,
            terminations,
        } => {
            if let Some(path) = admissions {
                let inserted = db::import_admissions(&pool, &path).await?;
                println!("Inserted {inserted} admissions from {}.", path.display());
            }
            if let Some(path) = terminations {
                let inserted = db::import_terminations(&pool, &path).await?;
                println!("Inserted {inserted} terminations from {}.", path.display());
            }
        }
        Commands::Report { out, today } => {
            let generated_at = Local::now().naive_local();
            let today = today.unwrap_or_else(|| generated_at.date());
            let admissions = db::fetch_admissions(&pool).await?;
            let terminations = db::fetch_terminations(&pool).await?;

            let style = ReportStyle::new(&config.company);
            let rendered =
                report::build_report(&admissions, &terminations, today, generated_at, &style)?;
            std::fs::write(&out, &rendered.bytes)
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(path = %out.display(), media_type = rendered.media_type, "report written");
            println!(
                "Report written to {} ({} pages).",
                out.display(),
                rendered.pages
            );
        }
        Commands::Summary { today } => {
            let today = today.unwrap_or_else(|| Local::now().date_naive());
            let admissions = db::fetch_admissions(&pool).await?;
            let terminations = db::fetch_terminations(&pool).await?;

            let breakdown = turnover::analyze(&admissions, &terminations, today);
            println!("{}", serde_json::to_string_pretty(&breakdown.summary)?);
        }
    }

    Ok(())
}
