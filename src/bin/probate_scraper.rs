use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Local, NaiveDate};
use clap::Parser;
use probate_scraper::config::DEFAULT_BASE_URL;
use probate_scraper::{ProbateService, ScrapeRequest};
use tower::Service;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "probate-scraper")]
#[command(about = "Export probate ESTATE cases filed on a date to CSV", long_about = None)]
#[command(version)]
struct Cli {
    /// Filing date (YYYY-MM-DD), defaults to today
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Directory for the CSV file
    #[arg(short, long, default_value = "./downloads")]
    out: PathBuf,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Portal base URL (up to /netdata)
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Drop the "Case Number / Suffix" column from the output
    #[arg(long)]
    no_case_number: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "info,probate_scraper=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let date = cli.date.unwrap_or_else(|| Local::now().date_naive());
    let request = ScrapeRequest::new(date)
        .with_base_url(cli.base_url)
        .with_output_dir(cli.out)
        .with_headless(!cli.headed)
        .with_keep_case_number(!cli.no_case_number);

    println!("Starting the scraping process for {}...", date.format("%Y-%m-%d"));

    let mut service = ProbateService::new();
    let result = match service.call(request).await {
        Ok(result) => result,
        Err(e) => {
            error!("スクレイピング失敗: {}", e);
            eprintln!("Scraping failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if !result.has_data() {
        println!("No data available for the selected date.");
        return ExitCode::SUCCESS;
    }

    let summary = &result.summary;
    println!("{}", summary.status_line());
    for (row, reason) in &summary.skipped {
        println!("  skipped row {}: {}", row, reason);
    }
    for warning in &summary.page_warnings {
        println!("  warning: {}", warning);
    }
    if !summary.missing_columns.is_empty() {
        println!("  missing columns: {}", summary.missing_columns.join(", "));
    }
    if let Some(path) = &result.csv_path {
        println!("CSV saved: {}", path.display());
    }

    ExitCode::SUCCESS
}
