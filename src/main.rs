// Entry point and high-level CLI flow.
//
// - `report` loads the fuel plan once, writes fuel_today.csv, fuel_pending.csv
//   and a JSON stats summary, and prints previews of both reports.
// - `serve` loads the plan, writes the same reports, and serves the dashboard
//   API; `/api/fuel/refresh` reruns the whole load.
mod config;
mod error;
mod normalize;
mod output;
mod reports;
mod server;
mod source;
mod store;
mod types;
mod util;

use chrono::NaiveDate;
use clap::Parser;
use config::{Cli, Command, DataArgs};
use error::FuelError;
use std::sync::Arc;
use store::SiteStore;
use types::DataOrigin;

/// Handle `report`: one full load, both reports and the stats summary.
fn handle_report(data: &DataArgs, as_of: Option<NaiveDate>, preview: usize) -> Result<(), FuelError> {
    let config = data.store_config(as_of)?;
    let source = data.source();

    println!("\nLoading Central Fuel Plan database...");
    let (table, origin) = store::fetch_or_fallback(source.as_ref());
    if origin == DataOrigin::Fallback {
        println!("Warning: source unavailable, using built-in sample data.");
    }

    println!("Cleaning and extracting fuel plan data...");
    let (sites, load_report) = normalize::normalize(&table);
    println!(
        "Processing dataset... ({} rows loaded, {} with a fueling date)",
        util::format_int(load_report.total_rows),
        util::format_int(load_report.kept_rows)
    );
    if load_report.dropped_rows > 0 {
        println!(
            "Note: {} rows skipped due to a missing or unparseable date.",
            util::format_int(load_report.dropped_rows)
        );
    }
    if load_report.fallback_coords > 0 {
        println!(
            "Info: Default coordinates used for {} rows.",
            util::format_int(load_report.fallback_coords)
        );
    }
    for role in &load_report.unmatched_roles {
        println!("Info: no {} column found.", role);
    }
    println!();

    let as_of = as_of.unwrap_or_else(|| util::today_at(config.utc_offset));
    println!("Generating reports as of {}...\n", as_of);
    let agg = reports::aggregate(&sites, as_of);
    let paths = output::write_reports(&config.reports_dir, &agg)?;

    println!("Due today ({}):", paths.today.display());
    output::preview_table_rows(&agg.today, preview);
    println!("Pending overdue ({}):", paths.pending.display());
    output::preview_table_rows(&agg.overdue, preview);

    let summary_path = config.reports_dir.join(output::STATS_SUMMARY);
    output::write_json(&summary_path, &agg.stats)?;
    println!("Summary Stats ({}):", summary_path.display());
    println!("   -> Due today: {}", util::format_int(agg.stats.today_count));
    println!("   -> Tomorrow: {}", util::format_int(agg.stats.tomorrow_count));
    println!(
        "   -> Day after tomorrow: {}",
        util::format_int(agg.stats.day_after_tomorrow_count)
    );
    println!("   -> Pending overdue: {}", util::format_int(agg.stats.overdue_count));
    println!("\n[OK] Completed successfully.\n");
    Ok(())
}

/// Handle `serve`: initial load before the runtime starts, then the API.
fn handle_serve(data: &DataArgs, host: &str, port: u16) -> Result<(), FuelError> {
    let config = data.store_config(None)?;
    let source: Arc<dyn source::TableSource> = Arc::from(data.source());
    let store = Arc::new(SiteStore::load(config, source.as_ref()));
    let state = server::AppState { store, source };

    let bind_addr = format!("{}:{}", host, port);
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(server::run(&bind_addr, state))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match &cli.command {
        Command::Report { as_of, preview } => handle_report(&cli.data, *as_of, *preview),
        Command::Serve { host, port } => handle_serve(&cli.data, host, *port),
    };
    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
