use crate::error::FuelError;
use crate::source::{CsvFileSource, HttpSheetSource, TableSource, DEFAULT_SHEET_URL};
use crate::store::StoreConfig;
use chrono::{FixedOffset, NaiveDate};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "fuel_plan", version, about = "COW fuel plan reports and dashboard API")]
pub struct Cli {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct DataArgs {
    /// Published sheet CSV export to load.
    #[arg(long, env = "FUEL_SHEET_URL", default_value = DEFAULT_SHEET_URL, global = true)]
    pub sheet_url: String,

    /// Read a local CSV file instead of the sheet URL.
    #[arg(long, env = "FUEL_INPUT", global = true)]
    pub input: Option<PathBuf>,

    /// Directory that receives fuel_today.csv and fuel_pending.csv.
    #[arg(long, env = "FUEL_REPORTS_DIR", default_value = ".", global = true)]
    pub reports_dir: PathBuf,

    /// Reference timezone for "today", as hours east of UTC.
    #[arg(
        long,
        env = "FUEL_UTC_OFFSET_HOURS",
        default_value_t = 3,
        allow_negative_numbers = true,
        global = true
    )]
    pub utc_offset_hours: i32,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load once, write the reports and a stats summary, print previews.
    Report {
        /// Reference date (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Rows shown per preview table.
        #[arg(long, default_value_t = 5)]
        preview: usize,
    },
    /// Serve the dashboard API.
    Serve {
        #[arg(long, env = "FUEL_HOST", default_value = "0.0.0.0")]
        host: String,

        #[arg(long, env = "PORT", default_value_t = 8080)]
        port: u16,
    },
}

impl DataArgs {
    pub fn utc_offset(&self) -> Result<FixedOffset, FuelError> {
        if !(-12..=14).contains(&self.utc_offset_hours) {
            return Err(FuelError::InvalidConfig(format!(
                "utc offset {}h is outside -12..=14",
                self.utc_offset_hours
            )));
        }
        FixedOffset::east_opt(self.utc_offset_hours * 3600)
            .ok_or_else(|| FuelError::InvalidConfig(format!("bad utc offset {}", self.utc_offset_hours)))
    }

    pub fn source(&self) -> Box<dyn TableSource> {
        match &self.input {
            Some(path) => Box::new(CsvFileSource::new(path)),
            None => Box::new(HttpSheetSource::new(&self.sheet_url)),
        }
    }

    pub fn store_config(&self, as_of: Option<NaiveDate>) -> Result<StoreConfig, FuelError> {
        Ok(StoreConfig {
            reports_dir: self.reports_dir.clone(),
            utc_offset: self.utc_offset()?,
            as_of,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse() {
        let cli = Cli::try_parse_from(["fuel_plan", "report"]).unwrap();
        assert_eq!(cli.data.utc_offset_hours, 3);
        assert_eq!(cli.data.utc_offset().unwrap().local_minus_utc(), 3 * 3600);
        assert!(matches!(cli.command, Command::Report { as_of: None, preview: 5 }));
    }

    #[test]
    fn report_accepts_as_of_date() {
        let cli = Cli::try_parse_from(["fuel_plan", "report", "--as-of", "2025-01-19"]).unwrap();
        match cli.command {
            Command::Report { as_of, .. } => assert_eq!(as_of, NaiveDate::from_ymd_opt(2025, 1, 19)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        let cli =
            Cli::try_parse_from(["fuel_plan", "--utc-offset-hours", "20", "report"]).unwrap();
        assert!(matches!(cli.data.utc_offset(), Err(FuelError::InvalidConfig(_))));
    }

    #[test]
    fn serve_takes_port() {
        let cli = Cli::try_parse_from(["fuel_plan", "serve", "--port", "9090"]).unwrap();
        assert!(matches!(cli.command, Command::Serve { port: 9090, .. }));
    }
}
