// Upstream collaborators: where the raw fueling table comes from.
use crate::error::FuelError;
use crate::types::RawTable;
use csv::ReaderBuilder;
use log::{debug, info};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

/// Published Central Fuel Plan sheet, CSV export.
pub const DEFAULT_SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/e/\
2PACX-1vS0GkXnQMdKYZITuuMsAzeWDtGUqEJ3lWwqNdA67NewOsDOgqsZHKHECEEkea4nrukx4-DqxKmf62nC\
/pub?gid=1149576218&single=true&output=csv";

/// Anything that can hand back a whole raw table in one attempt.
///
/// Implementations either return the complete table or a
/// `FuelError::SourceUnavailable`; partial data is never returned.
pub trait TableSource: Send + Sync {
    fn name(&self) -> &str;
    fn fetch(&self) -> Result<RawTable, FuelError>;
}

pub struct HttpSheetSource {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpSheetSource {
    pub fn new(url: impl Into<String>) -> Self {
        HttpSheetSource {
            url: url.into(),
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl TableSource for HttpSheetSource {
    fn name(&self) -> &str {
        &self.url
    }

    fn fetch(&self) -> Result<RawTable, FuelError> {
        info!("Loading sheet: {}", self.url);
        let body = self
            .client
            .get(&self.url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())
            .map_err(|e| FuelError::source_unavailable(&self.url, e))?;
        debug!("fetched {} bytes from sheet", body.len());
        parse_source(&self.url, body.as_bytes())
    }
}

pub struct CsvFileSource {
    path: PathBuf,
    label: String,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = path.display().to_string();
        CsvFileSource { path, label }
    }
}

impl TableSource for CsvFileSource {
    fn name(&self) -> &str {
        &self.label
    }

    fn fetch(&self) -> Result<RawTable, FuelError> {
        info!("Loading file: {}", self.label);
        let file = File::open(&self.path).map_err(|e| FuelError::source_unavailable(&self.label, e))?;
        parse_source(&self.label, file)
    }
}

fn parse_source<R: Read>(name: &str, reader: R) -> Result<RawTable, FuelError> {
    let table = read_table(reader).map_err(|e| FuelError::source_unavailable(name, e))?;
    if table.headers.iter().all(|h| h.trim().is_empty()) {
        return Err(FuelError::source_unavailable(name, "response has no header row"));
    }
    Ok(table)
}

/// Read delimited text with a header row into a `RawTable`.
///
/// Ragged rows are tolerated; rows where every cell is blank are skipped.
pub fn read_table<R: Read>(reader: R) -> Result<RawTable, FuelError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut table = RawTable::new(headers);
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        table.push_cells(record.iter());
    }
    Ok(table)
}

/// Built-in sample dataset served when the upstream sheet cannot be loaded.
pub fn fallback_table() -> RawTable {
    const SITES: &[(&str, &str, &str, &str, &str)] = &[
        ("COW552", "Riyadh", "2025-01-19", "24.7136", "46.6753"),
        ("COW910", "Jeddah", "2025-01-20", "21.4858", "39.1925"),
        ("COW777", "Buraydah", "2025-01-21", "26.332", "43.9736"),
        ("COW123", "Riyadh", "2025-01-18", "24.7136", "46.6753"),
        ("COW445", "Dammam", "2025-01-22", "26.4207", "50.0888"),
        ("COW678", "Medina", "2025-01-17", "24.5247", "39.5692"),
    ];
    let mut table = RawTable::new(
        ["SiteName", "CityName", "NextFuelingPlan", "lat", "lng"]
            .iter()
            .map(|h| h.to_string())
            .collect(),
    );
    for (site, city, date, lat, lng) in SITES {
        table.push_cells([site, city, date, lat, lng]);
    }
    table
}
