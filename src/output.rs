use crate::error::FuelError;
use crate::types::{Aggregation, FuelSite};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

pub const TODAY_REPORT: &str = "fuel_today.csv";
pub const PENDING_REPORT: &str = "fuel_pending.csv";
pub const STATS_SUMMARY: &str = "fuel_stats.json";

const REPORT_HEADER: [&str; 5] = ["SiteName", "CityName", "NextFuelingPlan", "lat", "lng"];

#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub today: PathBuf,
    pub pending: PathBuf,
}

/// Overwrite a site report. The header row is always written, even when
/// there are no rows to follow it.
pub fn write_site_csv(path: &Path, rows: &[FuelSite]) -> Result<(), FuelError> {
    let write = || -> Result<(), csv::Error> {
        let mut wtr = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
        wtr.write_record(REPORT_HEADER)?;
        for r in rows {
            wtr.serialize(r)?;
        }
        wtr.flush()?;
        Ok(())
    };
    write().map_err(|e| FuelError::artifact_write(path, e))?;
    info!("{} generated ({} rows)", path.display(), rows.len());
    Ok(())
}

/// Write both report files for one aggregation pass into `dir`.
pub fn write_reports(dir: &Path, agg: &Aggregation) -> Result<ReportPaths, FuelError> {
    let paths = ReportPaths {
        today: dir.join(TODAY_REPORT),
        pending: dir.join(PENDING_REPORT),
    };
    write_site_csv(&paths.today, &agg.today)?;
    write_site_csv(&paths.pending, &agg.overdue)?;
    Ok(paths)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), FuelError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s).map_err(|e| FuelError::artifact_write(path, e))?;
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::aggregate;
    use chrono::NaiveDate;

    fn site(name: &str, date: &str) -> FuelSite {
        FuelSite {
            site_name: name.to_string(),
            city_name: "Riyadh".to_string(),
            next_fueling_plan: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            lat: 24.7136,
            lng: 46.6753,
        }
    }

    #[test]
    fn reports_have_header_and_iso_dates() {
        let dir = tempfile::tempdir().unwrap();
        let sites = vec![site("COW552", "2025-01-19"), site("COW123", "2025-01-18")];
        let agg = aggregate(&sites, NaiveDate::from_ymd_opt(2025, 1, 19).unwrap());
        let paths = write_reports(dir.path(), &agg).unwrap();

        let today = std::fs::read_to_string(&paths.today).unwrap();
        assert_eq!(
            today.lines().collect::<Vec<_>>(),
            vec!["SiteName,CityName,NextFuelingPlan,lat,lng", "COW552,Riyadh,2025-01-19,24.7136,46.6753"]
        );
        let pending = std::fs::read_to_string(&paths.pending).unwrap();
        assert_eq!(pending.lines().nth(1), Some("COW123,Riyadh,2025-01-18,24.7136,46.6753"));
    }

    #[test]
    fn empty_report_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TODAY_REPORT);
        write_site_csv(&path, &[]).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim_end(), "SiteName,CityName,NextFuelingPlan,lat,lng");
    }

    #[test]
    fn reports_are_overwritten_not_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PENDING_REPORT);
        write_site_csv(&path, &[site("A", "2025-01-01"), site("B", "2025-01-02")]).unwrap();
        write_site_csv(&path, &[site("C", "2025-01-03")]).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("C,Riyadh"));
    }

    #[test]
    fn unwritable_dir_is_artifact_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-dir");
        let agg = aggregate(&[], NaiveDate::from_ymd_opt(2025, 1, 19).unwrap());
        let err = write_reports(&missing, &agg).unwrap_err();
        assert!(matches!(err, FuelError::ArtifactWrite { .. }));
    }
}
