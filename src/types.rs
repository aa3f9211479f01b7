use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tabled::Tabled;

/// One untyped input row, keyed by the header exactly as the source spelled it.
/// Blank cells are left out, so a missing key and an empty value mean the same thing.
pub type RawRow = HashMap<String, String>;

#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    /// Repeated header text is renamed `Name.1`, `Name.2`, ... left to right,
    /// so every column keeps its own cell and the leftmost keeps the plain name.
    pub fn new(headers: Vec<String>) -> Self {
        let mut seen: HashSet<String> = HashSet::with_capacity(headers.len());
        let headers = headers
            .into_iter()
            .map(|h| {
                let mut name = h.clone();
                let mut n = 0usize;
                while seen.contains(&name) {
                    n += 1;
                    name = format!("{}.{}", h, n);
                }
                seen.insert(name.clone());
                name
            })
            .collect();
        RawTable { headers, rows: Vec::new() }
    }

    /// Append a row given positionally; cells beyond the header count are ignored.
    pub fn push_cells<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let row: RawRow = self
            .headers
            .iter()
            .zip(cells)
            .filter_map(|(h, v)| {
                let v = v.as_ref().trim();
                (!v.is_empty()).then(|| (h.clone(), v.to_string()))
            })
            .collect();
        self.rows.push(row);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct FuelSite {
    #[serde(rename = "SiteName")]
    #[tabled(rename = "SiteName")]
    pub site_name: String,
    #[serde(rename = "CityName")]
    #[tabled(rename = "CityName")]
    pub city_name: String,
    #[serde(rename = "NextFuelingPlan")]
    #[tabled(rename = "NextFuelingPlan")]
    pub next_fueling_plan: NaiveDate,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBucket {
    Today,
    Tomorrow,
    DayAfterTomorrow,
    Overdue,
    Future,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelStats {
    pub as_of_date: NaiveDate,
    pub total_count: usize,
    pub today_count: usize,
    pub tomorrow_count: usize,
    pub day_after_tomorrow_count: usize,
    pub overdue_count: usize,
    pub generated_at_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Aggregation {
    pub today: Vec<FuelSite>,
    pub overdue: Vec<FuelSite>,
    pub stats: FuelStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataOrigin {
    Live,
    Fallback,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn repeated_headers_get_numbered_suffixes() {
        let t = RawTable::new(headers(&["Site", "City", "Site", "Site"]));
        assert_eq!(t.headers, vec!["Site", "City", "Site.1", "Site.2"]);
    }

    #[test]
    fn suffix_skips_names_already_taken() {
        let t = RawTable::new(headers(&["Site", "Site.1", "Site"]));
        assert_eq!(t.headers, vec!["Site", "Site.1", "Site.2"]);
    }

    #[test]
    fn repeated_headers_keep_separate_cells() {
        let mut t = RawTable::new(headers(&["Site", "Site"]));
        t.push_cells(["A", "B"]);
        assert_eq!(t.rows[0].get("Site").map(String::as_str), Some("A"));
        assert_eq!(t.rows[0].get("Site.1").map(String::as_str), Some("B"));
    }
}
