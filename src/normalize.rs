// Schema normalization: find the site/city/date columns in whatever shape the
// upstream sheet has this week, and turn raw rows into `FuelSite`s.
use crate::types::{FuelSite, RawRow, RawTable};
use crate::util::{parse_date_safe, parse_f64_safe};
use log::{info, warn};
use std::fmt;

pub const UNKNOWN: &str = "Unknown";

/// Riyadh city centre, used for map display when a row carries no usable coordinates.
pub const FALLBACK_COORD: (f64, f64) = (24.7136, 46.6753);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Site,
    Location,
    Date,
    Latitude,
    Longitude,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Site => "site",
            Role::Location => "location",
            Role::Date => "date",
            Role::Latitude => "latitude",
            Role::Longitude => "longitude",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical column-name synonyms per role, highest priority first.
pub const ROLE_SYNONYMS: &[(Role, &[&str])] = &[
    (Role::Site, &["sitename", "site", "cowid", "siteno", "name"]),
    (Role::Location, &["cityname", "city", "location", "area", "region"]),
    (Role::Date, &["nextfuelingplan", "nextfueldate", "fueldate", "fuelplan"]),
    (Role::Latitude, &["lat", "latitude"]),
    (Role::Longitude, &["lng", "lon", "long", "longitude"]),
];

/// Matching key for a header: trimmed, separators removed, lower-cased.
pub fn canonical_key(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| !(c.is_whitespace() || *c == '_' || *c == '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Source header chosen for each role, `None` when nothing matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    pub site: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

impl ColumnMapping {
    pub fn get(&self, role: Role) -> Option<&str> {
        match role {
            Role::Site => self.site.as_deref(),
            Role::Location => self.location.as_deref(),
            Role::Date => self.date.as_deref(),
            Role::Latitude => self.latitude.as_deref(),
            Role::Longitude => self.longitude.as_deref(),
        }
    }

    fn slot(&mut self, role: Role) -> &mut Option<String> {
        match role {
            Role::Site => &mut self.site,
            Role::Location => &mut self.location,
            Role::Date => &mut self.date,
            Role::Latitude => &mut self.latitude,
            Role::Longitude => &mut self.longitude,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NormalizeReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub dropped_rows: usize,
    pub fallback_coords: usize,
    pub unmatched_roles: Vec<Role>,
    pub mapping: ColumnMapping,
}

/// Pick a header for every role. Synonym order decides between competing
/// columns; if two headers share a canonical key the leftmost one wins.
pub fn detect_columns(headers: &[String]) -> ColumnMapping {
    let keyed: Vec<(String, &String)> = headers.iter().map(|h| (canonical_key(h), h)).collect();
    let mut mapping = ColumnMapping::default();
    for (role, synonyms) in ROLE_SYNONYMS {
        *mapping.slot(*role) = synonyms.iter().find_map(|syn| {
            keyed
                .iter()
                .find(|(key, _)| key.as_str() == *syn)
                .map(|(_, original)| (*original).clone())
        });
    }
    mapping
}

fn cell<'a>(row: &'a RawRow, column: Option<&str>) -> Option<&'a str> {
    column.and_then(|c| row.get(c)).map(String::as_str)
}

pub fn normalize(table: &RawTable) -> (Vec<FuelSite>, NormalizeReport) {
    let mapping = detect_columns(&table.headers);
    let unmatched_roles: Vec<Role> = [Role::Site, Role::Location, Role::Date]
        .into_iter()
        .filter(|r| mapping.get(*r).is_none())
        .collect();

    info!(
        "Using columns: Site={} | City={} | Date={}",
        mapping.site.as_deref().unwrap_or("<none>"),
        mapping.location.as_deref().unwrap_or("<none>"),
        mapping.date.as_deref().unwrap_or("<none>"),
    );
    for role in &unmatched_roles {
        match role {
            Role::Date => warn!("No {} column found; every row will be dropped", role),
            _ => warn!("No {} column found; using \"{}\"", role, UNKNOWN),
        }
    }

    let mut dropped_rows = 0usize;
    let mut fallback_coords = 0usize;
    let mut sites = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let next_fueling_plan = match parse_date_safe(cell(row, mapping.date.as_deref())) {
            Some(d) => d,
            None => {
                dropped_rows += 1;
                continue;
            }
        };

        let site_name = cell(row, mapping.site.as_deref()).unwrap_or(UNKNOWN).to_string();
        let city_name = cell(row, mapping.location.as_deref()).unwrap_or(UNKNOWN).to_string();

        let lat = parse_f64_safe(cell(row, mapping.latitude.as_deref()));
        let lng = parse_f64_safe(cell(row, mapping.longitude.as_deref()));
        let (lat, lng) = match (lat, lng) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => {
                fallback_coords += 1;
                FALLBACK_COORD
            }
        };

        sites.push(FuelSite {
            site_name,
            city_name,
            next_fueling_plan,
            lat,
            lng,
        });
    }

    if dropped_rows > 0 {
        warn!("Dropped {} rows with a missing or unparseable date", dropped_rows);
    }

    let report = NormalizeReport {
        total_rows: table.rows.len(),
        kept_rows: sites.len(),
        dropped_rows,
        fallback_coords,
        unmatched_roles,
        mapping,
    };
    (sites, report)
}
