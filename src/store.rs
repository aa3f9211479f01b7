// The current dataset, owned explicitly and handed to whoever needs it.
//
// Readers take a cheap `Arc` clone of the published snapshot. A refresh
// builds its snapshot completely off to the side and then swaps the `Arc`,
// so nobody ever observes a half-replaced dataset. Refreshes are serialized.
use crate::error::FuelError;
use crate::normalize::{normalize, NormalizeReport};
use crate::output::{self, ReportPaths};
use crate::reports::aggregate;
use crate::source::{fallback_table, TableSource};
use crate::types::{Aggregation, DataOrigin, FuelSite, FuelStats, RawTable};
use crate::util::today_at;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub reports_dir: PathBuf,
    pub utc_offset: FixedOffset,
    /// Pin "today" instead of reading the clock.
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub sites: Vec<FuelSite>,
    pub origin: DataOrigin,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub count: usize,
    pub origin: DataOrigin,
    pub normalize: NormalizeReport,
    pub stats: FuelStats,
    pub reports: ReportPaths,
}

pub struct SiteStore {
    config: StoreConfig,
    current: RwLock<Arc<Snapshot>>,
    refresh_lock: Mutex<()>,
}

struct Built {
    snapshot: Snapshot,
    normalize: NormalizeReport,
    aggregation: Aggregation,
}

/// One fetch attempt; on failure the built-in dataset stands in, loudly.
pub fn fetch_or_fallback(source: &dyn TableSource) -> (RawTable, DataOrigin) {
    match source.fetch() {
        Ok(table) => {
            info!("Fetched {} rows from {}", table.rows.len(), source.name());
            (table, DataOrigin::Live)
        }
        Err(e) => {
            warn!("{}; serving built-in fallback dataset", e);
            (fallback_table(), DataOrigin::Fallback)
        }
    }
}

fn as_of_date(config: &StoreConfig) -> NaiveDate {
    config.as_of.unwrap_or_else(|| today_at(config.utc_offset))
}

fn build(table: &RawTable, origin: DataOrigin, as_of: NaiveDate) -> Built {
    let (sites, normalize) = normalize(table);
    let aggregation = aggregate(&sites, as_of);
    Built {
        snapshot: Snapshot {
            sites,
            origin,
            loaded_at: Utc::now(),
        },
        normalize,
        aggregation,
    }
}

impl SiteStore {
    /// Initial load. An unavailable source degrades to the built-in dataset
    /// and report-writing problems are only logged, so reads always have data.
    pub fn load(config: StoreConfig, source: &dyn TableSource) -> Self {
        let (table, origin) = fetch_or_fallback(source);
        let built = build(&table, origin, as_of_date(&config));
        if let Err(e) = output::write_reports(&config.reports_dir, &built.aggregation) {
            error!("Could not generate reports: {}", e);
        }
        info!("Loaded {} fuel sites ({:?})", built.snapshot.sites.len(), origin);
        SiteStore {
            current: RwLock::new(Arc::new(built.snapshot)),
            refresh_lock: Mutex::new(()),
            config,
        }
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn today(&self) -> NaiveDate {
        as_of_date(&self.config)
    }

    /// Bucket the published dataset against today. No files are touched.
    pub fn stats(&self) -> FuelStats {
        aggregate(&self.snapshot().sites, self.today()).stats
    }

    /// Full reload: fetch, normalize, aggregate, write both reports, publish.
    ///
    /// Any failure leaves the previously published snapshot in place.
    pub fn refresh(&self, source: &dyn TableSource) -> Result<RefreshOutcome, FuelError> {
        let _serialized = self.refresh_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let table = source.fetch()?;
        let built = build(&table, DataOrigin::Live, self.today());
        let reports = output::write_reports(&self.config.reports_dir, &built.aggregation)?;

        let outcome = RefreshOutcome {
            count: built.snapshot.sites.len(),
            origin: built.snapshot.origin,
            normalize: built.normalize,
            stats: built.aggregation.stats,
            reports,
        };
        self.publish(built.snapshot);
        info!("Refreshed dataset: {} sites", outcome.count);
        Ok(outcome)
    }

    fn publish(&self, snapshot: Snapshot) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(snapshot);
    }
}
