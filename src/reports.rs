use crate::types::{Aggregation, FuelSite, FuelStats, StatusBucket};
use chrono::{NaiveDate, Utc};

/// Where a service date falls relative to `as_of`.
pub fn classify(service_date: NaiveDate, as_of: NaiveDate) -> StatusBucket {
    if service_date < as_of {
        return StatusBucket::Overdue;
    }
    match (service_date - as_of).num_days() {
        0 => StatusBucket::Today,
        1 => StatusBucket::Tomorrow,
        2 => StatusBucket::DayAfterTomorrow,
        _ => StatusBucket::Future,
    }
}

/// Split sites into the due-today and overdue reports and count every bucket.
///
/// Both reports keep the input order. Sites in the `Future` bucket only
/// contribute to `total_count`.
pub fn aggregate(sites: &[FuelSite], as_of: NaiveDate) -> Aggregation {
    let mut today = Vec::new();
    let mut overdue = Vec::new();
    let (mut tomorrow_count, mut day_after_tomorrow_count) = (0usize, 0usize);

    for site in sites {
        match classify(site.next_fueling_plan, as_of) {
            StatusBucket::Today => today.push(site.clone()),
            StatusBucket::Overdue => overdue.push(site.clone()),
            StatusBucket::Tomorrow => tomorrow_count += 1,
            StatusBucket::DayAfterTomorrow => day_after_tomorrow_count += 1,
            StatusBucket::Future => {}
        }
    }

    let stats = FuelStats {
        as_of_date: as_of,
        total_count: sites.len(),
        today_count: today.len(),
        tomorrow_count,
        day_after_tomorrow_count,
        overdue_count: overdue.len(),
        generated_at_timestamp: Utc::now(),
    };
    Aggregation { today, overdue, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn days_after(as_of: NaiveDate, n: u64) -> NaiveDate {
        as_of.checked_add_days(Days::new(n)).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn site(name: &str, date: NaiveDate) -> FuelSite {
        FuelSite {
            site_name: name.to_string(),
            city_name: "Riyadh".to_string(),
            next_fueling_plan: date,
            lat: 24.7136,
            lng: 46.6753,
        }
    }

    #[test]
    fn bucket_boundaries() {
        let as_of = ymd(2025, 1, 19);
        assert_eq!(classify(ymd(2025, 1, 18), as_of), StatusBucket::Overdue);
        assert_eq!(classify(ymd(2024, 12, 31), as_of), StatusBucket::Overdue);
        assert_eq!(classify(as_of, as_of), StatusBucket::Today);
        assert_eq!(classify(days_after(as_of, 1), as_of), StatusBucket::Tomorrow);
        assert_eq!(classify(days_after(as_of, 2), as_of), StatusBucket::DayAfterTomorrow);
        assert_eq!(classify(days_after(as_of, 3), as_of), StatusBucket::Future);
    }

    #[test]
    fn buckets_cross_month_and_year_ends() {
        let as_of = ymd(2024, 12, 31);
        assert_eq!(classify(ymd(2025, 1, 1), as_of), StatusBucket::Tomorrow);
        assert_eq!(classify(ymd(2025, 1, 2), as_of), StatusBucket::DayAfterTomorrow);
    }

    #[test]
    fn today_and_overdue_scenario() {
        let sites = vec![
            site("COW552", ymd(2025, 1, 19)),
            site("COW123", ymd(2025, 1, 18)),
        ];
        let agg = aggregate(&sites, ymd(2025, 1, 19));
        assert_eq!(agg.today, vec![sites[0].clone()]);
        assert_eq!(agg.overdue, vec![sites[1].clone()]);
        assert_eq!(agg.stats.today_count, 1);
        assert_eq!(agg.stats.overdue_count, 1);
        assert_eq!(agg.stats.total_count, 2);
    }

    #[test]
    fn future_sites_count_in_total_only() {
        let as_of = ymd(2025, 1, 19);
        let sites = vec![
            site("A", days_after(as_of, 1)),
            site("B", days_after(as_of, 2)),
            site("C", days_after(as_of, 3)),
            site("D", days_after(as_of, 30)),
        ];
        let agg = aggregate(&sites, as_of);
        assert!(agg.today.is_empty());
        assert!(agg.overdue.is_empty());
        assert_eq!(agg.stats.tomorrow_count, 1);
        assert_eq!(agg.stats.day_after_tomorrow_count, 1);
        assert_eq!(agg.stats.total_count, 4);
    }

    #[test]
    fn reports_keep_input_order() {
        let as_of = ymd(2025, 1, 19);
        let sites = vec![
            site("Z", ymd(2025, 1, 10)),
            site("A", as_of),
            site("M", ymd(2025, 1, 1)),
            site("B", as_of),
        ];
        let agg = aggregate(&sites, as_of);
        let names = |v: &[FuelSite]| v.iter().map(|s| s.site_name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&agg.today), vec!["A", "B"]);
        assert_eq!(names(&agg.overdue), vec!["Z", "M"]);
    }

    #[test]
    fn aggregate_is_idempotent_apart_from_timestamp() {
        let as_of = ymd(2025, 1, 19);
        let sites = vec![
            site("COW552", as_of),
            site("COW123", ymd(2025, 1, 18)),
            site("COW910", ymd(2025, 1, 20)),
        ];
        let first = aggregate(&sites, as_of);
        let second = aggregate(&sites, as_of);
        assert_eq!(first.today, second.today);
        assert_eq!(first.overdue, second.overdue);
        let mut s2 = second.stats.clone();
        s2.generated_at_timestamp = first.stats.generated_at_timestamp;
        assert_eq!(first.stats, s2);
    }
}
