//! Candidate filter over the merged dataset.
//!
//! Pure and network-free; predicate and sort order are a compatibility
//! contract with the operator screen.

use crate::model::{FilterCriteria, MergedRecord};
use std::cmp::Ordering;

/// Keeps records inside the price band, above the volume floor (the
/// threshold is entered in lots of 1000 shares) and with a strictly
/// positive trend oscillator. Sorted by ex-dividend date ascending, then
/// 5-day average volume descending.
pub fn find_candidates(records: &[MergedRecord], criteria: &FilterCriteria) -> Vec<MergedRecord> {
    let volume_floor = criteria.min_avg_volume_lots * 1000.0;

    let mut result: Vec<MergedRecord> = records
        .iter()
        .filter(|r| {
            r.last_close >= criteria.price_min
                && r.last_close <= criteria.price_max
                && r.avg_volume_5d > volume_floor
                && r.macd.is_some_and(|m| m > 0.0)
        })
        .cloned()
        .collect();

    result.sort_by(|a, b| {
        a.announcement_date.cmp(&b.announcement_date).then_with(|| {
            b.avg_volume_5d
                .partial_cmp(&a.avg_volume_5d)
                .unwrap_or(Ordering::Equal)
        })
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn record(id: &str, day: u32, close: f64, avg_vol: f64, macd: Option<f64>) -> MergedRecord {
        MergedRecord {
            security_id: id.to_string(),
            announcement_date: NaiveDate::from_ymd_opt(2026, 9, day).expect("valid date"),
            last_close: close,
            avg_volume_5d: avg_vol,
            macd,
            stoch_k: Some(60.0),
            stoch_d: Some(55.0),
            fields: BTreeMap::new(),
        }
    }

    fn criteria() -> FilterCriteria {
        FilterCriteria {
            price_min: 10.0,
            price_max: 200.0,
            min_avg_volume_lots: 100.0,
        }
    }

    #[test]
    fn test_price_band_and_volume_floor() {
        let rows = vec![
            record("1101", 1, 55.0, 150_000.0, Some(0.3)),
            record("2330", 1, 250.0, 200_000.0, Some(0.1)),
        ];
        let out = find_candidates(&rows, &criteria());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].security_id, "1101");
    }

    #[test]
    fn test_volume_threshold_is_strict_and_in_lots() {
        // Threshold 100 lots => floor of 100_000 shares, exclusive.
        let rows = vec![
            record("1101", 1, 55.0, 100_000.0, Some(0.3)),
            record("1102", 1, 55.0, 100_001.0, Some(0.3)),
        ];
        let out = find_candidates(&rows, &criteria());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].security_id, "1102");
    }

    #[test]
    fn test_zero_macd_excluded() {
        let rows = vec![
            record("1101", 1, 55.0, 150_000.0, Some(0.0)),
            record("1102", 1, 55.0, 150_000.0, None),
        ];
        assert!(find_candidates(&rows, &criteria()).is_empty());
    }

    #[test]
    fn test_price_band_is_inclusive() {
        let rows = vec![
            record("1101", 1, 10.0, 150_000.0, Some(0.3)),
            record("1102", 1, 200.0, 150_000.0, Some(0.3)),
        ];
        assert_eq!(find_candidates(&rows, &criteria()).len(), 2);
    }

    #[test]
    fn test_sort_date_asc_then_volume_desc() {
        let rows = vec![
            record("3333", 2, 55.0, 300_000.0, Some(0.3)),
            record("1111", 1, 55.0, 150_000.0, Some(0.3)),
            record("2222", 1, 55.0, 250_000.0, Some(0.3)),
        ];
        let out = find_candidates(&rows, &criteria());
        let ids: Vec<&str> = out.iter().map(|r| r.security_id.as_str()).collect();
        assert_eq!(ids, vec!["2222", "1111", "3333"]);
    }
}
