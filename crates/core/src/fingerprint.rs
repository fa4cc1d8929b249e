//! Deterministic fingerprint of one recommendation request, used as the
//! cache key.

use serde_json::json;
use sha2::{Digest, Sha256};

use crate::domain::preferences::UserPreferences;
use crate::domain::recommendation::CurrentPlan;
use crate::domain::usage::MonthlyUsageRecord;

/// SHA-256 hex over a canonical JSON encoding of every input that can
/// change the ranking. Records are sorted by month so caller ordering does
/// not fragment the cache; `serde_json` objects serialize with sorted keys.
pub fn fingerprint_request(
    records: &[MonthlyUsageRecord],
    preferences: &UserPreferences,
    current_plan: Option<&CurrentPlan>,
    catalog_version: &str,
    region: &str,
    top_n: usize,
) -> String {
    let mut sorted: Vec<&MonthlyUsageRecord> = records.iter().collect();
    sorted.sort_by_key(|record| record.month);

    let payload = json!({
        "catalog_version": catalog_version,
        "current_plan": current_plan,
        "preferences": preferences,
        "records": sorted,
        "region": region.to_ascii_uppercase(),
        "top_n": top_n,
    });

    sha256_hex(payload.to_string().as_bytes())
}

fn sha256_hex(payload: &[u8]) -> String {
    let digest = Sha256::digest(payload);
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use crate::domain::preferences::UserPreferences;
    use crate::domain::usage::{BillingMonth, MonthlyUsageRecord, UsageSource};

    use super::fingerprint_request;

    fn record(month: u32, kwh: f64) -> MonthlyUsageRecord {
        MonthlyUsageRecord::new(BillingMonth { year: 2025, month }, kwh, UsageSource::MeterRead)
    }

    #[test]
    fn identical_inputs_share_a_fingerprint() {
        let records = vec![record(1, 800.0), record(2, 750.0)];
        let prefs = UserPreferences::default();

        let a = fingerprint_request(&records, &prefs, None, "v7", "TX", 3);
        let b = fingerprint_request(&records, &prefs, None, "v7", "TX", 3);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn record_order_does_not_matter() {
        let prefs = UserPreferences::default();
        let forward = vec![record(1, 800.0), record(2, 750.0)];
        let reversed = vec![record(2, 750.0), record(1, 800.0)];

        assert_eq!(
            fingerprint_request(&forward, &prefs, None, "v7", "TX", 3),
            fingerprint_request(&reversed, &prefs, None, "v7", "TX", 3),
        );
    }

    #[test]
    fn catalog_version_advance_changes_the_fingerprint() {
        let records = vec![record(1, 800.0)];
        let prefs = UserPreferences::default();

        assert_ne!(
            fingerprint_request(&records, &prefs, None, "v7", "TX", 3),
            fingerprint_request(&records, &prefs, None, "v8", "TX", 3),
        );
    }

    #[test]
    fn preferences_change_the_fingerprint() {
        let records = vec![record(1, 800.0)];

        assert_ne!(
            fingerprint_request(&records, &UserPreferences::new(50, 20, 20, 10), None, "v7", "TX", 3),
            fingerprint_request(&records, &UserPreferences::new(10, 20, 20, 50), None, "v7", "TX", 3),
        );
    }

    #[test]
    fn region_comparison_is_case_insensitive() {
        let records = vec![record(1, 800.0)];
        let prefs = UserPreferences::default();

        assert_eq!(
            fingerprint_request(&records, &prefs, None, "v7", "tx", 3),
            fingerprint_request(&records, &prefs, None, "v7", "TX", 3),
        );
    }
}
