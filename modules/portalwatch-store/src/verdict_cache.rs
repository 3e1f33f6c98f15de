use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use tracing::debug;

use portalwatch_common::{CacheRecord, OracleVerdict};

/// Verdict cache keyed by normalized domain. The document is the map itself,
/// no wrapper object. Flushed once per verification batch; updates between
/// flushes live only in memory.
pub struct VerdictCache {
    path: PathBuf,
    entries: BTreeMap<String, CacheRecord>,
}

impl VerdictCache {
    pub fn load(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read verdict cache: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse verdict cache: {}", path.display()))?
        } else {
            debug!(path = %path.display(), "Verdict cache absent, starting empty");
            BTreeMap::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)
            .context("Failed to serialize verdict cache")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write verdict cache: {}", self.path.display()))?;
        debug!(path = %self.path.display(), entries = self.entries.len(), "Verdict cache saved");
        Ok(())
    }

    pub fn get(&self, domain: &str) -> Option<&CacheRecord> {
        self.entries.get(domain)
    }

    /// Record today's verdict for a domain, replacing any earlier record.
    pub fn record(&mut self, domain: &str, result: OracleVerdict, today: NaiveDate) {
        self.entries.insert(
            domain.to_string(),
            CacheRecord {
                verified: today,
                result,
            },
        );
    }

    /// A record from the current calendar month suppresses a repeat consult.
    pub fn is_fresh(&self, domain: &str, today: NaiveDate) -> bool {
        let month_start = today.with_day(1).unwrap_or(today);
        self.entries
            .get(domain)
            .map(|r| r.verified >= month_start)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn verdict() -> OracleVerdict {
        OracleVerdict::parked()
    }

    #[test]
    fn record_from_current_month_is_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = VerdictCache::load(&dir.path().join("cache.json")).unwrap();

        cache.record("claw.city", verdict(), date(2025, 11, 3));
        assert!(cache.is_fresh("claw.city", date(2025, 11, 20)));
        assert!(cache.is_fresh("claw.city", date(2025, 11, 3)));
    }

    #[test]
    fn record_from_previous_month_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = VerdictCache::load(&dir.path().join("cache.json")).unwrap();

        cache.record("claw.city", verdict(), date(2025, 10, 3));
        assert!(!cache.is_fresh("claw.city", date(2025, 11, 1)));
        assert!(!cache.is_fresh("unknown.example", date(2025, 11, 1)));
    }

    #[test]
    fn record_replaces_earlier_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = VerdictCache::load(&dir.path().join("cache.json")).unwrap();

        cache.record("claw.city", verdict(), date(2025, 9, 1));
        cache.record("claw.city", OracleVerdict::dead("HTTP status 503".into()), date(2025, 11, 2));

        let record = cache.get("claw.city").unwrap();
        assert_eq!(record.verified, date(2025, 11, 2));
        assert_eq!(record.result.reason, "HTTP status 503");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let mut cache = VerdictCache::load(&path).unwrap();
        cache.record("claw.city", verdict(), date(2025, 11, 2));
        cache.save().unwrap();

        let reloaded = VerdictCache::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get("claw.city").unwrap().verified, date(2025, 11, 2));
    }
}
