use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use portalwatch_common::ExclusionRecord;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ExclusionDocument {
    #[serde(default)]
    excluded: BTreeMap<String, ExclusionRecord>,
}

/// Domains the oracle (or a human) rejected, keyed by normalized domain.
/// Records are never deleted; a recheck supersedes them in place.
pub struct ExclusionStore {
    path: PathBuf,
    doc: ExclusionDocument,
}

impl ExclusionStore {
    pub fn load(path: &Path) -> Result<Self> {
        let doc = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read exclusions: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse exclusions: {}", path.display()))?
        } else {
            debug!(path = %path.display(), "Exclusion file absent, starting empty");
            ExclusionDocument::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            doc,
        })
    }

    pub fn save(&self) -> Result<()> {
        let json =
            serde_json::to_string_pretty(&self.doc).context("Failed to serialize exclusions")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write exclusions: {}", self.path.display()))?;
        debug!(path = %self.path.display(), excluded = self.doc.excluded.len(), "Exclusions saved");
        Ok(())
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.doc.excluded.contains_key(domain)
    }

    pub fn get(&self, domain: &str) -> Option<&ExclusionRecord> {
        self.doc.excluded.get(domain)
    }

    /// First write wins. Returns false when the domain was already excluded.
    pub fn insert_if_absent(&mut self, domain: &str, record: ExclusionRecord) -> bool {
        if self.doc.excluded.contains_key(domain) {
            return false;
        }
        self.doc.excluded.insert(domain.to_string(), record);
        true
    }

    /// Recheck path: replace whatever is recorded for this domain.
    pub fn supersede(&mut self, domain: &str, record: ExclusionRecord) {
        self.doc.excluded.insert(domain.to_string(), record);
    }

    /// True while the exclusion still holds: present and `recheck_after`
    /// has not passed. A lapsed record stops suppressing but stays on disk.
    pub fn is_suppressed(&self, domain: &str, today: NaiveDate) -> bool {
        self.doc
            .excluded
            .get(domain)
            .map(|r| r.recheck_after > today)
            .unwrap_or(false)
    }

    /// Domains whose recheck horizon has passed, in sorted order.
    pub fn due_for_recheck(&self, today: NaiveDate) -> Vec<(&str, &ExclusionRecord)> {
        self.doc
            .excluded
            .iter()
            .filter(|(_, r)| r.recheck_after <= today)
            .map(|(d, r)| (d.as_str(), r))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.doc.excluded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.excluded.is_empty()
    }
}
