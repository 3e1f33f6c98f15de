use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use portalwatch_common::DiscoveryRecord;

#[derive(Debug, Default, Deserialize)]
struct DiscoveryDocument {
    #[serde(default)]
    sites: BTreeMap<String, DiscoveryRecord>,
}

/// Read-only view of the crawler's output document. Keys are domains (or
/// occasionally full URLs from older crawler runs); the sorted map keeps
/// merge output order stable across runs.
pub struct DiscoverySnapshot {
    sites: BTreeMap<String, DiscoveryRecord>,
}

impl DiscoverySnapshot {
    /// Load the snapshot from `path`. An absent file is an empty snapshot.
    pub fn load(path: &Path) -> Result<Self> {
        let doc = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read discovery snapshot: {}", path.display()))?;
            serde_json::from_str::<DiscoveryDocument>(&content)
                .with_context(|| format!("Failed to parse discovery snapshot: {}", path.display()))?
        } else {
            debug!(path = %path.display(), "Discovery snapshot absent, nothing to reconcile");
            DiscoveryDocument::default()
        };
        Ok(Self { sites: doc.sites })
    }

    /// Build a snapshot directly from records, bypassing the filesystem.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = (String, DiscoveryRecord)>,
    {
        Self {
            sites: records.into_iter().collect(),
        }
    }

    /// Records in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DiscoveryRecord)> {
        self.sites.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_file_is_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let snap = DiscoverySnapshot::load(&dir.path().join("sites.json")).unwrap();
        assert!(snap.is_empty());
    }

    #[test]
    fn parses_crawler_document_and_sorts_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sites.json");
        std::fs::write(
            &path,
            r#"{
                "sites": {
                    "zeta.example": {"url": "https://zeta.example", "alive": true},
                    "alpha.example": {"url": "https://alpha.example", "alive": false}
                }
            }"#,
        )
        .unwrap();

        let snap = DiscoverySnapshot::load(&path).unwrap();
        assert_eq!(snap.len(), 2);
        let keys: Vec<&str> = snap.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["alpha.example", "zeta.example"]);
    }

    #[test]
    fn tolerates_missing_flags() {
        let snap = DiscoverySnapshot::from_records([(
            "claw.city".to_string(),
            DiscoveryRecord {
                url: "https://claw.city".to_string(),
                ..DiscoveryRecord::default()
            },
        )]);
        let (_, record) = snap.iter().next().unwrap();
        assert!(!record.alive);
        assert!(!record.has_real_content);
    }
}
