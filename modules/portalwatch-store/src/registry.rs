use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use portalwatch_common::{CategoryInfo, PortalEntry};

/// On-disk shape of the registry document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RegistryDocument {
    /// Date of the last save, `YYYY-MM-DD`. Empty until first saved.
    #[serde(default)]
    updated: String,
    #[serde(default)]
    portals: Vec<PortalEntry>,
    #[serde(default)]
    categories: Vec<CategoryInfo>,
}

/// The canonical portal registry. Entry order is curation order: merges
/// append at the tail and nothing else reorders.
pub struct RegistryStore {
    path: PathBuf,
    doc: RegistryDocument,
}

impl RegistryStore {
    /// Load the registry from `path`. An absent file yields an empty
    /// registry with the default category list.
    pub fn load(path: &Path) -> Result<Self> {
        let doc = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read registry: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse registry: {}", path.display()))?
        } else {
            debug!(path = %path.display(), "Registry file absent, starting empty");
            RegistryDocument {
                categories: CategoryInfo::defaults(),
                ..RegistryDocument::default()
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            doc,
        })
    }

    /// Rewrite the whole document, stamping `updated` with today and seeding
    /// the category list if a hand-edited file dropped it.
    pub fn save(&mut self) -> Result<()> {
        if self.doc.categories.is_empty() {
            self.doc.categories = CategoryInfo::defaults();
        }
        self.doc.updated = Utc::now().format("%Y-%m-%d").to_string();
        let json =
            serde_json::to_string_pretty(&self.doc).context("Failed to serialize registry")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write registry: {}", self.path.display()))?;
        debug!(path = %self.path.display(), portals = self.doc.portals.len(), "Registry saved");
        Ok(())
    }

    pub fn entries(&self) -> &[PortalEntry] {
        &self.doc.portals
    }

    pub fn entries_mut(&mut self) -> &mut Vec<PortalEntry> {
        &mut self.doc.portals
    }

    pub fn append(&mut self, entry: PortalEntry) {
        self.doc.portals.push(entry);
    }

    pub fn len(&self) -> usize {
        self.doc.portals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.portals.is_empty()
    }

    /// Normalized URL keys of every entry, for duplicate checks.
    pub fn normalized_urls(&self) -> HashSet<String> {
        self.doc.portals.iter().map(|p| p.url_key()).collect()
    }

    /// Bare domains of every entry, for domain and subdomain checks.
    pub fn domains(&self) -> HashSet<String> {
        self.doc.portals.iter().map(|p| p.domain()).collect()
    }

    pub fn contains_domain(&self, domain: &str) -> bool {
        self.doc.portals.iter().any(|p| p.domain() == domain)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use portalwatch_common::Category;

    fn entry(id: &str, url: &str) -> PortalEntry {
        PortalEntry {
            id: id.to_string(),
            name: id.to_string(),
            url: url.to_string(),
            icon: "🦞".to_string(),
            category: Category::Platform,
            tag: "Platform".to_string(),
            description: String::new(),
            discovered: NaiveDate::from_ymd_opt(2025, 11, 2).unwrap(),
            relevance: None,
            trust: None,
            verified: false,
            featured: false,
            notes: None,
        }
    }

    #[test]
    fn absent_file_yields_empty_registry_with_default_categories() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::load(&dir.path().join("portals.json")).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.doc.categories.len(), 5);
        assert_eq!(store.doc.categories[0].id, "all");
    }

    #[test]
    fn save_and_reload_round_trips_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portals.json");

        let mut store = RegistryStore::load(&path).unwrap();
        store.append(entry("moltbook-com", "https://moltbook.com"));
        store.append(entry("claw-city", "https://claw.city"));
        store.save().unwrap();

        let reloaded = RegistryStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.entries()[0].id, "moltbook-com");
        assert_eq!(reloaded.entries()[1].id, "claw-city");
        assert!(!reloaded.doc.updated.is_empty());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portals.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(RegistryStore::load(&path).is_err());
    }

    #[test]
    fn lookup_sets_use_normalized_forms() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RegistryStore::load(&dir.path().join("portals.json")).unwrap();
        store.append(entry("moltbook-com", "https://www.Moltbook.com/"));

        assert!(store.normalized_urls().contains("moltbook.com"));
        assert!(store.domains().contains("moltbook.com"));
        assert!(store.contains_domain("moltbook.com"));
        assert!(!store.contains_domain("www.moltbook.com"));
    }
}
