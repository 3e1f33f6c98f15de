//! Duplicate detection and cleanup over the registry.
//!
//! The merger prevents duplicates on insert; this pass catches what slips
//! past it through hand edits or older imports.

use std::collections::{HashMap, HashSet};

use tracing::info;

use portalwatch_store::RegistryStore;

/// Entries sharing one normalized URL key, in registry order. The first
/// member is canonical (earlier insertion means more curation); the rest
/// are removal candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub key: String,
    pub ids: Vec<String>,
}

impl DuplicateGroup {
    pub fn canonical(&self) -> &str {
        &self.ids[0]
    }

    pub fn removals(&self) -> &[String] {
        &self.ids[1..]
    }
}

/// Partition entries by normalized URL key and report the groups with two
/// or more members, in first-occurrence order.
pub fn find_duplicate_groups(registry: &RegistryStore) -> Vec<DuplicateGroup> {
    let mut order: Vec<String> = Vec::new();
    let mut members: HashMap<String, Vec<String>> = HashMap::new();

    for entry in registry.entries() {
        let key = entry.url_key();
        let bucket = members.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        bucket.push(entry.id.clone());
    }

    order
        .into_iter()
        .filter_map(|key| {
            let ids = members.remove(&key)?;
            (ids.len() >= 2).then_some(DuplicateGroup { key, ids })
        })
        .collect()
}

/// Remove every non-canonical group member from the registry, preserving
/// the order of survivors. Returns the number of entries removed; running
/// again on the result removes nothing.
pub fn apply(registry: &mut RegistryStore, groups: &[DuplicateGroup]) -> usize {
    let removals: HashSet<&str> = groups
        .iter()
        .flat_map(|g| g.removals())
        .map(String::as_str)
        .collect();
    if removals.is_empty() {
        return 0;
    }

    // Slug collisions can give a duplicate the same id as its canonical
    // entry; keep the first occurrence in that case.
    let mut canonical_pending: HashSet<String> =
        groups.iter().map(|g| g.canonical().to_string()).collect();

    let before = registry.len();
    registry.entries_mut().retain(|entry| {
        if !removals.contains(entry.id.as_str()) {
            return true;
        }
        canonical_pending.remove(&entry.id)
    });
    let removed = before - registry.len();

    info!(removed, "removed duplicate entries");
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use portalwatch_common::{Category, PortalEntry};

    fn entry(id: &str, url: &str) -> PortalEntry {
        PortalEntry {
            id: id.to_string(),
            name: id.to_string(),
            url: url.to_string(),
            icon: "🌐".to_string(),
            category: Category::Platform,
            tag: "Platform".to_string(),
            description: String::new(),
            discovered: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            relevance: None,
            trust: None,
            verified: false,
            featured: false,
            notes: None,
        }
    }

    fn registry_with(dir: &tempfile::TempDir, entries: Vec<PortalEntry>) -> RegistryStore {
        let mut registry = RegistryStore::load(&dir.path().join("portals.json")).unwrap();
        for e in entries {
            registry.append(e);
        }
        registry
    }

    #[test]
    fn distinct_urls_report_no_groups() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_with(
            &dir,
            vec![
                entry("moltbook-com", "https://moltbook.com"),
                entry("claw-city", "https://claw.city"),
            ],
        );
        assert!(find_duplicate_groups(&registry).is_empty());
    }

    #[test]
    fn url_variants_group_under_one_key() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_with(
            &dir,
            vec![
                entry("moltbook-com", "https://moltbook.com"),
                entry("claw-city", "https://claw.city"),
                entry("moltbook-dup", "http://www.moltbook.com/"),
            ],
        );

        let groups = find_duplicate_groups(&registry);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "moltbook.com");
        assert_eq!(groups[0].canonical(), "moltbook-com");
        assert_eq!(groups[0].removals(), ["moltbook-dup".to_string()]);
    }

    #[test]
    fn apply_keeps_first_member_and_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry_with(
            &dir,
            vec![
                entry("moltbook-com", "https://moltbook.com"),
                entry("claw-city", "https://claw.city"),
                entry("moltbook-dup", "http://www.moltbook.com/"),
            ],
        );

        let groups = find_duplicate_groups(&registry);
        let removed = apply(&mut registry, &groups);

        assert_eq!(removed, 1);
        let ids: Vec<&str> = registry.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["moltbook-com", "claw-city"]);
    }

    #[test]
    fn apply_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry_with(
            &dir,
            vec![
                entry("a", "https://moltbook.com"),
                entry("b", "https://moltbook.com/"),
            ],
        );

        let groups = find_duplicate_groups(&registry);
        apply(&mut registry, &groups);
        assert!(find_duplicate_groups(&registry).is_empty());

        let groups = find_duplicate_groups(&registry);
        let removed = apply(&mut registry, &groups);
        assert_eq!(removed, 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn colliding_ids_still_leave_one_copy() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry_with(
            &dir,
            vec![
                entry("moltbook-com", "https://moltbook.com"),
                entry("moltbook-com", "https://www.moltbook.com"),
            ],
        );

        let groups = find_duplicate_groups(&registry);
        assert_eq!(groups[0].ids, ["moltbook-com", "moltbook-com"]);

        let removed = apply(&mut registry, &groups);
        assert_eq!(removed, 1);
        assert_eq!(registry.len(), 1);
    }
}
