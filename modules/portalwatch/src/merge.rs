//! Reconciliation of crawler discoveries into the registry.

use std::fmt;

use chrono::NaiveDate;
use tracing::{debug, info};

use portalwatch_common::{
    display_name, domain_of, is_subdomain_of, normalize_url, slug_from_domain, DiscoveryRecord,
    PortalEntry,
};
use portalwatch_store::{DiscoverySnapshot, RegistryStore};

use crate::classify::classify;

/// What a merge pass did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Domains appended to the registry, in merge order.
    pub added: Vec<String>,
    pub skipped_dead: usize,
    pub skipped_known: usize,
    pub skipped_subdomain: usize,
}

impl MergeOutcome {
    pub fn added_count(&self) -> usize {
        self.added.len()
    }
}

impl fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "added={} skipped_dead={} skipped_known={} skipped_subdomain={}",
            self.added.len(),
            self.skipped_dead,
            self.skipped_known,
            self.skipped_subdomain
        )
    }
}

/// Merge live, content-bearing discoveries into the registry.
///
/// Existing entries are never touched. A discovery is skipped when its
/// normalized URL or bare domain is already registered, or when it is a
/// subdomain of a registered site, so re-running against the post-merge
/// registry adds nothing.
pub fn merge(
    registry: &mut RegistryStore,
    discoveries: &DiscoverySnapshot,
    today: NaiveDate,
) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();
    let known_urls = registry.normalized_urls();
    let known_domains = registry.domains();

    for (key, record) in discoveries.iter() {
        if !record.alive || !record.has_content {
            outcome.skipped_dead += 1;
            continue;
        }

        let url = if record.url.is_empty() {
            format!("https://{key}")
        } else {
            record.url.clone()
        };
        let url = url.trim_end_matches('/').to_string();
        let domain = domain_of(key);

        if known_urls.contains(&normalize_url(&url)) || known_domains.contains(&domain) {
            debug!(%domain, "already registered");
            outcome.skipped_known += 1;
            continue;
        }
        if known_domains.iter().any(|d| is_subdomain_of(&domain, d)) {
            debug!(%domain, "subdomain of a registered site");
            outcome.skipped_subdomain += 1;
            continue;
        }

        let entry = synthesize_entry(&domain, &url, record, today);
        info!(%domain, name = %entry.name, category = %entry.category, "new portal");
        registry.append(entry);
        outcome.added.push(domain);
    }

    outcome
}

/// Shape a discovery into a registry entry. Relevance and trust stay unset
/// until the next scoring pass.
fn synthesize_entry(
    domain: &str,
    url: &str,
    record: &DiscoveryRecord,
    today: NaiveDate,
) -> PortalEntry {
    let classification = classify(domain, &record.title);
    let description = if record.title.is_empty() {
        format!("Discovered at {domain}")
    } else {
        record.title.chars().take(150).collect()
    };

    PortalEntry {
        id: slug_from_domain(domain),
        name: display_name(domain, &record.title),
        url: url.to_string(),
        icon: classification.icon.to_string(),
        category: classification.category,
        tag: classification.tag.to_string(),
        description,
        discovered: parse_first_seen(&record.first_seen).unwrap_or(today),
        relevance: None,
        trust: None,
        verified: false,
        featured: false,
        notes: None,
    }
}

/// Discovery timestamps are full ISO datetimes; the registry keeps dates.
fn parse_first_seen(first_seen: &str) -> Option<NaiveDate> {
    let date: String = first_seen.chars().take(10).collect();
    NaiveDate::parse_from_str(&date, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use portalwatch_common::Category;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
    }

    fn live_record(url: &str, title: &str) -> DiscoveryRecord {
        DiscoveryRecord {
            url: url.to_string(),
            title: title.to_string(),
            first_seen: "2025-05-01T10:00:00".to_string(),
            alive: true,
            has_content: true,
            has_real_content: true,
        }
    }

    fn empty_registry(dir: &tempfile::TempDir) -> RegistryStore {
        RegistryStore::load(&dir.path().join("portals.json")).unwrap()
    }

    #[test]
    fn dead_or_contentless_discoveries_never_merge() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = empty_registry(&dir);

        let mut dead = live_record("https://gone.cc", "Gone");
        dead.alive = false;
        let mut empty = live_record("https://blank.cc", "Blank");
        empty.has_content = false;

        let discoveries = DiscoverySnapshot::from_records([
            ("gone.cc".to_string(), dead),
            ("blank.cc".to_string(), empty),
        ]);

        let outcome = merge(&mut registry, &discoveries, today());
        assert_eq!(outcome.added_count(), 0);
        assert_eq!(outcome.skipped_dead, 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn registered_domain_is_skipped_even_with_www_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = empty_registry(&dir);
        let discoveries = DiscoverySnapshot::from_records([(
            "moltbook.com".to_string(),
            live_record("https://moltbook.com", "Moltbook"),
        )]);
        merge(&mut registry, &discoveries, today());
        assert_eq!(registry.len(), 1);

        let again = DiscoverySnapshot::from_records([(
            "www.moltbook.com".to_string(),
            live_record("http://www.moltbook.com/", "Moltbook"),
        )]);
        let outcome = merge(&mut registry, &again, today());

        assert_eq!(outcome.added_count(), 0);
        assert_eq!(outcome.skipped_known, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn subdomain_of_registered_site_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = empty_registry(&dir);
        merge(
            &mut registry,
            &DiscoverySnapshot::from_records([(
                "moltcities.org".to_string(),
                live_record("https://moltcities.org", "Molt Cities"),
            )]),
            today(),
        );

        let outcome = merge(
            &mut registry,
            &DiscoverySnapshot::from_records([(
                "users.moltcities.org".to_string(),
                live_record("https://users.moltcities.org", "User pages"),
            )]),
            today(),
        );

        assert_eq!(outcome.added_count(), 0);
        assert_eq!(outcome.skipped_subdomain, 1);
    }

    #[test]
    fn registered_site_blocks_both_its_domain_and_subdomains() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = empty_registry(&dir);
        merge(
            &mut registry,
            &DiscoverySnapshot::from_records([(
                "moltbook.com".to_string(),
                live_record("https://moltbook.com", "Moltbook"),
            )]),
            today(),
        );

        let discoveries = DiscoverySnapshot::from_records([
            (
                "moltbook.com".to_string(),
                live_record("https://moltbook.com", "Moltbook"),
            ),
            (
                "sub.moltbook.com".to_string(),
                live_record("https://sub.moltbook.com", "Sub pages"),
            ),
        ]);

        let outcome = merge(&mut registry, &discoveries, today());
        assert_eq!(outcome.added_count(), 0);
        assert_eq!(outcome.skipped_known, 1);
        assert_eq!(outcome.skipped_subdomain, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn synthesized_entry_carries_classified_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = empty_registry(&dir);
        let discoveries = DiscoverySnapshot::from_records([(
            "moltjobs.io".to_string(),
            live_record("https://moltjobs.io/", "MoltJobs — hire agents"),
        )]);

        let outcome = merge(&mut registry, &discoveries, today());
        assert_eq!(outcome.added, vec!["moltjobs.io".to_string()]);

        let entry = &registry.entries()[0];
        assert_eq!(entry.id, "moltjobs-io");
        assert_eq!(entry.name, "MoltJobs");
        assert_eq!(entry.url, "https://moltjobs.io");
        assert_eq!(entry.category, Category::Platform);
        assert_eq!(entry.tag, "Jobs");
        // Brand domain keeps the mascot icon.
        assert_eq!(entry.icon, "🦞");
        assert_eq!(entry.description, "MoltJobs — hire agents");
        assert_eq!(entry.discovered, NaiveDate::from_ymd_opt(2025, 5, 1).unwrap());
        assert_eq!(entry.relevance, None);
        assert_eq!(entry.trust, None);
    }

    #[test]
    fn blank_record_fields_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = empty_registry(&dir);
        let discoveries = DiscoverySnapshot::from_records([(
            "claw-hub.xyz".to_string(),
            DiscoveryRecord {
                alive: true,
                has_content: true,
                ..DiscoveryRecord::default()
            },
        )]);

        merge(&mut registry, &discoveries, today());

        let entry = &registry.entries()[0];
        assert_eq!(entry.url, "https://claw-hub.xyz");
        assert_eq!(entry.name, "Claw Hub");
        assert_eq!(entry.description, "Discovered at claw-hub.xyz");
        assert_eq!(entry.discovered, today());
    }

    #[test]
    fn merge_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = empty_registry(&dir);
        let discoveries = DiscoverySnapshot::from_records([
            (
                "moltbook.com".to_string(),
                live_record("https://moltbook.com", "Moltbook"),
            ),
            (
                "claw.city".to_string(),
                live_record("https://claw.city", "Claw City"),
            ),
        ]);

        let first = merge(&mut registry, &discoveries, today());
        assert_eq!(first.added_count(), 2);

        let second = merge(&mut registry, &discoveries, today());
        assert_eq!(second.added_count(), 0);
        assert_eq!(second.skipped_known, 2);
        assert_eq!(registry.len(), 2);
    }
}
