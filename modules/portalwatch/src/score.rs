//! Relevance and trust scoring for registry entries.
//!
//! Scoring is keyword-driven and cheap enough to rerun over the whole
//! registry on every pass. Relevance and trust are always recomputed from
//! the current tables; only a manually pinned `verified` flag survives a
//! rescore, so tier drift follows table changes instead of sticking to
//! whatever an older run wrote.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use portalwatch_common::{PortalEntry, TrustTier};

// --- Keyword tables ---

/// Relevance keywords and weights. Each hit adds `weight * 10`; core
/// ecosystem names outweigh generic agent vocabulary.
const RELEVANCE_KEYWORDS: &[(&str, u32)] = &[
    // Core ecosystem names
    ("molt", 3),
    ("claw", 3),
    ("openclaw", 3),
    ("lobster", 3),
    ("moltbook", 3),
    ("crustacean", 3),
    ("moltverse", 3),
    // Agent vocabulary
    ("agent", 2),
    ("ai agent", 2),
    ("autonomous", 2),
    ("agentic", 2),
    ("bot", 1),
    ("llm", 2),
    ("claude", 2),
    ("gpt", 1),
    // Ecosystem phrases
    ("for agents", 2),
    ("for ai", 2),
    ("agent economy", 2),
    ("agent social", 2),
    ("agent marketplace", 2),
];

/// Flat bonus when the domain itself carries a core keyword.
const DOMAIN_BONUS_KEYWORDS: &[&str] = &["molt", "claw", "lobster", "agent"];
const DOMAIN_BONUS: u32 = 20;

/// Phrases that force the untrusted tier regardless of relevance.
const RED_FLAGS: &[&str] = &[
    "parked domain",
    "domain for sale",
    "coming soon",
    "under construction",
    "database vulnerability",
    "compromised",
    "scam",
    "phishing",
    "malware",
    "do not use",
];

/// Relevance threshold for the high trust tier.
const HIGH_RELEVANCE: u8 = 60;
/// Relevance threshold for the medium trust tier.
const MEDIUM_RELEVANCE: u8 = 30;

// --- Scoring ---

/// Relevance score 0-100 for a site plus the keywords that produced it,
/// from hits across its domain, name, and description and a domain bonus.
/// Capped at 100.
pub fn relevance_matches(
    domain: &str,
    name: &str,
    description: &str,
) -> (u8, Vec<&'static str>) {
    let text = format!("{} {} {}", domain, name, description).to_lowercase();
    let mut score: u32 = 0;
    let mut matched = Vec::new();
    for (keyword, weight) in RELEVANCE_KEYWORDS {
        if text.contains(keyword) {
            score += weight * 10;
            matched.push(*keyword);
        }
    }

    let domain = domain.to_lowercase();
    if DOMAIN_BONUS_KEYWORDS.iter().any(|k| domain.contains(k)) {
        score += DOMAIN_BONUS;
    }

    (score.min(100) as u8, matched)
}

/// Relevance score alone, for callers that do not need the keyword list.
pub fn relevance(domain: &str, name: &str, description: &str) -> u8 {
    relevance_matches(domain, name, description).0
}

/// Trust tier for a site. A red flag anywhere in the text (including the
/// free-form notes) forces Untrusted; otherwise the tier follows the
/// relevance score.
pub fn trust(domain: &str, name: &str, description: &str, notes: &str) -> TrustTier {
    let text = format!("{} {} {} {}", domain, name, description, notes).to_lowercase();
    if RED_FLAGS.iter().any(|flag| text.contains(flag)) {
        return TrustTier::Untrusted;
    }

    match relevance(domain, name, description) {
        r if r >= HIGH_RELEVANCE => TrustTier::High,
        r if r >= MEDIUM_RELEVANCE => TrustTier::Medium,
        _ => TrustTier::Low,
    }
}

// --- Registry passes ---

/// Tier distribution after a scoring pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QualityStats {
    pub verified: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub untrusted: usize,
}

impl QualityStats {
    fn count(&mut self, tier: TrustTier) {
        match tier {
            TrustTier::Verified => self.verified += 1,
            TrustTier::High => self.high += 1,
            TrustTier::Medium => self.medium += 1,
            TrustTier::Low => self.low += 1,
            TrustTier::Untrusted => self.untrusted += 1,
        }
    }

    /// Entries that ended up in the review tiers.
    pub fn flagged(&self) -> usize {
        self.low + self.untrusted
    }
}

impl fmt::Display for QualityStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "verified={} high={} medium={} low={} untrusted={}",
            self.verified, self.high, self.medium, self.low, self.untrusted
        )
    }
}

/// Recompute relevance and trust for every entry in place.
///
/// `verified` entries keep the Verified tier whatever the keywords say.
/// Entries landing in the review tiers are logged as they are found.
pub fn score_all(entries: &mut [PortalEntry]) -> QualityStats {
    let mut stats = QualityStats::default();

    for entry in entries.iter_mut() {
        let domain = entry.domain();
        let notes = entry.notes.as_deref().unwrap_or("");

        let (rel, matched) = relevance_matches(&domain, &entry.name, &entry.description);
        let tier = if entry.verified {
            TrustTier::Verified
        } else {
            trust(&domain, &entry.name, &entry.description, notes)
        };

        debug!(%domain, relevance = rel, keywords = ?matched, "scored");
        entry.relevance = Some(rel);
        entry.trust = Some(tier);
        stats.count(tier);

        if tier <= TrustTier::Low {
            warn!(%domain, tier = %tier, relevance = rel, "needs review");
        }
    }

    stats
}

/// Mark entries as featured: verified, or high trust with relevance at or
/// above the high threshold. Returns how many were newly marked; already
/// featured entries are untouched, so a repeat run returns zero.
pub fn mark_featured(entries: &mut [PortalEntry]) -> usize {
    let mut newly_featured = 0;

    for entry in entries.iter_mut() {
        let eligible = entry.verified
            || (entry.trust == Some(TrustTier::High)
                && entry.relevance.unwrap_or(0) >= HIGH_RELEVANCE);
        if eligible && !entry.featured {
            entry.featured = true;
            newly_featured += 1;
            info!(name = %entry.name, "featured");
        }
    }

    newly_featured
}

/// Entries meeting both a minimum trust tier and a minimum relevance score.
/// Unscored entries count as Low trust with relevance 0.
pub fn filter_quality(
    entries: &[PortalEntry],
    min_trust: TrustTier,
    min_relevance: u8,
) -> Vec<&PortalEntry> {
    entries
        .iter()
        .filter(|e| {
            e.trust.unwrap_or(TrustTier::Low) >= min_trust
                && e.relevance.unwrap_or(0) >= min_relevance
        })
        .collect()
}

/// Entries in the low or untrusted tiers, worst relevance first, for
/// manual review.
pub fn audit_low_quality(entries: &[PortalEntry]) -> Vec<&PortalEntry> {
    let mut flagged: Vec<&PortalEntry> = entries
        .iter()
        .filter(|e| matches!(e.trust, Some(TrustTier::Low) | Some(TrustTier::Untrusted)))
        .collect();
    flagged.sort_by_key(|e| e.relevance.unwrap_or(0));
    flagged
}

/// Export the review tiers to a CSV audit queue. One row per flagged entry
/// in registry order, with an empty `action` column for the reviewer to
/// fill in. Returns the number of rows written.
pub fn export_audit_csv(entries: &[PortalEntry], path: &Path) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(["domain", "name", "trust", "relevance", "description", "action"])?;

    let mut rows = 0;
    for entry in entries {
        if !matches!(entry.trust, Some(TrustTier::Low) | Some(TrustTier::Untrusted)) {
            continue;
        }
        let description: String = entry.description.chars().take(100).collect();
        writer.write_record([
            entry.domain(),
            entry.name.clone(),
            entry.trust.map(|t| t.to_string()).unwrap_or_default(),
            entry.relevance.unwrap_or(0).to_string(),
            description,
            String::new(),
        ])?;
        rows += 1;
    }
    writer.flush()?;

    info!(rows, path = %path.display(), "exported audit queue");
    Ok(rows)
}
