use chrono::{Months, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::normalize::{domain_of, normalize_url};

// --- Registry Types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Social,
    Creative,
    Gaming,
    Platform,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Social => write!(f, "social"),
            Category::Creative => write!(f, "creative"),
            Category::Gaming => write!(f, "gaming"),
            Category::Platform => write!(f, "platform"),
        }
    }
}

impl Category {
    pub fn from_str_loose(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "social" => Category::Social,
            "creative" => Category::Creative,
            "gaming" => Category::Gaming,
            _ => Category::Platform,
        }
    }
}

/// Ordered trust classification. The derived ordering follows declaration
/// order, so threshold filters can compare tiers directly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum TrustTier {
    Untrusted,
    Low,
    Medium,
    High,
    Verified,
}

impl std::fmt::Display for TrustTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrustTier::Untrusted => write!(f, "untrusted"),
            TrustTier::Low => write!(f, "low"),
            TrustTier::Medium => write!(f, "medium"),
            TrustTier::High => write!(f, "high"),
            TrustTier::Verified => write!(f, "verified"),
        }
    }
}

impl TrustTier {
    pub fn from_str_loose(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "low" => TrustTier::Low,
            "medium" => TrustTier::Medium,
            "high" => TrustTier::High,
            "verified" => TrustTier::Verified,
            _ => TrustTier::Untrusted,
        }
    }
}

/// A canonical registry record: one curated agent-usable website.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalEntry {
    /// Stable slug derived from the domain. Unique across the registry.
    pub id: String,
    pub name: String,
    /// Canonical absolute URL, no trailing slash. Unique once normalized.
    pub url: String,
    pub icon: String,
    pub category: Category,
    pub tag: String,
    pub description: String,
    /// Date the entry entered the registry.
    pub discovered: NaiveDate,
    /// 0-100 topical relevance. None until scored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance: Option<u8>,
    /// None until scored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust: Option<TrustTier>,
    /// Manual override; forces trust to `verified` on the next scoring pass.
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub featured: bool,
    /// Manual review notes. Fed into trust scoring (red flags apply here too).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PortalEntry {
    /// Host of the canonical URL, lowercase and `www.`-stripped.
    pub fn domain(&self) -> String {
        domain_of(&self.url)
    }

    /// Canonical comparison key used for duplicate detection.
    pub fn url_key(&self) -> String {
        normalize_url(&self.url)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub id: String,
    pub name: String,
    pub icon: String,
}

impl CategoryInfo {
    /// Category list seeded into a fresh registry document.
    pub fn defaults() -> Vec<CategoryInfo> {
        [
            ("all", "All", "🌐"),
            ("social", "Social", "💬"),
            ("creative", "Creative", "🎨"),
            ("platform", "Platform", "🔧"),
            ("gaming", "Gaming", "🎮"),
        ]
        .into_iter()
        .map(|(id, name, icon)| CategoryInfo {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
        })
        .collect()
    }
}

// --- Discovery Types ---

/// Raw candidate produced by the crawling subsystem, keyed by domain in the
/// discovery snapshot. Consumed by the merger and the verifier, never
/// written back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryRecord {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// ISO timestamp of first discovery.
    #[serde(default)]
    pub first_seen: String,
    #[serde(default)]
    pub alive: bool,
    /// The crawler saw a non-empty response body.
    #[serde(default)]
    pub has_content: bool,
    /// The crawler saw substantive content, not a shell page. Gates
    /// verification, which is stricter than merge.
    #[serde(default)]
    pub has_real_content: bool,
}

// --- Verification Types ---

/// Why a domain is excluded from the registry, and when to look again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExclusionRecord {
    pub reason: String,
    /// The verdict label that caused the exclusion, not a registry category.
    pub category: String,
    pub checked: NaiveDate,
    /// Six calendar months after `checked`. Until then the domain is
    /// suppressed from candidate selection.
    pub recheck_after: NaiveDate,
}

impl ExclusionRecord {
    /// The recheck horizon lands six calendar months out, wrapping the year
    /// and clamping the day to the target month's length (Aug 31 -> Feb 28).
    pub fn new(reason: String, category: String, checked: NaiveDate) -> Self {
        let recheck_after = checked
            .checked_add_months(Months::new(6))
            .unwrap_or(checked);
        ExclusionRecord {
            reason,
            category,
            checked,
            recheck_after,
        }
    }
}

/// Cached oracle consult for a domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Date of the last oracle call.
    pub verified: NaiveDate,
    /// Full verdict payload, persisted verbatim.
    pub result: OracleVerdict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum VerdictKind {
    AgentUsable,
    ForHumans,
    Parked,
    Redirect,
    WrongIndustry,
    Dead,
    Error,
}

impl std::fmt::Display for VerdictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerdictKind::AgentUsable => write!(f, "agent-usable"),
            VerdictKind::ForHumans => write!(f, "for-humans"),
            VerdictKind::Parked => write!(f, "parked"),
            VerdictKind::Redirect => write!(f, "redirect"),
            VerdictKind::WrongIndustry => write!(f, "wrong-industry"),
            VerdictKind::Dead => write!(f, "dead"),
            VerdictKind::Error => write!(f, "error"),
        }
    }
}

impl VerdictKind {
    /// The site should be added to the registry.
    pub fn is_accept(&self) -> bool {
        matches!(self, VerdictKind::AgentUsable)
    }

    /// The site should be recorded in the exclusion store.
    pub fn is_exclude(&self) -> bool {
        matches!(
            self,
            VerdictKind::ForHumans
                | VerdictKind::Parked
                | VerdictKind::Redirect
                | VerdictKind::WrongIndustry
                | VerdictKind::Dead
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
        }
    }
}

/// A full verdict on one site: the classification itself plus suggested
/// registry fields for accepted sites. Short-circuit verdicts (redirect,
/// dead, parked) are synthesized without consulting the oracle.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OracleVerdict {
    pub verdict: VerdictKind,
    pub confidence: Confidence,
    /// Brief explanation, 1-2 sentences.
    pub reason: String,
    /// Suggested display name. Empty for non-accepted sites.
    #[serde(default)]
    pub name: String,
    /// Suggested one-sentence description. Empty for non-accepted sites.
    #[serde(default)]
    pub description: String,
    pub category: Category,
}

impl OracleVerdict {
    pub fn redirect(target: &str) -> Self {
        OracleVerdict {
            verdict: VerdictKind::Redirect,
            confidence: Confidence::High,
            reason: format!("Redirects to {target}"),
            name: String::new(),
            description: String::new(),
            category: Category::Platform,
        }
    }

    pub fn dead(reason: String) -> Self {
        OracleVerdict {
            verdict: VerdictKind::Dead,
            confidence: Confidence::High,
            reason,
            name: String::new(),
            description: String::new(),
            category: Category::Platform,
        }
    }

    pub fn parked() -> Self {
        OracleVerdict {
            verdict: VerdictKind::Parked,
            confidence: Confidence::Medium,
            reason: "Minimal or no content".to_string(),
            name: String::new(),
            description: String::new(),
            category: Category::Platform,
        }
    }

    pub fn error(reason: String) -> Self {
        OracleVerdict {
            verdict: VerdictKind::Error,
            confidence: Confidence::Low,
            reason,
            name: String::new(),
            description: String::new(),
            category: Category::Platform,
        }
    }
}
