//! Verdict-driven verification of discovered sites.
//!
//! Candidates are sites the crawler found alive with substantive content
//! that nothing has judged yet: not in the registry, not suppressed by an
//! exclusion, not freshly cached. Each one is fetched and either
//! pre-classified from the response alone (redirect, dead, parked) or put
//! to the verdict oracle. Applying a report turns accepted sites into
//! registry entries and rejected ones into exclusion records.

mod fetch;
mod oracle;

pub use fetch::{FetchedPage, HttpFetcher, PageFetcher};
pub use oracle::{ClaudeOracle, VerdictOracle, VERDICT_MODEL};

use std::fmt;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use tokio::time::sleep;
use tracing::{info, warn};

use portalwatch_common::{
    domain_of, slug_from_domain, Category, Confidence, ExclusionRecord, OracleVerdict,
    PortalEntry, TrustTier, VerdictKind,
};
use portalwatch_store::{DiscoverySnapshot, ExclusionStore, RegistryStore, VerdictCache};

/// Pause between candidates, keeping oracle traffic under rate limits.
const ORACLE_DELAY: Duration = Duration::from_millis(500);
/// Pages with less text than this are parked without consulting the oracle.
const MIN_CONTENT_CHARS: usize = 50;

// --- Candidate selection ---

/// One site queued for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub domain: String,
    pub url: String,
}

impl Candidate {
    /// Build a candidate from a raw URL or bare domain. Only an explicit
    /// scheme marks a URL; a domain that merely starts with "http" (like
    /// httpbin.org) still gets one synthesized.
    pub fn from_input(raw: &str) -> Self {
        let raw = raw.trim();
        let url = if raw.starts_with("http://") || raw.starts_with("https://") {
            raw.to_string()
        } else {
            format!("https://{raw}")
        };
        Candidate {
            domain: domain_of(&url),
            url,
        }
    }
}

/// Discoveries that still need a verdict: alive with real content, not
/// registered, not suppressed by an exclusion, not freshly cached this
/// calendar month.
pub fn select_candidates(
    discoveries: &DiscoverySnapshot,
    registry: &RegistryStore,
    exclusions: &ExclusionStore,
    cache: &VerdictCache,
    today: NaiveDate,
) -> Vec<Candidate> {
    let registered = registry.domains();
    let mut candidates = Vec::new();

    for (key, record) in discoveries.iter() {
        if !record.alive || !record.has_real_content {
            continue;
        }
        let domain = domain_of(key);
        if registered.contains(&domain) {
            continue;
        }
        if exclusions.is_suppressed(&domain, today) {
            continue;
        }
        if cache.is_fresh(&domain, today) {
            continue;
        }
        let url = if record.url.is_empty() {
            format!("https://{domain}")
        } else {
            record.url.clone()
        };
        candidates.push(Candidate { domain, url });
    }

    candidates
}

/// Excluded domains whose recheck horizon has passed.
pub fn recheck_candidates(exclusions: &ExclusionStore, today: NaiveDate) -> Vec<Candidate> {
    exclusions
        .due_for_recheck(today)
        .into_iter()
        .map(|(domain, _)| Candidate {
            domain: domain.to_string(),
            url: format!("https://{domain}"),
        })
        .collect()
}

// --- Batch outcome ---

/// Accepted site with the oracle's suggested registry fields.
#[derive(Debug, Clone)]
pub struct AcceptedSite {
    pub domain: String,
    pub url: String,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub confidence: Confidence,
}

#[derive(Debug, Clone)]
pub struct ExcludedSite {
    pub domain: String,
    pub verdict: VerdictKind,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct VerdictFailure {
    pub domain: String,
    pub reason: String,
}

/// Bucketed outcome of one verification batch.
#[derive(Debug, Default)]
pub struct VerificationReport {
    pub accepted: Vec<AcceptedSite>,
    pub excluded: Vec<ExcludedSite>,
    pub failures: Vec<VerdictFailure>,
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Verification: {} agent-usable, {} excluded, {} errors",
            self.accepted.len(),
            self.excluded.len(),
            self.failures.len()
        )
    }
}

// --- Orchestrator ---

/// Drives a verification batch: fetch, short-circuit or consult the oracle,
/// cache every verdict, bucket the outcome.
pub struct Verifier<'a> {
    fetcher: &'a dyn PageFetcher,
    oracle: &'a dyn VerdictOracle,
    cache: &'a mut VerdictCache,
    delay: Duration,
}

impl<'a> Verifier<'a> {
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        oracle: &'a dyn VerdictOracle,
        cache: &'a mut VerdictCache,
    ) -> Self {
        Verifier {
            fetcher,
            oracle,
            cache,
            delay: ORACLE_DELAY,
        }
    }

    /// Override the inter-candidate pause. Tests run with zero.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Verify candidates one at a time, in order. Every verdict, including
    /// short-circuits and failures, lands in the cache; the cache is flushed
    /// to disk once at the end of the batch.
    pub async fn run(
        &mut self,
        candidates: &[Candidate],
        today: NaiveDate,
    ) -> Result<VerificationReport> {
        let mut report = VerificationReport::default();
        let total = candidates.len();

        for (i, candidate) in candidates.iter().enumerate() {
            info!("[{}/{}] verifying {}", i + 1, total, candidate.domain);

            let page = self.fetcher.fetch(&candidate.url).await;
            let verdict = self.judge(&page).await;
            self.cache.record(&candidate.domain, verdict.clone(), today);

            if verdict.verdict.is_accept() {
                info!(
                    domain = %candidate.domain,
                    confidence = %verdict.confidence,
                    reason = %verdict.reason,
                    "agent-usable"
                );
                let name = if verdict.name.is_empty() {
                    candidate.domain.clone()
                } else {
                    verdict.name.clone()
                };
                report.accepted.push(AcceptedSite {
                    domain: candidate.domain.clone(),
                    url: candidate.url.clone(),
                    name,
                    description: verdict.description.clone(),
                    category: verdict.category,
                    confidence: verdict.confidence,
                });
            } else if verdict.verdict.is_exclude() {
                info!(
                    domain = %candidate.domain,
                    verdict = %verdict.verdict,
                    reason = %verdict.reason,
                    "excluded"
                );
                report.excluded.push(ExcludedSite {
                    domain: candidate.domain.clone(),
                    verdict: verdict.verdict,
                    reason: verdict.reason.clone(),
                });
            } else {
                warn!(domain = %candidate.domain, reason = %verdict.reason, "verdict failed");
                report.failures.push(VerdictFailure {
                    domain: candidate.domain.clone(),
                    reason: verdict.reason.clone(),
                });
            }

            sleep(self.delay).await;
        }

        self.cache.save()?;
        Ok(report)
    }

    /// Pre-classify from the fetch alone where possible; only real pages
    /// reach the oracle.
    async fn judge(&self, page: &FetchedPage) -> OracleVerdict {
        if let Some(ref target) = page.redirect {
            return OracleVerdict::redirect(target);
        }
        if let Some(ref error) = page.error {
            return OracleVerdict::dead(format!("Could not fetch: {error}"));
        }
        if page.status != Some(200) {
            return OracleVerdict::dead(format!("HTTP status {}", page.status.unwrap_or(0)));
        }
        if page.content.chars().count() < MIN_CONTENT_CHARS {
            return OracleVerdict::parked();
        }

        match self
            .oracle
            .verdict(&page.url, &page.title, &page.content)
            .await
        {
            Ok(verdict) => verdict,
            Err(e) => {
                let detail: String = e.to_string().chars().take(50).collect();
                OracleVerdict::error(format!("LLM error: {detail}"))
            }
        }
    }
}

// --- Applying a report ---

/// Counts from folding a report into the stores.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub portals_added: usize,
    pub exclusions_recorded: usize,
}

/// Fold a verification report into the stores.
///
/// Accepted sites become registry entries unless the domain is already
/// registered. Excluded sites get an exclusion record: first write wins
/// normally, while recheck mode supersedes the old record with a fresh
/// horizon. Failures are applied nowhere.
pub fn apply_results(
    report: &VerificationReport,
    registry: &mut RegistryStore,
    exclusions: &mut ExclusionStore,
    today: NaiveDate,
    recheck: bool,
) -> ApplyOutcome {
    let mut outcome = ApplyOutcome::default();

    for site in &report.accepted {
        if registry.contains_domain(&site.domain) {
            continue;
        }
        info!(domain = %site.domain, name = %site.name, "added to registry");
        registry.append(accepted_entry(site, today));
        outcome.portals_added += 1;
    }

    for site in &report.excluded {
        let record = ExclusionRecord::new(site.reason.clone(), site.verdict.to_string(), today);
        let recorded = if recheck {
            exclusions.supersede(&site.domain, record);
            true
        } else {
            exclusions.insert_if_absent(&site.domain, record)
        };
        if recorded {
            info!(domain = %site.domain, verdict = %site.verdict, "recorded exclusion");
            outcome.exclusions_recorded += 1;
        }
    }

    outcome
}

/// Brand domains keep the mascot icon; anything else that passed the oracle
/// gets the generic agent glyph.
fn accepted_entry(site: &AcceptedSite, today: NaiveDate) -> PortalEntry {
    let icon = if ["molt", "claw", "lob"].iter().any(|k| site.domain.contains(k)) {
        "🦞"
    } else {
        "🤖"
    };
    let trust = if site.confidence == Confidence::High {
        TrustTier::High
    } else {
        TrustTier::Medium
    };

    PortalEntry {
        id: slug_from_domain(&site.domain),
        name: site.name.clone(),
        url: site.url.clone(),
        icon: icon.to_string(),
        category: site.category,
        tag: "Agent Platform".to_string(),
        description: site.description.clone(),
        discovered: today,
        relevance: Some(80),
        trust: Some(trust),
        verified: false,
        featured: false,
        notes: None,
    }
}
