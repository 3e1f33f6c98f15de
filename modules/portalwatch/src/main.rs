use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use portalwatch::verify::{
    apply_results, recheck_candidates, select_candidates, Candidate, ClaudeOracle, HttpFetcher,
    Verifier,
};
use portalwatch::{dedup, merge, score};
use portalwatch_common::{Category, Config, TrustTier};
use portalwatch_store::{DiscoverySnapshot, ExclusionStore, RegistryStore, VerdictCache};

#[derive(Parser)]
#[command(name = "portalwatch", about = "Agent portal registry maintenance")]
struct Cli {
    /// Path to the portal registry JSON
    #[arg(long, default_value = "portals.json")]
    registry: PathBuf,

    /// Path to the crawler discovery snapshot
    #[arg(long, default_value = "molt_sites_db.json")]
    discovery: PathBuf,

    /// Path to the exclusion store
    #[arg(long, default_value = "excluded_sites.json")]
    exclusions: PathBuf,

    /// Path to the verdict cache
    #[arg(long, default_value = "verification_cache.json")]
    cache: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merge crawler discoveries into the registry and rescore it
    Sync,
    /// Recompute relevance and trust for every entry
    Score {
        /// Also flag qualifying entries as featured
        #[arg(long)]
        featured: bool,
    },
    /// List low-quality entries that need review
    Audit {
        /// Write the audit as CSV to this path instead of printing it
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// List entries meeting quality thresholds
    List {
        /// Minimum trust tier (untrusted, low, medium, high, verified)
        #[arg(long, default_value = "medium")]
        min_trust: String,

        /// Minimum relevance score
        #[arg(long, default_value_t = 30)]
        min_relevance: u8,

        /// Restrict to one category (social, creative, gaming, platform)
        #[arg(long)]
        category: Option<String>,
    },
    /// Report duplicate registry URLs, optionally collapsing them
    Dedup {
        /// Remove the duplicates instead of only reporting them
        #[arg(long)]
        apply: bool,
    },
    /// Put candidate sites to the verdict oracle
    Verify {
        /// Verify a single URL or bare domain
        #[arg(long)]
        url: Option<String>,

        /// Verify URLs listed in a file, one per line
        #[arg(long)]
        batch: Option<PathBuf>,

        /// Re-verify excluded sites whose recheck date has passed
        #[arg(long)]
        recheck: bool,

        /// Write accepted and excluded sites back to the stores
        #[arg(long)]
        apply: bool,

        /// Cap on candidates per run
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("portalwatch=info".parse()?))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Command::Sync => run_sync(&cli),
        Command::Score { featured } => run_score(&cli, *featured),
        Command::Audit { export } => run_audit(&cli, export.as_deref()),
        Command::List {
            min_trust,
            min_relevance,
            category,
        } => run_list(&cli, min_trust, *min_relevance, category.as_deref()),
        Command::Dedup { apply } => run_dedup(&cli, *apply),
        Command::Verify {
            url,
            batch,
            recheck,
            apply,
            limit,
        } => run_verify(&cli, url.as_deref(), batch.as_deref(), *recheck, *apply, *limit).await,
    }
}

fn run_sync(cli: &Cli) -> Result<()> {
    let mut registry = RegistryStore::load(&cli.registry)?;
    let discoveries = DiscoverySnapshot::load(&cli.discovery)?;
    info!(
        portals = registry.len(),
        discoveries = discoveries.len(),
        "syncing registry"
    );

    let today = Utc::now().date_naive();
    let outcome = merge::merge(&mut registry, &discoveries, today);
    let stats = score::score_all(registry.entries_mut());
    registry.save()?;

    println!("{outcome}");
    println!("Quality: {stats}");
    Ok(())
}

fn run_score(cli: &Cli, featured: bool) -> Result<()> {
    let mut registry = RegistryStore::load(&cli.registry)?;
    let stats = score::score_all(registry.entries_mut());
    let newly_featured = featured.then(|| score::mark_featured(registry.entries_mut()));
    registry.save()?;

    println!("Quality: {stats}");
    if let Some(n) = newly_featured {
        println!("Featured {n} new portals");
    }
    Ok(())
}

fn run_audit(cli: &Cli, export: Option<&Path>) -> Result<()> {
    let registry = RegistryStore::load(&cli.registry)?;

    if let Some(path) = export {
        let rows = score::export_audit_csv(registry.entries(), path)?;
        println!("Wrote {rows} flagged portals to {}", path.display());
        return Ok(());
    }

    let flagged = score::audit_low_quality(registry.entries());
    if flagged.is_empty() {
        println!("No portals need review");
        return Ok(());
    }

    println!("{} portals need review:", flagged.len());
    for entry in &flagged {
        let tier = entry
            .trust
            .map(|t| t.to_string())
            .unwrap_or_else(|| "unrated".to_string());
        let desc: String = entry.description.chars().take(50).collect();
        println!(
            "  {:9} | rel:{:3} | {}  {}",
            tier,
            entry.relevance.unwrap_or(0),
            entry.domain(),
            desc
        );
    }
    println!("Improve descriptions, verify portals, or remove dead ones to clear the list.");
    Ok(())
}

fn run_list(cli: &Cli, min_trust: &str, min_relevance: u8, category: Option<&str>) -> Result<()> {
    let registry = RegistryStore::load(&cli.registry)?;
    let min_trust = TrustTier::from_str_loose(min_trust);
    let mut kept = score::filter_quality(registry.entries(), min_trust, min_relevance);
    if let Some(raw) = category {
        let wanted = Category::from_str_loose(raw);
        kept.retain(|e| e.category == wanted);
    }

    if kept.is_empty() {
        println!("No portals meet the bar");
        return Ok(());
    }
    println!("{} portals:", kept.len());
    for entry in &kept {
        let tier = entry
            .trust
            .map(|t| t.to_string())
            .unwrap_or_else(|| "unrated".to_string());
        println!(
            "  {} {} [{} rel:{}]  {}",
            entry.icon,
            entry.name,
            tier,
            entry.relevance.unwrap_or(0),
            entry.url
        );
    }
    Ok(())
}

fn run_dedup(cli: &Cli, apply: bool) -> Result<()> {
    let mut registry = RegistryStore::load(&cli.registry)?;
    let groups = dedup::find_duplicate_groups(&registry);
    if groups.is_empty() {
        println!("No duplicate URLs found");
        return Ok(());
    }

    for group in &groups {
        println!(
            "{}: keeping {}, removing {}",
            group.key,
            group.canonical(),
            group.removals().join(", ")
        );
    }

    if apply {
        let removed = dedup::apply(&mut registry, &groups);
        registry.save()?;
        println!("Removed {removed} duplicate entries");
    } else {
        let pending: usize = groups.iter().map(|g| g.removals().len()).sum();
        println!("Run with --apply to remove {pending} duplicate entries");
    }
    Ok(())
}

async fn run_verify(
    cli: &Cli,
    url: Option<&str>,
    batch: Option<&Path>,
    recheck: bool,
    apply: bool,
    limit: usize,
) -> Result<()> {
    let config = Config::from_env()?;
    let api_key = config.require_api_key()?;

    let mut registry = RegistryStore::load(&cli.registry)?;
    let mut exclusions = ExclusionStore::load(&cli.exclusions)?;
    let mut cache = VerdictCache::load(&cli.cache)?;
    let today = Utc::now().date_naive();

    let mut candidates = if let Some(raw) = url {
        vec![Candidate::from_input(raw)]
    } else if let Some(path) = batch {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading batch file {}", path.display()))?;
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(Candidate::from_input)
            .collect()
    } else if recheck {
        recheck_candidates(&exclusions, today)
    } else {
        let discoveries = DiscoverySnapshot::load(&cli.discovery)?;
        select_candidates(&discoveries, &registry, &exclusions, &cache, today)
    };

    if candidates.is_empty() {
        println!("No sites to verify");
        return Ok(());
    }
    if candidates.len() > limit {
        info!(total = candidates.len(), limit, "capping candidate list");
        candidates.truncate(limit);
    }

    let fetcher = HttpFetcher::new();
    let oracle = match config.model.as_deref() {
        Some(model) => ClaudeOracle::with_model(api_key, model),
        None => ClaudeOracle::new(api_key),
    };

    let report = Verifier::new(&fetcher, &oracle, &mut cache)
        .run(&candidates, today)
        .await?;

    println!("{report}");
    for site in &report.accepted {
        let desc: String = site.description.chars().take(50).collect();
        println!("  {}: {}", site.domain, desc);
    }

    if !apply {
        if !report.accepted.is_empty() || !report.excluded.is_empty() {
            println!("Run with --apply to add these to the registry and exclusions");
        }
        return Ok(());
    }

    let outcome = apply_results(&report, &mut registry, &mut exclusions, today, recheck);
    registry.save()?;
    exclusions.save()?;
    println!(
        "Applied: {} portals added, {} exclusions recorded",
        outcome.portals_added, outcome.exclusions_recorded
    );
    Ok(())
}
