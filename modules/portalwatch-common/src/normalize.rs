//! URL and domain normalization.
//!
//! Every identity check in the pipeline (duplicate detection, merge skips,
//! exclusion lookups, cache keys) goes through these functions, so two URLs
//! that differ only by scheme, `www.`, or a trailing slash compare equal
//! everywhere or nowhere.

/// TLD suffixes stripped when deriving a display name from a domain.
const NAME_SUFFIXES: [&str; 6] = [".com", ".io", ".ai", ".app", ".org", ".xyz"];

/// Canonical comparison key for a URL: lowercase host+path with the scheme,
/// a leading `www.`, and trailing slashes removed.
pub fn normalize_url(url: &str) -> String {
    let lower = url.trim().to_lowercase();
    let rest = lower
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(&lower);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    rest.trim_end_matches('/').to_string()
}

/// Host portion of a URL (or bare domain), lowercase and `www.`-stripped.
pub fn domain_of(url: &str) -> String {
    let key = normalize_url(url);
    key.split('/').next().unwrap_or("").to_string()
}

/// True iff `candidate` is a subdomain of `parent` (ends with `.parent`).
/// A domain is not a subdomain of itself.
pub fn is_subdomain_of(candidate: &str, parent: &str) -> bool {
    !parent.is_empty() && candidate.ends_with(&format!(".{parent}"))
}

/// Stable registry id for a domain: dots and underscores become hyphens.
pub fn slug_from_domain(domain: &str) -> String {
    domain.to_lowercase().replace(['.', '_'], "-")
}

/// Display name derived from a domain: known TLD suffix stripped, separators
/// become spaces, words title-cased.
pub fn name_from_domain(domain: &str) -> String {
    let mut base = domain;
    for suffix in NAME_SUFFIXES {
        if let Some(stripped) = base.strip_suffix(suffix) {
            base = stripped;
            break;
        }
    }
    title_case(&base.replace(['-', '_'], " "))
}

/// Display name for an entry: the leading segment of the page title when it
/// is informative (4-49 chars, not URL-like), else the formatted domain.
pub fn display_name(domain: &str, title: &str) -> String {
    if title.chars().count() > 3 && !title.starts_with("http") {
        let head = title.split(['|', '-', '—']).next().unwrap_or("").trim();
        let len = head.chars().count();
        if len > 3 && len < 50 {
            return head.to_string();
        }
    }
    name_from_domain(domain)
}

/// Uppercase the first letter of each word, lowercase the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_boundary = true;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if at_boundary {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_boundary = false;
        } else {
            out.push(ch);
            at_boundary = true;
        }
    }
    out
}
