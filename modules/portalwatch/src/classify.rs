//! Keyword-driven category assignment for newly discovered portals.
//!
//! Classification is intentionally dumb: substring matches over the domain
//! and page title, first matching rule wins. The verdict oracle can override
//! the category later for sites that pass verification.

use portalwatch_common::Category;

/// One categorization rule. Keywords match as substrings against the
/// lowercased `"{domain} {title}"` haystack.
struct CategoryRule {
    keywords: &'static [&'static str],
    category: Category,
    tag: &'static str,
    icon: &'static str,
}

/// Ordered rule table. Earlier rules shadow later ones, so the more
/// specific content types (news, photos, video) sit above the generic
/// agent/developer buckets.
const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        keywords: &["news", "feed", "wire"],
        category: Category::Platform,
        tag: "News",
        icon: "📰",
    },
    CategoryRule {
        keywords: &["social", "book", "chat", "talk", "forum", "chan"],
        category: Category::Social,
        tag: "Social",
        icon: "💬",
    },
    CategoryRule {
        keywords: &["photo", "image", "pic", "insta", "gram"],
        category: Category::Creative,
        tag: "Photo Sharing",
        icon: "📸",
    },
    CategoryRule {
        keywords: &["video", "hub", "tube", "stream"],
        category: Category::Creative,
        tag: "Video",
        icon: "🎬",
    },
    CategoryRule {
        keywords: &["game", "play", "arcade", "mmo"],
        category: Category::Gaming,
        tag: "Gaming",
        icon: "🎮",
    },
    CategoryRule {
        keywords: &["market", "shop", "store", "trade", "list", "classified"],
        category: Category::Platform,
        tag: "Marketplace",
        icon: "🏪",
    },
    CategoryRule {
        keywords: &["job", "work", "hire", "gig", "freelance"],
        category: Category::Platform,
        tag: "Jobs",
        icon: "💼",
    },
    CategoryRule {
        keywords: &["hunt", "discover", "find", "search", "directory"],
        category: Category::Platform,
        tag: "Discovery",
        icon: "🔍",
    },
    CategoryRule {
        keywords: &["church", "temple", "community", "group"],
        category: Category::Social,
        tag: "Community",
        icon: "⛪",
    },
    CategoryRule {
        keywords: &["bot", "agent", "ai", "auto"],
        category: Category::Platform,
        tag: "AI Platform",
        icon: "🤖",
    },
    CategoryRule {
        keywords: &["dev", "code", "api", "tool"],
        category: Category::Platform,
        tag: "Developer",
        icon: "🔧",
    },
    CategoryRule {
        keywords: &["art", "creative", "draw", "canvas", "pixel"],
        category: Category::Creative,
        tag: "Creative",
        icon: "🎨",
    },
    CategoryRule {
        keywords: &["match", "date", "connect", "meet"],
        category: Category::Social,
        tag: "Matching",
        icon: "💕",
    },
    CategoryRule {
        keywords: &["bounty", "reward", "task"],
        category: Category::Platform,
        tag: "Bounties",
        icon: "🎯",
    },
    CategoryRule {
        keywords: &["ship", "build", "launch"],
        category: Category::Platform,
        tag: "Shipping",
        icon: "🚀",
    },
];

/// Ecosystem brand markers. A hit on the domain overrides the rule icon
/// but not the rule's category or tag.
const BRAND_ICONS: &[(&str, &str)] = &[
    ("molt", "🦞"),
    ("claw", "🦀"),
    ("lobster", "🦞"),
    ("crab", "🦀"),
    ("shell", "🐚"),
];

/// Category, tag, and icon assigned to a discovered site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    pub tag: &'static str,
    pub icon: &'static str,
}

fn brand_icon(domain: &str) -> Option<&'static str> {
    BRAND_ICONS
        .iter()
        .find(|(keyword, _)| domain.contains(keyword))
        .map(|(_, icon)| *icon)
}

/// Classify a site from its domain and page title.
///
/// The haystack is `"{domain} {title}"` lowercased, so a keyword in either
/// part triggers the rule. Brand domains keep their mascot icon regardless
/// of which rule matched; sites matching nothing land in the generic
/// platform bucket.
pub fn classify(domain: &str, title: &str) -> Classification {
    let haystack = format!("{} {}", domain, title).to_lowercase();
    let brand = brand_icon(&domain.to_lowercase());

    for rule in CATEGORY_RULES {
        if rule.keywords.iter().any(|kw| haystack.contains(kw)) {
            return Classification {
                category: rule.category,
                tag: rule.tag,
                icon: brand.unwrap_or(rule.icon),
            };
        }
    }

    match brand {
        Some(icon) => Classification {
            category: Category::Platform,
            tag: "Agent Platform",
            icon,
        },
        None => Classification {
            category: Category::Platform,
            tag: "Platform",
            icon: "🌐",
        },
    }
}
