//! The verdict oracle: one LLM consult per candidate site.
//!
//! The verdict comes back through schema-forced structured output, so a
//! response either deserializes into [`OracleVerdict`] or surfaces as an
//! error for the orchestrator to bucket.

use ai_client::Claude;
use anyhow::Result;
use async_trait::async_trait;

use portalwatch_common::OracleVerdict;

/// Model consulted for verdicts unless overridden by configuration.
pub const VERDICT_MODEL: &str = "claude-sonnet-4-20250514";

/// The prompt carries at most this much page text.
const MAX_EXCERPT_CHARS: usize = 2500;

const VERIFICATION_SYSTEM: &str = "\
Analyze a website and determine whether it is a platform that AI agents can USE as users.\n\n\
INCLUDE - platforms where AI agents are the PRIMARY USERS:\n\
- Social networks for agents (like Moltbook, MoltX)\n\
- Forums and imageboards for agents (like 4claw, Lobchan)\n\
- Marketplaces where agents transact (like Clawdslist)\n\
- Games playable by agents (like ClawCity)\n\
- Creative platforms for agents (like Molt-Place pixel canvas)\n\
- Professional networks for agents (like PinchedIn)\n\n\
EXCLUDE - sites that are ABOUT agents or FOR humans:\n\
- Agent development tools and SDKs (for humans to BUILD agents)\n\
- AI directories listing agents (for humans to BROWSE)\n\
- News sites about AI and agents (for humans to READ)\n\
- No-code automation platforms\n\
- Chatbot builders\n\
- API platforms for developers\n\
- Infrastructure and protocol sites\n\n\
ALSO EXCLUDE:\n\
- Parked and coming-soon pages\n\
- Redirects to unrelated sites\n\
- Seafood restaurants, real estate, insurance, and other unrelated industries\n\
- Generic bot directories (Discord bots, Telegram bots)\n\n\
Give a 1-2 sentence reason for the verdict. For sites that pass, suggest a display name, \
a one-sentence description, and the best-fitting category; leave name and description \
empty otherwise.";

#[async_trait]
pub trait VerdictOracle: Send + Sync {
    async fn verdict(&self, url: &str, title: &str, content: &str) -> Result<OracleVerdict>;
}

/// Oracle backed by the Claude messages API.
pub struct ClaudeOracle {
    claude: Claude,
}

impl ClaudeOracle {
    pub fn new(api_key: &str) -> Self {
        Self {
            claude: Claude::new(api_key, VERDICT_MODEL),
        }
    }

    pub fn with_model(api_key: &str, model: &str) -> Self {
        Self {
            claude: Claude::new(api_key, model),
        }
    }
}

#[async_trait]
impl VerdictOracle for ClaudeOracle {
    async fn verdict(&self, url: &str, title: &str, content: &str) -> Result<OracleVerdict> {
        self.claude
            .extract::<OracleVerdict>(VERIFICATION_SYSTEM, &user_prompt(url, title, content))
            .await
    }
}

fn user_prompt(url: &str, title: &str, content: &str) -> String {
    let excerpt: String = content.chars().take(MAX_EXCERPT_CHARS).collect();
    format!("Website URL: {url}\nWebsite Title: {title}\nWebsite Content:\n{excerpt}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_separates_users_from_builders() {
        assert!(VERIFICATION_SYSTEM.contains("PRIMARY USERS"));
        assert!(VERIFICATION_SYSTEM.contains("BUILD agents"));
        assert!(VERIFICATION_SYSTEM.contains("Parked and coming-soon pages"));
    }

    #[test]
    fn user_prompt_lays_out_url_title_and_content() {
        let prompt = user_prompt("https://moltbook.com", "Moltbook", "the front page");
        assert!(prompt.starts_with("Website URL: https://moltbook.com\n"));
        assert!(prompt.contains("Website Title: Moltbook\n"));
        assert!(prompt.ends_with("Website Content:\nthe front page"));
    }

    #[test]
    fn user_prompt_clips_long_content() {
        let prompt = user_prompt("https://moltbook.com", "Moltbook", &"x".repeat(10_000));
        let excerpt = prompt.split("Website Content:\n").nth(1).unwrap();
        assert_eq!(excerpt.chars().count(), MAX_EXCERPT_CHARS);
    }
}
