//! Minimal Anthropic messages-API client.
//!
//! One provider, one capability: send a system+user prompt and force the
//! model to answer through a `structured_response` tool whose input schema
//! is generated from a Rust type. `extract` deserializes the tool call back
//! into that type, so callers never touch raw completion text.

mod client;
pub mod schema;
pub(crate) mod types;

pub use schema::StructuredOutput;

use anyhow::{anyhow, Result};

use client::ApiClient;
use types::{MessagesRequest, ToolSpec};

#[derive(Clone)]
pub struct Claude {
    api_key: String,
    model: String,
    base_url: Option<String>,
}

impl Claude {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
        }
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| anyhow!("ANTHROPIC_API_KEY environment variable not set"))?;
        Ok(Self::new(api_key, model))
    }

    /// Point the client at a different endpoint (test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> ApiClient {
        let client = ApiClient::new(&self.api_key);
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }

    /// Ask the model for a `T`, forcing the answer through a tool call whose
    /// input schema is `T`'s JSON schema.
    pub async fn extract<T: StructuredOutput>(
        &self,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Result<T> {
        let tool = ToolSpec {
            name: "structured_response".to_string(),
            description: "Extract structured data from the input.".to_string(),
            input_schema: T::tool_schema(),
        };
        let request = MessagesRequest::forced_tool(
            &self.model,
            &system_prompt.into(),
            &user_prompt.into(),
            tool,
        );

        let response = self.client().send(&request).await?;

        match response.tool_input() {
            Some(input) => serde_json::from_value(input.clone())
                .map_err(|e| anyhow!("Failed to deserialize structured response: {e}")),
            None => Err(anyhow!(
                "No structured output in response (stop_reason: {})",
                response.stop_reason.as_deref().unwrap_or("none")
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_stores_key_and_model() {
        let ai = Claude::new("sk-ant-test", "claude-sonnet-4-20250514");
        assert_eq!(ai.model(), "claude-sonnet-4-20250514");
        assert_eq!(ai.api_key, "sk-ant-test");
    }

    #[test]
    fn base_url_override_is_kept() {
        let ai = Claude::new("sk-ant-test", "claude-sonnet-4-20250514")
            .with_base_url("https://custom.api.com");
        assert_eq!(ai.base_url, Some("https://custom.api.com".to_string()));
    }
}
