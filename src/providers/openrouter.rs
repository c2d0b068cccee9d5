use std::fmt;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{first_success, ProviderError};

pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

const SYSTEM_PROMPT: &str = "You are Elena Vasquez, a senior travel editor with 15 years of \
    experience visiting 80+ countries. You write authoritative, SEO-optimized travel guides. \
    Always write in a warm but professional tone.";
const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 8000;
/// Anything shorter is treated as a refusal or truncated reply.
const MIN_CONTENT_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Model {
    pub id: &'static str,
    pub name: &'static str,
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Cheapest first.
pub const MODELS: [Model; 3] = [
    Model { id: "google/gemini-2.0-flash-001", name: "Gemini Flash" },
    Model { id: "deepseek/deepseek-chat", name: "DeepSeek" },
    Model { id: "openai/gpt-4o-mini", name: "GPT-4o-mini" },
];

#[derive(Debug, Clone)]
pub struct Generated {
    pub content: String,
    pub model_used: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
}

impl OpenRouterClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(OpenRouterClient {
            client,
            api_key: api_key.into(),
        })
    }

    /// Generate with the first model in [`MODELS`] that returns usable text.
    pub async fn generate(&self, prompt: &str) -> Result<Generated, ProviderError> {
        let (model, content) = first_success(&MODELS, |m| self.complete(m, prompt)).await?;
        info!("Success with {} ({} chars)", model, content.len());
        Ok(Generated {
            content,
            model_used: model.name.to_string(),
        })
    }

    async fn complete(&self, model: &Model, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: model.id,
            messages: [
                Message { role: "system", content: SYSTEM_PROMPT },
                Message { role: "user", content: prompt },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let start = Instant::now();
        let resp = self
            .client
            .post(OPENROUTER_URL)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", "https://nichtagentur.github.io/when-to-go/")
            .header("X-Title", "When To Go Travel Blog")
            .json(&body)
            .send()
            .await
            .with_context(|| format!("{} request failed", model))?;

        let status = resp.status();
        let text = resp.text().await.context("Failed to read response body")?;
        debug!(
            "{} responded HTTP {} in {:.1}s ({} bytes)",
            model,
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            bail!("{} returned {}: {}", model, status, text);
        }
        let parsed: ChatResponse =
            serde_json::from_str(&text).with_context(|| format!("{} returned malformed JSON", model))?;
        accept_content(model, parsed)
    }
}

fn accept_content(model: &Model, resp: ChatResponse) -> Result<String> {
    let content = resp
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();
    let chars = content.chars().count();
    if chars < MIN_CONTENT_CHARS {
        return Err(anyhow!("{} returned insufficient content ({} chars)", model, chars));
    }
    Ok(content)
}
