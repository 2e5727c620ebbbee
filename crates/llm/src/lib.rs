use std::env;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

mod prompts;

pub use prompts::{math_prompt, page_reference, qa_prompt, summary_prompt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenProvider {
    Gemini,
    OpenAi,
    Anthropic,
    Local,
}

impl GenProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenProvider::Gemini => "gemini",
            GenProvider::OpenAi => "openai",
            GenProvider::Anthropic => "anthropic",
            GenProvider::Local => "local",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "gemini" => Some(GenProvider::Gemini),
            "openai" => Some(GenProvider::OpenAi),
            "anthropic" => Some(GenProvider::Anthropic),
            "local" => Some(GenProvider::Local),
            _ => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            GenProvider::Gemini => "gemini-2.5-flash",
            GenProvider::OpenAi => "gpt-4.1-mini",
            GenProvider::Anthropic => "claude-3-5-sonnet",
            GenProvider::Local => "local",
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Clone)]
pub struct GenAiClient {
    http: Client,
    provider: GenProvider,
    model: String,
    config: ProviderConfig,
}

#[derive(Clone)]
enum ProviderConfig {
    Gemini(GeminiConfig),
    OpenAi(OpenAiConfig),
    Anthropic(AnthropicConfig),
    Local,
}

#[derive(Clone)]
struct GeminiConfig {
    api_key: String,
}

#[derive(Clone)]
struct OpenAiConfig {
    api_key: String,
    base_url: String,
}

#[derive(Clone)]
struct AnthropicConfig {
    api_key: String,
    max_tokens: u32,
}

impl GenAiClient {
    pub fn new(provider: GenProvider, model: impl Into<String>) -> Result<Self> {
        let model = model.into();
        let http = Client::new();
        let config = match provider {
            GenProvider::Gemini => ProviderConfig::Gemini(GeminiConfig {
                api_key: read_api_key("GEMINI_API_KEY")?,
            }),
            GenProvider::OpenAi => ProviderConfig::OpenAi(OpenAiConfig {
                api_key: read_api_key("OPENAI_API_KEY")?,
                base_url: env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            }),
            GenProvider::Anthropic => ProviderConfig::Anthropic(AnthropicConfig {
                api_key: read_api_key("ANTHROPIC_API_KEY")?,
                max_tokens: env::var("ANTHROPIC_MAX_TOKENS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(512),
            }),
            GenProvider::Local => ProviderConfig::Local,
        };
        Ok(Self {
            http,
            provider,
            model,
            config,
        })
    }

    pub fn from_env() -> Result<Self> {
        let provider_name =
            env::var("DOCGENIUS_PROVIDER").unwrap_or_else(|_| "gemini".to_string());
        let provider = GenProvider::from_str(&provider_name)
            .ok_or_else(|| anyhow!(format!("unknown provider {provider_name}")))?;
        let model =
            env::var("DOCGENIUS_MODEL").unwrap_or_else(|_| provider.default_model().to_string());
        Self::new(provider, model)
    }

    pub fn local() -> Self {
        Self {
            http: Client::new(),
            provider: GenProvider::Local,
            model: "local".to_string(),
            config: ProviderConfig::Local,
        }
    }

    pub fn provider(&self) -> GenProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate_gemini(&self, cfg: &GeminiConfig, prompt: &str) -> Result<String> {
        let payload = json!({
            "contents": [
                {
                    "parts": [
                        {
                            "text": prompt
                        }
                    ]
                }
            ]
        });
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, cfg.api_key
        );
        let response = self
            .http
            .post(url)
            .json(&payload)
            .send()
            .await
            .with_context(|| "gemini request failed")?
            .error_for_status()
            .context("gemini returned an error")?
            .json::<GeminiResponse>()
            .await
            .context("failed to decode gemini response")?;
        response
            .candidates
            .and_then(|mut c| c.pop())
            .and_then(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .find_map(|part| part.text)
            })
            .ok_or_else(|| anyhow!("missing text in Gemini response"))
    }

    async fn generate_openai(&self, cfg: &OpenAiConfig, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", cfg.base_url.trim_end_matches('/'));
        let payload = json!({
            "model": self.model,
            "messages": [ { "role": "user", "content": prompt } ],
        });
        let response = self
            .http
            .post(&url)
            .bearer_auth(&cfg.api_key)
            .json(&payload)
            .send()
            .await
            .with_context(|| "openai request failed")?
            .error_for_status()
            .context("openai returned an error")?
            .json::<ChatResponse>()
            .await
            .context("failed to decode openai response")?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("missing text in OpenAI response"))
    }

    async fn generate_anthropic(&self, cfg: &AnthropicConfig, prompt: &str) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "max_tokens": cfg.max_tokens,
            "messages": [ { "role": "user", "content": prompt } ],
        });
        let response = self
            .http
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &cfg.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&payload)
            .send()
            .await
            .with_context(|| "anthropic request failed")?
            .error_for_status()
            .context("anthropic returned an error")?
            .json::<AnthropicResponse>()
            .await
            .context("failed to decode anthropic response")?;
        response
            .content
            .into_iter()
            .find_map(|part| part.text)
            .ok_or_else(|| anyhow!("missing text in Anthropic response"))
    }

    fn generate_local(&self, prompt: &str) -> String {
        synthesize_local_response(prompt)
    }
}

#[async_trait]
impl TextGenerator for GenAiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        match &self.config {
            ProviderConfig::Gemini(cfg) => self.generate_gemini(cfg, prompt).await,
            ProviderConfig::OpenAi(cfg) => self.generate_openai(cfg, prompt).await,
            ProviderConfig::Anthropic(cfg) => self.generate_anthropic(cfg, prompt).await,
            ProviderConfig::Local => Ok(self.generate_local(prompt)),
        }
    }
}

fn synthesize_local_response(prompt: &str) -> String {
    let lower = prompt.to_lowercase();
    if lower.contains("comprehensive summary") {
        let body = section_after(prompt, "Document content:");
        return format!(
            "<h2>Main Summary</h2><p>{}</p><h2>Key Points</h2><ul><li>{}</li></ul><h2>Important Points</h2><ul><li>Review the source document for full detail.</li></ul>",
            clip_words(&body, 80),
            clip_words(&body, 20)
        );
    }
    if lower.contains("expert document analyst") {
        let question = section_between(prompt, "Question:", "Document content:");
        let body = section_after(prompt, "Document content:");
        return format!(
            "<h2>Context</h2><p>Based on the document: {}</p><h2>Answer</h2><p>Regarding \"{}\": {}</p>",
            clip_words(&body, 60),
            question,
            clip_words(&body, 30)
        );
    }
    if lower.contains("expert mathematician") {
        let body = section_after(prompt, "Mathematical content to analyze and solve:");
        return format!(
            "<h2>Solution</h2><p>Step 1: identify the quantities stated in the text.</p><p>Step 2: work through them in order.</p><p>{}</p>",
            clip_words(&body, 60)
        );
    }
    clip_words(prompt, 40)
}

fn section_between(text: &str, start: &str, stop: &str) -> String {
    if let Some(idx) = text.find(start) {
        let after = &text[idx + start.len()..];
        if let Some(end) = after.find(stop) {
            return after[..end].trim().to_string();
        }
        return after.trim().to_string();
    }
    text.trim().to_string()
}

fn section_after(text: &str, start: &str) -> String {
    match text.find(start) {
        Some(idx) => text[idx + start.len()..].trim().to_string(),
        None => text.trim().to_string(),
    }
}

fn clip_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

fn read_api_key(var: &str) -> Result<String> {
    let value = env::var(var).map_err(|_| anyhow!(format!("{var} is not set")))?;
    validate_api_key(var, &value)?;
    Ok(value)
}

fn validate_api_key(var: &str, value: &str) -> Result<()> {
    if var.contains("OPENAI") && !value.starts_with("sk-") {
        return Err(anyhow!(format!(
            "{} must start with 'sk-' (see https://platform.openai.com/)",
            var
        )));
    }
    if var.contains("ANTHROPIC") && !value.starts_with("sk-ant-") {
        return Err(anyhow!(format!("{} must start with 'sk-ant-'", var)));
    }
    if var.contains("GEMINI") && !value.starts_with("AI") {
        return Err(anyhow!(format!(
            "{} must be a valid Gemini API key (starts with 'AI...')",
            var
        )));
    }
    Ok(())
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_round_trip() {
        for provider in [
            GenProvider::Gemini,
            GenProvider::OpenAi,
            GenProvider::Anthropic,
            GenProvider::Local,
        ] {
            assert_eq!(GenProvider::from_str(provider.as_str()), Some(provider));
        }
        assert_eq!(GenProvider::from_str("deepseek"), None);
        assert_eq!(GenProvider::Gemini.default_model(), "gemini-2.5-flash");
    }

    #[test]
    fn validate_api_key_checks_known_prefixes() {
        assert!(validate_api_key("GEMINI_API_KEY", "AIzaSyExample").is_ok());
        assert!(validate_api_key("GEMINI_API_KEY", "sk-oops").is_err());
        assert!(validate_api_key("OPENAI_API_KEY", "sk-abc").is_ok());
        assert!(validate_api_key("ANTHROPIC_API_KEY", "sk-abc").is_err());
    }

    #[tokio::test]
    async fn local_client_shapes_qa_answers() {
        let prompt = qa_prompt(
            "report.txt",
            "What is the revenue?",
            "Revenue grew 10% to $5M",
        );
        let answer = GenAiClient::local().generate(&prompt).await.unwrap();
        assert!(answer.contains("<h2>Context</h2>"));
        assert!(answer.contains("<h2>Answer</h2>"));
        assert!(answer.contains("What is the revenue?"));
        assert!(answer.contains("Revenue grew 10%"));
    }

    #[tokio::test]
    async fn local_client_shapes_summaries() {
        let prompt = summary_prompt("report.txt", "Quarterly revenue rose across regions.");
        let summary = GenAiClient::local().generate(&prompt).await.unwrap();
        assert!(summary.contains("<h2>Main Summary</h2>"));
        assert!(summary.contains("<h2>Key Points</h2>"));
        assert!(summary.contains("<h2>Important Points</h2>"));
        assert!(summary.contains("Quarterly revenue"));
    }

    #[test]
    fn section_between_pulls_marked_span() {
        let text = "intro Question: What changed? Document content: body";
        assert_eq!(
            section_between(text, "Question:", "Document content:"),
            "What changed?"
        );
        assert_eq!(section_after(text, "Document content:"), "body");
    }
}
