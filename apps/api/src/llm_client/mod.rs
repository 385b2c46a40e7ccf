/// Completion client — the single point of entry for all Gemini API calls.
///
/// No other module talks to the upstream provider directly. Everything goes
/// through [`CompletionClient`], which also gives tests a seam to substitute
/// a scripted client.
///
/// Failures surface to the caller as-is: the service never retries on its
/// own, rate limits included. The caller resubmits.
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default generation model. Override with `GEMINI_MODEL`.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
/// Bound on a single completion call; a timeout surfaces as `LlmError::Http`.
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("completion contained no text")]
    EmptyContent,
}

/// Interface to the upstream generative text provider.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Submits a prompt and returns the raw completion text.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Enumerates upstream models usable for text generation.
    async fn list_generation_models(&self) -> Result<Vec<ModelInfo>, LlmError>;
}

/// One usable generation model, as reported by the provider.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub display_name: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, its parts concatenated.
    fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelEntry {
    name: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

impl From<ModelEntry> for ModelInfo {
    fn from(entry: ModelEntry) -> Self {
        // "models/gemini-1.5-flash" → "gemini-1.5-flash"
        let name = entry
            .name
            .split('/')
            .next_back()
            .unwrap_or(&entry.name)
            .to_string();
        ModelInfo {
            name,
            display_name: entry.display_name,
            description: entry.description.chars().take(200).collect(),
        }
    }
}

/// Keeps only models that support text generation, in provider order.
fn usable_models(listing: ListModelsResponse) -> Vec<ModelInfo> {
    listing
        .models
        .into_iter()
        .filter(|m| {
            m.supported_generation_methods
                .iter()
                .any(|method| method == "generateContent")
        })
        .map(ModelInfo::from)
        .collect()
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// Reqwest-backed [`CompletionClient`] over the Gemini REST API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            model,
        }
    }

    /// Converts a non-success response into `LlmError::Api`, pulling the
    /// provider's message out of the error body when it parses.
    async fn api_error(response: reqwest::Response) -> LlmError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GeminiError>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        LlmError::Api { status, message }
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let url = format!("{GEMINI_API_BASE}/models/{}:generateContent", self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let completion: GenerateContentResponse = response.json().await?;

        if let Some(usage) = &completion.usage_metadata {
            debug!(
                "completion succeeded: prompt_tokens={:?}, candidate_tokens={:?}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        completion.text().ok_or(LlmError::EmptyContent)
    }

    async fn list_generation_models(&self) -> Result<Vec<ModelInfo>, LlmError> {
        let response = self
            .client
            .get(format!("{GEMINI_API_BASE}/models"))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let listing: ListModelsResponse = response.json().await?;
        Ok(usable_models(listing))
    }
}

/// Result of model initialization, computed once at startup and shared with
/// the screening service and handlers via `AppState`.
#[derive(Clone)]
pub enum ModelState {
    Ready {
        name: String,
        client: Arc<dyn CompletionClient>,
    },
    Unavailable {
        reason: String,
    },
}

impl ModelState {
    /// Active model identifier, or `None` when the service is degraded.
    pub fn model_name(&self) -> Option<&str> {
        match self {
            ModelState::Ready { name, .. } => Some(name),
            ModelState::Unavailable { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ModelState::Ready { .. })
    }
}

/// Builds the model handle from configuration. A missing credential yields
/// `Unavailable` rather than an error: the process still serves requests,
/// and the screening endpoints answer with a structured error.
pub fn init_model(config: &Config) -> ModelState {
    match &config.gemini_api_key {
        Some(key) => {
            let name = config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string());
            ModelState::Ready {
                client: Arc::new(GeminiClient::new(key.clone(), name.clone())),
                name,
            }
        }
        None => ModelState::Unavailable {
            reason: "GEMINI_API_KEY is not set".to_string(),
        },
    }
}
