//! Screening service — orchestrates extract → prompt → complete → normalize
//! for one document, plus the sequential bulk variant.

pub mod extract;
pub mod handlers;
pub mod normalize;
pub mod prompts;

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::llm_client::ModelState;
use crate::screening::extract::TextExtractor;
use crate::screening::normalize::{normalize, Outcome};
use crate::screening::prompts::build_prompt;
use crate::usage::UsageTracker;

/// Resume text cap, in characters, to bound prompt size.
pub const MAX_RESUME_CHARS: usize = 3000;
/// Maximum documents accepted per bulk request.
pub const MAX_BATCH_SIZE: usize = 10;

/// Outcome list returned by `/bulk-screen`.
#[derive(Debug, Serialize)]
pub struct BulkScreenResponse {
    pub processed: usize,
    pub results: Vec<BulkScreenEntry>,
}

/// One per-document slot: the screening record, or the error body for
/// documents that failed.
#[derive(Debug, Serialize)]
pub struct BulkScreenEntry {
    pub filename: String,
    pub result: Value,
}

/// The screening orchestrator. Holds the model handle and the injected
/// collaborators; retains no per-request state.
pub struct Screener {
    model: ModelState,
    extractor: Box<dyn TextExtractor>,
    usage: Arc<dyn UsageTracker>,
}

impl Screener {
    pub fn new(
        model: ModelState,
        extractor: Box<dyn TextExtractor>,
        usage: Arc<dyn UsageTracker>,
    ) -> Self {
        Self {
            model,
            extractor,
            usage,
        }
    }

    /// Screens a single document: extract → truncate → prompt → complete →
    /// normalize. Extraction and upstream failures surface as errors without
    /// retry; malformed completions do not, the normalizer absorbs them.
    pub async fn screen_one(
        &self,
        document: &[u8],
        job_requirements: &str,
    ) -> Result<Map<String, Value>, AppError> {
        let (model_name, client) = match &self.model {
            ModelState::Ready { name, client } => (name.as_str(), client),
            ModelState::Unavailable { reason } => {
                return Err(AppError::ModelUnavailable(reason.clone()))
            }
        };

        let text = self
            .extractor
            .extract(document)
            .map_err(|e| AppError::Extraction(e.to_string()))?;
        let resume_text: String = text.chars().take(MAX_RESUME_CHARS).collect();
        debug!(
            "extracted {} chars, {} after truncation",
            text.chars().count(),
            resume_text.chars().count()
        );

        // Advisory: a tracker failure is logged and never blocks screening.
        match self.usage.track_request().await {
            Ok(tracked) => {
                if tracked.daily_count > 0 && tracked.daily_count % 100 == 0 {
                    info!(
                        "usage: {} requests today, last request cost ${:.5}",
                        tracked.daily_count, tracked.cost
                    );
                }
            }
            Err(e) => warn!("usage tracking failed: {e:#}"),
        }

        let prompt = build_prompt(&resume_text, job_requirements);
        let raw = client
            .complete(&prompt)
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        let normalized = normalize(&raw);
        match &normalized.outcome {
            Outcome::Parsed => debug!("model {model_name} returned a complete record"),
            Outcome::ParsedWithDefaults(missing) => {
                warn!("completion missing fields {missing:?}; defaults substituted")
            }
            Outcome::Fallback => {
                warn!("completion was not parseable JSON; fallback record returned")
            }
        }

        Ok(normalized.result)
    }

    /// Screens up to [`MAX_BATCH_SIZE`] documents strictly sequentially,
    /// recording each outcome in input order. A failing document occupies
    /// its slot with the error body; the batch keeps going.
    pub async fn screen_batch(
        &self,
        documents: Vec<(String, Bytes)>,
        job_requirements: &str,
    ) -> Result<BulkScreenResponse, AppError> {
        if documents.len() > MAX_BATCH_SIZE {
            return Err(AppError::BatchSize(documents.len()));
        }

        let mut results = Vec::with_capacity(documents.len());
        for (filename, document) in documents {
            let result = match self.screen_one(&document, job_requirements).await {
                Ok(record) => Value::Object(record),
                Err(e) => {
                    warn!("screening {filename} failed: {e}");
                    e.to_body()
                }
            };
            results.push(BulkScreenEntry { filename, result });
        }

        Ok(BulkScreenResponse {
            processed: results.len(),
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{CompletionClient, LlmError, ModelInfo};
    use crate::screening::extract::ExtractionError;
    use crate::usage::{NoopUsageTracker, TrackedRequest};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const COMPLETE_JSON: &str = r#"{"score": 8, "summary": "Solid candidate. Ship-ready.",
        "strengths": ["Rust"], "concerns": [], "match_percentage": 80}"#;

    /// Extractor stub: documents starting with "bad" fail, anything else
    /// becomes its UTF-8 text.
    struct StubExtractor {
        calls: Arc<AtomicUsize>,
    }

    impl TextExtractor for StubExtractor {
        fn extract(&self, document: &[u8]) -> Result<String, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if document.starts_with(b"bad") {
                return Err(ExtractionError("unreadable document".to_string()));
            }
            Ok(String::from_utf8_lossy(document).into_owned())
        }
    }

    /// Completion stub: records every prompt, returns a canned completion.
    struct StubClient {
        completion: Result<String, ()>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl CompletionClient for StubClient {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.completion {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(LlmError::Api {
                    status: 429,
                    message: "rate limited".to_string(),
                }),
            }
        }

        async fn list_generation_models(&self) -> Result<Vec<ModelInfo>, LlmError> {
            Ok(vec![])
        }
    }

    struct Harness {
        screener: Screener,
        prompts: Arc<Mutex<Vec<String>>>,
        extractor_calls: Arc<AtomicUsize>,
    }

    fn harness_with(completion: Result<String, ()>) -> Harness {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::new(AtomicUsize::new(0));
        let model = ModelState::Ready {
            name: "stub-model".to_string(),
            client: Arc::new(StubClient {
                completion,
                prompts: prompts.clone(),
            }),
        };
        Harness {
            screener: Screener::new(
                model,
                Box::new(StubExtractor {
                    calls: calls.clone(),
                }),
                Arc::new(NoopUsageTracker),
            ),
            prompts,
            extractor_calls: calls,
        }
    }

    fn harness() -> Harness {
        harness_with(Ok(COMPLETE_JSON.to_string()))
    }

    fn unavailable_screener() -> Harness {
        let calls = Arc::new(AtomicUsize::new(0));
        Harness {
            screener: Screener::new(
                ModelState::Unavailable {
                    reason: "GEMINI_API_KEY is not set".to_string(),
                },
                Box::new(StubExtractor {
                    calls: calls.clone(),
                }),
                Arc::new(NoopUsageTracker),
            ),
            prompts: Arc::new(Mutex::new(Vec::new())),
            extractor_calls: calls,
        }
    }

    #[tokio::test]
    async fn test_screen_one_returns_normalized_record() {
        let h = harness();
        let record = h.screener.screen_one(b"resume text", "Rust role").await.unwrap();
        assert_eq!(record["score"], serde_json::json!(8));
        assert_eq!(record["match_percentage"], serde_json::json!(80));
    }

    #[tokio::test]
    async fn test_empty_extracted_text_still_screens() {
        let h = harness();
        let record = h.screener.screen_one(b"", "").await.unwrap();
        assert_eq!(record["score"], serde_json::json!(8));

        let prompts = h.prompts.lock().unwrap();
        assert!(prompts[0].contains("Resume: \n"));
    }

    #[tokio::test]
    async fn test_screen_one_without_model_errors_before_extraction() {
        let h = unavailable_screener();
        let err = h.screener.screen_one(b"resume", "").await.unwrap_err();
        assert!(matches!(err, AppError::ModelUnavailable(_)));
        assert_eq!(h.extractor_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_extraction_failure_surfaces_as_error() {
        let h = harness();
        let err = h.screener.screen_one(b"bad document", "").await.unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
        assert!(h.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failure_surfaces_as_error() {
        let h = harness_with(Err(()));
        let err = h.screener.screen_one(b"resume", "").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_malformed_completion_is_absorbed_not_an_error() {
        let h = harness_with(Ok("I cannot produce JSON today.".to_string()));
        let record = h.screener.screen_one(b"resume", "").await.unwrap();
        assert_eq!(record["score"], serde_json::json!(5));
        assert!(record.contains_key("raw_response"));
    }

    #[tokio::test]
    async fn test_resume_text_truncated_to_first_3000_chars() {
        let h = harness();
        let document = format!("{}OVERFLOW", "x".repeat(MAX_RESUME_CHARS));
        h.screener.screen_one(document.as_bytes(), "").await.unwrap();

        let prompts = h.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(&"x".repeat(MAX_RESUME_CHARS)));
        assert!(!prompts[0].contains("OVERFLOW"));
    }

    #[tokio::test]
    async fn test_truncation_counts_chars_not_bytes() {
        let h = harness();
        let document = "é".repeat(MAX_RESUME_CHARS + 500);
        h.screener.screen_one(document.as_bytes(), "").await.unwrap();

        let prompts = h.prompts.lock().unwrap();
        assert!(prompts[0].contains(&"é".repeat(MAX_RESUME_CHARS)));
        assert!(!prompts[0].contains(&"é".repeat(MAX_RESUME_CHARS + 1)));
    }

    #[tokio::test]
    async fn test_usage_tracker_failure_never_blocks_screening() {
        struct FailingTracker;

        #[async_trait]
        impl crate::usage::UsageTracker for FailingTracker {
            async fn track_request(&self) -> anyhow::Result<TrackedRequest> {
                anyhow::bail!("disk full")
            }
        }

        let prompts = Arc::new(Mutex::new(Vec::new()));
        let screener = Screener::new(
            ModelState::Ready {
                name: "stub-model".to_string(),
                client: Arc::new(StubClient {
                    completion: Ok(COMPLETE_JSON.to_string()),
                    prompts: prompts.clone(),
                }),
            },
            Box::new(StubExtractor {
                calls: Arc::new(AtomicUsize::new(0)),
            }),
            Arc::new(FailingTracker),
        );

        assert!(screener.screen_one(b"resume", "").await.is_ok());
    }

    #[tokio::test]
    async fn test_batch_over_cap_rejected_before_any_work() {
        let h = harness();
        let documents: Vec<(String, Bytes)> = (0..11)
            .map(|i| (format!("resume-{i}.pdf"), Bytes::from_static(b"resume")))
            .collect();

        let err = h.screener.screen_batch(documents, "").await.unwrap_err();
        assert!(matches!(err, AppError::BatchSize(11)));
        assert_eq!(h.extractor_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_batch_at_cap_is_accepted() {
        let h = harness();
        let documents: Vec<(String, Bytes)> = (0..MAX_BATCH_SIZE)
            .map(|i| (format!("resume-{i}.pdf"), Bytes::from_static(b"resume")))
            .collect();

        let response = h.screener.screen_batch(documents, "").await.unwrap();
        assert_eq!(response.processed, MAX_BATCH_SIZE);
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_isolates_failures() {
        let h = harness();
        let documents = vec![
            ("a.pdf".to_string(), Bytes::from_static(b"resume a")),
            ("b.pdf".to_string(), Bytes::from_static(b"bad bytes")),
            ("c.pdf".to_string(), Bytes::from_static(b"resume c")),
        ];

        let response = h.screener.screen_batch(documents, "").await.unwrap();
        assert_eq!(response.processed, 3);

        let names: Vec<&str> = response.results.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf", "c.pdf"]);

        assert!(response.results[0].result.get("score").is_some());
        assert!(response.results[1].result.get("error").is_some());
        assert!(response.results[2].result.get("score").is_some());
    }
}
