//! Analysis Client: profile in, validated SWOT result out.
//!
//! Flow: precondition on `content` → system prompt from the profile's
//! structured fields → one schema-constrained model call → explicit
//! validation of the returned JSON.

pub mod prompts;

use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::{LlmError, SwotModel};
use crate::models::analysis::{AnalysisResult, SchemaError};
use crate::models::profile::Profile;

use self::prompts::build_system_prompt;

/// Shown to the user for every model-side failure.
pub const ANALYSIS_FAILED_MESSAGE: &str = "Analysis failed. Ensure your API key is set.";
pub const NO_INPUT_MESSAGE: &str = "Please provide text or upload a document to analyze.";

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{}", NO_INPUT_MESSAGE)]
    NoInput,

    #[error("{}", ANALYSIS_FAILED_MESSAGE)]
    Model(#[from] LlmError),

    #[error("{}", ANALYSIS_FAILED_MESSAGE)]
    Schema(#[from] SchemaError),
}

/// Runs one SWOT analysis for `profile`.
///
/// Empty or whitespace-only content fails before the model is contacted.
pub async fn analyze(
    profile: &Profile,
    model: &dyn SwotModel,
) -> Result<AnalysisResult, AnalysisError> {
    let content = profile.content.trim();
    if content.is_empty() {
        return Err(AnalysisError::NoInput);
    }

    let system = build_system_prompt(profile);
    info!(
        "Running {} analysis on {} chars of input",
        profile.mode(),
        content.len()
    );

    let text = model.generate_json(&system, content).await.map_err(|e| {
        warn!("Model call failed: {e}");
        AnalysisError::Model(e)
    })?;

    let result = AnalysisResult::from_model_json(&text).map_err(|e| {
        warn!("Model returned an invalid analysis payload: {e}");
        AnalysisError::Schema(e)
    })?;

    for (category, count) in result.off_count_categories() {
        warn!("Model returned {count} {category}; displaying as-is");
    }

    Ok(result)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::models::profile::Mode;

    /// Scripted model: returns `reply` and records every call.
    pub(crate) struct StubModel {
        pub reply: Result<String, u16>,
        pub calls: AtomicUsize,
        pub last: Mutex<Option<(String, String)>>,
    }

    impl StubModel {
        pub(crate) fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
            }
        }

        pub(crate) fn failing(status: u16) -> Self {
            Self {
                reply: Err(status),
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SwotModel for StubModel {
        async fn generate_json(&self, system: &str, content: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some((system.to_string(), content.to_string()));
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(LlmError::Api {
                    status: *status,
                    message: "stubbed failure".to_string(),
                }),
            }
        }
    }

    pub(crate) fn payload(counts: [usize; 4]) -> String {
        let items = |prefix: &str, n: usize| -> Vec<String> {
            (1..=n).map(|i| format!("{prefix} {i}")).collect()
        };
        serde_json::json!({
            "strengths": items("S", counts[0]),
            "weaknesses": items("W", counts[1]),
            "opportunities": items("O", counts[2]),
            "threats": items("T", counts[3]),
            "summary": "Overall position is solid."
        })
        .to_string()
    }

    fn profile_with(content: &str) -> Profile {
        let mut p = Profile::empty(Mode::Individual);
        p.set_field("role", "PM".into()).unwrap();
        p.set_field("content", content.into()).unwrap();
        p
    }

    #[tokio::test]
    async fn test_empty_content_never_calls_model() {
        let model = StubModel::replying(&payload([6, 6, 6, 6]));
        for content in ["", "   ", "\n\t  \n"] {
            let err = analyze(&profile_with(content), &model).await.unwrap_err();
            assert!(matches!(err, AnalysisError::NoInput));
            assert_eq!(err.to_string(), NO_INPUT_MESSAGE);
        }
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_trimmed_content_sent_separately_from_instruction() {
        let model = StubModel::replying(&payload([6, 7, 6, 7]));
        let result = analyze(&profile_with("  ten years in product  \n"), &model)
            .await
            .unwrap();
        assert_eq!(result.weaknesses.len(), 7);

        let (system, content) = model.last.lock().unwrap().clone().unwrap();
        assert_eq!(content, "ten years in product");
        assert!(system.contains("Context: PM () in . Goal: "));
        assert!(!system.contains("ten years"));
    }

    #[tokio::test]
    async fn test_off_count_results_are_kept() {
        let model = StubModel::replying(&payload([2, 9, 0, 6]));
        let result = analyze(&profile_with("x"), &model).await.unwrap();
        assert_eq!(result.strengths.len(), 2);
        assert_eq!(result.weaknesses.len(), 9);
        assert!(result.opportunities.is_empty());
    }

    #[tokio::test]
    async fn test_http_failure_maps_to_analysis_failed() {
        let model = StubModel::failing(403);
        let err = analyze(&profile_with("x"), &model).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Model(LlmError::Api { status: 403, .. })));
        assert_eq!(err.to_string(), ANALYSIS_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_malformed_payload_maps_to_analysis_failed() {
        let model = StubModel::replying("{\"strengths\": [\"cut off");
        let err = analyze(&profile_with("x"), &model).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Schema(_)));
        assert_eq!(err.to_string(), ANALYSIS_FAILED_MESSAGE);
    }
}
