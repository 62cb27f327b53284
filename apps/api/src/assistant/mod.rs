//! Content assistant client — the single point of entry for all calls to the
//! external generation service.
//!
//! ARCHITECTURAL RULE: no other module talks to the assistant backend
//! directly. Everything goes through this client, which owns the timeout and
//! retry policy: every call is bounded, and a timed-out or 5xx call is
//! retried exactly once. Assistant failures are always recoverable — the
//! session keeps accepting manual edits regardless of what happens here.

pub mod prompts;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::normalize::normalize;
use crate::model::CVDocument;
use crate::assistant::prompts::PromptContext;

/// One automatic retry, never more.
const MAX_RETRIES: u32 = 1;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("Assistant call timed out")]
    Timeout,

    #[error("Assistant API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Assistant returned empty content")]
    EmptyContent,
}

impl From<reqwest::Error> for AssistantError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AssistantError::Timeout
        } else {
            AssistantError::Http(e)
        }
    }
}

impl AssistantError {
    fn is_retryable(&self) -> bool {
        match self {
            AssistantError::Timeout => true,
            AssistantError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequestBody<'a> {
    prompt: &'a str,
    section: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponseBody {
    content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Improvement {
    pub section: String,
    #[serde(alias = "suggestion")]
    pub message: String,
    pub priority: Priority,
}

/// The analysis shape. Read-only from the caller's perspective — analyzing a
/// document never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvAnalysis {
    pub score: u8,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<Improvement>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub missing_elements: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetJob {
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationAnalysis {
    pub score: u8,
    #[serde(default)]
    pub changes: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<Improvement>,
}

#[derive(Debug, Deserialize)]
struct OptimizeResponseBody {
    #[serde(rename = "optimizedCV", alias = "optimizedCv")]
    optimized_cv: serde_json::Value,
    analysis: OptimizationAnalysis,
}

/// A full replacement document plus the analysis behind it. Always presented
/// to the user as a preview — never auto-merged.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Optimization {
    pub optimized: CVDocument,
    pub analysis: OptimizationAnalysis,
}

#[derive(Clone)]
pub struct AssistantClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AssistantClient {
    pub fn new(base_url: String, api_key: String, timeout: std::time::Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
            api_key,
        }
    }

    /// Generates section text from a structured, pre-built prompt context.
    pub async fn generate(&self, context: &PromptContext) -> Result<String, AssistantError> {
        let body = GenerateRequestBody {
            prompt: &context.prompt,
            section: context.section_key(),
        };
        let response: GenerateResponseBody = self.post_json("/ai/generate-content", &body).await?;
        let content = response.content.trim();
        if content.is_empty() {
            return Err(AssistantError::EmptyContent);
        }
        Ok(content.to_string())
    }

    /// Scores the document and lists improvements. Pure from the caller's
    /// perspective; the document is passed by value on the wire only.
    pub async fn analyze(&self, doc: &CVDocument) -> Result<CvAnalysis, AssistantError> {
        self.post_json("/ai/analyze", &serde_json::json!({ "cvData": doc }))
            .await
    }

    /// Returns a full replacement document targeting a specific job. The
    /// optimized document is renormalized before anyone sees it, so a loose
    /// response shape can never leak past this boundary.
    pub async fn optimize_for_target(
        &self,
        doc: &CVDocument,
        target_job: &TargetJob,
    ) -> Result<Optimization, AssistantError> {
        let body = serde_json::json!({ "cvData": doc, "targetJob": target_job });
        let response: OptimizeResponseBody = self.post_json("/ai/optimize", &body).await?;
        Ok(Optimization {
            optimized: normalize(&response.optimized_cv),
            analysis: response.analysis,
        })
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AssistantError> {
        let url = format!("{}{}", self.base_url, path);
        let mut last_error: Option<AssistantError> = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                warn!("Assistant call to {path} failed, retrying once");
            }

            let result = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
                .await;

            let response = match result {
                Ok(r) => r,
                Err(e) => {
                    let e = AssistantError::from(e);
                    if e.is_retryable() {
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            };

            let status = response.status();
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                let e = AssistantError::Api {
                    status: status.as_u16(),
                    message,
                };
                if e.is_retryable() {
                    last_error = Some(e);
                    continue;
                }
                return Err(e);
            }

            let parsed: T = response.json().await.map_err(AssistantError::from)?;
            debug!("Assistant call to {path} succeeded");
            return Ok(parsed);
        }

        Err(last_error.unwrap_or(AssistantError::EmptyContent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AssistantError::Timeout.is_retryable());
        assert!(AssistantError::Api {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(AssistantError::Api {
            status: 429,
            message: String::new()
        }
        .is_retryable());
        assert!(!AssistantError::Api {
            status: 400,
            message: String::new()
        }
        .is_retryable());
        assert!(!AssistantError::EmptyContent.is_retryable());
    }

    #[test]
    fn test_improvement_accepts_suggestion_alias() {
        let json = serde_json::json!({
            "section": "Professional Summary",
            "suggestion": "Make it more specific",
            "priority": "high"
        });
        let improvement: Improvement = serde_json::from_value(json).unwrap();
        assert_eq!(improvement.message, "Make it more specific");
        assert_eq!(improvement.priority, Priority::High);
    }

    #[test]
    fn test_analysis_defaults_optional_lists() {
        let json = serde_json::json!({ "score": 75 });
        let analysis: CvAnalysis = serde_json::from_value(json).unwrap();
        assert_eq!(analysis.score, 75);
        assert!(analysis.improvements.is_empty());
        assert!(analysis.missing_elements.is_empty());
    }

    #[test]
    fn test_optimize_response_shape() {
        let json = serde_json::json!({
            "optimizedCV": { "personalInfo": { "firstName": "Ada" } },
            "analysis": { "score": 80, "changes": ["Enhanced summary"] }
        });
        let body: OptimizeResponseBody = serde_json::from_value(json).unwrap();
        assert_eq!(body.analysis.score, 80);
        let optimization = Optimization {
            optimized: normalize(&body.optimized_cv),
            analysis: body.analysis,
        };
        assert_eq!(optimization.optimized.personal_info.first_name, "Ada");
    }
}
