pub mod material;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::pr::PullRequest;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// System prompt asking the model for a reviewer-oriented PR digest as JSON.
const PR_SUMMARY_PROMPT: &str = r#"Act as a Code Reviewer Assistant. I want you to provide some information about the below Pull Request (PR) to help reviewers understand it better and review it faster.

The items I want you to provide are:
- Describe the changes of this PR and its objective.
- Categorize this PR into one of the following types: Feature, Fix, Refactor, Perf, Doc, Test, Ci, Style, Housekeeping
- If it's a feature/refactor PR, list the important change files which you believe contain the major logical changes of this PR.

Respond with a single JSON object with these fields:
  "changes_description": brief summary of the changes and their objective
  "pr_category": one of the categories above
  "important_changes": list of important file descriptions (may be empty)
  "objective": the objective of the PR
  "bugs": potential bugs the reviewer should pay attention to, or null
  "errors": discovered errors that will cause code to fail, or null"#;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Completion API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("Completion API returned no choices")]
    EmptyResponse,
}

/// Structured review summary as produced by the completion service.
#[derive(Debug, Clone, Deserialize)]
pub struct PrSummary {
    /// Brief summary of the changes and their objective
    pub changes_description: String,
    /// Category such as Feature, Fix, Refactor, ...
    pub pr_category: String,
    /// Files (described in prose) carrying the major logical changes
    #[serde(default)]
    pub important_changes: Vec<String>,
    /// The objective of the PR
    pub objective: String,
    /// Potential bugs worth reviewer attention
    #[serde(default)]
    pub bugs: Option<String>,
    /// Discovered errors that will cause code to fail
    #[serde(default)]
    pub errors: Option<String>,
}

/// Outcome of one summarization call. Structured parse failure is an explicit
/// variant, never silently collapsed into the parsed path: callers can tell
/// "parse succeeded" from "fell back to raw text".
#[derive(Debug, Clone)]
pub enum SummaryOutcome {
    Parsed(PrSummary),
    Raw(String),
}

/// Seam to the completion service, mockable in tests.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize a PR given the rendered change-files material and metadata.
    async fn summarize(&self, pr: &PullRequest) -> Result<SummaryOutcome, SummaryError>;
}

/// Summarizer backed by the OpenAI chat-completions API.
pub struct OpenAiSummarizer {
    http: reqwest::Client,
    api_key: String,
    model: String,
    api_url: String,
}

impl OpenAiSummarizer {
    pub fn new(api_key: String, model: String) -> OpenAiSummarizer {
        OpenAiSummarizer {
            http: reqwest::Client::new(),
            api_key,
            model,
            api_url: OPENAI_CHAT_URL.to_string(),
        }
    }
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

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    #[instrument(skip(self, pr), fields(pr = pr.number, model = %self.model))]
    async fn summarize(&self, pr: &PullRequest) -> Result<SummaryOutcome, SummaryError> {
        let change_files = material::change_files_material(&pr.change_files);
        let metadata = material::pr_metadata_material(pr);

        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": PR_SUMMARY_PROMPT},
                {
                    "role": "user",
                    "content": format!(
                        "{}\n\nHere are the file changes to analyze:\n{}",
                        metadata, change_files
                    ),
                },
            ],
        });

        debug!(material_bytes = change_files.len(), "requesting PR summary");
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        let text = response
            .choices
            .into_iter()
            .next()
            .ok_or(SummaryError::EmptyResponse)?
            .message
            .content;
        debug!(response_bytes = text.len(), "received completion");

        Ok(parse_summary_output(&text))
    }
}

/// Parse the model's reply into a PrSummary, falling back to the raw text
/// when it is not the requested JSON. Models often wrap JSON in a markdown
/// code fence; strip one before parsing.
pub fn parse_summary_output(text: &str) -> SummaryOutcome {
    let candidate = strip_code_fence(text);
    match serde_json::from_str::<PrSummary>(candidate) {
        Ok(summary) => SummaryOutcome::Parsed(summary),
        Err(err) => {
            warn!(error = %err, "summary output is not structured, keeping raw text");
            SummaryOutcome::Raw(text.to_string())
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the fence line ("```json").
    match body.split_once('\n') {
        Some((_tag, inner)) => inner.trim(),
        None => body.trim(),
    }
}
