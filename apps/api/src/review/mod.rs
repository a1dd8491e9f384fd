//! Compliance review. Sends rendered letter text to the LLM and classifies
//! whatever comes back.
//!
//! A review never fails the request that asked for it: transport errors become
//! `ReviewResult::Failed`, unparseable replies become `ReviewResult::RawFallback`.
//!
//! `DocumentService` holds an `Arc<dyn Reviewer>`, so tests swap in a fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{strip_json_fences, LlmClient};

pub mod prompts;

use prompts::{REVIEW_PROMPT_TEMPLATE, REVIEW_SYSTEM};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Structured review as requested from the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReview {
    pub risk_score: u8, // 1..=10
    pub missing_clauses: Vec<String>,
    pub weak_clauses: Vec<String>,
    pub suggested_text: Vec<String>,
}

/// Outcome of a review call. Serialized with a `status` tag so clients can
/// branch without sniffing keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReviewResult {
    Parsed(ComplianceReview),
    RawFallback { raw_output: String },
    Failed { error: String },
}

/// Lenient wire shape: models sometimes send `7.0` or omit an empty list.
#[derive(Debug, Deserialize)]
struct WireReview {
    risk_score: f64,
    #[serde(default)]
    missing_clauses: Vec<String>,
    #[serde(default)]
    weak_clauses: Vec<String>,
    #[serde(default)]
    suggested_text: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait Reviewer: Send + Sync {
    /// Reviews `text`, a rendered document of kind `document_label`.
    async fn review(&self, document_label: &str, text: &str) -> ReviewResult;
}

// ────────────────────────────────────────────────────────────────────────────
// LlmReviewer
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmReviewer {
    llm: LlmClient,
}

impl LlmReviewer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Reviewer for LlmReviewer {
    async fn review(&self, document_label: &str, text: &str) -> ReviewResult {
        let prompt = build_review_prompt(document_label, text);
        let system = format!("{REVIEW_SYSTEM} {JSON_ONLY_SYSTEM}");

        match self.llm.call_text(&prompt, &system).await {
            Ok(reply) => interpret(&reply),
            Err(e) => {
                warn!("Compliance review for {document_label} failed: {e}");
                ReviewResult::Failed {
                    error: format!("AI check failed: {e}"),
                }
            }
        }
    }
}

fn build_review_prompt(document_label: &str, text: &str) -> String {
    REVIEW_PROMPT_TEMPLATE
        .replace("{document_label}", document_label)
        .replace("{document_text}", text)
}

/// Classifies a model reply. Anything that is not a review object is kept
/// verbatim as `RawFallback`.
pub fn interpret(reply: &str) -> ReviewResult {
    match serde_json::from_str::<WireReview>(strip_json_fences(reply)) {
        Ok(wire) => ReviewResult::Parsed(normalize(wire)),
        Err(e) => {
            warn!("Reviewer reply is not a review object ({e}); returning raw output");
            ReviewResult::RawFallback {
                raw_output: reply.to_string(),
            }
        }
    }
}

fn normalize(wire: WireReview) -> ComplianceReview {
    let score = wire.risk_score.round().clamp(1.0, 10.0);
    if score != wire.risk_score {
        warn!("Reviewer risk_score {} adjusted to {}", wire.risk_score, score);
    }
    ComplianceReview {
        risk_score: score as u8,
        missing_clauses: wire.missing_clauses,
        weak_clauses: wire.weak_clauses,
        suggested_text: wire.suggested_text,
    }
}
