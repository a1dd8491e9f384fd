// Prompt constants for the compliance review call.

/// Role instruction; `llm_client::prompts::JSON_ONLY_SYSTEM` is appended at call time.
pub const REVIEW_SYSTEM: &str = "You are an HR compliance assistant for India. \
    You review employment documents for missing or risky clauses.";

/// Review prompt template. Replace `{document_label}` and `{document_text}` before sending.
pub const REVIEW_PROMPT_TEMPLATE: &str = r#"Check this {document_label} for missing or risky clauses.

Return ONLY a JSON object with these keys:
{
  "risk_score": 1-10 (integer, 10 = highest legal/compliance risk),
  "missing_clauses": ["clauses a document of this type should have but does not"],
  "weak_clauses": ["clauses that are present but vague, one-sided or unenforceable"],
  "suggested_text": ["replacement or additional wording, one entry per suggestion"]
}

Document:
{document_text}"#;
