//! Document generation: orchestrates render → persist → review.
//!
//! Flow: load template → (merge runs) → substitute →
//!       persist → flatten → review → return response.
//!
//! The review is advisory. Once the file is written the request succeeds,
//! whatever the reviewer does.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use chrono::Local;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::documents::fields::EmployeeFields;
use crate::documents::naming::{is_plain_filename, output_filename, random_suffix};
use crate::documents::DocumentType;
use crate::errors::AppError;
use crate::render::{
    flatten, load_template, merge_adjacent_runs, persist, substitute, Document, PlaceholderMap,
};
use crate::review::{ReviewResult, Reviewer};

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub docx_file: String,
    pub ai_review: ReviewResult,
}

/// Renders letters from the templates directory into the generated directory.
/// The reviewer is injected so the service runs without network access in tests.
#[derive(Clone)]
pub struct DocumentService {
    templates_dir: PathBuf,
    generated_dir: PathBuf,
    merge_runs: bool,
    reviewer: Arc<dyn Reviewer>,
}

impl DocumentService {
    pub fn new(
        templates_dir: impl Into<PathBuf>,
        generated_dir: impl Into<PathBuf>,
        reviewer: Arc<dyn Reviewer>,
    ) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            generated_dir: generated_dir.into(),
            merge_runs: false,
            reviewer,
        }
    }

    /// Merge identically formatted adjacent runs before substitution.
    pub fn with_run_merging(mut self, enabled: bool) -> Self {
        self.merge_runs = enabled;
        self
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    /// Generates one letter and reviews it.
    ///
    /// Fails only if the template is missing or unreadable, or the output
    /// cannot be written. Reviewer problems are reported inside `ai_review`.
    pub async fn generate(
        &self,
        document_type: DocumentType,
        fields: &EmployeeFields,
    ) -> Result<GenerateResponse, AppError> {
        let template_path = self.templates_dir.join(document_type.template_file());
        let mut package = load_template(&template_path).await?;

        if self.merge_runs {
            let absorbed = merge_adjacent_runs(package.document_mut());
            debug!("Merged {absorbed} run(s) in {}", template_path.display());
        }

        let now = Local::now().naive_local();
        let mapping = fields.placeholders(now.date());
        let replaced = substitute(package.document_mut(), &mapping);

        let leftover = unresolved_tokens(package.document(), &mapping);
        if !leftover.is_empty() {
            warn!(
                "{} still contains placeholder(s) {:?}; they may be split across formatting runs",
                document_type.template_file(),
                leftover
            );
        }

        let filename = output_filename(document_type, &fields.employee_name, now, &random_suffix());
        persist(&package, &self.generated_dir, &filename).await?;
        info!("Generated {filename} ({replaced} placeholder(s) replaced)");

        let text = flatten(package.document());
        let ai_review = self.reviewer.review(document_type.label(), &text).await;
        if !matches!(ai_review, ReviewResult::Parsed(_)) {
            warn!("Compliance review for {filename} is degraded");
        }

        Ok(GenerateResponse {
            docx_file: filename,
            ai_review,
        })
    }

    /// Reads a previously generated file.
    pub async fn download(&self, filename: &str) -> Result<Bytes, AppError> {
        let not_found = || AppError::NotFound(format!("File {filename} not found"));

        if !is_plain_filename(filename) {
            return Err(not_found());
        }

        let path = self.generated_dir.join(filename);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Bytes::from(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(AppError::Storage(format!(
                "Could not read {}: {e}",
                path.display()
            ))),
        }
    }
}

/// Mapping keys that still occur anywhere in the rendered document.
fn unresolved_tokens<'a>(document: &Document, mapping: &'a PlaceholderMap) -> Vec<&'a str> {
    let text: String = document
        .paragraphs()
        .map(|p| p.text())
        .collect::<Vec<_>>()
        .join("\n");
    mapping
        .keys()
        .map(String::as_str)
        .filter(|token| text.contains(token))
        .collect()
}
