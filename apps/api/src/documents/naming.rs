//! Output filenames for generated letters.
//!
//! Format: `{prefix}_{subject}_{YYYYMMDDHHMMSS}_{suffix}.docx`. The timestamp
//! alone only separates requests a second apart, so callers add a random
//! suffix.

use chrono::NaiveDateTime;
use uuid::Uuid;

use super::DocumentType;

const SUFFIX_LEN: usize = 8;

/// Reduces an employee name to characters that are safe in a flat directory:
/// whitespace becomes `_`, anything outside `[A-Za-z0-9_.-]` is dropped and
/// leading dots are removed.
pub fn sanitize_subject(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('_'),
            c if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') => Some(c),
            _ => None,
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned.to_string()
    }
}

pub fn random_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..SUFFIX_LEN].to_string()
}

pub fn output_filename(
    document_type: DocumentType,
    employee_name: &str,
    at: NaiveDateTime,
    suffix: &str,
) -> String {
    format!(
        "{}_{}_{}_{}.docx",
        document_type.prefix(),
        sanitize_subject(employee_name),
        at.format("%Y%m%d%H%M%S"),
        suffix
    )
}

/// True for a bare file name that can only resolve inside the generated
/// directory: no separators, no parent references, no hidden files.
pub fn is_plain_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
}
