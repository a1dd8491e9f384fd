use std::collections::BTreeMap;

use super::model::Document;

/// Token (e.g. `{EMPLOYEE_NAME}`) → replacement text.
pub type PlaceholderMap = BTreeMap<String, String>;

/// Replaces placeholder tokens in place and returns the number of replacements.
///
/// Paragraphs are visited body-first, then table cells row-major. A token is
/// only replaced where its whole text sits inside one run, between any tabs or
/// breaks of that run; a token whose characters are spread across runs (e.g.
/// bold applied mid-token) is left as is. Values are inserted verbatim and
/// never re-scanned for tokens.
pub fn substitute(document: &mut Document, mapping: &PlaceholderMap) -> usize {
    let mut replaced = 0;

    for paragraph in document.paragraphs_mut() {
        let text = paragraph.text();
        let present: Vec<(&str, &str)> = mapping
            .iter()
            .filter(|(token, _)| !token.is_empty() && text.contains(token.as_str()))
            .map(|(token, value)| (token.as_str(), value.as_str()))
            .collect();
        if present.is_empty() {
            continue;
        }

        for span in paragraph.runs.iter_mut().flat_map(|run| run.spans_mut()) {
            let (rewritten, hits) = replace_tokens(span.text(), &present);
            if hits > 0 {
                span.set_text(rewritten);
                replaced += hits;
            }
        }
    }

    replaced
}

/// Single left-to-right pass, so inserted values are never scanned again.
fn replace_tokens(text: &str, tokens: &[(&str, &str)]) -> (String, usize) {
    let mut out = String::with_capacity(text.len());
    let mut hits = 0;
    let mut rest = text;

    while let Some(ch) = rest.chars().next() {
        let matched = tokens
            .iter()
            .filter(|(token, _)| rest.starts_with(token))
            .max_by_key(|(token, _)| token.len());
        match matched {
            Some((token, value)) => {
                out.push_str(value);
                rest = &rest[token.len()..];
                hits += 1;
            }
            None => {
                out.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }

    (out, hits)
}

/// Plain text of the body paragraphs, one per line, skipping blank paragraphs.
/// Tabs and line breaks inside runs come through as `\t` and `\n`. Table
/// content is not included.
pub fn flatten(document: &Document) -> String {
    document
        .paragraphs
        .iter()
        .map(|p| p.text())
        .filter(|text| !text.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Folds each run into the preceding run when both carry identical formatting,
/// hold nothing but text, and nothing visible sits between them. The absorbed
/// run is left empty so the visible text is unchanged. Returns the number of
/// runs absorbed.
///
/// Running this before [`substitute`] lets tokens that Word split into several
/// identically formatted runs (spell-check and revision marks do this) match.
pub fn merge_adjacent_runs(document: &mut Document) -> usize {
    let mut absorbed = 0;

    for paragraph in document.paragraphs_mut() {
        let runs = &mut paragraph.runs;
        let mut anchor: Option<usize> = None;

        for i in 0..runs.len() {
            match anchor {
                Some(a) if runs[a].can_absorb(&runs[i]) => {
                    let text = runs[i].take_text();
                    if text.is_empty() {
                        continue;
                    }
                    runs[a].append_text(&text);
                    absorbed += 1;
                }
                _ => anchor = Some(i),
            }
        }
    }

    absorbed
}
