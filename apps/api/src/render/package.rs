//! `.docx` package handling: reads `word/document.xml` out of the zip container,
//! indexes its paragraphs, runs and tables into a [`Document`], and writes edited
//! run text back into an otherwise untouched copy of the package.
//!
//! Only direct children are indexed, the same way Word's object model exposes
//! them: `w:p` under `w:body`, top-level `w:tbl` → `w:tr` → `w:tc` → `w:p`, and
//! `w:r` → `w:t` / `w:tab` / `w:br` under those paragraphs. Nested tables, text
//! boxes, hyperlinks and content controls pass through verbatim.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::model::{Cell, Document, Paragraph, Row, Run, Segment, Table, TextSlot, TextSpan};
use super::RenderError;

/// Path of the main document part inside a WordprocessingML package.
pub const DOCUMENT_PART: &str = "word/document.xml";

const W_BODY: &[u8] = b"w:body";
const W_TBL: &[u8] = b"w:tbl";
const W_TR: &[u8] = b"w:tr";
const W_TC: &[u8] = b"w:tc";
const W_P: &[u8] = b"w:p";
const W_R: &[u8] = b"w:r";
const W_RPR: &[u8] = b"w:rPr";
const W_T: &[u8] = b"w:t";
const W_TAB: &[u8] = b"w:tab";
const W_BR: &[u8] = b"w:br";
const W_CR: &[u8] = b"w:cr";

/// Paragraph-level markup that renders nothing, so runs on either side of it
/// still count as adjacent.
const INVISIBLE: &[&[u8]] = &[b"w:proofErr", b"w:bookmarkStart", b"w:bookmarkEnd"];

/// A loaded template: the raw archive, the main part as an event stream, and
/// the indexed document body.
pub struct Package {
    archive: Vec<u8>,
    events: Vec<Event<'static>>,
    document: Document,
}

impl Package {
    pub fn from_bytes(archive: Vec<u8>) -> Result<Self, RenderError> {
        let xml = read_part(&archive, DOCUMENT_PART)?;
        let (events, document) = parse_body(&xml)?;
        Ok(Self {
            archive,
            events,
            document,
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Serializes the package with the current run text. Every part other
    /// than the main document is copied byte-for-byte.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RenderError> {
        let xml = self.write_body()?;

        let mut source = ZipArchive::new(Cursor::new(self.archive.as_slice()))?;
        let mut out = ZipWriter::new(Cursor::new(Vec::with_capacity(self.archive.len())));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for i in 0..source.len() {
            let entry = source.by_index(i)?;
            if entry.name() == DOCUMENT_PART {
                out.start_file(DOCUMENT_PART, options)?;
                out.write_all(&xml)?;
            } else {
                out.raw_copy_file(entry)?;
            }
        }

        Ok(out.finish()?.into_inner())
    }

    fn write_body(&self) -> Result<Vec<u8>, RenderError> {
        let mut overrides: HashMap<usize, Event<'static>> = HashMap::new();

        let modified = self
            .document
            .runs()
            .flat_map(|run| run.spans())
            .filter(|span| span.is_modified());
        for span in modified {
            let Some((first, rest)) = span.slots().split_first() else {
                continue;
            };
            if let Some(Event::Start(start)) = self.events.get(first.start) {
                overrides.insert(first.start, Event::Start(preserve_space(start)));
            }
            overrides.insert(first.text, text_event(span.text()));
            for slot in rest {
                overrides.insert(slot.text, text_event(""));
            }
        }

        let mut writer = Writer::new(Vec::with_capacity(self.events.len() * 16));
        for (i, event) in self.events.iter().enumerate() {
            writer.write_event(overrides.get(&i).unwrap_or(event))?;
        }
        Ok(writer.into_inner())
    }
}

fn read_part(archive: &[u8], name: &str) -> Result<Vec<u8>, RenderError> {
    let mut zip = ZipArchive::new(Cursor::new(archive))?;
    let mut part = match zip.by_name(name) {
        Ok(part) => part,
        Err(ZipError::FileNotFound) => return Err(RenderError::MissingPart(name.to_string())),
        Err(e) => return Err(e.into()),
    };
    let mut xml = Vec::with_capacity(part.size() as usize);
    part.read_to_end(&mut xml)?;
    Ok(xml)
}

fn text_event(text: &str) -> Event<'static> {
    Event::Text(BytesText::new(text).into_owned())
}

/// Rewritten `<w:t>` elements may start or end with spaces, which Word drops
/// unless the element opts out of whitespace collapsing.
fn preserve_space(start: &BytesStart) -> BytesStart<'static> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);
    out.extend_attributes(
        start
            .attributes()
            .flatten()
            .filter(|a| a.key.as_ref() != b"xml:space"),
    );
    out.push_attribute(("xml:space", "preserve"));
    out
}

fn lossy(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

// ────────────────────────────────────────────────────────────────────────────
// Body parser
// ────────────────────────────────────────────────────────────────────────────

/// What an open element means to the indexer. Anything not tracked is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Body,
    Table,
    Row,
    Cell,
    Paragraph,
    Run,
    RunProps,
    Text,
    Other,
}

struct OpenParagraph {
    paragraph: Paragraph,
    in_cell: bool,
    /// Only invisible markup seen since the last run closed.
    gap_clean: bool,
}

struct OpenRun {
    segments: Vec<Segment>,
    props: String,
    text_only: bool,
    adjacent: bool,
}

impl OpenRun {
    /// Consecutive `<w:t>` elements share one span.
    fn push_text(&mut self, text: &str, slot: TextSlot) {
        match self.segments.last_mut() {
            Some(Segment::Text(span)) => span.extend(text, slot),
            _ => self
                .segments
                .push(Segment::Text(TextSpan::parsed(text.to_string(), slot))),
        }
    }
}

struct OpenText {
    start: usize,
    buf: String,
}

#[derive(Default)]
struct BodyParser {
    events: Vec<Event<'static>>,
    document: Document,
    stack: Vec<Scope>,
    paragraph: Option<OpenParagraph>,
    run: Option<OpenRun>,
    text: Option<OpenText>,
}

pub(crate) fn parse_body(xml: &[u8]) -> Result<(Vec<Event<'static>>, Document), RenderError> {
    let mut reader = Reader::from_reader(xml);
    let mut parser = BodyParser::default();
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf)?.into_owned();
        buf.clear();
        match event {
            Event::Eof => break,
            Event::Start(start) => parser.open(start),
            Event::Empty(empty) => parser.empty(empty),
            Event::End(end) => parser.close(end)?,
            Event::Text(text) => parser.text(text)?,
            Event::CData(data) => parser.cdata(data),
            other => parser.events.push(other),
        }
    }

    if !parser.stack.is_empty() {
        return Err(RenderError::Malformed(format!(
            "{} element(s) left open at end of document",
            parser.stack.len()
        )));
    }

    Ok((parser.events, parser.document))
}

impl BodyParser {
    fn parent(&self) -> Option<Scope> {
        self.stack.last().copied()
    }

    fn in_props(&self) -> bool {
        self.stack.contains(&Scope::RunProps)
    }

    fn current_cell(&mut self) -> Option<&mut Cell> {
        self.document
            .tables
            .last_mut()?
            .rows
            .last_mut()?
            .cells
            .last_mut()
    }

    fn mark_mixed(&mut self) {
        if let Some(run) = self.run.as_mut() {
            run.text_only = false;
        }
    }

    /// Paragraph-level markup between runs. Anything visible, such as a
    /// hyperlink or a tracked insertion, breaks adjacency.
    fn note_gap(&mut self, name: &[u8]) {
        if self.run.is_some() || INVISIBLE.contains(&name) {
            return;
        }
        if let Some(open) = self.paragraph.as_mut() {
            open.gap_clean = false;
        }
    }

    fn record_props(&mut self, raw: &str) {
        if let Some(run) = self.run.as_mut() {
            run.props.push('<');
            run.props.push_str(raw);
            run.props.push('>');
        }
    }

    fn open(&mut self, start: BytesStart<'static>) {
        let scope = match (start.name().as_ref(), self.parent()) {
            (W_BODY, _) => Scope::Body,
            (W_TBL, Some(Scope::Body)) => {
                self.document.tables.push(Table::default());
                Scope::Table
            }
            (W_TR, Some(Scope::Table)) => {
                if let Some(table) = self.document.tables.last_mut() {
                    table.rows.push(Row::default());
                }
                Scope::Row
            }
            (W_TC, Some(Scope::Row)) => {
                if let Some(row) = self
                    .document
                    .tables
                    .last_mut()
                    .and_then(|t| t.rows.last_mut())
                {
                    row.cells.push(Cell::default());
                }
                Scope::Cell
            }
            (W_P, Some(parent @ (Scope::Body | Scope::Cell))) => {
                self.paragraph = Some(OpenParagraph {
                    paragraph: Paragraph::default(),
                    in_cell: parent == Scope::Cell,
                    gap_clean: true,
                });
                Scope::Paragraph
            }
            (W_R, Some(Scope::Paragraph)) => {
                let adjacent = self.paragraph.as_ref().is_some_and(|p| p.gap_clean);
                self.run = Some(OpenRun {
                    segments: Vec::new(),
                    props: String::new(),
                    text_only: true,
                    adjacent,
                });
                Scope::Run
            }
            (W_RPR, Some(Scope::Run)) => Scope::RunProps,
            (W_T, Some(Scope::Run)) => {
                self.text = Some(OpenText {
                    start: self.events.len(),
                    buf: String::new(),
                });
                Scope::Text
            }
            (_, Some(Scope::Run)) => {
                self.mark_mixed();
                Scope::Other
            }
            _ => {
                if self.in_props() {
                    self.record_props(&lossy(&start));
                } else {
                    self.note_gap(start.name().as_ref());
                }
                Scope::Other
            }
        };

        self.stack.push(scope);
        self.events.push(Event::Start(start));
    }

    fn empty(&mut self, empty: BytesStart<'static>) {
        let name = empty.name().as_ref().to_vec();
        match (name.as_slice(), self.parent()) {
            (W_P, Some(Scope::Body)) => self.document.paragraphs.push(Paragraph::default()),
            (W_P, Some(Scope::Cell)) => {
                if let Some(cell) = self.current_cell() {
                    cell.paragraphs.push(Paragraph::default());
                }
            }
            (W_T, Some(Scope::Run)) => {
                // Expand `<w:t/>` so the run has a text node to write into.
                let name = lossy(&name).into_owned();
                let start = self.events.len();
                self.events.push(Event::Start(empty));
                let text = self.events.len();
                self.events.push(text_event(""));
                self.events.push(Event::End(BytesEnd::new(name)));
                if let Some(run) = self.run.as_mut() {
                    run.push_text("", TextSlot { start, text });
                }
                return;
            }
            (W_RPR, Some(Scope::Run)) => {}
            (W_TAB, Some(Scope::Run)) => self.push_marker(Segment::Tab),
            (W_BR | W_CR, Some(Scope::Run)) => self.push_marker(Segment::Break),
            (_, Some(Scope::Run)) => self.mark_mixed(),
            _ => {
                if self.in_props() {
                    let raw = format!("{}/", lossy(&empty));
                    self.record_props(&raw);
                } else {
                    self.note_gap(&name);
                }
            }
        }

        self.events.push(Event::Empty(empty));
    }

    fn close(&mut self, end: BytesEnd<'static>) -> Result<(), RenderError> {
        let scope = self.stack.pop().ok_or_else(|| {
            RenderError::Malformed(format!(
                "unexpected closing tag </{}>",
                lossy(end.name().as_ref())
            ))
        })?;

        match scope {
            Scope::Text => self.finish_text(),
            Scope::Run => self.finish_run(),
            Scope::Paragraph => self.finish_paragraph(),
            Scope::Other if self.in_props() => {
                let raw = format!("/{}", lossy(end.name().as_ref()));
                self.record_props(&raw);
            }
            Scope::Other => self.note_gap(end.name().as_ref()),
            _ => {}
        }

        self.events.push(Event::End(end));
        Ok(())
    }

    fn text(&mut self, text: BytesText<'static>) -> Result<(), RenderError> {
        match self.text.as_mut() {
            Some(open) if self.stack.last() == Some(&Scope::Text) => {
                open.buf.push_str(&text.unescape()?);
            }
            _ => {
                if text.iter().any(|b| !b.is_ascii_whitespace()) {
                    self.note_gap(b"#text");
                }
                self.events.push(Event::Text(text));
            }
        }
        Ok(())
    }

    fn cdata(&mut self, data: BytesCData<'static>) {
        match self.text.as_mut() {
            Some(open) if self.stack.last() == Some(&Scope::Text) => {
                open.buf.push_str(&lossy(&data));
            }
            _ => self.events.push(Event::CData(data)),
        }
    }

    fn finish_text(&mut self) {
        let Some(open) = self.text.take() else {
            return;
        };
        let text = self.events.len();
        self.events.push(text_event(&open.buf));
        if let Some(run) = self.run.as_mut() {
            run.push_text(
                &open.buf,
                TextSlot {
                    start: open.start,
                    text,
                },
            );
        }
    }

    /// A tab or break. The run keeps its place in the text but can no longer
    /// be merged.
    fn push_marker(&mut self, marker: Segment) {
        if let Some(run) = self.run.as_mut() {
            run.segments.push(marker);
            run.text_only = false;
        }
    }

    fn finish_run(&mut self) {
        let Some(run) = self.run.take() else {
            return;
        };
        let text_only = run.text_only && !run.segments.is_empty();
        if let Some(open) = self.paragraph.as_mut() {
            open.paragraph.runs.push(Run::parsed(
                run.segments,
                run.props,
                text_only,
                run.adjacent,
            ));
            open.gap_clean = true;
        }
    }

    fn finish_paragraph(&mut self) {
        let Some(open) = self.paragraph.take() else {
            return;
        };
        if open.in_cell {
            if let Some(cell) = self.current_cell() {
                cell.paragraphs.push(open.paragraph);
            }
        } else {
            self.document.paragraphs.push(open.paragraph);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{fixture, merge_adjacent_runs, substitute, PlaceholderMap};

    #[test]
    fn test_parses_body_paragraphs_and_runs() {
        let xml = fixture::document_xml(
            r#"<w:p><w:r><w:t xml:space="preserve">Dear </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>{EMPLOYEE_NAME}</w:t></w:r></w:p>
               <w:p/>
               <w:p><w:r><w:t>Regards</w:t></w:r></w:p>"#,
        );
        let (_, doc) = parse_body(xml.as_bytes()).unwrap();

        assert_eq!(doc.paragraphs.len(), 3);
        assert_eq!(doc.paragraphs[0].runs.len(), 2);
        assert_eq!(doc.paragraphs[0].runs[0].text(), "Dear ");
        assert_eq!(doc.paragraphs[0].runs[1].text(), "{EMPLOYEE_NAME}");
        assert_eq!(doc.paragraphs[0].runs[1].props(), "<w:b/>");
        assert!(doc.paragraphs[1].runs.is_empty());
        assert_eq!(doc.paragraphs[2].text(), "Regards");
    }

    #[test]
    fn test_parses_top_level_table_cells_only() {
        let xml = fixture::document_xml(
            r#"<w:tbl><w:tblPr/><w:tr>
                 <w:tc><w:tcPr/><w:p><w:r><w:t>CTC</w:t></w:r></w:p></w:tc>
                 <w:tc><w:p><w:r><w:t>{CTC}</w:t></w:r></w:p>
                   <w:tbl><w:tr><w:tc><w:p><w:r><w:t>nested</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
                 </w:tc>
               </w:tr></w:tbl>"#,
        );
        let (_, doc) = parse_body(xml.as_bytes()).unwrap();

        assert!(doc.paragraphs.is_empty());
        assert_eq!(doc.tables.len(), 1);
        let cells = &doc.tables[0].rows[0].cells;
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].paragraphs[0].text(), "CTC");
        assert_eq!(cells[1].paragraphs.len(), 1);
        assert_eq!(cells[1].paragraphs[0].text(), "{CTC}");
    }

    #[test]
    fn test_run_with_tab_is_not_text_only() {
        let xml = fixture::document_xml(
            r#"<w:p><w:r><w:t>a</w:t></w:r><w:r><w:tab/><w:t>b</w:t></w:r><w:r><w:t>c</w:t></w:r></w:p>"#,
        );
        let (_, doc) = parse_body(xml.as_bytes()).unwrap();
        let runs = &doc.paragraphs[0].runs;

        assert!(!runs[0].can_absorb(&runs[1]));
        assert!(!runs[1].can_absorb(&runs[2]));
    }

    #[test]
    fn test_unescapes_text_content() {
        let xml = fixture::document_xml(r#"<w:p><w:r><w:t>R&amp;D</w:t></w:r></w:p>"#);
        let (_, doc) = parse_body(xml.as_bytes()).unwrap();
        assert_eq!(doc.paragraphs[0].text(), "R&D");
    }

    #[test]
    fn test_unmodified_package_round_trips_text() {
        let bytes = fixture::docx(r#"<w:p><w:r><w:t>Hello</w:t></w:r></w:p>"#);
        let package = Package::from_bytes(bytes).unwrap();
        let reloaded = Package::from_bytes(package.to_bytes().unwrap()).unwrap();
        assert_eq!(reloaded.document().paragraphs.len(), 1);
        assert_eq!(reloaded.document().paragraphs[0].text(), "Hello");
    }

    #[test]
    fn test_modified_run_is_written_back_escaped_and_space_preserved() {
        let bytes = fixture::docx(
            r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>{DEPARTMENT}</w:t><w:t>!</w:t></w:r></w:p>"#,
        );
        let mut package = Package::from_bytes(bytes).unwrap();
        if let Some(span) = package.document_mut().paragraphs[0].runs[0].spans_mut().next() {
            span.set_text(" R&D <Labs> ");
        }

        let out = package.to_bytes().unwrap();
        let xml = read_part(&out, DOCUMENT_PART).unwrap();
        let xml = String::from_utf8(xml).unwrap();

        assert!(xml.contains(r#"<w:t xml:space="preserve"> R&amp;D &lt;Labs&gt; </w:t>"#));
        assert!(xml.contains("<w:rPr><w:b/></w:rPr>"));

        let reloaded = Package::from_bytes(out).unwrap();
        assert_eq!(reloaded.document().paragraphs[0].text(), " R&D <Labs> ");
    }

    #[test]
    fn test_substituted_text_stays_on_its_side_of_tabs_and_breaks() {
        let bytes = fixture::docx(
            r#"<w:p><w:r><w:t>To,</w:t><w:br/><w:t>{EMPLOYEE_NAME}</w:t></w:r></w:p>
               <w:p><w:r><w:t>CTC:</w:t><w:tab/><w:t>{CTC}</w:t></w:r></w:p>"#,
        );
        let mut package = Package::from_bytes(bytes).unwrap();
        let mapping: PlaceholderMap = [
            ("{EMPLOYEE_NAME}".to_string(), "Jane".to_string()),
            ("{CTC}".to_string(), "12 LPA".to_string()),
        ]
        .into();
        assert_eq!(substitute(package.document_mut(), &mapping), 2);

        let out = package.to_bytes().unwrap();
        let xml = String::from_utf8(read_part(&out, DOCUMENT_PART).unwrap()).unwrap();
        assert!(xml.contains(r#"<w:t>To,</w:t><w:br/><w:t xml:space="preserve">Jane</w:t>"#));
        assert!(xml.contains(r#"<w:t>CTC:</w:t><w:tab/><w:t xml:space="preserve">12 LPA</w:t>"#));

        let reloaded = Package::from_bytes(out).unwrap();
        assert_eq!(reloaded.document().paragraphs[0].text(), "To,\nJane");
        assert_eq!(reloaded.document().paragraphs[1].text(), "CTC:\t12 LPA");
    }

    #[test]
    fn test_run_after_hyperlink_is_not_adjacent() {
        let xml = fixture::document_xml(
            r#"<w:p><w:r><w:t>Visit </w:t></w:r><w:hyperlink r:id="rId9"><w:r><w:t>our site</w:t></w:r></w:hyperlink><w:r><w:t> today</w:t></w:r></w:p>"#,
        );
        let (_, doc) = parse_body(xml.as_bytes()).unwrap();
        let runs = &doc.paragraphs[0].runs;

        assert_eq!(runs.len(), 2);
        assert!(!runs[0].can_absorb(&runs[1]));
    }

    #[test]
    fn test_merged_package_keeps_hyperlink_text_in_order() {
        let bytes = fixture::docx(
            r#"<w:p><w:r><w:t xml:space="preserve">Visit </w:t></w:r><w:hyperlink r:id="rId9"><w:r><w:t>our site</w:t></w:r></w:hyperlink><w:r><w:t xml:space="preserve"> today</w:t></w:r></w:p>"#,
        );
        let mut package = Package::from_bytes(bytes).unwrap();
        merge_adjacent_runs(package.document_mut());

        let out = package.to_bytes().unwrap();
        let xml = String::from_utf8(read_part(&out, DOCUMENT_PART).unwrap()).unwrap();
        let site = xml.find("our site").unwrap();
        let today = xml.find(" today").unwrap();
        assert!(site < today);
    }

    #[test]
    fn test_other_parts_are_preserved() {
        let bytes = fixture::docx(r#"<w:p><w:r><w:t>x</w:t></w:r></w:p>"#);
        let package = Package::from_bytes(bytes.clone()).unwrap();
        let out = package.to_bytes().unwrap();

        let original = read_part(&bytes, "[Content_Types].xml").unwrap();
        let copied = read_part(&out, "[Content_Types].xml").unwrap();
        assert_eq!(original, copied);
    }

    #[test]
    fn test_missing_document_part_is_reported() {
        let bytes = fixture::archive(&[("readme.txt", "not a document")]);
        let err = Package::from_bytes(bytes).err().unwrap();
        assert!(matches!(err, RenderError::MissingPart(part) if part == DOCUMENT_PART));
    }

    #[test]
    fn test_not_a_zip_is_an_archive_error() {
        let err = Package::from_bytes(b"plain text".to_vec()).err().unwrap();
        assert!(matches!(err, RenderError::Archive(_)));
    }
}
