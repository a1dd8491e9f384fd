#![allow(dead_code)]

//! In-memory view of a Word document body: paragraphs made of runs, plus tables.
//!
//! Runs parsed from a `.docx` package remember where their text lives in the
//! underlying XML event stream (`TextSlot`), so edits made here can be written
//! back without disturbing any formatting. Runs built with `Run::new` have no
//! slots and exist purely in memory.

/// Location of one `<w:t>` element inside the package's event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TextSlot {
    /// Index of the `<w:t>` start event.
    pub start: usize,
    /// Index of the text event holding the element's content.
    pub text: usize,
}

/// Consecutive `<w:t>` elements of one run, edited as a single string.
/// On write-back the whole string goes into the first slot.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    text: String,
    original: String,
    slots: Vec<TextSlot>,
}

impl TextSpan {
    fn new(text: String, slots: Vec<TextSlot>) -> Self {
        Self {
            original: text.clone(),
            text,
            slots,
        }
    }

    pub(crate) fn parsed(text: String, slot: TextSlot) -> Self {
        Self::new(text, vec![slot])
    }

    /// Appends the content of the next `<w:t>` in the same span.
    pub(crate) fn extend(&mut self, text: &str, slot: TextSlot) {
        self.text.push_str(text);
        self.original.push_str(text);
        self.slots.push(slot);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn is_modified(&self) -> bool {
        self.text != self.original
    }

    pub(crate) fn slots(&self) -> &[TextSlot] {
        &self.slots
    }
}

/// Visible content of a run, in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(TextSpan),
    /// `<w:tab/>`
    Tab,
    /// `<w:br/>` or `<w:cr/>`
    Break,
}

/// A maximal span of content sharing one formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    segments: Vec<Segment>,
    /// Serialized `<w:rPr>` contents. Runs with equal props look identical.
    props: String,
    /// False when the run holds anything besides `<w:t>` (tabs, breaks,
    /// drawings), or when a parsed run has no `<w:t>` at all.
    text_only: bool,
    /// Nothing visible sits between this run and the previous run of the
    /// paragraph. Runs wrapped in hyperlinks or tracked changes break adjacency.
    adjacent: bool,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self::styled(text, "")
    }

    pub fn styled(text: impl Into<String>, props: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Text(TextSpan::new(text.into(), Vec::new()))],
            props: props.into(),
            text_only: true,
            adjacent: true,
        }
    }

    pub(crate) fn parsed(
        segments: Vec<Segment>,
        props: String,
        text_only: bool,
        adjacent: bool,
    ) -> Self {
        Self {
            segments,
            props,
            text_only,
            adjacent,
        }
    }

    /// Run text with tabs as `\t` and breaks as `\n`.
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Text(span) => span.text(),
                Segment::Tab => "\t",
                Segment::Break => "\n",
            })
            .collect()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn spans(&self) -> impl Iterator<Item = &TextSpan> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Text(span) => Some(span),
            _ => None,
        })
    }

    pub fn spans_mut(&mut self) -> impl Iterator<Item = &mut TextSpan> {
        self.segments.iter_mut().filter_map(|segment| match segment {
            Segment::Text(span) => Some(span),
            _ => None,
        })
    }

    pub fn props(&self) -> &str {
        &self.props
    }

    pub fn is_modified(&self) -> bool {
        self.spans().any(TextSpan::is_modified)
    }

    /// Whether `next` can be folded into this run without a visible change.
    pub(crate) fn can_absorb(&self, next: &Run) -> bool {
        self.text_only && next.text_only && next.adjacent && self.props == next.props
    }

    /// Empties every span and returns the text they held.
    pub(crate) fn take_text(&mut self) -> String {
        let mut taken = String::new();
        for span in self.spans_mut() {
            taken.push_str(span.text());
            span.set_text("");
        }
        taken
    }

    /// Appends to the last text span.
    pub(crate) fn append_text(&mut self, text: &str) {
        if let Some(span) = self.spans_mut().last() {
            let joined = format!("{}{text}", span.text());
            span.set_text(joined);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn from_runs<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            runs: texts.into_iter().map(Run::new).collect(),
        }
    }

    /// Concatenated text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Row>,
}

/// Document body: top-level paragraphs and top-level tables, each in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub paragraphs: Vec<Paragraph>,
    pub tables: Vec<Table>,
}

impl Document {
    /// Every paragraph the renderer touches: body paragraphs first, then table
    /// cells row-major.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.paragraphs.iter().chain(self.tables.iter().flat_map(|table| {
            table
                .rows
                .iter()
                .flat_map(|row| row.cells.iter().flat_map(|cell| cell.paragraphs.iter()))
        }))
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.paragraphs.iter_mut().chain(self.tables.iter_mut().flat_map(|table| {
            table.rows.iter_mut().flat_map(|row| {
                row.cells
                    .iter_mut()
                    .flat_map(|cell| cell.paragraphs.iter_mut())
            })
        }))
    }

    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.paragraphs().flat_map(|p| p.runs.iter())
    }
}
