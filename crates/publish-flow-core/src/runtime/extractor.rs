// crates/publish-flow-core/src/runtime/extractor.rs
// ============================================================================
// Module: Publish Flow Field Extractor
// Description: Heading-delimited field extraction from issue bodies.
// Purpose: Turn a free-form Markdown issue body into a raw field map.
// Dependencies: regex, crate::core
// ============================================================================

//! ## Overview
//! Issue bodies follow the issue-form layout: a `### Label` heading on its
//! own line followed by the value. The extractor splits the body into
//! heading sections and maps known labels onto canonical field names.
//!
//! ## Invariants
//! - Headings only match at the start of a line, so a `###` inside a value
//!   never starts a new section.
//! - A section with no content yields no field; validation reports it.
//! - The first occurrence of a heading wins.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regex::Regex;

use crate::core::FieldValue;
use crate::core::RawFieldMap;
use crate::core::field;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Heading line pattern: `### Label` with optional trailing whitespace.
const HEADING_PATTERN: &str = r"^###[ \t]+(\S.*?)[ \t]*$";

/// Code fence delimiter.
const FENCE: &str = "```";

/// Issue-form answer meaning "yes".
const YES: &str = "是";

// ============================================================================
// SECTION: Section Labels
// ============================================================================

/// How a section's content becomes a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// Trimmed text.
    Text,
    /// Yes/no answer; only the affirmative answer is `true`, and a missing
    /// or empty section reads as `false`.
    Flag,
    /// Contents of the first fenced code block in the section.
    Fenced,
}

/// Mapping from an issue heading to a canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionLabel {
    /// Heading text after `### `.
    pub heading: &'static str,
    /// Canonical field name.
    pub field: &'static str,
    /// Content interpretation.
    pub kind: SectionKind,
    /// True when the heading must exist before a skipped-test check.
    pub ensured: bool,
}

/// Section labels used by plugin submissions.
pub const PLUGIN_SECTIONS: [SectionLabel; 6] = [
    SectionLabel {
        heading: "插件名称",
        field: field::NAME,
        kind: SectionKind::Text,
        ensured: true,
    },
    SectionLabel {
        heading: "模块名称",
        field: field::MODULE,
        kind: SectionKind::Text,
        ensured: false,
    },
    SectionLabel {
        heading: "模块路径",
        field: field::MODULE_PATH,
        kind: SectionKind::Text,
        ensured: true,
    },
    SectionLabel {
        heading: "仓库地址",
        field: field::GITHUB_URL,
        kind: SectionKind::Text,
        ensured: true,
    },
    SectionLabel {
        heading: "是否为目录",
        field: field::IS_DIR,
        kind: SectionKind::Flag,
        ensured: true,
    },
    SectionLabel {
        heading: "插件配置项",
        field: field::CONFIG,
        kind: SectionKind::Fenced,
        ensured: false,
    },
];

// ============================================================================
// SECTION: Extractor
// ============================================================================

/// Extracts raw fields from heading-delimited issue bodies.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    /// Known section labels in declaration order.
    labels: Vec<SectionLabel>,
    /// Compiled heading line matcher.
    heading: Regex,
}

impl FieldExtractor {
    /// Creates an extractor for `labels`.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] when the heading matcher fails to compile.
    pub fn new(labels: &[SectionLabel]) -> Result<Self, regex::Error> {
        Ok(Self {
            labels: labels.to_vec(),
            heading: Regex::new(HEADING_PATTERN)?,
        })
    }

    /// Creates the extractor for plugin submissions.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] when the heading matcher fails to compile.
    pub fn plugin() -> Result<Self, regex::Error> {
        Self::new(&PLUGIN_SECTIONS)
    }

    /// Returns the configured section labels.
    #[must_use]
    pub fn labels(&self) -> &[SectionLabel] {
        &self.labels
    }

    /// Extracts every known field from `body`.
    #[must_use]
    pub fn extract(&self, body: &str) -> RawFieldMap {
        let sections = self.sections(body);
        let mut raw = RawFieldMap::new();
        for label in &self.labels {
            let content = sections
                .iter()
                .find(|section| section.heading == label.heading)
                .map(|section| section.content.as_str());
            raw.insert_opt(label.field, interpret(label.kind, content));
        }
        raw
    }

    /// Prepends empty headings for every ensured label missing from `body`.
    ///
    /// Returns `None` when nothing is missing.
    #[must_use]
    pub fn ensure_sections(&self, body: &str) -> Option<String> {
        let sections = self.sections(body);
        let mut parts: Vec<String> = self
            .labels
            .iter()
            .filter(|label| label.ensured)
            .filter(|label| !sections.iter().any(|section| section.heading == label.heading))
            .map(|label| format!("### {}", label.heading))
            .collect();
        if parts.is_empty() {
            return None;
        }
        parts.push(body.to_string());
        Some(parts.join("\n\n"))
    }

    /// Splits `body` into heading sections in document order.
    fn sections(&self, body: &str) -> Vec<Section> {
        let mut sections: Vec<Section> = Vec::new();
        let mut current: Option<(String, Vec<&str>)> = None;
        for line in body.lines() {
            let line = line.trim_end_matches('\r');
            if let Some(captures) = self.heading.captures(line) {
                if let Some((heading, lines)) = current.take() {
                    sections.push(Section::new(heading, &lines));
                }
                let heading = captures.get(1).map_or("", |m| m.as_str());
                current = Some((heading.to_string(), Vec::new()));
            } else if let Some((_, lines)) = current.as_mut() {
                lines.push(line);
            }
        }
        if let Some((heading, lines)) = current {
            sections.push(Section::new(heading, &lines));
        }
        sections
    }
}

/// One heading and the text beneath it.
#[derive(Debug)]
struct Section {
    /// Heading text.
    heading: String,
    /// Content lines joined with `\n`, untrimmed.
    content: String,
}

impl Section {
    /// Builds a section from its heading and raw lines.
    fn new(heading: String, lines: &[&str]) -> Self {
        Self {
            heading,
            content: lines.join("\n"),
        }
    }
}

/// Interprets section content according to `kind`; `None` means the
/// heading is absent from the body.
fn interpret(kind: SectionKind, content: Option<&str>) -> Option<FieldValue> {
    match kind {
        SectionKind::Text => {
            let text = content?.trim();
            (!text.is_empty()).then(|| FieldValue::Text(text.to_string()))
        }
        SectionKind::Flag => Some(FieldValue::Flag(content.map(str::trim) == Some(YES))),
        SectionKind::Fenced => fenced_block(content?).map(FieldValue::Text),
    }
}

/// Returns the contents of the first fenced code block in `content`.
fn fenced_block(content: &str) -> Option<String> {
    let mut lines = content.lines().skip_while(|line| !line.trim_start().starts_with(FENCE));
    lines.next()?;
    let mut inner = Vec::new();
    for line in lines {
        if line.trim_start().starts_with(FENCE) {
            return Some(inner.join("\n"));
        }
        inner.push(line);
    }
    None
}

