// crates/publish-flow-core/src/runtime/report.rs
// ============================================================================
// Module: Publish Flow Markdown Report
// Description: Deterministic Markdown rendering of validation outcomes.
// Purpose: Produce the issue comment body posted after every check.
// Dependencies: serde_json, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The renderer is a pure function of the outcome and its
//! [`ReportContext`]: identical inputs always yield byte-identical output,
//! which lets the workflow skip comment updates when nothing changed. Every
//! rendered body ends with [`REPORT_MARKER`] so later runs can find and reuse
//! the comment.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;

use serde_json::Value;

use crate::core::ErrorEntry;
use crate::core::ErrorKind;
use crate::core::Locale;
use crate::core::ValidationOutcome;
use crate::core::field;
use crate::interfaces::ReportContext;
use crate::interfaces::ReportRenderer;
use crate::msg;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Hidden marker identifying comments written by this workflow.
pub const REPORT_MARKER: &str = "<!-- PUBLISH-FLOW -->";

// ============================================================================
// SECTION: Renderer
// ============================================================================

/// Markdown renderer for issue check comments.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownReportRenderer;

impl ReportRenderer for MarkdownReportRenderer {
    fn render(&self, outcome: &ValidationOutcome, context: &ReportContext) -> String {
        let locale = context.locale;
        let mut out = String::new();
        let title = format!("{}: {}", outcome.publish_type, outcome.name);

        push_line(&mut out, &msg!(locale, "report.heading"));
        push_line(&mut out, "");
        push_line(&mut out, &format!("> {}", escape_html(&title)));
        push_line(&mut out, "");

        if outcome.valid {
            push_line(&mut out, &msg!(locale, "report.all_passed"));
        } else {
            push_line(&mut out, &msg!(locale, "report.problems"));
            push_line(&mut out, "");
            let items: String =
                outcome.errors.iter().map(|entry| error_item(entry, locale)).collect();
            push_line(&mut out, &format!("<pre><code>{items}</code></pre>"));
            if let Some(entry) = outcome.error_for(field::PLUGIN_TEST) {
                push_plugin_test_output(&mut out, entry, locale);
            }
        }
        push_line(&mut out, "");

        let details = detail_items(outcome, context);
        if !details.is_empty() {
            push_line(&mut out, "<details>");
            push_line(&mut out, &format!("<summary>{}</summary>", msg!(locale, "report.details")));
            push_line(&mut out, "");
            push_line(&mut out, &format!("<pre><code>{details}</code></pre>"));
            push_line(&mut out, "");
            push_line(&mut out, "</details>");
            push_line(&mut out, "");
        }

        push_line(&mut out, "---");
        push_line(&mut out, "");
        push_line(&mut out, &msg!(locale, "report.tip.edit"));
        if !context.skip_plugin_test {
            push_line(&mut out, &msg!(locale, "report.tip.skip"));
        }
        if context.reuse {
            push_line(&mut out, "");
            push_line(&mut out, &msg!(locale, "report.tip.reuse"));
        }
        push_line(&mut out, "");
        push_line(&mut out, REPORT_MARKER);
        out
    }
}

/// Appends `line` and a newline.
fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

/// Renders one error as a list item.
fn error_item(entry: &ErrorEntry, locale: Locale) -> String {
    if entry.kind == ErrorKind::GithubUrl {
        let url = entry.input.as_ref().and_then(Value::as_str).unwrap_or_default();
        let status = entry.ctx.get("status_code").map(Value::to_string).unwrap_or_default();
        let line = msg!(
            locale,
            "report.github_url_failed",
            url = escape_html(url),
            status_code = status
        );
        return format!("<li>{line}</li>");
    }
    let line = msg!(
        locale,
        "report.error_line",
        field = escape_html(&location_name(&entry.loc, locale)),
        message = escape_html(&entry.msg)
    );
    format!("<li>{line}</li>")
}

/// Appends the captured load-test output of a failed load.
fn push_plugin_test_output(out: &mut String, entry: &ErrorEntry, locale: Locale) {
    let output = entry.ctx.get("output").and_then(Value::as_str).unwrap_or_default();
    if output.is_empty() {
        return;
    }
    push_line(out, "");
    push_line(out, "<details>");
    push_line(
        out,
        &format!("<summary>{}</summary>", msg!(locale, "report.plugin_test_output")),
    );
    push_line(out, "");
    push_line(out, &format!("<pre><code>{}</code></pre>", escape_html(output)));
    push_line(out, "");
    push_line(out, "</details>");
}

/// Renders the passed-check list shown under "details".
fn detail_items(outcome: &ValidationOutcome, context: &ReportContext) -> String {
    let locale = context.locale;
    let mut items = String::new();
    if let Some(url) = outcome.github_url() {
        let line = msg!(locale, "report.detail.github_url", url = escape_html(url));
        let _ = write!(items, "<li>{line}</li>");
    }
    if let Some(version) = outcome.text(field::VERSION) {
        let line = msg!(locale, "report.detail.version", version = escape_html(version));
        let _ = write!(items, "<li>{line}</li>");
    }
    if let Some(plugin_type) = outcome.text(field::PLUGIN_TYPE) {
        let line = msg!(
            locale,
            "report.detail.plugin_type",
            plugin_type = escape_html(&plugin_type_name(plugin_type, locale))
        );
        let _ = write!(items, "<li>{line}</li>");
    }
    if context.skip_plugin_test {
        let _ = write!(items, "<li>{}</li>", msg!(locale, "report.detail.load_skipped"));
    } else if outcome.error_for(field::PLUGIN_TEST).is_none() {
        let line = context.action_url.as_deref().map_or_else(
            || msg!(locale, "report.detail.load_passed_plain"),
            |url| msg!(locale, "report.detail.load_passed", url = escape_html(url)),
        );
        let _ = write!(items, "<li>{line}</li>");
    }
    items
}

/// Returns the display name of a location path (`a > b`).
fn location_name(loc: &[String], locale: Locale) -> String {
    loc.iter()
        .map(|item| {
            let key = format!("field.{item}");
            let name = msg!(locale, &key);
            if name == key { item.clone() } else { name }
        })
        .collect::<Vec<_>>()
        .join(" > ")
}

/// Returns the display name of a plugin type, or the raw value when unknown.
fn plugin_type_name(plugin_type: &str, locale: Locale) -> String {
    let key = format!("plugin_type.{plugin_type}");
    let name = msg!(locale, &key);
    if name == key { plugin_type.to_string() } else { name }
}

/// Escapes text for inclusion in HTML.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
