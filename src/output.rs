//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every section is shown by its position in `sectionOrder` and its id, with
//! the resolved template and a short preview as indented context lines. The
//! output reads as an inventory of the page rather than a log.
//!
//! # Output Format
//!
//! ## Compose
//!
//! ```text
//! Language: ar (rtl)
//! Sections
//! 001 hero → Hero/split
//!     imageWidth: 45
//!     Preview: أهلا وسهلا
//! 003 team → Team/cards (2 items)
//!
//! Skipped
//! 002 ghost: no section with this id
//!
//! Composed 2 sections, 1 skipped
//! ```
//!
//! ## Check
//!
//! ```text
//! error   ghost: no section with this id
//! warning hero: unknown template "zigzag", falling back to "centered"
//!
//! 1 error, 1 warning
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::cache::RenderStatus;
use crate::compose::{Composition, Issue, RenderNode, ResolvedValue, Severity};
use crate::language::LanguageContext;
use crate::registry::OptionKey;
use std::path::Path;

/// Longest preview shown per section, in characters.
const PREVIEW_CHARS: usize = 40;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Strip HTML tags from a string (simple angle-bracket stripping).
fn strip_html_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    result
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

/// First non-empty text in the node, in element order, flattened to one line.
fn preview(node: &RenderNode) -> Option<String> {
    node.elements.values().find_map(|el| {
        let text = match &el.value {
            ResolvedValue::Text(s) => s.clone(),
            ResolvedValue::Html(s) => strip_html_tags(s),
            _ => return None,
        };
        let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
        (!flat.is_empty()).then(|| truncate(&flat, PREVIEW_CHARS))
    })
}

/// Header line: position, id, resolved template and item count.
///
/// ```text
/// 001 hero → Hero/split
/// 003 team → Team/cards (2 items)
/// ```
fn node_header(position: usize, node: &RenderNode) -> String {
    let template = format!("{}/{}", node.kind, node.variant);
    match node.items.len() {
        0 => format!("{} {} → {}", format_index(position), node.section_id, template),
        n => format!(
            "{} {} → {} ({})",
            format_index(position),
            node.section_id,
            template,
            plural(n, "item")
        ),
    }
}

// ============================================================================
// compose
// ============================================================================

/// Format a composition as a section inventory.
///
/// Nodes do not record their position, so positions are recovered by
/// interleaving with the skipped list, which does.
pub fn format_compose_output(composition: &Composition) -> Vec<String> {
    let mut lines = vec![format!(
        "Language: {} ({})",
        composition.language,
        composition.direction.as_str()
    )];

    lines.push("Sections".to_string());
    let mut skipped = composition.skipped.iter().map(|s| s.position).peekable();
    let mut position = 0;
    for node in &composition.nodes {
        while skipped.peek() == Some(&position) {
            skipped.next();
            position += 1;
        }
        lines.push(node_header(position + 1, node));
        for key in [OptionKey::ImageWidth, OptionKey::Columns] {
            if let Some(value) = node.option(key) {
                lines.push(format!("{}{}: {}", indent(1), key.key(), value));
            }
        }
        if let Some(requested) = &node.requested_variant {
            lines.push(format!(
                "{}Requested: {:?} (not registered)",
                indent(1),
                requested
            ));
        }
        if let Some(text) = preview(node) {
            lines.push(format!("{}Preview: {}", indent(1), text));
        }
        position += 1;
    }

    if !composition.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for skip in &composition.skipped {
            lines.push(format!(
                "{} {}: {}",
                format_index(skip.position + 1),
                skip.section_id,
                skip.reason
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Composed {}, {} skipped",
        plural(composition.nodes.len(), "section"),
        composition.skipped.len()
    ));
    lines
}

pub fn print_compose_output(composition: &Composition) {
    for line in format_compose_output(composition) {
        println!("{}", line);
    }
}

// ============================================================================
// check
// ============================================================================

pub fn format_check_output(issues: &[Issue]) -> Vec<String> {
    if issues.is_empty() {
        return vec!["No problems found".to_string()];
    }
    let mut lines: Vec<String> = issues
        .iter()
        .map(|issue| {
            let label = match issue.severity {
                Severity::Error => "error  ",
                Severity::Warning => "warning",
            };
            format!("{} {}: {}", label, issue.section_id, issue.message)
        })
        .collect();
    let errors = issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count();
    lines.push(String::new());
    lines.push(format!(
        "{}, {}",
        plural(errors, "error"),
        plural(issues.len() - errors, "warning")
    ));
    lines
}

pub fn print_check_output(issues: &[Issue]) {
    for line in format_check_output(issues) {
        println!("{}", line);
    }
}

// ============================================================================
// render
// ============================================================================

/// ```text
/// Home (ar, rtl) → dist/index.html: written
///     4 sections, 1 skipped
/// ```
pub fn format_render_output(
    title: &str,
    composition: &Composition,
    output: &Path,
    status: RenderStatus,
) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({}, {}) → {}: {}",
        title,
        composition.language,
        composition.direction.as_str(),
        output.display(),
        status
    )];
    lines.push(format!(
        "{}{}, {} skipped",
        indent(1),
        plural(composition.nodes.len(), "section"),
        composition.skipped.len()
    ));
    lines
}

pub fn print_render_output(title: &str, composition: &Composition, output: &Path, status: RenderStatus) {
    for line in format_render_output(title, composition, output, status) {
        println!("{}", line);
    }
}

// ============================================================================
// lang
// ============================================================================

/// ```text
/// Current: ar (rtl)
/// Default: en
/// Supported: en, ar*
/// ```
pub fn format_lang_output(lang: &LanguageContext) -> Vec<String> {
    let supported = lang
        .supported()
        .iter()
        .map(|l| {
            if l == lang.current() {
                format!("{}*", l)
            } else {
                l.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    vec![
        format!("Current: {} ({})", lang.current(), lang.direction().as_str()),
        format!("Default: {}", lang.default_language()),
        format!("Supported: {}", supported),
    ]
}

pub fn print_lang_output(lang: &LanguageContext) {
    for line in format_lang_output(lang) {
        println!("{}", line);
    }
}
