//! Markup reconstruction of the analyzed text.
//!
//! The renderer walks a paragraph/line index built once from the original
//! text in tandem with the annotated token stream, wrapping decorated tokens
//! in `<span>` markup. Apart from the inserted markup the output reproduces
//! the text exactly: `<br>` stands for an intra-paragraph line break and
//! `<p>` blocks for paragraphs split on blank lines.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::{Annotation, Category, Token};

/// Presentation for each category, in exactly one place.
pub(crate) fn style_for(category: Category) -> &'static str {
    match category {
        Category::Adverb => "color: green; text-decoration: underline;",
        Category::Adjective => "background-color: pink; text-decoration: underline;",
        Category::Repetition => "background-color: orange; text-decoration: underline;",
        Category::PartialRhyme => "background-color: #ffcc80; text-decoration: underline;",
        Category::DoubleVerb => "background-color: #dab4ff; text-decoration: underline;",
        Category::CompoundPast => "background-color: lightblue; text-decoration: underline;",
        Category::Orthography => "text-decoration: underline wavy red;",
        Category::Grammar => "text-decoration: underline wavy yellow;",
    }
}

/// Categories whose presentation fills the token background. A token that
/// carries one of these does not additionally get the partial-rhyme
/// treatment.
pub(crate) fn has_background(category: Category) -> bool {
    matches!(
        category,
        Category::Adjective | Category::Repetition | Category::DoubleVerb | Category::CompoundPast
    )
}

/// Decorated document plus the per-category counts that were actually
/// rendered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarkupReport {
    pub html: String,
    pub word_count: usize,
    pub category_counts: BTreeMap<Category, usize>,
}

impl MarkupReport {
    pub fn total_marks(&self) -> usize {
        self.category_counts.values().sum()
    }
}

// Character spans, aligned with the token offsets.
struct LineSpan {
    start: usize,
    end: usize,
}

struct ParagraphSpan {
    lines: Vec<LineSpan>,
}

/// Splits the text into paragraphs on blank lines and lines on single
/// newlines, with precomputed character spans. Consumes 1 character per
/// inter-line newline and 2 per paragraph break so spans stay aligned with
/// token offsets.
fn paragraph_index(text: &str) -> Vec<ParagraphSpan> {
    let mut paragraphs = Vec::new();
    let mut offset = 0;
    for paragraph in text.split("\n\n") {
        let mut lines = Vec::new();
        for line in paragraph.split('\n') {
            let len = line.chars().count();
            lines.push(LineSpan {
                start: offset,
                end: offset + len,
            });
            offset += len + 1;
        }
        offset += 1;
        paragraphs.push(ParagraphSpan { lines });
    }
    paragraphs
}

/// Reconstructs the text as HTML with one `<span>` per decorated token and
/// computes the per-category counts from the final render decisions.
///
/// `annotations` must hold exactly one entry per token, as produced by
/// [`crate::Annotator::annotate`].
pub fn render_markup(text: &str, tokens: &[Token], annotations: &[Annotation]) -> MarkupReport {
    assert_eq!(tokens.len(), annotations.len(), "one annotation per token");
    let mut html = String::new();
    let mut index = 0;

    for paragraph in paragraph_index(text) {
        html.push_str("<p>");
        for (line_idx, line) in paragraph.lines.iter().enumerate() {
            if line_idx > 0 {
                html.push_str("<br>");
            }
            while index < tokens.len() && tokens[index].start < line.end {
                let token = &tokens[index];
                if token.end <= line.start {
                    // already emitted on an earlier line
                    index += 1;
                    continue;
                }
                let fully_inside = token.start >= line.start && token.end <= line.end;
                emit_token(&mut html, token, &annotations[index], fully_inside);
                index += 1;
            }
        }
        html.push_str("</p>");
    }

    MarkupReport {
        html,
        word_count: text.unicode_words().count(),
        category_counts: count_marks(annotations),
    }
}

fn emit_token(out: &mut String, token: &Token, note: &Annotation, allow_suffix_split: bool) {
    if allow_suffix_split && !note.marks.iter().any(|m| has_background(*m)) {
        if let Some(suffix) = note.suffix_highlight.as_deref() {
            if let Some((prefix, matched, rest)) = split_at_suffix(&token.text, suffix) {
                out.push_str(prefix);
                out.push_str("<span style=\"");
                out.push_str(style_for(Category::PartialRhyme));
                out.push_str("\">");
                out.push_str(matched);
                out.push_str("</span>");
                out.push_str(rest);
                out.push_str(&token.ws);
                return;
            }
        }
    }

    if note.marks.is_empty() {
        out.push_str(&token.text);
    } else {
        let style = note
            .marks
            .iter()
            .map(|m| style_for(*m))
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str("<span style=\"");
        out.push_str(&style);
        out.push_str("\">");
        out.push_str(&token.text);
        out.push_str("</span>");
    }
    out.push_str(&token.ws);
}

/// Splits `word` at the rightmost case-insensitive occurrence of `suffix`
/// (already lowercased), returning original-case slices. Rhymes are about
/// word endings, so the rightmost occurrence wins.
fn split_at_suffix<'a>(word: &'a str, suffix: &str) -> Option<(&'a str, &'a str, &'a str)> {
    let chars: Vec<(usize, char)> = word.char_indices().collect();
    let pattern: Vec<char> = suffix.chars().collect();
    if pattern.is_empty() || pattern.len() > chars.len() {
        return None;
    }
    for start in (0..=chars.len() - pattern.len()).rev() {
        let matches = pattern.iter().enumerate().all(|(k, expected)| {
            let mut lowered = chars[start + k].1.to_lowercase();
            lowered.next() == Some(*expected) && lowered.next().is_none()
        });
        if matches {
            let begin = chars[start].0;
            let end = chars
                .get(start + pattern.len())
                .map_or(word.len(), |(idx, _)| *idx);
            return Some((&word[..begin], &word[begin..end], &word[end..]));
        }
    }
    None
}

/// Counts must mirror what was rendered: one count per mark per token, and
/// a partial rhyme only when its highlight was not suppressed by a
/// background style.
fn count_marks(annotations: &[Annotation]) -> BTreeMap<Category, usize> {
    let mut counts: BTreeMap<Category, usize> =
        Category::ALL.iter().map(|category| (*category, 0)).collect();
    for note in annotations {
        for mark in &note.marks {
            *counts.get_mut(mark).expect("all categories present") += 1;
        }
        if note.suffix_highlight.is_some() && !note.marks.iter().any(|m| has_background(*m)) {
            *counts
                .get_mut(&Category::PartialRhyme)
                .expect("all categories present") += 1;
        }
    }
    counts
}

/// Legend block for exported documents, mirroring the rendered styles.
pub fn legend_html(counts: &BTreeMap<Category, usize>) -> String {
    let mut out = String::from(
        "<div style=\"margin-bottom:20px;\"><strong>Funcionalidades y Colores:</strong>\
         <ul style=\"list-style-type: none; padding: 0;\">",
    );
    for category in Category::ALL {
        let count = counts.get(&category).copied().unwrap_or(0);
        out.push_str("<li><span style=\"");
        out.push_str(style_for(category));
        out.push_str("\">");
        out.push_str(category.label());
        out.push_str(&format!(" ({count})"));
        out.push_str("</span></li>");
    }
    out.push_str("</ul></div>");
    out
}
