//! Stylistic annotation engine for Spanish prose.
//!
//! Takes the token sequence produced by an external NLP pipeline plus the
//! findings of an external spelling/grammar checker, decides per token which
//! stylistic categories apply (adverbs in -mente, adjectives, near-duplicate
//! repetitions, partial rhymes, double-verb periphrases, compound past), and
//! reconstructs the text as decorated markup with per-category counts.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

mod checker;
mod render;
mod similarity;
mod token;

pub use checker::{
    Checker, CheckerConfig, CheckerError, DisabledChecker, FindingKind, GrammarFinding,
    LanguageToolClient,
};
pub use render::{legend_html, render_markup, MarkupReport};
pub use similarity::{common_suffix, is_similar, similarity_ratio};
pub use token::{corrected_pos, normalize_pos, tokens_from_json, PosTag, Token};

/// Adverbs qualify by this literal ending on the surface form.
const ADVERB_SUFFIX: &str = "mente";

/// Lemmas opening the "start/begin/try + a + infinitive" periphrasis.
const DOUBLE_VERB_LEMMAS: [&str; 3] = ["empezar", "comenzar", "tratar"];

/// Annotation category identifiers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum Category {
    #[serde(rename = "adverbios")]
    Adverb,
    #[serde(rename = "adjetivos")]
    Adjective,
    #[serde(rename = "repeticiones_totales")]
    Repetition,
    #[serde(rename = "rimas_parciales")]
    PartialRhyme,
    #[serde(rename = "dobles_verbos")]
    DoubleVerb,
    #[serde(rename = "preterito_compuesto")]
    CompoundPast,
    #[serde(rename = "orthography")]
    Orthography,
    #[serde(rename = "grammar")]
    Grammar,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Adverb,
        Category::Adjective,
        Category::Repetition,
        Category::PartialRhyme,
        Category::DoubleVerb,
        Category::CompoundPast,
        Category::Orthography,
        Category::Grammar,
    ];

    /// Display label used in the exported legend.
    pub fn label(self) -> &'static str {
        match self {
            Category::Adverb => "Adverbios en -mente",
            Category::Adjective => "Adjetivos",
            Category::Repetition => "Repeticiones Totales",
            Category::PartialRhyme => "Rimas Parciales",
            Category::DoubleVerb => "Dobles Verbos",
            Category::CompoundPast => "Pretérito Perf. Comp.",
            Category::Orthography => "Ortografía",
            Category::Grammar => "Gramática",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Category::Adverb => "adverbios",
            Category::Adjective => "adjetivos",
            Category::Repetition => "repeticiones_totales",
            Category::PartialRhyme => "rimas_parciales",
            Category::DoubleVerb => "dobles_verbos",
            Category::CompoundPast => "preterito_compuesto",
            Category::Orthography => "orthography",
            Category::Grammar => "grammar",
        };
        f.write_str(name)
    }
}

/// Per-category display toggles, one boolean gate per recognized category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Toggles {
    pub adverbs: bool,
    pub adjectives: bool,
    pub repetitions: bool,
    pub partial_rhymes: bool,
    pub double_verbs: bool,
    pub compound_past: bool,
    pub orthography: bool,
    pub grammar: bool,
}

impl Default for Toggles {
    fn default() -> Self {
        Self {
            adverbs: true,
            adjectives: true,
            repetitions: true,
            partial_rhymes: true,
            double_verbs: true,
            compound_past: true,
            orthography: false,
            grammar: false,
        }
    }
}

impl Toggles {
    pub fn all() -> Self {
        Self {
            orthography: true,
            grammar: true,
            ..Self::default()
        }
    }

    pub fn none() -> Self {
        Self {
            adverbs: false,
            adjectives: false,
            repetitions: false,
            partial_rhymes: false,
            double_verbs: false,
            compound_past: false,
            orthography: false,
            grammar: false,
        }
    }

    pub fn get(&self, category: Category) -> bool {
        match category {
            Category::Adverb => self.adverbs,
            Category::Adjective => self.adjectives,
            Category::Repetition => self.repetitions,
            Category::PartialRhyme => self.partial_rhymes,
            Category::DoubleVerb => self.double_verbs,
            Category::CompoundPast => self.compound_past,
            Category::Orthography => self.orthography,
            Category::Grammar => self.grammar,
        }
    }

    pub fn set(&mut self, category: Category, value: bool) {
        match category {
            Category::Adverb => self.adverbs = value,
            Category::Adjective => self.adjectives = value,
            Category::Repetition => self.repetitions = value,
            Category::PartialRhyme => self.partial_rhymes = value,
            Category::DoubleVerb => self.double_verbs = value,
            Category::CompoundPast => self.compound_past = value,
            Category::Orthography => self.orthography = value,
            Category::Grammar => self.grammar = value,
        }
    }
}

/// Window and threshold settings for the repetition scan. The defaults are
/// the calibrated values; overriding them is configuration, not tuning of
/// inferred constants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RepetitionTuning {
    /// Tokens inspected on each side of the current token.
    pub window: usize,
    /// Minimum matching-character ratio for two words to count as the same.
    pub similarity_threshold: f64,
    /// Minimum shared suffix length for a partial rhyme.
    pub min_suffix_len: usize,
}

impl Default for RepetitionTuning {
    fn default() -> Self {
        Self {
            window: 45,
            similarity_threshold: 0.8,
            min_suffix_len: 3,
        }
    }
}

/// Per-token annotation state produced by one annotate pass. Built fresh on
/// every analysis; the token sequence itself is never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub marks: BTreeSet<Category>,
    /// Trailing substring selected for partial-rhyme display.
    pub suffix_highlight: Option<String>,
    claimed: bool,
}

impl Annotation {
    /// True once a multi-token construction consumed this token.
    pub fn is_claimed(&self) -> bool {
        self.claimed
    }
}

/// The annotation engine: runs every matcher over a token sequence and
/// resolves the per-token category sets.
///
/// Matchers are independent; each can be skipped through [`Toggles`] without
/// affecting the others. The repetition/rhyme matcher detects both outcomes
/// unconditionally and lets the toggles gate only the marking, so the
/// repetition-over-rhyme precedence holds under every toggle combination.
#[derive(Debug, Clone, Default)]
pub struct Annotator {
    tuning: RepetitionTuning,
}

impl Annotator {
    pub fn new(tuning: RepetitionTuning) -> Self {
        Self { tuning }
    }

    /// Runs all matchers plus the checker overlay, returning one annotation
    /// per token.
    pub fn annotate(
        &self,
        tokens: &[Token],
        findings: &[GrammarFinding],
        toggles: &Toggles,
    ) -> Vec<Annotation> {
        let mut annotations = vec![Annotation::default(); tokens.len()];
        self.overlay_findings(tokens, findings, toggles, &mut annotations);
        self.mark_repetitions(tokens, toggles, &mut annotations);
        self.mark_adverbs(tokens, toggles, &mut annotations);
        self.mark_adjectives(tokens, toggles, &mut annotations);
        self.mark_verb_constructions(tokens, toggles, &mut annotations);
        annotations
    }

    /// Annotates and renders in one step.
    pub fn render(
        &self,
        text: &str,
        tokens: &[Token],
        findings: &[GrammarFinding],
        toggles: &Toggles,
    ) -> MarkupReport {
        let annotations = self.annotate(tokens, findings, toggles);
        render::render_markup(text, tokens, &annotations)
    }

    fn mark_adverbs(&self, tokens: &[Token], toggles: &Toggles, annotations: &mut [Annotation]) {
        if !toggles.adverbs {
            return;
        }
        for (token, note) in tokens.iter().zip(annotations.iter_mut()) {
            if token.pos == PosTag::Adv && token.text.to_lowercase().ends_with(ADVERB_SUFFIX) {
                note.marks.insert(Category::Adverb);
            }
        }
    }

    fn mark_adjectives(&self, tokens: &[Token], toggles: &Toggles, annotations: &mut [Annotation]) {
        if !toggles.adjectives {
            return;
        }
        for (token, note) in tokens.iter().zip(annotations.iter_mut()) {
            if token.pos == PosTag::Adj {
                note.marks.insert(Category::Adjective);
            }
        }
    }

    /// Windowed pairwise scan over content words. An in-window near
    /// duplicate marks a repetition; otherwise the longest shared suffix of
    /// at least `min_suffix_len` characters becomes the rhyme candidate.
    /// Repetition takes precedence: a token gets at most one outcome.
    fn mark_repetitions(
        &self,
        tokens: &[Token],
        toggles: &Toggles,
        annotations: &mut [Annotation],
    ) {
        if !toggles.repetitions && !toggles.partial_rhymes {
            return;
        }
        for (i, token) in tokens.iter().enumerate() {
            if !token.pos.is_content_word() {
                continue;
            }
            let lo = i.saturating_sub(self.tuning.window);
            let hi = (i + self.tuning.window + 1).min(tokens.len());
            let mut repeated = false;
            let mut best_suffix = String::new();
            let mut best_len = 0;
            for (j, other) in tokens[lo..hi].iter().enumerate() {
                if lo + j == i || !other.pos.is_content_word() {
                    continue;
                }
                if is_similar(&token.text, &other.text, self.tuning.similarity_threshold) {
                    repeated = true;
                } else {
                    let suffix =
                        common_suffix(&token.text, &other.text, self.tuning.min_suffix_len);
                    let len = suffix.chars().count();
                    if len > best_len {
                        best_suffix = suffix;
                        best_len = len;
                    }
                }
            }
            let note = &mut annotations[i];
            if toggles.repetitions && repeated {
                note.marks.insert(Category::Repetition);
            }
            if toggles.partial_rhymes && !repeated && best_len > 0 {
                note.suffix_highlight = Some(best_suffix);
            }
        }
    }

    /// Single left-to-right pass over unclaimed tokens. The first applicable
    /// construction claims its tokens exclusively and the scan advances past
    /// them; an unclaimed token failing every check advances by one.
    fn mark_verb_constructions(
        &self,
        tokens: &[Token],
        toggles: &Toggles,
        annotations: &mut [Annotation],
    ) {
        if !toggles.double_verbs && !toggles.compound_past {
            return;
        }
        let mut i = 0;
        while i < tokens.len() {
            if annotations[i].claimed {
                i += 1;
                continue;
            }
            let token = &tokens[i];

            if toggles.double_verbs {
                // empezar/comenzar/tratar + "a" + infinitive
                if i + 2 < tokens.len()
                    && DOUBLE_VERB_LEMMAS.contains(&token.lemma.as_str())
                    && tokens[i + 1].text.to_lowercase() == "a"
                    && tokens[i + 2].has_morph("VerbForm=Inf")
                {
                    claim(&mut annotations[i..i + 3], Category::DoubleVerb);
                    i += 3;
                    continue;
                }
                // imperfect "ir" + gerund
                if i + 1 < tokens.len()
                    && token.lemma == "ir"
                    && token.has_morph("Tense=Imp")
                    && tokens[i + 1].has_morph("VerbForm=Ger")
                {
                    claim(&mut annotations[i..i + 2], Category::DoubleVerb);
                    i += 2;
                    continue;
                }
            }

            // present "haber" + participle
            if toggles.compound_past
                && i + 1 < tokens.len()
                && token.lemma == "haber"
                && token.has_morph("Pres")
                && tokens[i + 1].has_morph("VerbForm=Part")
            {
                claim(&mut annotations[i..i + 2], Category::CompoundPast);
                i += 2;
                continue;
            }

            i += 1;
        }
    }

    /// Marks every token fully contained in a finding span. Malformed spans
    /// (start >= end, out of range) contain no token and drop out naturally.
    fn overlay_findings(
        &self,
        tokens: &[Token],
        findings: &[GrammarFinding],
        toggles: &Toggles,
        annotations: &mut [Annotation],
    ) {
        if !toggles.orthography && !toggles.grammar {
            return;
        }
        for finding in findings {
            let category = match finding.kind() {
                Some(FindingKind::Spelling) if toggles.orthography => Category::Orthography,
                Some(FindingKind::Grammar) if toggles.grammar => Category::Grammar,
                _ => continue,
            };
            for (token, note) in tokens.iter().zip(annotations.iter_mut()) {
                if token.start >= finding.start && token.end <= finding.end {
                    note.marks.insert(category);
                }
            }
        }
    }
}

fn claim(notes: &mut [Annotation], mark: Category) {
    for note in notes {
        note.marks.insert(mark);
        note.claimed = true;
    }
}

/// Contract for the upstream tokenizer/tagger.
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> anyhow::Result<Vec<Token>>;
}

/// Output of one analysis request. Recomputed from scratch per request;
/// nothing is carried over between analyses.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub tokens: Vec<Token>,
    pub findings: Vec<GrammarFinding>,
    /// True when the checker was unreachable and findings degraded to empty.
    pub degraded: bool,
}

/// Ties the tokenizer and checker collaborators together ahead of
/// annotation. The checker call is the only latency-bearing step; its
/// failure degrades the analysis instead of aborting it.
pub struct Pipeline<T, C> {
    tokenizer: T,
    checker: C,
}

impl<T: Tokenizer, C: Checker> Pipeline<T, C> {
    pub fn new(tokenizer: T, checker: C) -> Self {
        Self { tokenizer, checker }
    }

    pub fn analyze(&self, text: &str) -> anyhow::Result<Analysis> {
        let mut tokens = self.tokenizer.tokenize(text)?;
        normalize_pos(&mut tokens);
        let (findings, degraded) = match self.checker.check(text) {
            Ok(findings) => (findings, false),
            Err(err) => {
                log::warn!("grammar checker unavailable, continuing without findings: {err}");
                (Vec::new(), true)
            }
        };
        Ok(Analysis {
            tokens,
            findings,
            degraded,
        })
    }
}
