//! Token model shared by the matchers and the renderer.

use serde::{Deserialize, Serialize};

/// Coarse part-of-speech tag as reported by the upstream tagger.
///
/// Only the four tags the matchers care about are distinguished; every other
/// tag collapses into [`PosTag::Other`] at deserialization time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PosTag {
    #[serde(rename = "NOUN")]
    Noun,
    #[serde(rename = "ADJ")]
    Adj,
    #[serde(rename = "VERB")]
    Verb,
    #[serde(rename = "ADV")]
    Adv,
    #[serde(rename = "X", other)]
    Other,
}

impl PosTag {
    /// Tags the repetition/rhyme scan compares against each other.
    pub fn is_content_word(self) -> bool {
        matches!(self, PosTag::Noun | PosTag::Adj | PosTag::Verb)
    }
}

/// One analyzed token as produced by the upstream NLP pipeline.
///
/// `start`/`end` are character offsets into the exact text that was
/// tokenized. `ws` is the run of whitespace following the token within its
/// line; concatenating `text` and `ws` for every token in order reproduces
/// the original text line by line. Line breaks (1 char) and paragraph breaks
/// (2 chars) are not part of any token and are reconstructed by the
/// renderer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    /// Position in the token sequence, 0-based and contiguous.
    #[serde(rename = "i")]
    pub index: usize,
    pub text: String,
    pub lemma: String,
    pub pos: PosTag,
    /// Morphological features as `Feature=Value` pairs separated by `|`.
    #[serde(default)]
    pub morph: String,
    pub start: usize,
    /// Exclusive end offset.
    pub end: usize,
    #[serde(default)]
    pub ws: String,
}

impl Token {
    /// Substring lookup into the morphological feature string, e.g.
    /// `token.has_morph("VerbForm=Inf")`.
    pub fn has_morph(&self, feature: &str) -> bool {
        self.morph.contains(feature)
    }
}

/// Parses a token dump exported from the external tagger (a JSON array with
/// the upstream field names `i`, `text`, `lemma`, `pos`, `morph`, `start`,
/// `end`, `ws`).
pub fn tokens_from_json(data: &str) -> serde_json::Result<Vec<Token>> {
    serde_json::from_str(data)
}

/// Diminutive/augmentative endings the tagger mislabels as adjectives.
const NOUN_LIKE_ENDINGS: [&str; 6] = ["ita", "ito", "itas", "itos", "ote", "otes"];

/// Reclassifies diminutive/augmentative forms tagged ADJ as nouns.
pub fn corrected_pos(text: &str, pos: PosTag) -> PosTag {
    if pos == PosTag::Adj {
        let lowered = text.to_lowercase();
        if NOUN_LIKE_ENDINGS
            .iter()
            .any(|ending| lowered.ends_with(ending))
        {
            return PosTag::Noun;
        }
    }
    pos
}

/// Applies [`corrected_pos`] to a freshly tokenized sequence. Must run
/// before any matcher sees the tokens.
pub fn normalize_pos(tokens: &mut [Token]) {
    for token in tokens.iter_mut() {
        token.pos = corrected_pos(&token.text, token.pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diminutive_adjective_becomes_noun() {
        assert_eq!(corrected_pos("gatito", PosTag::Adj), PosTag::Noun);
        assert_eq!(corrected_pos("casitas", PosTag::Adj), PosTag::Noun);
        assert_eq!(corrected_pos("grandote", PosTag::Adj), PosTag::Noun);
    }

    #[test]
    fn correction_only_applies_to_adjectives() {
        assert_eq!(corrected_pos("gatito", PosTag::Verb), PosTag::Verb);
        assert_eq!(corrected_pos("bonito", PosTag::Adj), PosTag::Noun);
        assert_eq!(corrected_pos("rojo", PosTag::Adj), PosTag::Adj);
    }

    #[test]
    fn parses_upstream_dump_field_names() {
        let data = r#"[
            {"i": 0, "text": "Ella", "lemma": "él", "pos": "PRON",
             "morph": "Case=Nom|Gender=Fem", "start": 0, "end": 4, "ws": " "},
            {"i": 1, "text": "corre", "lemma": "correr", "pos": "VERB",
             "morph": "Mood=Ind|Tense=Pres", "start": 5, "end": 10, "ws": ""}
        ]"#;
        let tokens = tokens_from_json(data).unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].pos, PosTag::Other);
        assert_eq!(tokens[1].pos, PosTag::Verb);
        assert_eq!(tokens[1].start, 5);
        assert!(tokens[1].has_morph("Tense=Pres"));
    }

    #[test]
    fn missing_morph_and_ws_default_to_empty() {
        let data = r#"[{"i": 0, "text": ".", "lemma": ".", "pos": "PUNCT",
                        "start": 0, "end": 1}]"#;
        let tokens = tokens_from_json(data).unwrap();
        assert_eq!(tokens[0].morph, "");
        assert_eq!(tokens[0].ws, "");
    }
}
