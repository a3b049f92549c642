//! External spelling/grammar checker boundary.
//!
//! The engine only consumes `(start, end, category)` spans; this module
//! defines that contract plus a client for LanguageTool-compatible HTTP
//! endpoints. Checker failures must never abort an analysis: the pipeline
//! degrades to an empty finding list instead.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Issue span reported by the external checker, in character offsets into
/// the analyzed text. `category` keeps the checker's raw identifier;
/// [`GrammarFinding::kind`] maps it into the closed set the overlay
/// understands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GrammarFinding {
    pub start: usize,
    /// Exclusive end offset.
    pub end: usize,
    pub category: String,
}

/// Finding categories the overlay distinguishes. Anything else the checker
/// reports is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindingKind {
    Spelling,
    Grammar,
}

impl GrammarFinding {
    pub fn kind(&self) -> Option<FindingKind> {
        match self.category.as_str() {
            "TYPOS" | "MISSPELLING" | "SPELLING" => Some(FindingKind::Spelling),
            "GRAMMAR" => Some(FindingKind::Grammar),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
}

/// Boundary to the external spelling/grammar service.
pub trait Checker {
    fn check(&self, text: &str) -> Result<Vec<GrammarFinding>, CheckerError>;
}

impl<C: Checker + ?Sized> Checker for Box<C> {
    fn check(&self, text: &str) -> Result<Vec<GrammarFinding>, CheckerError> {
        (**self).check(text)
    }
}

/// Checker that reports nothing, for offline runs.
pub struct DisabledChecker;

impl Checker for DisabledChecker {
    fn check(&self, _text: &str) -> Result<Vec<GrammarFinding>, CheckerError> {
        Ok(Vec::new())
    }
}

/// Connection settings for the LanguageTool-compatible endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CheckerConfig {
    pub enabled: bool,
    pub base_url: String,
    pub language: String,
    pub timeout_secs: u64,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.languagetool.org".into(),
            language: "es".into(),
            timeout_secs: 10,
        }
    }
}

/// Blocking client for the LanguageTool `v2/check` API.
pub struct LanguageToolClient {
    config: CheckerConfig,
    client: reqwest::blocking::Client,
}

impl LanguageToolClient {
    pub fn new(config: CheckerConfig) -> Result<Self, CheckerError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    matches: Vec<CheckMatch>,
}

#[derive(Debug, Deserialize)]
struct CheckMatch {
    offset: usize,
    length: usize,
    rule: MatchRule,
}

#[derive(Debug, Deserialize)]
struct MatchRule {
    category: RuleCategory,
}

#[derive(Debug, Deserialize)]
struct RuleCategory {
    id: String,
}

impl From<CheckMatch> for GrammarFinding {
    fn from(m: CheckMatch) -> Self {
        GrammarFinding {
            start: m.offset,
            end: m.offset + m.length,
            category: m.rule.category.id,
        }
    }
}

impl Checker for LanguageToolClient {
    fn check(&self, text: &str) -> Result<Vec<GrammarFinding>, CheckerError> {
        let url = format!("{}/v2/check", self.config.base_url.trim_end_matches('/'));
        let params = [("text", text), ("language", self.config.language.as_str())];
        let response: CheckResponse = self
            .client
            .post(url)
            .form(&params)
            .send()?
            .error_for_status()?
            .json()?;
        Ok(response.matches.into_iter().map(Into::into).collect())
    }
}
