use std::{collections::BTreeMap, fs, path::PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser};
use console::style;
use estilo_core::{
    legend_html, tokens_from_json, Annotator, Category, Checker, CheckerConfig, DisabledChecker,
    LanguageToolClient, MarkupReport, Pipeline, RepetitionTuning, Toggles, Token, Tokenizer,
};
use serde::{Deserialize, Serialize};

/// Spanish prose style annotator CLI entry point.
#[derive(Debug, Parser)]
#[command(name = "estilo", about = "Annotate Spanish prose for stylistic patterns.")]
struct Args {
    /// Text file to annotate (plain UTF-8).
    #[arg(value_name = "TEXT")]
    text: PathBuf,

    /// Token dump for the text, as JSON exported from the NLP pipeline.
    #[arg(long, value_name = "FILE")]
    tokens: PathBuf,

    /// Path to config file (YAML). Defaults to estilo.yml if present.
    #[arg(long, default_value = "estilo.yml")]
    config: PathBuf,

    /// Emit the full report as JSON.
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Write the annotated HTML document (with legend) to this file.
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Enable only these categories (comma-separated). Implies disabling others.
    #[arg(long, value_delimiter = ',', value_name = "CAT[,CAT]")]
    only: Vec<String>,

    /// Enable additional categories (comma-separated).
    #[arg(long, value_delimiter = ',', value_name = "CAT[,CAT]")]
    enable: Vec<String>,

    /// Disable categories (comma-separated).
    #[arg(long, value_delimiter = ',', value_name = "CAT[,CAT]")]
    disable: Vec<String>,

    /// Skip the external spelling/grammar check.
    #[arg(long, action = ArgAction::SetTrue)]
    no_check: bool,
}

/// On-disk configuration, all sections optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct FileConfig {
    toggles: Toggles,
    tuning: RepetitionTuning,
    checker: CheckerConfig,
}

/// Replays a token dump produced by the external tagger.
struct DumpTokenizer {
    tokens: Vec<Token>,
}

impl Tokenizer for DumpTokenizer {
    fn tokenize(&self, _text: &str) -> anyhow::Result<Vec<Token>> {
        Ok(self.tokens.clone())
    }
}

#[derive(Debug, Serialize)]
struct OutputReport<'a> {
    word_count: usize,
    degraded: bool,
    category_counts: &'a BTreeMap<Category, usize>,
    html: &'a str,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let cfg = load_config(&args.config)?;
    let mut toggles = cfg.toggles.clone();
    apply_category_flags(&mut toggles, &args.only, &args.enable, &args.disable)?;

    let text = fs::read_to_string(&args.text)
        .with_context(|| format!("Failed to read {}", args.text.display()))?;
    let tokens = load_tokens(&args.tokens, &text)?;
    log::debug!(
        "analyzing {} chars with {} tokens",
        text.chars().count(),
        tokens.len()
    );

    let checker: Box<dyn Checker> = if args.no_check || !cfg.checker.enabled {
        Box::new(DisabledChecker)
    } else {
        Box::new(LanguageToolClient::new(cfg.checker.clone())?)
    };

    let pipeline = Pipeline::new(DumpTokenizer { tokens }, checker);
    let analysis = pipeline.analyze(&text)?;
    if analysis.degraded && !args.json {
        eprintln!(
            "{}",
            style("warning: grammar checker unreachable, spelling/grammar marks skipped")
                .yellow()
        );
    }

    let annotator = Annotator::new(cfg.tuning.clone());
    let report = annotator.render(&text, &analysis.tokens, &analysis.findings, &toggles);

    if let Some(out) = &args.out {
        fs::write(out, export_document(&report))
            .with_context(|| format!("Failed to write {}", out.display()))?;
        if !args.json {
            println!("{} {}", style("Documento escrito en").bold(), out.display());
        }
    }

    if args.json {
        let output = OutputReport {
            word_count: report.word_count,
            degraded: analysis.degraded,
            category_counts: &report.category_counts,
            html: &report.html,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_summary(&report, &toggles);
    }

    Ok(())
}

fn load_config(path: &PathBuf) -> anyhow::Result<FileConfig> {
    if path.exists() {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let cfg: FileConfig = serde_yaml::from_str(&text)
            .with_context(|| format!("Invalid config structure in {}", path.display()))?;
        Ok(cfg)
    } else {
        Ok(FileConfig::default())
    }
}

fn load_tokens(path: &PathBuf, text: &str) -> anyhow::Result<Vec<Token>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read token dump {}", path.display()))?;
    let tokens = tokens_from_json(&data)
        .with_context(|| format!("Invalid token dump in {}", path.display()))?;
    let char_count = text.chars().count();
    if let Some(token) = tokens.iter().find(|t| t.end > char_count) {
        anyhow::bail!(
            "token `{}` ends past the text ({} > {} chars); is the dump for this text?",
            token.text,
            token.end,
            char_count
        );
    }
    Ok(tokens)
}

fn parse_category(name: &str) -> anyhow::Result<Category> {
    let n = name.trim().to_lowercase();
    match n.as_str() {
        "adverbios" | "adverbs" => Ok(Category::Adverb),
        "adjetivos" | "adjectives" => Ok(Category::Adjective),
        "repeticiones_totales" | "repeticiones" | "repetitions" => Ok(Category::Repetition),
        "rimas_parciales" | "rimas" | "rhymes" => Ok(Category::PartialRhyme),
        "dobles_verbos" | "double-verbs" => Ok(Category::DoubleVerb),
        "preterito_compuesto" | "compound-past" => Ok(Category::CompoundPast),
        "orthography" | "ortografia" | "ortografía" => Ok(Category::Orthography),
        "grammar" | "gramatica" | "gramática" => Ok(Category::Grammar),
        _ => anyhow::bail!("unknown category `{name}`"),
    }
}

fn apply_category_flags(
    toggles: &mut Toggles,
    only: &[String],
    enable: &[String],
    disable: &[String],
) -> anyhow::Result<()> {
    if !only.is_empty() {
        *toggles = Toggles::none();
        for name in only {
            toggles.set(parse_category(name)?, true);
        }
    }
    for name in enable {
        toggles.set(parse_category(name)?, true);
    }
    for name in disable {
        toggles.set(parse_category(name)?, false);
    }
    Ok(())
}

/// Complete HTML document with the legend ahead of the annotated body,
/// ready for downstream export.
fn export_document(report: &MarkupReport) -> String {
    format!(
        "<html><body style=\"font-family: Arial;\">{}{}</body></html>",
        legend_html(&report.category_counts),
        report.html
    )
}

fn print_summary(report: &MarkupReport, toggles: &Toggles) {
    println!("{}", style("Marcas por categoría:").bold());
    for category in Category::ALL {
        let count = report.category_counts.get(&category).copied().unwrap_or(0);
        let label = format!("{} ({count})", category.label());
        if toggles.get(category) {
            println!("  - {}", style(label).cyan());
        } else {
            println!("  - {}", style(label).dim());
        }
    }
    println!();
    println!(
        "{} palabras, {} marcas en total",
        report.word_count,
        report.total_marks()
    );
}
