#[path = "align_report/report_output.rs"]
mod report_output;

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use readalong_rs::alignment::fuzzy_match::align_units;
use readalong_rs::alignment::report::{compute_report, AlignmentReport};
use readalong_rs::alignment::restore::restore_selection;
use readalong_rs::alignment::tokenization::tokenize_range;
use readalong_rs::dom::{Document, DomRange};
use readalong_rs::{ReaderConfig, TimingHint};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "align_report")]
#[command(about = "Align a text against word timing hints and report coverage")]
struct Args {
    /// Plain text file holding the words that would be selected on the page.
    #[arg(long, env = "READALONG_REPORT_TEXT")]
    text: PathBuf,
    /// Timing hints, either a bare array or an object with a `timings` field.
    #[arg(long, env = "READALONG_REPORT_TIMINGS")]
    timings: PathBuf,
    /// Reader config JSON; only the word class and match window are used.
    #[arg(long, env = "READALONG_REPORT_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "READALONG_REPORT_WINDOW")]
    window: Option<usize>,
    #[arg(long, env = "READALONG_REPORT_OUT")]
    out: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TimingsFile {
    Bare(Vec<TimingHint>),
    Wrapped { timings: Vec<TimingHint> },
}

impl TimingsFile {
    fn into_hints(self) -> Vec<TimingHint> {
        match self {
            TimingsFile::Bare(hints) | TimingsFile::Wrapped { timings: hints } => hints,
        }
    }
}

#[derive(Debug, Serialize)]
struct WordRow {
    ordinal: usize,
    text: String,
    hint: Option<usize>,
    start: Option<f64>,
    end: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ReportFile {
    match_window: usize,
    words: Vec<WordRow>,
    report: AlignmentReport,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("align_report: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = Args::parse();

    let config = match args.config.as_ref() {
        Some(path) => ReaderConfig::load(path).map_err(|err| err.to_string())?,
        None => ReaderConfig::default(),
    };
    let window = args.window.unwrap_or(config.match_window).max(1);

    let text = fs::read_to_string(&args.text)
        .map_err(|err| format!("Failed to read text '{}': {err}", args.text.display()))?;
    let hints = load_hints(&args.timings)?;

    let mut doc = Document::new();
    let paragraph = doc
        .append_element(doc.root(), "p")
        .map_err(|err| err.to_string())?;
    doc.append_text(paragraph, &text)
        .map_err(|err| err.to_string())?;
    let range = DomRange::select_contents(&doc, paragraph);
    let mut selection = tokenize_range(&mut doc, &range, &config.word_class);
    let map = align_units(selection.units(), &hints, window);

    let words: Vec<WordRow> = selection
        .units()
        .iter()
        .map(|unit| {
            let hint = map.get(unit.ordinal);
            let timing = hint.and_then(|idx| hints.get(idx));
            WordRow {
                ordinal: unit.ordinal,
                text: unit.text.clone(),
                hint,
                start: timing.map(|h| h.start),
                end: timing.map(|h| h.end),
            }
        })
        .collect();
    let texts: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
    let report = compute_report(&texts, &hints, &map);
    restore_selection(&mut doc, &mut selection);

    tracing::info!(
        unit_count = report.unit_count,
        mapped_count = report.mapped_count,
        coverage = report.coverage,
        "align_report: aligned"
    );

    let output = ReportFile {
        match_window: window,
        words,
        report,
    };
    report_output::emit(&output, args.out.as_deref())
}

fn load_hints(path: &Path) -> Result<Vec<TimingHint>, String> {
    let data = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read timings '{}': {err}", path.display()))?;
    let file: TimingsFile = serde_json::from_str(&data)
        .map_err(|err| format!("Failed to parse timings '{}': {err}", path.display()))?;
    Ok(file.into_hints())
}
