use std::env;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use libtest_mimic::{Arguments, Failed, Trial};
use readalong_rs::alignment::fuzzy_match::align_units;
use readalong_rs::alignment::restore::restore_selection;
use readalong_rs::alignment::tokenization::tokenize_range;
use readalong_rs::dom::{Document, DomRange, NodeId};
use readalong_rs::pipeline::scheduler::resolve_active;
use readalong_rs::{ReaderConfig, TimingHint};
use serde::Deserialize;

const SUITE_NAME: &str = "alignment_fixture";

#[derive(Debug, Deserialize)]
struct AlignmentFixture {
    #[serde(default)]
    description: String,
    /// Selection as a single text node.
    #[serde(default)]
    text: Option<String>,
    /// Selection as consecutive inline elements, one text node each.
    #[serde(default)]
    segments: Vec<String>,
    #[serde(default)]
    window: Option<usize>,
    hints: Vec<TimingHint>,
    expected_units: Vec<String>,
    expected_map: Vec<i64>,
    #[serde(default)]
    samples: Vec<ActiveSample>,
}

#[derive(Debug, Deserialize)]
struct ActiveSample {
    t: f64,
    active: Option<usize>,
}

fn main() {
    let args = Arguments::from_args();
    let dir = resolve_fixture_dir();

    let fixtures = match load_fixtures(&dir) {
        Ok(fixtures) => fixtures,
        Err(err) => {
            run_setup_failure(&args, err);
            return;
        }
    };
    if fixtures.is_empty() {
        run_setup_failure(
            &args,
            format!("No alignment fixtures found under '{}'.", dir.display()),
        );
        return;
    }

    let tests = fixtures
        .into_iter()
        .map(|(name, fixture)| {
            Trial::test(format!("{SUITE_NAME}::{name}"), move || {
                run_fixture(&name, &fixture).map_err(Failed::from)
            })
        })
        .collect();

    libtest_mimic::run(&args, tests).exit();
}

fn run_setup_failure(args: &Arguments, message: String) {
    let test = Trial::test(format!("{SUITE_NAME}::setup"), move || {
        Err(Failed::from(message))
    });
    libtest_mimic::run(args, vec![test]).exit();
}

fn run_fixture(name: &str, fixture: &AlignmentFixture) -> Result<(), String> {
    let (mut doc, container) = build_page(fixture)
        .map_err(|err| format!("{name}: could not build page: {err}"))?;
    let original_markup = doc.to_markup(container);
    let original_text = doc.text_content(container);

    let range = DomRange::select_contents(&doc, container);
    let mut selection = tokenize_range(&mut doc, &range, ReaderConfig::DEFAULT_WORD_CLASS);
    let units: Vec<&str> = selection.units().iter().map(|u| u.text.as_str()).collect();
    if units != fixture.expected_units {
        return Err(format!(
            "{name}: tokenization mismatch (expected {:?}, got {:?}) [{}]",
            fixture.expected_units, units, fixture.description
        ));
    }
    if doc.text_content(container) != original_text {
        return Err(format!("{name}: tokenization changed the visible text"));
    }

    let window = fixture.window.unwrap_or(ReaderConfig::DEFAULT_MATCH_WINDOW);
    let map = align_units(selection.units(), &fixture.hints, window);
    if map.to_sentinel_vec() != fixture.expected_map {
        return Err(format!(
            "{name}: alignment mismatch (expected {:?}, got {:?}) [{}]",
            fixture.expected_map,
            map.to_sentinel_vec(),
            fixture.description
        ));
    }
    if !map.is_monotonic() {
        return Err(format!("{name}: mapped hint indices are not increasing"));
    }

    for sample in &fixture.samples {
        let active = resolve_active(sample.t, &map, &fixture.hints);
        if active != sample.active {
            return Err(format!(
                "{name}: at t={:.3} expected active {:?}, got {:?}",
                sample.t, sample.active, active
            ));
        }
    }

    let summary = restore_selection(&mut doc, &mut selection);
    if summary.restored != fixture.expected_units.len() || summary.skipped != 0 {
        return Err(format!("{name}: unexpected restore summary {summary:?}"));
    }
    let restored_markup = doc.to_markup(container);
    if restored_markup != original_markup {
        return Err(format!(
            "{name}: restore mismatch (expected '{original_markup}', got '{restored_markup}')"
        ));
    }

    Ok(())
}

fn build_page(fixture: &AlignmentFixture) -> Result<(Document, NodeId), String> {
    let mut doc = Document::new();
    let container = doc
        .append_element(doc.root(), "p")
        .map_err(|err| err.to_string())?;
    match (&fixture.text, fixture.segments.is_empty()) {
        (Some(text), true) => {
            doc.append_text(container, text)
                .map_err(|err| err.to_string())?;
        }
        (None, false) => {
            for segment in &fixture.segments {
                let inline = doc
                    .append_element(container, "em")
                    .map_err(|err| err.to_string())?;
                doc.append_text(inline, segment)
                    .map_err(|err| err.to_string())?;
            }
        }
        _ => return Err("exactly one of `text` or `segments` must be set".to_string()),
    }
    Ok((doc, container))
}

fn load_fixtures(dir: &Path) -> Result<Vec<(String, AlignmentFixture)>, String> {
    let entries = fs::read_dir(dir)
        .map_err(|err| format!("Failed to list fixtures in '{}': {err}", dir.display()))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|err| format!("Failed to read fixture entry: {err}"))?
            .path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            paths.push(path);
        }
    }
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("unnamed")
                .to_string();
            let file = File::open(&path)
                .map_err(|err| format!("Failed to open fixture '{}': {err}", path.display()))?;
            let fixture = serde_json::from_reader(BufReader::new(file))
                .map_err(|err| format!("Failed to parse fixture '{}': {err}", path.display()))?;
            Ok((name, fixture))
        })
        .collect()
}

fn resolve_fixture_dir() -> PathBuf {
    let repo_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let dir = env::var("READALONG_FIXTURE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("tests/fixtures"));
    if dir.is_absolute() {
        dir
    } else {
        repo_root.join(dir)
    }
}
