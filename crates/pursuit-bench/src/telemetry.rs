//! Post-sweep digest of `telemetry.jsonl`.
//!
//! The JSON lines written by the subscriber are folded into a [`TelemetrySummary`],
//! saved next to the log as `telemetry_summary.{json,md}`, and a short highlights
//! block is appended to the sweep's Markdown summary.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use statrs::statistics::Statistics;
use thiserror::Error;

const SURVEY_TARGET: &str = "pursuit_bot::survey";
const ENGINE_TARGET: &str = "pursuit_bot::engine";
const TRIAL_TARGET: &str = "pursuit_bench::trial";

const SUMMARY_JSON: &str = "telemetry_summary.json";
const SUMMARY_MD: &str = "telemetry_summary.md";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("telemetry i/o on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed telemetry line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("encoding telemetry summary: {0}")]
    Encode(#[from] serde_json::Error),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> TelemetryError + '_ {
    move |source| TelemetryError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Default, Serialize)]
pub struct TelemetrySummary {
    pub surveys: SurveyTelemetrySummary,
    pub games: GameTelemetrySummary,
    pub trials_logged: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct SurveyTelemetrySummary {
    pub count: usize,
    pub per_entity: BTreeMap<String, SurveyCounts>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SurveyCounts {
    pub surveys: usize,
    pub hits: usize,
}

impl SurveyCounts {
    pub fn hit_rate(&self) -> Option<f64> {
        (self.surveys > 0).then(|| self.hits as f64 / self.surveys as f64)
    }
}

#[derive(Debug, Default, Serialize)]
pub struct GameTelemetrySummary {
    pub finished: usize,
    pub status_counts: BTreeMap<String, usize>,
    pub avg_rounds: Option<f64>,
    pub sub_turns: usize,
    pub avg_prey_entropy: Option<f64>,
    pub avg_predator_entropy: Option<f64>,
}

/// Raw samples gathered while scanning; averaged once the log is exhausted.
#[derive(Default)]
struct Samples {
    rounds: Vec<f64>,
    prey_entropy: Vec<f64>,
    predator_entropy: Vec<f64>,
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().mean())
}

impl TelemetrySummary {
    fn record(&mut self, target: &str, fields: &Map<String, Value>, samples: &mut Samples) {
        let number = |key: &str| fields.get(key).and_then(Value::as_f64);
        match target {
            SURVEY_TARGET => {
                self.surveys.count += 1;
                let counts = self
                    .surveys
                    .per_entity
                    .entry(label(fields, "entity"))
                    .or_default();
                counts.surveys += 1;
                counts.hits += usize::from(fields.get("found") == Some(&Value::Bool(true)));
            }
            // Only the end-of-game event carries the move counter.
            ENGINE_TARGET if fields.contains_key("agent_moves") => {
                self.games.finished += 1;
                *self
                    .games
                    .status_counts
                    .entry(label(fields, "status"))
                    .or_default() += 1;
                samples.rounds.extend(number("rounds"));
            }
            ENGINE_TARGET => {
                self.games.sub_turns += 1;
                samples.prey_entropy.extend(number("prey_entropy"));
                samples.predator_entropy.extend(number("predator_entropy"));
            }
            TRIAL_TARGET => self.trials_logged += 1,
            _ => {}
        }
    }
}

/// Aggregate survey and engine events from a structured telemetry log.
///
/// A missing log yields an empty summary.
pub fn summarise_telemetry(path: &Path) -> Result<TelemetrySummary, TelemetryError> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(TelemetrySummary::default());
        }
        Err(err) => return Err(io_error(path)(err)),
    };

    let mut summary = TelemetrySummary::default();
    let mut samples = Samples::default();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(io_error(path))?;
        if line.trim().is_empty() {
            continue;
        }
        let event: Value = serde_json::from_str(&line).map_err(|source| TelemetryError::Json {
            line: index + 1,
            source,
        })?;
        let target = event.get("target").and_then(Value::as_str).unwrap_or("");
        let empty = Map::new();
        let fields = event
            .get("fields")
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        summary.record(target, fields, &mut samples);
    }

    summary.games.avg_rounds = mean(&samples.rounds);
    summary.games.avg_prey_entropy = mean(&samples.prey_entropy);
    summary.games.avg_predator_entropy = mean(&samples.predator_entropy);
    Ok(summary)
}

fn label(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key).and_then(Value::as_str).map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => "<unset>".to_string(),
    }
}

/// Digest `telemetry_path` into `output_dir`, or `None` if no log was written.
pub fn write_summary_outputs(
    telemetry_path: &Path,
    output_dir: &Path,
) -> Result<Option<TelemetryOutputs>, TelemetryError> {
    if !telemetry_path.exists() {
        return Ok(None);
    }

    let summary = summarise_telemetry(telemetry_path)?;
    let json_path = output_dir.join(SUMMARY_JSON);
    let markdown_path = output_dir.join(SUMMARY_MD);

    fs::write(&json_path, serde_json::to_vec_pretty(&summary)?).map_err(io_error(&json_path))?;
    let report = Report {
        summary: &summary,
        source: telemetry_path,
    };
    fs::write(&markdown_path, report.to_string()).map_err(io_error(&markdown_path))?;

    Ok(Some(TelemetryOutputs {
        summary,
        json_path,
        markdown_path,
    }))
}

pub fn append_highlights_to_markdown(
    summary_path: &Path,
    outputs: &TelemetryOutputs,
) -> Result<(), TelemetryError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(summary_path)
        .map_err(io_error(summary_path))?;
    write!(file, "{}", Highlights(&outputs.summary)).map_err(io_error(summary_path))
}

struct SurveyLines<'a>(&'a BTreeMap<String, SurveyCounts>);

impl fmt::Display for SurveyLines<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (entity, counts) in self.0 {
            match counts.hit_rate() {
                Some(rate) => writeln!(
                    f,
                    "  - {entity}: {} surveys, {:.1}% found",
                    counts.surveys,
                    rate * 100.0
                )?,
                None => writeln!(f, "  - {entity}: no surveys")?,
            }
        }
        Ok(())
    }
}

struct Outcomes<'a>(&'a BTreeMap<String, usize>);

impl fmt::Display for Outcomes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "- <none>");
        }
        for (status, count) in self.0 {
            writeln!(f, "- {status}: {count}")?;
        }
        Ok(())
    }
}

/// Short block appended to the sweep summary.
struct Highlights<'a>(&'a TelemetrySummary);

impl fmt::Display for Highlights<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let TelemetrySummary { surveys, games, .. } = self.0;
        writeln!(f, "\n## Telemetry Highlights")?;
        writeln!(f, "- Survey events captured: {}", surveys.count)?;
        write!(f, "{}", SurveyLines(&surveys.per_entity))?;
        writeln!(f, "- Games logged: {}", games.finished)?;
        if let Some(rounds) = games.avg_rounds {
            writeln!(f, "- Avg rounds per game: {rounds:.2}")?;
        }
        write!(f, "\n### Logged Outcomes\n{}", Outcomes(&games.status_counts))
    }
}

/// Standalone `telemetry_summary.md`.
struct Report<'a> {
    summary: &'a TelemetrySummary,
    source: &'a Path,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let TelemetrySummary {
            surveys,
            games,
            trials_logged,
        } = self.summary;
        writeln!(f, "# Telemetry Summary\n")?;
        writeln!(f, "- Source: `{}`", self.source.display())?;
        writeln!(f, "- Trials logged: {trials_logged}\n")?;

        writeln!(f, "## Surveys")?;
        writeln!(f, "- Events: {}", surveys.count)?;
        writeln!(f, "{}", SurveyLines(&surveys.per_entity))?;

        writeln!(f, "## Games")?;
        writeln!(f, "- Finished: {}", games.finished)?;
        if let Some(rounds) = games.avg_rounds {
            writeln!(f, "- Avg rounds: {rounds:.2}")?;
        }
        writeln!(f, "- Sub-turns logged: {}", games.sub_turns)?;
        if let Some(entropy) = games.avg_prey_entropy {
            writeln!(f, "- Avg prey belief entropy: {entropy:.3}")?;
        }
        if let Some(entropy) = games.avg_predator_entropy {
            writeln!(f, "- Avg predator belief entropy: {entropy:.3}")?;
        }
        write!(f, "\n## Outcomes\n{}", Outcomes(&games.status_counts))
    }
}

#[derive(Debug)]
pub struct TelemetryOutputs {
    pub summary: TelemetrySummary,
    pub json_path: PathBuf,
    pub markdown_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENTS: [&str; 8] = [
        r#"{"target":"pursuit_bot::survey","fields":{"entity":"predator","agent":3,"node":7,"found":true}}"#,
        r#"{"target":"pursuit_bot::survey","fields":{"entity":"predator","agent":4,"node":8,"found":false}}"#,
        r#"{"target":"pursuit_bot::survey","fields":{"entity":"prey","agent":4,"node":9,"found":false}}"#,
        r#"{"target":"pursuit_bot::engine","fields":{"round":0,"mover":"agent","node":4,"status":"in_progress","prey_entropy":2.0,"predator_entropy":1.0}}"#,
        r#"{"target":"pursuit_bot::engine","fields":{"round":0,"mover":"prey","node":9,"status":"in_progress","prey_entropy":3.0}}"#,
        r#"{"target":"pursuit_bot::engine","fields":{"variant":"agent7","status":"success","rounds":12,"agent_moves":13}}"#,
        r#"{"target":"pursuit_bot::engine","fields":{"variant":"agent7","status":"failure","rounds":4,"agent_moves":5}}"#,
        r#"{"target":"pursuit_bench::trial","fields":{"agent":"combined","success":1}}"#,
    ];

    fn log_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    #[test]
    fn summarises_survey_and_engine_events() {
        let file = log_file(&EVENTS);
        let summary = summarise_telemetry(file.path()).unwrap();

        assert_eq!(summary.surveys.count, 3);
        let predator = summary.surveys.per_entity["predator"];
        assert_eq!(predator, SurveyCounts { surveys: 2, hits: 1 });
        assert_eq!(predator.hit_rate(), Some(0.5));
        assert_eq!(summary.surveys.per_entity["prey"].hits, 0);

        assert_eq!(summary.games.finished, 2);
        assert_eq!(summary.games.status_counts.get("success"), Some(&1));
        assert_eq!(summary.games.status_counts.get("failure"), Some(&1));
        assert_eq!(summary.games.avg_rounds, Some(8.0));
        assert_eq!(summary.games.sub_turns, 2);
        assert_eq!(summary.games.avg_prey_entropy, Some(2.5));
        assert_eq!(summary.games.avg_predator_entropy, Some(1.0));
        assert_eq!(summary.trials_logged, 1);
    }

    #[test]
    fn missing_log_summarises_to_nothing() {
        let summary = summarise_telemetry(Path::new("tests/does/not/exist.jsonl")).unwrap();
        assert_eq!(summary.surveys.count, 0);
        assert!(summary.games.avg_rounds.is_none());
        assert!(summary.games.status_counts.is_empty());
    }

    #[test]
    fn malformed_line_reports_its_position() {
        let file = log_file(&[EVENTS[0], "", "{not json"]);
        let err = summarise_telemetry(file.path()).unwrap_err();
        assert!(matches!(err, TelemetryError::Json { line: 3, .. }));
    }

    #[test]
    fn blank_entity_is_labelled_unset() {
        let file = log_file(&[r#"{"target":"pursuit_bot::survey","fields":{"entity":"  ","found":true}}"#]);
        let summary = summarise_telemetry(file.path()).unwrap();
        assert_eq!(
            summary.surveys.per_entity["<unset>"],
            SurveyCounts { surveys: 1, hits: 1 }
        );
    }

    #[test]
    fn writes_json_and_markdown_digests() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_file(&EVENTS);
        let outputs = write_summary_outputs(log.path(), dir.path())
            .unwrap()
            .expect("log exists");

        let json: Value =
            serde_json::from_slice(&fs::read(&outputs.json_path).unwrap()).unwrap();
        assert_eq!(json["surveys"]["count"], 3);
        assert_eq!(json["games"]["finished"], 2);

        let markdown = fs::read_to_string(&outputs.markdown_path).unwrap();
        assert!(markdown.starts_with("# Telemetry Summary\n"));
        assert!(markdown.contains("  - predator: 2 surveys, 50.0% found"));
        assert!(markdown.contains("- Avg prey belief entropy: 2.500"));
        assert!(markdown.contains("\n## Outcomes\n- failure: 1\n- success: 1\n"));

        assert!(
            write_summary_outputs(&dir.path().join("absent.jsonl"), dir.path())
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn appends_highlights_to_summary_markdown() {
        let mut summary_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(summary_file, "# Trial Summary").unwrap();

        let per_entity = BTreeMap::from([
            ("prey".to_string(), SurveyCounts { surveys: 8, hits: 2 }),
            ("predator".to_string(), SurveyCounts::default()),
        ]);
        let outputs = TelemetryOutputs {
            summary: TelemetrySummary {
                surveys: SurveyTelemetrySummary {
                    count: 8,
                    per_entity,
                },
                games: GameTelemetrySummary {
                    finished: 9,
                    status_counts: BTreeMap::from([("success".to_string(), 9)]),
                    avg_rounds: Some(21.5),
                    ..GameTelemetrySummary::default()
                },
                trials_logged: 3,
            },
            json_path: PathBuf::from(SUMMARY_JSON),
            markdown_path: PathBuf::from(SUMMARY_MD),
        };

        append_highlights_to_markdown(summary_file.path(), &outputs).unwrap();

        let contents = fs::read_to_string(summary_file.path()).unwrap();
        assert!(contents.starts_with("# Trial Summary\n"));
        assert!(contents.contains("## Telemetry Highlights"));
        assert!(contents.contains("Survey events captured: 8"));
        assert!(contents.contains("prey: 8 surveys, 25.0% found"));
        assert!(contents.contains("predator: no surveys"));
        assert!(contents.contains("Avg rounds per game: 21.50"));
        assert!(contents.contains("### Logged Outcomes\n- success: 9"));
    }
}
