//! Score report output: JSON for external charting, a text table for the
//! terminal.
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::ScoreResult;
use crate::profile::Metric;

/// `{"<candidate>": {"score": f64, "<metric>": distance, ...}, ...}`
pub fn to_json(results: &[ScoreResult]) -> Value {
    let report = results
        .iter()
        .map(|result| {
            let mut entry = Map::new();
            entry.insert("score".to_string(), Value::from(result.score));
            for (metric, distance) in &result.distances {
                entry.insert(metric.name().to_string(), Value::from(*distance));
            }
            (result.candidate.clone(), Value::Object(entry))
        })
        .collect::<Map<_, _>>();
    Value::Object(report)
}

pub fn write_json(results: &[ScoreResult], path: &Path) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &to_json(results))?;
    writer.write_all(b"\n")?;
    writer.flush()
}

/// Fixed-width table: language, score, then one column per reported metric.
/// Rows keep the ranking order.
pub fn render_table(results: &[ScoreResult]) -> String {
    let columns: BTreeSet<Metric> = results
        .iter()
        .flat_map(|result| result.distances.keys().copied())
        .collect();

    let mut table = format!("{:<30}{:<20}", "language", "score");
    for metric in &columns {
        table.push_str(&format!("{:<20}", metric.name()));
    }
    table.push('\n');

    for result in results {
        table.push_str(&format!("{:<30}{:<20.6}", result.candidate, result.score));
        for metric in &columns {
            let cell = match result.distances.get(metric) {
                Some(distance) => format!("{distance:<20.6}"),
                None => format!("{:<20}", "-"),
            };
            table.push_str(&cell);
        }
        table.push('\n');
    }
    table
}
