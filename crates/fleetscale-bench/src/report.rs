//! Summary table and JSON export

use crate::error::Result;
use crate::result::{BackendOutcome, BenchmarkResult};
use std::path::Path;

const RULE_WIDTH: usize = 60;

fn time_cell(outcome: Option<&BackendOutcome>) -> String {
    match outcome {
        Some(o) if o.success => format!("{:.3}s", o.time),
        _ => "n/a".to_string(),
    }
}

/// Fixed-width summary of a run
pub fn render_summary(results: &[BenchmarkResult], hosts: usize) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines = vec![
        rule.clone(),
        format!("  SUMMARY ({} hosts)", hosts),
        rule,
        format!(
            "  {:<25} {:>10} {:>10} {:>10}",
            "Test", "Ansible", "FTL2", "Speedup"
        ),
        format!(
            "  {:<25} {:>10} {:>10} {:>10}",
            "-".repeat(25),
            "-".repeat(10),
            "-".repeat(10),
            "-".repeat(10)
        ),
    ];

    for r in results {
        let speedup = match r.speedup {
            Some(s) => format!("{:.1}x", s),
            None => "n/a".to_string(),
        };
        lines.push(format!(
            "  {:<25} {:>10} {:>10} {:>10}",
            r.name,
            time_cell(r.baseline.as_ref()),
            time_cell(r.candidate.as_ref()),
            speedup
        ));
    }

    lines.join("\n")
}

/// Write results as pretty JSON with a trailing newline
pub async fn write_json(path: &Path, results: &[BenchmarkResult]) -> Result<()> {
    let mut content = serde_json::to_string_pretty(results)?;
    content.push('\n');
    tokio::fs::write(path, content).await?;
    tracing::info!("Results written to {}", path.display());
    Ok(())
}
