use std::io::Write;

use clap::ValueEnum;

use crate::error::Result;
use crate::models::Task;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

const CSV_HEADER: [&str; 7] = ["Date", "Task", "Time", "Priority", "Completed", "On Time", "Points"];

/// Writes tasks in the requested format.
pub fn write_tasks<W: Write>(out: &mut W, tasks: &[Task], format: ExportFormat) -> Result<()> {
    match format {
        ExportFormat::Csv => write_csv(out, tasks),
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, tasks)?;
            writeln!(out)?;
            Ok(())
        }
    }
}

fn write_csv<W: Write>(out: &mut W, tasks: &[Task]) -> Result<()> {
    writeln!(out, "{}", CSV_HEADER.join(","))?;
    for t in tasks {
        let row = [
            t.date.format("%Y-%m-%d").to_string(),
            csv_field(&t.title),
            t.time.format("%H:%M").to_string(),
            t.priority.to_string(),
            yes_no(t.completed).to_string(),
            yes_no(t.on_time()).to_string(),
            t.points_earned.to_string(),
        ];
        writeln!(out, "{}", row.join(","))?;
    }
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

/// Quotes a field when it contains a delimiter, quote or line break.
fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_only_when_needed() {
        assert_eq!(csv_field("Write report"), "Write report");
        assert_eq!(csv_field("Call mom, dad"), "\"Call mom, dad\"");
        assert_eq!(csv_field("Say \"hi\""), "\"Say \"\"hi\"\"\"");
    }
}
