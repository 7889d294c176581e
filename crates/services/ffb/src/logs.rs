use std::{fs::File, io::Write, path::Path};

use strip_ansi_escapes::strip;
use tracing::info;

use crate::pipeline::PipelineReport;
use crate::prelude::*;

fn strip_ansi_codes(input: &str) -> String {
    String::from_utf8_lossy(&strip(input.as_bytes())).to_string()
}

/// Writes captured logs to `path`, without terminal colour codes.
pub fn dump_logs_to_file(report: &PipelineReport, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    dump_logs_internal(report, &mut file, true)?;
    info!("Logs written to {:?}", path);
    Ok(())
}

pub fn dump_logs<W: Write>(report: &PipelineReport, writer: W) -> Result<()> {
    dump_logs_internal(report, writer, false)
}

fn dump_logs_internal<W: Write>(
    report: &PipelineReport,
    mut writer: W,
    strip_ansi: bool,
) -> Result<()> {
    for entry in report.entries.iter().filter(|entry| !entry.logs.is_empty()) {
        writeln!(writer, "========================")?;
        writeln!(writer, "Log outputs for {}", entry.name)?;
        writeln!(writer, "========================")?;

        for log_line in entry.logs.iter() {
            if strip_ansi {
                write!(writer, "{}", strip_ansi_codes(log_line))?;
            } else {
                write!(writer, "{}", log_line)?;
            }
        }

        writeln!(writer)?;
    }

    Ok(())
}
