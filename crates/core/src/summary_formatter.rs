#![allow(clippy::format_push_string)]

use crate::report::RunReport;
use std::path::Path;
use std::time::Duration;

/// Wall-clock time spent in each stage of a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageTimings {
    pub total: Duration,
    pub download: Duration,
    pub positions: Duration,
    pub convert: Duration,
    pub prices: Duration,
    pub process: Duration,
}

pub struct SummaryFormatter;

impl SummaryFormatter {
    #[must_use]
    pub fn format(timings: &StageTimings, report: &RunReport, output_dir: &Path) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str("                    RUN SUMMARY                                \n");
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output.push_str("Timings\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!("Total:          {}\n", format_duration(timings.total)));
        output.push_str(&format!("Download:       {}\n", format_duration(timings.download)));
        output.push_str(&format!("Positions:      {}\n", format_duration(timings.positions)));
        output.push_str(&format!("Conversion:     {}\n", format_duration(timings.convert)));
        output.push_str(&format!("Prices:         {}\n", format_duration(timings.prices)));
        output.push_str(&format!("Processing:     {}\n", format_duration(timings.process)));
        output.push('\n');

        output.push_str("Instruments\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!(
            "Written:        {}/{}\n",
            report.written(),
            report.total()
        ));
        for (instrument, stage, reason) in report.skipped() {
            output.push_str(&format!("Skipped {instrument} at {stage}: {reason}\n"));
        }
        output.push('\n');

        output.push_str(&format!("Results:        {}\n", output_dir.display()));
        output.push_str("═══════════════════════════════════════════════════════════════\n");

        output
    }
}

/// Renders a duration as seconds, minutes, or hours and minutes.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs_f64();
    if seconds < 60.0 {
        format!("{seconds:.1}s")
    } else if seconds < 3600.0 {
        format!("{:.1}m", seconds / 60.0)
    } else {
        let total = duration.as_secs();
        format!("{}h {}m", total / 3600, (total % 3600) / 60)
    }
}
