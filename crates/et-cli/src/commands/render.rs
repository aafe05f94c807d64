//! Plain-text rendering shared by the extract and summary commands.

use std::fmt::Write;

use et_core::{Diagnostics, EventRecord, Report, RollUp, Summary};

const SEPARATOR_WIDTH: usize = 80;

fn rule() -> String {
    "-".repeat(SEPARATOR_WIDTH)
}

/// Record counts per bucket plus what the pass could not use.
pub fn format_overview(report: &Report) -> String {
    let mut out = String::new();
    let diagnostics: &Diagnostics = &report.extraction.diagnostics;

    let _ = writeln!(out, "Extracted {} records", report.extraction.records.len());
    let _ = writeln!(
        out,
        "Lines: {} (inert {}), orphan terminators: {}, unterminated intervals: {}",
        diagnostics.lines,
        diagnostics.inert_lines,
        diagnostics.orphan_terminators,
        diagnostics.unterminated
    );
    let _ = writeln!(out, "Records by bucket:");
    for (name, records) in report.buckets.iter() {
        let _ = writeln!(out, "  {name}: {}", records.len());
    }
    out
}

fn format_rollup(out: &mut String, label: &str, rollup: &RollUp) {
    let _ = writeln!(
        out,
        "{label}: {} total, {} success, {} failed, {} skipped, {:.2}s (avg {:.2}s)",
        rollup.total,
        rollup.success_count,
        rollup.failed_count,
        rollup.skipped_count,
        rollup.total_time,
        rollup.avg_time
    );
}

/// Per-category statistics table followed by the roll-ups.
pub fn format_statistics_table(summary: &Summary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Statistics by type (skipped records carry no time):");
    let _ = writeln!(out, "{}", rule());
    let _ = writeln!(
        out,
        "{:<30} {:>7} {:>7} {:>7} {:>10} {:>10} {:>10} {:>10}",
        "type", "success", "failed", "skipped", "total(s)", "avg(s)", "min(s)", "max(s)"
    );
    let _ = writeln!(out, "{}", rule());

    for (kind, stats) in &summary.categories {
        let _ = writeln!(
            out,
            "{:<30} {:>7} {:>7} {:>7} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
            kind.as_str(),
            stats.count,
            stats.failed_count,
            stats.skipped_count,
            stats.total_time,
            stats.avg_time,
            stats.min_time,
            stats.max_time
        );
    }

    let _ = writeln!(out, "{}", rule());
    format_rollup(&mut out, "tools", &summary.tools);
    format_rollup(&mut out, "knowledge", &summary.knowledge);
    format_rollup(&mut out, "total", &summary.total);
    out
}

/// The first `limit` records in emission order.
pub fn format_preview(records: &[EventRecord], limit: usize) -> String {
    let mut out = String::new();
    let shown = records.len().min(limit);
    let _ = writeln!(out, "First {shown} of {} records:", records.len());
    let _ = writeln!(out, "{}", rule());
    let _ = writeln!(
        out,
        "{:>4}  {:<36}  {:<30}  {:<19}  {:>11}  {:>6}",
        "#", "node_id", "type", "start", "duration(s)", "line"
    );
    let _ = writeln!(out, "{}", rule());

    for (i, record) in records.iter().take(limit).enumerate() {
        let _ = writeln!(
            out,
            "{:>4}  {:<36}  {:<30}  {:<19}  {:>11.2}  {:>6}",
            i + 1,
            record.node_id.as_str(),
            record.kind.as_str(),
            record.start_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            record.duration_secs(),
            record.start_line
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use et_core::extract_lines;
    use insta::assert_snapshot;

    const TOOL: &str = "11111111-2222-3333-4444-555555555555";
    const LLM: &str = "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee";

    fn sample_report() -> Report {
        Report::build(extract_lines(vec![
            format!("2025-01-01 10:00:00.000000 tool_enhancement_node [{TOOL}] started"),
            format!("2025-01-01 10:00:01.250000 Tool calls in [{TOOL}] finished"),
            format!("2025-01-01 10:00:01.250000 LLM call with tool messages [{LLM}] started"),
            format!("2025-01-01 10:00:04.000000 LLM call with tool messages [{LLM}] ended"),
            "no timestamp here".to_string(),
        ]))
    }

    #[test]
    fn overview_lists_every_bucket() {
        let output = format_overview(&sample_report());
        assert_snapshot!(output, @r"
        Extracted 3 records
        Lines: 5 (inert 1), orphan terminators: 0, unterminated intervals: 0
        Records by bucket:
          tool_complete: 1
          tool_finished: 1
          tool_failed: 0
          skipped: 0
          llm_call: 1
          method1: 0
          method2: 0
          method2_discarded: 0
          knowledge: 0
          all: 1
          all_success: 1
        ");
    }

    #[test]
    fn statistics_table_rows_and_rollups() {
        let output = format_statistics_table(&sample_report().summary);
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "Statistics by type (skipped records carry no time):");
        assert!(lines[2].starts_with("type "));
        assert!(lines[4].starts_with("tool_enhancement_finished "));
        assert!(lines[4].ends_with("1.25"));
        assert!(lines[5].starts_with("tool_enhancement_complete "));
        assert!(lines[5].ends_with("4.00"));
        assert!(lines[6].starts_with("llm_call "));
        assert!(lines[6].ends_with("2.75"));
        assert!(output.contains("tools: 2 total, 2 success, 0 failed, 0 skipped, 5.25s"));
        assert!(output.contains("knowledge: 0 total, 0 success, 0 failed, 0 skipped, 0.00s (avg 0.00s)"));
        assert!(output.contains("total: 3 total, 3 success, 0 failed, 0 skipped, 8.00s (avg 2.67s)"));
    }

    #[test]
    fn preview_respects_limit() {
        let report = sample_report();
        let output = format_preview(&report.extraction.records, 2);
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "First 2 of 3 records:");
        assert_eq!(lines.len(), 6);
        assert!(lines[4].contains(TOOL));
        assert!(lines[4].contains("tool_enhancement_finished"));
        assert!(lines[4].contains("2025-01-01 10:00:00"));
        assert!(lines[5].contains(LLM));
        assert!(lines[5].ends_with("3"));
    }
}
