//! Implementation of the `et extract` command.
//!
//! Runs the extraction over one log, prints the overview, statistics table and
//! a record preview, then writes the statistics artifact plus one detail
//! artifact per bucket.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use et_core::{BucketName, Report, extract_file};

use super::render::{format_overview, format_preview, format_statistics_table};
use crate::Config;

/// Path of the statistics artifact for a log stem.
pub fn statistics_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{stem}_enhancement_statistics.json"))
}

/// Path of one bucket's detail artifact for a log stem.
pub fn artifact_path(dir: &Path, stem: &str, bucket: BucketName) -> PathBuf {
    dir.join(format!("{stem}_enhancement_times_{bucket}.json"))
}

/// Run the extract command.
///
/// Returns the artifact paths written, statistics first.
pub fn run<W: Write>(
    writer: &mut W,
    log: &Path,
    output_dir: Option<&Path>,
    config: &Config,
) -> Result<Vec<PathBuf>> {
    let extraction = extract_file(log).context("extraction failed")?;
    let report = Report::build(extraction);

    writeln!(writer, "{}", format_overview(&report))?;
    writeln!(writer, "{}", format_statistics_table(&report.summary))?;
    writeln!(
        writer,
        "{}",
        format_preview(&report.extraction.records, config.preview_count)
    )?;

    let dir = resolve_output_dir(log, output_dir, config);
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create output directory: {}", dir.display()))?;

    let stem = log
        .file_stem()
        .map_or_else(|| "log".to_string(), |s| s.to_string_lossy().into_owned());

    let mut written = Vec::with_capacity(BucketName::ALL.len() + 1);

    let path = statistics_path(&dir, &stem);
    write_json(&path, &report.summary)?;
    written.push(path);

    for (bucket, artifact) in report.artifacts() {
        let path = artifact_path(&dir, &stem, bucket);
        write_json(&path, &artifact)?;
        written.push(path);
    }

    writeln!(writer, "Wrote {} files:", written.len())?;
    for path in &written {
        writeln!(writer, "  {}", path.display())?;
    }

    tracing::info!(files = written.len(), dir = %dir.display(), "artifacts written");
    Ok(written)
}

/// Explicit argument, then config, then the log's own directory.
fn resolve_output_dir(log: &Path, output_dir: Option<&Path>, config: &Config) -> PathBuf {
    if let Some(dir) = output_dir.or(config.output_dir.as_deref()) {
        return dir.to_path_buf();
    }
    match log.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize artifact")?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TOOL: &str = "11111111-2222-3333-4444-555555555555";
    const LLM: &str = "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee";
    const KNOWLEDGE: &str = "99999999-8888-7777-6666-555555555555";

    fn write_log(dir: &Path) -> PathBuf {
        let lines = [
            format!("2025-01-01 10:00:00.000000 tool_enhancement_node [{TOOL}] started"),
            format!("2025-01-01 10:00:01.500000 Tool calls in [{TOOL}] finished"),
            format!("2025-01-01 10:00:01.500000 LLM call with tool messages [{LLM}] started"),
            format!("2025-01-01 10:00:04.000000 LLM call with tool messages [{LLM}] ended"),
            format!("2025-01-01 10:00:05.000000 knowledge_enhancement_method2_node [{KNOWLEDGE}] started"),
            format!("2025-01-01 10:00:06.000000 knowledge_enhancement_method2_node [{KNOWLEDGE}] ended"),
            format!("2025-01-01 10:00:06.000000 Discarding method2 [{KNOWLEDGE}] result due to low score"),
        ];
        let path = dir.join("agent_run.log");
        fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn writes_statistics_and_every_bucket() {
        let temp = TempDir::new().unwrap();
        let log = write_log(temp.path());
        let out_dir = temp.path().join("out");
        let mut output = Vec::new();

        let written = run(&mut output, &log, Some(&out_dir), &Config::default()).unwrap();

        assert_eq!(written.len(), 12);
        assert_eq!(written[0], statistics_path(&out_dir, "agent_run"));
        assert!(written.iter().all(|p| p.exists()));

        let stats = read_json(&statistics_path(&out_dir, "agent_run"));
        assert_eq!(stats["tool_enhancement_complete"]["total_time"], 4.0);
        assert_eq!(stats["knowledge_enhancement_method2"]["failed_count"], 1);
        assert_eq!(stats["total"]["total"], 4);

        let complete = read_json(&artifact_path(&out_dir, "agent_run", BucketName::ToolComplete));
        assert_eq!(complete["composite"]["avg_tool_time"], 1.5);
        assert_eq!(complete["composite"]["avg_llm_time"], 2.5);
        assert_eq!(complete["records"][0]["llm_id"], LLM);

        let discarded =
            read_json(&artifact_path(&out_dir, "agent_run", BucketName::Method2Discarded));
        assert_eq!(discarded["records"][0]["node_id"], KNOWLEDGE);
        assert_eq!(discarded["records"][0]["has_error"], true);

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Extracted 4 records"));
        assert!(text.contains("Wrote 12 files:"));
    }

    #[test]
    fn defaults_to_log_directory() {
        let temp = TempDir::new().unwrap();
        let log = write_log(temp.path());
        let mut output = Vec::new();

        run(&mut output, &log, None, &Config::default()).unwrap();

        assert!(statistics_path(temp.path(), "agent_run").exists());
        assert!(artifact_path(temp.path(), "agent_run", BucketName::AllSuccess).exists());
    }

    #[test]
    fn config_output_dir_used_without_argument() {
        let temp = TempDir::new().unwrap();
        let log = write_log(temp.path());
        let configured = temp.path().join("configured");
        let config = Config {
            output_dir: Some(configured.clone()),
            ..Config::default()
        };
        let mut output = Vec::new();

        run(&mut output, &log, None, &config).unwrap();

        assert!(statistics_path(&configured, "agent_run").exists());
    }

    #[test]
    fn missing_log_is_an_error() {
        let temp = TempDir::new().unwrap();
        let mut output = Vec::new();

        let err = run(
            &mut output,
            &temp.path().join("missing.log"),
            None,
            &Config::default(),
        )
        .unwrap_err();

        assert!(format!("{err:#}").contains("failed to read log file"));
        assert!(fs::read_dir(temp.path()).unwrap().next().is_none());
    }

    #[test]
    fn artifact_names_follow_bucket_names() {
        let dir = Path::new("/tmp/out");
        assert_eq!(
            artifact_path(dir, "run", BucketName::Method2Discarded),
            dir.join("run_enhancement_times_method2_discarded.json")
        );
        assert_eq!(
            statistics_path(dir, "run"),
            dir.join("run_enhancement_statistics.json")
        );
    }
}
