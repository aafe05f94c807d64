//! Entry points: run the tracker over a line source or a log file.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::tracker::{Extraction, IntervalTracker};
use crate::window::LineWindow;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read log file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Runs one in-order pass over `lines`.
pub fn extract_lines<I>(lines: I) -> Extraction
where
    I: IntoIterator<Item = String>,
{
    let mut tracker = IntervalTracker::new();
    let mut window = LineWindow::new(lines);
    while let Some(frame) = window.advance() {
        tracker.process(frame);
    }
    let extraction = tracker.finish();

    tracing::debug!(
        records = extraction.records.len(),
        lines = extraction.diagnostics.lines,
        inert = extraction.diagnostics.inert_lines,
        orphans = extraction.diagnostics.orphan_terminators,
        unterminated = extraction.diagnostics.unterminated,
        "extraction pass complete"
    );
    extraction
}

/// Reads the whole log into memory, then extracts from it.
///
/// Failing to read the file is the only error; everything inside it is
/// salvaged on a best-effort basis.
pub fn extract_file(path: &Path) -> Result<Extraction, ExtractError> {
    let content = fs::read_to_string(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(extract_lines(content.lines().map(String::from)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordKind;

    #[test]
    fn missing_file_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("absent.log");
        let err = extract_file(&path).unwrap_err();
        assert!(err.to_string().contains("absent.log"), "{err}");
    }

    #[test]
    fn reads_file_in_order() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("agent.log");
        let id = "0f0f0f0f-1111-2222-3333-444444444444";
        std::fs::write(
            &path,
            format!(
                "2025-01-01 00:00:00 knowledge_enhancement_method1_node [{id}] started\r\n\
                 2025-01-01 00:00:02 knowledge_enhancement_method1_node [{id}] ended\r\n"
            ),
        )
        .unwrap();

        let extraction = extract_file(&path).unwrap();
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].kind, RecordKind::KnowledgeMethod1);
        assert!((extraction.records[0].duration_secs() - 2.0).abs() < f64::EPSILON);
        assert_eq!(extraction.records[0].end_line, 2);
    }
}
