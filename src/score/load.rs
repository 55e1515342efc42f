//! Score loading from JSON.
//!
//! A score file is a bare JSON array of note events:
//!
//! ```json
//! [
//!   {"start": 0.0, "duration": 0.5, "note": 36, "velocity": 110, "instrument": "kick"},
//!   {"start": 0.0, "duration": 0.25, "note": 72, "velocity": 60, "instrument": "arp1"}
//! ]
//! ```

use super::NoteEvent;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while acquiring a score.
#[derive(Debug, Error)]
pub enum ScoreError {
    /// File could not be read
    #[error("failed to read score {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// JSON did not describe a list of note events
    #[error("invalid score: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parses a score from a JSON string.
///
/// # Errors
///
/// Returns `ScoreError::Parse` if the JSON is malformed or a field has the
/// wrong type or range
pub fn parse_events(json: &str) -> Result<Vec<NoteEvent>, ScoreError> {
    Ok(serde_json::from_str(json)?)
}

/// Loads a score from a JSON file.
///
/// # Arguments
///
/// * `path` - Path to the score file
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn load_events<P: AsRef<Path>>(path: P) -> Result<Vec<NoteEvent>, ScoreError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|source| ScoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let events = parse_events(&json)?;
    tracing::debug!("Loaded {} events from {:?}", events.len(), path);
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_events() {
        let json = r#"[
            {"start": 0, "duration": 2, "note": 36, "velocity": 100, "instrument": "kick"},
            {"start": 1, "duration": 1, "note": 72, "velocity": 50, "instrument": "arp1"}
        ]"#;
        let events = parse_events(json).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].instrument, "kick");
        assert_eq!(events[1].start, 1.0);
        assert_eq!(events[1].note, 72);
    }

    #[test]
    fn test_parse_rejects_wrapper_object() {
        let json = r#"{"events": []}"#;
        assert!(matches!(parse_events(json), Err(ScoreError::Parse(_))));
    }

    #[test]
    fn test_parse_rejects_out_of_range_note() {
        let json = r#"[{"start": 0, "duration": 1, "note": 300, "velocity": 1, "instrument": "x"}]"#;
        assert!(parse_events(json).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("scoremix_missing_score.json");
        let _ = fs::remove_file(&path);
        match load_events(&path) {
            Err(ScoreError::Io { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected io error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join("scoremix_load_test.json");
        fs::write(
            &path,
            r#"[{"start": 0.5, "duration": 0.5, "note": 69, "velocity": 10, "instrument": "lead"}]"#,
        )
        .unwrap();

        let events = load_events(&path).unwrap();
        assert_eq!(events, vec![NoteEvent::new(0.5, 0.5, 69, 10, "lead")]);

        fs::remove_file(&path).unwrap();
    }
}
