//! Error types for loading the location history and driving exiftool.

use thiserror::Error;

/// The location history could not be turned into an index.
///
/// Fatal to the whole run: no partially built index is ever handed out.
#[derive(Error, Debug)]
pub enum MalformedInput {
    /// The export could not be read.
    #[error("Malformed input: could not read location history: {0}")]
    Io(#[from] std::io::Error),

    /// The export is not valid JSON or does not match the expected schema.
    #[error("Malformed input: could not parse location history: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures talking to the external exiftool process.
#[derive(Error, Debug)]
pub enum ExifToolError {
    /// The binary could not be launched at all.
    #[error("Failed to execute exiftool ({binary}): {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// The file list could not be handed to exiftool, or its output collected.
    #[error("Failed to communicate with exiftool: {0}")]
    Pipe(#[source] std::io::Error),

    /// exiftool ran but reported an error.
    #[error("exiftool failed (exit {status}): {stderr}")]
    Failed { status: String, stderr: String },

    /// exiftool's `-json` output could not be decoded.
    #[error("Unexpected exiftool output: {0}")]
    Output(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MalformedInput = io_err.into();
        assert!(matches!(err, MalformedInput::Io(_)));
        assert!(err.to_string().contains("could not read"));
    }

    #[test]
    fn test_json_error_from() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: MalformedInput = json_err.into();
        assert!(matches!(err, MalformedInput::Json(_)));
    }

    #[test]
    fn test_spawn_error_names_exiftool() {
        let err = ExifToolError::Spawn {
            binary: "/nonexistent/exiftool".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("exiftool"));
        assert!(err.to_string().contains("/nonexistent/exiftool"));
    }
}
