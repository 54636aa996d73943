//! Helpers shared across CLI commands.

use std::fs;
use std::io::{self, Read};

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::CliError;

/// Path argument meaning standard input.
pub const STDIN_MARKER: &str = "-";

/// Reads polygon pairs from a file, or stdin for `-`.
pub fn read_polygon(source: &str) -> Result<Vec<Vec<f64>>, CliError> {
    let text = if source == STDIN_MARKER {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        text
    } else {
        fs::read_to_string(source)
            .map_err(|e| CliError::Input(format!("Cannot read '{}': {}", source, e)))?
    };
    parse_polygon(&text)
}

/// Accepts either a bare `[[lat, lon], ...]` array or `{"polygon": [...]}`.
pub fn parse_polygon(text: &str) -> Result<Vec<Vec<f64>>, CliError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| CliError::Input(format!("Polygon is not valid JSON: {}", e)))?;

    let pairs = match value {
        Value::Array(_) => value,
        Value::Object(mut object) => object
            .remove("polygon")
            .filter(|p| !p.is_null())
            .ok_or_else(|| CliError::Input("Polygon not provided".to_string()))?,
        _ => {
            return Err(CliError::Input(
                "Expected a list of [lat, lon] pairs or {\"polygon\": [...]}".to_string(),
            ))
        }
    };

    serde_json::from_value(pairs)
        .map_err(|_| CliError::Input("Polygon must be a list of [lat, lon] pairs".to_string()))
}

/// Cancels `token` on Ctrl+C. Abort the returned handle once the work is done.
pub fn cancel_on_ctrl_c(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!();
            eprintln!("Received interrupt, cancelling...");
            token.cancel();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_bare_array() {
        let pairs = parse_polygon("[[45.0, 7.0], [45.0, 7.1], [45.1, 7.0]]").unwrap();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[1], vec![45.0, 7.1]);
    }

    #[test]
    fn test_parse_request_object() {
        let pairs = parse_polygon(r#"{"polygon": [[1, 2], [3, 4], [5, 6]]}"#).unwrap();
        assert_eq!(pairs[2], vec![5.0, 6.0]);
    }

    #[test]
    fn test_parse_errors_are_input_errors() {
        for text in ["{}", "not json", "42", r#"{"polygon": "x"}"#] {
            let err = parse_polygon(text).unwrap_err();
            assert!(matches!(err, CliError::Input(_)), "{text}: {err}");
        }
    }

    #[test]
    fn test_read_polygon_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[[0.0, 0.0], [0.0, 0.01], [0.01, 0.0]]").unwrap();

        let pairs = read_polygon(file.path().to_str().unwrap()).unwrap();
        assert_eq!(pairs.len(), 3);
    }

    #[test]
    fn test_read_polygon_missing_file() {
        let err = read_polygon("/nonexistent/polygon.json").unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
    }
}
