use serde::{Deserialize, Serialize};
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::debug;

use crate::error::GenError;

/// Environment variable overriding the gofmt binary
pub const GOFMT_ENV: &str = "GOMBOK_GOFMT";

/// Formatting applied to a document after regeneration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatMode {
    /// Leave the document as edited. Generated code is already gofmt-shaped,
    /// so only pre-existing formatting quirks remain.
    None,
    /// Pipe the whole document through gofmt
    Gofmt,
}

impl Default for FormatMode {
    fn default() -> Self {
        FormatMode::None
    }
}

impl std::fmt::Display for FormatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatMode::None => write!(f, "none"),
            FormatMode::Gofmt => write!(f, "gofmt"),
        }
    }
}

impl std::str::FromStr for FormatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(FormatMode::None),
            "gofmt" => Ok(FormatMode::Gofmt),
            _ => Err(format!("Invalid reformat mode: {}. Valid values are 'none' or 'gofmt'", s)),
        }
    }
}

impl FormatMode {
    pub fn apply(&self, source: &str) -> Result<String, GenError> {
        match self {
            FormatMode::None => Ok(source.to_string()),
            FormatMode::Gofmt => gofmt(&gofmt_binary(), source),
        }
    }
}

fn gofmt_binary() -> String {
    std::env::var(GOFMT_ENV).unwrap_or_else(|_| "gofmt".to_string())
}

/// Run `binary` with the source on stdin and return its stdout.
pub fn gofmt(binary: &str, source: &str) -> Result<String, GenError> {
    debug!("Formatting with {}", binary);

    let mut child = Command::new(binary)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| GenError::Format(format!("could not run {}: {}", binary, e)))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(source.as_bytes())
            .map_err(|e| GenError::Format(e.to_string()))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| GenError::Format(e.to_string()))?;

    if !output.status.success() {
        return Err(GenError::Format(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    String::from_utf8(output.stdout).map_err(|e| GenError::Format(e.to_string()))
}
