use thiserror::Error;

/// Message shown when a file has nothing to generate for
pub const NO_STRUCTS_MSG: &str = "no go struct declaration found in current file";

#[derive(Debug, Error)]
pub enum GenError {
    #[error("{}", NO_STRUCTS_MSG)]
    NoStructsFound,

    #[error("struct '{name}' not found{}", did_you_mean(.suggestion))]
    StructNotFound {
        name: String,
        suggestion: Option<String>,
    },

    #[error("failed to parse Go source: {0}")]
    Parse(String),

    #[error("span {start}..{end} cannot be applied to a document of {len} bytes")]
    InvalidSpan { start: usize, end: usize, len: usize },

    #[error("gofmt failed: {0}")]
    Format(String),
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(" (did you mean '{}'?)", s))
        .unwrap_or_default()
}

impl GenError {
    /// Informational outcomes that leave the file untouched without failing the run
    pub fn is_informational(&self) -> bool {
        matches!(self, GenError::NoStructsFound)
    }
}
