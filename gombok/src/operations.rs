use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::editor::GoEditor;
use crate::formatter::FormatMode;
use crate::model::{GeneratedMethodSpan, StructDescriptor};
use crate::parser::{GoSource, GoSyntax};
use crate::planner::plan_regeneration;

/// How changes are reported on stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// "Would modify" / "Modified" lines
    #[default]
    Default,
    /// Unified diff per file
    Diff,
    /// One `path: +added -removed` line per file
    Summary,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Default => write!(f, "default"),
            OutputFormat::Diff => write!(f, "diff"),
            OutputFormat::Summary => write!(f, "summary"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(OutputFormat::Default),
            "diff" => Ok(OutputFormat::Diff),
            "summary" => Ok(OutputFormat::Summary),
            _ => Err(format!(
                "Invalid output format: {}. Valid values are 'default', 'diff' or 'summary'",
                s
            )),
        }
    }
}

/// Regenerate accessors for the selected structs (all when empty)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateOp {
    #[serde(default)]
    pub structs: Vec<String>,
    #[serde(default)]
    pub reformat: FormatMode,
}

/// One entry of a batch spec; `paths` are relative to the spec's `base_path`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJob {
    pub paths: Vec<PathBuf>,
    #[serde(default)]
    pub structs: Vec<String>,
    #[serde(default)]
    pub reformat: FormatMode,
}

impl BatchJob {
    pub fn op(&self) -> GenerateOp {
        GenerateOp {
            structs: self.structs.clone(),
            reformat: self.reformat,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSpec {
    #[serde(default)]
    pub base_path: PathBuf,
    pub jobs: Vec<BatchJob>,
}

impl BatchSpec {
    /// Load a spec from YAML or JSON; `.yaml`/`.yml` are read as YAML,
    /// anything else is tried as JSON first.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch spec {}", path.display()))?;

        let is_yaml = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("yaml") | Some("yml")
        );

        if is_yaml {
            serde_yaml::from_str(&content).context("Failed to parse batch spec YAML")
        } else {
            serde_json::from_str(&content)
                .or_else(|_| serde_yaml::from_str(&content))
                .context("Failed to parse batch spec (tried both JSON and YAML)")
        }
    }

    pub fn job_paths(&self, job: &BatchJob) -> Vec<PathBuf> {
        job.paths.iter().map(|p| self.base_path.join(p)).collect()
    }
}

/// What `inspect` reports for one file
#[derive(Debug, Serialize, Deserialize)]
pub struct FileReport {
    pub file_path: String,
    pub structs: Vec<StructDescriptor>,
    /// Existing methods that regenerating every struct would replace
    pub accessors: Vec<GeneratedMethodSpan>,
    pub syntax_errors: bool,
}

pub fn inspect_source(file_path: &str, content: &str) -> Result<FileReport> {
    let source = GoSource::parse(content)?;
    let model = source.list_structs();
    let mut accessors = plan_regeneration(&model.names(), &source.list_method_spans());
    accessors.reverse();

    Ok(FileReport {
        file_path: file_path.to_string(),
        structs: model.structs,
        accessors,
        syntax_errors: source.has_syntax_errors(),
    })
}

pub fn inspect_file(path: &Path) -> Result<FileReport> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    inspect_source(&path.display().to_string(), &content)
}

/// Render the document that `op` would produce, without touching disk
pub fn preview(content: &str, op: &GenerateOp) -> Result<String> {
    let mut editor = GoEditor::new(content);
    editor.regenerate(&op.structs)?;
    Ok(op.reformat.apply(&editor.to_string())?)
}
