use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::diff::{print_diff, print_summary_diff, DiffStats};
use crate::editor::GoEditor;
use crate::error::{GenError, NO_STRUCTS_MSG};
use crate::files::write_atomic;
use crate::operations::{GenerateOp, OutputFormat};
use crate::state::{
    generate_run_id, hash_content, save_backup, save_run_metadata, FileModification, RunMetadata,
    RunStatus,
};

/// How a generate run reports and persists its changes
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Write changes (otherwise dry run)
    pub apply: bool,
    /// Write the single input file's result here instead of in place
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    /// Print totals after diff output
    pub show_summary: bool,
    /// Record in-place writes as a revertible run in this directory
    pub state_dir: Option<PathBuf>,
    /// Command line stored with the run
    pub command: String,
}

#[derive(Debug, Default)]
pub struct RunReport {
    /// Files that changed (or would change, in a dry run)
    pub changed: Vec<PathBuf>,
    /// Files without any struct declaration
    pub no_structs: Vec<PathBuf>,
    pub run_id: Option<String>,
    pub stats: DiffStats,
    /// Last per-file error, when several files were processed
    pub last_error: Option<String>,
}

struct FileChange {
    path: PathBuf,
    new_content: String,
    structs: Vec<String>,
}

/// Regenerate accessors in every file.
///
/// A file whose selection is absent is only fatal when it is the sole input.
pub fn execute_generate(files: &[PathBuf], op: &GenerateOp, opts: &RunOptions) -> Result<RunReport> {
    if opts.output.is_some() && files.len() > 1 {
        bail!("--output can only be used with a single input file ({} given)", files.len());
    }

    let mut report = RunReport::default();
    let mut changes = Vec::new();

    for file_path in files {
        let content = std::fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read {}", file_path.display()))?;

        match regenerate_file(&content, op) {
            Ok(Some((new_content, structs))) => {
                let stats = match opts.format {
                    OutputFormat::Diff => print_diff(file_path, &content, &new_content),
                    OutputFormat::Summary => print_summary_diff(file_path, &content, &new_content),
                    OutputFormat::Default => DiffStats::default(),
                };
                report.stats.add(&stats);
                report.changed.push(file_path.clone());
                changes.push((
                    content,
                    FileChange {
                        path: file_path.clone(),
                        new_content,
                        structs,
                    },
                ));
            }
            Ok(None) => {
                debug!("{} is up to date", file_path.display());
                // --output still receives the result
                if opts.output.is_some() {
                    changes.push((
                        content.clone(),
                        FileChange {
                            path: file_path.clone(),
                            new_content: content,
                            structs: Vec::new(),
                        },
                    ));
                }
            }
            Err(GenError::NoStructsFound) => {
                println!("{}: {}", file_path.display(), NO_STRUCTS_MSG);
                report.no_structs.push(file_path.clone());
            }
            Err(e) => {
                if files.len() == 1 {
                    return Err(e).with_context(|| format!("{}", file_path.display()));
                }
                report.last_error = Some(format!("{}: {}", file_path.display(), e));
            }
        }
    }

    if opts.apply {
        write_changes(&changes, opts, &mut report)?;
    } else if opts.format == OutputFormat::Default {
        for (_, change) in &changes {
            match &opts.output {
                Some(out) => println!("Would write to: {}", out.display()),
                None => println!("Would modify: {}", change.path.display()),
            }
        }
    }

    if report.changed.is_empty() && report.no_structs.len() < files.len() {
        println!("No changes made - accessors are up to date");
        if let Some(err) = &report.last_error {
            eprintln!("\n📋 Diagnostic: {}", err);
        }
    }

    if opts.format == OutputFormat::Diff && opts.show_summary {
        report.stats.print_summary();
    } else if opts.format == OutputFormat::Default && !opts.apply && !report.changed.is_empty() {
        println!("\n🔍 Dry run complete. Use --apply to make changes, or --format diff to generate a patch.");
        println!("Summary: {} file(s) would be modified", report.changed.len());
    }

    Ok(report)
}

/// New content for one document, or `None` if it is already up to date
fn regenerate_file(content: &str, op: &GenerateOp) -> Result<Option<(String, Vec<String>)>, GenError> {
    let mut editor = GoEditor::new(content);
    let outcome = editor.regenerate(&op.structs)?;
    let new_content = op.reformat.apply(&editor.to_string())?;

    if new_content == content {
        return Ok(None);
    }
    Ok(Some((new_content, outcome.structs)))
}

fn write_changes(
    changes: &[(String, FileChange)],
    opts: &RunOptions,
    report: &mut RunReport,
) -> Result<()> {
    if let Some(out) = &opts.output {
        for (_, change) in changes {
            write_atomic(out, &change.new_content)?;
            println!("✓ Written to: {}", out.display());
        }
        return Ok(());
    }

    let Some(state_dir) = &opts.state_dir else {
        for (_, change) in changes {
            write_atomic(&change.path, &change.new_content)?;
            print_modified(&change.path, opts.format);
        }
        return Ok(());
    };

    if changes.is_empty() {
        return Ok(());
    }

    let run_id = generate_run_id();
    let mut file_modifications = Vec::new();
    let mut failure = None;

    for (original, change) in changes {
        match write_tracked(original, change, &run_id, state_dir) {
            Ok(modification) => {
                file_modifications.push(modification);
                print_modified(&change.path, opts.format);
            }
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }

    // Files already written stay revertible even when a later one fails
    if file_modifications.is_empty() {
        return failure.map_or(Ok(()), Err);
    }

    let metadata = RunMetadata {
        run_id: run_id.clone(),
        timestamp: chrono::Utc::now(),
        command: opts.command.clone(),
        operation: "Generate".to_string(),
        files_modified: file_modifications,
        status: RunStatus::Applied,
        can_revert: true,
    };
    save_run_metadata(&metadata, state_dir)?;
    info!("Recorded run {}", run_id);

    println!("\n📝 Run ID: {} (use 'gombok revert {}' to undo)", run_id, run_id);

    if let Some(e) = failure {
        warn!("Run {} stopped early; it only records the files written before the failure", run_id);
        return Err(e);
    }
    report.run_id = Some(run_id);
    Ok(())
}

fn write_tracked(
    original: &str,
    change: &FileChange,
    run_id: &str,
    state_dir: &Path,
) -> Result<FileModification> {
    let backup_path = save_backup(&change.path, original, run_id, state_dir)?;
    write_atomic(&change.path, &change.new_content)?;

    Ok(FileModification {
        path: absolute(&change.path),
        hash_before: hash_content(original.as_bytes()),
        hash_after: hash_content(change.new_content.as_bytes()),
        backup_path,
        structs: change.structs.clone(),
    })
}

fn print_modified(path: &Path, format: OutputFormat) {
    if format != OutputFormat::Diff {
        println!("✓ Modified: {}", path.display());
    }
}

/// Revert must find the file regardless of the directory it is run from
fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{load_run_metadata, revert_run, RunsIndex};
    use std::fs;
    use tempfile::TempDir;

    const MODEL: &str = "package model\n\ntype User struct {\n\tid    int64\n\temail *string\n}\n";

    #[test]
    fn test_dry_run_leaves_files() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("user.go");
        fs::write(&path, MODEL)?;

        let report = execute_generate(&[path.clone()], &GenerateOp::default(), &RunOptions::default())?;

        assert_eq!(report.changed, vec![path.clone()]);
        assert_eq!(fs::read_to_string(&path)?, MODEL);
        Ok(())
    }

    #[test]
    fn test_apply_records_revertible_run() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let state_dir = temp_dir.path().join("state");
        let path = temp_dir.path().join("user.go");
        fs::write(&path, MODEL)?;

        let opts = RunOptions {
            apply: true,
            state_dir: Some(state_dir.clone()),
            command: "gombok generate --apply".to_string(),
            ..Default::default()
        };
        let report = execute_generate(&[path.clone()], &GenerateOp::default(), &opts)?;
        let run_id = report.run_id.expect("run id");

        let generated = fs::read_to_string(&path)?;
        assert!(generated.contains("func (u *User) GetEmailNonPointer() (out string) {"));

        let run = load_run_metadata(&run_id, &state_dir)?;
        assert_eq!(run.files_modified.len(), 1);
        assert_eq!(run.files_modified[0].structs, vec!["User"]);

        // A second run has nothing to do
        let again = execute_generate(&[path.clone()], &GenerateOp::default(), &opts)?;
        assert!(again.changed.is_empty());
        assert!(again.run_id.is_none());
        assert_eq!(fs::read_to_string(&path)?, generated);

        revert_run(&run_id, false, &state_dir)?;
        assert_eq!(fs::read_to_string(&path)?, MODEL);
        Ok(())
    }

    #[test]
    fn test_output_path() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("user.go");
        let out = temp_dir.path().join("user_gen.go");
        fs::write(&path, MODEL)?;

        let opts = RunOptions {
            apply: true,
            output: Some(out.clone()),
            ..Default::default()
        };
        execute_generate(&[path.clone()], &GenerateOp::default(), &opts)?;

        assert_eq!(fs::read_to_string(&path)?, MODEL);
        assert!(fs::read_to_string(&out)?.contains("SetId"));

        let err = execute_generate(&[path.clone(), path.clone()], &GenerateOp::default(), &opts);
        assert!(err.is_err());
        Ok(())
    }

    #[test]
    fn test_output_written_when_up_to_date() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("user.go");
        let out = temp_dir.path().join("user_gen.go");
        fs::write(&path, MODEL)?;

        let in_place = RunOptions {
            apply: true,
            ..Default::default()
        };
        execute_generate(&[path.clone()], &GenerateOp::default(), &in_place)?;
        let generated = fs::read_to_string(&path)?;

        let opts = RunOptions {
            apply: true,
            output: Some(out.clone()),
            ..Default::default()
        };
        let report = execute_generate(&[path.clone()], &GenerateOp::default(), &opts)?;

        assert!(report.changed.is_empty());
        assert_eq!(fs::read_to_string(&out)?, generated);
        Ok(())
    }

    #[test]
    fn test_revert_paths_with_same_flattened_name() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let state_dir = temp_dir.path().join("state");
        fs::create_dir_all(temp_dir.path().join("x"))?;
        fs::create_dir_all(temp_dir.path().join("x_a"))?;
        let one = temp_dir.path().join("x/a_b.go");
        let two = temp_dir.path().join("x_a/b.go");
        let one_src = "package x\n\ntype One struct {\n\ta int\n}\n";
        let two_src = "package x_a\n\ntype Two struct {\n\tb int\n}\n";
        fs::write(&one, one_src)?;
        fs::write(&two, two_src)?;

        let opts = RunOptions {
            apply: true,
            state_dir: Some(state_dir.clone()),
            ..Default::default()
        };
        let report = execute_generate(&[one.clone(), two.clone()], &GenerateOp::default(), &opts)?;
        let run_id = report.run_id.expect("run id");

        revert_run(&run_id, false, &state_dir)?;
        assert_eq!(fs::read_to_string(&one)?, one_src);
        assert_eq!(fs::read_to_string(&two)?, two_src);
        Ok(())
    }

    #[test]
    fn test_partial_apply_is_revertible() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let state_dir = temp_dir.path().join("state");
        let first = temp_dir.path().join("a.go");
        let second = temp_dir.path().join("b.go");
        let second_src = "package model\n\ntype Order struct {\n\ttotal int\n}\n";
        fs::write(&first, MODEL)?;
        fs::write(&second, second_src)?;
        // A directory in place of the temp file makes the second write fail
        fs::create_dir(temp_dir.path().join("b.go.gombok.tmp"))?;

        let opts = RunOptions {
            apply: true,
            state_dir: Some(state_dir.clone()),
            ..Default::default()
        };
        let result = execute_generate(&[first.clone(), second.clone()], &GenerateOp::default(), &opts);
        assert!(result.is_err());
        assert_ne!(fs::read_to_string(&first)?, MODEL);
        assert_eq!(fs::read_to_string(&second)?, second_src);

        let index = RunsIndex::load(&state_dir)?;
        let runs = index.get_sorted_runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].files_modified.len(), 1);

        revert_run(&runs[0].run_id, false, &state_dir)?;
        assert_eq!(fs::read_to_string(&first)?, MODEL);
        Ok(())
    }

    #[test]
    fn test_no_structs_is_not_fatal() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("main.go");
        fs::write(&path, "package main\n\nfunc main() {}\n")?;

        let opts = RunOptions {
            apply: true,
            ..Default::default()
        };
        let report = execute_generate(&[path.clone()], &GenerateOp::default(), &opts)?;

        assert_eq!(report.no_structs, vec![path.clone()]);
        assert!(report.changed.is_empty());
        assert_eq!(fs::read_to_string(&path)?, "package main\n\nfunc main() {}\n");
        Ok(())
    }

    #[test]
    fn test_unknown_struct_single_vs_many_files() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let user = temp_dir.path().join("user.go");
        let order = temp_dir.path().join("order.go");
        fs::write(&user, MODEL)?;
        fs::write(&order, "package model\n\ntype Order struct {\n\ttotal int\n}\n")?;

        let op = GenerateOp {
            structs: vec!["Order".to_string()],
            ..Default::default()
        };

        let err = execute_generate(&[user.clone()], &op, &RunOptions::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("struct 'Order' not found"));

        let report = execute_generate(&[user.clone(), order.clone()], &op, &RunOptions::default())?;
        assert_eq!(report.changed, vec![order]);
        assert!(report.last_error.is_some());
        Ok(())
    }
}
