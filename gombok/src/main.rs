use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use gombok::files::collect_go_files_with_exclusions;
use gombok::formatter::FormatMode;
use gombok::operations::{inspect_file, BatchSpec, GenerateOp, OutputFormat};
use gombok::runner::{execute_generate, RunOptions};
use gombok::state::{clean_old_state, get_state_dir, revert_run, show_history};

/// Environment variable holding the log filter (e.g. `gombok=debug`)
const LOG_ENV: &str = "GOMBOK_LOG";

#[derive(Parser)]
#[command(name = "gombok")]
#[command(about = "Generate nil-safe getters and setters for Go structs")]
#[command(long_about = "Generate nil-safe getters and setters for every struct in a Go file.

Previously generated accessors (methods named Get*/Set* on *Struct) are removed
and regenerated at the end of the file, so running gombok again after editing a
struct keeps its accessors in sync without duplicates.

Pointer fields also get GetXNonPointer/SetXNonPointer helpers.")]
#[command(after_help = "Examples:
  gombok generate --paths model/user.go            # dry run
  gombok generate --paths model --apply            # every .go file under model/
  gombok generate --paths user.go --struct User --format diff
  gombok revert <RUN_ID>")]
#[command(version)]
struct Cli {
    /// Use project-local state directory (.gombok) instead of the user data dir
    #[arg(long, global = true)]
    local_state: bool,

    /// Output format: "default", "diff", or "summary"
    #[arg(long, default_value = "default", global = true)]
    format: OutputFormat,

    /// Show summary statistics after diff output
    #[arg(long, global = true)]
    summary: bool,

    /// Exclude paths matching these patterns (can be used multiple times)
    #[arg(long, global = true, num_args = 0..)]
    exclude: Vec<String>,

    /// Log debug information to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate getters and setters
    #[command(after_help = "EXAMPLES:
    # Preview changes for one file
    gombok generate --paths model/user.go

    # Only regenerate User and Order, show a diff, write the result
    gombok generate --paths model --struct User --struct Order --format diff --apply

    # Run gofmt over the result
    gombok generate --paths model --reformat gofmt --apply")]
    Generate {
        /// Go files, directories, or glob patterns
        #[arg(short, long, num_args = 1.., required = true)]
        paths: Vec<PathBuf>,

        /// Only regenerate these structs (default: every struct in the file)
        #[arg(short, long = "struct")]
        structs: Vec<String>,

        /// Formatting pass after regeneration: "none" or "gofmt"
        #[arg(long, default_value = "none")]
        reformat: FormatMode,

        /// Write the result here instead of modifying the input in place
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Apply changes (default is dry-run)
        #[arg(long)]
        apply: bool,
    },

    /// List structs, fields, and the existing accessors a run would replace
    Inspect {
        /// Go files, directories, or glob patterns
        #[arg(short, long, num_args = 1.., required = true)]
        paths: Vec<PathBuf>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Run several generate jobs from a YAML or JSON spec
    #[command(after_help = "SPEC FORMAT (YAML):
    base_path: ./services/billing
    jobs:
      - paths: [model]
      - paths: [api/types.go]
        structs: [Invoice]
        reformat: gofmt")]
    Batch {
        /// Path to the spec file
        #[arg(short, long)]
        spec: PathBuf,

        /// Apply changes (default is dry-run)
        #[arg(long)]
        apply: bool,
    },

    /// Show recent runs
    History {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Undo a run
    Revert {
        run_id: String,

        /// Revert even if files changed since the run
        #[arg(long)]
        force: bool,
    },

    /// Delete state for old runs
    Clean {
        #[arg(long, default_value = "30")]
        keep_days: u32,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate {
            ref paths,
            ref structs,
            reformat,
            ref output,
            apply,
        } => {
            let files = collect_go_files_with_exclusions(paths, &cli.exclude)?;
            if files.is_empty() {
                println!("No .go files found");
                return Ok(());
            }

            let op = GenerateOp {
                structs: structs.clone(),
                reformat,
            };
            let opts = run_options(&cli, apply, output.clone())?;
            execute_generate(&files, &op, &opts)?;
        }

        Commands::Inspect { ref paths, json } => {
            let files = collect_go_files_with_exclusions(paths, &cli.exclude)?;
            let reports = files
                .iter()
                .map(|f| inspect_file(f))
                .collect::<Result<Vec<_>>>()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in &reports {
                    println!("{}", report.file_path);
                    if report.structs.is_empty() {
                        println!("  (no structs)");
                    }
                    for s in &report.structs {
                        println!("  struct {} ({} field(s))", s.name, s.fields.len());
                        for field in &s.fields {
                            println!("    {} {}", field.name, field.ty);
                        }
                    }
                    for accessor in &report.accessors {
                        println!(
                            "  L{}: func ({}) {} [{}..{}]",
                            accessor.line,
                            accessor.receiver_type,
                            accessor.method_name,
                            accessor.span.start,
                            accessor.span.end
                        );
                    }
                }
            }
        }

        Commands::Batch { ref spec, apply } => {
            let batch = BatchSpec::from_file(spec)?;
            let opts = run_options(&cli, apply, None)?;

            for job in &batch.jobs {
                let files = collect_go_files_with_exclusions(&batch.job_paths(job), &cli.exclude)?;
                debug!("Batch job over {} file(s)", files.len());
                execute_generate(&files, &job.op(), &opts)?;
            }
        }

        Commands::History { limit } => {
            let state_dir = get_state_dir(cli.local_state)?;
            show_history(limit, &state_dir)?;
        }

        Commands::Revert { ref run_id, force } => {
            let state_dir = get_state_dir(cli.local_state)?;
            revert_run(run_id, force, &state_dir)?;
        }

        Commands::Clean { keep_days } => {
            let state_dir = get_state_dir(cli.local_state)?;
            let cleaned = clean_old_state(keep_days, &state_dir)?;
            println!("✓ Cleaned {} old run(s)", cleaned);
        }
    }

    Ok(())
}

/// In-place applies are tracked for revert; dry runs and `--output` are not
fn run_options(cli: &Cli, apply: bool, output: Option<PathBuf>) -> Result<RunOptions> {
    let state_dir = if apply && output.is_none() {
        Some(get_state_dir(cli.local_state)?)
    } else {
        None
    };

    Ok(RunOptions {
        apply,
        output,
        format: cli.format,
        show_summary: cli.summary,
        state_dir,
        command: std::env::args().collect::<Vec<_>>().join(" "),
    })
}
