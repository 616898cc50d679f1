use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::files::write_atomic;

/// Environment variable overriding the state directory
pub const STATE_DIR_ENV: &str = "GOMBOK_STATE_DIR";

/// Short unique run id (7 hex characters, like git)
pub fn generate_run_id() -> String {
    let timestamp = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default()
        .to_le_bytes();
    let mut hasher = blake3::Hasher::new();
    hasher.update(&timestamp);
    hasher.update(&std::process::id().to_le_bytes());
    hasher.update(&next_sequence().to_le_bytes());
    hasher.finalize().to_hex().as_str()[..7].to_string()
}

fn next_sequence() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static SEQ: AtomicU64 = AtomicU64::new(0);
    SEQ.fetch_add(1, Ordering::Relaxed)
}

/// Resolve the state directory.
///
/// Priority order:
/// 1. `GOMBOK_STATE_DIR`
/// 2. `--local-state` (uses `./.gombok`)
/// 3. The platform data directory
pub fn get_state_dir(local: bool) -> Result<PathBuf> {
    if let Ok(custom_dir) = std::env::var(STATE_DIR_ENV) {
        return Ok(PathBuf::from(custom_dir));
    }

    if local {
        let current_dir = std::env::current_dir()?;
        Ok(current_dir.join(".gombok"))
    } else {
        let proj_dirs = ProjectDirs::from("com", "gombok", "gombok")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }
}

pub fn hash_content(content: &[u8]) -> String {
    blake3::hash(content).to_hex().to_string()
}

pub fn hash_file(path: &Path) -> Result<String> {
    let content = fs::read(path)
        .with_context(|| format!("Failed to read file for hashing: {}", path.display()))?;
    Ok(hash_content(&content))
}

/// One file touched by a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileModification {
    pub path: PathBuf,
    pub hash_before: String,
    pub hash_after: String,
    /// Copy of the content before the run, inside the run's state directory
    pub backup_path: PathBuf,
    /// Structs whose accessors were regenerated
    #[serde(default)]
    pub structs: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Applied,
    Reverted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub command: String,
    pub operation: String,
    pub files_modified: Vec<FileModification>,
    pub status: RunStatus,
    pub can_revert: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunsIndex {
    pub runs: HashMap<String, RunMetadata>,
}

impl RunsIndex {
    pub fn load(state_dir: &Path) -> Result<Self> {
        let index_path = state_dir.join("runs.json");
        if !index_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&index_path).context("Failed to read runs index")?;
        serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse runs index: {}", e))
    }

    /// Load the index, starting over if the stored format is unreadable
    pub fn load_or_reset(state_dir: &Path) -> Result<Self> {
        match Self::load(state_dir) {
            Ok(index) => Ok(index),
            Err(e) if e.to_string().contains("Failed to parse runs index") => {
                warn!("Resetting unreadable state index in {}: {}", state_dir.display(), e);
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn save(&self, state_dir: &Path) -> Result<()> {
        fs::create_dir_all(state_dir)?;
        write_json_atomic(&state_dir.join("runs.json"), self)
    }

    pub fn add_run(&mut self, run: RunMetadata) {
        self.runs.insert(run.run_id.clone(), run);
    }

    pub fn get_run(&self, run_id: &str) -> Option<&RunMetadata> {
        self.runs.get(run_id)
    }

    pub fn get_sorted_runs(&self) -> Vec<&RunMetadata> {
        let mut runs: Vec<_> = self.runs.values().collect();
        runs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        runs
    }
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    let temp_path = path.with_extension("json.tmp");
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    drop(file);
    fs::rename(temp_path, path)?;
    Ok(())
}

/// Flatten a file path into a single file name usable inside the state dir
/// Backup file name, prefixed with a hash of the full path so that distinct
/// paths never share a backup within one run
fn safe_name(file_path: &Path) -> String {
    let flattened = file_path
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(s) => Some(s.to_string_lossy().to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("_");
    let path_hash = hash_content(file_path.as_os_str().to_string_lossy().as_bytes());
    format!("{}_{}", &path_hash[..12], flattened)
}

/// Store the pre-run content of `file_path`; returns the backup location.
pub fn save_backup(
    file_path: &Path,
    original_content: &str,
    run_id: &str,
    state_dir: &Path,
) -> Result<PathBuf> {
    let backup_dir = state_dir.join(run_id);
    fs::create_dir_all(&backup_dir)?;

    let backup_path = backup_dir.join(format!("{}.orig", safe_name(file_path)));
    fs::write(&backup_path, original_content)
        .with_context(|| format!("Failed to write backup {}", backup_path.display()))?;

    debug!("Backed up {} to {}", file_path.display(), backup_path.display());
    Ok(backup_path)
}

pub fn save_run_metadata(run: &RunMetadata, state_dir: &Path) -> Result<()> {
    fs::create_dir_all(state_dir)?;
    write_json_atomic(&state_dir.join(format!("{}.json", run.run_id)), run)?;

    let mut index = RunsIndex::load_or_reset(state_dir)?;
    index.add_run(run.clone());
    index.save(state_dir)?;

    Ok(())
}

pub fn load_run_metadata(run_id: &str, state_dir: &Path) -> Result<RunMetadata> {
    let metadata_path = state_dir.join(format!("{}.json", run_id));

    if !metadata_path.exists() {
        bail!("Run {} not found", run_id);
    }

    let content = fs::read_to_string(&metadata_path).context("Failed to read run metadata")?;
    serde_json::from_str(&content).context("Failed to parse run metadata")
}

/// Restore every file of a run to its pre-run content
pub fn revert_run(run_id: &str, force: bool, state_dir: &Path) -> Result<()> {
    let mut run = load_run_metadata(run_id, state_dir)?;

    if run.status == RunStatus::Reverted {
        bail!("Run {} has already been reverted", run_id);
    }
    if !run.can_revert {
        bail!("Run {} cannot be reverted", run_id);
    }

    // Refuse to clobber edits made after the run unless forced
    if !force {
        for file in &run.files_modified {
            if !file.path.exists() {
                bail!("File {} no longer exists (use --force to ignore)", file.path.display());
            }

            let current_hash = hash_file(&file.path)?;
            if current_hash != file.hash_after {
                bail!(
                    "File {} has changed since run {} (use --force to ignore)\nExpected hash: {}\nCurrent hash: {}",
                    file.path.display(),
                    run_id,
                    file.hash_after,
                    current_hash
                );
            }
        }
    }

    println!("Reverting {} file(s)...", run.files_modified.len());
    for file in &run.files_modified {
        let original = fs::read_to_string(&file.backup_path)
            .with_context(|| format!("Failed to read backup {}", file.backup_path.display()))?;
        write_atomic(&file.path, &original)?;
        println!("  ✓ Restored: {}", file.path.display());
    }

    run.status = RunStatus::Reverted;
    run.can_revert = false;
    save_run_metadata(&run, state_dir)?;

    println!("✓ Run {} reverted successfully", run_id);
    Ok(())
}

pub fn show_history(limit: usize, state_dir: &Path) -> Result<()> {
    let index = RunsIndex::load_or_reset(state_dir)?;
    let runs = index.get_sorted_runs();

    if runs.is_empty() {
        println!("No runs found");
        return Ok(());
    }

    println!("Recent runs (showing up to {}):\n", limit);

    for run in runs.iter().take(limit) {
        let status_str = match run.status {
            RunStatus::Applied => {
                if run.can_revert {
                    "[can revert]"
                } else {
                    "[applied]"
                }
            }
            RunStatus::Reverted => "[reverted]",
        };

        let files_str = if run.files_modified.len() == 1 {
            "1 file".to_string()
        } else {
            format!("{} files", run.files_modified.len())
        };

        println!(
            "{}  {}  {:20}  {:10}  {}",
            run.run_id,
            run.timestamp.format("%Y-%m-%d %H:%M"),
            truncate_str(&run.operation, 20),
            files_str,
            status_str
        );
    }

    Ok(())
}

/// Drop runs older than `keep_days`; returns how many were removed
pub fn clean_old_state(keep_days: u32, state_dir: &Path) -> Result<usize> {
    let index = RunsIndex::load_or_reset(state_dir)?;
    let cutoff = Utc::now() - Duration::days(keep_days as i64);

    let mut cleaned = 0;
    let mut new_index = RunsIndex::default();

    for run in index.runs.values() {
        if run.timestamp < cutoff {
            let backup_dir = state_dir.join(&run.run_id);
            if backup_dir.exists() {
                fs::remove_dir_all(&backup_dir)?;
            }

            let metadata_path = state_dir.join(format!("{}.json", run.run_id));
            if metadata_path.exists() {
                fs::remove_file(&metadata_path)?;
            }

            cleaned += 1;
        } else {
            new_index.add_run(run.clone());
        }
    }

    new_index.save(state_dir)?;
    Ok(cleaned)
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
