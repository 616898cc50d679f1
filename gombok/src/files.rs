use anyhow::{Context, Result};
use glob::glob;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Whether a path has a `.go` extension, compared case-insensitively
pub fn is_go_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("go"))
        .unwrap_or(false)
}

pub fn collect_go_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    collect_go_files_with_exclusions(paths, &[])
}

/// Expand files, directories, and glob patterns into a sorted, deduplicated
/// list of Go files, dropping anything matching an exclude pattern.
pub fn collect_go_files_with_exclusions(
    paths: &[PathBuf],
    exclude_patterns: &[String],
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        let path_str = path.to_string_lossy();

        if is_glob(&path_str) {
            for entry in glob(&path_str).context("Failed to parse glob pattern")? {
                match entry {
                    Ok(file_path) => {
                        if file_path.is_file() && is_go_file(&file_path) {
                            files.push(file_path);
                        }
                    }
                    Err(e) => warn!("Error reading glob entry: {}", e),
                }
            }
        } else if path.is_file() {
            if is_go_file(path) {
                files.push(path.clone());
            } else {
                warn!("Skipping {}: not a .go file", path.display());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && is_go_file(e.path()))
            {
                files.push(entry.path().to_path_buf());
            }
        } else {
            warn!("Path does not exist: {}", path.display());
        }
    }

    if !exclude_patterns.is_empty() {
        files.retain(|file| {
            let file_str = file.to_string_lossy();
            let excluded = exclude_patterns.iter().any(|pattern| {
                if is_glob(pattern) {
                    glob::Pattern::new(pattern)
                        .map(|p| p.matches(&file_str))
                        .unwrap_or(false)
                } else {
                    file_str.contains(pattern.as_str())
                }
            });
            if excluded {
                debug!("Excluded {}", file.display());
            }
            !excluded
        });
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn is_glob(s: &str) -> bool {
    s.contains('*') || s.contains('?') || s.contains('[')
}

/// Replace `path` with `content` via a synced sibling temp file and a rename,
/// so readers see either the old file or the new one.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .with_context(|| format!("Not a file path: {}", path.display()))?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(".gombok.tmp");
    let temp_path = path.with_file_name(temp_name);

    let mut file = fs::File::create(&temp_path)
        .with_context(|| format!("Failed to create {}", temp_path.display()))?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    drop(file);

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
    }
    Ok(())
}
