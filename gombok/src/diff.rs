use similar::{ChangeTag, TextDiff};
use std::path::Path;

/// Line counts across one or more regenerated files
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiffStats {
    pub files_changed: usize,
    pub lines_added: usize,
    pub lines_removed: usize,
}

impl DiffStats {
    pub fn add(&mut self, other: &DiffStats) {
        self.files_changed += other.files_changed;
        self.lines_added += other.lines_added;
        self.lines_removed += other.lines_removed;
    }

    pub fn print_summary(&self) {
        println!("\nSummary:");
        println!("Files changed: {}", self.files_changed);
        println!("Lines added: {}", self.lines_added);
        println!("Lines removed: {}", self.lines_removed);
    }
}

fn count_changes<'a>(diff: &TextDiff<'a, 'a, 'a, str>) -> DiffStats {
    let mut stats = DiffStats::default();
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => stats.lines_added += 1,
            ChangeTag::Delete => stats.lines_removed += 1,
            ChangeTag::Equal => {}
        }
    }
    if stats.lines_added > 0 || stats.lines_removed > 0 {
        stats.files_changed = 1;
    }
    stats
}

/// Unified diff of one file plus its statistics.
///
/// `context_lines` is the number of unchanged lines shown around each hunk.
pub fn generate_unified_diff(
    path: &Path,
    original: &str,
    modified: &str,
    context_lines: usize,
) -> (String, DiffStats) {
    let diff = TextDiff::from_lines(original, modified);
    let stats = count_changes(&diff);

    let path_str = path.display().to_string();
    let mut output = format!("--- {}\n+++ {}\n", path_str, path_str);
    output.push_str(
        &diff
            .unified_diff()
            .context_radius(context_lines)
            .to_string(),
    );

    (output, stats)
}

/// Print a unified diff to stdout if anything changed
pub fn print_diff(path: &Path, original: &str, modified: &str) -> DiffStats {
    let (diff_output, stats) = generate_unified_diff(path, original, modified, 3);
    if stats.files_changed > 0 {
        print!("{}", diff_output);
    }
    stats
}

/// One line per file: added/removed line counts, no hunks
pub fn generate_summary_line(path: &Path, original: &str, modified: &str) -> (String, DiffStats) {
    let diff = TextDiff::from_lines(original, modified);
    let stats = count_changes(&diff);
    let line = format!(
        "{}: +{} -{}",
        path.display(),
        stats.lines_added,
        stats.lines_removed
    );
    (line, stats)
}

pub fn print_summary_diff(path: &Path, original: &str, modified: &str) -> DiffStats {
    let (line, stats) = generate_summary_line(path, original, modified);
    if stats.files_changed > 0 {
        println!("{}", line);
    }
    stats
}
