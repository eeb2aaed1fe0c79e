//! Batch Processing Module
//!
//! File discovery for batch runs plus the `BatchResult` tally consumed by the
//! summary report.

use crate::app_error::AppError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Source formats picked up for conversion.
pub const SOURCE_IMAGE_EXTENSIONS: &[&str] = &["gif", "png", "jpg", "jpeg"];

/// Recursively collect regular files under `dir` whose extension (case
/// insensitive) is in `extensions`.
///
/// Entries are sorted by file name inside each directory, so two runs over an
/// unchanged tree produce the same order. The root must exist and be
/// readable; unreadable entries below it are logged and skipped.
pub fn collect_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, AppError> {
    if !dir.exists() {
        return Err(AppError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    if !dir.is_dir() {
        return Err(AppError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }
    std::fs::read_dir(dir).map_err(|source| AppError::DirectoryUnreadable {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file()
            && crate::common_utils::has_extension(entry.path(), extensions)
        {
            files.push(entry.into_path());
        }
    }

    debug!(root = %dir.display(), count = files.len(), "File discovery finished");
    Ok(files)
}

/// Collect the source images (gif, png, jpg, jpeg) under `dir`.
///
/// Sources sharing a base name (`a.png` and `a.jpg`) write to the same
/// outputs; each such group is logged as a warning.
pub fn collect_source_images(dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    let files = collect_files(dir, SOURCE_IMAGE_EXTENSIONS)?;
    for group in base_name_collisions(&files) {
        let names: Vec<String> = group.iter().map(|p| p.display().to_string()).collect();
        warn!(
            base = %crate::common_utils::base_name(&group[0]).display(),
            sources = %names.join(", "),
            "Sources share a base name and will overwrite each other's outputs"
        );
    }
    Ok(files)
}

/// Groups of two or more files with the same path minus extension, in
/// discovery order.
pub fn base_name_collisions(files: &[PathBuf]) -> Vec<Vec<PathBuf>> {
    let mut groups: Vec<(PathBuf, Vec<PathBuf>)> = Vec::new();
    let mut index: HashMap<PathBuf, usize> = HashMap::new();
    for file in files {
        let base = crate::common_utils::base_name(file);
        match index.get(&base) {
            Some(&i) => groups[i].1.push(file.clone()),
            None => {
                index.insert(base.clone(), groups.len());
                groups.push((base, vec![file.clone()]));
            }
        }
    }
    groups
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(_, members)| members)
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub total: usize,
    pub succeeded: usize,
    pub partial: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: usize,
    pub errors: Vec<(PathBuf, String)>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&mut self) {
        self.total += 1;
        self.succeeded += 1;
    }

    /// At least one output was produced but some targets failed.
    pub fn partial(&mut self, path: PathBuf, error: String) {
        self.total += 1;
        self.partial += 1;
        self.errors.push((path, error));
    }

    pub fn fail(&mut self, path: PathBuf, error: String) {
        self.total += 1;
        self.failed += 1;
        self.errors.push((path, error));
    }

    pub fn skip(&mut self) {
        self.total += 1;
        self.skipped += 1;
    }

    pub fn cancel(&mut self) {
        self.total += 1;
        self.cancelled += 1;
    }

    /// Share of attempted files that converted cleanly. Skipped and cancelled
    /// files are not attempts; a batch with no attempts reports 100%.
    pub fn success_rate(&self) -> f64 {
        let attempted = self.succeeded + self.partial + self.failed;
        if attempted == 0 {
            100.0
        } else {
            (self.succeeded as f64 / attempted as f64) * 100.0
        }
    }
}
