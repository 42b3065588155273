use std::path::{Path, PathBuf};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::addon::Addon;
use crate::config::ParserConfig;
use crate::error::{AddonError, Result};

/// Outcome of loading every addon below a repository directory.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Parsed addons, sorted by id.
    pub addons: Vec<Addon>,
    /// Addon directories whose manifest could not be parsed.
    pub failures: Vec<(PathBuf, AddonError)>,
}

/// Directories directly below `root` (or `root` itself) that contain a
/// manifest.
pub fn find_addon_dirs(root: &Path, config: &ParserConfig) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    if !root.exists() {
        return Ok(dirs);
    }
    for entry in WalkDir::new(root).max_depth(2).sort_by_file_name() {
        let entry = entry.map_err(|e| AddonError::IoError(std::io::Error::other(e)))?;
        if entry.file_type().is_file() && entry.file_name() == config.manifest_name.as_str() {
            if let Some(dir) = entry.path().parent() {
                dirs.push(dir.to_path_buf());
            }
        }
    }
    Ok(dirs)
}

/// Parse every addon found by [`find_addon_dirs`]. A broken manifest is
/// recorded in the report and does not stop the scan.
pub fn load_all(root: &Path, config: &ParserConfig) -> Result<ScanReport> {
    let dirs = find_addon_dirs(root, config)?;
    tracing::debug!("found {} addon(s) under {}", dirs.len(), root.display());

    let results: Vec<(PathBuf, Result<Addon>)> = dirs
        .into_par_iter()
        .map(|dir| {
            let result = Addon::load_with(&dir, config);
            (dir, result)
        })
        .collect();

    let mut report = ScanReport::default();
    for (dir, result) in results {
        match result {
            Ok(addon) => report.addons.push(addon),
            Err(e) => {
                tracing::warn!("skipping {}: {}", dir.display(), e);
                report.failures.push((dir, e));
            }
        }
    }
    report.addons.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(report)
}
