//! Path utilities

use std::path::{Path, PathBuf};

use crate::types::InputFile;
use crate::utils::config::DOCUMENT_SUFFIX;

/// Convert absolute path to relative path from base
pub fn path_relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    path.strip_prefix(base).ok().map(|p| p.to_path_buf())
}

/// Separate-mode document path: `<out_dir>/<relative parent>/<stem>.cclib.json`.
/// Mirroring the relative parent keeps same-named files from different subdirectories apart.
pub fn document_path_for(file: &InputFile, out_dir: &Path) -> PathBuf {
    let dir = match file.rel.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => out_dir.join(parent),
        _ => out_dir.to_path_buf(),
    };
    dir.join(format!("{}.{}", file.stem(), DOCUMENT_SUFFIX))
}

/// Sample-mode default: the input path with its extension replaced (`a.log` -> `a.cclib.json`).
pub fn sample_output_path(logfile: &Path) -> PathBuf {
    logfile.with_extension(DOCUMENT_SUFFIX)
}

/// Message carried by a panic payload (`&str` or `String`), or a placeholder.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
