//! Atomic document writes: write beside the target as `<name>.tmp`, then rename over it.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::WriteError;

/// Temp path next to `target` (same directory, so the rename stays on one filesystem).
pub fn temp_path_for(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    target
        .parent()
        .unwrap_or(Path::new("."))
        .join(format!("{name}.tmp"))
}

/// Create the parent directory of `path` if it has one.
pub fn ensure_parent_dir(path: &Path) -> Result<(), WriteError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| WriteError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// Write `bytes` to `target` atomically. The temp file is removed if anything fails.
pub fn write_atomic(target: &Path, bytes: &[u8]) -> Result<(), WriteError> {
    ensure_parent_dir(target)?;
    let temp_path = temp_path_for(target);
    let result = write_and_sync(&temp_path, bytes)
        .and_then(|()| rename_temp_to_final(&temp_path, target));
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

/// Pretty-print `value` as JSON (two-space indent, trailing newline) and write it atomically.
pub fn write_json_atomic<T: Serialize + ?Sized>(target: &Path, value: &T) -> Result<(), WriteError> {
    let mut bytes = serde_json::to_vec_pretty(value).map_err(|source| WriteError::Serialize {
        path: target.to_path_buf(),
        source,
    })?;
    bytes.push(b'\n');
    write_atomic(target, &bytes)
}

fn write_and_sync(path: &Path, bytes: &[u8]) -> Result<(), WriteError> {
    let to_err = |source| WriteError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = fs::File::create(path).map_err(to_err)?;
    file.write_all(bytes).map_err(to_err)?;
    file.sync_all().map_err(to_err)
}

pub fn rename_temp_to_final(temp_path: &Path, final_path: &Path) -> Result<(), WriteError> {
    fs::rename(temp_path, final_path).map_err(|source| WriteError::Rename {
        from: temp_path.to_path_buf(),
        to: final_path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_sits_beside_target() {
        assert_eq!(
            temp_path_for(Path::new("out/a.json")),
            PathBuf::from("out/a.json.tmp")
        );
        assert_eq!(temp_path_for(Path::new("a.json")), PathBuf::from("a.json.tmp"));
    }

    #[test]
    fn write_atomic_creates_parent_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/deeper/doc.json");
        write_json_atomic(&target, &vec![1, 2]).unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "[\n  1,\n  2\n]\n");
        assert!(!temp_path_for(&target).exists());
    }
}
