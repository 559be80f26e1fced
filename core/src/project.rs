//! Helpers for reading assembly project trees.

use std::path::Path;

use landstalker_shared::fs::{MAX_ASSET_BYTES, read_file_with_limit, write_file_atomic};
use landstalker_shared::paths::{is_safe_relative_path, to_project_path};

use crate::asm::{AsmFile, FileType, Include};
use crate::error::{DataError, Result};

/// Path of the file included right after `label`.
///
/// A missing label means the project lacks a well-known asset. Included paths
/// must stay inside the project.
pub fn include_path(file: &mut AsmFile, label: &str, kind: FileType) -> Result<String> {
    let include = file.include_after(label).map_err(|e| match e {
        DataError::LabelNotFound { label, .. } => DataError::MissingAsset(label),
        other => other,
    })?;
    checked_include(file, label, include, kind)
}

/// Path of the include at the cursor, which belongs to `label`.
pub fn next_include_path(file: &mut AsmFile, label: &str, kind: FileType) -> Result<String> {
    let include = file.read_include()?;
    checked_include(file, label, include, kind)
}

fn checked_include(file: &AsmFile, label: &str, include: Include, kind: FileType) -> Result<String> {
    if include.kind != kind || !is_safe_relative_path(&include.path) {
        return Err(DataError::Syntax {
            path: file.path().to_path_buf(),
            line: 0,
            message: format!("invalid include {:?} after {label}", include.path),
        });
    }
    Ok(to_project_path(&include.path))
}

/// Load an assembler source relative to the project base.
pub fn load_asm(base: &Path, relative: &str) -> Result<AsmFile> {
    AsmFile::load(&base.join(relative))
}

/// Read a binary include relative to the project base.
pub fn read_binary(base: &Path, relative: &str) -> Result<Vec<u8>> {
    let path = base.join(relative);
    let bytes = read_file_with_limit(&path, MAX_ASSET_BYTES).map_err(|e| DataError::io(&path, e))?;
    tracing::debug!(path = relative, size = bytes.len(), "Read project file");
    Ok(bytes)
}

/// Write a binary include relative to the project base.
pub fn write_binary(base: &Path, relative: &str, bytes: &[u8]) -> Result<()> {
    let path = base.join(relative);
    write_file_atomic(&path, bytes).map_err(|e| DataError::io(&path, e))?;
    tracing::debug!(path = relative, size = bytes.len(), "Wrote project file");
    Ok(())
}
