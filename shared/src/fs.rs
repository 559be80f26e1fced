//! Filesystem helpers shared by the project loaders and writers.

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Maximum allowed ROM size for reading into memory.
pub const MAX_ROM_BYTES: u64 = 16 * 1024 * 1024; // 16 MiB
/// Maximum allowed size of a single project include.
pub const MAX_ASSET_BYTES: u64 = 4 * 1024 * 1024; // 4 MiB
/// Maximum allowed size of a configuration or symbol file.
pub const MAX_CONFIG_BYTES: u64 = 8 * 1024 * 1024; // 8 MiB

/// Read a file into memory with a size cap.
pub fn read_file_with_limit(path: &Path, max_bytes: u64) -> io::Result<Vec<u8>> {
    let len = std::fs::metadata(path)?.len();
    if len > max_bytes {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("file too large ({len} bytes, max {max_bytes} bytes)"),
        ));
    }
    std::fs::read(path)
}

/// Write `bytes` to `path` atomically, creating missing parent directories.
///
/// The data lands in a temporary file in the destination directory first and
/// is renamed over `path` only after the whole buffer has been written, so a
/// failed write never leaves a truncated file behind.
pub fn write_file_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
