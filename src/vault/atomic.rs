//! Owner-only, atomic-replace file and directory helpers.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write `bytes` to `path` atomically.
///
/// 1. Write to a uniquely named temp file in the same directory.
/// 2. Flush it to disk.
/// 3. Rename it over the target.
///
/// Readers see either the old file or the new one, never a mix.
/// Concurrent writers each own their temp file, so the last rename wins.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));

    // Dot-prefixed so directory scans skip it; created 0600 on unix.
    let mut tmp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    // On failure the temp file is removed when `e.file` drops.
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// `base` if nothing exists there yet, else the first free `base.<n>`.
pub fn unused_path(base: PathBuf) -> PathBuf {
    if !base.exists() {
        return base;
    }
    (1u32..)
        .map(|n| {
            let mut name = base.clone().into_os_string();
            name.push(format!(".{n}"));
            PathBuf::from(name)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or(base)
}

/// Create `dir` and any missing parents with owner-only permissions.
pub fn create_dir_private(dir: &Path) -> std::io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}
