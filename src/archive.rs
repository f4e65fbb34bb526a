//! Moving processed originals into an archive directory

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::{Error, Result};

/// Timestamp appended to an archived file whose name is already taken
const COLLISION_STAMP: &str = "%Y%m%d_%H%M%S";

/// Move `src` into `archive_dir`, returning its new path
///
/// An existing file of the same name is never replaced: the moved file gets
/// a timestamp suffix, plus a counter if that name is taken too. When a
/// rename is impossible (different file systems) the file is copied and the
/// original removed.
pub fn move_to_archive(src: &Path, archive_dir: &Path) -> Result<PathBuf> {
    if !src.exists() {
        return Err(Error::FileNotFound(src.to_path_buf()));
    }
    let name = src
        .file_name()
        .ok_or_else(|| Error::InvalidArgument(format!("{} has no file name", src.display())))?;

    fs::create_dir_all(archive_dir)?;
    let mut target = archive_dir.join(name);
    if target.exists() {
        target = free_name(src, archive_dir, &Local::now().format(COLLISION_STAMP).to_string());
    }

    if let Err(e) = fs::rename(src, &target) {
        log::debug!("rename {} failed ({}); copying instead", src.display(), e);
        fs::copy(src, &target)?;
        fs::remove_file(src)?;
    }
    Ok(target)
}

fn free_name(src: &Path, archive_dir: &Path, stamp: &str) -> PathBuf {
    let stem = src.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let ext = src
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let candidate = archive_dir.join(format!("{}_{}{}", stem, stamp, ext));
    if !candidate.exists() {
        return candidate;
    }
    (1..)
        .map(|i| archive_dir.join(format!("{}_{}_{:03}{}", stem, stamp, i, ext)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}
