//! Orphan file cleanup

use soundboard_core::SoundboardStore;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::Result;

/// Delete sound files no sound refers to, and everything in the cache dir
///
/// Returns the number of deleted files. Missing directories count as empty.
pub async fn clean_orphans(
    store: &dyn SoundboardStore,
    sound_dir: &Path,
    cache_dir: &Path,
) -> Result<usize> {
    let referenced: HashSet<PathBuf> = store
        .list_sounds()
        .await?
        .iter()
        .map(|sound| sound.file_path())
        .collect();

    let mut deleted = 0;
    for file in list_files(sound_dir)? {
        if !referenced.contains(&file) && remove(&file) {
            deleted += 1;
        }
    }
    for file in list_files(cache_dir)? {
        if remove(&file) {
            deleted += 1;
        }
    }

    info!("Cleaned {} orphaned files", deleted);
    Ok(deleted)
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

fn remove(file: &Path) -> bool {
    match fs::remove_file(file) {
        Ok(()) => {
            debug!("Deleted {}", file.display());
            true
        }
        Err(e) => {
            warn!("Failed to delete {}: {}", file.display(), e);
            false
        }
    }
}
