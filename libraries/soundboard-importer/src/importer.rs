//! Import orchestration

use soundboard_core::{CategoryId, Sound, SoundId, SoundboardStore};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::checksum::calculate_checksum;
use crate::media::{is_audio_file, read_media_info};
use crate::types::{AutoImportReport, ImportBatch, ImportFailure, TempSound};
use crate::{ImportError, Result};

/// Imports files into the sound directory
///
/// Sound files live in `sound_dir`; files under review live in `cache_dir`.
#[derive(Debug, Clone)]
pub struct SoundImporter {
    sound_dir: PathBuf,
    cache_dir: PathBuf,
}

impl SoundImporter {
    pub fn new(sound_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            sound_dir: sound_dir.into(),
            cache_dir: cache_dir.into(),
        }
    }

    pub fn sound_dir(&self) -> &Path {
        &self.sound_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Copy `paths` into the cache dir for review
    ///
    /// Each file is flagged as a duplicate when its checksum is in
    /// `existing_checksums` or matches an earlier file of this batch.
    /// Files that cannot be read end up in [`ImportBatch::errors`].
    pub async fn prepare(&self, paths: Vec<PathBuf>, existing_checksums: HashSet<String>) -> ImportBatch {
        let importer = self.clone();
        let count = paths.len();

        match tokio::task::spawn_blocking(move || importer.prepare_blocking(&paths, existing_checksums))
            .await
        {
            Ok(batch) => {
                info!(
                    "Prepared {} of {} files ({} duplicates)",
                    batch.sounds.len(),
                    count,
                    batch.duplicate_count()
                );
                batch
            }
            Err(e) => ImportBatch {
                sounds: Vec::new(),
                errors: vec![ImportFailure {
                    path: self.cache_dir.clone(),
                    message: ImportError::Task(e.to_string()).to_string(),
                }],
            },
        }
    }

    fn prepare_blocking(&self, paths: &[PathBuf], mut seen: HashSet<String>) -> ImportBatch {
        let mut batch = ImportBatch::default();

        if let Err(e) = fs::create_dir_all(&self.cache_dir) {
            batch.errors.extend(paths.iter().map(|path| ImportFailure {
                path: path.clone(),
                message: e.to_string(),
            }));
            return batch;
        }

        for path in paths {
            match self.prepare_file(path, &mut seen) {
                Ok(sound) => batch.sounds.push(sound),
                Err(e) => {
                    warn!("Failed to prepare {}: {}", path.display(), e);
                    batch.errors.push(ImportFailure {
                        path: path.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        batch
    }

    fn prepare_file(&self, path: &Path, seen: &mut HashSet<String>) -> Result<TempSound> {
        let info = read_media_info(path)?;
        let checksum = calculate_checksum(path)?;
        let id = SoundId::generate();
        let file = self.cache_dir.join(output_file_name(path, &id)?);

        fs::copy(path, &file)?;
        debug!("Cached {} as {}", path.display(), file.display());

        let is_duplicate = !seen.insert(checksum.clone());
        Ok(TempSound {
            name: info.title.unwrap_or_else(|| file_stem(path)),
            id,
            file,
            duration: info.duration,
            checksum,
            is_duplicate,
            mime_type: info.mime_type,
        })
    }

    /// Import every audio file directly inside `dir` whose content is not stored yet
    ///
    /// Files go straight to the sound dir and are inserted one by one, so a
    /// failing file does not affect the others.
    pub async fn auto_import(
        &self,
        store: &dyn SoundboardStore,
        dir: &Path,
        category_id: &CategoryId,
    ) -> Result<AutoImportReport> {
        if !dir.is_dir() {
            return Err(ImportError::InvalidPath(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        fs::create_dir_all(&self.sound_dir)?;

        let mut seen: HashSet<String> = store.list_checksums().await?.into_iter().collect();
        let mut report = AutoImportReport::default();

        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|path| path.is_file() && is_audio_file(path))
            .collect();
        files.sort();

        for path in files {
            match self.import_file(store, &path, category_id, &mut seen).await {
                Ok(Some(sound)) => report.imported.push(sound),
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    warn!("Auto import of {} failed: {}", path.display(), e);
                    report.errors.push(ImportFailure {
                        path,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Auto import from {}: {} imported, {} skipped, {} failed",
            dir.display(),
            report.imported.len(),
            report.skipped,
            report.errors.len()
        );
        Ok(report)
    }

    async fn import_file(
        &self,
        store: &dyn SoundboardStore,
        path: &Path,
        category_id: &CategoryId,
        seen: &mut HashSet<String>,
    ) -> Result<Option<Sound>> {
        let checksum = calculate_checksum(path)?;
        if seen.contains(&checksum) {
            return Ok(None);
        }

        let info = read_media_info(path)?;
        let id = SoundId::generate();
        let target = self.sound_dir.join(output_file_name(path, &id)?);
        fs::copy(path, &target)?;

        let mut sound = Sound::new(
            category_id.clone(),
            info.title.unwrap_or_else(|| file_stem(path)),
            target.display().to_string(),
            checksum.clone(),
            info.mime_type,
        );
        sound.id = id;
        sound.duration = info.duration;

        if let Err(e) = store.insert_sounds(std::slice::from_ref(&sound)).await {
            let _ = fs::remove_file(&target);
            return Err(e.into());
        }

        seen.insert(checksum);
        Ok(Some(sound))
    }
}

impl ImportBatch {
    /// Move the reviewed files into the sound dir and build their sounds
    ///
    /// Duplicates are left out unless `include_duplicates` is set; their
    /// cached copies are deleted. `name_override` renames the sound when
    /// exactly one is imported.
    pub fn into_sounds(
        self,
        importer: &SoundImporter,
        category_id: &CategoryId,
        include_duplicates: bool,
        name_override: Option<&str>,
    ) -> Result<Vec<Sound>> {
        fs::create_dir_all(&importer.sound_dir)?;

        let (keep, duplicates): (Vec<_>, Vec<_>) = self
            .sounds
            .into_iter()
            .partition(|s| include_duplicates || !s.is_duplicate);
        for skipped in duplicates {
            let _ = fs::remove_file(&skipped.file);
        }

        let single = keep.len() == 1;
        let mut sounds = Vec::with_capacity(keep.len());
        for temp in keep {
            let file_name = temp
                .file
                .file_name()
                .ok_or_else(|| ImportError::InvalidPath(temp.file.display().to_string()))?;
            let target = importer.sound_dir.join(file_name);
            move_file(&temp.file, &target)?;

            let name = match name_override.map(str::trim) {
                Some(name) if single && !name.is_empty() => name.to_string(),
                _ => temp.name,
            };
            let mut sound = Sound::new(
                category_id.clone(),
                name,
                target.display().to_string(),
                temp.checksum,
                temp.mime_type,
            );
            sound.id = temp.id;
            sound.duration = temp.duration;
            sounds.push(sound);
        }

        Ok(sounds)
    }

    /// Delete every cached copy without importing
    pub fn discard(self) {
        for temp in self.sounds {
            let _ = fs::remove_file(&temp.file);
        }
    }
}

/// `{stem}-{id}{.ext}`, unique within the sound dir
fn output_file_name(path: &Path, id: &SoundId) -> Result<String> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ImportError::InvalidPath(path.display().to_string()))?;
    let suffix = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();

    Ok(format!("{stem}-{id}{suffix}"))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Rename, falling back to copy and delete across file systems
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_err() {
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(())
}
