use soundboard_core::SoundboardStore;
use soundboard_importer::{calculate_checksum, clean_orphans, read_media_info};
use std::collections::HashSet;
use std::time::Duration;

use test_helpers::Fixture;

#[tokio::test]
async fn test_read_media_info_wav() {
    let f = Fixture::new().await;
    let path = f.source_wav("beep.wav", 1);

    let info = read_media_info(&path).unwrap();
    assert_eq!(info.mime_type, "audio/wav");
    assert_eq!(info.duration, Some(Duration::from_millis(500)));
    assert_eq!(info.title, None);
}

#[tokio::test]
async fn test_read_media_info_rejects_non_audio() {
    let f = Fixture::new().await;
    let path = f.source.join("notes.txt");
    std::fs::write(&path, b"hello").unwrap();

    assert!(read_media_info(&path).is_err());
}

#[tokio::test]
async fn test_prepare_copies_into_cache() {
    let f = Fixture::new().await;
    let path = f.source_wav("Air horn.wav", 1);

    let batch = f.importer.prepare(vec![path.clone()], HashSet::new()).await;

    assert!(batch.errors.is_empty());
    assert_eq!(batch.sounds.len(), 1);
    let temp = &batch.sounds[0];
    assert_eq!(temp.name, "Air horn");
    assert!(!temp.is_duplicate);
    assert!(temp.file.starts_with(f.importer.cache_dir()));
    assert!(temp.file.exists());
    assert!(path.exists(), "source must be left in place");
    assert_eq!(temp.checksum, calculate_checksum(&path).unwrap());
}

#[tokio::test]
async fn test_prepare_flags_known_checksum() {
    let f = Fixture::new().await;
    let path = f.source_wav("beep.wav", 3);
    let existing = HashSet::from([calculate_checksum(&path).unwrap()]);

    let batch = f.importer.prepare(vec![path], existing).await;

    assert_eq!(batch.sounds.len(), 1);
    assert!(batch.sounds[0].is_duplicate);
}

#[tokio::test]
async fn test_prepare_flags_repeat_within_batch() {
    let f = Fixture::new().await;
    let a = f.source_wav("a.wav", 5);
    let b = f.source_wav("b.wav", 5);
    let c = f.source_wav("c.wav", 6);

    let batch = f.importer.prepare(vec![a, b, c], HashSet::new()).await;

    let flags: Vec<bool> = batch.sounds.iter().map(|s| s.is_duplicate).collect();
    assert_eq!(flags, vec![false, true, false]);
    assert_eq!(batch.duplicate_count(), 1);
}

#[tokio::test]
async fn test_prepare_collects_errors() {
    let f = Fixture::new().await;
    let good = f.source_wav("good.wav", 1);
    let missing = f.source.join("missing.wav");

    let batch = f.importer.prepare(vec![missing.clone(), good], HashSet::new()).await;

    assert_eq!(batch.sounds.len(), 1);
    assert_eq!(batch.errors.len(), 1);
    assert_eq!(batch.errors[0].path, missing);
}

#[tokio::test]
async fn test_into_sounds_skips_duplicates_by_default() {
    let f = Fixture::new().await;
    let a = f.source_wav("a.wav", 9);
    let b = f.source_wav("b.wav", 9);

    let batch = f.importer.prepare(vec![a, b], HashSet::new()).await;
    let duplicate_file = batch.sounds[1].file.clone();
    let sounds = batch
        .into_sounds(&f.importer, &f.category.id, false, None)
        .unwrap();

    assert_eq!(sounds.len(), 1);
    assert_eq!(sounds[0].name, "a");
    assert_eq!(sounds[0].category_id, f.category.id);
    assert_eq!(sounds[0].duration, Some(Duration::from_millis(500)));
    assert!(sounds[0].file_path().starts_with(f.importer.sound_dir()));
    assert!(sounds[0].file_path().exists());
    assert!(!duplicate_file.exists());
    assert_eq!(Fixture::files_in(f.importer.cache_dir()), 0);
}

#[tokio::test]
async fn test_into_sounds_can_include_duplicates() {
    let f = Fixture::new().await;
    let a = f.source_wav("a.wav", 9);
    let b = f.source_wav("b.wav", 9);

    let batch = f.importer.prepare(vec![a, b], HashSet::new()).await;
    let sounds = batch
        .into_sounds(&f.importer, &f.category.id, true, Some("ignored"))
        .unwrap();

    assert_eq!(sounds.len(), 2);
    assert_eq!(sounds[0].checksum, sounds[1].checksum);
    // Override applies to single imports only
    assert_eq!(sounds[0].name, "a");
    assert_eq!(Fixture::files_in(f.importer.sound_dir()), 2);
}

#[tokio::test]
async fn test_into_sounds_name_override() {
    let f = Fixture::new().await;
    let path = f.source_wav("x.wav", 2);

    let batch = f.importer.prepare(vec![path], HashSet::new()).await;
    let id = batch.sounds[0].id.clone();
    let sounds = batch
        .into_sounds(&f.importer, &f.category.id, false, Some("  Boom  "))
        .unwrap();

    assert_eq!(sounds[0].name, "Boom");
    assert_eq!(sounds[0].id, id);
}

#[tokio::test]
async fn test_discard_deletes_cached_copies() {
    let f = Fixture::new().await;
    let path = f.source_wav("x.wav", 2);

    let batch = f.importer.prepare(vec![path], HashSet::new()).await;
    assert_eq!(Fixture::files_in(f.importer.cache_dir()), 1);

    batch.discard();
    assert_eq!(Fixture::files_in(f.importer.cache_dir()), 0);
}

#[tokio::test]
async fn test_auto_import_skips_stored_content() {
    let f = Fixture::new().await;
    let existing = f.source_wav("existing.wav", 11);
    f.source_wav("new.wav", 12);
    f.source_wav("new-copy.wav", 12);
    std::fs::write(f.source.join("cover.jpg"), b"not audio").unwrap();

    let batch = f.importer.prepare(vec![existing], HashSet::new()).await;
    let stored = batch.into_sounds(&f.importer, &f.category.id, false, None).unwrap();
    f.store.insert_sounds(&stored).await.unwrap();

    let report = f
        .importer
        .auto_import(&f.store, &f.source, &f.category.id)
        .await
        .unwrap();

    assert_eq!(report.imported.len(), 1);
    assert_eq!(report.skipped, 2);
    assert!(report.errors.is_empty());
    assert_eq!(report.imported[0].name, "new-copy");
    assert_eq!(f.store.list_sounds().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_auto_import_requires_directory() {
    let f = Fixture::new().await;
    let result = f
        .importer
        .auto_import(&f.store, &f.source.join("nope"), &f.category.id)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_clean_orphans() {
    let f = Fixture::new().await;
    let keep = f.source_wav("keep.wav", 21);
    let orphan = f.source_wav("orphan.wav", 22);
    let pending = f.source_wav("pending.wav", 23);

    let batch = f.importer.prepare(vec![keep, orphan], HashSet::new()).await;
    let mut sounds = batch.into_sounds(&f.importer, &f.category.id, false, None).unwrap();
    let orphaned = sounds.pop().unwrap();
    f.store.insert_sounds(&sounds).await.unwrap();
    let _pending = f.importer.prepare(vec![pending], HashSet::new()).await;

    let deleted = clean_orphans(&f.store, f.importer.sound_dir(), f.importer.cache_dir())
        .await
        .unwrap();

    assert_eq!(deleted, 2);
    assert!(sounds[0].file_path().exists());
    assert!(!orphaned.file_path().exists());
    assert_eq!(Fixture::files_in(f.importer.cache_dir()), 0);
}

#[tokio::test]
async fn test_clean_orphans_without_directories() {
    let f = Fixture::new().await;
    let deleted = clean_orphans(&f.store, f.importer.sound_dir(), f.importer.cache_dir())
        .await
        .unwrap();
    assert_eq!(deleted, 0);
}
