use soundboard_core::types::{Category, Sound};
use soundboard_core::{SoundboardStore, StoreOperation};
use std::time::Duration;

mod test_helpers;
use test_helpers::{create_test_category, create_test_sound, TestDb};

#[tokio::test]
async fn test_apply_is_all_or_nothing() {
    let db = TestDb::new().await;
    let category = Category::new("New", 0, 0);
    let orphan = Sound::new(
        soundboard_core::CategoryId::new("missing"),
        "x",
        "/x.wav",
        "x",
        "audio/wav",
    );

    let result = db
        .store
        .apply(&[
            StoreOperation::InsertCategories(vec![category]),
            StoreOperation::InsertSounds(vec![orphan]),
        ])
        .await;

    assert!(result.is_err());
    assert!(db.store.list_categories().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_apply_runs_operations_in_order() {
    let db = TestDb::new().await;
    let old = create_test_category(&db.store, "Old", 0).await;
    create_test_sound(&db.store, &old.id, "old", "1").await;

    let new_category = Category::new("New", 0, 1);
    let new_sound = Sound::new(new_category.id.clone(), "new", "/new.wav", "2", "audio/wav");

    db.store
        .apply(&[
            StoreOperation::InsertCategories(vec![new_category.clone()]),
            StoreOperation::InsertSounds(vec![new_sound.clone()]),
            StoreOperation::DeleteCategories(vec![old.id.clone()]),
        ])
        .await
        .unwrap();

    assert_eq!(db.store.list_categories().await.unwrap(), vec![new_category]);
    assert_eq!(db.store.list_sounds().await.unwrap(), vec![new_sound]);
}

#[tokio::test]
async fn test_writes_bump_revision() {
    let db = TestDb::new().await;
    let mut changes = db.store.subscribe_changes();

    create_test_category(&db.store, "A", 0).await;

    assert!(changes.has_changed().unwrap());
    changes.mark_unchanged();
    assert_eq!(*changes.borrow(), 1);
}

#[tokio::test]
async fn test_category_feed_follows_writes() {
    let db = TestDb::new().await;
    let mut feed = db.store.watch_categories().await.unwrap();
    assert!(feed.borrow_and_update().is_empty());

    let category = create_test_category(&db.store, "A", 0).await;

    tokio::time::timeout(Duration::from_secs(5), feed.changed())
        .await
        .expect("feed did not update")
        .unwrap();
    assert_eq!(*feed.borrow(), vec![category]);
}

#[tokio::test]
async fn test_sound_feed_reports_deletion() {
    let db = TestDb::new().await;
    let category = create_test_category(&db.store, "A", 0).await;
    let sound = create_test_sound(&db.store, &category.id, "s", "1").await;
    let mut feed = db.store.watch_sound(sound.id.clone()).await.unwrap();
    assert_eq!(feed.borrow_and_update().as_ref(), Some(&sound));

    db.store.delete_sounds(&[sound.id.clone()]).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), feed.changed())
        .await
        .expect("feed did not update")
        .unwrap();
    assert!(feed.borrow().is_none());
}
