use soundboard::service::DEFAULT_CATEGORY_NAME;
use soundboard::Soundboard;
use soundboard_core::{RepressMode, Sound, SoundboardStore, DEFAULT_CATEGORY_COLOR};
use soundboard_playback::PlaybackState;

mod test_helpers;
use test_helpers::{config_in, write_wav, PlayingBoard, TestBoard};

#[tokio::test]
async fn test_open_creates_default_category_once() {
    let board = TestBoard::new().await;

    let categories = board.soundboard.categories().await.unwrap();
    assert_eq!(TestBoard::names(&categories), vec![DEFAULT_CATEGORY_NAME]);
    assert_eq!(categories[0].position, 0);
    assert_eq!(categories[0].background_color, DEFAULT_CATEGORY_COLOR);

    let reopened = board.reopen().await;
    assert_eq!(reopened.categories().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_fresh_board_has_no_history() {
    let board = TestBoard::new().await;

    assert!(!board.soundboard.can_undo().await);
    assert!(!board.soundboard.can_redo().await);
    assert!(!board.soundboard.undo().await.unwrap());
}

#[tokio::test]
async fn test_create_category_appends() {
    let board = TestBoard::new().await;

    let effects = board.soundboard.create_category("Effects", 0xFF11_2233).await.unwrap();
    let music = board.soundboard.create_category("Music", 0xFF44_5566).await.unwrap();

    assert_eq!(effects.position, 1);
    assert_eq!(music.position, 2);
    assert!(board.soundboard.can_undo().await);
}

#[tokio::test]
async fn test_move_down_swaps_with_next() {
    let board = TestBoard::new().await;
    let first = board.default_category().await;
    board.soundboard.create_category("Second", 0xFF00_0000).await.unwrap();

    assert!(board.soundboard.move_category_down(&first.id).await.unwrap());

    let categories = board.soundboard.categories().await.unwrap();
    assert_eq!(TestBoard::names(&categories), vec!["Second", DEFAULT_CATEGORY_NAME]);
    assert_eq!(categories[0].position, 0);
    assert_eq!(categories[1].position, 1);
}

#[tokio::test]
async fn test_move_up_swaps_with_previous() {
    let board = TestBoard::new().await;
    let second = board.soundboard.create_category("Second", 0xFF00_0000).await.unwrap();

    assert!(board.soundboard.move_category_up(&second.id).await.unwrap());

    let categories = board.soundboard.categories().await.unwrap();
    assert_eq!(TestBoard::names(&categories), vec!["Second", DEFAULT_CATEGORY_NAME]);
}

#[tokio::test]
async fn test_move_without_neighbor_is_noop() {
    let board = TestBoard::new().await;
    let only = board.default_category().await;

    assert!(!board.soundboard.move_category_up(&only.id).await.unwrap());
    assert!(!board.soundboard.move_category_down(&only.id).await.unwrap());
    assert!(!board.soundboard.can_undo().await);
}

#[tokio::test]
async fn test_undo_move_restores_order() {
    let board = TestBoard::new().await;
    let first = board.default_category().await;
    board.soundboard.create_category("Second", 0xFF00_0000).await.unwrap();
    board.soundboard.move_category_down(&first.id).await.unwrap();

    assert!(board.soundboard.undo().await.unwrap());
    let categories = board.soundboard.categories().await.unwrap();
    assert_eq!(TestBoard::names(&categories), vec![DEFAULT_CATEGORY_NAME, "Second"]);

    assert!(board.soundboard.redo().await.unwrap());
    let categories = board.soundboard.categories().await.unwrap();
    assert_eq!(TestBoard::names(&categories), vec!["Second", DEFAULT_CATEGORY_NAME]);
}

#[tokio::test]
async fn test_collapse_is_not_checkpointed() {
    let board = TestBoard::new().await;
    let category = board.default_category().await;

    board
        .soundboard
        .set_category_collapsed(&category.id, true)
        .await
        .unwrap();

    assert!(board.default_category().await.collapsed);
    assert!(!board.soundboard.can_undo().await);
}

#[tokio::test]
async fn test_delete_category_round_trips_through_undo() {
    let board = TestBoard::new().await;
    let category = board.soundboard.create_category("Effects", 0xFF00_0000).await.unwrap();
    let sound = Sound::new(category.id.clone(), "Gong", "/sounds/gong.wav", "gong", "audio/wav");
    board.soundboard.add_sounds(&[sound.clone()]).await.unwrap();

    board.soundboard.delete_category(&category.id).await.unwrap();
    assert_eq!(board.soundboard.categories().await.unwrap().len(), 1);
    assert!(board.soundboard.sounds().await.unwrap().is_empty());

    assert!(board.soundboard.undo().await.unwrap());
    let store = board.soundboard.store();
    assert_eq!(store.get_category(&category.id).await.unwrap(), Some(category.clone()));
    assert_eq!(store.get_sound(&sound.id).await.unwrap(), Some(sound.clone()));

    assert!(board.soundboard.redo().await.unwrap());
    assert!(store.get_category(&category.id).await.unwrap().is_none());
    assert!(store.get_sound(&sound.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_unknown_category_fails_without_checkpoint() {
    let board = TestBoard::new().await;

    let result = board
        .soundboard
        .delete_category(&soundboard_core::CategoryId::new("missing"))
        .await;

    assert!(matches!(result, Err(soundboard::AppError::NotFound(_))));
    assert!(!board.soundboard.can_undo().await);
}

#[tokio::test]
async fn test_reset_play_counts_is_undoable() {
    let board = TestBoard::new().await;
    let category = board.default_category().await;
    let mut sound = Sound::new(category.id, "Gong", "/sounds/gong.wav", "gong", "audio/wav");
    sound.play_count = 7;
    board.soundboard.add_sounds(&[sound.clone()]).await.unwrap();

    board.soundboard.reset_play_counts().await.unwrap();
    assert_eq!(board.soundboard.sound(&sound.id).await.unwrap().play_count, 0);

    board.soundboard.undo().await.unwrap();
    assert_eq!(board.soundboard.sound(&sound.id).await.unwrap().play_count, 7);
}

#[tokio::test]
async fn test_import_then_clean_after_delete() {
    let board = TestBoard::new().await;
    let category = board.default_category().await;
    let source = board.source_dir();
    write_wav(&source.join("boom.wav"), 1);
    write_wav(&source.join("boom-again.wav"), 1);

    let batch = board
        .soundboard
        .prepare_import(vec![source.join("boom.wav"), source.join("boom-again.wav")])
        .await
        .unwrap();
    assert_eq!(batch.duplicate_count(), 1);

    let sounds = board
        .soundboard
        .commit_import(batch, &category.id, false, None)
        .await
        .unwrap();
    assert_eq!(sounds.len(), 1);
    assert!(sounds[0].file_path().exists());

    // Files survive deletion until cleaned
    board.soundboard.delete_sounds(&[sounds[0].id.clone()]).await.unwrap();
    assert!(sounds[0].file_path().exists());

    let removed = board.soundboard.clean().await.unwrap();
    assert_eq!(removed, 1);
    assert!(!sounds[0].file_path().exists());
}

#[tokio::test]
async fn test_commit_import_requires_category() {
    let board = TestBoard::new().await;
    let source = board.source_dir();
    write_wav(&source.join("boom.wav"), 2);
    let batch = board
        .soundboard
        .prepare_import(vec![source.join("boom.wav")])
        .await
        .unwrap();

    let result = board
        .soundboard
        .commit_import(batch, &soundboard_core::CategoryId::new("missing"), false, None)
        .await;
    assert!(matches!(result, Err(soundboard::AppError::NotFound(_))));
}

#[tokio::test]
async fn test_auto_import_falls_back_to_first_category() {
    let board = TestBoard::new().await;
    let first = board.default_category().await;
    let source = board.source_dir();
    write_wav(&source.join("a.wav"), 3);
    write_wav(&source.join("b.wav"), 4);

    let unknown = soundboard_core::CategoryId::new("missing");
    let report = board.soundboard.auto_import(&source, Some(&unknown)).await.unwrap();

    assert_eq!(report.imported.len(), 2);
    assert!(report.imported.iter().all(|s| s.category_id == first.id));
    assert!(board.soundboard.can_undo().await);

    let again = board.soundboard.auto_import(&source, None).await.unwrap();
    assert!(again.imported.is_empty());
    assert_eq!(again.skipped, 2);
}

#[tokio::test]
async fn test_open_auto_imports_configured_folder() {
    let temp = tempfile::tempdir().unwrap();
    let incoming = temp.path().join("incoming");
    std::fs::create_dir_all(&incoming).unwrap();
    write_wav(&incoming.join("horn.wav"), 7);

    let mut config = config_in(temp.path());
    config.import.auto_import = true;
    config.import.auto_import_directory = Some(incoming.clone());

    // Leftover from an earlier session, referenced by no sound
    let orphan = config.storage.sound_dir.join("orphan.wav");
    std::fs::create_dir_all(&config.storage.sound_dir).unwrap();
    write_wav(&orphan, 8);

    let soundboard = Soundboard::open(&config).await.unwrap();

    let sounds = soundboard.sounds().await.unwrap();
    assert_eq!(sounds.len(), 1);
    assert_eq!(sounds[0].name, "horn");
    let category = soundboard.categories().await.unwrap().remove(0);
    assert_eq!(sounds[0].category_id, category.id);
    assert!(!orphan.exists());

    drop(soundboard);
    let reopened = Soundboard::open(&config).await.unwrap();
    assert_eq!(reopened.sounds().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_open_survives_missing_auto_import_folder() {
    let temp = tempfile::tempdir().unwrap();
    let mut config = config_in(temp.path());
    config.import.auto_import = true;
    config.import.auto_import_directory = Some(temp.path().join("absent"));

    let soundboard = Soundboard::open(&config).await.unwrap();
    assert!(soundboard.sounds().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_press_without_players_fails() {
    let board = TestBoard::new().await;
    let category = board.default_category().await;
    let sound = Sound::new(category.id, "Gong", "/sounds/gong.wav", "gong", "audio/wav");

    assert!(matches!(
        board.soundboard.press_sound(&sound),
        Err(soundboard::AppError::Playback(_))
    ));
}

#[tokio::test]
async fn test_press_uses_repress_mode() {
    let board = PlayingBoard::new(RepressMode::Pause).await;

    let player = board.soundboard.press_sound(&board.sound).unwrap();
    player.flush().await;
    assert_eq!(player.playback_state(), PlaybackState::Playing);

    board.soundboard.press_sound(&board.sound).unwrap();
    player.flush().await;
    assert_eq!(player.playback_state(), PlaybackState::Paused);

    board.soundboard.press_sound(&board.sound).unwrap();
    player.flush().await;
    assert_eq!(player.playback_state(), PlaybackState::Playing);

    board.soundboard.stop_all();
    player.flush().await;
    assert_eq!(player.playback_state(), PlaybackState::Stopped);
}

#[tokio::test]
async fn test_deleting_sound_releases_idle_player() {
    let board = PlayingBoard::new(RepressMode::Stop).await;
    let player = board.soundboard.press_sound(&board.sound).unwrap();
    player.flush().await;
    board.soundboard.stop_all();
    player.flush().await;

    board.soundboard.delete_sounds(&[board.sound.id.clone()]).await.unwrap();
    player.flush().await;

    assert_eq!(player.playback_state(), PlaybackState::Created);
    assert!(board.backend.live_players(&board.sound.uri).is_empty());
    assert!(board.store.get_sound(&board.sound.id).await.unwrap().is_none());
}
