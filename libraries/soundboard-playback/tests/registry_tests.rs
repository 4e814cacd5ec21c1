use soundboard_core::{Sound, SoundboardStore};
use soundboard_playback::testing::FakeBackend;
use soundboard_playback::{PlaybackNotification, PlaybackState, PlayerRegistry, PlaybackConfig};
use std::sync::Arc;

use test_helpers::{eventually, Harness, URI};

#[tokio::test]
async fn test_players_are_shared_per_uri() {
    let h = Harness::new().await;

    let first = h.registry.get_sound_player(&h.sound);
    let mut twin = Sound::new(h.sound.category_id.clone(), "Copy", URI, "abc123", "audio/wav");
    twin.volume = 0.5;
    let second = h.registry.get_sound_player(&twin);

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(h.registry.len(), 1);
    assert!(h.registry.player(URI).is_some());
    assert!(h.registry.player("/sounds/other.wav").is_none());
}

#[tokio::test]
async fn test_stop_all_players() {
    let h = Harness::new().await;
    let other = Sound::new(h.sound.category_id.clone(), "Gong", "/sounds/gong.wav", "def", "audio/wav");
    h.store.insert_sounds(&[other.clone()]).await.unwrap();

    let a = h.registry.get_sound_player(&h.sound);
    let b = h.registry.get_sound_player(&other);
    for player in [&a, &b] {
        player.initialize();
        player.play();
    }
    a.flush().await;
    assert_eq!(b.playback_state(), PlaybackState::Playing);

    h.registry.stop_all_players();
    a.flush().await;

    assert_eq!(a.playback_state(), PlaybackState::Stopped);
    assert_eq!(b.playback_state(), PlaybackState::Stopped);
}

#[tokio::test]
async fn test_stop_all_players_leaves_uninitialized_players_alone() {
    let h = Harness::new().await;
    let player = h.registry.get_sound_player(&h.sound);

    h.registry.stop_all_players();
    player.flush().await;

    assert_eq!(player.playback_state(), PlaybackState::Created);
    assert!(h.backend.players().is_empty());
}

#[tokio::test]
async fn test_release_when_finished_by_uri() {
    let h = Harness::new().await;
    let player = h.registry.get_sound_player(&h.sound);
    player.initialize();
    player.flush().await;

    h.registry.release_when_finished(URI);
    h.registry.release_when_finished("/sounds/unknown.wav");
    player.flush().await;

    assert_eq!(player.playback_state(), PlaybackState::Created);
    // The entry stays so the player can be initialized again
    assert_eq!(h.registry.len(), 1);
}

#[tokio::test]
async fn test_player_follows_volume_in_store() {
    let h = Harness::new().await;
    let player = h.registry.get_sound_player(&h.sound);
    player.initialize();
    player.play();
    player.flush().await;

    let mut updated = h.stored_sound(&h.sound.id).await;
    updated.volume = 0.4;
    h.store.update_sound(&updated).await.unwrap();

    assert!(
        eventually(|| async {
            player.flush().await;
            h.backend.live_players(URI).first().is_some_and(|p| p.volume == 0.4)
        })
        .await
    );
}

#[tokio::test]
async fn test_unavailable_source_is_reported() {
    let store = Arc::new(soundboard_core::testing::MemoryStore::new());
    let backend = FakeBackend::new();
    backend.make_unavailable(URI);
    let thread_backend = backend.clone();
    let registry =
        PlayerRegistry::new(store, PlaybackConfig::default(), move || Ok(thread_backend)).unwrap();
    let mut notifications = registry.notifications();

    let sound = Sound::new(soundboard_core::CategoryId::new("c"), "Gone", URI, "x", "audio/wav");
    let player = registry.get_sound_player(&sound);
    player.initialize();
    player.play();
    player.flush().await;

    assert_eq!(player.playback_state(), PlaybackState::Created);
    assert!(matches!(
        notifications.recv().await.unwrap(),
        PlaybackNotification::Unavailable { .. }
    ));
}

#[tokio::test]
async fn test_backend_factory_error_is_returned() {
    let store = Arc::new(soundboard_core::testing::MemoryStore::new());
    let result = PlayerRegistry::new(store, PlaybackConfig::default(), || {
        Err::<FakeBackend, _>(soundboard_playback::PlaybackError::BackendUnavailable(
            "no device".to_string(),
        ))
    });

    assert!(matches!(
        result,
        Err(soundboard_playback::PlaybackError::BackendUnavailable(_))
    ));
}

#[tokio::test]
async fn test_playback_ended_counts_each_playout() {
    let h = Harness::new().await;
    let player = h.registry.get_sound_player(&h.sound);
    player.initialize();
    player.play();
    player.flush().await;
    player.play_parallel();
    player.flush().await;

    for info in h.backend.live_players(URI) {
        h.backend.finish(info.key);
    }
    player.flush().await;

    let id = h.sound.id.clone();
    assert!(eventually(|| async { h.stored_sound(&id).await.play_count == 2 }).await);
}
