//! Property-based tests for overlapping play-outs

use proptest::prelude::*;
use soundboard_core::RepressMode;
use soundboard_playback::PlaybackState;

use test_helpers::{Harness, URI};

#[derive(Debug, Clone)]
enum Step {
    Press(RepressMode),
    FinishOldest,
    FinishNewest,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        prop::sample::select(RepressMode::ALL.to_vec()).prop_map(Step::Press),
        Just(Step::FinishOldest),
        Just(Step::FinishNewest),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Whatever happened before, stopping leaves exactly one backend player
    #[test]
    fn stop_always_collapses_to_one_player(steps in prop::collection::vec(step(), 0..12)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let h = Harness::new().await;
            let player = h.registry.get_sound_player(&h.sound);
            player.initialize();
            player.flush().await;

            for step in steps {
                match step {
                    Step::Press(mode) => player.press(mode),
                    Step::FinishOldest => {
                        if let Some(info) = h.backend.live_players(URI).first() {
                            h.backend.finish(info.key);
                        }
                    }
                    Step::FinishNewest => {
                        if let Some(info) = h.backend.live_players(URI).last() {
                            h.backend.finish(info.key);
                        }
                    }
                }
                player.flush().await;
            }

            player.stop();
            player.flush().await;

            prop_assert_eq!(h.backend.live_players(URI).len(), 1);
            prop_assert!(matches!(
                player.playback_state(),
                PlaybackState::Stopped | PlaybackState::Paused
            ));
            Ok(())
        })?;
    }
}
