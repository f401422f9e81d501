//! Transport behaviour of the playback manager against a fake backend

mod support;

use encore_playback::{PlaybackConfig, PlaybackError, PlaybackEvent, PlaybackState, VoiceEvent};
use support::{locator, Harness};

fn queued(ids: &[&str]) -> Harness {
    Harness::with_tracks(PlaybackConfig::default(), ids)
}

// ===== Play / Pause =====

#[test]
fn play_with_nothing_queued_fails() {
    let mut h = Harness::new(PlaybackConfig::default());

    assert_eq!(h.manager.play(), Err(PlaybackError::QueueEmpty));
    assert_eq!(h.manager.state(), PlaybackState::Idle);
}

#[test]
fn play_selects_first_track_and_starts_when_ready() {
    let mut h = queued(&["a", "b"]);

    h.manager.play().unwrap();

    assert_eq!(
        h.events(),
        vec![
            PlaybackEvent::TrackChanged {
                track_id: "a".to_string(),
                previous_track_id: None,
            },
            PlaybackEvent::QueueChanged {
                length: 2,
                current_index: Some(0),
            },
            PlaybackEvent::StateChanged {
                state: PlaybackState::Loading,
            },
        ]
    );
    assert!(h.manager.is_loading());
    assert!(!h.manager.is_playing());

    h.make_ready("a", 180.0);

    assert!(h.manager.is_playing());
    assert!(!h.manager.is_loading());
    assert_eq!(h.manager.duration(), 180.0);
    assert_eq!(h.manager.state(), PlaybackState::Playing);
    assert_eq!(h.backend.voice(h.voice_for("a")).plays, 1);

    // The idle unit created with the manager was released on load
    assert_eq!(h.backend.voice(0).releases, 1);
    assert_eq!(h.backend.live_voices(), 1);
}

#[test]
fn pause_is_idempotent() {
    let mut h = queued(&["a"]);
    h.start(180.0);

    h.manager.pause();
    h.manager.pause();

    assert!(!h.manager.is_playing());
    assert_eq!(h.manager.state(), PlaybackState::Paused);
    assert_eq!(h.backend.voice(h.voice_for("a")).pauses, 1);
}

#[test]
fn toggle_play_resumes_loaded_track() {
    let mut h = queued(&["a"]);
    h.start(180.0);

    h.manager.toggle_play().unwrap();
    assert!(!h.manager.is_playing());

    h.manager.toggle_play().unwrap();
    assert!(h.manager.is_playing());
    // Resume reuses the loaded voice
    assert_eq!(h.backend.voice_count(), 2);
}

#[test]
fn play_while_loading_keeps_waiting() {
    let mut h = queued(&["a"]);
    h.manager.play().unwrap();
    h.manager.pause();

    h.manager.play().unwrap();
    h.make_ready("a", 100.0);

    assert!(h.manager.is_playing());
    assert_eq!(h.backend.voice_count(), 2);
}

// ===== Errors =====

#[test]
fn load_failure_reports_error_and_stays_on_track() {
    let mut h = queued(&["a", "b"]);
    h.backend.fail_loads_of(&locator("a"));

    let result = h.manager.play();

    assert!(matches!(result, Err(PlaybackError::Voice(_))));
    assert_eq!(
        h.manager.error(),
        Some("Failed to load track: Decode error: unsupported stream")
    );
    assert_eq!(h.manager.state(), PlaybackState::Errored);
    assert!(!h.manager.is_loading());
    assert_eq!(h.manager.queue().current_index(), Some(0));
    assert!(h.events().iter().any(|e| matches!(e, PlaybackEvent::Error { .. })));
}

#[test]
fn media_error_does_not_auto_advance() {
    let mut h = queued(&["a", "b"]);
    h.start(180.0);
    let voices = h.backend.voice_count();

    h.backend.fail(h.voice_for("a"), "4");
    h.manager.tick();

    assert_eq!(h.manager.error(), Some("Audio error code: 4"));
    assert!(!h.manager.is_playing());
    assert!(!h.manager.is_loading());
    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert_eq!(h.backend.voice_count(), voices);
    assert!(h.events().contains(&PlaybackEvent::Error {
        message: "Audio error code: 4".to_string(),
    }));
}

#[test]
fn play_after_error_reloads_same_track() {
    let mut h = queued(&["a", "b"]);
    h.start(180.0);
    h.manager.set_playback_rate(1.5);
    h.backend.fail(h.voice_for("a"), "2");
    h.manager.tick();
    let failed_voice = h.voice_for("a");

    h.manager.play().unwrap();

    let retry_voice = h.voice_for("a");
    assert_ne!(retry_voice, failed_voice);
    assert_eq!(h.manager.error(), None);
    assert_eq!(h.manager.state(), PlaybackState::Loading);
    assert_eq!(h.manager.playback_rate(), 1.5);

    h.make_ready("a", 180.0);
    assert!(h.manager.is_playing());
    assert_eq!(h.backend.voice(retry_voice).rate, Some(1.5));
}

#[test]
fn rejected_autoplay_recovers_on_explicit_play() {
    let mut h = queued(&["a"]);
    h.backend.reject_plays_of(&locator("a"));
    h.manager.play().unwrap();

    h.make_ready("a", 180.0);

    assert!(!h.manager.is_playing());
    assert_eq!(
        h.manager.error(),
        Some("Failed to play track: Playback rejected: NotAllowedError")
    );

    h.backend.allow_plays_of(&locator("a"));
    h.manager.play().unwrap();

    assert!(h.manager.is_playing());
    assert_eq!(h.manager.error(), None);
}

#[test]
fn late_play_rejection_is_reported() {
    let mut h = queued(&["a"]);
    h.start(180.0);

    h.backend.reject(h.voice_for("a"), "NotAllowedError");
    h.manager.tick();

    assert!(!h.manager.is_playing());
    assert_eq!(h.manager.error(), Some("Failed to play track: NotAllowedError"));
}

#[test]
fn buffering_toggles_loading() {
    let mut h = queued(&["a"]);
    h.start(180.0);
    let voice = h.voice_for("a");

    h.backend.emit(voice, VoiceEvent::BufferingStart);
    h.manager.tick();
    assert!(h.manager.is_loading());
    assert_eq!(h.manager.state(), PlaybackState::Loading);

    h.backend.emit(voice, VoiceEvent::BufferingEnd);
    h.manager.tick();
    assert!(!h.manager.is_loading());
    assert_eq!(h.manager.state(), PlaybackState::Playing);
}

// ===== Seek =====

#[test]
fn seek_clamps_to_track_bounds() {
    let mut h = queued(&["a"]);
    h.start(180.0);

    h.manager.seek(500.0).unwrap();
    assert_eq!(h.manager.current_time(), 180.0);

    h.manager.seek(-5.0).unwrap();
    assert_eq!(h.manager.current_time(), 0.0);

    assert!(matches!(
        h.manager.seek(f64::NAN),
        Err(PlaybackError::InvalidSeekPosition(_))
    ));
    assert_eq!(h.backend.voice(h.voice_for("a")).seeks, vec![180.0, 0.0]);
}

#[test]
fn seek_by_percentage_waits_for_duration() {
    let mut h = queued(&["a"]);
    h.manager.play().unwrap();

    h.manager.seek_by_percentage(50.0).unwrap();
    assert!(h.backend.voice(h.voice_for("a")).seeks.is_empty());

    h.make_ready("a", 200.0);
    h.manager.seek_by_percentage(25.0).unwrap();
    assert_eq!(h.manager.current_time(), 50.0);
}

// ===== Navigation =====

#[test]
fn ended_track_advances_to_next() {
    let mut h = queued(&["a", "b"]);
    h.start(180.0);

    h.backend.end(h.voice_for("a"));
    h.manager.tick();

    assert_eq!(h.current_id().as_deref(), Some("b"));
    assert_eq!(h.manager.queue().current_index(), Some(1));

    h.make_ready("b", 90.0);
    assert!(h.manager.is_playing());
}

#[test]
fn ended_last_track_wraps_to_first() {
    let mut h = queued(&["a", "b"]);
    h.manager.play_from_queue(1).unwrap();
    h.make_ready("b", 60.0);

    h.backend.end(h.voice_for("b"));
    h.manager.tick();

    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert_eq!(h.manager.queue().current_index(), Some(0));
}

#[test]
fn previous_from_unselected_plays_last() {
    let mut h = queued(&["a", "b", "c"]);

    h.manager.play_previous().unwrap();

    assert_eq!(h.current_id().as_deref(), Some("c"));
}

#[test]
fn play_from_queue_rejects_bad_index() {
    let mut h = queued(&["a"]);

    assert_eq!(
        h.manager.play_from_queue(3),
        Err(PlaybackError::IndexOutOfBounds(3))
    );
    assert_eq!(h.manager.queue().current_index(), None);
}

#[test]
fn next_on_empty_queue_rewinds_and_pauses() {
    let mut h = Harness::new(PlaybackConfig::default());
    h.manager.load_track("https://cdn.test/direct").unwrap();
    let voice = h.backend.latest();
    h.backend.ready(voice, 120.0);
    h.manager.tick();
    h.backend.progress(voice, 60.0);
    h.manager.tick();

    assert_eq!(h.manager.play_next(), Err(PlaybackError::QueueEmpty));

    assert!(!h.manager.is_playing());
    assert_eq!(h.manager.current_time(), 0.0);
    assert_eq!(h.backend.voice(voice).seeks, vec![0.0]);
}

#[test]
fn stale_events_from_replaced_voice_are_ignored() {
    let mut h = queued(&["a", "b"]);
    h.start(180.0);
    let old = h.voice_for("a");
    h.manager.play_next().unwrap();
    h.make_ready("b", 120.0);

    h.backend.end(old);
    h.backend.fail(old, "3");
    h.manager.tick();

    assert_eq!(h.current_id().as_deref(), Some("b"));
    assert_eq!(h.manager.error(), None);
    assert!(h.manager.is_playing());
}

#[test]
fn direct_load_bypasses_queue() {
    let mut h = queued(&["a", "b"]);

    h.manager.load_track("https://cdn.test/preview").unwrap();

    assert_eq!(h.manager.current_track(), None);
    assert_eq!(h.manager.queue().current_index(), None);
    assert!(!h
        .events()
        .iter()
        .any(|e| matches!(e, PlaybackEvent::TrackChanged { .. })));
}

#[test]
fn stop_resets_transport_but_keeps_preferences() {
    let mut h = queued(&["a", "b", "c"]);
    h.start(180.0);
    h.manager.set_volume(0.3);
    h.manager.set_playback_rate(1.5);

    h.manager.stop();

    assert_eq!(h.manager.state(), PlaybackState::Idle);
    assert!(!h.manager.is_playing());
    assert_eq!(h.manager.current_time(), 0.0);
    assert_eq!(h.manager.current_track(), None);
    assert_eq!(h.manager.queue().len(), 3);
    assert_eq!(h.manager.volume(), 0.3);
    assert_eq!(h.manager.playback_rate(), 1.5);
    assert_eq!(h.backend.live_voices(), 1);
}

// ===== Volume / Rate =====

#[test]
fn volume_clamps_and_mute_keeps_level() {
    let mut h = queued(&["a"]);
    h.start(180.0);
    let voice = h.voice_for("a");

    assert_eq!(h.manager.set_volume(1.5), 1.0);
    assert_eq!(h.manager.set_volume(0.4), 0.4);
    assert!(h.manager.toggle_mute());

    assert_eq!(h.manager.volume(), 0.4);
    assert!(h.backend.voice(voice).muted);
    assert_eq!(h.backend.voice(voice).volume, Some(0.4));
    assert_eq!(
        h.events().last(),
        Some(&PlaybackEvent::VolumeChanged {
            level: 0.4,
            is_muted: true,
        })
    );

    assert!(!h.manager.toggle_mute());
    assert!(!h.backend.voice(voice).muted);
}

#[test]
fn configured_volume_reaches_voice() {
    let config = PlaybackConfig {
        volume: 0.5,
        ..PlaybackConfig::default()
    };
    let mut h = Harness::with_tracks(config, &["a"]);
    h.start(180.0);

    assert_eq!(h.backend.voice(h.voice_for("a")).volume, Some(0.5));
}

#[test]
fn playback_rate_clamps_and_steps() {
    let mut h = queued(&["a"]);

    assert_eq!(h.manager.set_playback_rate(3.0), 2.0);
    assert_eq!(h.manager.set_playback_rate(0.1), 0.5);
    assert_eq!(h.manager.set_playback_rate(1.0), 1.0);
    assert_eq!(h.manager.increase_playback_speed(), 1.05);
    assert_eq!(h.manager.decrease_playback_speed(), 1.0);
    assert_eq!(h.manager.decrease_playback_speed(), 0.95);
}

#[test]
fn loading_a_track_resets_rate() {
    let mut h = queued(&["a", "b"]);
    h.start(180.0);
    h.manager.set_playback_rate(1.5);
    h.events();

    h.manager.play_next().unwrap();

    assert_eq!(h.manager.playback_rate(), 1.0);
    assert!(h
        .events()
        .contains(&PlaybackEvent::PlaybackRateChanged { rate: 1.0 }));

    h.make_ready("b", 100.0);
    assert_eq!(h.backend.voice(h.voice_for("b")).rate, Some(1.0));
}

// ===== Snapshot =====

#[test]
fn snapshot_formats_for_display() {
    let mut h = queued(&["a", "b"]);
    h.start(180.0);
    h.progress("a", 45.0);

    let snapshot = h.manager.snapshot();

    assert_eq!(snapshot.formatted_current_time, "0:45");
    assert_eq!(snapshot.formatted_duration, "3:00");
    assert_eq!(snapshot.progress_percentage, 25.0);
    assert_eq!(snapshot.formatted_playback_speed, "1.0x");
    assert_eq!(snapshot.formatted_crossfade_duration, "10s");
    assert_eq!(snapshot.queue_length, 2);
    assert_eq!(snapshot.current_index, Some(0));
    assert_eq!(snapshot.current_track.map(|t| t.id).as_deref(), Some("a"));
    assert!(!snapshot.is_crossfading);
}

#[test]
fn seek_preview_follows_duration() {
    let mut h = queued(&["a"]);

    h.manager.update_seek_preview(Some(40.0));
    assert_eq!(h.manager.seek_preview(), Some(0.0));

    h.start(180.0);
    h.manager.update_seek_preview(Some(50.0));
    assert_eq!(h.manager.seek_preview(), Some(90.0));
    assert_eq!(
        h.manager.snapshot().formatted_seek_preview.as_deref(),
        Some("1:30")
    );

    h.manager.update_seek_preview(None);
    assert_eq!(h.manager.seek_preview(), None);
}
