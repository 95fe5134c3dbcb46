/*!
 * Tests for the per-scene timeline lifecycle
 */

use std::sync::Arc;
use novelplay::assets::DefaultAssetResolver;
use novelplay::backends::MockAudioBackend;
use novelplay::playback::audio::{AudioLevels, AudioTarget, LoadTicket, MediaEvent, SlotState, TrackRole};
use novelplay::playback::{ManualTimeSource, SceneTimeline, SubtitleChange, TimelineState};
use novelplay::scenario::{Scene, Subtitle};

use crate::common;

struct Fixture {
    timeline: SceneTimeline,
    backend: MockAudioBackend,
    time: ManualTimeSource,
}

fn activated(scene: Scene, paused: bool) -> Fixture {
    let time = ManualTimeSource::new();
    let mut backend = MockAudioBackend::working();
    let resolver = DefaultAssetResolver::default();
    let mut timeline = SceneTimeline::new(scene, 7, Arc::new(time.clone()), AudioLevels::default());
    timeline.activate(&resolver, &mut backend, paused);
    Fixture { timeline, backend, time }
}

fn voice_loaded(fixture: &Fixture, duration_ms: u64) -> MediaEvent {
    MediaEvent::Loaded {
        ticket: fixture.backend.ticket_for("voice.mp3").expect("voice ticket"),
        duration_ms: Some(duration_ms),
    }
}

#[test]
fn test_activate_shouldStartPlayingWithFrameRequest() {
    let fixture = activated(common::voiced_scene(vec![]), false);

    assert_eq!(fixture.timeline.state(), TimelineState::Playing);
    assert!(fixture.timeline.pending_frame().is_some());
    assert_eq!(fixture.timeline.pending_frame().map(|f| f.generation), Some(7));
    assert!(fixture.timeline.audio().is_playing(AudioTarget::Track(TrackRole::Voice)));
    assert!(fixture.timeline.audio().is_playing(AudioTarget::Track(TrackRole::Bgm)));
}

#[test]
fn test_activate_withSubtitleVoices_shouldLoadClipsWithoutPlaying() {
    let subs = vec![
        Subtitle::new("A", "one", 0, 1000).with_voice("line0.mp3"),
        Subtitle::new("B", "two", 2000, 3000).with_voice("line1.mp3"),
    ];
    let fixture = activated(common::voiced_scene(subs), false);

    let line1 = fixture.backend.handle_for("line1.mp3").expect("clip handle");
    assert_eq!(fixture.backend.play_count(line1.id), 0);
    assert_eq!(fixture.timeline.audio().handle_count(), 4);
}

#[test]
fn test_activate_paused_shouldNotStartAudioOrClock() {
    let mut fixture = activated(common::voiced_scene(vec![]), true);

    assert_eq!(fixture.timeline.state(), TimelineState::Paused);
    fixture.time.advance_ms(3000);
    assert_eq!(fixture.timeline.elapsed_ms(), 0);
    assert_eq!(fixture.timeline.tick(), None);
    assert!(fixture.backend.handles().iter().all(|h| !h.playing));

    fixture.timeline.set_paused(false);
    assert_eq!(fixture.timeline.state(), TimelineState::Playing);
    assert!(fixture.timeline.audio().is_playing(AudioTarget::Track(TrackRole::Voice)));
}

#[test]
fn test_tick_shouldReArmFrameRequest() {
    let mut fixture = activated(Scene::new(1, "bg.png", 1000, None), false);
    let first = fixture.timeline.pending_frame().expect("frame");

    fixture.time.advance_ms(16);
    let report = fixture.timeline.tick().expect("report");

    assert_eq!(report.elapsed_ms, 16);
    let second = fixture.timeline.pending_frame().expect("frame");
    assert!(second.sequence > first.sequence);
}

#[test]
fn test_tick_atEffectiveDuration_shouldEndExactlyOnce() {
    let mut fixture = activated(Scene::new(1, "bg.png", 1000, None), false);

    fixture.time.advance_ms(999);
    assert!(!fixture.timeline.tick().expect("report").scene_ended);

    fixture.time.advance_ms(1);
    assert!(fixture.timeline.tick().expect("report").scene_ended);
    assert_eq!(fixture.timeline.state(), TimelineState::Ended);

    for _ in 0..5 {
        fixture.time.advance_ms(100);
        assert_eq!(fixture.timeline.tick(), None);
    }
    assert!(fixture.timeline.has_ended());
    assert!(fixture.timeline.pending_frame().is_some(), "ended timelines keep rescheduling");
}

#[test]
fn test_effective_duration_withLongerVoice_shouldExtendScene() {
    let mut fixture = activated(common::voiced_scene(vec![]), false);
    let event = voice_loaded(&fixture, 7000);
    assert!(fixture.timeline.handle_media_event(event));

    assert_eq!(fixture.timeline.effective_duration_ms(), 7000);

    fixture.time.advance_ms(5000);
    assert!(!fixture.timeline.tick().expect("report").scene_ended);
    fixture.time.advance_ms(2000);
    assert!(fixture.timeline.tick().expect("report").scene_ended);
}

#[test]
fn test_effective_duration_withShorterVoice_shouldKeepNominal() {
    let mut fixture = activated(common::voiced_scene(vec![]), false);
    let event = voice_loaded(&fixture, 2000);
    fixture.timeline.handle_media_event(event);

    assert_eq!(fixture.timeline.effective_duration_ms(), 5000);
}

#[test]
fn test_handle_media_event_withStaleGeneration_shouldDiscard() {
    let mut fixture = activated(common::voiced_scene(vec![]), false);
    let stale = MediaEvent::Loaded {
        ticket: LoadTicket {
            generation: 3,
            target: AudioTarget::Track(TrackRole::Voice),
        },
        duration_ms: Some(9000),
    };

    assert!(!fixture.timeline.handle_media_event(stale));
    assert_eq!(fixture.timeline.effective_duration_ms(), 5000);
}

#[test]
fn test_handle_media_event_failed_shouldSilenceTrackOnly() {
    let mut fixture = activated(common::voiced_scene(vec![]), false);
    let ticket = fixture.backend.ticket_for("bgm.mp3").expect("bgm ticket");

    fixture.timeline.handle_media_event(MediaEvent::Failed {
        ticket,
        error: novelplay::MediaError::Load {
            source_path: "bgm.mp3".to_string(),
            reason: "decode error".to_string(),
        },
    });

    assert_eq!(fixture.timeline.audio().state(AudioTarget::Track(TrackRole::Bgm)), Some(SlotState::Failed));
    fixture.time.advance_ms(100);
    assert!(fixture.timeline.tick().is_some());
}

#[test]
fn test_pause_resume_shouldPreserveElapsedAndSubtitle() {
    let subs = vec![Subtitle::new("A", "hold", 0, 4000)];
    let mut fixture = activated(common::voiced_scene(subs), false);

    fixture.time.advance_ms(1000);
    let report = fixture.timeline.tick().expect("report");
    assert!(matches!(report.subtitle, SubtitleChange::Activated(_)));

    fixture.timeline.set_paused(true);
    assert_eq!(fixture.timeline.state(), TimelineState::Paused);
    assert!(!fixture.timeline.audio().is_playing(AudioTarget::Track(TrackRole::Voice)));
    fixture.time.advance_ms(10_000);
    assert_eq!(fixture.timeline.tick(), None);

    fixture.timeline.set_paused(false);
    fixture.time.advance_ms(500);
    let report = fixture.timeline.tick().expect("report");
    assert_eq!(report.elapsed_ms, 1500);
    assert_eq!(report.subtitle, SubtitleChange::Unchanged);
    assert!(fixture.timeline.active_subtitle().is_some());
    assert!(fixture.timeline.audio().is_playing(AudioTarget::Track(TrackRole::Voice)));
}

#[test]
fn test_deactivate_shouldCancelFrameAndReleaseAudio() {
    let mut fixture = activated(common::voiced_scene(vec![]), false);

    fixture.timeline.deactivate();

    assert_eq!(fixture.timeline.state(), TimelineState::Idle);
    assert_eq!(fixture.timeline.pending_frame(), None);
    assert_eq!(fixture.backend.live_handle_count(), 0);
    let calls = fixture.backend.call_count();

    fixture.time.advance_ms(10_000);
    assert_eq!(fixture.timeline.tick(), None);
    let event = voice_loaded(&fixture, 7000);
    assert!(!fixture.timeline.handle_media_event(event));
    assert_eq!(fixture.backend.call_count(), calls);
}

#[test]
fn test_tick_withRejectedPlay_shouldStillAdvanceOnWallClock() {
    let time = ManualTimeSource::new();
    let mut backend = MockAudioBackend::rejecting_play();
    let mut timeline = SceneTimeline::new(
        common::voiced_scene(vec![]),
        1,
        Arc::new(time.clone()),
        AudioLevels::default(),
    );
    timeline.activate(&DefaultAssetResolver::default(), &mut backend, false);

    assert_eq!(timeline.audio().state(AudioTarget::Track(TrackRole::Voice)), Some(SlotState::Failed));
    time.advance_ms(5000);
    assert!(timeline.tick().expect("report").scene_ended);
}
