/*!
 * Tests for active subtitle selection
 */

use std::path::PathBuf;
use novelplay::assets::MediaSource;
use novelplay::backends::{MockAudioBackend, MockCall};
use novelplay::playback::audio::{AudioLevels, AudioTarget, AudioTrackSet, ClipKey, LoadTicket, SlotState};
use novelplay::playback::{SubtitleChange, SubtitleScheduler};
use novelplay::scenario::Subtitle;

fn voiced_lines() -> Vec<Subtitle> {
    vec![
        Subtitle::new("A", "first", 0, 1000).with_voice("a.mp3"),
        Subtitle::new("B", "second", 1500, 2500).with_voice("b.mp3"),
    ]
}

fn audio_for(subs: &[Subtitle], backend: &mut MockAudioBackend) -> AudioTrackSet {
    let mut audio = AudioTrackSet::new(AudioLevels::default());
    for (index, sub) in subs.iter().enumerate() {
        let key = ClipKey::for_subtitle(index, sub);
        let path = sub.voice.clone().unwrap_or_default();
        audio.load_clip(
            key,
            &MediaSource::Path(PathBuf::from(path)),
            backend,
            LoadTicket { generation: 1, target: AudioTarget::Clip(key) },
        );
    }
    audio
}

#[test]
fn test_find_active_withGap_shouldReturnNone() {
    let subs = voiced_lines();
    assert_eq!(SubtitleScheduler::find_active(&subs, 1200), None);
    assert_eq!(SubtitleScheduler::find_active(&subs, 1500).map(|k| k.index), Some(1));
}

#[test]
fn test_find_active_withNoSubtitles_shouldReturnNone() {
    assert_eq!(SubtitleScheduler::find_active(&[], 0), None);
}

#[test]
fn test_find_active_withZeroLengthInterval_shouldMatchExactInstant() {
    let subs = vec![Subtitle::new("A", "blink", 700, 700)];
    assert_eq!(SubtitleScheduler::find_active(&subs, 700).map(|k| k.index), Some(0));
    assert_eq!(SubtitleScheduler::find_active(&subs, 701), None);
}

#[test]
fn test_update_sameInterval_shouldNotRestartClip() {
    let subs = voiced_lines();
    let mut backend = MockAudioBackend::working();
    let mut audio = audio_for(&subs, &mut backend);
    let mut scheduler = SubtitleScheduler::new();
    let clip_a = backend.handle_for("a.mp3").expect("clip a");

    assert_eq!(
        scheduler.update(&subs, 0, &mut audio, false),
        SubtitleChange::Activated(ClipKey::new(0, 0, 1000))
    );
    assert_eq!(scheduler.update(&subs, 400, &mut audio, false), SubtitleChange::Unchanged);
    assert_eq!(scheduler.update(&subs, 900, &mut audio, false), SubtitleChange::Unchanged);

    assert_eq!(backend.play_count(clip_a.id), 1);
}

#[test]
fn test_update_onSwitch_shouldStopPreviousAndPlayNext() {
    let subs = voiced_lines();
    let mut backend = MockAudioBackend::working();
    let mut audio = audio_for(&subs, &mut backend);
    let mut scheduler = SubtitleScheduler::new();
    let clip_a = backend.handle_for("a.mp3").expect("clip a");
    let clip_b = backend.handle_for("b.mp3").expect("clip b");

    scheduler.update(&subs, 100, &mut audio, false);
    assert_eq!(scheduler.update(&subs, 1200, &mut audio, false), SubtitleChange::Cleared);
    assert_eq!(scheduler.active_key(), None);
    assert_eq!(audio.state(AudioTarget::Clip(ClipKey::new(0, 0, 1000))), Some(SlotState::Stopped));
    assert!(backend.calls_for(clip_a.id).contains(&MockCall::Rewind { handle: clip_a.id }));

    assert_eq!(
        scheduler.update(&subs, 1600, &mut audio, false),
        SubtitleChange::Activated(ClipKey::new(1, 1500, 2500))
    );
    assert_eq!(backend.play_count(clip_b.id), 1);
}

#[test]
fn test_update_whilePaused_shouldSelectWithoutPlaying() {
    let subs = voiced_lines();
    let mut backend = MockAudioBackend::working();
    let mut audio = audio_for(&subs, &mut backend);
    let mut scheduler = SubtitleScheduler::new();
    let clip_a = backend.handle_for("a.mp3").expect("clip a");

    let change = scheduler.update(&subs, 10, &mut audio, true);

    assert!(matches!(change, SubtitleChange::Activated(_)));
    assert_eq!(backend.play_count(clip_a.id), 0);
}

#[test]
fn test_update_withoutClip_shouldStillActivate() {
    let subs = vec![Subtitle::new("Narrator", "silent", 0, 500)];
    let mut audio = AudioTrackSet::new(AudioLevels::default());
    let mut scheduler = SubtitleScheduler::new();

    let change = scheduler.update(&subs, 250, &mut audio, false);

    assert_eq!(change, SubtitleChange::Activated(ClipKey::new(0, 0, 500)));
}

#[test]
fn test_reset_shouldForgetActiveKey() {
    let subs = voiced_lines();
    let mut audio = AudioTrackSet::new(AudioLevels::default());
    let mut scheduler = SubtitleScheduler::new();
    scheduler.update(&subs, 0, &mut audio, false);

    scheduler.reset();

    assert_eq!(scheduler.active_key(), None);
    assert!(matches!(scheduler.update(&subs, 0, &mut audio, false), SubtitleChange::Activated(_)));
}
