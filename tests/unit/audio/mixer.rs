use super::*;

const FPS: Fps = Fps { num: 30, den: 1 };

fn constant_pcm(sample_rate: u32, channels: u16, value: f32, frames: usize) -> Arc<AudioPcm> {
    Arc::new(AudioPcm {
        sample_rate,
        channels,
        interleaved_f32: vec![value; frames * usize::from(channels)],
    })
}

fn music_settings() -> Settings {
    Settings {
        add_music: true,
        ..Settings::default()
    }
}

#[test]
fn frame_to_sample_uses_rational_fps() {
    assert_eq!(frame_to_sample(0, FPS, 48_000), 0);
    assert_eq!(frame_to_sample(1, FPS, 48_000), 1600);
    let ntsc = Fps {
        num: 30_000,
        den: 1001,
    };
    assert_eq!(frame_to_sample(1, ntsc, 48_000), 1602);
}

#[test]
fn windows_tile_the_session_clock() {
    let track = AudioTrack::silence(FPS);
    let mut expected_start = 0;
    for i in 0..10 {
        let w = track.window(FrameIndex(i));
        assert_eq!(w.start_sample, expected_start);
        assert_eq!(w.channels, 2);
        assert_eq!(w.sample_rate, MIX_SAMPLE_RATE);
        expected_start += w.frames() as u64;
    }
    assert_eq!(expected_start, 16_000);
}

#[test]
fn silence_is_present_but_silent() {
    let started = AudioMixer::start(&Settings::default(), &MusicSource::default(), FPS);
    assert!(started.warning.is_none());
    assert!(!started.track.is_music());
    let w = started.track.window(FrameIndex(3));
    assert_eq!(w.frames(), 1600);
    assert_eq!(w.peak(), 0.0);
}

#[test]
fn music_plays_at_fixed_volume() {
    let music = MusicSource::Pcm(constant_pcm(48_000, 2, 1.0, 4800));
    let started = AudioMixer::start(&music_settings(), &music, FPS);
    assert!(started.warning.is_none());
    assert!(started.track.is_music());
    let w = started.track.window(FrameIndex(0));
    assert!((w.peak() - MUSIC_VOLUME).abs() < 1e-6);
}

#[test]
fn music_loops_past_its_end() {
    // 0.1 s of music; frame 30 is 1 s in.
    let music = MusicSource::Pcm(constant_pcm(48_000, 2, 0.5, 4800));
    let started = AudioMixer::start(&music_settings(), &music, FPS);
    let w = started.track.window(FrameIndex(30));
    assert!(w.interleaved_f32.iter().all(|s| (s - 0.2).abs() < 1e-6));
}

#[test]
fn mono_music_is_duplicated_to_both_channels() {
    let music = MusicSource::Pcm(constant_pcm(22_050, 1, 1.0, 2205));
    let started = AudioMixer::start(&music_settings(), &music, FPS);
    let w = started.track.window(FrameIndex(1));
    for pair in w.interleaved_f32.chunks_exact(2) {
        assert_eq!(pair[0], pair[1]);
    }
}

#[test]
fn missing_music_degrades_to_silence_with_warning() {
    let music = MusicSource::Path(PathBuf::from("definitely/not/here.mp3"));
    let started = AudioMixer::start(&music_settings(), &music, FPS);
    let warning = started.warning.expect("warning");
    assert!(matches!(warning, KenBurnsError::AudioInit(_)));
    assert!(!warning.is_fatal());
    assert!(!started.track.is_music());
    assert_eq!(started.track.window(FrameIndex(0)).peak(), 0.0);
}

#[test]
fn empty_music_degrades_to_silence() {
    let music = MusicSource::Pcm(constant_pcm(48_000, 2, 1.0, 0));
    let started = AudioMixer::start(&music_settings(), &music, FPS);
    assert!(started.warning.is_some());
    assert!(!started.track.is_music());
}

#[test]
fn stop_releases_music_and_is_idempotent() {
    let pcm = constant_pcm(48_000, 2, 1.0, 480);
    let mut track = AudioTrack::music(Arc::clone(&pcm), FPS);
    assert_eq!(Arc::strong_count(&pcm), 2);
    track.stop();
    track.stop();
    assert!(track.is_stopped());
    assert_eq!(Arc::strong_count(&pcm), 1);
    assert_eq!(track.window(FrameIndex(0)).peak(), 0.0);
}

#[test]
fn window_bytes_are_little_endian_f32() {
    let w = AudioWindow {
        start_sample: 0,
        sample_rate: 48_000,
        channels: 2,
        interleaved_f32: vec![0.5, -0.25],
    };
    let b = w.to_f32le_bytes();
    assert_eq!(b.len(), 8);
    assert_eq!(f32::from_le_bytes([b[4], b[5], b[6], b[7]]), -0.25);
}
