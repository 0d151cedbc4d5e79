use super::*;
use crate::foundation::core::Canvas;

fn cfg() -> EncoderConfig {
    EncoderConfig {
        width: 4,
        height: 2,
        fps: Fps { num: 30, den: 1 },
        sample_rate: 48_000,
        channels: 2,
    }
}

fn frame(fill: u8) -> FrameRGBA {
    let mut f = FrameRGBA::new(Canvas {
        width: 4,
        height: 2,
    });
    f.data.fill(fill);
    f
}

fn audio(value: f32) -> AudioWindow {
    AudioWindow {
        start_sample: 0,
        sample_rate: 48_000,
        channels: 2,
        interleaved_f32: vec![value; 1600 * 2],
    }
}

#[test]
fn records_frames_and_audio() {
    let mut enc = InMemoryEncoder::new();
    enc.begin(cfg()).unwrap();
    enc.push_frame(FrameIndex(0), &frame(1), &audio(0.0)).unwrap();
    enc.push_frame(FrameIndex(1), &frame(2), &audio(-0.3)).unwrap();
    let out = enc.finish().unwrap();

    assert_eq!(out.mime, IN_MEMORY_MIME);
    assert_eq!(enc.frames().len(), 2);
    assert_ne!(enc.frames()[0].checksum, enc.frames()[1].checksum);
    assert_eq!(enc.audio_frames(), 3200);
    assert!((enc.audio_peak() - 0.3).abs() < 1e-6);
    assert!(enc.is_finished());
    assert_eq!(out.bytes.len(), 16 + 2 * 8);
}

#[test]
fn identical_frames_share_a_checksum() {
    let mut enc = InMemoryEncoder::new();
    enc.begin(cfg()).unwrap();
    enc.push_frame(FrameIndex(0), &frame(9), &audio(0.0)).unwrap();
    enc.push_frame(FrameIndex(1), &frame(9), &audio(0.0)).unwrap();
    assert_eq!(enc.frames()[0].checksum, enc.frames()[1].checksum);
}

#[test]
fn rejects_out_of_order_frames() {
    let mut enc = InMemoryEncoder::new();
    enc.begin(cfg()).unwrap();
    enc.push_frame(FrameIndex(3), &frame(0), &audio(0.0)).unwrap();
    let err = enc
        .push_frame(FrameIndex(3), &frame(0), &audio(0.0))
        .unwrap_err();
    assert!(matches!(err, KenBurnsError::Encoding(_)));
}

#[test]
fn rejects_mismatched_frames_and_audio() {
    let mut enc = InMemoryEncoder::new();
    enc.begin(cfg()).unwrap();
    let big = FrameRGBA::new(Canvas {
        width: 8,
        height: 2,
    });
    let err = enc.push_frame(FrameIndex(0), &big, &audio(0.0)).unwrap_err();
    assert!(matches!(err, KenBurnsError::Validation(_)));

    let mono = AudioWindow {
        channels: 1,
        ..audio(0.0)
    };
    let err = enc
        .push_frame(FrameIndex(0), &frame(0), &mono)
        .unwrap_err();
    assert!(matches!(err, KenBurnsError::Validation(_)));
}

#[test]
fn push_before_begin_is_an_error() {
    let mut enc = InMemoryEncoder::new();
    let err = enc
        .push_frame(FrameIndex(0), &frame(0), &audio(0.0))
        .unwrap_err();
    assert!(matches!(err, KenBurnsError::Encoding(_)));
    assert!(enc.finish().is_err());
}

#[test]
fn zero_sized_config_is_rejected() {
    let mut enc = InMemoryEncoder::new();
    let err = enc
        .begin(EncoderConfig {
            width: 0,
            ..cfg()
        })
        .unwrap_err();
    assert!(matches!(err, KenBurnsError::Validation(_)));
}

#[test]
fn injected_failure_fires_at_the_requested_frame() {
    let mut enc = InMemoryEncoder::failing_at(FrameIndex(1));
    enc.begin(cfg()).unwrap();
    enc.push_frame(FrameIndex(0), &frame(0), &audio(0.0)).unwrap();
    let err = enc
        .push_frame(FrameIndex(1), &frame(0), &audio(0.0))
        .unwrap_err();
    assert!(err.to_string().starts_with("encoding failure:"));
}

#[test]
fn abort_prevents_finish() {
    let mut enc = InMemoryEncoder::new();
    enc.begin(cfg()).unwrap();
    enc.push_frame(FrameIndex(0), &frame(0), &audio(0.0)).unwrap();
    enc.abort();
    assert!(enc.is_aborted());
    assert!(enc.finish().is_err());
}
