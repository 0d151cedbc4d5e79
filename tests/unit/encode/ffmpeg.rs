use super::*;
use crate::encode::codec::{AudioCodec, VideoCodec};
use crate::foundation::core::Fps;

fn cfg() -> EncoderConfig {
    EncoderConfig {
        width: 1280,
        height: 720,
        fps: Fps { num: 30, den: 1 },
        sample_rate: 48_000,
        channels: 2,
    }
}

fn strings(args: &[OsString]) -> Vec<String> {
    args.iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn flatten_premul_alpha_0_returns_bg() {
    let src = vec![0u8, 0, 0, 0];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_premul_alpha_255_is_identity() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn flatten_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &[0; 4], [0, 0, 0, 255]).is_err());
}

#[test]
fn video_args_stream_raw_rgba_into_the_chosen_codec() {
    let choice = CodecChoice {
        video: VideoCodec::Vp8,
        audio: AudioCodec::Vorbis,
    };
    let args = strings(&video_args(
        &cfg(),
        &choice,
        "5M",
        Path::new("/tmp/x/video.webm"),
    ));
    let joined = args.join(" ");
    assert!(joined.contains("-f rawvideo -pix_fmt rgba -s 1280x720 -r 30/1 -i pipe:0"));
    assert!(joined.contains("-an -c:v libvpx -b:v 5M"));
    assert_eq!(args.last().map(String::as_str), Some("/tmp/x/video.webm"));
}

#[test]
fn mux_args_copy_video_and_encode_buffered_audio() {
    let choice = CodecChoice {
        video: VideoCodec::Vp9,
        audio: AudioCodec::Opus,
    };
    let args = strings(&mux_args(
        &cfg(),
        &choice,
        Path::new("v.webm"),
        Path::new("a.f32le"),
        Path::new("out.webm"),
    ));
    let joined = args.join(" ");
    assert!(joined.contains("-i v.webm -f f32le -ar 48000 -ac 2 -i a.f32le"));
    assert!(joined.contains("-map 0:v:0 -map 1:a:0 -c:v copy -c:a libopus"));
    assert_eq!(args.last().map(String::as_str), Some("out.webm"));
}

#[test]
fn odd_dimensions_are_rejected_before_spawning() {
    let mut enc = FfmpegEncoder::new(FfmpegEncoderOpts::default());
    let err = enc
        .begin(EncoderConfig {
            width: 1279,
            ..cfg()
        })
        .unwrap_err();
    assert!(matches!(err, KenBurnsError::Validation(_)));
    assert!(enc.codecs().is_none());
}

#[test]
fn push_before_begin_is_an_error() {
    let mut enc = FfmpegEncoder::new(FfmpegEncoderOpts::default());
    let frame = FrameRGBA::new(crate::foundation::core::Canvas {
        width: 2,
        height: 2,
    });
    let audio = AudioWindow {
        start_sample: 0,
        sample_rate: 48_000,
        channels: 2,
        interleaved_f32: Vec::new(),
    };
    assert!(enc.push_frame(FrameIndex(0), &frame, &audio).is_err());
    enc.abort();
}

#[test]
fn ensure_parent_dir_creates_nested_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("a/b/c.webm");
    ensure_parent_dir(&out).unwrap();
    assert!(dir.path().join("a/b").is_dir());
    ensure_parent_dir(Path::new("bare.webm")).unwrap();
}
