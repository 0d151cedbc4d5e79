use super::*;

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| (*s).to_owned()).collect()
}

#[test]
fn prefers_vp9_and_opus() {
    let c = select_codecs(&set(&["libvpx-vp9", "libvpx", "libopus", "libvorbis"])).unwrap();
    assert_eq!(c.video, VideoCodec::Vp9);
    assert_eq!(c.audio, AudioCodec::Opus);
    assert!(!c.is_fallback());
    assert_eq!(c.mime(), "video/webm;codecs=vp9,opus");
}

#[test]
fn falls_back_to_baseline_codecs() {
    let c = select_codecs(&set(&["libvpx", "libvorbis", "aac"])).unwrap();
    assert_eq!(c.video, VideoCodec::Vp8);
    assert_eq!(c.audio, AudioCodec::Vorbis);
    assert!(c.is_fallback());
    assert_eq!(c.mime(), "video/webm;codecs=vp8,vorbis");
}

#[test]
fn empty_chain_is_unsupported() {
    let err = select_codecs(&set(&["libx264", "libopus"])).unwrap_err();
    assert!(matches!(err, KenBurnsError::EncoderUnsupported(_)));

    let err = select_codecs(&set(&["libvpx"])).unwrap_err();
    assert!(err.to_string().contains("audio"));
}

#[test]
fn parses_ffmpeg_encoder_listing() {
    let listing = "\
Encoders:
 V..... = Video
 A..... = Audio
 ------
 V....D libx264              libx264 H.264 / AVC (codec h264)
 V....D libvpx               libvpx VP8 (codec vp8)
 V....D libvpx-vp9           libvpx VP9 (codec vp9)
 A....D libopus              libopus Opus (codec opus)
";
    let names = parse_encoder_list(listing);
    assert_eq!(names, set(&["libx264", "libvpx", "libvpx-vp9", "libopus"]));
    assert!(!names.contains("V....."));
}
