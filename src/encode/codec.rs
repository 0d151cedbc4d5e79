//! WebM codec selection with fallback.
//!
//! Preference is VP9 then VP8 for video, Opus then Vorbis for audio. Which encoders exist is
//! queried from `ffmpeg` once; the choice itself is a pure function of that set.

use std::collections::BTreeSet;
use std::process::{Command, Stdio};

use crate::foundation::error::{KenBurnsError, KenBurnsResult};

/// Video codecs the WebM output can carry, best first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    /// VP9 via `libvpx-vp9`.
    Vp9,
    /// VP8 via `libvpx`, the baseline.
    Vp8,
}

impl VideoCodec {
    /// Fallback chain, preferred codec first.
    pub const CHAIN: [Self; 2] = [Self::Vp9, Self::Vp8];

    /// FFmpeg encoder name.
    pub fn ffmpeg_encoder(self) -> &'static str {
        match self {
            Self::Vp9 => "libvpx-vp9",
            Self::Vp8 => "libvpx",
        }
    }

    /// Name used in the `codecs=` MIME parameter.
    pub fn mime_name(self) -> &'static str {
        match self {
            Self::Vp9 => "vp9",
            Self::Vp8 => "vp8",
        }
    }
}

/// Audio codecs the WebM output can carry, best first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    /// Opus via `libopus`.
    Opus,
    /// Vorbis via `libvorbis`, the baseline.
    Vorbis,
}

impl AudioCodec {
    /// Fallback chain, preferred codec first.
    pub const CHAIN: [Self; 2] = [Self::Opus, Self::Vorbis];

    /// FFmpeg encoder name.
    pub fn ffmpeg_encoder(self) -> &'static str {
        match self {
            Self::Opus => "libopus",
            Self::Vorbis => "libvorbis",
        }
    }

    /// Name used in the `codecs=` MIME parameter.
    pub fn mime_name(self) -> &'static str {
        match self {
            Self::Opus => "opus",
            Self::Vorbis => "vorbis",
        }
    }
}

/// The codec pair a session encodes with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodecChoice {
    /// Video stream codec.
    pub video: VideoCodec,
    /// Audio stream codec.
    pub audio: AudioCodec,
}

impl CodecChoice {
    /// `true` when either stream fell back from its preferred codec.
    pub fn is_fallback(&self) -> bool {
        self.video != VideoCodec::CHAIN[0] || self.audio != AudioCodec::CHAIN[0]
    }

    /// Declared container/MIME type, e.g. `video/webm;codecs=vp9,opus`.
    pub fn mime(&self) -> String {
        format!(
            "video/webm;codecs={},{}",
            self.video.mime_name(),
            self.audio.mime_name()
        )
    }
}

/// Pick the first available codec of each chain.
pub fn select_codecs(available: &BTreeSet<String>) -> KenBurnsResult<CodecChoice> {
    let video = VideoCodec::CHAIN
        .into_iter()
        .find(|c| available.contains(c.ffmpeg_encoder()))
        .ok_or_else(|| {
            KenBurnsError::encoder_unsupported(
                "no WebM video encoder available (tried libvpx-vp9, libvpx)",
            )
        })?;
    let audio = AudioCodec::CHAIN
        .into_iter()
        .find(|c| available.contains(c.ffmpeg_encoder()))
        .ok_or_else(|| {
            KenBurnsError::encoder_unsupported(
                "no WebM audio encoder available (tried libopus, libvorbis)",
            )
        })?;

    let choice = CodecChoice { video, audio };
    if choice.is_fallback() {
        tracing::warn!(
            video = video.ffmpeg_encoder(),
            audio = audio.ffmpeg_encoder(),
            "preferred codec unavailable, using fallback"
        );
    }
    Ok(choice)
}

/// Encoder names from the output of `ffmpeg -encoders`.
pub fn parse_encoder_list(stdout: &str) -> BTreeSet<String> {
    stdout
        .lines()
        .skip_while(|l| l.trim() != "------")
        .skip(1)
        .filter_map(|l| {
            let mut parts = l.split_whitespace();
            let flags = parts.next()?;
            let name = parts.next()?;
            (flags.len() == 6).then(|| name.to_owned())
        })
        .collect()
}

/// Ask the system `ffmpeg` which encoders it was built with.
pub fn probe_ffmpeg_encoders() -> KenBurnsResult<BTreeSet<String>> {
    let out = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            KenBurnsError::encoder_unsupported(format!(
                "failed to run ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
    if !out.status.success() {
        return Err(KenBurnsError::encoder_unsupported(format!(
            "ffmpeg -encoders exited with status {}",
            out.status
        )));
    }
    Ok(parse_encoder_list(&String::from_utf8_lossy(&out.stdout)))
}

#[cfg(test)]
#[path = "../../tests/unit/encode/codec.rs"]
mod tests;
