use std::path::Path;

use crate::foundation::error::{KenBurnsError, KenBurnsResult};

/// Sample rate used for every audio track the mixer produces.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

/// Channel count used for every audio track the mixer produces.
pub const MIX_CHANNELS: u16 = 2;

/// Decoded interleaved floating-point PCM.
#[derive(Clone, Debug)]
pub struct AudioPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` PCM samples.
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.interleaved_f32.len() / usize::from(self.channels.max(1))
    }
}

/// Decode an audio file to stereo interleaved `f32` PCM through the system `ffmpeg`.
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> KenBurnsResult<AudioPcm> {
    if !path.exists() {
        return Err(KenBurnsError::audio_init(format!(
            "music asset '{}' does not exist",
            path.display()
        )));
    }

    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            &MIX_CHANNELS.to_string(),
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| KenBurnsError::audio_init(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        return Err(KenBurnsError::audio_init(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let pcm = pcm_from_f32le(&out.stdout)?;
    if pcm.is_empty() {
        return Err(KenBurnsError::audio_init(format!(
            "music asset '{}' decoded to zero samples",
            path.display()
        )));
    }

    Ok(AudioPcm {
        sample_rate,
        channels: MIX_CHANNELS,
        interleaved_f32: pcm,
    })
}

fn pcm_from_f32le(bytes: &[u8]) -> KenBurnsResult<Vec<f32>> {
    if !bytes.len().is_multiple_of(4) {
        return Err(KenBurnsError::audio_init(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
