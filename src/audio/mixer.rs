//! Audio Mixer: the single audio track that runs alongside the visual timeline.
//!
//! A session always carries exactly one track. With music enabled it is the looping music asset
//! at [`MUSIC_VOLUME`]; otherwise (or when the music fails to load) it is a zero-gain tone, so
//! the output still declares an audio stream.

use std::path::PathBuf;
use std::sync::Arc;

use crate::assets::media::{AudioPcm, MIX_CHANNELS, MIX_SAMPLE_RATE, decode_audio_f32_stereo};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{KenBurnsError, KenBurnsResult};
use crate::session::settings::Settings;

/// Playback volume of the music track.
pub const MUSIC_VOLUME: f32 = 0.4;
/// Frequency of the silent placeholder tone.
pub const SILENCE_TONE_HZ: f64 = 440.0;
/// Default location of the looping music asset.
pub const DEFAULT_MUSIC_PATH: &str = "assets/cinematic-atmosphere.mp3";

/// Where the music track comes from.
#[derive(Clone, Debug)]
pub enum MusicSource {
    /// Decode this file through `ffmpeg` when the session starts.
    Path(PathBuf),
    /// Already-decoded PCM.
    Pcm(Arc<AudioPcm>),
}

impl Default for MusicSource {
    fn default() -> Self {
        Self::Path(PathBuf::from(DEFAULT_MUSIC_PATH))
    }
}

impl MusicSource {
    fn load(&self) -> KenBurnsResult<Arc<AudioPcm>> {
        let pcm = match self {
            Self::Path(path) => Arc::new(decode_audio_f32_stereo(path, MIX_SAMPLE_RATE)?),
            Self::Pcm(pcm) => Arc::clone(pcm),
        };
        if pcm.channels == 0 || pcm.sample_rate == 0 || pcm.frames() == 0 {
            return Err(KenBurnsError::audio_init("music track has no playable samples"));
        }
        Ok(pcm)
    }
}

/// Interleaved PCM covering exactly one video frame.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioWindow {
    /// First sample frame of this window on the session clock.
    pub start_sample: u64,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` samples.
    pub interleaved_f32: Vec<f32>,
}

impl AudioWindow {
    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.interleaved_f32.len() / usize::from(self.channels.max(1))
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.interleaved_f32
            .iter()
            .fold(0.0f32, |m, s| m.max(s.abs()))
    }

    /// Raw little-endian `f32` bytes.
    pub fn to_f32le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.interleaved_f32.len() * 4);
        for &s in &self.interleaved_f32 {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        bytes
    }
}

enum TrackSource {
    Music(Arc<AudioPcm>),
    Tone { hz: f64 },
    Stopped,
}

/// The session's audio track. Hands out one [`AudioWindow`] per video frame.
pub struct AudioTrack {
    source: TrackSource,
    fps: Fps,
    gain: f32,
}

impl AudioTrack {
    /// Looping music at [`MUSIC_VOLUME`].
    pub fn music(pcm: Arc<AudioPcm>, fps: Fps) -> Self {
        Self {
            source: TrackSource::Music(pcm),
            fps,
            gain: MUSIC_VOLUME,
        }
    }

    /// Zero-gain tone.
    pub fn silence(fps: Fps) -> Self {
        Self {
            source: TrackSource::Tone {
                hz: SILENCE_TONE_HZ,
            },
            fps,
            gain: 0.0,
        }
    }

    /// `true` while the music asset is playing.
    pub fn is_music(&self) -> bool {
        matches!(self.source, TrackSource::Music(_))
    }

    /// `true` after [`AudioTrack::stop`].
    pub fn is_stopped(&self) -> bool {
        matches!(self.source, TrackSource::Stopped)
    }

    /// Output gain applied to the source.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Samples for video frame `index`. A stopped track yields zeros.
    pub fn window(&self, index: FrameIndex) -> AudioWindow {
        let start = frame_to_sample(index.0, self.fps, MIX_SAMPLE_RATE);
        let end = frame_to_sample(index.0 + 1, self.fps, MIX_SAMPLE_RATE);
        let frames = (end - start) as usize;
        let ch = usize::from(MIX_CHANNELS);
        let mut out = vec![0.0f32; frames * ch];

        match &self.source {
            TrackSource::Music(pcm) => {
                for (i, dst) in out.chunks_exact_mut(ch).enumerate() {
                    let (l, r) = sample_looped(pcm, start + i as u64);
                    dst[0] = l * self.gain;
                    dst[1] = r * self.gain;
                }
            }
            TrackSource::Tone { hz } => {
                for (i, dst) in out.chunks_exact_mut(ch).enumerate() {
                    let t = (start + i as u64) as f64 / f64::from(MIX_SAMPLE_RATE);
                    let v = (std::f64::consts::TAU * hz * t).sin() as f32 * self.gain;
                    dst.fill(v);
                }
            }
            TrackSource::Stopped => {}
        }

        AudioWindow {
            start_sample: start,
            sample_rate: MIX_SAMPLE_RATE,
            channels: MIX_CHANNELS,
            interleaved_f32: out,
        }
    }

    /// Stop playback and release the decoded music. Idempotent.
    pub fn stop(&mut self) {
        if !self.is_stopped() {
            tracing::debug!(music = self.is_music(), "audio track stopped");
            self.source = TrackSource::Stopped;
        }
    }
}

impl Drop for AudioTrack {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A started track plus the non-fatal error that forced a fallback to silence, if any.
pub struct StartedTrack {
    /// The track to sample for the rest of the session.
    pub track: AudioTrack,
    /// Why music was requested but silence is playing.
    pub warning: Option<KenBurnsError>,
}

/// Starts the audio track for a session.
pub struct AudioMixer;

impl AudioMixer {
    /// Start the track for `settings`. Never fails: music problems degrade to silence.
    pub fn start(settings: &Settings, music: &MusicSource, fps: Fps) -> StartedTrack {
        if !settings.add_music {
            return StartedTrack {
                track: AudioTrack::silence(fps),
                warning: None,
            };
        }
        match music.load() {
            Ok(pcm) => {
                tracing::debug!(
                    frames = pcm.frames(),
                    sample_rate = pcm.sample_rate,
                    "music track loaded"
                );
                StartedTrack {
                    track: AudioTrack::music(pcm, fps),
                    warning: None,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "music unavailable, continuing with silence");
                StartedTrack {
                    track: AudioTrack::silence(fps),
                    warning: Some(e),
                }
            }
        }
    }
}

/// Convert a frame delta to the nearest sample index at `sample_rate`.
pub(crate) fn frame_to_sample(frame_delta: u64, fps: Fps, sample_rate: u32) -> u64 {
    let num = u128::from(frame_delta) * u128::from(sample_rate) * u128::from(fps.den);
    let den = u128::from(fps.num);
    ((num + (den / 2)) / den) as u64
}

fn sample_looped(pcm: &AudioPcm, dst_sample: u64) -> (f32, f32) {
    let src = &pcm.interleaved_f32;
    let src_frames = pcm.frames();
    let channels = usize::from(pcm.channels);

    let src_pos = dst_sample as f64 * f64::from(pcm.sample_rate) / f64::from(MIX_SAMPLE_RATE);
    let src_pos = src_pos % src_frames as f64;
    let frame0 = (src_pos.floor() as usize).min(src_frames - 1);
    let frame1 = (frame0 + 1) % src_frames;
    let frac = (src_pos - frame0 as f64) as f32;

    let at = |frame: usize, ch: usize| src[frame * channels + ch.min(channels - 1)];
    let l = at(frame0, 0) + (at(frame1, 0) - at(frame0, 0)) * frac;
    let r = at(frame0, 1) + (at(frame1, 1) - at(frame0, 1)) * frac;
    (l, r)
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mixer.rs"]
mod tests;
