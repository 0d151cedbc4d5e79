use crate::audio::mixer::AudioWindow;
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{KenBurnsError, KenBurnsResult};
use crate::render::frame::FrameRGBA;
use xxhash_rust::xxh3::xxh3_64_with_seed;

/// MIME type of [`InMemoryEncoder`] output.
pub const IN_MEMORY_MIME: &str = "application/x-kenburns-frames";

const CHECKSUM_SEED: u64 = 0x6b62_7572_6e73_0001;

/// Configuration handed to a [`StreamEncoder`] before the first frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Video frame rate.
    pub fps: Fps,
    /// Audio sample rate in Hz.
    pub sample_rate: u32,
    /// Audio channel count.
    pub channels: u16,
}

impl EncoderConfig {
    /// Reject zero sizes and rates.
    pub fn validate(&self) -> KenBurnsResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(KenBurnsError::validation(
                "encoder width/height must be non-zero",
            ));
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(KenBurnsError::validation("encoder fps must be non-zero"));
        }
        if self.sample_rate == 0 || self.channels == 0 {
            return Err(KenBurnsError::validation(
                "encoder audio sample_rate/channels must be non-zero",
            ));
        }
        Ok(())
    }

    fn frame_bytes(&self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }
}

/// A finished encode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedOutput {
    /// Encoded container bytes.
    pub bytes: Vec<u8>,
    /// Declared container/MIME type.
    pub mime: String,
}

/// Consumes composited frames plus one audio track and produces an encoded buffer.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order, each
/// frame paired with the audio samples that play during it.
pub trait StreamEncoder: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: EncoderConfig) -> KenBurnsResult<()>;
    /// Push one frame and its audio window.
    fn push_frame(
        &mut self,
        idx: FrameIndex,
        frame: &FrameRGBA,
        audio: &AudioWindow,
    ) -> KenBurnsResult<()>;
    /// Finalize and return the encoded output.
    fn finish(&mut self) -> KenBurnsResult<EncodedOutput>;
    /// Discard everything pushed so far. Must be safe to call in any state.
    fn abort(&mut self);
}

/// Frame/audio bookkeeping shared by encoders: started state, ordering and sizes.
#[derive(Debug, Default)]
pub(crate) struct PushGuard {
    cfg: Option<EncoderConfig>,
    last_idx: Option<FrameIndex>,
}

impl PushGuard {
    pub(crate) fn start(&mut self, cfg: EncoderConfig) -> KenBurnsResult<()> {
        cfg.validate()?;
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    pub(crate) fn config(&self) -> KenBurnsResult<&EncoderConfig> {
        self.cfg
            .as_ref()
            .ok_or_else(|| KenBurnsError::encoding("encoder not started"))
    }

    pub(crate) fn check(
        &mut self,
        idx: FrameIndex,
        frame: &FrameRGBA,
        audio: &AudioWindow,
    ) -> KenBurnsResult<()> {
        let cfg = *self.config()?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(KenBurnsError::encoding(format!(
                "out-of-order frame index {} after {}",
                idx.0, last.0
            )));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(KenBurnsError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != cfg.frame_bytes() {
            return Err(KenBurnsError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }
        if audio.sample_rate != cfg.sample_rate || audio.channels != cfg.channels {
            return Err(KenBurnsError::validation(format!(
                "audio window is {} Hz x{}, expected {} Hz x{}",
                audio.sample_rate, audio.channels, cfg.sample_rate, cfg.channels
            )));
        }
        self.last_idx = Some(idx);
        Ok(())
    }

    pub(crate) fn reset(&mut self) {
        self.cfg = None;
        self.last_idx = None;
    }
}

/// One frame as seen by [`InMemoryEncoder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordedFrame {
    /// Timeline index.
    pub index: FrameIndex,
    /// xxh3 checksum of the premultiplied pixels.
    pub checksum: u64,
    /// Audio sample frames delivered with this frame.
    pub audio_frames: usize,
}

/// Encoder for tests and dry runs. Records what it was fed instead of encoding.
#[derive(Debug, Default)]
pub struct InMemoryEncoder {
    guard: PushGuard,
    cfg: Option<EncoderConfig>,
    frames: Vec<RecordedFrame>,
    audio_peak: f32,
    fail_at: Option<FrameIndex>,
    finished: bool,
    aborted: bool,
}

impl InMemoryEncoder {
    /// Create an empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with an encoding error when frame `idx` is pushed.
    pub fn failing_at(idx: FrameIndex) -> Self {
        Self {
            fail_at: Some(idx),
            ..Self::default()
        }
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<EncoderConfig> {
        self.cfg
    }

    /// Frames recorded so far, in push order.
    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    /// Total audio sample frames received.
    pub fn audio_frames(&self) -> usize {
        self.frames.iter().map(|f| f.audio_frames).sum()
    }

    /// Largest absolute audio sample received.
    pub fn audio_peak(&self) -> f32 {
        self.audio_peak
    }

    /// `true` once `finish` succeeded.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// `true` once `abort` was called.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }
}

impl StreamEncoder for InMemoryEncoder {
    fn begin(&mut self, cfg: EncoderConfig) -> KenBurnsResult<()> {
        self.guard.start(cfg)?;
        self.cfg = Some(cfg);
        self.frames.clear();
        self.audio_peak = 0.0;
        self.finished = false;
        self.aborted = false;
        Ok(())
    }

    fn push_frame(
        &mut self,
        idx: FrameIndex,
        frame: &FrameRGBA,
        audio: &AudioWindow,
    ) -> KenBurnsResult<()> {
        if self.fail_at == Some(idx) {
            return Err(KenBurnsError::encoding(format!(
                "injected failure at frame {}",
                idx.0
            )));
        }
        self.guard.check(idx, frame, audio)?;
        self.audio_peak = self.audio_peak.max(audio.peak());
        self.frames.push(RecordedFrame {
            index: idx,
            checksum: xxh3_64_with_seed(&frame.data, CHECKSUM_SEED),
            audio_frames: audio.frames(),
        });
        Ok(())
    }

    fn finish(&mut self) -> KenBurnsResult<EncodedOutput> {
        self.guard.config()?;
        self.guard.reset();
        self.finished = true;

        let mut bytes = Vec::with_capacity(16 + self.frames.len() * 8);
        bytes.extend_from_slice(&(self.frames.len() as u64).to_le_bytes());
        bytes.extend_from_slice(&(self.audio_frames() as u64).to_le_bytes());
        for f in &self.frames {
            bytes.extend_from_slice(&f.checksum.to_le_bytes());
        }
        Ok(EncodedOutput {
            bytes,
            mime: IN_MEMORY_MIME.to_owned(),
        })
    }

    fn abort(&mut self) {
        self.guard.reset();
        self.aborted = true;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
