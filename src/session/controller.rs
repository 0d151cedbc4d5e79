//! Render Session Controller: validates inputs, drives the timeline frame by frame, streams
//! frames and audio into a [`StreamEncoder`] running on its own thread, and publishes progress.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::Instant;

use parking_lot::RwLock;

use crate::assets::image::ImageAsset;
use crate::assets::media::{MIX_CHANNELS, MIX_SAMPLE_RATE};
use crate::audio::mixer::{AudioMixer, AudioTrack, AudioWindow, MusicSource};
use crate::encode::sink::{EncodedOutput, EncoderConfig, StreamEncoder};
use crate::foundation::core::{Canvas, FrameIndex};
use crate::foundation::error::{KenBurnsError, KenBurnsResult};
use crate::foundation::rng::Rng64;
use crate::render::frame::FrameRGBA;
use crate::render::renderer::FrameRenderer;
use crate::session::settings::Settings;
use crate::timeline::scheduler::{TimelinePlan, progress_percent};

/// Lifecycle of a render session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No session yet, or the last one was discarded.
    #[default]
    Idle,
    /// Frames are being produced.
    Rendering,
    /// Output was returned.
    Complete,
    /// Stopped by an error or cancellation. No output was returned.
    Failed,
}

/// Snapshot of the controller's session, as seen by progress readers.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct RenderSession {
    /// Lifecycle state.
    pub state: SessionState,
    /// Frames delivered to the encoder so far.
    pub current_frame: u64,
    /// Progress denominator.
    pub total_frames: u64,
    /// `0..=100`, non-decreasing within a session.
    pub progress_percent: u8,
    /// Non-fatal problems (music fell back to silence).
    pub warnings: Vec<String>,
    /// Cause of a `Failed` session.
    pub error: Option<String>,
}

/// Thread-safe read view of a controller's session.
#[derive(Clone, Debug)]
pub struct ProgressHandle {
    inner: Arc<RwLock<RenderSession>>,
}

impl ProgressHandle {
    /// Copy of the current session state.
    pub fn snapshot(&self) -> RenderSession {
        self.inner.read().clone()
    }
}

/// Cooperative cancellation flag, checked once per frame.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Request cancellation of the running session.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// `true` once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// How the render loop is paced against the wall clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Pacing {
    /// One frame per frame interval, deadline based.
    #[default]
    RealTime,
    /// As fast as rendering and encoding allow.
    Unpaced,
}

/// Controller-level knobs that are not user settings.
#[derive(Clone, Debug)]
pub struct RenderOptions {
    /// Seed for motions and transition kinds. `None` seeds from the wall clock.
    pub seed: Option<u64>,
    /// Render loop pacing.
    pub pacing: Pacing,
    /// Music used when `Settings::add_music` is set.
    pub music: MusicSource,
    /// Frames buffered between the render loop and the encoder thread.
    pub channel_capacity: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            seed: None,
            pacing: Pacing::RealTime,
            music: MusicSource::default(),
            channel_capacity: 4,
        }
    }
}

/// Owns one render session at a time.
pub struct RenderController {
    options: RenderOptions,
    session: Arc<RwLock<RenderSession>>,
    cancel: CancelToken,
}

impl RenderController {
    /// Create an idle controller.
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            session: Arc::new(RwLock::new(RenderSession::default())),
            cancel: CancelToken::default(),
        }
    }

    /// Options this controller was built with.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Read view for progress displays on other threads.
    pub fn progress(&self) -> ProgressHandle {
        ProgressHandle {
            inner: Arc::clone(&self.session),
        }
    }

    /// Token that cancels the running session.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Copy of the current session state.
    pub fn session(&self) -> RenderSession {
        self.session.read().clone()
    }

    /// Drop a finished session and return to `Idle`.
    pub fn discard(&self) -> KenBurnsResult<()> {
        let mut s = self.session.write();
        if s.state == SessionState::Rendering {
            return Err(KenBurnsError::AlreadyRunning);
        }
        *s = RenderSession::default();
        Ok(())
    }

    /// Plan the timeline for `image_count` images with this controller's seed.
    pub fn plan(&self, image_count: usize, settings: &Settings) -> KenBurnsResult<TimelinePlan> {
        let mut rng = self.rng();
        TimelinePlan::new(image_count, settings, &mut rng)
    }

    /// Render the single timeline frame at `index` without encoding or audio.
    pub fn preview_frame(
        &self,
        images: &[ImageAsset],
        settings: &Settings,
        index: FrameIndex,
    ) -> KenBurnsResult<FrameRGBA> {
        let plan = self.plan(images.len(), settings)?;
        let desc = plan.descriptor_at(index).ok_or_else(|| {
            KenBurnsError::validation(format!(
                "frame {} is past the end of the timeline ({} frames)",
                index.0,
                plan.emitted_frames()
            ))
        })?;
        let mut renderer = FrameRenderer::new(settings.canvas());
        Ok(renderer.render(&plan, images, &desc)?.clone())
    }

    /// Render `images` into `encoder` and return the encoded output.
    ///
    /// Fails with `Validation` before any state changes when fewer than two images are given or
    /// `settings` are invalid, and with `AlreadyRunning` while another render is in flight.
    #[tracing::instrument(
        name = "render_session",
        skip_all,
        fields(images = images.len(), resolution = %settings.resolution, hold = settings.hold_seconds)
    )]
    pub fn render(
        &self,
        images: &[ImageAsset],
        settings: &Settings,
        encoder: &mut dyn StreamEncoder,
    ) -> KenBurnsResult<EncodedOutput> {
        let plan = {
            let mut s = self.session.write();
            if s.state == SessionState::Rendering {
                return Err(KenBurnsError::AlreadyRunning);
            }
            let plan = self.plan(images.len(), settings)?;
            self.cancel.reset();
            *s = RenderSession {
                state: SessionState::Rendering,
                total_frames: plan.total_frames(),
                ..RenderSession::default()
            };
            plan
        };

        tracing::info!(
            total_frames = plan.total_frames(),
            emitted_frames = plan.emitted_frames(),
            transitions = ?plan.transitions(),
            "render started"
        );
        let started = Instant::now();

        let mixer = AudioMixer::start(settings, &self.options.music, plan.fps());
        let mut track = mixer.track;
        if let Some(w) = mixer.warning {
            self.session.write().warnings.push(w.to_string());
        }

        let res = self.run(&plan, images, settings, &track, encoder);
        track.stop();

        let mut s = self.session.write();
        match res {
            Ok(out) => {
                s.state = SessionState::Complete;
                s.current_frame = plan.emitted_frames();
                s.progress_percent = 100;
                tracing::info!(
                    bytes = out.bytes.len(),
                    mime = %out.mime,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "render complete"
                );
                Ok(out)
            }
            Err(e) => {
                s.state = SessionState::Failed;
                s.error = Some(e.to_string());
                tracing::error!(error = %e, frame = s.current_frame, "render failed");
                Err(e)
            }
        }
    }

    fn rng(&self) -> Rng64 {
        match self.options.seed {
            Some(seed) => Rng64::new(seed),
            None => Rng64::from_entropy(),
        }
    }

    fn run(
        &self,
        plan: &TimelinePlan,
        images: &[ImageAsset],
        settings: &Settings,
        track: &AudioTrack,
        encoder: &mut dyn StreamEncoder,
    ) -> KenBurnsResult<EncodedOutput> {
        let canvas = settings.canvas();
        let cfg = EncoderConfig {
            width: canvas.width,
            height: canvas.height,
            fps: plan.fps(),
            sample_rate: MIX_SAMPLE_RATE,
            channels: MIX_CHANNELS,
        };
        let cap = self.options.channel_capacity.max(1);

        std::thread::scope(|scope| -> KenBurnsResult<EncodedOutput> {
            let (tx, rx) = mpsc::sync_channel::<FrameMsg>(cap);

            let enc = scope.spawn(move || -> KenBurnsResult<Option<EncodedOutput>> {
                let res = encode_stream(encoder, cfg, &rx);
                if !matches!(res, Ok(Some(_))) {
                    encoder.abort();
                }
                res
            });

            let produce_res = self.produce(plan, images, track, canvas, &tx);
            drop(tx);

            let enc_res = enc
                .join()
                .map_err(|_| KenBurnsError::encoding("encoder thread panicked"))?;

            match (produce_res, enc_res) {
                (Err(KenBurnsError::Cancelled), _) => Err(KenBurnsError::Cancelled),
                (_, Err(e)) => Err(e),
                (Err(e), Ok(_)) => Err(e),
                (Ok(()), Ok(Some(out))) => Ok(out),
                (Ok(()), Ok(None)) => Err(KenBurnsError::encoding(
                    "encoder stopped without producing output",
                )),
            }
        })
    }

    fn produce(
        &self,
        plan: &TimelinePlan,
        images: &[ImageAsset],
        track: &AudioTrack,
        canvas: Canvas,
        tx: &mpsc::SyncSender<FrameMsg>,
    ) -> KenBurnsResult<()> {
        if images.len() != plan.image_count() {
            return Err(KenBurnsError::validation(
                "image list changed after the timeline was planned",
            ));
        }
        let mut renderer = FrameRenderer::new(canvas);
        let interval = plan.fps().frame_interval();
        let clock = Instant::now();

        for desc in plan.frames() {
            if self.cancel.is_cancelled() {
                tracing::info!(frame = desc.index.0, "render cancelled");
                return Err(KenBurnsError::Cancelled);
            }

            let frame = renderer.render(plan, images, &desc)?;
            let msg = FrameMsg::Frame {
                idx: desc.index,
                frame: Arc::new(frame.clone()),
                audio: track.window(desc.index),
            };
            tx.send(msg)
                .map_err(|_| KenBurnsError::encoding("encoder thread stopped unexpectedly"))?;

            let done = desc.frames_done();
            {
                let mut s = self.session.write();
                s.current_frame = done;
                if desc.report_progress {
                    let pct = progress_percent(done, plan.total_frames());
                    s.progress_percent = s.progress_percent.max(pct);
                    tracing::debug!(frame = done, progress = s.progress_percent, "progress");
                }
            }

            if self.options.pacing == Pacing::RealTime {
                let deadline = clock + interval.mul_f64(done as f64);
                let now = Instant::now();
                if deadline > now {
                    std::thread::sleep(deadline - now);
                }
            }
        }

        tx.send(FrameMsg::Finish)
            .map_err(|_| KenBurnsError::encoding("encoder thread stopped unexpectedly"))
    }
}

enum FrameMsg {
    Frame {
        idx: FrameIndex,
        frame: Arc<FrameRGBA>,
        audio: AudioWindow,
    },
    Finish,
}

/// Feed frames to `encoder` until `Finish`. `Ok(None)` when the producer hung up early.
fn encode_stream(
    encoder: &mut dyn StreamEncoder,
    cfg: EncoderConfig,
    rx: &mpsc::Receiver<FrameMsg>,
) -> KenBurnsResult<Option<EncodedOutput>> {
    encoder.begin(cfg)?;
    loop {
        match rx.recv() {
            Ok(FrameMsg::Frame { idx, frame, audio }) => encoder.push_frame(idx, &frame, &audio)?,
            Ok(FrameMsg::Finish) => return encoder.finish().map(Some),
            Err(_) => return Ok(None),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/controller.rs"]
mod tests;
