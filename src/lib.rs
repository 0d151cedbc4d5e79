//! Ken Burns slideshow renderer.
//!
//! Turns an ordered list of still images into one continuous video: each image is held with a
//! slow pan/zoom, consecutive images are blended by a randomly chosen transition, and a single
//! audio track (looping music or silence) runs alongside. Frames are composited on the CPU and
//! streamed into a [`StreamEncoder`], by default WebM through the system `ffmpeg`.
//!
//! The entry point is [`RenderController::render`]:
//!
//! - Decode images into [`ImageAsset`]s
//! - Pick [`Settings`] (hold length, resolution, music on/off)
//! - Render into an encoder and read progress from a [`ProgressHandle`] meanwhile
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation;
mod assets;
mod audio;
mod effects;
mod encode;
mod foundation;
mod render;
mod session;
mod timeline;

pub use crate::foundation::core::{Affine, Canvas, Fps, FrameIndex, FrameRange, Point, Rect, Vec2};
pub use crate::foundation::error::{KenBurnsError, KenBurnsResult};
pub use crate::foundation::rng::Rng64;

pub use crate::animation::ease::{Ease, lerp};
pub use crate::animation::motion::{
    MotionParams, MotionPlanner, PAN_HALF_RANGE_PX, SCALE_END, SCALE_START,
};
pub use crate::assets::image::{AssetId, ImageAsset};
pub use crate::assets::media::{AudioPcm, MIX_CHANNELS, MIX_SAMPLE_RATE, decode_audio_f32_stereo};
pub use crate::audio::mixer::{
    AudioMixer, AudioTrack, AudioWindow, DEFAULT_MUSIC_PATH, MUSIC_VOLUME, MusicSource,
    StartedTrack,
};
pub use crate::effects::transitions::{
    LayerMix, TransitionEngine, TransitionKind, TransitionLayers, ZOOM_FADE_BOOST,
    layers as transition_layers,
};
pub use crate::encode::codec::{
    AudioCodec, CodecChoice, VideoCodec, parse_encoder_list, probe_ffmpeg_encoders, select_codecs,
};
pub use crate::encode::ffmpeg::{
    FfmpegEncoder, FfmpegEncoderOpts, ensure_parent_dir, is_ffmpeg_on_path,
};
pub use crate::encode::sink::{
    EncodedOutput, EncoderConfig, IN_MEMORY_MIME, InMemoryEncoder, RecordedFrame, StreamEncoder,
};
pub use crate::render::compositor::{DrawParams, cover_rect, cover_size, draw};
pub use crate::render::frame::{BACKGROUND_RGBA, FrameRGBA};
pub use crate::render::renderer::FrameRenderer;
pub use crate::session::controller::{
    CancelToken, Pacing, ProgressHandle, RenderController, RenderOptions, RenderSession,
    SessionState,
};
pub use crate::session::settings::{HOLD_SECONDS_MAX, HOLD_SECONDS_MIN, Resolution, Settings};
pub use crate::timeline::scheduler::{
    FrameDescriptor, FrameIter, FrameStep, MIN_IMAGES, PROGRESS_CADENCE, ScheduledPhase,
    TIMELINE_FPS, TRANSITION_SECONDS, TimelinePhase, TimelinePlan, progress_percent,
};
