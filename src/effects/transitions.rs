//! Transition Engine: blends the outgoing and incoming image of a boundary.

use crate::animation::ease::Ease;
use crate::animation::motion::MotionParams;
use crate::assets::image::ImageAsset;
use crate::foundation::core::{Canvas, Vec2};
use crate::foundation::error::{KenBurnsError, KenBurnsResult};
use crate::foundation::rng::Rng64;
use crate::render::blend::crossfade_into;
use crate::render::compositor::{DrawParams, draw};
use crate::render::frame::{BACKGROUND_RGBA, FrameRGBA};

/// Extra scale the zoom-fade adds on both layers.
pub const ZOOM_FADE_BOOST: f64 = 0.2;

/// Ease applied to transition progress before blending.
pub const TRANSITION_EASE: Ease = Ease::OutQuad;

/// How two images are blended across a boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// Opacity blend at rest.
    CrossFade,
    /// Outgoing image slides off to the left while the incoming one pushes in from the right.
    SlidePush,
    /// Opacity blend with both layers punched in by [`ZOOM_FADE_BOOST`].
    ZoomFade,
}

impl TransitionKind {
    /// Every kind, in selection order.
    pub const ALL: [Self; 3] = [Self::CrossFade, Self::SlidePush, Self::ZoomFade];

    /// Pick a kind uniformly at random.
    pub fn random(rng: &mut Rng64) -> Self {
        Self::ALL[rng.below(Self::ALL.len())]
    }

    /// Stable lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::CrossFade => "cross_fade",
            Self::SlidePush => "slide_push",
            Self::ZoomFade => "zoom_fade",
        }
    }
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How the two layers of a transition frame are combined.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LayerMix {
    /// Draw `from`, then `to`, both source-over.
    Stack,
    /// Weighted blend: `from * (1 - t) + to * t`, so the two opacities always sum to one.
    Blend,
}

/// Placement of both layers for one transition frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionLayers {
    /// Outgoing image placement.
    pub from: DrawParams,
    /// Incoming image placement.
    pub to: DrawParams,
    /// How the layers are combined.
    pub mix: LayerMix,
}

/// Compute layer placement for `kind` at raw `progress` in `[0, 1]`.
///
/// `width` is the canvas width in pixels (the slide distance).
pub fn layers(
    kind: TransitionKind,
    from_motion: &MotionParams,
    to_motion: &MotionParams,
    progress: f64,
    width: f64,
) -> TransitionLayers {
    let e = TRANSITION_EASE.apply(progress);
    let (from_pan, from_scale) = from_motion.end();
    match kind {
        TransitionKind::CrossFade => TransitionLayers {
            from: DrawParams {
                offset: from_pan,
                scale: from_scale,
                opacity: (1.0 - e) as f32,
            },
            to: DrawParams {
                offset: Vec2::ZERO,
                scale: to_motion.scale_start,
                opacity: e as f32,
            },
            mix: LayerMix::Blend,
        },
        TransitionKind::SlidePush => TransitionLayers {
            from: DrawParams::opaque(
                Vec2::new(from_pan.x - e * width, from_pan.y),
                from_scale,
            ),
            to: DrawParams::opaque(
                Vec2::new(to_motion.pan_x + (width - e * width), to_motion.pan_y),
                to_motion.scale_start,
            ),
            mix: LayerMix::Stack,
        },
        TransitionKind::ZoomFade => TransitionLayers {
            from: DrawParams {
                offset: from_pan,
                scale: from_scale + ZOOM_FADE_BOOST,
                opacity: (1.0 - e) as f32,
            },
            to: DrawParams {
                offset: Vec2::ZERO,
                scale: to_motion.scale_start + ZOOM_FADE_BOOST,
                opacity: e as f32,
            },
            mix: LayerMix::Blend,
        },
    }
}

/// Composites transition frames. Owns the two scratch layers blends are rendered into.
pub struct TransitionEngine {
    scratch_from: FrameRGBA,
    scratch_to: FrameRGBA,
}

impl TransitionEngine {
    /// Create an engine for frames of size `canvas`.
    pub fn new(canvas: Canvas) -> Self {
        Self {
            scratch_from: FrameRGBA::new(canvas),
            scratch_to: FrameRGBA::new(canvas),
        }
    }

    /// Render one transition frame into `target`, replacing its contents.
    #[allow(clippy::too_many_arguments)]
    pub fn composite(
        &mut self,
        target: &mut FrameRGBA,
        from: &ImageAsset,
        from_motion: &MotionParams,
        to: &ImageAsset,
        to_motion: &MotionParams,
        progress: f64,
        kind: TransitionKind,
    ) -> KenBurnsResult<()> {
        if target.canvas() != self.scratch_from.canvas() {
            return Err(KenBurnsError::validation(format!(
                "transition target is {}x{}, engine was built for {}x{}",
                target.width, target.height, self.scratch_from.width, self.scratch_from.height
            )));
        }

        let l = layers(
            kind,
            from_motion,
            to_motion,
            progress,
            f64::from(target.width),
        );
        match l.mix {
            LayerMix::Stack => {
                target.clear(BACKGROUND_RGBA);
                draw(target, from, l.from);
                draw(target, to, l.to);
            }
            LayerMix::Blend => {
                self.scratch_from.clear(BACKGROUND_RGBA);
                draw(
                    &mut self.scratch_from,
                    from,
                    DrawParams::opaque(l.from.offset, l.from.scale),
                );
                self.scratch_to.clear(BACKGROUND_RGBA);
                draw(
                    &mut self.scratch_to,
                    to,
                    DrawParams::opaque(l.to.offset, l.to.scale),
                );
                crossfade_into(
                    &mut target.data,
                    &self.scratch_from.data,
                    &self.scratch_to.data,
                    l.to.opacity,
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/transitions.rs"]
mod tests;
