use crate::assets::image::ImageAsset;
use crate::effects::transitions::TransitionEngine;
use crate::foundation::core::Canvas;
use crate::foundation::error::{KenBurnsError, KenBurnsResult};
use crate::render::compositor::{DrawParams, draw};
use crate::render::frame::{BACKGROUND_RGBA, FrameRGBA};
use crate::timeline::scheduler::{FrameDescriptor, FrameStep, TimelinePlan};

/// Turns frame descriptors into pixels. Reuses one output frame across calls.
pub struct FrameRenderer {
    frame: FrameRGBA,
    transitions: TransitionEngine,
}

impl FrameRenderer {
    /// Create a renderer for `canvas`.
    pub fn new(canvas: Canvas) -> Self {
        Self {
            frame: FrameRGBA::new(canvas),
            transitions: TransitionEngine::new(canvas),
        }
    }

    /// Composite the frame described by `desc`.
    pub fn render(
        &mut self,
        plan: &TimelinePlan,
        images: &[ImageAsset],
        desc: &FrameDescriptor,
    ) -> KenBurnsResult<&FrameRGBA> {
        match desc.step {
            FrameStep::Hold { image_index, t } => {
                let (image, motion) = lookup(plan, images, image_index)?;
                let (offset, scale) = motion.sample(t);
                self.frame.clear(BACKGROUND_RGBA);
                draw(&mut self.frame, image, DrawParams::opaque(offset, scale));
            }
            FrameStep::Transition {
                from_index,
                to_index,
                kind,
                progress,
            } => {
                let (from, from_motion) = lookup(plan, images, from_index)?;
                let (to, to_motion) = lookup(plan, images, to_index)?;
                self.transitions.composite(
                    &mut self.frame,
                    from,
                    from_motion,
                    to,
                    to_motion,
                    progress,
                    kind,
                )?;
            }
        }
        Ok(&self.frame)
    }
}

fn lookup<'a>(
    plan: &'a TimelinePlan,
    images: &'a [ImageAsset],
    i: usize,
) -> KenBurnsResult<(&'a ImageAsset, &'a crate::animation::motion::MotionParams)> {
    match (images.get(i), plan.motion(i)) {
        (Some(image), Some(motion)) => Ok((image, motion)),
        _ => Err(KenBurnsError::validation(format!(
            "frame references image {i}, but only {} images were supplied",
            images.len()
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/renderer.rs"]
mod tests;
