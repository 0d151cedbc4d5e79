//! Motion Planner: per-image pan/zoom ("Ken Burns") parameters.

use crate::animation::ease::{Ease, lerp};
use crate::foundation::core::Vec2;
use crate::foundation::rng::Rng64;

/// Scale at the start of a hold.
pub const SCALE_START: f64 = 1.0;
/// Scale at the end of a hold (8% zoom-in).
pub const SCALE_END: f64 = 1.08;
/// Pan offsets are drawn uniformly from `[-PAN_HALF_RANGE_PX, PAN_HALF_RANGE_PX)`, in canvas pixels.
pub const PAN_HALF_RANGE_PX: f64 = 20.0;

/// Pan/zoom parameters for one image in one session.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MotionParams {
    /// Uniform scale at hold start.
    pub scale_start: f64,
    /// Uniform scale at hold end.
    pub scale_end: f64,
    /// Horizontal pan reached at hold end, in canvas pixels.
    pub pan_x: f64,
    /// Vertical pan reached at hold end, in canvas pixels.
    pub pan_y: f64,
}

impl MotionParams {
    /// Offset and scale at normalized hold progress `t` in `[0, 1]`.
    ///
    /// Scale and pan ramp linearly from `(scale_start, 0)` towards `(scale_end, pan)`.
    pub fn sample(&self, t: f64) -> (Vec2, f64) {
        let t = Ease::Linear.apply(t);
        let scale = lerp(self.scale_start, self.scale_end, t);
        (Vec2::new(self.pan_x * t, self.pan_y * t), scale)
    }

    /// Offset and scale at the very end of the hold, where the outgoing transition picks up.
    pub fn end(&self) -> (Vec2, f64) {
        (Vec2::new(self.pan_x, self.pan_y), self.scale_end)
    }
}

/// Draws one [`MotionParams`] per image from the session random source.
pub struct MotionPlanner<'a> {
    rng: &'a mut Rng64,
}

impl<'a> MotionPlanner<'a> {
    /// Plan motions from `rng`.
    pub fn new(rng: &'a mut Rng64) -> Self {
        Self { rng }
    }

    /// Plan the motion for one image.
    pub fn plan(&mut self) -> MotionParams {
        let pan_x = self.rng.symmetric(PAN_HALF_RANGE_PX);
        let pan_y = self.rng.symmetric(PAN_HALF_RANGE_PX);
        MotionParams {
            scale_start: SCALE_START,
            scale_end: SCALE_END,
            pan_x,
            pan_y,
        }
    }

    /// Plan motions for `count` images, in order.
    pub fn plan_all(&mut self, count: usize) -> Vec<MotionParams> {
        (0..count).map(|_| self.plan()).collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/motion.rs"]
mod tests;
