//! Timeline Scheduler: turns an image count plus settings into an ordered stream of frame
//! descriptors.
//!
//! The timeline is `Hold(0), Transition(0, 1), Hold(1), ..., Hold(n - 1)`. The last image gets a
//! terminal hold and no outgoing transition.

use crate::animation::motion::{MotionParams, MotionPlanner};
use crate::effects::transitions::TransitionKind;
use crate::foundation::core::{Fps, FrameIndex, FrameRange};
use crate::foundation::error::{KenBurnsError, KenBurnsResult};
use crate::foundation::rng::Rng64;
use crate::session::settings::Settings;

/// Fixed timeline frame rate.
pub const TIMELINE_FPS: Fps = Fps { num: 30, den: 1 };
/// Fixed transition length, in seconds.
pub const TRANSITION_SECONDS: f64 = 1.0;
/// Progress is reported on every Nth emitted frame.
pub const PROGRESS_CADENCE: u64 = 5;
/// Fewest images a timeline can be built from.
pub const MIN_IMAGES: usize = 2;

/// One phase of the timeline with its fixed frame count.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum TimelinePhase {
    /// A single image on screen with pan/zoom.
    Hold {
        /// Image shown.
        image_index: usize,
        /// Frames in this phase.
        frames: u64,
    },
    /// Two images blended.
    Transition {
        /// Outgoing image.
        from_index: usize,
        /// Incoming image.
        to_index: usize,
        /// Blend used for the whole boundary.
        kind: TransitionKind,
        /// Frames in this phase.
        frames: u64,
    },
}

impl TimelinePhase {
    /// Frames this phase emits.
    pub fn frame_count(&self) -> u64 {
        match *self {
            Self::Hold { frames, .. } | Self::Transition { frames, .. } => frames,
        }
    }
}

/// A phase placed on the timeline.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct ScheduledPhase {
    /// The phase itself.
    #[serde(flatten)]
    pub phase: TimelinePhase,
    /// Frames covered, in timeline space.
    pub range: FrameRange,
}

/// What to draw for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameStep {
    /// Draw `image_index` with its motion sampled at `t = f / hold_frames`.
    Hold {
        /// Image shown.
        image_index: usize,
        /// Normalized hold progress in `[0, 1)`.
        t: f64,
    },
    /// Blend `from_index` into `to_index` at raw (un-eased) `progress = f / transition_frames`.
    Transition {
        /// Outgoing image.
        from_index: usize,
        /// Incoming image.
        to_index: usize,
        /// Blend kind.
        kind: TransitionKind,
        /// Raw transition progress in `[0, 1)`.
        progress: f64,
    },
}

/// One emitted frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameDescriptor {
    /// Position on the timeline.
    pub index: FrameIndex,
    /// What to composite.
    pub step: FrameStep,
    /// `true` on frames where progress should be published.
    pub report_progress: bool,
}

impl FrameDescriptor {
    /// Frames completed once this one is delivered.
    pub fn frames_done(&self) -> u64 {
        self.index.0 + 1
    }
}

/// `min(100, round(done / total * 100))`.
pub fn progress_percent(frames_done: u64, total_frames: u64) -> u8 {
    if total_frames == 0 {
        return 100;
    }
    let pct = (frames_done as f64 / total_frames as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// The complete, immutable schedule of one session.
#[derive(Clone, Debug, serde::Serialize)]
pub struct TimelinePlan {
    image_count: usize,
    hold_seconds: f64,
    fps: Fps,
    hold_frames: u64,
    transition_frames: u64,
    total_frames: u64,
    emitted_frames: u64,
    motions: Vec<MotionParams>,
    transitions: Vec<TransitionKind>,
    phases: Vec<ScheduledPhase>,
}

impl TimelinePlan {
    /// Plan a session over `image_count` images.
    ///
    /// All motions are drawn from `rng` before any transition kind, so the pan of image `i` does
    /// not depend on the number of boundaries.
    pub fn new(image_count: usize, settings: &Settings, rng: &mut Rng64) -> KenBurnsResult<Self> {
        if image_count < MIN_IMAGES {
            return Err(KenBurnsError::validation(format!(
                "at least {MIN_IMAGES} images are required, got {image_count}"
            )));
        }
        settings.validate()?;

        let fps = TIMELINE_FPS;
        let hold_frames = fps.secs_to_frames_round(settings.hold_seconds);
        let transition_frames = fps.secs_to_frames_round(TRANSITION_SECONDS);
        if hold_frames == 0 {
            return Err(KenBurnsError::validation("hold phase would emit no frames"));
        }

        let motions = MotionPlanner::new(rng).plan_all(image_count);
        let transitions: Vec<TransitionKind> = (0..image_count - 1)
            .map(|_| TransitionKind::random(rng))
            .collect();

        let mut phases = Vec::with_capacity(image_count * 2 - 1);
        let mut cursor = 0u64;
        let mut push = |phase: TimelinePhase| -> KenBurnsResult<()> {
            let start = cursor;
            cursor += phase.frame_count();
            phases.push(ScheduledPhase {
                phase,
                range: FrameRange::new(FrameIndex(start), FrameIndex(cursor))?,
            });
            Ok(())
        };
        for (i, kind) in transitions.iter().enumerate() {
            push(TimelinePhase::Hold {
                image_index: i,
                frames: hold_frames,
            })?;
            push(TimelinePhase::Transition {
                from_index: i,
                to_index: (i + 1) % image_count,
                kind: *kind,
                frames: transition_frames,
            })?;
        }
        push(TimelinePhase::Hold {
            image_index: image_count - 1,
            frames: hold_frames,
        })?;

        let total_frames = (image_count as f64
            * (settings.hold_seconds + TRANSITION_SECONDS)
            * fps.as_f64())
        .round() as u64;

        Ok(Self {
            image_count,
            hold_seconds: settings.hold_seconds,
            fps,
            hold_frames,
            transition_frames,
            total_frames,
            emitted_frames: cursor,
            motions,
            transitions,
            phases,
        })
    }

    /// Number of images scheduled.
    pub fn image_count(&self) -> usize {
        self.image_count
    }

    /// Timeline frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Frames per hold phase.
    pub fn hold_frames(&self) -> u64 {
        self.hold_frames
    }

    /// Frames per transition phase.
    pub fn transition_frames(&self) -> u64 {
        self.transition_frames
    }

    /// `round(image_count * (hold_seconds + 1) * fps)`, the progress denominator.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Frames actually emitted: `n * hold + (n - 1) * transition`.
    pub fn emitted_frames(&self) -> u64 {
        self.emitted_frames
    }

    /// Motion of each image, by index.
    pub fn motions(&self) -> &[MotionParams] {
        &self.motions
    }

    /// Motion of image `i`.
    pub fn motion(&self, i: usize) -> Option<&MotionParams> {
        self.motions.get(i)
    }

    /// Transition kind of each boundary, by outgoing image index.
    pub fn transitions(&self) -> &[TransitionKind] {
        &self.transitions
    }

    /// Phases in timeline order.
    pub fn phases(&self) -> &[ScheduledPhase] {
        &self.phases
    }

    /// Timeline duration in seconds, as emitted.
    pub fn duration_seconds(&self) -> f64 {
        self.emitted_frames as f64 / self.fps.as_f64()
    }

    /// Fresh iterator over every frame, from the first.
    pub fn frames(&self) -> FrameIter<'_> {
        FrameIter {
            plan: self,
            phase: 0,
            next: 0,
        }
    }

    /// Descriptor of the frame at `index`, or `None` past the end.
    pub fn descriptor_at(&self, index: FrameIndex) -> Option<FrameDescriptor> {
        let pos = self
            .phases
            .partition_point(|p| p.range.end.0 <= index.0);
        let sp = self.phases.get(pos)?;
        if !sp.range.contains(index) {
            return None;
        }
        Some(self.describe(sp, index))
    }

    fn describe(&self, sp: &ScheduledPhase, index: FrameIndex) -> FrameDescriptor {
        let f = index.0 - sp.range.start.0;
        let step = match sp.phase {
            TimelinePhase::Hold {
                image_index,
                frames,
            } => FrameStep::Hold {
                image_index,
                t: f as f64 / frames as f64,
            },
            TimelinePhase::Transition {
                from_index,
                to_index,
                kind,
                frames,
            } => FrameStep::Transition {
                from_index,
                to_index,
                kind,
                progress: f as f64 / frames as f64,
            },
        };
        FrameDescriptor {
            index,
            step,
            report_progress: (index.0 + 1) % PROGRESS_CADENCE == 0,
        }
    }
}

/// Walks a [`TimelinePlan`] frame by frame. Only restartable by calling
/// [`TimelinePlan::frames`] again.
pub struct FrameIter<'a> {
    plan: &'a TimelinePlan,
    phase: usize,
    next: u64,
}

impl Iterator for FrameIter<'_> {
    type Item = FrameDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let sp = self.plan.phases.get(self.phase)?;
            if sp.range.contains(FrameIndex(self.next)) {
                let d = self.plan.describe(sp, FrameIndex(self.next));
                self.next += 1;
                return Some(d);
            }
            self.phase += 1;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.plan.emitted_frames.saturating_sub(self.next) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for FrameIter<'_> {}

#[cfg(test)]
#[path = "../../tests/unit/timeline/scheduler.rs"]
mod tests;
