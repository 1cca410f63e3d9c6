use crate::foundation::core::Fps;
use crate::foundation::error::FailureReason;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Lifecycle of one pipeline run.
///
/// `Idle -> Rendering -> Finalizing -> Completed`, or `-> Failed` from any non-terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    /// No resources held.
    Idle,
    /// Encoder open, frames being produced.
    Rendering,
    /// All frames submitted, encoder draining.
    Finalizing,
    /// Artifact handed to the caller.
    Completed,
    /// Terminal failure.
    Failed(FailureReason),
}

impl PipelineState {
    /// Return `true` for `Completed` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }
}

/// Position of the virtual clock: which scene, and how many frames into it.
///
/// Elapsed scene time is derived from the frame counter so it never accumulates floating point
/// drift.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderState {
    /// Index of the current scene.
    pub scene_index: usize,
    /// Frames already produced for the current scene.
    pub frame_in_scene: u64,
}

impl RenderState {
    /// Seconds elapsed within the current scene.
    pub fn elapsed_in_scene(&self, fps: Fps) -> f64 {
        fps.frames_to_secs(self.frame_in_scene)
    }

    /// Advance one frame step. When the scene's `scene_frames` are used up the counter resets to
    /// zero and the scene index moves on; returns `true` in that case.
    pub(crate) fn advance(&mut self, scene_frames: u64) -> bool {
        self.frame_in_scene += 1;
        if self.frame_in_scene >= scene_frames {
            self.frame_in_scene = 0;
            self.scene_index += 1;
            return true;
        }
        false
    }
}

/// Cloneable abort signal shared between a caller and a running pipeline.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an un-raised token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the abort signal.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Return `true` once [`CancelToken::cancel`] has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/state.rs"]
mod tests;
