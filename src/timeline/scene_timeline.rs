use crate::foundation::core::Fps;
use crate::foundation::error::{ReelError, ReelResult};
use crate::timeline::scene::Scene;

/// Ordered, validated, read-only sequence of scenes in playback order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneTimeline {
    scenes: Vec<Scene>,
}

impl SceneTimeline {
    /// Build a timeline, rejecting any scene whose duration is not a finite value `> 0`.
    ///
    /// An empty scene list is valid and renders zero frames.
    pub fn new(scenes: Vec<Scene>) -> ReelResult<Self> {
        for (i, scene) in scenes.iter().enumerate() {
            let d = scene.duration_secs();
            if !d.is_finite() || d <= 0.0 {
                return Err(ReelError::invalid_scene(format!(
                    "scene {i}: duration must be a finite number > 0, got {d}"
                )));
            }
        }
        Ok(Self { scenes })
    }

    /// Number of scenes.
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// Return `true` when the timeline holds no scenes.
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Scene at `index`, if any.
    pub fn scene(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(index)
    }

    /// All scenes in playback order.
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Sum of all nominal scene durations in seconds.
    pub fn total_duration_secs(&self) -> f64 {
        self.scenes.iter().map(Scene::duration_secs).sum()
    }

    /// Frames rendered for the scene at `index`: `floor(duration * fps)`.
    ///
    /// The fractional remainder is dropped per scene and never carried into the next one.
    pub fn frames_for_scene(&self, index: usize, fps: Fps) -> u64 {
        self.scenes
            .get(index)
            .map(|s| fps.secs_to_frames_floor(s.duration_secs()))
            .unwrap_or(0)
    }

    /// Total frames across the timeline at `fps`. Saturates at `u64::MAX`.
    pub fn total_frames(&self, fps: Fps) -> u64 {
        self.frames_before_scene(self.scenes.len(), fps)
    }

    /// Frames rendered by all scenes before `index`, i.e. the sequence number of that scene's
    /// first frame. Saturates at `u64::MAX`.
    pub fn frames_before_scene(&self, index: usize, fps: Fps) -> u64 {
        (0..index.min(self.scenes.len()))
            .map(|i| self.frames_for_scene(i, fps))
            .fold(0u64, u64::saturating_add)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/scene_timeline.rs"]
mod tests;
