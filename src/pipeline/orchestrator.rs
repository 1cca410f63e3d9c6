use crate::encode::encoder::{
    Container, DEFAULT_QUEUE_CAPACITY, EncodedArtifact, EncoderConfig, StreamEncoder, Submitted,
};
use crate::foundation::core::{FPS_30, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::pipeline::state::{CancelToken, PipelineState, RenderState};
use crate::render::renderer::FrameRenderer;
use crate::timeline::scene_timeline::SceneTimeline;

/// Options for [`PipelineOrchestrator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineOpts {
    /// Output container.
    pub container: Container,
    /// Frames the encoder may buffer before `submit` blocks.
    pub queue_capacity: usize,
}

impl Default for PipelineOpts {
    fn default() -> Self {
        Self {
            container: Container::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Counters for one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Frames handed to the encoder.
    pub frames_submitted: u64,
    /// Scenes whose frames were all submitted. Scenes too short for one frame are not counted.
    pub scenes_rendered: usize,
    /// Submissions that had to wait for encoder queue space.
    pub backpressure_waits: u64,
}

/// Result of one [`RenderRun::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// A frame was rendered and submitted.
    Frame(FrameIndex),
    /// Every scene is exhausted; call [`RenderRun::finish`].
    Done,
}

/// Drives a [`SceneTimeline`] through a [`FrameRenderer`] into a [`StreamEncoder`].
///
/// Time is a virtual clock that advances one frame (1/30 s) per step, independent of wall-clock
/// time. A scene of duration `d` gets `floor(d * 30)` frames and the remainder is dropped.
///
/// ```text
/// Idle -> Rendering -> Finalizing -> Completed
///            \______________\______-> Failed(reason)
/// ```
///
/// Entering a terminal state tears down the encoder session and releases raster surfaces.
pub struct PipelineOrchestrator<E: StreamEncoder> {
    renderer: FrameRenderer,
    encoder: E,
    opts: PipelineOpts,
    cancel: CancelToken,
    state: PipelineState,
    render_state: RenderState,
    stats: RunStats,
}

impl<E: StreamEncoder> PipelineOrchestrator<E> {
    /// Create an idle orchestrator.
    pub fn new(renderer: FrameRenderer, encoder: E, opts: PipelineOpts) -> Self {
        Self {
            renderer,
            encoder,
            opts,
            cancel: CancelToken::new(),
            state: PipelineState::Idle,
            render_state: RenderState::default(),
            stats: RunStats::default(),
        }
    }

    /// Use `token` as the abort signal instead of the orchestrator's own.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Clone of the abort signal. Raising it fails the current run with `Cancelled`.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Current virtual clock position.
    pub fn render_state(&self) -> RenderState {
        self.render_state
    }

    /// Counters for the current or last run.
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// The encoder.
    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// The frame renderer.
    pub fn renderer(&self) -> &FrameRenderer {
        &self.renderer
    }

    /// Render `timeline` with `title` to completion and return the artifact.
    #[tracing::instrument(skip_all, fields(scenes = timeline.len(), title = %title))]
    pub fn run(&mut self, timeline: &SceneTimeline, title: &str) -> ReelResult<EncodedArtifact> {
        let mut run = self.start(timeline, title)?;
        while let Tick::Frame(_) = run.step()? {}
        run.finish()
    }

    /// Open the encoder and return a run to be advanced with [`RenderRun::step`].
    ///
    /// The orchestrator must be idle or in a terminal state; a finished orchestrator is reset.
    pub fn start<'a>(
        &'a mut self,
        timeline: &'a SceneTimeline,
        title: &'a str,
    ) -> ReelResult<RenderRun<'a, E>> {
        if matches!(
            self.state,
            PipelineState::Rendering | PipelineState::Finalizing
        ) {
            return Err(ReelError::validation("pipeline run already in progress"));
        }
        self.state = PipelineState::Idle;
        self.render_state = RenderState::default();
        self.stats = RunStats::default();

        if self.cancel.is_cancelled() {
            return Err(self.fail(ReelError::Cancelled));
        }

        let mut cfg = EncoderConfig::for_timeline(timeline, title, self.opts.container);
        cfg.canvas = self.renderer.canvas();
        cfg.queue_capacity = self.opts.queue_capacity;
        let expected = cfg.expected_frames();

        self.state = PipelineState::Rendering;
        tracing::info!(frames = expected, container = ?self.opts.container, "rendering");
        if let Err(e) = self.encoder.open(cfg) {
            return Err(self.fail(e));
        }
        if let Err(e) = self.renderer.prepare() {
            return Err(self.fail(e));
        }

        let mut run = RenderRun {
            orch: self,
            timeline,
            title,
            next_seq: FrameIndex(0),
        };
        run.skip_empty_scenes();
        Ok(run)
    }

    /// Move to `Failed`, tear down the encoder and release surfaces. Returns `err` for chaining.
    fn fail(&mut self, err: ReelError) -> ReelError {
        self.state = PipelineState::Failed(err.reason());
        self.encoder.abort();
        self.renderer.release();
        if err.is_cancelled() {
            tracing::info!(frames = self.stats.frames_submitted, "pipeline cancelled");
        } else {
            tracing::error!(error = %err, "pipeline failed");
        }
        err
    }
}

/// One in-progress run, advanced one frame at a time.
///
/// Dropping an unfinished run cancels it.
pub struct RenderRun<'a, E: StreamEncoder> {
    orch: &'a mut PipelineOrchestrator<E>,
    timeline: &'a SceneTimeline,
    title: &'a str,
    next_seq: FrameIndex,
}

impl<E: StreamEncoder> RenderRun<'_, E> {
    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.orch.state
    }

    /// Current virtual clock position.
    pub fn render_state(&self) -> RenderState {
        self.orch.render_state
    }

    /// Counters so far.
    pub fn stats(&self) -> RunStats {
        self.orch.stats
    }

    /// Render and submit one frame, then advance the virtual clock by one frame.
    pub fn step(&mut self) -> ReelResult<Tick> {
        match self.orch.state {
            PipelineState::Rendering => {}
            PipelineState::Finalizing => return Ok(Tick::Done),
            _ => return Err(ReelError::validation("pipeline run is not rendering")),
        }
        if self.orch.cancel.is_cancelled() {
            return Err(self.orch.fail(ReelError::Cancelled));
        }

        let orch = &mut *self.orch;
        let index = orch.render_state.scene_index;
        let Some(scene) = self.timeline.scene(index) else {
            orch.state = PipelineState::Finalizing;
            return Ok(Tick::Done);
        };

        let seq = self.next_seq;
        let frame = match orch.renderer.render(
            seq,
            &orch.render_state,
            scene,
            self.title,
            self.timeline.len(),
        ) {
            Ok(frame) => frame,
            Err(e) => return Err(orch.fail(e)),
        };
        match orch.encoder.submit(frame) {
            Ok(Submitted::Queued) => {}
            Ok(Submitted::Backpressured) => orch.stats.backpressure_waits += 1,
            Err(e) => return Err(orch.fail(e)),
        }
        orch.stats.frames_submitted += 1;
        self.next_seq = seq.next();

        let scene_frames = self.timeline.frames_for_scene(index, FPS_30);
        if orch.render_state.advance(scene_frames) {
            orch.stats.scenes_rendered += 1;
            tracing::debug!(scene = index, frames = scene_frames, "scene complete");
            self.skip_empty_scenes();
        }
        Ok(Tick::Frame(seq))
    }

    /// Render any remaining frames, drain the encoder and return the artifact.
    pub fn finish(mut self) -> ReelResult<EncodedArtifact> {
        while let Tick::Frame(_) = self.step()? {}

        let orch = &mut *self.orch;
        if orch.cancel.is_cancelled() {
            return Err(orch.fail(ReelError::Cancelled));
        }
        let artifact = match orch.encoder.finalize() {
            Ok(artifact) => artifact,
            Err(e) => return Err(orch.fail(e)),
        };
        if orch.cancel.is_cancelled() {
            return Err(orch.fail(ReelError::Cancelled));
        }

        orch.state = PipelineState::Completed;
        orch.renderer.release();
        tracing::info!(
            frames = orch.stats.frames_submitted,
            bytes = artifact.bytes.len(),
            filename = %artifact.suggested_filename,
            "pipeline completed"
        );
        Ok(artifact)
    }

    /// Step past scenes too short for a single frame; enter `Finalizing` after the last scene.
    fn skip_empty_scenes(&mut self) {
        let orch = &mut *self.orch;
        while orch.render_state.scene_index < self.timeline.len()
            && self
                .timeline
                .frames_for_scene(orch.render_state.scene_index, FPS_30)
                == 0
        {
            tracing::debug!(
                scene = orch.render_state.scene_index,
                "scene shorter than one frame, skipped"
            );
            orch.render_state.scene_index += 1;
        }
        if orch.render_state.scene_index >= self.timeline.len() {
            orch.state = PipelineState::Finalizing;
        }
    }
}

impl<E: StreamEncoder> Drop for RenderRun<'_, E> {
    fn drop(&mut self) {
        if matches!(
            self.orch.state,
            PipelineState::Rendering | PipelineState::Finalizing
        ) {
            self.orch.fail(ReelError::Cancelled);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/orchestrator.rs"]
mod tests;
