use super::*;
use crate::encode::encoder::InMemoryEncoder;
use crate::foundation::core::Canvas;
use crate::foundation::error::FailureReason;
use crate::render::frame::Frame;
use crate::text::face::BlockFace;
use crate::timeline::scene::Scene;

const TINY: Canvas = Canvas {
    width: 64,
    height: 36,
};

fn renderer() -> FrameRenderer {
    FrameRenderer::with_canvas(Box::new(BlockFace::default()), TINY).unwrap()
}

fn orchestrator<E: StreamEncoder>(encoder: E) -> PipelineOrchestrator<E> {
    PipelineOrchestrator::new(renderer(), encoder, PipelineOpts::default())
}

fn timeline(durations: &[f64]) -> SceneTimeline {
    SceneTimeline::new(
        durations
            .iter()
            .enumerate()
            .map(|(i, d)| Scene::new(format!("Scene {i}"), *d))
            .collect(),
    )
    .unwrap()
}

/// Encoder with injectable faults that counts lifecycle calls.
#[derive(Default)]
struct ScriptedEncoder {
    fail_open: bool,
    fail_on_submit: Option<u64>,
    fail_finalize: bool,
    backpressure_every: Option<u64>,

    open: bool,
    opened: u32,
    submitted: u64,
    finalized: u32,
    aborted: u32,
    seqs: Vec<FrameIndex>,
}

impl StreamEncoder for ScriptedEncoder {
    fn open(&mut self, cfg: EncoderConfig) -> ReelResult<()> {
        cfg.validate()?;
        if self.fail_open {
            return Err(ReelError::unsupported_format("no such codec"));
        }
        self.open = true;
        self.opened += 1;
        self.submitted = 0;
        self.seqs.clear();
        Ok(())
    }

    fn submit(&mut self, frame: Frame) -> ReelResult<Submitted> {
        assert!(self.open, "submit on closed encoder");
        if self.fail_on_submit == Some(self.submitted) {
            return Err(ReelError::encoding_failed("device lost"));
        }
        self.submitted += 1;
        self.seqs.push(frame.seq);
        match self.backpressure_every {
            Some(n) if self.submitted.is_multiple_of(n) => Ok(Submitted::Backpressured),
            _ => Ok(Submitted::Queued),
        }
    }

    fn finalize(&mut self) -> ReelResult<EncodedArtifact> {
        assert!(self.open, "finalize on closed encoder");
        self.open = false;
        self.finalized += 1;
        if self.fail_finalize {
            return Err(ReelError::encoding_failed("muxer error"));
        }
        Ok(EncodedArtifact {
            bytes: vec![0; self.submitted as usize],
            mime_type: "video/webm".to_owned(),
            suggested_filename: "x_ad.webm".to_owned(),
        })
    }

    fn abort(&mut self) {
        if self.open {
            self.aborted += 1;
        }
        self.open = false;
    }
}

#[test]
fn five_second_scene_renders_150_frames() {
    let mut orch = orchestrator(InMemoryEncoder::new());
    let tl = SceneTimeline::new(vec![Scene::new("Get Acme today!", 5.0)]).unwrap();
    let artifact = orch.run(&tl, "Acme").unwrap();

    assert_eq!(orch.state(), PipelineState::Completed);
    assert_eq!(orch.stats().frames_submitted, 150);
    assert_eq!(orch.stats().scenes_rendered, 1);
    assert_eq!(artifact.mime_type, Container::WebM.mime_type());
    assert_eq!(artifact.suggested_filename, "Acme_ad.webm");
    assert_eq!(artifact.bytes.len(), 150 * 8);

    let seqs: Vec<u64> = orch.encoder().frames().iter().map(|(s, _)| s.0).collect();
    assert_eq!(seqs, (0..150).collect::<Vec<_>>());
}

#[test]
fn empty_timeline_completes_with_empty_artifact() {
    let mut orch = orchestrator(ScriptedEncoder::default());
    let artifact = orch.run(&timeline(&[]), "X").unwrap();

    assert_eq!(orch.state(), PipelineState::Completed);
    assert_eq!(orch.stats().frames_submitted, 0);
    assert!(artifact.is_empty());
    assert_eq!(orch.encoder().opened, 1);
    assert_eq!(orch.encoder().finalized, 1);

    let mut mem = orchestrator(InMemoryEncoder::new());
    let artifact = mem.run(&timeline(&[]), "X").unwrap();
    assert!(artifact.is_empty());
    assert_eq!(artifact.suggested_filename, "X_ad.webm");
}

#[test]
fn empty_timeline_goes_straight_to_finalizing() {
    let mut orch = orchestrator(ScriptedEncoder::default());
    let tl = timeline(&[]);
    let mut run = orch.start(&tl, "X").unwrap();
    assert_eq!(run.state(), PipelineState::Finalizing);
    assert_eq!(run.step().unwrap(), Tick::Done);
    assert!(run.finish().is_ok());
}

#[test]
fn unsupported_format_fails_before_any_frame() {
    let encoder = ScriptedEncoder {
        fail_open: true,
        ..Default::default()
    };
    let mut orch = orchestrator(encoder);
    let err = orch.run(&timeline(&[2.0]), "Acme").unwrap_err();

    assert!(matches!(err, ReelError::UnsupportedFormat(_)));
    assert_eq!(
        orch.state(),
        PipelineState::Failed(FailureReason::UnsupportedFormat)
    );
    assert_eq!(orch.stats().frames_submitted, 0);
    assert_eq!(orch.encoder().submitted, 0);
}

#[test]
fn cancel_mid_render_tears_down_encoder() {
    let mut orch = orchestrator(ScriptedEncoder::default());
    let token = orch.cancel_token();
    let tl = timeline(&[1.0, 1.0]);
    {
        let mut run = orch.start(&tl, "Acme").unwrap();
        for _ in 0..10 {
            assert!(matches!(run.step().unwrap(), Tick::Frame(_)));
        }
        token.cancel();
        let err = run.step().unwrap_err();
        assert!(err.is_cancelled());
        assert!(run.finish().is_err());
    }

    assert_eq!(orch.state(), PipelineState::Failed(FailureReason::Cancelled));
    assert_eq!(orch.stats().frames_submitted, 10);
    assert_eq!(orch.encoder().aborted, 1);
    assert_eq!(orch.encoder().finalized, 0);
}

#[test]
fn cancel_before_finalize_discards_artifact() {
    let mut orch = orchestrator(ScriptedEncoder::default());
    let token = orch.cancel_token();
    let tl = timeline(&[0.1]);
    let mut run = orch.start(&tl, "Acme").unwrap();
    while let Tick::Frame(_) = run.step().unwrap() {}
    token.cancel();
    assert!(matches!(run.finish(), Err(ReelError::Cancelled)));

    assert_eq!(orch.state(), PipelineState::Failed(FailureReason::Cancelled));
    assert_eq!(orch.encoder().finalized, 0);
    assert_eq!(orch.encoder().aborted, 1);
}

#[test]
fn dropping_an_unfinished_run_cancels_it() {
    let mut orch = orchestrator(ScriptedEncoder::default());
    let tl = timeline(&[1.0]);
    {
        let mut run = orch.start(&tl, "Acme").unwrap();
        run.step().unwrap();
    }
    assert_eq!(orch.state(), PipelineState::Failed(FailureReason::Cancelled));
    assert_eq!(orch.encoder().aborted, 1);
}

#[test]
fn huge_durations_start_without_overflow() {
    // Each scene saturates to u64::MAX frames; the frame total must not overflow.
    let mut orch = orchestrator(ScriptedEncoder::default());
    let tl = timeline(&[1e19, 1e19]);
    {
        let mut run = orch.start(&tl, "Acme").unwrap();
        assert_eq!(run.step().unwrap(), Tick::Frame(FrameIndex(0)));
    }
    assert_eq!(orch.encoder().opened, 1);
    assert_eq!(orch.state(), PipelineState::Failed(FailureReason::Cancelled));
}

#[test]
fn pre_raised_cancel_never_opens_encoder() {
    let token = CancelToken::new();
    token.cancel();
    let mut orch = orchestrator(ScriptedEncoder::default()).with_cancel_token(token);
    let err = orch.run(&timeline(&[1.0]), "Acme").unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(orch.encoder().opened, 0);
}

#[test]
fn remainder_is_dropped_per_scene() {
    // 0.05 s is 1.5 frames: each scene gets one frame, nothing carries over.
    let mut orch = orchestrator(ScriptedEncoder::default());
    orch.run(&timeline(&[0.05, 0.05, 0.05, 0.05]), "Acme")
        .unwrap();
    assert_eq!(orch.stats().frames_submitted, 4);
    assert_eq!(orch.stats().scenes_rendered, 4);

    let mut orch = orchestrator(ScriptedEncoder::default());
    orch.run(&timeline(&[0.7, 0.7, 0.7]), "Acme").unwrap();
    assert_eq!(orch.stats().frames_submitted, 63);
}

#[test]
fn virtual_clock_advances_one_frame_per_step() {
    let mut orch = orchestrator(ScriptedEncoder::default());
    let tl = timeline(&[0.1, 0.1]);
    let mut run = orch.start(&tl, "Acme").unwrap();

    assert_eq!(run.render_state(), RenderState::default());
    assert_eq!(run.step().unwrap(), Tick::Frame(FrameIndex(0)));
    run.step().unwrap();
    assert_eq!(
        run.render_state(),
        RenderState {
            scene_index: 0,
            frame_in_scene: 2
        }
    );
    assert_eq!(run.step().unwrap(), Tick::Frame(FrameIndex(2)));
    assert_eq!(
        run.render_state(),
        RenderState {
            scene_index: 1,
            frame_in_scene: 0
        }
    );
    assert_eq!(run.stats().scenes_rendered, 1);

    for _ in 0..3 {
        assert!(matches!(run.step().unwrap(), Tick::Frame(_)));
    }
    assert_eq!(run.state(), PipelineState::Finalizing);
    assert_eq!(run.step().unwrap(), Tick::Done);
    run.finish().unwrap();
    assert_eq!(orch.state(), PipelineState::Completed);
}

#[test]
fn sub_frame_scenes_are_skipped() {
    let mut orch = orchestrator(ScriptedEncoder::default());
    orch.run(&timeline(&[1.0, 0.01, 1.0]), "Acme").unwrap();
    assert_eq!(orch.stats().frames_submitted, 60);
    assert_eq!(orch.stats().scenes_rendered, 2);
    let seqs = &orch.encoder().seqs;
    assert!(seqs.windows(2).all(|w| w[1].0 == w[0].0 + 1));
}

#[test]
fn mid_stream_fault_fails_with_encoding_failed() {
    let encoder = ScriptedEncoder {
        fail_on_submit: Some(5),
        ..Default::default()
    };
    let mut orch = orchestrator(encoder);
    let err = orch.run(&timeline(&[1.0]), "Acme").unwrap_err();

    assert!(matches!(err, ReelError::EncodingFailed(_)));
    assert_eq!(
        orch.state(),
        PipelineState::Failed(FailureReason::EncodingFailed)
    );
    assert_eq!(orch.stats().frames_submitted, 5);
    assert_eq!(orch.encoder().aborted, 1);
}

#[test]
fn finalize_fault_surfaces_instead_of_artifact() {
    let encoder = ScriptedEncoder {
        fail_finalize: true,
        ..Default::default()
    };
    let mut orch = orchestrator(encoder);
    let err = orch.run(&timeline(&[0.5]), "Acme").unwrap_err();
    assert!(matches!(err, ReelError::EncodingFailed(_)));
    assert_eq!(
        orch.state(),
        PipelineState::Failed(FailureReason::EncodingFailed)
    );
}

#[test]
fn backpressure_is_counted() {
    let encoder = ScriptedEncoder {
        backpressure_every: Some(3),
        ..Default::default()
    };
    let mut orch = orchestrator(encoder);
    orch.run(&timeline(&[0.3]), "Acme").unwrap();
    assert_eq!(orch.stats().frames_submitted, 9);
    assert_eq!(orch.stats().backpressure_waits, 3);
}

#[test]
fn identical_inputs_give_identical_output() {
    let tl = SceneTimeline::new(vec![
        Scene::new("Meet Acme", 0.5),
        Scene::new("Rocket skates for everyone who needs to go fast", 0.4),
        Scene::new("", 0.2),
    ])
    .unwrap();

    let mut a = orchestrator(InMemoryEncoder::new());
    let mut b = orchestrator(InMemoryEncoder::new());
    let art_a = a.run(&tl, "Acme").unwrap();
    let art_b = b.run(&tl, "Acme").unwrap();

    assert_eq!(a.stats(), b.stats());
    assert_eq!(art_a, art_b);
    assert_eq!(a.encoder().frames(), b.encoder().frames());

    // Frames inside a scene are identical; the next scene differs.
    let frames = a.encoder().frames();
    assert_eq!(frames[0].1, frames[14].1);
    assert_ne!(frames[14].1, frames[15].1);
}

#[test]
fn orchestrator_can_run_again_after_completion() {
    let mut orch = orchestrator(ScriptedEncoder::default());
    orch.run(&timeline(&[0.2]), "Acme").unwrap();
    orch.run(&timeline(&[0.1]), "Acme").unwrap();
    assert_eq!(orch.state(), PipelineState::Completed);
    assert_eq!(orch.stats().frames_submitted, 3);
    assert_eq!(orch.encoder().opened, 2);
}
