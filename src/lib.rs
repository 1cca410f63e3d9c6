//! adreel renders short text advertisements into video.
//!
//! A [`SceneTimeline`] of timed text scenes is composited frame by frame on a fixed 1920x1080,
//! 30 fps canvas (gradient background, product title, wrapped scene text, progress bar) and
//! streamed into a [`StreamEncoder`]. The [`PipelineOrchestrator`] drives the loop on a virtual
//! clock, so output length depends only on scene durations:
//!
//! - Build a [`SceneTimeline`] directly or from a JSON [`ScriptDef`] via [`resolve_narrations`]
//! - Create a [`FrameRenderer`] with a [`FontFace`]
//! - Run a [`PipelineOrchestrator`] with [`FfmpegEncoder`] or [`InMemoryEncoder`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod encode;
pub(crate) mod narration;
pub(crate) mod pipeline;
pub(crate) mod render;
pub(crate) mod text;
pub(crate) mod timeline;

pub use crate::foundation::core::{
    CANVAS_1080P, Canvas, DEFAULT_BITRATE_BPS, FPS_30, FRAME_HEIGHT, FRAME_WIDTH, Fps, FrameIndex,
    Point, Rect, Rgba8,
};
pub use crate::foundation::error::{FailureReason, ReelError, ReelResult};

pub use crate::encode::audio::NarrationCue;
pub use crate::encode::encoder::{
    Container, DEFAULT_QUEUE_CAPACITY, EncodedArtifact, EncoderConfig, InMemoryEncoder,
    StreamEncoder, Submitted, suggested_filename,
};
pub use crate::encode::ffmpeg::{
    FfmpegEncoder, FfmpegEncoderOpts, ensure_parent_dir, is_ffmpeg_on_path,
};
pub use crate::narration::{
    FileNarrationSource, NarrationRequest, NarrationSource, NoNarration, resolve_narrations,
};
pub use crate::pipeline::orchestrator::{
    PipelineOpts, PipelineOrchestrator, RenderRun, RunStats, Tick,
};
pub use crate::pipeline::state::{CancelToken, PipelineState, RenderState};
pub use crate::render::frame::Frame;
pub use crate::render::renderer::FrameRenderer;
pub use crate::render::style::FrameStyle;
pub use crate::text::face::{BlockFace, FontFace, ParleyFace, StyledMeasure, TextStyle};
pub use crate::text::wrap::{
    LaidOutLine, LayoutResult, MonospaceMetrics, TextMeasure, WrappedLine, layout_block,
    wrap_words,
};
pub use crate::timeline::scene::{NarrationRef, Scene};
pub use crate::timeline::scene_timeline::SceneTimeline;
pub use crate::timeline::script::{SceneDef, ScriptDef, normalize_rel_path};
