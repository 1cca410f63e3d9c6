use crate::encode::audio::{NarrationCue, cues_for_timeline};
use crate::foundation::core::{CANVAS_1080P, Canvas, DEFAULT_BITRATE_BPS, FPS_30, Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::frame::Frame;
use crate::timeline::scene_timeline::SceneTimeline;
use std::str::FromStr;

/// Default number of frames the encoder may hold before `submit` blocks.
pub const DEFAULT_QUEUE_CAPACITY: usize = 8;

/// Output container and its codec pairing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Container {
    /// VP9 video and Opus audio in WebM.
    #[default]
    WebM,
    /// H.264 video and AAC audio in MP4.
    Mp4,
}

impl Container {
    /// Mime type of the finished artifact.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::WebM => "video/webm",
            Self::Mp4 => "video/mp4",
        }
    }

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::WebM => "webm",
            Self::Mp4 => "mp4",
        }
    }

    /// `ffmpeg` video encoder name.
    pub fn video_codec(self) -> &'static str {
        match self {
            Self::WebM => "libvpx-vp9",
            Self::Mp4 => "libx264",
        }
    }

    /// `ffmpeg` audio encoder name.
    pub fn audio_codec(self) -> &'static str {
        match self {
            Self::WebM => "libopus",
            Self::Mp4 => "aac",
        }
    }
}

impl FromStr for Container {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webm" => Ok(Self::WebM),
            "mp4" => Ok(Self::Mp4),
            other => Err(ReelError::unsupported_format(format!(
                "unknown container '{other}' (expected webm or mp4)"
            ))),
        }
    }
}

/// Parameters of one encoding session.
#[derive(Clone, Debug, PartialEq)]
pub struct EncoderConfig {
    /// Frame dimensions.
    pub canvas: Canvas,
    /// Output frame rate. Frames are timestamped at this rate regardless of submission speed.
    pub fps: Fps,
    /// Target video bit-rate.
    pub bitrate_bps: u32,
    /// Output container.
    pub container: Container,
    /// One cue per scene that produces frames, in playback order.
    pub narration: Vec<NarrationCue>,
    /// Frames buffered between `submit` and the encoder before `submit` blocks.
    pub queue_capacity: usize,
    /// Product title, used for the suggested filename.
    pub title: String,
}

impl EncoderConfig {
    /// Config for rendering `timeline` with the fixed 1080p / 30 fps / 2.5 Mbps settings.
    pub fn for_timeline(timeline: &SceneTimeline, title: &str, container: Container) -> Self {
        Self {
            canvas: CANVAS_1080P,
            fps: FPS_30,
            bitrate_bps: DEFAULT_BITRATE_BPS,
            container,
            narration: cues_for_timeline(timeline, FPS_30),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            title: title.to_owned(),
        }
    }

    /// Check the config before a session is opened.
    ///
    /// Odd or zero dimensions cannot be encoded as 4:2:0 and are reported as
    /// [`ReelError::UnsupportedFormat`].
    pub fn validate(&self) -> ReelResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(ReelError::unsupported_format(
                "encoder width/height must be non-zero",
            ));
        }
        if !self.canvas.width.is_multiple_of(2) || !self.canvas.height.is_multiple_of(2) {
            return Err(ReelError::unsupported_format(
                "encoder width/height must be even (required for yuv420p output)",
            ));
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(ReelError::validation("encoder fps must be non-zero"));
        }
        if self.bitrate_bps == 0 {
            return Err(ReelError::validation("encoder bit-rate must be non-zero"));
        }
        if self.queue_capacity == 0 {
            return Err(ReelError::validation(
                "encoder queue capacity must be >= 1",
            ));
        }
        Ok(())
    }

    /// Frames the session expects, from the narration cues. Saturates at `u64::MAX`.
    pub fn expected_frames(&self) -> u64 {
        self.narration
            .iter()
            .fold(0u64, |acc, c| acc.saturating_add(c.frames))
    }

    /// Empty artifact for a session that received no frames.
    pub fn empty_artifact(&self) -> EncodedArtifact {
        EncodedArtifact {
            bytes: Vec::new(),
            mime_type: self.container.mime_type().to_owned(),
            suggested_filename: suggested_filename(&self.title, self.container),
        }
    }
}

/// Outcome of one [`StreamEncoder::submit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Submitted {
    /// The frame was queued without waiting.
    Queued,
    /// The queue was full; the call waited for space before queueing the frame.
    Backpressured,
}

/// Finished video, owned by the caller.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedArtifact {
    /// Encoded container bytes. Empty when no frames were submitted.
    pub bytes: Vec<u8>,
    /// `video/<container>`.
    pub mime_type: String,
    /// `<title with whitespace replaced by '_'>_ad.<ext>`.
    pub suggested_filename: String,
}

impl EncodedArtifact {
    /// Return `true` for the zero-frame artifact.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for EncodedArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedArtifact")
            .field("len", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .field("suggested_filename", &self.suggested_filename)
            .finish()
    }
}

/// Download name for an artifact: every whitespace run in `title` becomes `_`, then `_ad.<ext>`.
pub fn suggested_filename(title: &str, container: Container) -> String {
    let mut stem = String::with_capacity(title.len());
    let mut in_space = false;
    for c in title.chars() {
        if c.is_whitespace() {
            if !in_space {
                stem.push('_');
            }
            in_space = true;
        } else {
            stem.push(c);
            in_space = false;
        }
    }
    format!("{stem}_ad.{}", container.extension())
}

/// A streaming video encoder session.
///
/// Lifecycle: `open` once, `submit` frames in sequence order, then either `finalize` or `abort`.
/// After either, the encoder may be opened again.
pub trait StreamEncoder {
    /// Begin a session. Fails with [`ReelError::UnsupportedFormat`] when the container/codec
    /// combination cannot be created.
    fn open(&mut self, cfg: EncoderConfig) -> ReelResult<()>;

    /// Hand over one frame. May block while internal buffers are full.
    fn submit(&mut self, frame: Frame) -> ReelResult<Submitted>;

    /// Drain all buffered work and return the artifact.
    ///
    /// A mid-stream fault yields [`ReelError::EncodingFailed`] and discards partial output. A
    /// session with zero frames yields an empty artifact.
    fn finalize(&mut self) -> ReelResult<EncodedArtifact>;

    /// Tear the session down, discarding everything. No-op when not open.
    fn abort(&mut self);
}

impl<E: StreamEncoder + ?Sized> StreamEncoder for Box<E> {
    fn open(&mut self, cfg: EncoderConfig) -> ReelResult<()> {
        (**self).open(cfg)
    }

    fn submit(&mut self, frame: Frame) -> ReelResult<Submitted> {
        (**self).submit(frame)
    }

    fn finalize(&mut self) -> ReelResult<EncodedArtifact> {
        (**self).finalize()
    }

    fn abort(&mut self) {
        (**self).abort()
    }
}

/// Reference encoder that keeps a digest per frame instead of compressed video.
///
/// The artifact bytes are the little-endian frame digests, 8 bytes per frame, in submission
/// order. Useful for determinism checks and for driving the pipeline without `ffmpeg`.
#[derive(Debug, Default)]
pub struct InMemoryEncoder {
    cfg: Option<EncoderConfig>,
    frames: Vec<(FrameIndex, u64)>,
}

impl InMemoryEncoder {
    /// Create a closed encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `true` while a session is open.
    pub fn is_open(&self) -> bool {
        self.cfg.is_some()
    }

    /// `(sequence number, digest)` of every frame in the current or last session.
    pub fn frames(&self) -> &[(FrameIndex, u64)] {
        &self.frames
    }
}

impl StreamEncoder for InMemoryEncoder {
    fn open(&mut self, cfg: EncoderConfig) -> ReelResult<()> {
        if self.cfg.is_some() {
            return Err(ReelError::validation("encoder session is already open"));
        }
        cfg.validate()?;
        self.frames.clear();
        self.cfg = Some(cfg);
        Ok(())
    }

    fn submit(&mut self, frame: Frame) -> ReelResult<Submitted> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ReelError::encoding_failed("encoder is not open"))?;
        if frame.width != cfg.canvas.width || frame.height != cfg.canvas.height {
            return Err(ReelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.canvas.width, cfg.canvas.height
            )));
        }
        if let Some((last, _)) = self.frames.last()
            && frame.seq <= *last
        {
            return Err(ReelError::validation(
                "encoder received out-of-order frame index",
            ));
        }
        self.frames.push((frame.seq, frame.digest()));
        Ok(Submitted::Queued)
    }

    fn finalize(&mut self) -> ReelResult<EncodedArtifact> {
        let cfg = self
            .cfg
            .take()
            .ok_or_else(|| ReelError::encoding_failed("encoder is not open"))?;
        let mut artifact = cfg.empty_artifact();
        artifact.bytes = self
            .frames
            .iter()
            .flat_map(|(_, digest)| digest.to_le_bytes())
            .collect();
        Ok(artifact)
    }

    fn abort(&mut self) {
        self.cfg = None;
        self.frames.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/encoder.rs"]
mod tests;
