use crate::encode::audio::narration_filter_graph;
use crate::encode::encoder::{
    Container, EncodedArtifact, EncoderConfig, StreamEncoder, Submitted,
};
use crate::foundation::core::{FrameIndex, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::frame::Frame;
use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::JoinHandle;

/// Options for [`FfmpegEncoder`].
#[derive(Clone, Debug)]
pub struct FfmpegEncoderOpts {
    /// Background used to flatten frame alpha before encoding.
    pub background: Rgba8,
    /// Directory for narration clips and the in-progress output. Defaults to the system temp dir.
    pub scratch_dir: PathBuf,
}

impl Default for FfmpegEncoderOpts {
    fn default() -> Self {
        Self {
            background: Rgba8::rgb(0, 0, 0),
            scratch_dir: std::env::temp_dir(),
        }
    }
}

/// Encoder that streams raw frames into the system `ffmpeg`.
///
/// Frames pass through a bounded queue to a writer thread which flattens alpha and writes them
/// to `ffmpeg`'s stdin, so `submit` returns as soon as a slot is free. `ffmpeg` timestamps the
/// frames at the configured rate. Output goes to a scratch file that is read back on `finalize`
/// and always removed.
pub struct FfmpegEncoder {
    opts: FfmpegEncoderOpts,
    session: Option<Session>,
}

struct Session {
    cfg: EncoderConfig,
    child: Child,
    queue: Option<SyncSender<Frame>>,
    writer: Option<JoinHandle<std::io::Result<()>>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    output: TempFileGuard,
    _clips: Vec<TempFileGuard>,
    frames: u64,
    last_seq: Option<FrameIndex>,
}

impl FfmpegEncoder {
    /// Create a closed encoder.
    pub fn new(opts: FfmpegEncoderOpts) -> Self {
        Self {
            opts,
            session: None,
        }
    }

    /// Return `true` while a session is open.
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    fn fail_session(&mut self, what: &str) -> ReelError {
        let stderr = match self.session.take() {
            Some(session) => session.teardown(),
            None => String::new(),
        };
        tracing::error!(stderr = %stderr, "ffmpeg failed: {what}");
        if stderr.is_empty() {
            ReelError::encoding_failed(what.to_owned())
        } else {
            ReelError::encoding_failed(format!("{what}: {stderr}"))
        }
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new(FfmpegEncoderOpts::default())
    }
}

impl StreamEncoder for FfmpegEncoder {
    #[tracing::instrument(level = "debug", skip(self, cfg), fields(container = ?cfg.container))]
    fn open(&mut self, cfg: EncoderConfig) -> ReelResult<()> {
        if self.session.is_some() {
            return Err(ReelError::validation("encoder session is already open"));
        }
        cfg.validate()?;

        if !is_ffmpeg_on_path() {
            return Err(ReelError::unsupported_format(
                "ffmpeg is required for encoding, but was not found on PATH",
            ));
        }
        let has_audio = narration_filter_graph(&cfg.narration, cfg.fps, 1).is_some();
        let mut codecs = vec![cfg.container.video_codec()];
        if has_audio {
            codecs.push(cfg.container.audio_codec());
        }
        for codec in codecs {
            if !ffmpeg_has_encoder(codec) {
                return Err(ReelError::unsupported_format(format!(
                    "ffmpeg on PATH has no '{codec}' encoder"
                )));
            }
        }

        std::fs::create_dir_all(&self.opts.scratch_dir).map_err(|e| {
            ReelError::unsupported_format(format!(
                "failed to create scratch directory '{}': {e}",
                self.opts.scratch_dir.display()
            ))
        })?;
        let mut clips = Vec::new();
        for (i, clip) in cfg.narration.iter().filter_map(|c| c.clip.as_ref()).enumerate() {
            let path = scratch_path(&self.opts.scratch_dir, &format!("clip{i}"), "audio");
            let guard = TempFileGuard(Some(path.clone()));
            std::fs::write(&path, clip.bytes()).map_err(|e| {
                ReelError::unsupported_format(format!(
                    "failed to stage narration clip '{}': {e}",
                    clip.label()
                ))
            })?;
            clips.push(guard);
        }
        let clip_paths: Vec<PathBuf> = clips.iter().filter_map(|g| g.0.clone()).collect();
        let out_path = scratch_path(&self.opts.scratch_dir, "out", cfg.container.extension());
        let output = TempFileGuard(Some(out_path.clone()));

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .args(ffmpeg_args(&cfg, &clip_paths, &out_path));

        let mut child = cmd.spawn().map_err(|e| {
            ReelError::unsupported_format(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child.stdin.take();
        let stderr = child.stderr.take();
        let (Some(mut stdin), Some(mut stderr)) = (stdin, stderr) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ReelError::encoding_failed(
                "failed to open ffmpeg stdio (unexpected)",
            ));
        };
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        let (queue, frames_rx) = mpsc::sync_channel::<Frame>(cfg.queue_capacity);
        let background = self.opts.background;
        let frame_len = cfg.canvas.rgba8_len();
        let writer = std::thread::spawn(move || {
            let mut scratch = vec![0u8; frame_len];
            for frame in frames_rx {
                flatten_premul_over_bg(&mut scratch, &frame.data, background);
                stdin.write_all(&scratch)?;
            }
            stdin.flush()
        });

        tracing::debug!(
            width = cfg.canvas.width,
            height = cfg.canvas.height,
            clips = clip_paths.len(),
            "ffmpeg session opened"
        );
        self.session = Some(Session {
            cfg,
            child,
            queue: Some(queue),
            writer: Some(writer),
            stderr_drain: Some(stderr_drain),
            output,
            _clips: clips,
            frames: 0,
            last_seq: None,
        });
        Ok(())
    }

    fn submit(&mut self, frame: Frame) -> ReelResult<Submitted> {
        let Some(session) = self.session.as_mut() else {
            return Err(ReelError::encoding_failed("encoder is not open"));
        };
        let canvas = session.cfg.canvas;
        if frame.width != canvas.width || frame.height != canvas.height {
            return Err(ReelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, canvas.width, canvas.height
            )));
        }
        if frame.data.len() != canvas.rgba8_len() {
            return Err(ReelError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }
        if let Some(last) = session.last_seq
            && frame.seq <= last
        {
            return Err(ReelError::validation(
                "encoder received out-of-order frame index",
            ));
        }
        let seq = frame.seq;
        let Some(queue) = session.queue.as_ref() else {
            return Err(ReelError::encoding_failed("encoder is already finalizing"));
        };

        let submitted = match queue.try_send(frame) {
            Ok(()) => Submitted::Queued,
            Err(TrySendError::Full(frame)) => {
                if queue.send(frame).is_err() {
                    return Err(self.fail_session("ffmpeg stopped accepting frames"));
                }
                tracing::debug!(seq = seq.0, "encoder queue full, waited for space");
                Submitted::Backpressured
            }
            Err(TrySendError::Disconnected(_)) => {
                return Err(self.fail_session("ffmpeg stopped accepting frames"));
            }
        };
        if let Some(session) = self.session.as_mut() {
            session.frames += 1;
            session.last_seq = Some(seq);
        }
        Ok(submitted)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    fn finalize(&mut self) -> ReelResult<EncodedArtifact> {
        let Some(mut session) = self.session.take() else {
            return Err(ReelError::encoding_failed("encoder is not open"));
        };
        if session.frames == 0 {
            let artifact = session.cfg.empty_artifact();
            let _ = session.teardown();
            return Ok(artifact);
        }

        drop(session.queue.take());
        let written = match session.writer.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| "ffmpeg writer thread panicked".to_owned())
                .and_then(|r| r.map_err(|e| format!("failed to write frames to ffmpeg: {e}"))),
            None => Ok(()),
        };
        let status = session.child.wait();
        let stderr = session.drain_stderr();

        let failure = match (written, status) {
            (Err(e), _) => Some(e),
            (Ok(()), Err(e)) => Some(format!("failed to wait for ffmpeg to finish: {e}")),
            (Ok(()), Ok(status)) if !status.success() => {
                Some(format!("ffmpeg exited with status {status}"))
            }
            _ => None,
        };
        if let Some(what) = failure {
            tracing::error!(stderr = %stderr, "{what}");
            return Err(ReelError::encoding_failed(if stderr.is_empty() {
                what
            } else {
                format!("{what}: {stderr}")
            }));
        }

        let path = session
            .output
            .0
            .clone()
            .ok_or_else(|| ReelError::encoding_failed("ffmpeg output path missing"))?;
        let bytes = std::fs::read(&path).map_err(|e| {
            ReelError::encoding_failed(format!(
                "failed to read ffmpeg output '{}': {e}",
                path.display()
            ))
        })?;
        let mut artifact = session.cfg.empty_artifact();
        artifact.bytes = bytes;
        tracing::info!(
            frames = session.frames,
            bytes = artifact.bytes.len(),
            "encoding finished"
        );
        Ok(artifact)
    }

    fn abort(&mut self) {
        if let Some(session) = self.session.take() {
            let frames = session.frames;
            let _ = session.teardown();
            tracing::debug!(frames, "ffmpeg session aborted");
        }
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        self.abort();
    }
}

impl Session {
    /// Kill `ffmpeg`, stop the writer and return whatever it printed. Scratch files are removed
    /// when `self` drops.
    fn teardown(mut self) -> String {
        drop(self.queue.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(handle) = self.writer.take() {
            let _ = handle.join();
        }
        self.drain_stderr()
    }

    fn drain_stderr(&mut self) -> String {
        match self.stderr_drain.take().map(JoinHandle::join) {
            Some(Ok(Ok(bytes))) => String::from_utf8_lossy(&bytes).trim().to_owned(),
            _ => String::new(),
        }
    }
}

/// Command line for one session, after the `ffmpeg` program name.
///
/// Input 0 is raw RGBA on stdin; narration clips follow as inputs `1..`.
pub(crate) fn ffmpeg_args(cfg: &EncoderConfig, clips: &[PathBuf], out: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();
    let mut push = |s: &str| args.push(OsString::from(s));

    for a in ["-y", "-loglevel", "error", "-f", "rawvideo", "-pix_fmt", "rgba"] {
        push(a);
    }
    push("-s");
    push(&format!("{}x{}", cfg.canvas.width, cfg.canvas.height));
    // For rawvideo input, `-r` before `-i` sets the input framerate.
    push("-r");
    push(&format!("{}/{}", cfg.fps.num, cfg.fps.den));
    push("-i");
    push("pipe:0");
    for clip in clips {
        args.push(OsString::from("-i"));
        args.push(clip.as_os_str().to_owned());
    }

    let mut push = |s: &str| args.push(OsString::from(s));
    match narration_filter_graph(&cfg.narration, cfg.fps, 1) {
        Some(graph) => {
            push("-filter_complex");
            push(&graph);
            for a in ["-map", "0:v", "-map", "[aout]", "-c:a"] {
                push(a);
            }
            push(cfg.container.audio_codec());
            push("-b:a");
            push("128k");
        }
        None => push("-an"),
    }

    push("-c:v");
    push(cfg.container.video_codec());
    push("-b:v");
    push(&cfg.bitrate_bps.to_string());
    push("-pix_fmt");
    push("yuv420p");
    match cfg.container {
        Container::WebM => {
            for a in ["-deadline", "realtime", "-row-mt", "1", "-f", "webm"] {
                push(a);
            }
        }
        Container::Mp4 => {
            for a in ["-movflags", "+faststart", "-f", "mp4"] {
                push(a);
            }
        }
    }
    args.push(out.as_os_str().to_owned());
    args
}

/// Flatten premultiplied RGBA8 over an opaque background.
///
/// `dst` and `src_premul` must have equal length; trailing bytes beyond the shorter are ignored.
pub(crate) fn flatten_premul_over_bg(dst: &mut [u8], src_premul: &[u8], bg: Rgba8) {
    let bg_r = u16::from(bg.r);
    let bg_g = u16::from(bg.g);
    let bg_b = u16::from(bg.b);

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        d[0] = (u16::from(s[0]) + mul_div255_u16(bg_r, inv)).min(255) as u8;
        d[1] = (u16::from(s[1]) + mul_div255_u16(bg_g, inv)).min(255) as u8;
        d[2] = (u16::from(s[2]) + mul_div255_u16(bg_b, inv)).min(255) as u8;
        d[3] = 255;
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn ffmpeg_has_encoder(name: &str) -> bool {
    Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .stderr(Stdio::null())
        .output()
        .map(|out| {
            out.status.success() && encoder_listed(&String::from_utf8_lossy(&out.stdout), name)
        })
        .unwrap_or(false)
}

/// Look for `name` in the second column of `ffmpeg -encoders` output.
pub(crate) fn encoder_listed(listing: &str, name: &str) -> bool {
    listing
        .lines()
        .any(|line| line.split_whitespace().nth(1) == Some(name))
}

fn scratch_path(dir: &Path, tag: &str, ext: &str) -> PathBuf {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    dir.join(format!(
        "adreel_{}_{}_{tag}.{ext}",
        std::process::id(),
        NEXT.fetch_add(1, Ordering::Relaxed)
    ))
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
