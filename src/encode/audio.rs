use crate::foundation::core::Fps;
use crate::timeline::scene::NarrationRef;
use crate::timeline::scene_timeline::SceneTimeline;
use std::fmt::Write as _;

/// Output audio sample rate.
pub(crate) const AUDIO_SAMPLE_RATE: u32 = 48_000;

/// Narration slot for one scene: the scene's frame span and its clip, if any.
#[derive(Clone, Debug, PartialEq)]
pub struct NarrationCue {
    /// Frames the scene occupies in the output.
    pub frames: u64,
    /// Clip to play from the start of the scene. `None` is silence.
    pub clip: Option<NarrationRef>,
}

/// One cue per scene that renders at least one frame, in playback order.
pub(crate) fn cues_for_timeline(timeline: &SceneTimeline, fps: Fps) -> Vec<NarrationCue> {
    timeline
        .scenes()
        .iter()
        .enumerate()
        .filter_map(|(i, scene)| {
            let frames = timeline.frames_for_scene(i, fps);
            (frames > 0).then(|| NarrationCue {
                frames,
                clip: scene.narration().cloned(),
            })
        })
        .collect()
}

/// Return `true` when at least one cue carries a clip.
pub(crate) fn has_narration(cues: &[NarrationCue]) -> bool {
    cues.iter().any(|c| c.clip.is_some())
}

/// `ffmpeg` filter graph that lays the clips end to end on the video timeline.
///
/// Clip inputs are numbered from `first_input` in cue order, skipping silent cues. Each clip is
/// padded or cut to exactly `frames / fps` seconds; silent cues become `anullsrc` of the same
/// length. The graph's output pad is `[aout]`. Returns `None` when no cue has a clip.
pub(crate) fn narration_filter_graph(
    cues: &[NarrationCue],
    fps: Fps,
    first_input: usize,
) -> Option<String> {
    if !has_narration(cues) {
        return None;
    }

    let mut graph = String::new();
    let mut input = first_input;
    for (i, cue) in cues.iter().enumerate() {
        let secs = fps.frames_to_secs(cue.frames);
        if cue.clip.is_some() {
            let _ = write!(
                graph,
                "[{input}:a]aresample={AUDIO_SAMPLE_RATE},aformat=channel_layouts=stereo,\
                 apad,atrim=duration={secs:.6},asetpts=PTS-STARTPTS[a{i}];"
            );
            input += 1;
        } else {
            let _ = write!(
                graph,
                "anullsrc=r={AUDIO_SAMPLE_RATE}:cl=stereo,atrim=duration={secs:.6}[a{i}];"
            );
        }
    }
    for i in 0..cues.len() {
        let _ = write!(graph, "[a{i}]");
    }
    let _ = write!(graph, "concat=n={}:v=0:a=1[aout]", cues.len());
    Some(graph)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/audio.rs"]
mod tests;
