use crate::foundation::error::{ReelError, ReelResult};
use crate::timeline::scene::Scene;
use crate::timeline::scene_timeline::SceneTimeline;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// JSON-facing scene script, as produced by the script-generation step.
///
/// ```json
/// { "script": "...", "scenes": [{ "text": "Meet Acme", "duration": 5, "narration": "vo/01.mp3" }] }
/// ```
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptDef {
    /// Full ad copy. Informational only; frames are driven by `scenes`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// Scenes in playback order.
    pub scenes: Vec<SceneDef>,
}

/// One scene entry of a [`ScriptDef`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDef {
    /// Display text.
    pub text: String,
    /// Duration in seconds.
    pub duration: f64,
    /// Narration clip path, relative to the script file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
}

impl ScriptDef {
    /// Parse a script from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> ReelResult<Self> {
        serde_json::from_reader(r).map_err(|e| ReelError::serde(format!("parse scene script: {e}")))
    }

    /// Parse a script from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ReelError::validation(format!("open scene script '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Validated timeline of these scenes with narration left unresolved.
    pub fn to_timeline(&self) -> ReelResult<SceneTimeline> {
        SceneTimeline::new(self.scenes.iter().map(SceneDef::to_scene).collect())
    }
}

impl SceneDef {
    /// Scene carrying this entry's text and duration, without narration.
    pub fn to_scene(&self) -> Scene {
        Scene::new(self.text.clone(), self.duration)
    }
}

/// Normalize and validate script-relative narration paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> ReelResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(ReelError::validation("narration paths must be relative"));
    }
    if s.is_empty() {
        return Err(ReelError::validation("narration path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(ReelError::validation(
                "narration paths must not contain '..'",
            ));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(ReelError::validation(
            "narration path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/script.rs"]
mod tests;
