//! Narration lookup for scene scripts.
//!
//! Fetching runs per scene with bounded parallelism and completes before any frame is rendered.
//! A failed fetch leaves its scene silent instead of failing the run.

use crate::foundation::error::{ReelError, ReelResult};
use crate::timeline::scene::NarrationRef;
use crate::timeline::scene_timeline::SceneTimeline;
use crate::timeline::script::{ScriptDef, normalize_rel_path};
use anyhow::Context as _;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// One scene's narration lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NarrationRequest<'a> {
    /// Index of the scene in the script.
    pub scene_index: usize,
    /// Scene text, for sources that synthesize speech.
    pub text: &'a str,
    /// Narration reference from the script, if any.
    pub source: Option<&'a str>,
}

/// Anything that can produce a narration clip for a scene.
pub trait NarrationSource: Sync {
    /// Fetch the clip for `req`. `Ok(None)` means the scene has no narration.
    fn fetch(&self, req: &NarrationRequest<'_>) -> ReelResult<Option<NarrationRef>>;
}

/// Reads narration clips from files relative to a root directory.
#[derive(Clone, Debug)]
pub struct FileNarrationSource {
    root: PathBuf,
}

impl FileNarrationSource {
    /// Resolve clip paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory used when resolving clip paths.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl NarrationSource for FileNarrationSource {
    fn fetch(&self, req: &NarrationRequest<'_>) -> ReelResult<Option<NarrationRef>> {
        let Some(source) = req.source else {
            return Ok(None);
        };
        let norm = normalize_rel_path(source)?;
        let path = self.root.join(Path::new(&norm));
        let bytes = std::fs::read(&path)
            .with_context(|| format!("read narration clip from '{}'", path.display()))?;
        Ok(Some(NarrationRef::from_bytes(norm, bytes)))
    }
}

/// Source that never has narration.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoNarration;

impl NarrationSource for NoNarration {
    fn fetch(&self, _req: &NarrationRequest<'_>) -> ReelResult<Option<NarrationRef>> {
        Ok(None)
    }
}

/// Build a timeline from `script`, fetching every scene's narration on at most `jobs` threads.
///
/// Durations are validated before anything is fetched. Scene order is preserved. A fetch error
/// is logged and the scene proceeds without narration.
#[tracing::instrument(skip(script, source), fields(scenes = script.scenes.len()))]
pub fn resolve_narrations(
    script: &ScriptDef,
    source: &dyn NarrationSource,
    jobs: usize,
) -> ReelResult<SceneTimeline> {
    script.to_timeline()?;
    if jobs == 0 {
        return Err(ReelError::validation("narration jobs must be >= 1"));
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| ReelError::validation(format!("failed to build rayon thread pool: {e}")))?;

    let scenes = pool.install(|| {
        script
            .scenes
            .par_iter()
            .enumerate()
            .map(|(scene_index, def)| {
                let req = NarrationRequest {
                    scene_index,
                    text: &def.text,
                    source: def.narration.as_deref(),
                };
                let narration = match source.fetch(&req) {
                    Ok(clip) => clip,
                    Err(e) => {
                        tracing::warn!(scene_index, error = %e, "narration unavailable, scene will be silent");
                        None
                    }
                };
                def.to_scene().with_narration(narration)
            })
            .collect::<Vec<_>>()
    });

    let narrated = scenes.iter().filter(|s| s.narration().is_some()).count();
    tracing::debug!(narrated, "narration resolved");
    SceneTimeline::new(scenes)
}

#[cfg(test)]
#[path = "../../tests/unit/narration/mod.rs"]
mod tests;
