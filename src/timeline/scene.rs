use std::fmt;
use std::sync::Arc;

/// Opaque handle to an already-fetched narration clip (encoded audio bytes).
///
/// The pipeline never decodes the clip itself; it is handed to the encoder, which attaches it to
/// the scene's span of the output.
#[derive(Clone, PartialEq, Eq)]
pub struct NarrationRef {
    label: String,
    bytes: Arc<[u8]>,
}

impl NarrationRef {
    /// Wrap encoded audio bytes. `label` is only used for diagnostics.
    pub fn from_bytes(label: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            label: label.into(),
            bytes: bytes.into(),
        }
    }

    /// Diagnostic label (usually the source path).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Encoded audio bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for NarrationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NarrationRef")
            .field("label", &self.label)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// One timed segment of the advertisement.
///
/// Scenes are immutable; build them with [`Scene::new`] and hand them to a
/// [`SceneTimeline`](crate::SceneTimeline), which validates durations.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    text: String,
    duration_secs: f64,
    narration: Option<NarrationRef>,
}

impl Scene {
    /// Create a scene without narration.
    pub fn new(text: impl Into<String>, duration_secs: f64) -> Self {
        Self {
            text: text.into(),
            duration_secs,
            narration: None,
        }
    }

    /// Attach (or clear) the narration clip.
    pub fn with_narration(mut self, narration: Option<NarrationRef>) -> Self {
        self.narration = narration;
        self
    }

    /// Display text. May be empty, in which case frames carry no scene text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Nominal duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Narration clip, if one was resolved for this scene.
    pub fn narration(&self) -> Option<&NarrationRef> {
        self.narration.as_ref()
    }
}
