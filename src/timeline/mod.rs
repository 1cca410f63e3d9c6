//! Scene model and timeline.

pub(crate) mod scene;
pub(crate) mod scene_timeline;
pub(crate) mod script;
