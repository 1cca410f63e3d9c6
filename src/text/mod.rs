//! Text metrics, typefaces and greedy word wrap.

pub(crate) mod face;
pub(crate) mod wrap;
