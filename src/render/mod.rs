//! CPU frame compositing powered by `vello_cpu`.

pub(crate) mod frame;
pub(crate) mod raster;
pub(crate) mod renderer;
pub(crate) mod style;
