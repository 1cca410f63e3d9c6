//! Streaming encoders: the `StreamEncoder` contract, an in-memory reference encoder and the
//! system `ffmpeg` encoder.

pub(crate) mod audio;
pub(crate) mod encoder;
pub(crate) mod ffmpeg;
