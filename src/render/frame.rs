use crate::foundation::core::FrameIndex;
use crate::foundation::math::Fnv1a64;

/// A rendered frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha**, tightly packed, row-major. `seq` increases by one for every
/// frame produced in a run, starting at 0.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Output sequence number.
    pub seq: FrameIndex,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, premultiplied.
    pub data: Vec<u8>,
}

impl Frame {
    /// Read one premultiplied pixel. Out-of-bounds reads return transparent black.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0, 0];
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        match self.data.get(i..i + 4) {
            Some(px) => [px[0], px[1], px[2], px[3]],
            None => [0, 0, 0, 0],
        }
    }

    /// Content digest over dimensions and pixels (sequence number excluded).
    pub fn digest(&self) -> u64 {
        let mut h = Fnv1a64::new_default();
        h.write_u64(u64::from(self.width));
        h.write_u64(u64::from(self.height));
        h.write_bytes(&self.data);
        h.finish()
    }
}
