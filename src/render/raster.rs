use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::lerp_u8;
use std::sync::Arc;

/// Diagonal gradient from the top-left corner (`start`) to the bottom-right corner (`end`).
///
/// Each pixel center is projected onto the `(0,0) -> (w,h)` axis. Output is premultiplied RGBA8.
pub(crate) fn diagonal_gradient_rgba8(canvas: Canvas, start: Rgba8, end: Rgba8) -> Vec<u8> {
    let w = canvas.width as usize;
    let h = canvas.height as usize;
    let mut bytes = vec![0u8; canvas.rgba8_len()];
    let wf = canvas.width as f64;
    let hf = canvas.height as f64;
    let denom = (wf * wf + hf * hf).max(f64::MIN_POSITIVE);

    let s = start.to_premul_array();
    let e = end.to_premul_array();
    for y in 0..h {
        let py = (y as f64 + 0.5) * hf;
        for x in 0..w {
            let t = (((x as f64 + 0.5) * wf + py) / denom).clamp(0.0, 1.0);
            let idx = (y * w + x) * 4;
            bytes[idx] = lerp_u8(s[0], e[0], t);
            bytes[idx + 1] = lerp_u8(s[1], e[1], t);
            bytes[idx + 2] = lerp_u8(s[2], e[2], t);
            bytes[idx + 3] = lerp_u8(s[3], e[3], t);
        }
    }
    bytes
}

pub(crate) fn canvas_dims_u16(canvas: Canvas) -> ReelResult<(u16, u16)> {
    let w: u16 = canvas
        .width
        .try_into()
        .map_err(|_| ReelError::render("canvas width exceeds u16"))?;
    let h: u16 = canvas
        .height
        .try_into()
        .map_err(|_| ReelError::render("canvas height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(ReelError::render("canvas width/height must be non-zero"));
    }
    Ok((w, h))
}

fn pixmap_from_premul_bytes(bytes: &[u8], canvas: Canvas) -> ReelResult<vello_cpu::Pixmap> {
    let (w, h) = canvas_dims_u16(canvas)?;
    if bytes.len() != canvas.rgba8_len() {
        return Err(ReelError::render("pixmap byte len mismatch"));
    }
    // Pixmap stores PremulRgba8; our bytes are already premultiplied.
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(bytes.len() / 4);
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

pub(crate) fn image_from_premul_bytes(
    bytes: &[u8],
    canvas: Canvas,
) -> ReelResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(bytes, canvas)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

pub(crate) fn to_cpu_rect(r: crate::foundation::core::Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}
