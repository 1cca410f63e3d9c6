use crate::foundation::core::{CANVAS_1080P, Canvas, FrameIndex};
use crate::foundation::error::ReelResult;
use crate::pipeline::state::RenderState;
use crate::render::frame::Frame;
use crate::render::raster::{
    canvas_dims_u16, diagonal_gradient_rgba8, image_from_premul_bytes, to_cpu_rect,
};
use crate::render::style::FrameStyle;
use crate::text::face::{FontFace, StyledMeasure, TextStyle};
use crate::text::wrap::{LayoutResult, layout_block};
use crate::timeline::scene::Scene;

/// Composites one frame: gradient background, title, wrapped scene text, progress bar.
///
/// Output depends only on the arguments to [`FrameRenderer::render`]; the cached background,
/// raster context and pixmap are reused between frames but never change what is drawn.
pub struct FrameRenderer {
    canvas: Canvas,
    dims: (u16, u16),
    style: FrameStyle,
    face: Box<dyn FontFace>,

    ctx: Option<vello_cpu::RenderContext>,
    pixmap: Option<vello_cpu::Pixmap>,
    background: Option<vello_cpu::Image>,
}

impl FrameRenderer {
    /// Renderer for the fixed 1920x1080 canvas.
    pub fn new(face: Box<dyn FontFace>) -> ReelResult<Self> {
        Self::with_canvas(face, CANVAS_1080P)
    }

    /// Renderer for a custom canvas. Sizes and margins scale with the canvas width.
    pub fn with_canvas(face: Box<dyn FontFace>, canvas: Canvas) -> ReelResult<Self> {
        let dims = canvas_dims_u16(canvas)?;
        Ok(Self {
            canvas,
            dims,
            style: FrameStyle::for_canvas(canvas),
            face,
            ctx: None,
            pixmap: None,
            background: None,
        })
    }

    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Frame style in effect.
    pub fn style(&self) -> &FrameStyle {
        &self.style
    }

    /// Wrap and place scene text exactly as [`FrameRenderer::render`] draws it.
    pub fn layout_scene_text(&mut self, text: &str) -> LayoutResult {
        let style = self.style;
        let mut metrics = StyledMeasure::new(self.face.as_mut(), style.body);
        layout_block(
            text,
            style.body_max_width,
            &mut metrics,
            style.body_center_y,
            style.line_height,
        )
    }

    /// Build the background and raster surfaces up front so primitive failures surface before
    /// any frame is produced.
    pub fn prepare(&mut self) -> ReelResult<()> {
        self.background_paint()?;
        let (w, h) = self.dims;
        if self.ctx.is_none() {
            self.ctx = Some(vello_cpu::RenderContext::new(w, h));
        }
        if self.pixmap.is_none() {
            self.pixmap = Some(vello_cpu::Pixmap::new(w, h));
        }
        Ok(())
    }

    /// Produce exactly one frame for `state`.
    ///
    /// `scene` is the scene at `state.scene_index`; the progress fill reflects
    /// `state.scene_index` completed scenes out of `total_scenes`.
    #[tracing::instrument(level = "trace", skip(self, scene, title), fields(seq = seq.0))]
    pub fn render(
        &mut self,
        seq: FrameIndex,
        state: &RenderState,
        scene: &Scene,
        title: &str,
        total_scenes: usize,
    ) -> ReelResult<Frame> {
        let background = self.background_paint()?;
        let body = self.layout_scene_text(scene.text());
        let (w16, h16) = self.dims;

        let mut ctx = match self.ctx.take() {
            Some(ctx) => ctx,
            None => vello_cpu::RenderContext::new(w16, h16),
        };
        ctx.reset();
        if let Err(e) = self.compose(&mut ctx, background, &body, state, title, total_scenes) {
            self.ctx = Some(ctx);
            return Err(e);
        }

        let mut pixmap = match self.pixmap.take() {
            Some(p) => p,
            None => vello_cpu::Pixmap::new(w16, h16),
        };
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);
        let frame = Frame {
            seq,
            width: self.canvas.width,
            height: self.canvas.height,
            data: pixmap.data_as_u8_slice().to_vec(),
        };

        self.ctx = Some(ctx);
        self.pixmap = Some(pixmap);
        Ok(frame)
    }

    /// Drop raster surfaces and the cached background.
    pub fn release(&mut self) {
        self.ctx = None;
        self.pixmap = None;
        self.background = None;
    }

    /// Draw back to front: background, title, scene text, progress.
    fn compose(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        background: vello_cpu::Image,
        body: &LayoutResult,
        state: &RenderState,
        title: &str,
        total_scenes: usize,
    ) -> ReelResult<()> {
        let style = self.style;
        let w = f64::from(self.canvas.width);
        let h = f64::from(self.canvas.height);

        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(background);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));

        self.draw_centered(ctx, title, &style.title, style.title_baseline_y)?;

        for line in &body.lines {
            let x = (w - f64::from(line.width)) / 2.0;
            self.face
                .fill_line(ctx, &line.text, &style.body, x, f64::from(line.baseline_y))?;
        }

        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(style.track_color.to_cpu_color());
        ctx.fill_rect(&to_cpu_rect(style.track));
        let fill_w = style.progress_fill_width(state.scene_index, total_scenes);
        if fill_w > 0.0 {
            let mut fill = style.track;
            fill.x1 = fill.x0 + fill_w;
            ctx.set_paint(style.fill_color.to_cpu_color());
            ctx.fill_rect(&to_cpu_rect(fill));
        }
        Ok(())
    }

    fn draw_centered(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        text: &str,
        style: &TextStyle,
        baseline_y: f32,
    ) -> ReelResult<()> {
        // Faces draw single lines; line breaks and runs of whitespace collapse to one space.
        let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            return Ok(());
        }
        let width = f64::from(self.face.measure(&line, style));
        let x = (f64::from(self.canvas.width) - width) / 2.0;
        self.face
            .fill_line(ctx, &line, style, x, f64::from(baseline_y))
    }

    fn background_paint(&mut self) -> ReelResult<vello_cpu::Image> {
        if let Some(img) = self.background.clone() {
            return Ok(img);
        }
        let bytes = diagonal_gradient_rgba8(
            self.canvas,
            self.style.gradient_start,
            self.style.gradient_end,
        );
        let img = image_from_premul_bytes(&bytes, self.canvas)?;
        self.background = Some(img.clone());
        Ok(img)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/renderer.rs"]
mod tests;
