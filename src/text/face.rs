use crate::foundation::core::Rgba8;
use crate::foundation::error::{ReelError, ReelResult};
use crate::text::wrap::TextMeasure;
use std::path::Path;

/// Size, weight and color of a run of text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    /// Font size in pixels.
    pub size_px: f32,
    /// Use the bold face.
    pub bold: bool,
    /// Fill color.
    pub color: Rgba8,
}

/// A typeface that can measure and draw single lines of text onto a `vello_cpu` context.
///
/// Measurement and drawing must agree: a line drawn at `x` covers `[x, x + measure(text))`.
/// `text` is a single line; callers strip line breaks before measuring or drawing.
pub trait FontFace {
    /// Advance width of `text` set on one line.
    fn measure(&mut self, text: &str, style: &TextStyle) -> f32;

    /// Fill one line of text with its left edge at `x` and its baseline at `baseline_y`.
    fn fill_line(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        text: &str,
        style: &TextStyle,
        x: f64,
        baseline_y: f64,
    ) -> ReelResult<()>;
}

/// [`TextMeasure`] adapter binding a face to one style.
pub struct StyledMeasure<'a> {
    face: &'a mut dyn FontFace,
    style: TextStyle,
}

impl<'a> StyledMeasure<'a> {
    /// Measure with `face` at `style`.
    pub fn new(face: &'a mut dyn FontFace, style: TextStyle) -> Self {
        Self { face, style }
    }
}

impl TextMeasure for StyledMeasure<'_> {
    fn measure(&mut self, text: &str) -> f32 {
        self.face.measure(text, &self.style)
    }
}

struct RegisteredFont {
    family: String,
    data: vello_cpu::peniko::FontData,
}

/// Real typeface backed by Parley shaping and `vello_cpu` glyph rasterization.
pub struct ParleyFace {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    regular: RegisteredFont,
    bold: Option<RegisteredFont>,
}

impl ParleyFace {
    /// Build a face from raw TTF/OTF bytes.
    pub fn from_bytes(font_bytes: Vec<u8>) -> ReelResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let regular = register_font(&mut font_ctx, font_bytes)?;
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            regular,
            bold: None,
        })
    }

    /// Read a face from a font file.
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        Self::from_bytes(read_font(path.as_ref())?)
    }

    /// Register a dedicated bold face used for bold styles.
    ///
    /// Without one, bold text is shaped with the regular face.
    pub fn with_bold_bytes(mut self, font_bytes: Vec<u8>) -> ReelResult<Self> {
        self.bold = Some(register_font(&mut self.font_ctx, font_bytes)?);
        Ok(self)
    }

    /// Read the bold face from a font file.
    pub fn with_bold_path(self, path: impl AsRef<Path>) -> ReelResult<Self> {
        let bytes = read_font(path.as_ref())?;
        self.with_bold_bytes(bytes)
    }

    /// Regular family name as registered with Parley.
    pub fn family_name(&self) -> &str {
        &self.regular.family
    }

    fn face_for(&self, style: &TextStyle) -> &RegisteredFont {
        match (&self.bold, style.bold) {
            (Some(bold), true) => bold,
            _ => &self.regular,
        }
    }

    fn layout_line(&mut self, text: &str, style: &TextStyle) -> parley::Layout<()> {
        let family = self.face_for(style).family.clone();
        let weight = if style.bold {
            parley::style::FontWeight::BOLD
        } else {
            parley::style::FontWeight::NORMAL
        };

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(style.size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(weight));

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }
}

impl FontFace for ParleyFace {
    fn measure(&mut self, text: &str, style: &TextStyle) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        self.layout_line(text, style).width()
    }

    fn fill_line(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        text: &str,
        style: &TextStyle,
        x: f64,
        baseline_y: f64,
    ) -> ReelResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        let layout = self.layout_line(text, style);
        let Some(first) = layout.lines().next() else {
            return Ok(());
        };
        let line_baseline = f64::from(first.metrics().baseline);
        let font = &self.face_for(style).data;

        ctx.set_transform(vello_cpu::kurbo::Affine::translate((
            x,
            baseline_y - line_baseline,
        )));
        ctx.set_paint(style.color.to_cpu_color());
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        Ok(())
    }
}

fn read_font(path: &Path) -> ReelResult<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| ReelError::render(format!("read font '{}': {e}", path.display())))
}

fn register_font(
    font_ctx: &mut parley::FontContext,
    font_bytes: Vec<u8>,
) -> ReelResult<RegisteredFont> {
    let families = font_ctx
        .collection
        .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
    let family_id = families
        .first()
        .map(|(id, _)| *id)
        .ok_or_else(|| ReelError::render("no font families registered from font bytes"))?;
    let family = font_ctx
        .collection
        .family_name(family_id)
        .ok_or_else(|| ReelError::render("registered font family has no name"))?
        .to_string();
    let data = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);
    Ok(RegisteredFont { family, data })
}

/// Font-less placeholder face: every visible character is a solid block.
///
/// Widths are exact multiples of `advance_em * size_px`, which makes layouts reproducible on any
/// host. Used for draft renders and tests when no font file is available.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockFace {
    /// Advance per character as a fraction of the font size.
    pub advance_em: f32,
}

impl Default for BlockFace {
    fn default() -> Self {
        Self { advance_em: 0.6 }
    }
}

impl BlockFace {
    fn advance_px(&self, style: &TextStyle) -> f32 {
        style.size_px * self.advance_em
    }
}

impl FontFace for BlockFace {
    fn measure(&mut self, text: &str, style: &TextStyle) -> f32 {
        text.chars().count() as f32 * self.advance_px(style)
    }

    fn fill_line(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        text: &str,
        style: &TextStyle,
        x: f64,
        baseline_y: f64,
    ) -> ReelResult<()> {
        let adv = f64::from(self.advance_px(style));
        let cap = f64::from(style.size_px) * 0.7;
        // Bold blocks fill more of the advance.
        let ink = if style.bold { 0.9 } else { 0.7 };

        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(style.color.to_cpu_color());
        for (i, c) in text.chars().enumerate() {
            if c.is_whitespace() {
                continue;
            }
            let x0 = x + i as f64 * adv + adv * (1.0 - ink) / 2.0;
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                x0,
                baseline_y - cap,
                x0 + adv * ink,
                baseline_y,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/face.rs"]
mod tests;
