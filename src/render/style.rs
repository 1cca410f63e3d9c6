use crate::foundation::core::{Canvas, FRAME_WIDTH, Rect, Rgba8};
use crate::text::face::TextStyle;

const GRADIENT_START: Rgba8 = Rgba8::rgb(0x66, 0x7e, 0xea);
const GRADIENT_END: Rgba8 = Rgba8::rgb(0x76, 0x4b, 0xa2);
const WHITE: Rgba8 = Rgba8::rgb(255, 255, 255);
// 30% white.
const TRACK: Rgba8 = Rgba8::rgba(255, 255, 255, 77);

/// Fixed look of every frame, in canvas pixels.
///
/// Values are authored for 1920x1080 and scale linearly with canvas width.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStyle {
    /// Top-left background color.
    pub gradient_start: Rgba8,
    /// Bottom-right background color.
    pub gradient_end: Rgba8,
    /// Product title style.
    pub title: TextStyle,
    /// Baseline of the centered title.
    pub title_baseline_y: f32,
    /// Scene text style.
    pub body: TextStyle,
    /// Maximum width of a scene text line.
    pub body_max_width: f32,
    /// Vertical anchor the scene text block is centered on.
    pub body_center_y: f32,
    /// Distance between scene text baselines.
    pub line_height: f32,
    /// Progress track rectangle.
    pub track: Rect,
    /// Progress track color.
    pub track_color: Rgba8,
    /// Progress fill color.
    pub fill_color: Rgba8,
}

impl FrameStyle {
    /// Style for `canvas`.
    pub fn for_canvas(canvas: Canvas) -> Self {
        let s = canvas.width as f32 / FRAME_WIDTH as f32;
        let w = canvas.width as f32;
        let h = canvas.height as f32;
        let track_margin = 50.0 * s;

        Self {
            gradient_start: GRADIENT_START,
            gradient_end: GRADIENT_END,
            title: TextStyle {
                size_px: 80.0 * s,
                bold: true,
                color: WHITE,
            },
            title_baseline_y: 150.0 * s,
            body: TextStyle {
                size_px: 48.0 * s,
                bold: false,
                color: WHITE,
            },
            body_max_width: w - 200.0 * s,
            body_center_y: h / 2.0 - 50.0 * s,
            line_height: 60.0 * s,
            track: Rect::new(
                f64::from(track_margin),
                f64::from(h - track_margin),
                f64::from(w - track_margin),
                f64::from(h - track_margin + 10.0 * s),
            ),
            track_color: TRACK,
            fill_color: WHITE,
        }
    }

    /// Width of the progress fill after `scenes_completed` of `total_scenes`.
    ///
    /// Progress counts completed scenes, not time within the current scene. Zero scenes means no
    /// fill.
    pub fn progress_fill_width(&self, scenes_completed: usize, total_scenes: usize) -> f64 {
        if total_scenes == 0 {
            return 0.0;
        }
        let done = scenes_completed.min(total_scenes);
        self.track.width() * done as f64 / total_scenes as f64
    }
}
