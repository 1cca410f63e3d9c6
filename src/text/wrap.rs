/// Anything that can measure the advance width of a string in pixels.
pub trait TextMeasure {
    /// Pixel width of `text` when set on a single line.
    fn measure(&mut self, text: &str) -> f32;
}

/// Fixed-advance metrics: every character is `advance_px` wide.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonospaceMetrics {
    /// Advance per character in pixels.
    pub advance_px: f32,
}

impl TextMeasure for MonospaceMetrics {
    fn measure(&mut self, text: &str) -> f32 {
        text.chars().count() as f32 * self.advance_px
    }
}

/// One wrapped line and its measured width.
#[derive(Clone, Debug, PartialEq)]
pub struct WrappedLine {
    /// Line text, words joined by single spaces.
    pub text: String,
    /// Measured width in pixels.
    pub width: f32,
}

/// One positioned line of a [`LayoutResult`].
#[derive(Clone, Debug, PartialEq)]
pub struct LaidOutLine {
    /// Line text.
    pub text: String,
    /// Measured width in pixels.
    pub width: f32,
    /// Baseline y coordinate in canvas pixels.
    pub baseline_y: f32,
}

/// Wrapped and vertically placed lines for one block of text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutResult {
    /// Lines in reading order.
    pub lines: Vec<LaidOutLine>,
}

impl LayoutResult {
    /// Return `true` when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Greedy word wrap.
///
/// Words are separated by whitespace. A word is appended to the current line while
/// `line + " " + word` measures `<= max_width`; otherwise the current line is closed and the word
/// starts a new one. A word that is wider than `max_width` on its own is emitted alone on its own
/// line, unbroken. Empty or whitespace-only input yields no lines.
pub fn wrap_words<M: TextMeasure + ?Sized>(
    text: &str,
    max_width: f32,
    metrics: &mut M,
) -> Vec<WrappedLine> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0f32;

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            current_width = metrics.measure(&current);
            continue;
        }

        let candidate = format!("{current} {word}");
        let candidate_width = metrics.measure(&candidate);
        if candidate_width <= max_width {
            current = candidate;
            current_width = candidate_width;
        } else {
            out.push(WrappedLine {
                text: std::mem::take(&mut current),
                width: current_width,
            });
            current.push_str(word);
            current_width = metrics.measure(&current);
        }
    }

    if !current.is_empty() {
        out.push(WrappedLine {
            text: current,
            width: current_width,
        });
    }
    out
}

/// Wrap `text` and place the lines as a block vertically centered on `center_y`.
///
/// Consecutive baselines are `line_height` apart. A single line sits exactly on `center_y`.
pub fn layout_block<M: TextMeasure + ?Sized>(
    text: &str,
    max_width: f32,
    metrics: &mut M,
    center_y: f32,
    line_height: f32,
) -> LayoutResult {
    let wrapped = wrap_words(text, max_width, metrics);
    let n = wrapped.len();
    if n == 0 {
        return LayoutResult::default();
    }

    let first = center_y - (n - 1) as f32 * line_height / 2.0;
    let lines = wrapped
        .into_iter()
        .enumerate()
        .map(|(i, l)| LaidOutLine {
            text: l.text,
            width: l.width,
            baseline_y: first + i as f32 * line_height,
        })
        .collect();
    LayoutResult { lines }
}

#[cfg(test)]
#[path = "../../tests/unit/text/wrap.rs"]
mod tests;
