use crate::{
    content::settings::{HorizontalAlign, Margins, SpacingMode, TextStyle, VerticalAnchor},
    foundation::core::{Canvas, Point, Rect},
    text::glyph::GlyphRenderer,
};

/// Literal delimiter that splits one caption into several lines.
pub const LINE_DELIMITER: &str = "||";

/// Distributed anchors keep at least this fraction of the canvas height clear at top and bottom.
const DISTRIBUTED_MIN_MARGIN: f64 = 0.05;

/// Overflow below this many pixels is float noise from gap compression.
const OVERFLOW_EPSILON: f64 = 1e-6;

/// One positioned line of text.
#[derive(Clone, Debug, PartialEq)]
pub struct LaidLine {
    pub text: String,
    /// Pen origin of the first glyph.
    pub baseline: Point,
    /// Measured advance width at the target font size.
    pub width: f64,
}

/// A caption that does not fit inside the margins even with its line gaps compressed to zero.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutOverflow {
    pub caption: String,
    pub lines: usize,
    /// Pixels by which the tallest block exceeds the usable height.
    pub vertical: f64,
    /// Pixels by which the widest line exceeds the usable width.
    pub horizontal: f64,
}

/// Positioned lines of one caption.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionLayout {
    pub lines: Vec<LaidLine>,
    pub overflow: Option<LayoutOverflow>,
}

/// Splits a caption on [`LINE_DELIMITER`], trims every part and appends `extra_lines`.
///
/// Never returns an empty list.
pub fn split_caption(text: &str, extra_lines: &[String]) -> Vec<String> {
    let mut lines: Vec<String> = text
        .split(LINE_DELIMITER)
        .map(|part| part.trim().to_string())
        .collect();
    lines.extend(extra_lines.iter().map(|l| l.trim().to_string()));
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// The canvas minus its margins, in pixels.
pub fn usable_rect(canvas: Canvas, margins: &Margins) -> Rect {
    let size = canvas.size();
    Rect::new(
        margins.left * size.width,
        margins.top * size.height,
        size.width - margins.right * size.width,
        size.height - margins.bottom * size.height,
    )
}

/// Greedy word wrap at spaces so every line measures at most `max_width`.
///
/// A single word wider than `max_width` stays on a line of its own.
pub fn wrap_line(line: &str, max_width: f64, measure: impl Fn(&str) -> f64) -> Vec<String> {
    if measure(line) <= max_width {
        return vec![line.to_string()];
    }
    let mut out = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if measure(&candidate) <= max_width {
            current = candidate;
        } else {
            out.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() || out.is_empty() {
        out.push(current);
    }
    out
}

/// Lays a caption out on `canvas` around `anchor` (pixels).
///
/// Stacked blocks hang off the anchor per `style.vertical_anchor`; distributed parts ignore the
/// anchor's y and sit on evenly spaced rows. Both share the anchor's x.
///
/// Text that cannot fit is pinned to the top-left of the usable area and reported in
/// [`CaptionLayout::overflow`] with a warning.
pub fn layout(
    caption: &str,
    extra_lines: &[String],
    canvas: Canvas,
    style: &TextStyle,
    anchor: Point,
    renderer: &GlyphRenderer<'_>,
) -> CaptionLayout {
    let usable = usable_rect(canvas, &style.margins);
    let parts = split_caption(caption, extra_lines);
    let wrap = |part: &str| -> Vec<String> {
        if style.wrap {
            wrap_line(part, usable.width(), |s| renderer.measure(s))
        } else {
            vec![part.to_string()]
        }
    };

    let mut out = Vec::new();
    let mut vertical = 0.0_f64;
    let mut horizontal = 0.0_f64;
    match style.spacing {
        SpacingMode::Stacked => {
            let lines: Vec<String> = parts.iter().flat_map(|p| wrap(p)).collect();
            let block = Block::new(lines.len(), style, renderer, usable.height());
            let top = match style.vertical_anchor {
                VerticalAnchor::Top => anchor.y,
                VerticalAnchor::Center => anchor.y - block.height() / 2.0,
                VerticalAnchor::Bottom => anchor.y - block.height(),
            };
            let top = clamp_span(top, block.height(), usable.y0, usable.y1);
            vertical = vertical.max(block.height() - usable.height());
            let widest = block.place(
                &lines,
                top,
                anchor.x,
                style.horizontal_align,
                usable,
                renderer,
                &mut out,
            );
            horizontal = horizontal.max(widest - usable.width());
        }
        SpacingMode::Distributed => {
            let size = canvas.size();
            let top = style.margins.top.max(DISTRIBUTED_MIN_MARGIN) * size.height;
            let bottom = (1.0 - style.margins.bottom.max(DISTRIBUTED_MIN_MARGIN)) * size.height;
            let span = bottom - top;
            let n = parts.len() as f64;
            for (i, part) in parts.iter().enumerate() {
                let lines = wrap(part);
                let block = Block::new(lines.len(), style, renderer, usable.height());
                let center = top + (i as f64 + 1.0) * span / (n + 1.0);
                let block_top =
                    clamp_span(center - block.height() / 2.0, block.height(), usable.y0, usable.y1);
                vertical = vertical.max(block.height() - usable.height());
                let widest = block.place(
                    &lines,
                    block_top,
                    anchor.x,
                    style.horizontal_align,
                    usable,
                    renderer,
                    &mut out,
                );
                horizontal = horizontal.max(widest - usable.width());
            }
        }
    }

    let overflow = (vertical > OVERFLOW_EPSILON || horizontal > OVERFLOW_EPSILON).then(|| {
        tracing::warn!(
            caption,
            lines = out.len(),
            vertical_px = vertical,
            horizontal_px = horizontal,
            "caption overflows the margins"
        );
        LayoutOverflow {
            caption: caption.to_string(),
            lines: out.len(),
            vertical,
            horizontal,
        }
    });
    CaptionLayout {
        lines: out,
        overflow,
    }
}

/// Vertical metrics of a run of stacked lines.
struct Block {
    lines: usize,
    ascent: f64,
    line_height: f64,
    gap: f64,
}

impl Block {
    /// Compresses the inter-line gap (down to zero) until the block fits `max_height`.
    fn new(lines: usize, style: &TextStyle, renderer: &GlyphRenderer<'_>, max_height: f64) -> Self {
        let metrics = renderer.metrics();
        let line_height = metrics.line_height();
        let mut gap = style.line_gap * style.font_size;
        if lines > 1 {
            let gaps = (lines - 1) as f64;
            let natural = lines as f64 * line_height + gaps * gap;
            if natural > max_height {
                gap = ((max_height - lines as f64 * line_height) / gaps).clamp(0.0, gap);
            }
        }
        Self {
            lines,
            ascent: metrics.ascent(),
            line_height,
            gap,
        }
    }

    fn height(&self) -> f64 {
        let n = self.lines as f64;
        n * self.line_height + (n - 1.0).max(0.0) * self.gap
    }

    /// Pushes one [`LaidLine`] per entry of `lines` and returns the widest measured width.
    #[allow(clippy::too_many_arguments)]
    fn place(
        &self,
        lines: &[String],
        top: f64,
        anchor_x: f64,
        align: HorizontalAlign,
        usable: Rect,
        renderer: &GlyphRenderer<'_>,
        out: &mut Vec<LaidLine>,
    ) -> f64 {
        let mut widest = 0.0_f64;
        for (i, text) in lines.iter().enumerate() {
            let width = renderer.measure(text);
            widest = widest.max(width);
            let x = match align {
                HorizontalAlign::Left => anchor_x,
                HorizontalAlign::Center => anchor_x - width / 2.0,
                HorizontalAlign::Right => anchor_x - width,
            };
            let x = clamp_span(x, width, usable.x0, usable.x1);
            let y = top + i as f64 * (self.line_height + self.gap) + self.ascent;
            out.push(LaidLine {
                text: text.clone(),
                baseline: Point::new(x, y),
                width,
            });
        }
        widest
    }
}

/// Moves `[start, start + len]` inside `[lo, hi]`; spans longer than the range pin to `lo`.
fn clamp_span(start: f64, len: f64, lo: f64, hi: f64) -> f64 {
    if len >= hi - lo {
        lo
    } else {
        start.clamp(lo, hi - len)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/layout.rs"]
mod tests;
