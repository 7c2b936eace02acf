use kurbo::{RoundedRect, Shape};
use rand::{Rng, rngs::StdRng};

use crate::{
    assets::decode::PreparedImage,
    content::{
        model::CaptionCell,
        settings::{Margins, Palette, Position, Settings, TextType},
    },
    foundation::{
        core::{Canvas, Point, Rect, Rgba8},
        error::{SlideError, SlideResult},
    },
    render::plan::{DrawOp, SlidePlan},
    text::{
        fallback::FallbackGlyphs,
        font::GlyphFace,
        glyph::{GlyphCoverageReport, GlyphPaint, GlyphRenderer},
        layout::{LaidLine, LayoutOverflow, layout},
    },
};

/// A slide ready for the backend, plus what was decided while building it.
#[derive(Clone, Debug)]
pub struct ComposedSlide {
    pub plan: SlidePlan,
    pub lines: Vec<LaidLine>,
    pub palette: Palette,
    pub anchor: Point,
    pub coverage: GlyphCoverageReport,
    /// Set when the caption did not fit inside the margins.
    pub overflow: Option<LayoutOverflow>,
}

/// Builds the draw plan for one slot: the base image filling the canvas, then the caption in the
/// style selected by `settings.text_type`.
///
/// All randomness (palette and anchor) comes from `rng`, which the caller seeds per slot.
pub fn compose_slide(
    base: &PreparedImage,
    caption: &CaptionCell,
    settings: &Settings,
    face: &dyn GlyphFace,
    fallback: &FallbackGlyphs,
    rng: &mut StdRng,
) -> SlideResult<ComposedSlide> {
    let canvas = Canvas::new(base.width, base.height)?;
    let style = &settings.style;

    if style.colors.is_empty() {
        return Err(SlideError::render(format!(
            "{} style has no colour palettes",
            settings.text_type.as_str()
        )));
    }
    let palette = style.colors[rng.random_range(0..style.colors.len())];
    let anchor = pick_anchor(rng, &style.position, &style.margins, canvas);

    let renderer = GlyphRenderer::new(face, style.font_size, fallback);
    let laid = layout(
        &caption.text,
        &caption.extra_lines,
        canvas,
        style,
        anchor,
        &renderer,
    );
    let lines = laid.lines;

    let mut plan = SlidePlan::new(canvas);
    let size = canvas.size();
    plan.push(DrawOp::Image {
        image: base.clone(),
        rect: Rect::new(0.0, 0.0, size.width, size.height),
    });

    let mut coverage = GlyphCoverageReport::default();
    let paint = match settings.text_type {
        TextType::Plain => GlyphPaint::Outlined {
            fill: palette.text,
            outline: palette.outline.unwrap_or(Rgba8::BLACK),
            width: style.style_value,
        },
        TextType::Highlight => {
            let background = palette.background.unwrap_or(Rgba8::WHITE);
            for line in &lines {
                if let Some(panel) =
                    highlight_panel(line, &renderer, style.highlight_padding, style.style_value)
                {
                    plan.push(DrawOp::FillPath {
                        path: panel,
                        color: background,
                    });
                }
            }
            GlyphPaint::Fill { fill: palette.text }
        }
    };

    for line in &lines {
        renderer.render_line(&mut plan, &line.text, line.baseline, paint, &mut coverage);
    }

    tracing::trace!(
        text_type = settings.text_type.as_str(),
        lines = lines.len(),
        ops = plan.ops.len(),
        "composed slide"
    );

    Ok(ComposedSlide {
        plan,
        lines,
        palette,
        anchor,
        coverage,
        overflow: laid.overflow,
    })
}

/// Draws the text anchor in pixels: a uniform pick in each range plus a uniform jitter, clamped
/// into the margins.
pub fn pick_anchor(
    rng: &mut StdRng,
    position: &Position,
    margins: &Margins,
    canvas: Canvas,
) -> Point {
    let [v_lo, v_hi] = position.vertical;
    let [h_lo, h_hi] = position.horizontal;
    let v = rng.random_range(v_lo..=v_hi);
    let h = rng.random_range(h_lo..=h_hi);
    let vj = jitter(rng, position.vertical_jitter);
    let hj = jitter(rng, position.horizontal_jitter);

    let fy = (v + vj).clamp(margins.top, 1.0 - margins.bottom);
    let fx = (h + hj).clamp(margins.left, 1.0 - margins.right);
    let size = canvas.size();
    Point::new(fx * size.width, fy * size.height)
}

fn jitter(rng: &mut StdRng, amount: f64) -> f64 {
    if amount > 0.0 {
        rng.random_range(-amount..=amount)
    } else {
        0.0
    }
}

/// Rounded panel behind one line: the line box grown by `padding`, corner radius capped at half
/// the shorter side. Blank lines get no panel.
fn highlight_panel(
    line: &LaidLine,
    renderer: &GlyphRenderer<'_>,
    padding: f64,
    radius: f64,
) -> Option<kurbo::BezPath> {
    if line.text.trim().is_empty() {
        return None;
    }
    let metrics = renderer.metrics();
    let bounds = Rect::new(
        line.baseline.x,
        line.baseline.y - metrics.ascent(),
        line.baseline.x + line.width,
        line.baseline.y + metrics.descent(),
    )
    .inflate(padding, padding);
    let radius = radius.min(bounds.width().min(bounds.height()) / 2.0).max(0.0);
    Some(RoundedRect::from_rect(bounds, radius).to_path(0.1))
}

#[cfg(test)]
#[path = "../../tests/unit/render/style.rs"]
mod tests;
