use std::collections::BTreeMap;

use kurbo::Shape;

use crate::{
    foundation::core::{BezPath, Point, Rect, Rgba8},
    render::plan::{DrawOp, SlidePlan},
    text::{
        fallback::{FALLBACK_SCALE, FallbackGlyphs},
        font::{GlyphFace, ScaledFace},
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunKind {
    /// Drawn from the primary font's outlines.
    Primary,
    /// Drawn code point by code point from fallback glyph assets.
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphRun {
    pub kind: RunKind,
    pub text: String,
}

/// Zero-width code points (ZWJ and variation selectors) that never get a placeholder of their own.
pub fn is_joiner(ch: char) -> bool {
    matches!(ch, '\u{200D}' | '\u{FE00}'..='\u{FE0F}')
}

/// Splits `text` into maximal runs by whether the primary font has a glyph for each code point.
///
/// Joiners the font lacks stay in the current run.
pub fn segment_runs(face: &dyn GlyphFace, text: &str) -> Vec<GlyphRun> {
    let mut runs: Vec<GlyphRun> = Vec::new();
    for ch in text.chars() {
        let kind = if face.has_glyph(ch) {
            RunKind::Primary
        } else if is_joiner(ch) {
            runs.last().map_or(RunKind::Primary, |r| r.kind)
        } else {
            RunKind::Fallback
        };
        match runs.last_mut() {
            Some(run) if run.kind == kind => run.text.push(ch),
            _ => runs.push(GlyphRun {
                kind,
                text: ch.to_string(),
            }),
        }
    }
    runs
}

/// How glyphs are painted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GlyphPaint {
    /// Stroke every primary glyph with `outline`, then fill with `fill`.
    Outlined {
        fill: Rgba8,
        outline: Rgba8,
        width: f64,
    },
    Fill { fill: Rgba8 },
}

impl GlyphPaint {
    fn fill(self) -> Rgba8 {
        match self {
            Self::Outlined { fill, .. } | Self::Fill { fill } => fill,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunRecord {
    pub kind: RunKind,
    pub text: String,
    pub start_x: f64,
    pub end_x: f64,
}

/// Result of drawing one line.
#[derive(Clone, Debug, PartialEq)]
pub struct LineRender {
    /// Pen position after the last run (same baseline as the start).
    pub cursor: Point,
    pub runs: Vec<RunRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnmappedGlyph {
    pub codepoint: u32,
    pub ch: char,
    pub font_family: String,
    pub count: usize,
}

/// Code points that had neither a primary glyph nor a fallback asset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphCoverageReport {
    missing: BTreeMap<u32, UnmappedGlyph>,
}

impl GlyphCoverageReport {
    pub fn record_unmapped(&mut self, ch: char, font_family: &str) {
        let codepoint = ch as u32;
        let entry = self.missing.entry(codepoint).or_insert(UnmappedGlyph {
            codepoint,
            ch,
            font_family: font_family.to_string(),
            count: 0,
        });
        entry.count = entry.count.saturating_add(1);
    }

    pub fn merge(&mut self, other: GlyphCoverageReport) {
        for (codepoint, missing) in other.missing {
            let entry = self.missing.entry(codepoint).or_insert(UnmappedGlyph {
                count: 0,
                ..missing.clone()
            });
            entry.count = entry.count.saturating_add(missing.count);
        }
    }

    pub fn unmapped(&self) -> Vec<UnmappedGlyph> {
        self.missing.values().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Draws mixed primary/fallback text onto a [`SlidePlan`].
pub struct GlyphRenderer<'a> {
    face: ScaledFace<'a>,
    fallback: &'a FallbackGlyphs,
}

impl<'a> GlyphRenderer<'a> {
    pub fn new(face: &'a dyn GlyphFace, font_size: f64, fallback: &'a FallbackGlyphs) -> Self {
        Self {
            face: ScaledFace::new(face, font_size),
            fallback,
        }
    }

    pub fn metrics(&self) -> ScaledFace<'a> {
        self.face
    }

    fn fallback_side(&self) -> f64 {
        self.face.font_size * FALLBACK_SCALE
    }

    fn char_advance(&self, kind: RunKind, ch: char) -> f64 {
        match (kind, self.face.face.glyph_id(ch)) {
            (RunKind::Primary, Some(gid)) => self.face.advance_px(gid),
            _ if is_joiner(ch) => 0.0,
            _ => self.fallback_side(),
        }
    }

    /// Line width as [`GlyphRenderer::render_line`] would advance it.
    pub fn measure(&self, text: &str) -> f64 {
        segment_runs(self.face.face, text)
            .iter()
            .flat_map(|run| run.text.chars().map(move |ch| (run.kind, ch)))
            .map(|(kind, ch)| self.char_advance(kind, ch))
            .sum()
    }

    /// Draws `text` with its baseline starting at `start` and returns the advanced pen.
    ///
    /// Unmapped code points are drawn as a placeholder box and recorded in `report`.
    pub fn render_line(
        &self,
        plan: &mut SlidePlan,
        text: &str,
        start: Point,
        paint: GlyphPaint,
        report: &mut GlyphCoverageReport,
    ) -> LineRender {
        let mut strokes = Vec::new();
        let mut fills = Vec::new();
        let mut records = Vec::new();
        let mut x = start.x;

        for run in segment_runs(self.face.face, text) {
            let start_x = x;
            match run.kind {
                RunKind::Primary => {
                    let mut path = BezPath::new();
                    for ch in run.text.chars() {
                        if let Some(gid) = self.face.face.glyph_id(ch)
                            && let Some(glyph) = self.face.face.outline(
                                gid,
                                Point::new(x, start.y),
                                self.face.scale(),
                            )
                        {
                            path.extend(glyph.elements().iter().copied());
                        }
                        x += self.char_advance(RunKind::Primary, ch);
                    }
                    if !path.elements().is_empty() {
                        if let GlyphPaint::Outlined { outline, width, .. } = paint
                            && width > 0.0
                        {
                            // Half the stroke sits under the fill.
                            strokes.push(DrawOp::StrokePath {
                                path: path.clone(),
                                color: outline,
                                width: width * 2.0,
                            });
                        }
                        fills.push(DrawOp::FillPath {
                            path,
                            color: paint.fill(),
                        });
                    }
                }
                RunKind::Fallback => {
                    for ch in run.text.chars() {
                        if is_joiner(ch) {
                            continue;
                        }
                        let rect = self.fallback_rect(x, start.y);
                        match self.fallback.get(ch) {
                            Some(image) => fills.push(DrawOp::Image {
                                image: image.clone(),
                                rect,
                            }),
                            None => {
                                let codepoint = format!("U+{:04X}", ch as u32);
                                tracing::warn!(
                                    codepoint = %codepoint,
                                    font = %self.face.face.family_name(),
                                    "unmapped glyph, drawing placeholder"
                                );
                                report.record_unmapped(ch, self.face.face.family_name());
                                fills.push(self.placeholder(rect, paint.fill()));
                            }
                        }
                        x += self.fallback_side();
                    }
                }
            }
            records.push(RunRecord {
                kind: run.kind,
                text: run.text,
                start_x,
                end_x: x,
            });
        }

        plan.extend(strokes);
        plan.extend(fills);
        LineRender {
            cursor: Point::new(x, start.y),
            runs: records,
        }
    }

    /// Square box of the fallback side, centred on the line box's vertical middle.
    fn fallback_rect(&self, x: f64, baseline: f64) -> Rect {
        let side = self.fallback_side();
        let mid = baseline + (self.face.descent() - self.face.ascent()) / 2.0;
        Rect::new(x, mid - side / 2.0, x + side, mid + side / 2.0)
    }

    fn placeholder(&self, rect: Rect, color: Rgba8) -> DrawOp {
        let inset = rect.width() * 0.12;
        let width = (self.face.font_size / 16.0).max(1.0);
        DrawOp::StrokePath {
            path: rect.inset(-inset).to_path(0.1),
            color,
            width,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/glyph.rs"]
mod tests;
