use std::{path::Path, sync::Arc};

use anyhow::Context;
use ttf_parser::{GlyphId, OutlineBuilder};

use crate::foundation::{
    core::{BezPath, Point},
    error::{SlideError, SlideResult},
};

/// Primary font as seen by layout and glyph rendering.
///
/// Metrics are in font units; `outline` returns a device-space path (y down) whose baseline
/// origin is `origin` and whose units are multiplied by `scale`.
pub trait GlyphFace: Send + Sync {
    fn family_name(&self) -> &str;

    fn units_per_em(&self) -> f64;

    /// Distance from baseline to the top of the line box (positive).
    fn ascender(&self) -> f64;

    /// Distance from baseline to the bottom of the line box (positive).
    fn descender(&self) -> f64;

    fn glyph_id(&self, ch: char) -> Option<u16>;

    fn has_glyph(&self, ch: char) -> bool {
        self.glyph_id(ch).is_some()
    }

    fn advance(&self, glyph: u16) -> f64;

    fn outline(&self, glyph: u16, origin: Point, scale: f64) -> Option<BezPath>;
}

/// A [`GlyphFace`] at a concrete pixel size.
#[derive(Clone, Copy)]
pub struct ScaledFace<'a> {
    pub face: &'a dyn GlyphFace,
    pub font_size: f64,
}

impl<'a> ScaledFace<'a> {
    pub fn new(face: &'a dyn GlyphFace, font_size: f64) -> Self {
        Self { face, font_size }
    }

    pub fn scale(&self) -> f64 {
        self.font_size / self.face.units_per_em().max(1.0)
    }

    pub fn ascent(&self) -> f64 {
        self.face.ascender() * self.scale()
    }

    pub fn descent(&self) -> f64 {
        self.face.descender() * self.scale()
    }

    /// Height of one line box without inter-line gap.
    pub fn line_height(&self) -> f64 {
        self.ascent() + self.descent()
    }

    pub fn advance_px(&self, glyph: u16) -> f64 {
        self.face.advance(glyph) * self.scale()
    }
}

/// TrueType/OpenType face backed by `ttf-parser`.
///
/// The face table is re-parsed per query; parsing only reads the table directory.
#[derive(Clone)]
pub struct TtfFace {
    data: Arc<Vec<u8>>,
    index: u32,
    family: String,
    units_per_em: f64,
    ascender: f64,
    descender: f64,
}

impl std::fmt::Debug for TtfFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtfFace")
            .field("family", &self.family)
            .field("index", &self.index)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl TtfFace {
    pub fn load(path: &Path) -> SlideResult<Self> {
        let data =
            std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
        let face = Self::from_bytes(data, 0).map_err(|e| {
            SlideError::validation(format!("font '{}': {e}", path.display()))
        })?;
        tracing::debug!(family = %face.family, path = %path.display(), "loaded primary font");
        Ok(face)
    }

    pub fn from_bytes(data: Vec<u8>, index: u32) -> SlideResult<Self> {
        let face = ttf_parser::Face::parse(&data, index)
            .map_err(|e| SlideError::validation(format!("parse font face: {e}")))?;
        let family = family_name(&face).unwrap_or_else(|| "Unnamed".to_string());
        let units_per_em = f64::from(face.units_per_em().max(1));
        let ascender = f64::from(face.ascender());
        let descender = f64::from(face.descender()).abs();
        Ok(Self {
            data: Arc::new(data),
            index,
            family,
            units_per_em,
            ascender,
            descender,
        })
    }

    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, self.index).ok()
    }
}

impl GlyphFace for TtfFace {
    fn family_name(&self) -> &str {
        &self.family
    }

    fn units_per_em(&self) -> f64 {
        self.units_per_em
    }

    fn ascender(&self) -> f64 {
        self.ascender
    }

    fn descender(&self) -> f64 {
        self.descender
    }

    fn glyph_id(&self, ch: char) -> Option<u16> {
        self.face()?
            .glyph_index(ch)
            .map(|id| id.0)
            .filter(|&id| id != 0)
    }

    fn advance(&self, glyph: u16) -> f64 {
        self.face()
            .and_then(|f| f.glyph_hor_advance(GlyphId(glyph)))
            .map(f64::from)
            .unwrap_or(0.0)
    }

    fn outline(&self, glyph: u16, origin: Point, scale: f64) -> Option<BezPath> {
        let face = self.face()?;
        let mut builder = GlyphPathBuilder::new(origin, scale);
        face.outline_glyph(GlyphId(glyph), &mut builder)?;
        Some(builder.path)
    }
}

fn family_name(face: &ttf_parser::Face<'_>) -> Option<String> {
    use ttf_parser::name::name_id;

    let mut family = None;
    for entry in face.names() {
        let Some(name) = entry.to_string() else {
            continue;
        };
        match entry.name_id {
            name_id::TYPOGRAPHIC_FAMILY => return Some(name),
            name_id::FAMILY if family.is_none() => family = Some(name),
            _ => {}
        }
    }
    family
}

/// Emits glyph outlines in device space: font units scaled, y flipped around the baseline.
struct GlyphPathBuilder {
    origin: Point,
    scale: f64,
    path: BezPath,
}

impl GlyphPathBuilder {
    fn new(origin: Point, scale: f64) -> Self {
        Self {
            origin,
            scale,
            path: BezPath::new(),
        }
    }

    fn map(&self, x: f32, y: f32) -> Point {
        Point::new(
            self.origin.x + f64::from(x) * self.scale,
            self.origin.y - f64::from(y) * self.scale,
        )
    }
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let p = self.map(x, y);
        self.path.move_to(p);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.map(x, y);
        self.path.line_to(p);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (p1, p) = (self.map(x1, y1), self.map(x, y));
        self.path.quad_to(p1, p);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (p1, p2, p) = (self.map(x1, y1), self.map(x2, y2), self.map(x, y));
        self.path.curve_to(p1, p2, p);
    }

    fn close(&mut self) {
        self.path.close_path();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/font.rs"]
mod tests;
