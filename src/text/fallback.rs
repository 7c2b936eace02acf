use std::{collections::BTreeMap, path::Path};

use anyhow::Context;

use crate::{
    assets::{
        decode::{PreparedImage, decode_image, parse_svg},
        svg_raster::rasterize_svg_square,
    },
    foundation::error::SlideResult,
};

/// Side of a fallback glyph box relative to the font size.
pub const FALLBACK_SCALE: f64 = 1.2;

const SVG_RASTER_SIDE: u32 = 128;

/// Substitute glyph images keyed by code point.
#[derive(Clone, Debug, Default)]
pub struct FallbackGlyphs {
    glyphs: BTreeMap<char, PreparedImage>,
}

impl FallbackGlyphs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ch: char, image: PreparedImage) {
        self.glyphs.insert(ch, image);
    }

    pub fn get(&self, ch: char) -> Option<&PreparedImage> {
        self.glyphs.get(&ch)
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Loads every `{hex}.png|svg` / `emoji_{hex}.png|svg` file in `dir`.
    ///
    /// PNG wins over SVG for the same code point. Sequence files (`1f468-200d-1f469.png`) and
    /// unrelated files are skipped.
    #[tracing::instrument(skip_all, fields(dir = %dir.display()))]
    pub fn load_dir(dir: &Path) -> SlideResult<Self> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("read fallback glyph dir '{}'", dir.display()))?
        {
            let entry = entry
                .with_context(|| format!("read fallback glyph dir '{}'", dir.display()))?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some((ch, kind)) = parse_file_name(name) else {
                tracing::trace!(file = name, "skipping non-glyph file");
                continue;
            };
            files.push((ch, kind, path));
        }
        files.sort();

        let mut out = Self::new();
        for (ch, kind, path) in files {
            if out.glyphs.contains_key(&ch) {
                continue;
            }
            let bytes = std::fs::read(&path)
                .with_context(|| format!("read fallback glyph '{}'", path.display()))?;
            let image = match kind {
                AssetKind::Png => decode_image(&bytes)
                    .with_context(|| format!("decode fallback glyph '{}'", path.display()))?,
                AssetKind::Svg => {
                    let svg = parse_svg(&bytes)
                        .with_context(|| format!("parse fallback glyph '{}'", path.display()))?;
                    rasterize_svg_square(&svg.tree, SVG_RASTER_SIDE)?
                }
            };
            out.insert(ch, image);
        }
        tracing::debug!(glyphs = out.len(), "loaded fallback glyphs");
        Ok(out)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum AssetKind {
    Png,
    Svg,
}

fn parse_file_name(name: &str) -> Option<(char, AssetKind)> {
    let lower = name.to_ascii_lowercase();
    let (stem, kind) = if let Some(stem) = lower.strip_suffix(".png") {
        (stem, AssetKind::Png)
    } else if let Some(stem) = lower.strip_suffix(".svg") {
        (stem, AssetKind::Svg)
    } else {
        return None;
    };
    let hex = stem.strip_prefix("emoji_").unwrap_or(stem);
    if hex.is_empty() || hex.len() > 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let cp = u32::from_str_radix(hex, 16).ok()?;
    char::from_u32(cp).map(|ch| (ch, kind))
}

#[cfg(test)]
#[path = "../../tests/unit/text/fallback.rs"]
mod tests;
