use std::sync::Arc;

use crate::{
    assets::decode::PreparedImage,
    foundation::error::{SlideError, SlideResult},
};

const MAX_DIM: u32 = 4096;

pub fn rasterize_svg_to_premul_rgba8(
    tree: &usvg::Tree,
    width: u32,
    height: u32,
) -> SlideResult<Vec<u8>> {
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| SlideError::render("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());
    Ok(pixmap.data().to_vec())
}

/// Rasterizes an SVG to a `side`×`side` image (tiny-skia output is already premultiplied).
pub fn rasterize_svg_square(tree: &usvg::Tree, side: u32) -> SlideResult<PreparedImage> {
    if side == 0 || side > MAX_DIM {
        return Err(SlideError::render(format!(
            "svg raster size {side} out of range (1..={MAX_DIM})"
        )));
    }
    let size = tree.size();
    if !size.width().is_finite() || size.width() <= 0.0 || size.height() <= 0.0 {
        return Err(SlideError::render("svg has invalid width/height"));
    }
    let rgba8_premul = rasterize_svg_to_premul_rgba8(tree, side, side)?;
    Ok(PreparedImage {
        width: side,
        height: side,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}
