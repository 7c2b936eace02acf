use std::{path::Path, sync::Arc};

use anyhow::Context;

use crate::foundation::{error::SlideResult, math::premultiply_rgba8_in_place};

/// Decoded raster image, premultiplied RGBA8, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

#[derive(Clone, Debug)]
pub struct PreparedSvg {
    pub tree: Arc<usvg::Tree>,
}

pub fn decode_image(bytes: &[u8]) -> SlideResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Reads and decodes an image file; the file handle is released before decoding.
pub fn load_image(path: &Path) -> SlideResult<PreparedImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    let image =
        decode_image(&bytes).with_context(|| format!("decode image '{}'", path.display()))?;
    Ok(image)
}

pub fn parse_svg(bytes: &[u8]) -> SlideResult<PreparedSvg> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;
    Ok(PreparedSvg {
        tree: Arc::new(tree),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
