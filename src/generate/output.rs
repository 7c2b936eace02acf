use std::{
    fmt,
    io::Cursor,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::{
    foundation::{
        error::{SlideError, SlideResult, SlotContext},
        math::unpremultiply_rgba8_in_place,
    },
    render::cpu::FrameRGBA,
};

/// Coordinates of one output image; all indices are 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId {
    pub variation: u32,
    pub post: usize,
    pub column: usize,
}

impl SlotId {
    pub fn new(variation: u32, post: usize, column: usize) -> Self {
        Self {
            variation,
            post,
            column,
        }
    }

    pub fn context(self) -> SlotContext {
        SlotContext::new(self.variation, self.post, self.column)
    }

    /// `<root>/variation{n}/post{m}/{k}.png`
    pub fn path_in(self, root: &Path) -> PathBuf {
        root.join(format!("variation{}", self.variation))
            .join(format!("post{}", self.post))
            .join(format!("{}.png", self.column))
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "variation {} post {} column {}",
            self.variation, self.post, self.column
        )
    }
}

/// Encodes a frame as PNG in memory (straight alpha).
pub fn encode_png(frame: &FrameRGBA) -> SlideResult<Vec<u8>> {
    let mut rgba = frame.data.clone();
    if frame.premultiplied {
        unpremultiply_rgba8_in_place(&mut rgba);
    }
    let img = image::RgbaImage::from_raw(frame.width, frame.height, rgba)
        .ok_or_else(|| SlideError::render("frame buffer does not match its dimensions"))?;

    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(out)
}

/// Writes `bytes` to a sibling temporary file and renames it over `path`, so a reader never
/// sees a partial file at `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> SlideResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output directory '{}'", parent.display()))?;
    }
    replace_via_temp(path, |tmp| std::fs::write(tmp, bytes))
}

/// Runs `write` against the temporary sibling of `path`, then renames it into place. The
/// temporary file is removed whenever either step fails.
fn replace_via_temp(
    path: &Path,
    write: impl FnOnce(&Path) -> std::io::Result<()>,
) -> SlideResult<()> {
    let tmp = temp_path(path);
    if let Err(e) = write(&tmp) {
        let _ = std::fs::remove_file(&tmp);
        return Err(anyhow::Error::new(e)
            .context(format!("write '{}'", tmp.display()))
            .into());
    }
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(anyhow::Error::new(e)
            .context(format!("rename '{}' to '{}'", tmp.display(), path.display()))
            .into());
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Encodes `frame` and writes it atomically to `path`.
pub fn write_png(path: &Path, frame: &FrameRGBA) -> SlideResult<()> {
    let bytes = encode_png(frame)?;
    write_atomic(path, &bytes)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote slide");
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/generate/output.rs"]
mod tests;
