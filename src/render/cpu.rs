use std::{collections::HashMap, sync::Arc};

use crate::{
    assets::decode::PreparedImage,
    foundation::{
        core::{Affine, BezPath, Point, Rgba8},
        error::{SlideError, SlideResult},
    },
    render::plan::{DrawOp, SlidePlan},
};

/// Rendered frame, row-major RGBA8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Executes [`SlidePlan`]s with `vello_cpu`.
///
/// One backend per worker thread; it is not shared.
#[derive(Default)]
pub struct CpuBackend {
    frames: u64,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames rendered by this backend so far.
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn render(&mut self, plan: &SlidePlan) -> SlideResult<FrameRGBA> {
        let width: u16 = plan
            .canvas
            .width
            .try_into()
            .map_err(|_| SlideError::render("canvas width exceeds u16"))?;
        let height: u16 = plan
            .canvas
            .height
            .try_into()
            .map_err(|_| SlideError::render("canvas height exceeds u16"))?;

        // Paints for images drawn more than once in this plan (fallback glyphs). Keyed by the
        // pixel buffer address, which the plan keeps alive for the whole call.
        let mut images: HashMap<usize, vello_cpu::Image> = HashMap::new();

        let mut ctx = vello_cpu::RenderContext::new(width, height);
        for op in &plan.ops {
            draw_op(&mut ctx, op, &mut images)?;
        }
        ctx.flush();

        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        ctx.render_to_pixmap(&mut pixmap);
        self.frames += 1;

        Ok(FrameRGBA {
            width: plan.canvas.width,
            height: plan.canvas.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

fn draw_op(
    ctx: &mut vello_cpu::RenderContext,
    op: &DrawOp,
    images: &mut HashMap<usize, vello_cpu::Image>,
) -> SlideResult<()> {
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);

    match op {
        DrawOp::FillPath { path, color } => {
            ctx.set_paint(color_to_cpu(*color));
            ctx.fill_path(&bezpath_to_cpu(path));
        }
        DrawOp::StrokePath { path, color, width } => {
            ctx.set_paint(color_to_cpu(*color));
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(*width));
            ctx.stroke_path(&bezpath_to_cpu(path));
        }
        DrawOp::Image { image, rect } => {
            if image.width == 0 || image.height == 0 || rect.width() <= 0.0 || rect.height() <= 0.0
            {
                return Ok(());
            }
            let key = Arc::as_ptr(&image.rgba8_premul) as usize;
            let paint = match images.get(&key) {
                Some(paint) => paint.clone(),
                None => {
                    let paint = image_paint(image)?;
                    images.insert(key, paint.clone());
                    paint
                }
            };

            let (w, h) = (f64::from(image.width), f64::from(image.height));
            let transform = Affine::translate((rect.x0, rect.y0))
                * Affine::scale_non_uniform(rect.width() / w, rect.height() / h);
            ctx.set_transform(affine_to_cpu(transform));
            ctx.set_paint(paint);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
        }
    }
    Ok(())
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn image_paint(image: &PreparedImage) -> SlideResult<vello_cpu::Image> {
    let pixmap = premul_bytes_to_pixmap(image.rgba8_premul.as_slice(), image.width, image.height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> SlideResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| SlideError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| SlideError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(SlideError::render("prepared image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
