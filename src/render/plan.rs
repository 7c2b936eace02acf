use crate::{
    assets::decode::PreparedImage,
    foundation::core::{BezPath, Canvas, Rect, Rgba8},
};

/// One slide as a flat list of draw operations, executed in order (painter's algorithm).
#[derive(Clone, Debug)]
pub struct SlidePlan {
    pub canvas: Canvas,
    pub ops: Vec<DrawOp>,
}

#[derive(Clone, Debug)]
pub enum DrawOp {
    /// Raster image scaled into `rect`.
    Image { image: PreparedImage, rect: Rect },
    FillPath { path: BezPath, color: Rgba8 },
    StrokePath {
        path: BezPath,
        color: Rgba8,
        width: f64,
    },
}

impl SlidePlan {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            ops: Vec::new(),
        }
    }

    pub fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    pub fn extend(&mut self, ops: impl IntoIterator<Item = DrawOp>) {
        self.ops.extend(ops);
    }
}
