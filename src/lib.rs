//! slideforge generates captioned slide images in bulk.
//!
//! A [`ContentModel`] lists image pools per content type and a table of caption rows. A
//! [`Generator`] turns it into `variations` independent sets of posts:
//!
//! - Allocate one image per (row, column) with the duplicate-aware [`Allocator`]
//! - Lay the caption out and compose it over the image in the plain or highlight style
//! - Rasterise on the CPU and write `<out>/variation{n}/post{m}/{k}.png`
//!
//! Given the same inputs and seed, output files are byte-identical whether rendering runs on
//! one thread or many.
#![forbid(unsafe_code)]

mod alloc;
mod assets;
mod content;
mod foundation;
mod generate;
mod render;
mod text;

pub use crate::alloc::pool::{AllocPolicy, Allocator, DuplicateScope, UsageState};
pub use crate::assets::decode::{PreparedImage, decode_image, load_image};
pub use crate::content::builder::{ContentModelBuilder, caption};
pub use crate::content::manifest::{load_manifest, load_template, parse_manifest};
pub use crate::content::model::{
    CaptionCell, CaptionRow, ContentModel, ContentType, ImageAsset, Product, ProductSelector,
    WILDCARD_PRODUCT,
};
pub use crate::content::settings::{
    HorizontalAlign, Margins, Palette, Position, Settings, SettingsHierarchy, SettingsLayer,
    SettingsTemplate, SpacingMode, StyleLayer, TextStyle, TextType, VerticalAnchor,
};
pub use crate::foundation::core::{Affine, BezPath, Canvas, Point, Rect, Rgba8};
pub use crate::foundation::error::{SlideError, SlideResult, SlotContext};
pub use crate::generate::orchestrator::{
    GenerateReport, Generator, GeneratorOpts, GeneratorState, SlotOverflow,
};
pub use crate::generate::output::{SlotId, encode_png, write_atomic};
pub use crate::render::cpu::{CpuBackend, FrameRGBA};
pub use crate::render::pipeline::RenderThreading;
pub use crate::render::plan::{DrawOp, SlidePlan};
pub use crate::render::style::{ComposedSlide, compose_slide};
pub use crate::text::fallback::{FALLBACK_SCALE, FallbackGlyphs};
pub use crate::text::font::{GlyphFace, ScaledFace, TtfFace};
pub use crate::text::glyph::{
    GlyphCoverageReport, GlyphPaint, GlyphRenderer, LineRender, RunKind, UnmappedGlyph, is_joiner,
    segment_runs,
};
pub use crate::text::layout::{CaptionLayout, LaidLine, LayoutOverflow, layout, split_caption};
