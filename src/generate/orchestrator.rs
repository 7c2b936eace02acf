use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    alloc::pool::{AllocPolicy, Allocator, DuplicateScope},
    assets::decode::load_image,
    content::model::{CaptionCell, ContentModel, ImageAsset},
    foundation::{
        error::{SlideError, SlideResult},
        math::slot_seed,
    },
    generate::output::{SlotId, write_png},
    render::{
        cpu::{CpuBackend, FrameRGBA},
        pipeline::{RenderThreading, build_thread_pool, run_jobs},
        style::{ComposedSlide, compose_slide},
    },
    text::{
        fallback::FallbackGlyphs, font::GlyphFace, glyph::GlyphCoverageReport,
        layout::LayoutOverflow,
    },
};

/// Observable generator state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GeneratorState {
    #[default]
    Idle,
    Validating,
    Allocating {
        variation: u32,
        row: usize,
    },
    Rendering(SlotId),
    Writing(SlotId),
    Failed,
}

impl fmt::Display for GeneratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Validating => f.write_str("validating"),
            Self::Allocating { variation, row } => {
                write!(f, "allocating variation {variation} row {row}")
            }
            Self::Rendering(slot) => write!(f, "rendering {slot}"),
            Self::Writing(slot) => write!(f, "writing {slot}"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct GeneratorOpts {
    /// Seed for allocation and per-slot styling; drawn from OS entropy when `None`.
    pub seed: Option<u64>,
    pub scope: DuplicateScope,
    pub threading: RenderThreading,
}

/// Summary of one `generate` call.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerateReport {
    pub seed: u64,
    pub output_root: PathBuf,
    /// Every written file, sorted.
    pub files: Vec<PathBuf>,
    pub slots: usize,
    pub coverage: GlyphCoverageReport,
    /// Captions that did not fit inside their margins, in slot order.
    pub overflows: Vec<SlotOverflow>,
}

/// A caption overflow together with the slot it was drawn on.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotOverflow {
    pub slot: SlotId,
    pub overflow: LayoutOverflow,
}

/// Drives allocation, composition and output for a loaded [`ContentModel`].
pub struct Generator {
    face: Arc<dyn GlyphFace>,
    fallback: Arc<FallbackGlyphs>,
    opts: GeneratorOpts,
    model: Option<ContentModel>,
    state: GeneratorState,
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("font", &self.face.family_name())
            .field("fallback_glyphs", &self.fallback.len())
            .field("opts", &self.opts)
            .field("loaded", &self.model.is_some())
            .field("state", &self.state)
            .finish()
    }
}

/// Everything a worker needs to turn one allocated slot into a file.
struct SlotJob<'m> {
    slot: SlotId,
    cell: &'m CaptionCell,
    image: &'m ImageAsset,
    path: PathBuf,
}

struct SlotOutput {
    slot: SlotId,
    path: PathBuf,
    coverage: GlyphCoverageReport,
    overflow: Option<LayoutOverflow>,
}

impl SlotOutput {
    fn new(job: &SlotJob<'_>, slide: ComposedSlide) -> Self {
        Self {
            slot: job.slot,
            path: job.path.clone(),
            coverage: slide.coverage,
            overflow: slide.overflow,
        }
    }
}

/// Read-only inputs shared by every slot of one `generate` call.
struct RenderInputs<'a> {
    model: &'a ContentModel,
    face: &'a dyn GlyphFace,
    fallback: &'a FallbackGlyphs,
    seed: u64,
}

impl RenderInputs<'_> {
    fn render(
        &self,
        backend: &mut CpuBackend,
        job: &SlotJob<'_>,
    ) -> SlideResult<(FrameRGBA, ComposedSlide)> {
        let path = self.model.image_path(job.image);
        let base = load_image(&path).with_context(|| format!("load base image for {}", job.slot))?;
        let settings = self
            .model
            .settings
            .resolve(&job.image.content_type, job.image.product.as_deref());
        let mut rng = StdRng::seed_from_u64(slot_seed(
            self.seed,
            job.slot.variation,
            job.slot.post,
            job.slot.column,
        ));
        let slide = compose_slide(
            &base,
            job.cell,
            &settings,
            self.face,
            self.fallback,
            &mut rng,
        )?;
        let frame = backend.render(&slide.plan)?;
        Ok((frame, slide))
    }
}

impl Generator {
    pub fn new(
        face: Arc<dyn GlyphFace>,
        fallback: Arc<FallbackGlyphs>,
        opts: GeneratorOpts,
    ) -> Self {
        Self {
            face,
            fallback,
            opts,
            model: None,
            state: GeneratorState::Idle,
        }
    }

    pub fn state(&self) -> GeneratorState {
        self.state
    }

    pub fn model(&self) -> Option<&ContentModel> {
        self.model.as_ref()
    }

    fn transition(&mut self, next: GeneratorState) {
        tracing::trace!(from = %self.state, to = %next, "generator state");
        self.state = next;
    }

    /// Validates `model` and makes it the input of later `generate` calls.
    ///
    /// On failure the generator is left unloaded in [`GeneratorState::Failed`].
    #[tracing::instrument(skip_all, fields(root = %model.root.display()))]
    pub fn load(&mut self, model: ContentModel) -> SlideResult<()> {
        self.transition(GeneratorState::Validating);
        self.model = None;
        if let Err(e) = model.validate() {
            tracing::warn!(error = %e, "content model rejected");
            self.transition(GeneratorState::Failed);
            return Err(e);
        }
        tracing::info!(
            content_types = model.content_types.len(),
            rows = model.rows.len(),
            "content model loaded"
        );
        self.model = Some(model);
        self.transition(GeneratorState::Idle);
        Ok(())
    }

    /// Writes `variations` full sets of posts under `output_path` (default `<root>/output`).
    ///
    /// An exhausted pool aborts the call after rendering the posts of the failing variation that
    /// were fully allocated; files already written stay on disk.
    #[tracing::instrument(skip(self, output_path))]
    pub fn generate(
        &mut self,
        variations: u32,
        allow_all_duplicates: bool,
        output_path: Option<&Path>,
    ) -> SlideResult<GenerateReport> {
        let result = self.run(variations, allow_all_duplicates, output_path);
        match &result {
            Ok(report) => {
                self.transition(GeneratorState::Idle);
                tracing::info!(
                    files = report.files.len(),
                    seed = report.seed,
                    unmapped_glyphs = report.coverage.unmapped().len(),
                    "generation finished"
                );
            }
            Err(SlideError::NotLoaded) => {}
            Err(e) => {
                self.transition(GeneratorState::Failed);
                tracing::error!(error = %e, "generation failed");
            }
        }
        result
    }

    fn run(
        &mut self,
        variations: u32,
        allow_all_duplicates: bool,
        output_path: Option<&Path>,
    ) -> SlideResult<GenerateReport> {
        let Self {
            face,
            fallback,
            opts,
            model,
            state,
        } = self;
        let model = model.as_ref().ok_or(SlideError::NotLoaded)?;
        if variations == 0 {
            return Err(SlideError::validation("variations must be >= 1"));
        }

        let output_root = output_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| model.root.join("output"));
        let seed = opts.seed.unwrap_or_else(rand::random);
        tracing::info!(seed, output = %output_root.display(), "starting generation");

        let pool = if opts.threading.parallel {
            Some(build_thread_pool(opts.threading.threads)?)
        } else {
            None
        };
        let policy = AllocPolicy {
            allow_all_duplicates,
            scope: opts.scope,
        };
        let mut allocator = Allocator::new(model, policy, seed);
        let inputs = RenderInputs {
            model,
            face: &**face,
            fallback: &**fallback,
            seed,
        };

        let mut backend = CpuBackend::new();
        let mut files = Vec::new();
        let mut coverage = GlyphCoverageReport::default();
        let mut overflows = Vec::new();

        for variation in 1..=variations {
            let mut jobs = Vec::with_capacity(model.slots_per_variation());
            let mut failure = None;

            'rows: for (r, row) in model.rows.iter().enumerate() {
                let post = r + 1;
                *state = GeneratorState::Allocating {
                    variation,
                    row: post,
                };
                let mut post_jobs = Vec::with_capacity(row.cells.len());
                for (c, cell) in row.cells.iter().enumerate() {
                    let slot = SlotId::new(variation, post, c + 1);
                    match allocator.allocate(&cell.content_type, &cell.selector, variation) {
                        Ok(image) => post_jobs.push(SlotJob {
                            slot,
                            cell,
                            image,
                            path: slot.path_in(&output_root),
                        }),
                        Err(e) => {
                            failure = Some(e.at_slot(slot.context()));
                            break 'rows;
                        }
                    }
                }
                jobs.extend(post_jobs);
            }
            tracing::debug!(variation, slots = jobs.len(), "variation allocated");

            let outputs = match &pool {
                None => jobs
                    .iter()
                    .map(|job| -> SlideResult<SlotOutput> {
                        *state = GeneratorState::Rendering(job.slot);
                        let (frame, slide) = inputs.render(&mut backend, job)?;
                        *state = GeneratorState::Writing(job.slot);
                        write_png(&job.path, &frame)?;
                        Ok(SlotOutput::new(job, slide))
                    })
                    .collect::<Vec<SlideResult<SlotOutput>>>(),
                Some(pool) => {
                    if let Some(first) = jobs.first() {
                        *state = GeneratorState::Rendering(first.slot);
                    }
                    run_jobs(&jobs, Some(pool), |backend, job| {
                        let (frame, slide) = inputs.render(backend, job)?;
                        write_png(&job.path, &frame)?;
                        Ok(SlotOutput::new(job, slide))
                    })
                }
            };

            for out in outputs {
                let out = out?;
                files.push(out.path);
                coverage.merge(out.coverage);
                if let Some(overflow) = out.overflow {
                    overflows.push(SlotOverflow {
                        slot: out.slot,
                        overflow,
                    });
                }
            }
            if let Some(e) = failure {
                return Err(e);
            }
        }

        files.sort();
        Ok(GenerateReport {
            seed,
            output_root,
            slots: files.len(),
            files,
            coverage,
            overflows,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generate/orchestrator.rs"]
mod tests;
