use rayon::prelude::*;

use crate::{
    foundation::error::{SlideError, SlideResult},
    render::cpu::CpuBackend,
};

/// How already-planned slides are rendered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderThreading {
    pub parallel: bool,
    /// Worker count for the rayon pool; `None` uses rayon's default.
    pub threads: Option<usize>,
}

pub(crate) fn build_thread_pool(threads: Option<usize>) -> SlideResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(SlideError::validation(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| SlideError::render(format!("failed to build rayon thread pool: {e}")))
}

/// Runs `job` over `items` with one [`CpuBackend`] per worker, returning results in item order.
///
/// Sequential when `pool` is `None`. Every item runs even if an earlier one fails.
pub(crate) fn run_jobs<T, R, F>(
    items: &[T],
    pool: Option<&rayon::ThreadPool>,
    job: F,
) -> Vec<SlideResult<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&mut CpuBackend, &T) -> SlideResult<R> + Sync,
{
    match pool {
        None => {
            let mut backend = CpuBackend::new();
            items.iter().map(|item| job(&mut backend, item)).collect()
        }
        Some(pool) => pool.install(|| {
            items
                .par_iter()
                .map_init(CpuBackend::new, |backend, item| job(backend, item))
                .collect::<Vec<_>>()
        }),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
