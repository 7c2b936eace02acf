use std::collections::{BTreeMap, BTreeSet};

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    content::model::{ContentModel, ContentType, ImageAsset, ProductSelector},
    foundation::error::{SlideError, SlideResult},
};

/// Unit over which "already used" images are tracked.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateScope {
    /// Each variation starts with every pool full again.
    #[default]
    Variation,
    /// Used images stay used for every variation of one run.
    Run,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocPolicy {
    /// Run-level override: every selection is with replacement.
    pub allow_all_duplicates: bool,
    pub scope: DuplicateScope,
}

type PoolKey = (String, String);

/// Remaining images per (content type, product) for duplicate-preventing products.
///
/// Pools are filled lazily on first use and never refilled inside one scope.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UsageState {
    remaining: BTreeMap<PoolKey, Vec<usize>>,
    exhausted: BTreeSet<PoolKey>,
}

impl UsageState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.remaining.clear();
        self.exhausted.clear();
    }

    pub fn is_exhausted(&self, content_type: &str, product: &str) -> bool {
        self.exhausted
            .contains(&(content_type.to_string(), product.to_string()))
    }

    /// Unused image count, or `None` if the pool has not been touched in this scope.
    pub fn remaining(&self, content_type: &str, product: &str) -> Option<usize> {
        self.remaining
            .get(&(content_type.to_string(), product.to_string()))
            .map(Vec::len)
    }

    fn pool_mut(&mut self, ct: &ContentType, product: &str) -> &mut Vec<usize> {
        self.remaining
            .entry((ct.name.clone(), product.to_string()))
            .or_insert_with(|| ct.images_of(product).map(|img| img.index).collect())
    }

    fn take(&mut self, ct: &ContentType, product: &str, image_index: usize) {
        let pool = self.pool_mut(ct, product);
        if let Some(pos) = pool.iter().position(|&i| i == image_index) {
            pool.remove(pos);
        }
        if pool.is_empty() {
            tracing::debug!(
                content_type = %ct.name,
                product,
                "product pool exhausted for current scope"
            );
            self.exhausted
                .insert((ct.name.clone(), product.to_string()));
        }
    }
}

/// Assigns base images to slots, honouring each product's duplicate policy.
///
/// Calls must arrive in slot order (variation, then row, then column); the RNG and the usage
/// state are advanced by every call.
pub struct Allocator<'m> {
    model: &'m ContentModel,
    policy: AllocPolicy,
    rng: StdRng,
    usage: UsageState,
    variation: Option<u32>,
}

impl<'m> Allocator<'m> {
    pub fn new(model: &'m ContentModel, policy: AllocPolicy, seed: u64) -> Self {
        Self::with_usage(model, policy, seed, UsageState::new())
    }

    /// Resumes from an existing usage state (for `DuplicateScope::Run` across calls).
    pub fn with_usage(
        model: &'m ContentModel,
        policy: AllocPolicy,
        seed: u64,
        usage: UsageState,
    ) -> Self {
        Self {
            model,
            policy,
            rng: StdRng::seed_from_u64(seed),
            usage,
            variation: None,
        }
    }

    pub fn usage(&self) -> &UsageState {
        &self.usage
    }

    pub fn into_usage(self) -> UsageState {
        self.usage
    }

    /// Picks an image for one slot of `variation`.
    ///
    /// Fails with [`SlideError::ExhaustedPool`] when no candidate remains.
    pub fn allocate(
        &mut self,
        content_type: &str,
        selector: &ProductSelector,
        variation: u32,
    ) -> SlideResult<&'m ImageAsset> {
        if self.variation != Some(variation) {
            if self.policy.scope == DuplicateScope::Variation && self.variation.is_some() {
                self.usage.reset();
            }
            self.variation = Some(variation);
        }

        let model: &'m ContentModel = self.model;
        let ct = model.content_type(content_type)?;
        let image = match selector {
            ProductSelector::Specific(name) => self.allocate_specific(ct, name)?,
            ProductSelector::Any => self.allocate_any(ct)?,
        };
        tracing::debug!(
            content_type,
            selector = %selector,
            variation,
            file = %image.file.display(),
            "allocated image"
        );
        Ok(image)
    }

    fn allocate_specific(
        &mut self,
        ct: &'m ContentType,
        name: &str,
    ) -> SlideResult<&'m ImageAsset> {
        let product = ct.products.get(name).ok_or_else(|| {
            SlideError::validation(format!(
                "unknown product '{name}' for content type '{}'",
                ct.name
            ))
        })?;
        let exhausted = || SlideError::exhausted(&ct.name, name);

        if product.prevent_duplicates && !self.policy.allow_all_duplicates {
            if self.usage.is_exhausted(&ct.name, name) {
                return Err(exhausted());
            }
            let pool = self.usage.pool_mut(ct, name);
            if pool.is_empty() {
                return Err(exhausted());
            }
            let image_index = pool[self.rng.random_range(0..pool.len())];
            self.usage.take(ct, name, image_index);
            return Ok(&ct.images[image_index]);
        }

        let candidates: Vec<&'m ImageAsset> = ct.images_of(name).collect();
        if candidates.is_empty() {
            return Err(exhausted());
        }
        Ok(candidates[self.rng.random_range(0..candidates.len())])
    }

    fn allocate_any(&mut self, ct: &'m ContentType) -> SlideResult<&'m ImageAsset> {
        let mut candidates: Vec<(&'m ImageAsset, bool)> = Vec::with_capacity(ct.images.len());
        for img in &ct.images {
            let Some(name) = img.product.as_deref() else {
                candidates.push((img, false));
                continue;
            };
            let prevents = ct
                .products
                .get(name)
                .is_some_and(|p| p.prevent_duplicates)
                && !self.policy.allow_all_duplicates;
            if !prevents {
                candidates.push((img, false));
            } else if !self.usage.is_exhausted(&ct.name, name)
                && self.usage.pool_mut(ct, name).contains(&img.index)
            {
                candidates.push((img, true));
            }
        }

        if candidates.is_empty() {
            return Err(SlideError::exhausted(&ct.name, ProductSelector::Any));
        }

        let (image, consumes) = candidates[self.rng.random_range(0..candidates.len())];
        if consumes && let Some(name) = image.product.as_deref() {
            self.usage.take(ct, name, image.index);
        }
        Ok(image)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/alloc/pool.rs"]
mod tests;
