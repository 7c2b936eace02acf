//! JSON content manifest loading.
//!
//! A manifest lists content types (products and images), caption rows, and the settings
//! hierarchy. All file references are relative to the manifest's directory.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::{
    content::{
        builder::ContentModelBuilder,
        model::{CaptionCell, ContentModel, Product, ProductSelector},
        settings::{SettingsHierarchy, SettingsLayer, SettingsTemplate},
    },
    foundation::error::{SlideError, SlideResult},
};

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestDoc {
    content_types: Vec<ContentTypeDoc>,
    #[serde(default)]
    captions: Vec<Vec<CaptionDoc>>,
    #[serde(default)]
    settings: SettingsDoc,
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ContentTypeDoc {
    name: String,
    #[serde(default)]
    products: Vec<Product>,
    #[serde(default)]
    images: Vec<ImageDoc>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ImageDoc {
    file: String,
    #[serde(default)]
    product: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct CaptionDoc {
    content_type: String,
    #[serde(default)]
    product: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    extra_lines: Vec<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SettingsDoc {
    template: Option<String>,
    products: BTreeMap<String, SettingsLayer>,
    content_types: BTreeMap<String, SettingsLayer>,
    overrides: BTreeMap<String, BTreeMap<String, SettingsLayer>>,
}

/// Reads a manifest file and returns a validated [`ContentModel`] rooted at its directory.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_manifest(path: &Path) -> SlideResult<ContentModel> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("read content manifest '{}'", path.display()))?;
    let root = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
    let model = parse_manifest(&bytes, &root)?;
    tracing::info!(
        content_types = model.content_types.len(),
        rows = model.rows.len(),
        "loaded content manifest"
    );
    Ok(model)
}

/// Parses manifest JSON. Images without explicit `width`/`height` are measured from their files
/// under `root`.
pub fn parse_manifest(bytes: &[u8], root: &Path) -> SlideResult<ContentModel> {
    let doc: ManifestDoc = serde_json::from_slice(bytes)
        .map_err(|e| SlideError::serde(format!("content manifest: {e}")))?;

    let template = match &doc.settings.template {
        Some(rel) => load_template(&root.join(normalize_rel_path(rel)?))?,
        None => SettingsTemplate::default(),
    };
    let settings = SettingsHierarchy {
        template,
        products: doc.settings.products,
        content_types: doc.settings.content_types,
        overrides: doc.settings.overrides,
    };

    let mut builder = ContentModelBuilder::new(root).settings(settings);
    for ct in doc.content_types {
        builder = builder.content_type(ct.name.clone())?;
        for p in ct.products {
            builder = builder.product(&ct.name, p.name, p.prevent_duplicates)?;
        }
        for img in ct.images {
            let rel = normalize_rel_path(&img.file)?;
            let product = match img.product.as_deref() {
                Some(raw) => ProductSelector::parse(raw)?.specific().map(str::to_string),
                None => None,
            };
            let (width, height) = match (img.width, img.height) {
                (Some(w), Some(h)) => (w, h),
                _ => {
                    let abs = root.join(&rel);
                    image::image_dimensions(&abs)
                        .with_context(|| format!("read image dimensions of '{}'", abs.display()))?
                }
            };
            builder =
                builder.image(&ct.name, PathBuf::from(rel), product.as_deref(), width, height)?;
        }
    }

    for row in doc.captions {
        let mut cells = Vec::with_capacity(row.len());
        for cell in row {
            let selector = ProductSelector::parse(&cell.product)?;
            cells.push(
                CaptionCell::new(cell.content_type, selector, cell.text)
                    .with_extra_lines(cell.extra_lines),
            );
        }
        builder = builder.row(cells);
    }

    builder.build()
}

/// Reads a settings template document.
pub fn load_template(path: &Path) -> SlideResult<SettingsTemplate> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("read settings template '{}'", path.display()))?;
    let template: SettingsTemplate = serde_json::from_slice(&bytes).map_err(|e| {
        SlideError::serde(format!("settings template '{}': {e}", path.display()))
    })?;
    template.validate()?;
    Ok(template)
}

pub fn normalize_rel_path(source: &str) -> SlideResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(SlideError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(SlideError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(SlideError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(SlideError::validation("asset path must contain a file name"));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/content/manifest.rs"]
mod tests;
