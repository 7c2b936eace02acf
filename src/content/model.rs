use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    path::PathBuf,
};

use crate::{
    content::settings::SettingsHierarchy,
    foundation::error::{SlideError, SlideResult},
};

/// Reserved product name selecting any product's pool.
pub const WILDCARD_PRODUCT: &str = "all";

const INVALID_PRODUCT_NAMES: [&str; 2] = ["none", "null"];

/// Product selector of one caption cell.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProductSelector {
    /// The `all` wildcard (or an empty cell).
    Any,
    Specific(String),
}

impl ProductSelector {
    /// Parses a caption cell's product column. Empty and `all` mean [`ProductSelector::Any`].
    pub fn parse(raw: &str) -> SlideResult<Self> {
        let name = raw.trim();
        if name.is_empty() || name == WILDCARD_PRODUCT {
            return Ok(Self::Any);
        }
        if name.eq_ignore_ascii_case(WILDCARD_PRODUCT) {
            return Err(SlideError::validation(format!(
                "product '{name}': the wildcard must be written in lowercase ('{WILDCARD_PRODUCT}')"
            )));
        }
        validate_product_name(name)?;
        Ok(Self::Specific(name.to_string()))
    }

    pub fn specific(&self) -> Option<&str> {
        match self {
            Self::Any => None,
            Self::Specific(name) => Some(name),
        }
    }
}

impl fmt::Display for ProductSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str(WILDCARD_PRODUCT),
            Self::Specific(name) => f.write_str(name),
        }
    }
}

pub(crate) fn validate_product_name(name: &str) -> SlideResult<()> {
    if name.trim().is_empty() {
        return Err(SlideError::validation("product name must be non-empty"));
    }
    if name.eq_ignore_ascii_case(WILDCARD_PRODUCT) {
        return Err(SlideError::validation(format!(
            "product name '{name}' is reserved for the wildcard selector"
        )));
    }
    if INVALID_PRODUCT_NAMES
        .iter()
        .any(|bad| name.eq_ignore_ascii_case(bad))
    {
        return Err(SlideError::validation(format!(
            "product name '{name}' is not allowed"
        )));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Product {
    pub name: String,
    #[serde(default)]
    pub prevent_duplicates: bool,
}

/// One base image in a content type's pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageAsset {
    /// Position in the owning content type's pool; identity for duplicate tracking.
    pub index: usize,
    /// Path relative to the content model root.
    pub file: PathBuf,
    pub content_type: String,
    /// `None` for unassigned images, which only the wildcard selects.
    pub product: Option<String>,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentType {
    pub name: String,
    pub images: Vec<ImageAsset>,
    pub products: BTreeMap<String, Product>,
}

impl ContentType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            images: Vec::new(),
            products: BTreeMap::new(),
        }
    }

    /// Images owned by `product`, in pool order.
    pub fn images_of<'a>(&'a self, product: &str) -> impl Iterator<Item = &'a ImageAsset> {
        self.images
            .iter()
            .filter(move |img| img.product.as_deref() == Some(product))
    }

    pub fn unassigned_images(&self) -> impl Iterator<Item = &ImageAsset> {
        self.images.iter().filter(|img| img.product.is_none())
    }

    fn validate(&self) -> SlideResult<()> {
        if self.name.trim().is_empty() {
            return Err(SlideError::validation("content type name must be non-empty"));
        }
        for (key, product) in &self.products {
            if key != &product.name {
                return Err(SlideError::validation(format!(
                    "content type '{}': product key '{key}' does not match name '{}'",
                    self.name, product.name
                )));
            }
            validate_product_name(key)?;
        }

        let mut seen = BTreeSet::new();
        for (i, img) in self.images.iter().enumerate() {
            if img.index != i {
                return Err(SlideError::validation(format!(
                    "content type '{}': image '{}' has index {} but sits at {i}",
                    self.name,
                    img.file.display(),
                    img.index
                )));
            }
            if img.content_type != self.name {
                return Err(SlideError::validation(format!(
                    "image '{}' belongs to '{}' but is listed under '{}'",
                    img.file.display(),
                    img.content_type,
                    self.name
                )));
            }
            if img.width == 0 || img.height == 0 {
                return Err(SlideError::validation(format!(
                    "image '{}' has zero width/height",
                    img.file.display()
                )));
            }
            if let Some(p) = &img.product
                && !self.products.contains_key(p)
            {
                return Err(SlideError::validation(format!(
                    "image '{}' references unknown product '{p}' in content type '{}'",
                    img.file.display(),
                    self.name
                )));
            }
            if !seen.insert(&img.file) {
                return Err(SlideError::validation(format!(
                    "image '{}' is listed twice in content type '{}'",
                    img.file.display(),
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// One content-type column of a caption row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptionCell {
    pub content_type: String,
    pub selector: ProductSelector,
    pub text: String,
    /// Extra lines appended below the caption's own lines.
    pub extra_lines: Vec<String>,
}

impl CaptionCell {
    pub fn new(
        content_type: impl Into<String>,
        selector: ProductSelector,
        text: impl Into<String>,
    ) -> Self {
        Self {
            content_type: content_type.into(),
            selector,
            text: text.into(),
            extra_lines: Vec::new(),
        }
    }

    pub fn with_extra_lines(mut self, lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extra_lines.extend(lines.into_iter().map(Into::into));
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CaptionRow {
    pub cells: Vec<CaptionCell>,
}

/// Validated, read-only input to generation.
#[derive(Clone, Debug)]
pub struct ContentModel {
    /// Directory image files are resolved against.
    pub root: PathBuf,
    pub content_types: BTreeMap<String, ContentType>,
    pub rows: Vec<CaptionRow>,
    pub settings: SettingsHierarchy,
}

impl ContentModel {
    pub fn content_type(&self, name: &str) -> SlideResult<&ContentType> {
        self.content_types
            .get(name)
            .ok_or_else(|| SlideError::validation(format!("unknown content type '{name}'")))
    }

    pub fn image_path(&self, image: &ImageAsset) -> PathBuf {
        self.root.join(&image.file)
    }

    /// Number of images one variation renders.
    pub fn slots_per_variation(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).sum()
    }

    pub fn validate(&self) -> SlideResult<()> {
        if self.content_types.is_empty() {
            return Err(SlideError::validation(
                "content model must define at least one content type",
            ));
        }
        for (key, ct) in &self.content_types {
            if key != &ct.name {
                return Err(SlideError::validation(format!(
                    "content type key '{key}' does not match name '{}'",
                    ct.name
                )));
            }
            ct.validate()?;
        }

        if self.rows.is_empty() {
            return Err(SlideError::validation(
                "content model must contain at least one caption row",
            ));
        }
        for (r, row) in self.rows.iter().enumerate() {
            if row.cells.is_empty() {
                return Err(SlideError::validation(format!(
                    "caption row {} has no cells",
                    r + 1
                )));
            }
            for (c, cell) in row.cells.iter().enumerate() {
                let ct = self.content_types.get(&cell.content_type).ok_or_else(|| {
                    SlideError::validation(format!(
                        "caption row {} column {}: unknown content type '{}'",
                        r + 1,
                        c + 1,
                        cell.content_type
                    ))
                })?;
                if let Some(p) = cell.selector.specific()
                    && !ct.products.contains_key(p)
                {
                    return Err(SlideError::validation(format!(
                        "caption row {} column {}: unknown product '{p}' for content type '{}'",
                        r + 1,
                        c + 1,
                        ct.name
                    )));
                }
            }
        }

        self.settings.template.validate()?;
        for ct in self.content_types.values() {
            let products =
                std::iter::once(None).chain(ct.products.keys().map(|p| Some(p.as_str())));
            for product in products {
                let s = self.settings.resolve(&ct.name, product);
                s.style.validate(s.text_type).map_err(|e| {
                    SlideError::validation(format!(
                        "settings for content type '{}' product '{}': {e}",
                        ct.name,
                        product.unwrap_or("-")
                    ))
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/content/model.rs"]
mod tests;
