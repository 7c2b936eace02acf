use std::{collections::BTreeMap, path::PathBuf};

use crate::{
    content::{
        model::{
            CaptionCell, CaptionRow, ContentModel, ContentType, ImageAsset, Product,
            ProductSelector,
        },
        settings::SettingsHierarchy,
    },
    foundation::error::{SlideError, SlideResult},
};

pub struct ContentModelBuilder {
    root: PathBuf,
    content_types: BTreeMap<String, ContentType>,
    rows: Vec<CaptionRow>,
    settings: SettingsHierarchy,
}

impl ContentModelBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            content_types: BTreeMap::new(),
            rows: Vec::new(),
            settings: SettingsHierarchy::default(),
        }
    }

    pub fn content_type(mut self, name: impl Into<String>) -> SlideResult<Self> {
        let name = name.into();
        if self.content_types.contains_key(&name) {
            return Err(SlideError::validation(format!(
                "duplicate content type '{name}'"
            )));
        }
        self.content_types
            .insert(name.clone(), ContentType::new(name));
        Ok(self)
    }

    pub fn product(
        mut self,
        content_type: &str,
        name: impl Into<String>,
        prevent_duplicates: bool,
    ) -> SlideResult<Self> {
        let name = name.into();
        let ct = self.content_type_mut(content_type)?;
        if ct.products.contains_key(&name) {
            return Err(SlideError::validation(format!(
                "duplicate product '{name}' in content type '{content_type}'"
            )));
        }
        ct.products.insert(
            name.clone(),
            Product {
                name,
                prevent_duplicates,
            },
        );
        Ok(self)
    }

    /// Appends an image to `content_type`'s pool. Dimensions are taken as given.
    pub fn image(
        mut self,
        content_type: &str,
        file: impl Into<PathBuf>,
        product: Option<&str>,
        width: u32,
        height: u32,
    ) -> SlideResult<Self> {
        let ct = self.content_type_mut(content_type)?;
        let index = ct.images.len();
        ct.images.push(ImageAsset {
            index,
            file: file.into(),
            content_type: content_type.to_string(),
            product: product.map(str::to_string),
            width,
            height,
        });
        Ok(self)
    }

    pub fn row(mut self, cells: Vec<CaptionCell>) -> Self {
        self.rows.push(CaptionRow { cells });
        self
    }

    pub fn settings(mut self, settings: SettingsHierarchy) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> SlideResult<ContentModel> {
        let model = ContentModel {
            root: self.root,
            content_types: self.content_types,
            rows: self.rows,
            settings: self.settings,
        };
        model.validate()?;
        Ok(model)
    }

    fn content_type_mut(&mut self, name: &str) -> SlideResult<&mut ContentType> {
        self.content_types
            .get_mut(name)
            .ok_or_else(|| SlideError::validation(format!("unknown content type '{name}'")))
    }
}

/// Shorthand for a caption cell whose product column is parsed like a table cell.
pub fn caption(
    content_type: impl Into<String>,
    product: &str,
    text: impl Into<String>,
) -> SlideResult<CaptionCell> {
    Ok(CaptionCell::new(
        content_type,
        ProductSelector::parse(product)?,
        text,
    ))
}
