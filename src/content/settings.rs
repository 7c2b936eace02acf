use std::collections::BTreeMap;

use crate::foundation::{
    core::Rgba8,
    error::{SlideError, SlideResult},
};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TextType {
    /// Outline-stroked text, no background shape.
    #[default]
    Plain,
    /// Fill-only text on a rounded-rectangle panel per line.
    Highlight,
}

impl TextType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Highlight => "highlight",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Which edge of the line block sits on the vertical anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAnchor {
    Top,
    #[default]
    Center,
    Bottom,
}

/// How the parts of a multi-caption are spread over the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpacingMode {
    /// One block of lines around the anchor.
    #[default]
    Stacked,
    /// Each caption part on its own evenly spaced anchor across the usable height.
    Distributed,
}

/// One colour choice. `outline` is required by plain text, `background` by highlight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Palette {
    pub text: Rgba8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<Rgba8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Rgba8>,
}

/// Margins as fractions of the canvas side they apply to.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Margins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 0.05,
            bottom: 0.05,
            left: 0.05,
            right: 0.05,
        }
    }
}

/// Anchor ranges as canvas fractions. The anchor is drawn uniformly from each range and then
/// offset by a uniform jitter in `[-jitter, +jitter]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Position {
    pub vertical: [f64; 2],
    pub horizontal: [f64; 2],
    #[serde(default)]
    pub vertical_jitter: f64,
    #[serde(default)]
    pub horizontal_jitter: f64,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            vertical: [0.7, 0.8],
            horizontal: [0.45, 0.55],
            vertical_jitter: 0.01,
            horizontal_jitter: 0.02,
        }
    }
}

/// Fully resolved style block for one text type.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextStyle {
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    /// Outline width for plain text, corner radius for highlight.
    pub style_value: f64,
    pub colors: Vec<Palette>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub margins: Margins,
    #[serde(default)]
    pub horizontal_align: HorizontalAlign,
    #[serde(default)]
    pub vertical_anchor: VerticalAnchor,
    #[serde(default)]
    pub spacing: SpacingMode,
    /// Gap between stacked lines as a ratio of `font_size`.
    #[serde(default = "default_line_gap")]
    pub line_gap: f64,
    #[serde(default = "default_highlight_padding")]
    pub highlight_padding: f64,
    #[serde(default = "default_wrap")]
    pub wrap: bool,
}

fn default_font_size() -> f64 {
    70.0
}

fn default_line_gap() -> f64 {
    0.2
}

fn default_highlight_padding() -> f64 {
    20.0
}

fn default_wrap() -> bool {
    true
}

impl TextStyle {
    fn default_plain() -> Self {
        Self {
            font_size: default_font_size(),
            style_value: 2.0,
            colors: vec![
                Palette {
                    text: Rgba8::WHITE,
                    outline: Some(Rgba8::BLACK),
                    background: None,
                },
                Palette {
                    text: Rgba8::BLACK,
                    outline: Some(Rgba8::WHITE),
                    background: None,
                },
            ],
            position: Position::default(),
            margins: Margins::default(),
            horizontal_align: HorizontalAlign::Center,
            vertical_anchor: VerticalAnchor::Center,
            spacing: SpacingMode::Stacked,
            line_gap: default_line_gap(),
            highlight_padding: default_highlight_padding(),
            wrap: true,
        }
    }

    fn default_highlight() -> Self {
        Self {
            style_value: 20.0,
            colors: vec![
                Palette {
                    text: Rgba8::BLACK,
                    outline: None,
                    background: Some(Rgba8::WHITE),
                },
                Palette {
                    text: Rgba8::WHITE,
                    outline: None,
                    background: Some(Rgba8::opaque(255, 0, 0)),
                },
            ],
            position: Position {
                vertical: [0.6, 0.8],
                ..Position::default()
            },
            ..Self::default_plain()
        }
    }

    pub fn validate(&self, text_type: TextType) -> SlideResult<()> {
        let ctx = text_type.as_str();
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(SlideError::validation(format!(
                "{ctx}: font_size must be finite and > 0"
            )));
        }
        if !self.style_value.is_finite() || self.style_value < 0.0 {
            return Err(SlideError::validation(format!(
                "{ctx}: style_value must be finite and >= 0"
            )));
        }
        if !self.line_gap.is_finite() || self.line_gap < 0.0 {
            return Err(SlideError::validation(format!(
                "{ctx}: line_gap must be finite and >= 0"
            )));
        }
        if !self.highlight_padding.is_finite() || self.highlight_padding < 0.0 {
            return Err(SlideError::validation(format!(
                "{ctx}: highlight_padding must be finite and >= 0"
            )));
        }
        if self.colors.is_empty() {
            return Err(SlideError::validation(format!(
                "{ctx}: colors must contain at least one palette"
            )));
        }
        for (i, p) in self.colors.iter().enumerate() {
            match text_type {
                TextType::Plain if p.outline.is_none() => {
                    return Err(SlideError::validation(format!(
                        "{ctx}: colors[{i}] is missing required key 'outline'"
                    )));
                }
                TextType::Highlight if p.background.is_none() => {
                    return Err(SlideError::validation(format!(
                        "{ctx}: colors[{i}] is missing required key 'background'"
                    )));
                }
                _ => {}
            }
        }

        let m = self.margins;
        for (name, v) in [
            ("top", m.top),
            ("bottom", m.bottom),
            ("left", m.left),
            ("right", m.right),
        ] {
            if !v.is_finite() || !(0.0..0.5).contains(&v) {
                return Err(SlideError::validation(format!(
                    "{ctx}: margins.{name} must be in [0, 0.5)"
                )));
            }
        }

        let p = self.position;
        for (name, [lo, hi]) in [("vertical", p.vertical), ("horizontal", p.horizontal)] {
            if !lo.is_finite() || !hi.is_finite() || lo > hi || lo < 0.0 || hi > 1.0 {
                return Err(SlideError::validation(format!(
                    "{ctx}: position.{name} must be [min, max] with 0 <= min <= max <= 1"
                )));
            }
        }
        for (name, j) in [
            ("vertical_jitter", p.vertical_jitter),
            ("horizontal_jitter", p.horizontal_jitter),
        ] {
            if !j.is_finite() || j < 0.0 {
                return Err(SlideError::validation(format!(
                    "{ctx}: position.{name} must be finite and >= 0"
                )));
            }
        }
        Ok(())
    }
}

/// The global default settings document.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsTemplate {
    #[serde(default)]
    pub default_text_type: TextType,
    pub plain: TextStyle,
    pub highlight: TextStyle,
}

impl Default for SettingsTemplate {
    fn default() -> Self {
        Self {
            default_text_type: TextType::Plain,
            plain: TextStyle::default_plain(),
            highlight: TextStyle::default_highlight(),
        }
    }
}

impl SettingsTemplate {
    pub fn style(&self, text_type: TextType) -> &TextStyle {
        match text_type {
            TextType::Plain => &self.plain,
            TextType::Highlight => &self.highlight,
        }
    }

    fn apply(&mut self, layer: &SettingsLayer) {
        if let Some(t) = layer.text_type {
            self.default_text_type = t;
        }
        if let Some(p) = &layer.plain {
            p.apply_to(&mut self.plain);
        }
        if let Some(h) = &layer.highlight {
            h.apply_to(&mut self.highlight);
        }
    }

    pub fn validate(&self) -> SlideResult<()> {
        self.plain.validate(TextType::Plain)?;
        self.highlight.validate(TextType::Highlight)
    }
}

/// Partial style block; set fields replace the value from the layer below.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleLayer {
    pub font_size: Option<f64>,
    pub style_value: Option<f64>,
    pub colors: Option<Vec<Palette>>,
    pub position: Option<Position>,
    pub margins: Option<Margins>,
    pub horizontal_align: Option<HorizontalAlign>,
    pub vertical_anchor: Option<VerticalAnchor>,
    pub spacing: Option<SpacingMode>,
    pub line_gap: Option<f64>,
    pub highlight_padding: Option<f64>,
    pub wrap: Option<bool>,
}

impl StyleLayer {
    fn apply_to(&self, style: &mut TextStyle) {
        if let Some(v) = self.font_size {
            style.font_size = v;
        }
        if let Some(v) = self.style_value {
            style.style_value = v;
        }
        if let Some(v) = &self.colors {
            style.colors = v.clone();
        }
        if let Some(v) = self.position {
            style.position = v;
        }
        if let Some(v) = self.margins {
            style.margins = v;
        }
        if let Some(v) = self.horizontal_align {
            style.horizontal_align = v;
        }
        if let Some(v) = self.vertical_anchor {
            style.vertical_anchor = v;
        }
        if let Some(v) = self.spacing {
            style.spacing = v;
        }
        if let Some(v) = self.line_gap {
            style.line_gap = v;
        }
        if let Some(v) = self.highlight_padding {
            style.highlight_padding = v;
        }
        if let Some(v) = self.wrap {
            style.wrap = v;
        }
    }
}

/// One override level in the settings hierarchy.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsLayer {
    pub text_type: Option<TextType>,
    pub plain: Option<StyleLayer>,
    pub highlight: Option<StyleLayer>,
}

/// Settings for one rendered image.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub text_type: TextType,
    pub style: TextStyle,
}

/// Layered settings, resolved with precedence
/// product+content override > content-type override > product override > global template.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SettingsHierarchy {
    pub template: SettingsTemplate,
    pub products: BTreeMap<String, SettingsLayer>,
    pub content_types: BTreeMap<String, SettingsLayer>,
    /// Keyed by content type, then product.
    pub overrides: BTreeMap<String, BTreeMap<String, SettingsLayer>>,
}

impl SettingsHierarchy {
    pub fn new(template: SettingsTemplate) -> Self {
        Self {
            template,
            ..Self::default()
        }
    }

    /// Resolves settings for an image of `content_type` owned by `product` (`None` when the
    /// image has no product).
    pub fn resolve(&self, content_type: &str, product: Option<&str>) -> Settings {
        let mut merged = self.template.clone();

        if let Some(layer) = product.and_then(|p| self.products.get(p)) {
            merged.apply(layer);
        }
        if let Some(layer) = self.content_types.get(content_type) {
            merged.apply(layer);
        }
        if let Some(layer) = product.and_then(|p| {
            self.overrides
                .get(content_type)
                .and_then(|by_product| by_product.get(p))
        }) {
            merged.apply(layer);
        }

        let text_type = merged.default_text_type;
        let style = match text_type {
            TextType::Plain => merged.plain,
            TextType::Highlight => merged.highlight,
        };
        Settings { text_type, style }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/content/settings.rs"]
mod tests;
