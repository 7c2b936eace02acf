use super::*;

fn font_size_layer(size: f64) -> SettingsLayer {
    SettingsLayer {
        plain: Some(StyleLayer {
            font_size: Some(size),
            ..StyleLayer::default()
        }),
        ..SettingsLayer::default()
    }
}

#[test]
fn default_template_is_valid() {
    let t = SettingsTemplate::default();
    t.validate().unwrap();
    assert_eq!(t.default_text_type, TextType::Plain);
    assert_eq!(t.plain.font_size, 70.0);
    assert_eq!(t.plain.style_value, 2.0);
    assert_eq!(t.highlight.style_value, 20.0);
}

#[test]
fn resolve_follows_precedence() {
    let mut h = SettingsHierarchy::default();
    assert_eq!(h.resolve("hook", Some("zinc")).style.font_size, 70.0);

    h.products.insert("zinc".to_string(), font_size_layer(10.0));
    assert_eq!(h.resolve("hook", Some("zinc")).style.font_size, 10.0);

    h.content_types.insert("hook".to_string(), font_size_layer(20.0));
    assert_eq!(h.resolve("hook", Some("zinc")).style.font_size, 20.0);

    h.overrides
        .entry("hook".to_string())
        .or_default()
        .insert("zinc".to_string(), font_size_layer(30.0));
    assert_eq!(h.resolve("hook", Some("zinc")).style.font_size, 30.0);

    // Other scopes are unaffected.
    assert_eq!(h.resolve("story", Some("zinc")).style.font_size, 10.0);
    assert_eq!(h.resolve("hook", None).style.font_size, 20.0);
    assert_eq!(h.resolve("story", None).style.font_size, 70.0);
}

#[test]
fn layer_can_switch_text_type() {
    let mut h = SettingsHierarchy::default();
    h.content_types.insert(
        "cta".to_string(),
        SettingsLayer {
            text_type: Some(TextType::Highlight),
            ..SettingsLayer::default()
        },
    );
    let s = h.resolve("cta", None);
    assert_eq!(s.text_type, TextType::Highlight);
    assert_eq!(s.style.style_value, 20.0);
    assert!(s.style.colors[0].background.is_some());
}

#[test]
fn validate_requires_style_color_keys() {
    let mut style = SettingsTemplate::default().plain;
    style.colors[0].outline = None;
    let err = style.validate(TextType::Plain).unwrap_err();
    assert!(err.to_string().contains("outline"));

    let style = SettingsTemplate::default().plain;
    let err = style.validate(TextType::Highlight).unwrap_err();
    assert!(err.to_string().contains("background"));
}

#[test]
fn validate_rejects_bad_geometry() {
    let mut style = SettingsTemplate::default().plain;
    style.margins.left = 0.6;
    assert!(style.validate(TextType::Plain).is_err());

    let mut style = SettingsTemplate::default().plain;
    style.position.vertical = [0.9, 0.1];
    assert!(style.validate(TextType::Plain).is_err());

    let mut style = SettingsTemplate::default().plain;
    style.font_size = 0.0;
    assert!(style.validate(TextType::Plain).is_err());
}

#[test]
fn template_parses_from_json_with_defaults() {
    let json = r##"{
        "default_text_type": "highlight",
        "plain": {
            "style_value": 3,
            "colors": [{"text": "#FFFFFF", "outline": "#000000"}]
        },
        "highlight": {
            "font_size": 48,
            "style_value": 12,
            "colors": [{"text": "#000000", "background": "#FFFFFF"}],
            "spacing": "distributed",
            "vertical_anchor": "top"
        }
    }"##;
    let t: SettingsTemplate = serde_json::from_str(json).unwrap();
    t.validate().unwrap();
    assert_eq!(t.default_text_type, TextType::Highlight);
    assert_eq!(t.plain.font_size, 70.0);
    assert_eq!(t.plain.margins, Margins::default());
    assert_eq!(t.highlight.spacing, SpacingMode::Distributed);
    assert_eq!(t.highlight.vertical_anchor, VerticalAnchor::Top);
    assert!(t.highlight.wrap);
}

#[test]
fn layer_rejects_unknown_fields() {
    let err = serde_json::from_str::<SettingsLayer>(r#"{"plain": {"fontsize": 3}}"#);
    assert!(err.is_err());
}
