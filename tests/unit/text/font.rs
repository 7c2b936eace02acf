use super::*;
use crate::text::test_support::BlockFace;

#[test]
fn scaled_face_metrics() {
    let face = BlockFace;
    let scaled = ScaledFace::new(&face, 50.0);
    let close = |a: f64, b: f64| (a - b).abs() < 1e-9;
    assert!(close(scaled.scale(), 0.05));
    assert!(close(scaled.ascent(), 40.0));
    assert!(close(scaled.descent(), 10.0));
    assert!(close(scaled.line_height(), 50.0));
    assert!(close(scaled.advance_px(u16::from(b'A')), 30.0));
}

#[test]
fn has_glyph_defaults_to_cmap_lookup() {
    let face = BlockFace;
    assert!(face.has_glyph('A'));
    assert!(!face.has_glyph('\u{1F600}'));
}

#[test]
fn ttf_face_rejects_garbage() {
    let err = TtfFace::from_bytes(vec![0u8; 16], 0).unwrap_err();
    assert!(err.to_string().contains("parse font face"));
}

#[test]
fn ttf_face_load_reports_missing_file() {
    let err = TtfFace::load(Path::new("target/no_such_font.ttf")).unwrap_err();
    assert!(err.to_string().contains("no_such_font.ttf"));
}

#[test]
fn outline_builder_flips_y_around_baseline() {
    let mut b = GlyphPathBuilder::new(Point::new(10.0, 100.0), 0.5);
    b.move_to(0.0, 0.0);
    b.line_to(20.0, 40.0);
    b.close();
    let pts: Vec<Point> = b
        .path
        .elements()
        .iter()
        .filter_map(|el| match el {
            kurbo::PathEl::MoveTo(p) | kurbo::PathEl::LineTo(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert_eq!(pts, vec![Point::new(10.0, 100.0), Point::new(20.0, 80.0)]);
}
