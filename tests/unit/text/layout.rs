use super::*;
use crate::{
    content::settings::SettingsTemplate,
    text::{fallback::FallbackGlyphs, test_support::BlockFace},
};

fn style(font_size: f64) -> TextStyle {
    TextStyle {
        font_size,
        ..SettingsTemplate::default().plain
    }
}

fn canvas(w: u32, h: u32) -> Canvas {
    Canvas::new(w, h).unwrap()
}

#[test]
fn split_on_delimiter_trims_and_appends_extra_lines() {
    assert_eq!(split_caption("Line A || Line B", &[]), vec!["Line A", "Line B"]);
    assert_eq!(split_caption("  single  ", &[]), vec!["single"]);
    assert_eq!(
        split_caption("a||b", &[" extra ".to_string()]),
        vec!["a", "b", "extra"]
    );
    assert_eq!(split_caption("", &[]), vec![""]);
}

#[test]
fn top_anchor_puts_first_line_above_second() {
    let fallback = FallbackGlyphs::new();
    let renderer = GlyphRenderer::new(&BlockFace, 50.0, &fallback);
    let style = TextStyle {
        vertical_anchor: VerticalAnchor::Top,
        ..style(50.0)
    };

    let lines = layout(
        "Line A || Line B",
        &[],
        canvas(1000, 1000),
        &style,
        Point::new(500.0, 300.0),
        &renderer,
    )
    .lines;

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].text, "Line A");
    assert_eq!(lines[1].text, "Line B");
    assert!(lines[0].baseline.y < lines[1].baseline.y);
    // Top of block at the anchor; ascent 40, line height 50, gap 0.2 * 50.
    assert!((lines[0].baseline.y - 340.0).abs() < 1e-9);
    assert!((lines[1].baseline.y - 400.0).abs() < 1e-9);
    // Centered: width 6 * 30.
    assert!((lines[0].width - 180.0).abs() < 1e-9);
    assert!((lines[0].baseline.x - 410.0).abs() < 1e-9);
}

#[test]
fn empty_caption_still_yields_one_line() {
    let fallback = FallbackGlyphs::new();
    let renderer = GlyphRenderer::new(&BlockFace, 50.0, &fallback);
    let lines = layout(
        "",
        &[],
        canvas(200, 200),
        &style(50.0),
        Point::new(100.0, 100.0),
        &renderer,
    )
    .lines;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].width, 0.0);
}

#[test]
fn greedy_wrap_breaks_at_spaces() {
    let measure = |s: &str| s.chars().count() as f64 * 30.0;
    assert_eq!(
        wrap_line("aaaa bbbb cccc dddd", 360.0, measure),
        vec!["aaaa bbbb", "cccc dddd"]
    );
    assert_eq!(
        wrap_line("ab abcdefghijklmnop cd", 360.0, measure),
        vec!["ab", "abcdefghijklmnop", "cd"]
    );
    assert_eq!(wrap_line("fits", 360.0, measure), vec!["fits"]);
}

#[test]
fn wrap_can_be_disabled() {
    let fallback = FallbackGlyphs::new();
    let renderer = GlyphRenderer::new(&BlockFace, 50.0, &fallback);
    let long = "aaaa bbbb cccc dddd";

    let wrapped = layout(
        long,
        &[],
        canvas(400, 1000),
        &style(50.0),
        Point::new(200.0, 500.0),
        &renderer,
    )
    .lines;
    assert_eq!(wrapped.len(), 2);

    let unwrapped = layout(
        long,
        &[],
        canvas(400, 1000),
        &TextStyle {
            wrap: false,
            ..style(50.0)
        },
        Point::new(200.0, 500.0),
        &renderer,
    )
    .lines;
    assert_eq!(unwrapped.len(), 1);
    // Wider than the usable area: pinned to the left margin.
    assert!((unwrapped[0].baseline.x - 20.0).abs() < 1e-9);
}

#[test]
fn oversized_block_compresses_gap_inside_margins() {
    let fallback = FallbackGlyphs::new();
    let renderer = GlyphRenderer::new(&BlockFace, 50.0, &fallback);
    let style = TextStyle {
        line_gap: 0.5,
        vertical_anchor: VerticalAnchor::Bottom,
        ..style(50.0)
    };

    // Usable height 180 (10..190); natural block 3 * 50 + 2 * 25 = 200.
    let lines = layout(
        "a||b||c",
        &[],
        canvas(200, 200),
        &style,
        Point::new(100.0, 195.0),
        &renderer,
    )
    .lines;

    let ys: Vec<f64> = lines.iter().map(|l| l.baseline.y).collect();
    assert_eq!(ys.len(), 3);
    assert!((ys[0] - 50.0).abs() < 1e-9);
    assert!((ys[1] - 115.0).abs() < 1e-9);
    assert!((ys[2] - 180.0).abs() < 1e-9);
    // Last descender ends exactly on the bottom margin.
    assert!(ys[2] + 10.0 <= 190.0 + 1e-9);
}

#[test]
fn horizontal_alignment_is_clamped_into_margins() {
    let fallback = FallbackGlyphs::new();
    let renderer = GlyphRenderer::new(&BlockFace, 50.0, &fallback);
    let place = |align: HorizontalAlign, x: f64| {
        let style = TextStyle {
            horizontal_align: align,
            ..style(50.0)
        };
        layout(
            "Line A",
            &[],
            canvas(400, 400),
            &style,
            Point::new(x, 200.0),
            &renderer,
        )
        .lines[0]
        .baseline
        .x
    };

    assert!((place(HorizontalAlign::Right, 350.0) - 170.0).abs() < 1e-9);
    assert!((place(HorizontalAlign::Right, 390.0) - 200.0).abs() < 1e-9);
    assert!((place(HorizontalAlign::Left, 390.0) - 200.0).abs() < 1e-9);
    assert!((place(HorizontalAlign::Left, 0.0) - 20.0).abs() < 1e-9);
    assert!((place(HorizontalAlign::Center, 200.0) - 110.0).abs() < 1e-9);
}

#[test]
fn distributed_parts_sit_on_even_rows() {
    let fallback = FallbackGlyphs::new();
    let renderer = GlyphRenderer::new(&BlockFace, 50.0, &fallback);
    let style = TextStyle {
        spacing: SpacingMode::Distributed,
        margins: Margins {
            top: 0.1,
            bottom: 0.1,
            left: 0.05,
            right: 0.05,
        },
        ..style(50.0)
    };

    let lines = layout(
        "one || two || three",
        &[],
        canvas(1000, 1000),
        &style,
        Point::new(500.0, 0.0),
        &renderer,
    )
    .lines;

    let ys: Vec<f64> = lines.iter().map(|l| l.baseline.y).collect();
    // Anchors at 300/500/700; each one-line block centered (top = anchor - 25, + ascent 40).
    assert_eq!(ys.len(), 3);
    for (y, anchor) in ys.iter().zip([300.0, 500.0, 700.0]) {
        assert!((y - (anchor + 15.0)).abs() < 1e-9, "{y} vs {anchor}");
    }
}

#[test]
fn fitting_block_reports_no_overflow() {
    let fallback = FallbackGlyphs::new();
    let renderer = GlyphRenderer::new(&BlockFace, 50.0, &fallback);
    let style = TextStyle {
        line_gap: 0.5,
        ..style(50.0)
    };

    // Compressed to exactly the usable height.
    let laid = layout(
        "a||b||c",
        &[],
        canvas(200, 200),
        &style,
        Point::new(100.0, 100.0),
        &renderer,
    );
    assert_eq!(laid.lines.len(), 3);
    assert_eq!(laid.overflow, None);
}

#[test]
fn too_many_lines_are_reported_as_vertical_overflow() {
    let fallback = FallbackGlyphs::new();
    let renderer = GlyphRenderer::new(&BlockFace, 50.0, &fallback);

    // Usable 10..190; five 50 px lines with no gap still need 250.
    let laid = layout(
        "a||b||c||d||e",
        &[],
        canvas(200, 200),
        &style(50.0),
        Point::new(100.0, 100.0),
        &renderer,
    );

    let ys: Vec<f64> = laid.lines.iter().map(|l| l.baseline.y).collect();
    assert_eq!(ys, vec![50.0, 100.0, 150.0, 200.0, 250.0]);
    let overflow = laid.overflow.unwrap();
    assert_eq!(overflow.caption, "a||b||c||d||e");
    assert_eq!(overflow.lines, 5);
    assert!((overflow.vertical - 70.0).abs() < 1e-9);
    assert_eq!(overflow.horizontal, 0.0);
}

#[test]
fn wide_word_is_reported_as_horizontal_overflow() {
    let fallback = FallbackGlyphs::new();
    let renderer = GlyphRenderer::new(&BlockFace, 50.0, &fallback);

    // 16 * 30 = 480 px against a usable width of 360; wrapping cannot split a word.
    let laid = layout(
        "abcdefghijklmnop",
        &[],
        canvas(400, 400),
        &style(50.0),
        Point::new(200.0, 200.0),
        &renderer,
    );

    assert_eq!(laid.lines.len(), 1);
    assert!((laid.lines[0].baseline.x - 20.0).abs() < 1e-9);
    let overflow = laid.overflow.unwrap();
    assert_eq!(overflow.lines, 1);
    assert_eq!(overflow.vertical, 0.0);
    assert!((overflow.horizontal - 120.0).abs() < 1e-9);

    let unwrapped = layout(
        "aaaa bbbb cccc dddd",
        &[],
        canvas(400, 1000),
        &TextStyle {
            wrap: false,
            ..style(50.0)
        },
        Point::new(200.0, 500.0),
        &renderer,
    );
    assert!((unwrapped.overflow.unwrap().horizontal - 210.0).abs() < 1e-9);
}

#[test]
fn distributed_rows_keep_a_minimum_margin_at_both_ends() {
    let fallback = FallbackGlyphs::new();
    let renderer = GlyphRenderer::new(&BlockFace, 50.0, &fallback);
    let style = TextStyle {
        spacing: SpacingMode::Distributed,
        margins: Margins {
            top: 0.0,
            bottom: 0.0,
            left: 0.05,
            right: 0.05,
        },
        ..style(50.0)
    };

    let laid = layout(
        "one || two",
        &[],
        canvas(1000, 1000),
        &style,
        Point::new(500.0, 0.0),
        &renderer,
    );

    // Rows span 50..950, so anchors sit at 350 and 650.
    let ys: Vec<f64> = laid.lines.iter().map(|l| l.baseline.y).collect();
    assert_eq!(ys.len(), 2);
    assert!((ys[0] - 365.0).abs() < 1e-9, "{}", ys[0]);
    assert!((ys[1] - 665.0).abs() < 1e-9, "{}", ys[1]);
    assert_eq!(laid.overflow, None);
}
