//! Property-based tests for operand formatting, stroke diffing,
//! transforms, clipping, and disposal invariants.


use pdf_canvas::canvas::stroke::emit_stroke_diff;
use pdf_canvas::canvas::{FontSpec, LineCap, LineJoin, Stroke, StrokeStyle};
use pdf_canvas::content::ContentStream;
use pdf_canvas::core::{Matrix, Path};
use proptest::prelude::*;
use test_utils::*;

// ============================================================================
// Operand Formatting Property Tests
// ============================================================================

/// Property: integer-valued operands format without a decimal point
proptest! {
    #[test]
    fn prop_integer_operands_format_bare(n in -1_000_000i64..1_000_000i64) {
        let mut sink = ContentStream::new();
        sink.concat_matrix(&Matrix::translation(n as f64, n as f64));

        let text = String::from_utf8(sink.bytes().to_vec()).unwrap();
        prop_assert_eq!(text, format!("1 0 0 1 {0} {0} cm\n", n));
    }
}

/// Property: fractional operands keep no trailing zeros and parse back
/// to within the six-decimal quantum
proptest! {
    #[test]
    fn prop_fractional_operands_round_trip(n in -1e6f64..1e6f64) {
        let mut sink = ContentStream::new();
        sink.concat_matrix(&Matrix::translation(n, 0.0));

        let text = String::from_utf8(sink.bytes().to_vec()).unwrap();
        let token = text.split_whitespace().nth(4).unwrap();
        if token.contains('.') {
            prop_assert!(!token.ends_with('0'), "trailing zero in {}", token);
            prop_assert!(!token.ends_with('.'), "trailing dot in {}", token);
        }

        let parsed: f64 = token.parse().unwrap();
        prop_assert!((parsed - n).abs() <= 1e-6, "{} reread as {}", n, parsed);
    }
}

// ============================================================================
// Stroke Diff Property Tests
// ============================================================================

/// Property: a stroke diffed against itself emits nothing
proptest! {
    #[test]
    fn prop_identical_stroke_diff_is_empty(
        width in 0.1f64..50.0,
        cap in 0u8..3,
        join in 0u8..3,
        miter in 1.0f64..20.0,
        dash in prop::collection::vec(0.5f64..10.0, 0..4),
        phase in 0.0f64..5.0,
    ) {
        let mut style = StrokeStyle::new(width)
            .with_cap(LineCap::from_code(cap))
            .with_join(LineJoin::from_code(join))
            .with_miter_limit(miter);
        if !dash.is_empty() {
            style = style.with_dash(&dash, phase);
        }

        let mut sink = ContentStream::new();
        emit_stroke_diff(&mut sink, &style, Some(&style));
        prop_assert!(sink.is_empty());
    }
}

/// Property: clearing any dash emits exactly one reset instruction
proptest! {
    #[test]
    fn prop_clearing_any_dash_emits_one_reset(
        dash in prop::collection::vec(0.5f64..10.0, 1..4),
        phase in 0.0f64..5.0,
    ) {
        let dashed = StrokeStyle::new(1.0).with_dash(&dash, phase);
        let mut sink = ContentStream::new();
        emit_stroke_diff(&mut sink, &StrokeStyle::default(), Some(&dashed));

        let text = String::from_utf8(sink.bytes().to_vec()).unwrap();
        prop_assert_eq!(text, "[]0 d\n");
    }
}

/// Property: a stroke diffed from nothing emits every attribute once,
/// in operator order
proptest! {
    #[test]
    fn prop_stroke_diff_from_nothing_emits_all(width in 0.1f64..50.0, miter in 1.0f64..20.0) {
        let style = StrokeStyle::new(width).with_miter_limit(miter);
        let mut sink = ContentStream::new();
        emit_stroke_diff(&mut sink, &style, None);

        let text = String::from_utf8(sink.bytes().to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        prop_assert_eq!(lines.len(), 5);
        for (line, op) in lines.iter().zip(["w", "J", "j", "M", "d"]) {
            prop_assert!(line.ends_with(op), "{} does not end with {}", line, op);
        }
    }
}

/// Property: the emitted stroke width tracks the transform's uniform
/// scale
proptest! {
    #[test]
    fn prop_width_follows_uniform_scale(
        width in 0.5f64..5.0,
        sx in 0.5f64..4.0,
        sy in 0.5f64..4.0,
    ) {
        let mut canvas = canvas(100.0, 100.0);
        canvas.scale(sx, sy);
        canvas.set_stroke(Stroke::Standard(StrokeStyle::new(width)));
        canvas.draw(&Path::line(0.0, 0.0, 10.0, 0.0));

        let content = content_text(&canvas);
        let emitted = content
            .lines()
            .filter(|line| line.ends_with(" w"))
            .next_back()
            .and_then(|line| line.strip_suffix(" w"))
            .unwrap()
            .parse::<f64>()
            .unwrap();
        let expected = width * (sx * sy).sqrt();
        prop_assert!((emitted - expected).abs() < 1e-4, "{} vs {}", emitted, expected);
    }
}

// ============================================================================
// Transform Property Tests
// ============================================================================

/// Property: flipping Y twice is the identity
proptest! {
    #[test]
    fn prop_flip_y_is_an_involution(
        x in -1e3f64..1e3,
        y in -1e3f64..1e3,
        height in 1.0f64..2000.0,
    ) {
        let flip = Matrix::flip_y(height);
        let (x1, y1) = flip.apply(x, y);
        let (x2, y2) = flip.apply(x1, y1);
        prop_assert!((x2 - x).abs() < 1e-9);
        prop_assert!((y2 - y).abs() < 1e-9);
    }
}

/// Property: a well-conditioned matrix composed with its inverse maps
/// every point to itself
proptest! {
    #[test]
    fn prop_inverse_round_trips_points(
        tx in -1e3f64..1e3,
        ty in -1e3f64..1e3,
        theta in -std::f64::consts::PI..std::f64::consts::PI,
        sx in 0.2f64..5.0,
        sy in 0.2f64..5.0,
        x in -100.0f64..100.0,
        y in -100.0f64..100.0,
    ) {
        let mut m = Matrix::translation(tx, ty);
        m.rotate(theta);
        m.scale(sx, sy);

        let inverse = m.invert();
        prop_assert!(inverse.is_some());
        let inverse = inverse.unwrap();

        let (fx, fy) = m.apply(x, y);
        let (bx, by) = inverse.apply(fx, fy);
        prop_assert!((bx - x).abs() < 1e-6, "{} came back as {}", x, bx);
        prop_assert!((by - y).abs() < 1e-6, "{} came back as {}", y, by);
    }
}

/// Property: rotation never changes the uniform scale
proptest! {
    #[test]
    fn prop_rotation_keeps_uniform_scale(
        theta in -std::f64::consts::PI..std::f64::consts::PI,
        s in 0.5f64..4.0,
    ) {
        let mut m = Matrix::scaling(s, s);
        m.rotate(theta);
        let us = m.uniform_scale();
        prop_assert!((us - s).abs() < 1e-9 * s.max(1.0), "{} vs {}", us, s);
    }
}

// ============================================================================
// Clip Property Tests
// ============================================================================

/// Property: sequential rectangle clips accumulate as a progressive
/// intersection
proptest! {
    #[test]
    fn prop_clip_bounds_tracks_rect_intersection(
        rects in prop::collection::vec(
            (0.0f64..40.0, 0.0f64..40.0, 60.0f64..100.0, 60.0f64..100.0),
            1..4,
        ),
    ) {
        let mut canvas = canvas(100.0, 100.0);
        let mut x0: f64 = 0.0;
        let mut y0: f64 = 0.0;
        let mut x1: f64 = 100.0;
        let mut y1: f64 = 100.0;
        for &(x, y, max_x, max_y) in &rects {
            canvas.clip(&Path::rectangle(x, y, max_x - x, max_y - y));
            x0 = x0.max(x);
            y0 = y0.max(y);
            x1 = x1.min(max_x);
            y1 = y1.min(max_y);
        }

        let bounds = canvas.clip_bounds().unwrap();
        prop_assert!((bounds.x - x0).abs() < 1e-9);
        prop_assert!((bounds.y - y0).abs() < 1e-9);
        prop_assert!((bounds.max_x() - x1).abs() < 1e-9);
        prop_assert!((bounds.max_y() - y1).abs() < 1e-9);
        // page rectangle plus one shape per clip call
        prop_assert_eq!(canvas.clip_paths().unwrap().len(), rects.len() + 1);
    }
}

// ============================================================================
// Text Synthesis Property Tests
// ============================================================================

/// Property: weights below the synthesis threshold never stroke text
proptest! {
    #[test]
    fn prop_light_weights_never_synthesize_bold(weight in 1.0f32..1.24f32) {
        let mut canvas = letter_canvas();
        canvas.set_font(FontSpec::new("Helvetica", 12.0).with_weight(weight));
        canvas.draw_text("Hi", 10.0, 20.0).unwrap();
        prop_assert!(!content_text(&canvas).contains("2 Tr\n"));
    }
}

/// Property: weights at or above the threshold stroke text
proptest! {
    #[test]
    fn prop_heavy_weights_synthesize_bold(weight in 1.25f32..3.4f32) {
        let mut canvas = letter_canvas();
        canvas.set_font(FontSpec::new("Helvetica", 12.0).with_weight(weight));
        canvas.draw_text("Hi", 10.0, 20.0).unwrap();
        prop_assert!(content_text(&canvas).contains("2 Tr\n"));
    }
}

// ============================================================================
// Disposal Property Tests
// ============================================================================

/// Property: disposal balances every save with a restore, for any mix
/// of root content and children
proptest! {
    #[test]
    fn prop_disposal_balances_saves_and_restores(
        rects in prop::collection::vec((0u32..80, 0u32..80, 1u32..20, 1u32..20), 0..12),
        children in 0usize..4,
    ) {
        let mut root = canvas(100.0, 100.0);
        for &(x, y, w, h) in &rects {
            root.fill(&Path::rectangle(x as f64, y as f64, w as f64, h as f64));
        }
        for _ in 0..children {
            let mut child = root.create_child();
            child.fill(&Path::rectangle(10.0, 10.0, 20.0, 20.0));
        }
        root.dispose();

        let content = content_text(&root);
        prop_assert_eq!(count(&content, "q\n"), count(&content, "Q\n"));
        prop_assert!(content.ends_with("Q\nQ\n"));
    }
}

// ============================================================================
// Encoding Option Property Tests
// ============================================================================

/// Property: the stored JPEG quality is always within the unit range
proptest! {
    #[test]
    fn prop_jpeg_quality_always_clamped(q in -10.0f32..10.0f32) {
        let mut canvas = canvas(10.0, 10.0);
        canvas.set_jpeg_quality(q);
        let stored = canvas.jpeg_quality();
        prop_assert!((0.0..=1.0).contains(&stored), "stored {}", stored);
    }
}

// ============================================================================
// Formatting Edge Cases
// ============================================================================

#[test]
fn test_negative_zero_formats_as_zero() {
    let mut sink = ContentStream::new();
    sink.set_line_width(-0.0);
    assert_eq!(sink.bytes(), b"0 w\n");
}

#[test]
fn test_non_finite_operands_format_as_zero() {
    let mut sink = ContentStream::new();
    sink.set_line_width(f64::NAN);
    sink.set_line_width(f64::INFINITY);
    sink.set_line_width(f64::NEG_INFINITY);
    assert_eq!(sink.bytes(), b"0 w\n0 w\n0 w\n");
}

#[test]
fn test_tiny_fractions_collapse_to_zero() {
    let mut sink = ContentStream::new();
    sink.set_line_width(1e-9);
    assert_eq!(sink.bytes(), b"0 w\n");
}
