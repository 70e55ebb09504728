//! Child context creation, buffer splicing, and disposal ordering.


use pdf_canvas::canvas::Paint;
use pdf_canvas::core::{Color, Path};
use test_utils::*;

/// The preamble a child of an unscaled 100x100 root emits: its own save
/// and full-page clip, the rescaled stroke baseline, the inner save,
/// then the replay of the inherited page clip.
fn child_preamble_100() -> String {
    format!(
        "{}0 100 m\n100 100 l\n100 0 l\n0 0 l\nh\nW*\nn\n",
        root_preamble(100, 100)
    )
}

// ============================================================================
// Splicing
// ============================================================================

#[test]
fn test_child_buffer_splices_at_creation_point() {
    let mut root = canvas(100.0, 100.0);
    root.set_paint(Paint::Solid(Color::rgb(255, 0, 0)));
    root.fill(&Path::rectangle(10.0, 10.0, 10.0, 10.0));

    let mut child = root.create_child();
    child.set_paint(Paint::Solid(Color::rgb(0, 0, 255)));
    child.fill(&Path::rectangle(20.0, 20.0, 10.0, 10.0));
    root.dispose();

    let expected = format!(
        "{preamble}{red}{child_preamble}{blue}Q\nQ\nQ\nQ\n",
        preamble = root_preamble(100, 100),
        red = "1 0 0 rg\n10 90 m\n20 90 l\n20 80 l\n10 80 l\nh\nf\n",
        child_preamble = child_preamble_100(),
        blue = "0 0 1 rg\n20 80 m\n30 80 l\n30 70 l\n20 70 l\nh\nf\n",
    );
    assert_eq!(content_text(&root), expected);
}

#[test]
fn test_sibling_children_splice_in_creation_order() {
    let mut root = canvas(100.0, 100.0);
    let mut first = root.create_child();
    let mut second = root.create_child();
    // emission order deliberately reversed
    second.set_paint(Paint::Solid(Color::rgb(0, 0, 255)));
    second.fill(&Path::rectangle(0.0, 0.0, 10.0, 10.0));
    first.set_paint(Paint::Solid(Color::rgb(0, 255, 0)));
    first.fill(&Path::rectangle(0.0, 0.0, 10.0, 10.0));
    root.dispose();

    let content = content_text(&root);
    let green = content.find("0 1 0 rg\n").expect("first child missing");
    let blue = content.find("0 0 1 rg\n").expect("second child missing");
    assert!(green < blue, "children out of creation order");
    assert_eq!(count(&content, "q\n"), 6);
    assert_eq!(count(&content, "Q\n"), 6);
}

#[test]
fn test_nested_children_close_depth_first() {
    let mut root = canvas(100.0, 100.0);
    let mut child = root.create_child();
    let mut grandchild = child.create_child();
    grandchild.fill(&Path::rectangle(0.0, 0.0, 10.0, 10.0));
    root.dispose();

    let content = content_text(&root);
    assert!(content.ends_with("Q\nQ\nQ\nQ\nQ\nQ\n"));
    assert!(child.is_disposed());
    assert!(grandchild.is_disposed());
}

#[test]
fn test_save_restore_balance_across_a_tree() {
    let mut root = canvas(100.0, 100.0);
    let mut left = root.create_child();
    left.fill(&Path::rectangle(0.0, 0.0, 10.0, 10.0));
    let mut inner = left.create_child();
    inner.fill(&Path::rectangle(5.0, 5.0, 10.0, 10.0));
    let mut right = root.create_child();
    right.draw(&Path::line(0.0, 0.0, 50.0, 50.0));
    root.dispose();

    let content = content_text(&root);
    assert_eq!(count(&content, "q\n"), 8, "two per context");
    assert_eq!(count(&content, "Q\n"), 8);
}

// ============================================================================
// Inherited State
// ============================================================================

#[test]
fn test_child_baseline_rescales_with_parent_transform() {
    let mut root = canvas(100.0, 100.0);
    root.scale(2.0, 2.0);
    let mut child = root.create_child();
    child.fill(&Path::rectangle(0.0, 0.0, 10.0, 10.0));
    root.dispose();

    let content = content_text(&root);
    assert!(content.contains("2 w\n2 J\n0 j\n10 M\n[]0 d\n"));
    assert_eq!(count(&content, "W*\nn\n"), 3, "page clip, child clip, replay");
}

#[test]
fn test_inherited_clip_replays_into_the_child() {
    let mut root = canvas(100.0, 100.0);
    root.clip(&Path::rectangle(10.0, 10.0, 40.0, 40.0));
    let mut child = root.create_child();
    child.fill(&Path::rectangle(20.0, 20.0, 10.0, 10.0));
    root.dispose();

    let content = content_text(&root);
    let pass = "10 90 m\n50 90 l\n50 50 l\n10 50 l\nh\nW\nn\n";
    assert_eq!(count(&content, pass), 2, "clip absent from parent or replay");
}

#[test]
fn test_child_inherits_paint_without_reemission_state() {
    let mut root = canvas(100.0, 100.0);
    root.set_paint(Paint::Solid(Color::rgb(255, 0, 0)));
    root.fill(&Path::rectangle(0.0, 0.0, 10.0, 10.0));
    let mut child = root.create_child();
    child.fill(&Path::rectangle(20.0, 20.0, 10.0, 10.0));
    root.dispose();

    // the child's buffer re-emits red even though the parent already did
    assert_eq!(count(&content_text(&root), "1 0 0 rg\n"), 2);
}

// ============================================================================
// Disposal
// ============================================================================

#[test]
fn test_child_dispose_defers_to_root() {
    let mut root = canvas(100.0, 100.0);
    let mut child = root.create_child();
    child.fill(&Path::rectangle(0.0, 0.0, 10.0, 10.0));

    child.dispose();
    assert!(!child.is_disposed(), "child closed before its root");
    assert!(!content_text(&child).ends_with("Q\nQ\n"));

    root.dispose();
    assert!(child.is_disposed());
    assert!(content_text(&child).ends_with("Q\nQ\n"));
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "content appended to a context that has an undisposed child")]
fn test_parent_emission_with_live_child_panics() {
    let mut root = canvas(100.0, 100.0);
    let _child = root.create_child();
    root.fill(&Path::rectangle(0.0, 0.0, 10.0, 10.0));
}
