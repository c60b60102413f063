#![forbid(unsafe_code)]

//! End-to-end selection scenarios against an in-memory blob view.
//!
//! Run:
//!   cargo test -p blobmark-core --test selection_scenarios

mod common;

use blobmark_core::config::{BlobmarkConfig, FocusLossPolicy, ScrollBlock};
use blobmark_core::{
    HighlightController, LineNumber, LineRange, Modifiers, OverlayBounds, PointerButton,
    SelectionState,
};
use common::{FakePage, LINE_HEIGHT, Node};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn line(raw: u32) -> LineNumber {
    LineNumber::new(raw).expect("non-zero line")
}

fn range(a: u32, b: u32) -> LineRange {
    LineRange::between(line(a), line(b))
}

fn controller(page: FakePage) -> HighlightController<FakePage> {
    HighlightController::new(page, &BlobmarkConfig::default())
}

fn click(controller: &mut HighlightController<FakePage>, raw: u32) {
    controller.press(Node::Text(raw), PointerButton::Primary, Modifiers::empty());
    controller.release(Some(Node::Text(raw)));
}

fn drag(controller: &mut HighlightController<FakePage>, from: u32, to: u32) {
    controller.press(Node::Anchor(from), PointerButton::Primary, Modifiers::empty());
    let step: i64 = if to >= from { 1 } else { -1 };
    let mut current = i64::from(from);
    while current != i64::from(to) {
        current += step;
        let hovered = u32::try_from(current).expect("line in range");
        controller.hover(Node::Text(hovered));
    }
    controller.release(Some(Node::Anchor(to)));
}

#[test]
fn load_with_range_fragment_restores_without_writing() {
    let mut controller = controller(FakePage::with_hash(50, "#n10-20"));
    let hash = controller.host().hash.clone();
    let dispatch = controller.restore(&hash);

    assert_eq!(
        controller.state(),
        SelectionState::Selected {
            range: range(10, 20)
        }
    );
    assert_eq!(controller.last_clicked(), Some(line(10)));
    let page = controller.host();
    assert!(page.fragment_writes.is_empty());
    assert_eq!(page.hash, "#n10-20");
    assert_eq!(page.scrolled, vec![(10, ScrollBlock::Center)]);
    assert_eq!(page.marked_lines(), (10..=20).collect::<Vec<_>>());
    assert_eq!(
        dispatch.overlay,
        Some(OverlayBounds {
            top: 9.0 * LINE_HEIGHT,
            height: 11.0 * LINE_HEIGHT,
        })
    );
}

#[test]
fn load_without_fragment_stays_idle() {
    let mut controller = controller(FakePage::new(50));
    controller.restore("");
    assert_eq!(controller.state(), SelectionState::Idle);
    let page = controller.host();
    assert!(page.scrolled.is_empty());
    assert!(page.marked.is_empty());
    assert!(page.fragment_writes.is_empty());
}

#[test]
fn load_with_foreign_fragment_leaves_url_alone() {
    let mut controller = controller(FakePage::with_hash(50, "#readme"));
    controller.restore("#readme");
    assert_eq!(controller.state(), SelectionState::Idle);
    assert_eq!(controller.host().hash, "#readme");
}

#[test]
fn click_marks_one_line_and_writes_fragment() {
    let mut controller = controller(FakePage::new(50));
    click(&mut controller, 7);

    let page = controller.host();
    assert_eq!(page.hash, "#n7");
    assert_eq!(page.marked_lines(), vec![7]);
    assert_eq!(
        controller.state(),
        SelectionState::Selected {
            range: range(7, 7)
        }
    );
}

#[test]
fn click_then_drag_release_selects_range() {
    let mut controller = controller(FakePage::new(50));
    click(&mut controller, 7);
    drag(&mut controller, 7, 3);

    let page = controller.host();
    assert_eq!(page.hash, "#n3-7");
    assert_eq!(page.marked_lines(), vec![3, 4, 5, 6, 7]);
    let overlay = page.overlay.expect("overlay visible");
    assert_eq!(overlay.top, FakePage::anchor_top(3) - common::GUTTER_TOP);
    assert_eq!(
        overlay.height,
        FakePage::anchor_top(7) + LINE_HEIGHT - FakePage::anchor_top(3)
    );
}

#[test]
fn drag_writes_only_at_commit_points() {
    let mut controller = controller(FakePage::new(80));
    drag(&mut controller, 10, 40);
    assert_eq!(
        controller.host().fragment_writes,
        vec!["#n10".to_owned(), "#n10-40".to_owned()]
    );
}

#[test]
fn shift_click_extends_from_last_clicked() {
    let mut controller = controller(FakePage::new(50));
    click(&mut controller, 5);
    controller.press(Node::Text(2), PointerButton::Primary, Modifiers::SHIFT);
    assert_eq!(controller.host().hash, "#n2-5");
    assert_eq!(controller.last_clicked(), Some(line(5)));

    controller.press(Node::Text(11), PointerButton::Primary, Modifiers::SHIFT);
    assert_eq!(controller.host().hash, "#n5-11");
    assert_eq!(controller.host().marked_lines(), (5..=11).collect::<Vec<_>>());
}

#[test]
fn navigating_back_to_empty_fragment_clears_without_writing() {
    let mut controller = controller(FakePage::new(50));
    click(&mut controller, 7);
    drag(&mut controller, 7, 3);
    let writes_before = controller.host().fragment_writes.len();

    let dispatch = controller.navigate("");
    assert_eq!(controller.state(), SelectionState::Idle);
    assert_eq!(controller.last_clicked(), None);
    let page = controller.host();
    assert!(page.marked.is_empty());
    assert_eq!(page.overlay, None);
    assert_eq!(page.fragment_writes.len(), writes_before);
    assert!(!dispatch.transition.writes_fragment());
}

#[test]
fn navigating_to_range_rehighlights_without_writing() {
    let mut controller = controller(FakePage::new(50));
    click(&mut controller, 7);
    let writes_before = controller.host().fragment_writes.len();
    controller.navigate("#n30-25");
    assert_eq!(controller.host().marked_lines(), (25..=30).collect::<Vec<_>>());
    assert_eq!(controller.host().fragment_writes.len(), writes_before);
    assert_eq!(controller.host().hash, "#n7");
    assert_eq!(controller.last_clicked(), Some(line(25)));
}

#[test]
fn missing_endpoint_anchor_keeps_overlay_hidden() {
    let mut page = FakePage::new(50);
    page.holes.insert(20);
    let mut controller = controller(page);
    let dispatch = controller.restore("#n10-20");
    assert_eq!(dispatch.overlay, None);
    assert_eq!(controller.host().overlay, None);
    assert_eq!(controller.host().marked_lines(), (10..=19).collect::<Vec<_>>());
}

#[test]
fn out_of_view_fragment_hides_overlay() {
    let mut controller = controller(FakePage::new(30));
    controller.restore("#n45-60");
    assert_eq!(controller.host().overlay, None);
    assert!(controller.host().marked.is_empty());
    assert_eq!(
        controller.state(),
        SelectionState::Selected {
            range: range(45, 60)
        }
    );
}

#[test]
fn press_outside_gutter_lines_is_ignored() {
    let mut controller = controller(FakePage::new(30));
    let dispatch = controller.press(Node::Gutter, PointerButton::Primary, Modifiers::empty());
    assert!(dispatch.transition.noop.is_some());
    assert_eq!(controller.state(), SelectionState::Idle);
    assert_eq!(controller.host().text_selection_clears, 0);
}

#[test]
fn release_outside_gutter_commits_last_rendered_range() {
    let mut controller = controller(FakePage::new(30));
    controller.press(Node::Anchor(4), PointerButton::Primary, Modifiers::empty());
    controller.hover(Node::Text(9));
    controller.hover(Node::Content);
    controller.release(Some(Node::Body));
    assert_eq!(controller.host().hash, "#n4-9");
    assert!(!controller.state().is_dragging());
}

#[test]
fn release_without_target_after_focus_loss_is_noop() {
    let mut controller = controller(FakePage::new(30));
    controller.press(Node::Anchor(4), PointerButton::Primary, Modifiers::empty());
    controller.hover(Node::Text(6));
    controller.focus_lost();
    assert_eq!(controller.host().hash, "#n4-6");
    let dispatch = controller.release(None::<Node>);
    assert!(dispatch.transition.noop.is_some());
}

#[test]
fn carry_over_policy_keeps_drag_across_focus_loss() {
    let config = BlobmarkConfig {
        focus_loss: FocusLossPolicy::CarryOver,
        ..BlobmarkConfig::default()
    };
    let mut controller = HighlightController::new(FakePage::new(30), &config);
    controller.press(Node::Anchor(4), PointerButton::Primary, Modifiers::empty());
    controller.focus_lost();
    assert!(controller.state().is_dragging());
    controller.release(Some(Node::Anchor(12)));
    assert_eq!(controller.host().hash, "#n4-12");
}

#[test]
fn history_failure_is_suppressed() {
    let mut page = FakePage::new(30);
    page.fail_history = true;
    let mut controller = controller(page);
    let dispatch = controller.press(Node::Anchor(3), PointerButton::Primary, Modifiers::empty());
    assert_eq!(dispatch.suppressed_failures, 1);
    assert_eq!(controller.host().marked_lines(), vec![3]);
}

proptest! {
    #[test]
    fn drag_endpoints_are_symmetric(a in 1u32..60, b in 1u32..60) {
        let mut forward = controller(FakePage::new(60));
        drag(&mut forward, a, b);
        let mut backward = controller(FakePage::new(60));
        drag(&mut backward, b, a);

        prop_assert_eq!(forward.host().marked_lines(), backward.host().marked_lines());
        prop_assert_eq!(&forward.host().hash, &backward.host().hash);
        prop_assert_eq!(forward.host().overlay, backward.host().overlay);
    }

    #[test]
    fn shift_click_never_moves_anchor(anchor in 1u32..60, clicks in prop::collection::vec(1u32..60, 1..8)) {
        let mut controller = controller(FakePage::new(60));
        click(&mut controller, anchor);
        for target in clicks {
            controller.press(Node::Text(target), PointerButton::Primary, Modifiers::SHIFT);
            prop_assert_eq!(controller.last_clicked(), Some(line(anchor)));
            prop_assert_eq!(
                controller.state(),
                SelectionState::Selected { range: range(anchor, target) }
            );
        }
    }
}
