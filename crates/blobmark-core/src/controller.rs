//! Effect execution for one blob view.
//!
//! [`HighlightController`] owns the [`SelectionMachine`] for a view and the
//! host that renders it. Every public entry point applies exactly one event
//! and then runs the resulting effects in order. A failing host call is
//! logged and skipped; the remaining effects still run and the machine state
//! is already committed, so a broken overlay never blocks the fragment write
//! (or vice versa).

use tracing::{debug, warn};

use crate::bridge::{NavigationKind, navigation_event};
use crate::config::{BlobmarkConfig, ScrollBlock};
use crate::error::Result;
use crate::fragment;
use crate::line::{LineNumber, LineRange};
use crate::locator::{LocatorNode, locate};
use crate::machine::{
    Modifiers, PointerButton, SelectionEffect, SelectionEvent, SelectionMachine, SelectionState,
    SelectionTransition,
};
use crate::overlay::{LineGeometry, OverlayBounds, position};

/// Rendering and navigation surface of a blob view.
pub trait HighlightHost: LineGeometry {
    /// Highest line number present in the gutter; marking stops there.
    fn last_line(&self) -> Option<LineNumber>;

    /// Remove the highlight marker from every gutter anchor.
    fn clear_line_marks(&mut self) -> Result<()>;

    /// Mark one gutter anchor. Returns `false` when the anchor is missing.
    fn mark_line(&mut self, line: LineNumber) -> Result<bool>;

    fn show_overlay(&mut self, bounds: OverlayBounds) -> Result<()>;

    fn hide_overlay(&mut self) -> Result<()>;

    /// Replace the current history entry's fragment with `hash` (`#n3-7`).
    fn replace_fragment(&mut self, hash: &str) -> Result<()>;

    fn scroll_into_view(&mut self, line: LineNumber, block: ScrollBlock) -> Result<()>;

    fn clear_text_selection(&mut self) -> Result<()>;
}

/// Result of one controller dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub transition: SelectionTransition,
    /// Overlay placement after the dispatch, when a highlight was rendered.
    pub overlay: Option<OverlayBounds>,
    /// Number of host calls that failed and were suppressed.
    pub suppressed_failures: u32,
}

pub struct HighlightController<H> {
    machine: SelectionMachine,
    host: H,
    scroll_block: ScrollBlock,
    last_transition: Option<SelectionTransition>,
}

impl<H: HighlightHost> HighlightController<H> {
    #[must_use]
    pub fn new(host: H, config: &BlobmarkConfig) -> Self {
        Self {
            machine: SelectionMachine::new(config.focus_loss),
            host,
            scroll_block: config.scroll_block,
            last_transition: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> SelectionState {
        self.machine.state()
    }

    #[must_use]
    pub const fn last_clicked(&self) -> Option<LineNumber> {
        self.machine.last_clicked()
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    #[must_use]
    pub fn last_transition(&self) -> Option<&SelectionTransition> {
        self.last_transition.as_ref()
    }

    /// JSON line for the most recent transition, if any.
    #[must_use]
    pub fn transition_jsonl(&self) -> Option<String> {
        let transition = self.last_transition.as_ref()?;
        match transition.to_jsonl() {
            Ok(line) => Some(line),
            Err(error) => {
                warn!(target: "blobmark::controller", %error, "transition serialization failed");
                None
            }
        }
    }

    /// Primary-button press somewhere inside the gutter.
    pub fn press<N: LocatorNode>(
        &mut self,
        target: N,
        button: PointerButton,
        modifiers: Modifiers,
    ) -> Dispatch {
        self.dispatch(SelectionEvent::Press {
            line: locate(target),
            button,
            modifiers,
        })
    }

    /// Pointer entered a node inside the gutter.
    pub fn hover<N: LocatorNode>(&mut self, target: N) -> Dispatch {
        self.dispatch(SelectionEvent::Hover {
            line: locate(target),
        })
    }

    /// Button released anywhere in the document; `target` may be outside
    /// the gutter.
    pub fn release<N: LocatorNode>(&mut self, target: Option<N>) -> Dispatch {
        self.dispatch(SelectionEvent::Release {
            line: target.and_then(locate),
        })
    }

    pub fn focus_lost(&mut self) -> Dispatch {
        self.dispatch(SelectionEvent::FocusLost)
    }

    /// Apply the fragment present when the page loaded.
    pub fn restore(&mut self, hash: &str) -> Dispatch {
        self.dispatch(navigation_event(NavigationKind::InitialLoad, hash))
    }

    /// Apply a fragment observed through `hashchange`.
    pub fn navigate(&mut self, hash: &str) -> Dispatch {
        self.dispatch(navigation_event(NavigationKind::HashChange, hash))
    }

    /// Feed one event and execute its effects.
    pub fn dispatch(&mut self, event: SelectionEvent) -> Dispatch {
        let transition = self.machine.apply(&event);
        let mut overlay = None;
        let mut suppressed_failures = 0u32;

        for effect in &transition.effects {
            let outcome = match *effect {
                SelectionEffect::ClearTextSelection => self.host.clear_text_selection(),
                SelectionEffect::Highlight { range } => {
                    let (bounds, rendered) = self.render(range);
                    overlay = bounds;
                    rendered
                }
                SelectionEffect::ClearHighlight => self.clear(),
                SelectionEffect::ReplaceFragment { range } => {
                    let hash = fragment::to_hash(range);
                    debug!(target: "blobmark::controller", %hash, "replacing fragment");
                    self.host.replace_fragment(&hash)
                }
                SelectionEffect::ScrollIntoView { line } => {
                    self.host.scroll_into_view(line, self.scroll_block)
                }
            };
            if let Err(error) = outcome {
                suppressed_failures = suppressed_failures.saturating_add(1);
                warn!(
                    target: "blobmark::controller",
                    transition_id = transition.transition_id,
                    ?effect,
                    %error,
                    "host effect failed; suppressed"
                );
            }
        }

        if transition.noop.is_none() {
            debug!(
                target: "blobmark::controller",
                transition_id = transition.transition_id,
                event = transition.event,
                to = ?transition.to.state,
                writes_fragment = transition.writes_fragment(),
                "selection updated"
            );
        }

        self.last_transition = Some(transition.clone());
        Dispatch {
            transition,
            overlay,
            suppressed_failures,
        }
    }

    fn clear(&mut self) -> Result<()> {
        let cleared = self.host.clear_line_marks();
        let hidden = self.host.hide_overlay();
        cleared.and(hidden)
    }

    /// Clear, mark the range, then show or hide the overlay. Each step runs
    /// even when an earlier one failed; the first failure is reported.
    fn render(&mut self, range: LineRange) -> (Option<OverlayBounds>, Result<()>) {
        let cleared = self.host.clear_line_marks();
        let marked = self.mark_range(range);

        let bounds = position(range, &self.host);
        let shown = match bounds {
            Some(bounds) => self.host.show_overlay(bounds),
            None => self.host.hide_overlay(),
        };
        let overlay = bounds.filter(|_| shown.is_ok());
        (overlay, cleared.and(marked).and(shown))
    }

    /// Mark every line of `range` up to the last gutter anchor.
    fn mark_range(&mut self, range: LineRange) -> Result<()> {
        let Some(last) = self.host.last_line() else {
            debug!(target: "blobmark::controller", %range, "gutter has no line anchors");
            return Ok(());
        };
        let mut missing = 0u32;
        for line in range.lines().take_while(|line| *line <= last) {
            if !self.host.mark_line(line)? {
                missing = missing.saturating_add(1);
            }
        }
        if missing > 0 {
            debug!(target: "blobmark::controller", %range, missing, "range has lines outside the view");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlobmarkError;
    use crate::overlay::Rect;
    use std::collections::BTreeSet;

    #[derive(Default)]
    struct FlakyHost {
        lines: u32,
        marked: BTreeSet<u32>,
        overlay: Option<OverlayBounds>,
        fragments: Vec<String>,
        mark_calls: u32,
        fail_overlay: bool,
        fail_clear: bool,
    }

    impl LineGeometry for FlakyHost {
        fn anchor_rect(&self, line: LineNumber) -> Option<Rect> {
            (line.get() <= self.lines)
                .then(|| Rect::new(0.0, f64::from(line.get() - 1) * 10.0, 30.0, 10.0))
        }

        fn content_origin(&self) -> Option<Rect> {
            Some(Rect::new(40.0, 0.0, 500.0, f64::from(self.lines) * 10.0))
        }
    }

    impl HighlightHost for FlakyHost {
        fn last_line(&self) -> Option<LineNumber> {
            LineNumber::new(self.lines)
        }

        fn clear_line_marks(&mut self) -> Result<()> {
            if self.fail_clear {
                return Err(BlobmarkError::host("clear_line_marks", "SyntaxError"));
            }
            self.marked.clear();
            Ok(())
        }

        fn mark_line(&mut self, line: LineNumber) -> Result<bool> {
            self.mark_calls += 1;
            if line.get() > self.lines {
                return Ok(false);
            }
            self.marked.insert(line.get());
            Ok(true)
        }

        fn show_overlay(&mut self, bounds: OverlayBounds) -> Result<()> {
            if self.fail_overlay {
                return Err(BlobmarkError::host("show_overlay", "detached"));
            }
            self.overlay = Some(bounds);
            Ok(())
        }

        fn hide_overlay(&mut self) -> Result<()> {
            self.overlay = None;
            Ok(())
        }

        fn replace_fragment(&mut self, hash: &str) -> Result<()> {
            self.fragments.push(hash.to_owned());
            Ok(())
        }

        fn scroll_into_view(&mut self, _line: LineNumber, _block: ScrollBlock) -> Result<()> {
            Ok(())
        }

        fn clear_text_selection(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn controller(host: FlakyHost) -> HighlightController<FlakyHost> {
        HighlightController::new(host, &BlobmarkConfig::default())
    }

    fn press_line(raw: u32) -> SelectionEvent {
        SelectionEvent::Press {
            line: LineNumber::new(raw),
            button: PointerButton::Primary,
            modifiers: Modifiers::empty(),
        }
    }

    #[test]
    fn overlay_failure_still_writes_fragment() {
        let mut controller = controller(FlakyHost {
            lines: 20,
            fail_overlay: true,
            ..FlakyHost::default()
        });
        let dispatch = controller.dispatch(press_line(4));
        assert_eq!(dispatch.suppressed_failures, 1);
        assert_eq!(controller.host().fragments, vec!["#n4".to_owned()]);
        assert!(controller.state().is_dragging());
    }

    #[test]
    fn huge_restored_range_marks_only_present_lines() {
        let mut controller = controller(FlakyHost {
            lines: 12,
            ..FlakyHost::default()
        });
        let dispatch = controller.restore("#n10-4000000000");
        assert_eq!(
            controller.host().marked.iter().copied().collect::<Vec<_>>(),
            vec![10, 11, 12]
        );
        assert_eq!(dispatch.overlay, None);
        assert!(controller.host().fragments.is_empty());
    }

    #[test]
    fn empty_gutter_marks_nothing_for_huge_range() {
        let mut controller = controller(FlakyHost::default());
        let dispatch = controller.restore("#n1-4000000000");
        assert_eq!(controller.host().mark_calls, 0);
        assert!(controller.host().marked.is_empty());
        assert_eq!(dispatch.overlay, None);
        assert_eq!(dispatch.suppressed_failures, 0);
    }

    #[test]
    fn clear_failure_still_marks_and_places_overlay() {
        let mut controller = controller(FlakyHost {
            lines: 20,
            fail_clear: true,
            ..FlakyHost::default()
        });
        let dispatch = controller.dispatch(press_line(7));
        assert_eq!(dispatch.suppressed_failures, 1);
        assert_eq!(
            controller.host().marked.iter().copied().collect::<Vec<_>>(),
            vec![7]
        );
        assert!(dispatch.overlay.is_some());
        assert_eq!(controller.host().overlay, dispatch.overlay);
        assert_eq!(controller.host().fragments, vec!["#n7".to_owned()]);
    }

    #[test]
    fn transition_jsonl_reflects_last_dispatch() {
        let mut controller = controller(FlakyHost {
            lines: 5,
            ..FlakyHost::default()
        });
        assert_eq!(controller.transition_jsonl(), None);
        controller.navigate("#n2");
        let line = controller.transition_jsonl().expect("recorded transition");
        assert!(line.contains(r#""event":"navigate""#));
        assert!(line.contains(r#""origin":"navigation""#));
    }
}
