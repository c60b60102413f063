#![forbid(unsafe_code)]

//! Deterministic line-selection state machine.
//!
//! ```text
//! Idle ──press──▶ Dragging ──release / focus loss──▶ Selected
//!   ▲               │  ▲                               │
//!   │               └──┘ hover (live update)           │
//!   └────────────── navigate(none) ◀───────────────────┘
//! ```
//!
//! [`transition`] is pure: it maps a snapshot and an event to the next
//! snapshot plus an ordered effect list. Effects are data; executing them is
//! the host's job (see [`crate::controller`]). Two properties are structural:
//! - every range handed to an effect is a normalized [`LineRange`], and
//! - [`SelectionEffect::ReplaceFragment`] is only ever produced for
//!   [`EventOrigin::Local`] events, so navigation can never echo back into
//!   history.

use bitflags::bitflags;
use serde::Serialize;
use tracing::trace;

use crate::config::FocusLossPolicy;
use crate::line::{LineNumber, LineRange, LineSpan};

bitflags! {
    /// Modifier keys held during a pointer press.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const META  = 0b1000;
    }
}

/// Mouse button of a press, mapped from DOM `MouseEvent.button`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    Primary,
    Auxiliary,
    Secondary,
    Other,
}

impl PointerButton {
    #[must_use]
    pub const fn from_dom(button: i16) -> Self {
        match button {
            0 => Self::Primary,
            1 => Self::Auxiliary,
            2 => Self::Secondary,
            _ => Self::Other,
        }
    }
}

/// Highlight lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SelectionState {
    #[default]
    Idle,
    Selected {
        range: LineRange,
    },
    /// Primary button held; `anchor` is where the press began.
    Dragging {
        anchor: LineNumber,
        current: LineNumber,
    },
}

impl SelectionState {
    /// Range currently shown, if any.
    #[must_use]
    pub fn highlighted(self) -> Option<LineRange> {
        match self {
            Self::Idle => None,
            Self::Selected { range } => Some(range),
            Self::Dragging { anchor, current } => Some(LineSpan::new(anchor, current).normalize()),
        }
    }

    #[must_use]
    pub const fn is_dragging(self) -> bool {
        matches!(self, Self::Dragging { .. })
    }
}

/// Full machine memory: lifecycle state plus the shift-click anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SelectionSnapshot {
    pub state: SelectionState,
    pub last_clicked: Option<LineNumber>,
}

/// Where an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOrigin {
    /// Pointer or focus activity on this page.
    Local,
    /// URL-driven: initial load or history traversal.
    Navigation,
}

/// Input to the machine. `line` is `None` when the event target did not
/// resolve to a gutter line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
    Press {
        line: Option<LineNumber>,
        button: PointerButton,
        modifiers: Modifiers,
    },
    Hover {
        line: Option<LineNumber>,
    },
    Release {
        line: Option<LineNumber>,
    },
    FocusLost,
    /// Fragment found when the page loaded.
    Restore {
        range: Option<LineRange>,
    },
    /// Fragment changed by history traversal or a manual edit.
    Navigate {
        range: Option<LineRange>,
    },
}

impl SelectionEvent {
    #[must_use]
    pub const fn origin(&self) -> EventOrigin {
        match self {
            Self::Press { .. } | Self::Hover { .. } | Self::Release { .. } | Self::FocusLost => {
                EventOrigin::Local
            }
            Self::Restore { .. } | Self::Navigate { .. } => EventOrigin::Navigation,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Press { .. } => "press",
            Self::Hover { .. } => "hover",
            Self::Release { .. } => "release",
            Self::FocusLost => "focus_lost",
            Self::Restore { .. } => "restore",
            Self::Navigate { .. } => "navigate",
        }
    }
}

/// Side effect requested by a transition, executed in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum SelectionEffect {
    /// Drop any native text selection the press or drag started.
    ClearTextSelection,
    /// Clear old markers, mark every line of `range`, reposition the overlay.
    Highlight { range: LineRange },
    /// Clear all markers and hide the overlay.
    ClearHighlight,
    /// Replace the current history entry's fragment.
    ReplaceFragment { range: LineRange },
    ScrollIntoView { line: LineNumber },
}

/// Why an event left the machine untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionNoopReason {
    UnresolvedLine,
    ButtonNotAllowed,
    NoActiveDrag,
    SameLine,
    NoFragmentSelection,
    FocusLossCarriedOver,
}

/// Result of the pure transition function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub next: SelectionSnapshot,
    pub effects: Vec<SelectionEffect>,
    pub noop: Option<SelectionNoopReason>,
}

impl Step {
    fn noop(snapshot: SelectionSnapshot, reason: SelectionNoopReason) -> Self {
        Self {
            next: snapshot,
            effects: Vec::new(),
            noop: Some(reason),
        }
    }

    fn to(next: SelectionSnapshot, effects: Vec<SelectionEffect>) -> Self {
        Self {
            next,
            effects,
            noop: None,
        }
    }

    /// Commit `range` from a local action: render, then write the fragment.
    fn commit(range: LineRange, last_clicked: Option<LineNumber>, leading: &[SelectionEffect]) -> Self {
        let mut effects = leading.to_vec();
        effects.push(SelectionEffect::Highlight { range });
        effects.push(SelectionEffect::ReplaceFragment { range });
        Self::to(
            SelectionSnapshot {
                state: SelectionState::Selected { range },
                last_clicked,
            },
            effects,
        )
    }
}

/// Pure transition: `(snapshot, event) -> (snapshot, effects)`.
#[must_use]
pub fn transition(
    snapshot: SelectionSnapshot,
    event: &SelectionEvent,
    focus_loss: FocusLossPolicy,
) -> Step {
    match *event {
        SelectionEvent::Press {
            line,
            button,
            modifiers,
        } => press(snapshot, line, button, modifiers),
        SelectionEvent::Hover { line } => hover(snapshot, line),
        SelectionEvent::Release { line } => release(snapshot, line),
        SelectionEvent::FocusLost => match (snapshot.state, focus_loss) {
            (SelectionState::Dragging { .. }, FocusLossPolicy::Release) => release(snapshot, None),
            (SelectionState::Dragging { .. }, FocusLossPolicy::CarryOver) => {
                Step::noop(snapshot, SelectionNoopReason::FocusLossCarriedOver)
            }
            _ => Step::noop(snapshot, SelectionNoopReason::NoActiveDrag),
        },
        SelectionEvent::Restore { range } => match range {
            Some(range) => Step::to(
                SelectionSnapshot {
                    state: SelectionState::Selected { range },
                    last_clicked: Some(range.lo()),
                },
                vec![
                    SelectionEffect::Highlight { range },
                    SelectionEffect::ScrollIntoView { line: range.lo() },
                ],
            ),
            None => Step::noop(snapshot, SelectionNoopReason::NoFragmentSelection),
        },
        SelectionEvent::Navigate { range } => match range {
            Some(range) => Step::to(
                SelectionSnapshot {
                    state: SelectionState::Selected { range },
                    last_clicked: Some(range.lo()),
                },
                vec![SelectionEffect::Highlight { range }],
            ),
            None => Step::to(
                SelectionSnapshot::default(),
                vec![SelectionEffect::ClearHighlight],
            ),
        },
    }
}

fn press(
    snapshot: SelectionSnapshot,
    line: Option<LineNumber>,
    button: PointerButton,
    modifiers: Modifiers,
) -> Step {
    if button != PointerButton::Primary {
        return Step::noop(snapshot, SelectionNoopReason::ButtonNotAllowed);
    }
    let Some(line) = line else {
        return Step::noop(snapshot, SelectionNoopReason::UnresolvedLine);
    };

    // Shift extends from the remembered anchor, which stays put.
    if modifiers.contains(Modifiers::SHIFT)
        && let Some(anchor) = snapshot.last_clicked
    {
        return Step::commit(
            LineRange::between(anchor, line),
            Some(anchor),
            &[SelectionEffect::ClearTextSelection],
        );
    }

    let range = LineRange::single(line);
    Step::to(
        SelectionSnapshot {
            state: SelectionState::Dragging {
                anchor: line,
                current: line,
            },
            last_clicked: Some(line),
        },
        vec![
            SelectionEffect::ClearTextSelection,
            SelectionEffect::Highlight { range },
            SelectionEffect::ReplaceFragment { range },
        ],
    )
}

fn hover(snapshot: SelectionSnapshot, line: Option<LineNumber>) -> Step {
    let SelectionState::Dragging { anchor, current } = snapshot.state else {
        return Step::noop(snapshot, SelectionNoopReason::NoActiveDrag);
    };
    let Some(line) = line else {
        return Step::noop(snapshot, SelectionNoopReason::UnresolvedLine);
    };
    if line == current {
        return Step::noop(snapshot, SelectionNoopReason::SameLine);
    }
    Step::to(
        SelectionSnapshot {
            state: SelectionState::Dragging {
                anchor,
                current: line,
            },
            last_clicked: snapshot.last_clicked,
        },
        vec![
            SelectionEffect::ClearTextSelection,
            SelectionEffect::Highlight {
                range: LineRange::between(anchor, line),
            },
        ],
    )
}

fn release(snapshot: SelectionSnapshot, line: Option<LineNumber>) -> Step {
    let SelectionState::Dragging { anchor, current } = snapshot.state else {
        return Step::noop(snapshot, SelectionNoopReason::NoActiveDrag);
    };
    let end = line.unwrap_or(current);
    Step::commit(LineRange::between(anchor, end), Some(anchor), &[])
}

/// One applied transition with deterministic telemetry fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionTransition {
    pub transition_id: u64,
    pub event: &'static str,
    pub origin: EventOrigin,
    pub from: SelectionSnapshot,
    pub to: SelectionSnapshot,
    pub effects: Vec<SelectionEffect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noop: Option<SelectionNoopReason>,
}

impl SelectionTransition {
    #[must_use]
    pub fn writes_fragment(&self) -> bool {
        self.effects
            .iter()
            .any(|effect| matches!(effect, SelectionEffect::ReplaceFragment { .. }))
    }

    /// Single JSON line for record/replay logs.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Owning wrapper around [`transition`]: one per blob view.
#[derive(Debug, Clone, Default)]
pub struct SelectionMachine {
    snapshot: SelectionSnapshot,
    focus_loss: FocusLossPolicy,
    transition_counter: u64,
}

impl SelectionMachine {
    #[must_use]
    pub fn new(focus_loss: FocusLossPolicy) -> Self {
        Self {
            snapshot: SelectionSnapshot::default(),
            focus_loss,
            transition_counter: 0,
        }
    }

    #[must_use]
    pub const fn state(&self) -> SelectionState {
        self.snapshot.state
    }

    #[must_use]
    pub const fn snapshot(&self) -> SelectionSnapshot {
        self.snapshot
    }

    #[must_use]
    pub const fn last_clicked(&self) -> Option<LineNumber> {
        self.snapshot.last_clicked
    }

    #[must_use]
    pub const fn focus_loss(&self) -> FocusLossPolicy {
        self.focus_loss
    }

    /// Apply one event and record the transition.
    pub fn apply(&mut self, event: &SelectionEvent) -> SelectionTransition {
        let from = self.snapshot;
        let step = transition(from, event, self.focus_loss);
        self.snapshot = step.next;
        self.transition_counter = self.transition_counter.saturating_add(1);
        let record = SelectionTransition {
            transition_id: self.transition_counter,
            event: event.kind(),
            origin: event.origin(),
            from,
            to: step.next,
            effects: step.effects,
            noop: step.noop,
        };
        trace!(
            target: "blobmark::machine",
            transition_id = record.transition_id,
            event = record.event,
            from = ?record.from.state,
            to = ?record.to.state,
            effects = record.effects.len(),
            noop = ?record.noop,
            "selection transition"
        );
        record
    }
}
