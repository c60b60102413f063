#![no_main]

use arbitrary::Arbitrary;
use blobmark_core::config::FocusLossPolicy;
use blobmark_core::machine::EventOrigin;
use blobmark_core::{LineNumber, LineRange, Modifiers, PointerButton, SelectionEvent, SelectionMachine};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Press { line: Option<u32>, button: i16, shift: bool },
    Hover { line: Option<u32> },
    Release { line: Option<u32> },
    FocusLost,
    Restore { range: Option<(u32, u32)> },
    Navigate { range: Option<(u32, u32)> },
}

fn line(raw: Option<u32>) -> Option<LineNumber> {
    raw.and_then(LineNumber::new)
}

fn range(raw: Option<(u32, u32)>) -> Option<LineRange> {
    let (a, b) = raw?;
    Some(LineRange::between(LineNumber::new(a)?, LineNumber::new(b)?))
}

fn event(op: &Op) -> SelectionEvent {
    match *op {
        Op::Press { line: raw, button, shift } => SelectionEvent::Press {
            line: line(raw),
            button: PointerButton::from_dom(button),
            modifiers: if shift { Modifiers::SHIFT } else { Modifiers::empty() },
        },
        Op::Hover { line: raw } => SelectionEvent::Hover { line: line(raw) },
        Op::Release { line: raw } => SelectionEvent::Release { line: line(raw) },
        Op::FocusLost => SelectionEvent::FocusLost,
        Op::Restore { range: raw } => SelectionEvent::Restore { range: range(raw) },
        Op::Navigate { range: raw } => SelectionEvent::Navigate { range: range(raw) },
    }
}

fuzz_target!(|input: (bool, Vec<Op>)| {
    let (carry_over, ops) = input;
    if ops.len() > 512 {
        return;
    }
    let policy = if carry_over {
        FocusLossPolicy::CarryOver
    } else {
        FocusLossPolicy::Release
    };
    let mut machine = SelectionMachine::new(policy);
    let mut last_id = 0;

    for op in &ops {
        let record = machine.apply(&event(op));

        assert!(record.transition_id > last_id);
        last_id = record.transition_id;

        // Navigation never writes history.
        if record.origin == EventOrigin::Navigation {
            assert!(!record.writes_fragment());
        }
        // No-ops leave the machine untouched.
        if record.noop.is_some() {
            assert_eq!(record.from, record.to);
            assert!(record.effects.is_empty());
        }
        if let Some(range) = record.to.state.highlighted() {
            assert!(range.lo() <= range.hi());
        }
    }
});
