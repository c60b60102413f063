#![forbid(unsafe_code)]

//! Host-neutral pieces of the page binding.
//!
//! Everything here is plain data in, plain data out, so it builds and tests
//! on native targets; the `wasm32` listeners are thin wrappers around it.

use blobmark_core::Modifiers;
use blobmark_core::age::{AgeLabel, render_age};

/// Attribute carrying an element's Unix timestamp (seconds).
pub const AGE_TIMESTAMP_ATTRIBUTE: &str = "data-ut";

/// Selector for gutter anchors, before their line number is validated.
pub const LINE_ANCHOR_SELECTOR: &str = r#"a[id^="n"]"#;

/// Modifier set from the four DOM `MouseEvent` key flags.
#[must_use]
pub fn modifiers_from_flags(shift: bool, alt: bool, ctrl: bool, meta: bool) -> Modifiers {
    let mut mods = Modifiers::empty();
    mods.set(Modifiers::SHIFT, shift);
    mods.set(Modifiers::ALT, alt);
    mods.set(Modifiers::CTRL, ctrl);
    mods.set(Modifiers::META, meta);
    mods
}

/// Whole seconds since the epoch for a `Date.now()` reading, rounded.
#[must_use]
pub fn unix_seconds(now_ms: f64) -> Option<i64> {
    if !now_ms.is_finite() {
        return None;
    }
    // Float-to-int `as` saturates at the i64 bounds.
    Some((now_ms / 1000.0).round() as i64)
}

/// Parse a `data-ut` attribute value.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// Changes to apply to one age element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgeUpdate {
    pub text: String,
    /// `Some` when the element's class must be replaced.
    pub class: Option<&'static str>,
}

/// Plan the update for an element currently showing `text` with class
/// `class`. Nothing is touched unless the text changes; the class is only
/// rewritten alongside a text change.
#[must_use]
pub fn plan_age_update(now_secs: i64, timestamp: i64, text: &str, class: &str) -> Option<AgeUpdate> {
    let AgeLabel {
        text: rendered,
        class: bucket,
    } = render_age(now_secs.saturating_sub(timestamp));
    if rendered == text {
        return None;
    }
    let class = (bucket.css_class() != class).then_some(bucket.css_class());
    Some(AgeUpdate {
        text: rendered,
        class,
    })
}
