//! Overlay geometry for a highlighted range.
//!
//! Measurement is separated from event handling: the host supplies bounding
//! rectangles (viewport coordinates, as `getBoundingClientRect` reports them)
//! and this module derives the overlay box relative to the content origin.
//! Because both rectangles share the same viewport frame, page scroll cancels
//! out.

use serde::{Deserialize, Serialize};

use crate::line::{LineNumber, LineRange};

/// Axis-aligned rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Vertical placement of the overlay inside the content column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayBounds {
    pub top: f64,
    pub height: f64,
}

impl OverlayBounds {
    /// Inline `style` declarations for the overlay element.
    #[must_use]
    pub fn css_top(&self) -> String {
        format!("{}px", self.top)
    }

    #[must_use]
    pub fn css_height(&self) -> String {
        format!("{}px", self.height)
    }
}

/// Geometry source for gutter anchors and the content column.
pub trait LineGeometry {
    /// Bounding box of the gutter anchor for `line`; `None` when the view has
    /// no such line.
    fn anchor_rect(&self, line: LineNumber) -> Option<Rect>;

    /// Bounding box of the element the overlay is positioned against.
    fn content_origin(&self) -> Option<Rect>;
}

/// Compute overlay bounds for `range`, or `None` when either endpoint (or
/// the content origin) is missing and the overlay must stay hidden.
pub fn position<G: LineGeometry + ?Sized>(range: LineRange, geometry: &G) -> Option<OverlayBounds> {
    let first = geometry.anchor_rect(range.lo())?;
    let last = geometry.anchor_rect(range.hi())?;
    let origin = geometry.content_origin()?;
    Some(OverlayBounds {
        top: first.top - origin.top,
        height: last.bottom() - first.top,
    })
}
