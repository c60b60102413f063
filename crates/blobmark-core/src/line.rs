#![forbid(unsafe_code)]

//! Line identity and range types.
//!
//! Two range shapes exist on purpose:
//! - [`LineSpan`] is a raw `(from, to)` pair exactly as captured from input
//!   (press anchor, hovered line); order is meaningless.
//! - [`LineRange`] is normalized (`lo <= hi`) and can only be produced by
//!   normalizing, so every consumer that renders, encodes or measures a range
//!   receives an ordered one.

use core::fmt;
use core::num::NonZeroU32;
use core::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// One-based line number of a rendered source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineNumber(NonZeroU32);

impl LineNumber {
    /// First line of any view.
    pub const MIN: Self = Self(NonZeroU32::MIN);

    /// Construct from a raw number; `0` is not a line.
    #[must_use]
    pub const fn new(raw: u32) -> Option<Self> {
        match NonZeroU32::new(raw) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Parse an ASCII decimal string. Signs, whitespace, overflow and `0`
    /// are rejected.
    #[must_use]
    pub fn parse(digits: &str) -> Option<Self> {
        if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }
        digits.parse::<u32>().ok().and_then(Self::new)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for LineNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw pair of lines in capture order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineSpan {
    pub from: LineNumber,
    pub to: LineNumber,
}

impl LineSpan {
    #[must_use]
    pub const fn new(from: LineNumber, to: LineNumber) -> Self {
        Self { from, to }
    }

    /// Degenerate span covering one line.
    #[must_use]
    pub const fn single(line: LineNumber) -> Self {
        Self {
            from: line,
            to: line,
        }
    }

    /// Order the pair so the lower line comes first.
    #[must_use]
    pub fn normalize(self) -> LineRange {
        LineRange {
            lo: self.from.min(self.to),
            hi: self.from.max(self.to),
        }
    }
}

/// Ordered, inclusive range of lines (`lo <= hi`).
///
/// Deserialization goes through [`LineSpan`] so the ordering holds for
/// decoded values too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "LineSpan", into = "LineSpan")]
pub struct LineRange {
    lo: LineNumber,
    hi: LineNumber,
}

impl LineRange {
    /// Range of one line.
    #[must_use]
    pub const fn single(line: LineNumber) -> Self {
        Self { lo: line, hi: line }
    }

    /// Normalize an arbitrary pair.
    #[must_use]
    pub fn between(a: LineNumber, b: LineNumber) -> Self {
        LineSpan::new(a, b).normalize()
    }

    #[must_use]
    pub const fn lo(self) -> LineNumber {
        self.lo
    }

    #[must_use]
    pub const fn hi(self) -> LineNumber {
        self.hi
    }

    #[must_use]
    pub fn is_single(self) -> bool {
        self.lo == self.hi
    }

    #[must_use]
    pub fn contains(self, line: LineNumber) -> bool {
        self.lo <= line && line <= self.hi
    }

    /// Number of lines covered.
    #[must_use]
    pub fn line_count(self) -> u32 {
        self.hi.get() - self.lo.get() + 1
    }

    /// Iterate every line from `lo` to `hi` inclusive.
    pub fn lines(self) -> impl Iterator<Item = LineNumber> {
        self.raw_bounds().filter_map(LineNumber::new)
    }

    fn raw_bounds(self) -> RangeInclusive<u32> {
        self.lo.get()..=self.hi.get()
    }
}

impl From<LineSpan> for LineRange {
    fn from(span: LineSpan) -> Self {
        span.normalize()
    }
}

impl From<LineRange> for LineSpan {
    fn from(range: LineRange) -> Self {
        Self::new(range.lo, range.hi)
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            write!(f, "{}", self.lo)
        } else {
            write!(f, "{}-{}", self.lo, self.hi)
        }
    }
}
