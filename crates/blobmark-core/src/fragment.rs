//! URL fragment codec for line selections.
//!
//! Grammar (bit-exact):
//!
//! ```text
//! fragment := "#" body
//! body     := "n" digits ( "-" digits )?
//! digits   := [0-9]+
//! ```
//!
//! Output is always normalized: `n<lo>` for one line, `n<lo>-<hi>` otherwise.
//! Anything else decodes to `None`, which means "no selection requested" and
//! is never an error.

use crate::line::{LineNumber, LineRange};

/// Prefix shared by fragment bodies and gutter anchor ids.
pub const LINE_PREFIX: char = 'n';

/// Encode a range as a fragment body (no leading `#`).
#[must_use]
pub fn encode(range: LineRange) -> String {
    format!("{LINE_PREFIX}{range}")
}

/// Encode a range as a full `location.hash` value.
#[must_use]
pub fn to_hash(range: LineRange) -> String {
    format!("#{}", encode(range))
}

/// Decode a full `location.hash` value. The leading `#` is required.
#[must_use]
pub fn decode(fragment: &str) -> Option<LineRange> {
    fragment.strip_prefix('#').and_then(decode_body)
}

/// Decode a fragment body as produced by [`encode`] (no leading `#`).
#[must_use]
pub fn decode_body(body: &str) -> Option<LineRange> {
    let numbers = body.strip_prefix(LINE_PREFIX)?;
    match numbers.split_once('-') {
        Some((from, to)) => Some(LineRange::between(
            LineNumber::parse(from)?,
            LineNumber::parse(to)?,
        )),
        None => LineNumber::parse(numbers).map(LineRange::single),
    }
}

/// Id of the gutter anchor for `line`.
#[must_use]
pub fn anchor_id(line: LineNumber) -> String {
    format!("{LINE_PREFIX}{line}")
}

/// Inverse of [`anchor_id`]; `None` for ids outside the anchor grammar.
#[must_use]
pub fn parse_anchor_id(id: &str) -> Option<LineNumber> {
    id.strip_prefix(LINE_PREFIX).and_then(LineNumber::parse)
}
