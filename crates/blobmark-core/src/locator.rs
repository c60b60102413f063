//! Resolve the gutter line that encloses an event target.

use crate::fragment::parse_anchor_id;
use crate::line::LineNumber;

/// Read-only view of a DOM node, enough to walk towards the document root.
pub trait LocatorNode: Sized {
    /// Upper-case tag name for elements (`"A"`), `None` for text and other
    /// non-element nodes.
    fn tag_name(&self) -> Option<String>;

    /// Element id, if the node carries one.
    fn id(&self) -> Option<String>;

    fn parent(&self) -> Option<Self>;
}

/// Whether `node` is a gutter line anchor: an `<a>` whose id starts with the
/// line prefix.
pub fn is_line_anchor<N: LocatorNode>(node: &N) -> bool {
    let is_anchor = node
        .tag_name()
        .is_some_and(|tag| tag.eq_ignore_ascii_case("a"));
    is_anchor
        && node
            .id()
            .is_some_and(|id| id.starts_with(crate::fragment::LINE_PREFIX))
}

/// Walk from `node` up to the nearest line anchor and parse its line number.
///
/// The nearest anchor decides: an anchor whose id does not parse yields
/// `None` even if a valid anchor exists further up.
pub fn locate<N: LocatorNode>(node: N) -> Option<LineNumber> {
    let mut current = Some(node);
    while let Some(candidate) = current {
        if is_line_anchor(&candidate) {
            return candidate.id().as_deref().and_then(parse_anchor_id);
        }
        current = candidate.parent();
    }
    None
}
