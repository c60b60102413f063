//! URL-driven entry into the selection machine.
//!
//! Fragments observed on load or after history traversal become
//! navigation-origin events. Those events never carry a fragment write, so
//! applying them cannot push state back into history. Origin is decided by
//! which entry point the host calls, never by comparing the URL against the
//! current selection.

use tracing::debug;

use crate::fragment;
use crate::machine::SelectionEvent;

/// How the host observed the fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    InitialLoad,
    /// `hashchange`: back/forward or a manually edited URL.
    HashChange,
}

/// Translate an observed `location.hash` into a machine event.
#[must_use]
pub fn navigation_event(kind: NavigationKind, hash: &str) -> SelectionEvent {
    let range = fragment::decode(hash);
    debug!(
        target: "blobmark::bridge",
        ?kind,
        hash,
        decoded = ?range,
        "fragment observed"
    );
    match kind {
        NavigationKind::InitialLoad => SelectionEvent::Restore { range },
        NavigationKind::HashChange => SelectionEvent::Navigate { range },
    }
}
