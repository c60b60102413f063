#![forbid(unsafe_code)]

//! `blobmark-core` is the host-agnostic half of blobmark: interactive line
//! selection for server-rendered source views, synchronized with the URL
//! fragment (`#n10-20`).
//!
//! Design goals:
//! - **Host-driven**: the embedding page reports pointer, focus and
//!   navigation events; nothing here touches a DOM.
//! - **Deterministic**: a pure transition function plus explicit effects, so
//!   every scenario can be replayed in a plain unit test.
//! - **Enhancement only**: malformed fragments, missing anchors and failing
//!   host calls degrade to no-ops; nothing is ever surfaced to the page.
//!
//! The `blobmark-web` crate implements the host traits over `web-sys`.

pub mod age;
pub mod bridge;
pub mod config;
pub mod controller;
pub mod error;
pub mod fragment;
pub mod line;
pub mod locator;
pub mod machine;
pub mod overlay;
pub mod theme;

pub use config::{BlobmarkConfig, FocusLossPolicy, ScrollBlock};
pub use controller::{Dispatch, HighlightController, HighlightHost};
pub use error::{BlobmarkError, Result};
pub use line::{LineNumber, LineRange, LineSpan};
pub use locator::LocatorNode;
pub use machine::{
    Modifiers, PointerButton, SelectionEffect, SelectionEvent, SelectionMachine, SelectionState,
    SelectionTransition,
};
pub use overlay::{LineGeometry, OverlayBounds, Rect};
