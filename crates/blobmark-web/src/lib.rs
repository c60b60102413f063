#![forbid(unsafe_code)]

//! `blobmark-web` binds `blobmark-core` to a live document.
//!
//! On `wasm32` the crate exports `start`, `initTheme` and the
//! `BlobmarkPage` handle through `wasm-bindgen`:
//!
//! ```js
//! import init, { initTheme, start } from "./pkg/blobmark_web.js";
//! await init();
//! initTheme();
//! const page = start(); // or start(JSON.stringify({ focusLoss: "carry_over" }))
//! ```
//!
//! Native builds only carry the host-neutral [`page`] helpers.

pub mod page;

#[cfg(target_arch = "wasm32")]
pub mod dom;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{BlobmarkPage, init_theme, start};
