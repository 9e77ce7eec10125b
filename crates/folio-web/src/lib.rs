#![forbid(unsafe_code)]

//! Browser binding for `folio-core`.
//!
//! This crate provides [`FolioApp`] (on `wasm32`), a `wasm-bindgen`-exported
//! class that owns the page's navigation and modal state and wires it to
//! the real `IntersectionObserver`, `popstate`, `scroll`/`scrollend` and
//! `setTimeout` APIs.
//!
//! The host-independent part lives in [`runner_core`] and is tested
//! natively against the in-memory host from `folio-core`.

#[cfg(target_arch = "wasm32")]
mod browser;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserHost;

#[cfg(target_arch = "wasm32")]
pub use wasm::FolioApp;

pub mod runner_core;

pub use runner_core::{FolioRunner, Snapshot};
