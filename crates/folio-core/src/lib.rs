#![forbid(unsafe_code)]

//! Core: section navigation, history sync, and modal coordination for a
//! single-page portfolio.
//!
//! # Role
//! `folio-core` keeps one notion of "current section" consistent across the
//! URL path, the browser history stack, the scroll position, and
//! intersection-based auto-detection, and owns the single modal overlay
//! slot. It has no JS types; `folio-web` binds it to the browser.
//!
//! # Primary pieces
//! - **SectionRegistry**: ordered, typed section metadata (id, label, icon).
//! - **Navigator**: active section, re-entrancy guard, explicit navigation,
//!   observer feedback ([`watcher`]) and back/forward handling ([`history`]).
//! - **ModalState**: at most one overlay, with in-place paging.
//! - **PortfolioShell**: the single owner the UI talks to.
//!
//! # Host-driven
//! Every browser effect goes through the [`host::NavigationHost`] trait and
//! all delays run on the host clock, so the whole subsystem replays
//! deterministically under [`testing::FakeDom`].

pub mod config;
pub mod history;
pub mod host;
pub mod modal;
pub mod navigation;
pub mod scroll_metrics;
pub mod section;
pub mod shell;
pub mod timer;
pub mod watcher;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use config::{ConfigError, FolioConfig};
pub use host::{
    ElementHandle, HistoryState, HistoryTrigger, HostError, IntersectionEntry, NavigationHost,
    ObserverInit, ShellHost,
};
pub use modal::{
    ContentLookup, Direction, IdentityKey, ListPager, ModalControls, ModalOptions, ModalSize,
    ModalState, Page, PageHint,
};
pub use navigation::{IgnoreReason, NavigationOutcome, NavigationState, Navigator};
pub use scroll_metrics::{NavbarVisibility, ScrollMetrics, ScrollRoot};
pub use section::{Section, SectionIcon, SectionKey, SectionRegistry};
pub use shell::{PortfolioShell, Presented, ShellKey};
