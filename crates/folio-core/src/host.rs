#![forbid(unsafe_code)]

//! Host environment boundary.
//!
//! The core never touches the DOM directly. Everything it needs from the
//! browser (clock, URL, history, elements, classes, intersection observer,
//! popstate listener) goes through [`NavigationHost`]; the body scroll lock
//! used by modals goes through [`ShellHost`]. `folio-web` implements both on
//! top of `web-sys`, and the `testing` module provides an in-memory fake.
//!
//! Design goals:
//! - **Host-driven time**: the core reads [`NavigationHost::now`] and the host
//!   calls back in when deadlines pass. No blocking, no threads.
//! - **Handles, not strings**: elements are addressed by [`ElementHandle`]s the
//!   host hands out, so call sites never re-query by id.

use core::time::Duration;
use serde::{Deserialize, Serialize};

use crate::scroll_metrics::{ScrollMetrics, ScrollRoot};

/// Opaque reference to a host element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(u32);

impl ElementHandle {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// What caused a history push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryTrigger {
    /// Explicit navigation (link or button).
    Navigation,
    /// Intersection-driven update while the user scrolled.
    Scroll,
}

/// Payload stored alongside each pushed history entry.
///
/// The trigger is recorded for future use; nothing reads it back today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryState {
    pub section: String,
    pub trigger: HistoryTrigger,
}

impl HistoryState {
    #[must_use]
    pub fn new(section: &str, trigger: HistoryTrigger) -> Self {
        Self {
            section: section.to_owned(),
            trigger,
        }
    }

    /// JSON form handed to `history.pushState`.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Options for the intersection observer.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverInit {
    pub root: ScrollRoot,
    pub threshold: f64,
    pub root_margin: String,
}

/// One visibility change reported by the observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub element: ElementHandle,
    pub is_intersecting: bool,
    pub ratio: f64,
}

impl IntersectionEntry {
    #[must_use]
    pub const fn entered(element: ElementHandle, ratio: f64) -> Self {
        Self {
            element,
            is_intersecting: true,
            ratio,
        }
    }

    #[must_use]
    pub const fn left(element: ElementHandle) -> Self {
        Self {
            element,
            is_intersecting: false,
            ratio: 0.0,
        }
    }
}

/// Host operation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The element behind a handle or id is no longer in the document.
    MissingElement(String),
    /// Generic unsupported operation.
    Unsupported(&'static str),
    /// The platform call threw.
    Js(String),
}

impl core::fmt::Display for HostError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingElement(id) => write!(f, "missing element: {id}"),
            Self::Unsupported(msg) => write!(f, "unsupported: {msg}"),
            Self::Js(msg) => write!(f, "host call failed: {msg}"),
        }
    }
}

impl std::error::Error for HostError {}

/// Browser capabilities the navigator drives.
pub trait NavigationHost {
    /// Monotonic time since page start.
    fn now(&self) -> Duration;

    /// Current URL path (`location.pathname`).
    fn current_path(&self) -> String;

    /// Push one history entry and update the address bar.
    fn push_history(&mut self, path: &str, state: &HistoryState) -> Result<(), HostError>;

    /// Find an element by DOM id.
    fn find_element(&mut self, id: &str) -> Option<ElementHandle>;

    /// Smooth scroll-into-view, aligned to the element's start edge.
    fn scroll_into_view(&mut self, element: ElementHandle) -> Result<(), HostError>;

    fn add_class(&mut self, element: ElementHandle, class: &str);

    fn remove_class(&mut self, element: ElementHandle, class: &str);

    /// Create the intersection observer. Replaces any previous observer.
    fn start_observer(&mut self, init: &ObserverInit) -> Result<(), HostError>;

    /// Add an element to the running observer.
    fn observe(&mut self, element: ElementHandle) -> Result<(), HostError>;

    /// Tear down the observer. Must tolerate no observer running.
    fn disconnect_observer(&mut self);

    /// Start delivering back/forward events.
    fn listen_pop_state(&mut self) -> Result<(), HostError>;

    /// Stop delivering back/forward events. Must tolerate no listener.
    fn unlisten_pop_state(&mut self);

    /// Scroll offset and extents for `root`.
    fn scroll_metrics(&mut self, root: ScrollRoot) -> ScrollMetrics;
}

/// Extra capabilities the page shell needs for overlays.
pub trait ShellHost: NavigationHost {
    /// Suspend or restore page scrolling behind a modal.
    fn set_body_scroll_locked(&mut self, locked: bool);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_state_json_shape() {
        let state = HistoryState::new("projects", HistoryTrigger::Scroll);
        assert_eq!(state.to_json(), r#"{"section":"projects","trigger":"scroll"}"#);
        let back: HistoryState = serde_json::from_str(&state.to_json()).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn host_error_display() {
        assert_eq!(
            HostError::MissingElement("contact".into()).to_string(),
            "missing element: contact"
        );
    }
}
