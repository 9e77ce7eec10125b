#![forbid(unsafe_code)]

//! Scroll-root resolution and scroll-position derived state.
//!
//! A page either scrolls inside a dedicated container element or scrolls the
//! document itself. [`ScrollRoot::detect`] is the one place that decides
//! which, and every consumer (the intersection watcher, the progress
//! indicator, navbar auto-hide) goes through it, so a contained-scroll layout
//! and a document-scroll layout never disagree about "where the user is".

use crate::host::{ElementHandle, NavigationHost};

/// Source of the current scroll position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollRoot {
    /// A scrollable container element.
    Container(ElementHandle),
    /// The window / document scroller.
    Viewport,
}

impl ScrollRoot {
    /// Resolve the root: the container if the host has one, else the viewport.
    pub fn detect<H: NavigationHost + ?Sized>(host: &mut H, container_id: Option<&str>) -> Self {
        container_id
            .and_then(|id| host.find_element(id))
            .map_or(Self::Viewport, Self::Container)
    }
}

/// Scroll extents for one root, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    /// Distance scrolled from the top.
    pub offset: f64,
    /// Visible height of the root.
    pub viewport: f64,
    /// Total scrollable content height.
    pub content: f64,
}

impl ScrollMetrics {
    #[must_use]
    pub const fn new(offset: f64, viewport: f64, content: f64) -> Self {
        Self {
            offset,
            viewport,
            content,
        }
    }

    /// Largest legal offset.
    #[must_use]
    pub fn max_offset(&self) -> f64 {
        (self.content - self.viewport).max(0.0)
    }

    /// Fraction of the page scrolled through, clamped to `0.0..=1.0`.
    ///
    /// Content that fits entirely in the viewport reports `0.0`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        let max = self.max_offset();
        if max <= 0.0 {
            return 0.0;
        }
        (self.offset / max).clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn is_at_top(&self) -> bool {
        self.offset <= 0.0
    }
}

/// Auto-hiding navbar: hidden while scrolling down past a threshold, shown
/// again on any upward scroll or near the top.
#[derive(Debug, Clone)]
pub struct NavbarVisibility {
    last_offset: f64,
    visible: bool,
    /// Offsets at or above this always show the bar.
    reveal_above: f64,
    /// Movement smaller than this is ignored.
    jitter: f64,
}

impl Default for NavbarVisibility {
    fn default() -> Self {
        Self::new(80.0, 4.0)
    }
}

impl NavbarVisibility {
    #[must_use]
    pub const fn new(reveal_above: f64, jitter: f64) -> Self {
        Self {
            last_offset: 0.0,
            visible: true,
            reveal_above,
            jitter,
        }
    }

    /// Feed the latest metrics; returns whether the navbar should show.
    pub fn update(&mut self, metrics: &ScrollMetrics) -> bool {
        let delta = metrics.offset - self.last_offset;
        if metrics.offset <= self.reveal_above {
            self.visible = true;
        } else if delta.abs() >= self.jitter {
            self.visible = delta < 0.0;
        }
        if delta.abs() >= self.jitter || metrics.offset <= self.reveal_above {
            self.last_offset = metrics.offset;
        }
        self.visible
    }

    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }
}
