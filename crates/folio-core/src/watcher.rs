#![forbid(unsafe_code)]

//! Intersection watcher: infers the active section from viewport visibility.
//!
//! The watcher owns the section → element registry. Handles are resolved
//! once through the host and cached here; the navigator's scroll and focus
//! paths reuse the same cache instead of re-querying by id.
//!
//! # Lifecycle
//!
//! ```text
//!  Idle ──setup──▶ Watching ──teardown──▶ Idle
//!                   │   ▲
//!        missing ids│   │retry (once, after the retry delay)
//!                   ▼   │
//!                RetryPending
//! ```
//!
//! `setup` is idempotent: calling it while watching only observes sections
//! that were not observed yet.

use tracing::{debug, trace, warn};

use crate::config::ObserverConfig;
use crate::host::{ElementHandle, NavigationHost, ObserverInit};
use crate::scroll_metrics::ScrollRoot;
use crate::section::{SectionKey, SectionRegistry};

/// Result of one setup or retry pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchReport {
    /// Sections newly added to the observer in this pass.
    pub observed: Vec<SectionKey>,
    /// Sections whose element was not found.
    pub missing: Vec<SectionKey>,
}

/// Intersection observer bookkeeping.
#[derive(Debug, Clone)]
pub struct IntersectionWatcher {
    active: bool,
    root: Option<ScrollRoot>,
    elements: Vec<Option<ElementHandle>>,
    observed: Vec<bool>,
    retry_pending: bool,
}

impl IntersectionWatcher {
    #[must_use]
    pub fn new(registry: &SectionRegistry) -> Self {
        Self {
            active: false,
            root: None,
            elements: vec![None; registry.len()],
            observed: vec![false; registry.len()],
            retry_pending: false,
        }
    }

    /// Whether an observer is currently running.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Root the running observer was created against.
    #[must_use]
    pub const fn root(&self) -> Option<ScrollRoot> {
        self.root
    }

    #[must_use]
    pub fn is_observed(&self, key: SectionKey) -> bool {
        self.observed[key.index()]
    }

    #[must_use]
    pub const fn retry_pending(&self) -> bool {
        self.retry_pending
    }

    pub(crate) fn set_retry_pending(&mut self, pending: bool) {
        self.retry_pending = pending;
    }

    /// Cached element for a section, resolving through the host on first use.
    pub fn element<H: NavigationHost + ?Sized>(
        &mut self,
        host: &mut H,
        registry: &SectionRegistry,
        key: SectionKey,
    ) -> Option<ElementHandle> {
        if let Some(handle) = self.elements[key.index()] {
            return Some(handle);
        }
        let handle = host.find_element(registry.id(key))?;
        self.elements[key.index()] = Some(handle);
        Some(handle)
    }

    /// Forget a cached handle (the host reported it gone).
    pub fn forget(&mut self, key: SectionKey) {
        self.elements[key.index()] = None;
        self.observed[key.index()] = false;
    }

    /// Re-resolve a section whose cached handle went stale, e.g. after the
    /// page replaced the node. A running observer is pointed at the new one.
    pub fn refresh<H: NavigationHost + ?Sized>(
        &mut self,
        host: &mut H,
        registry: &SectionRegistry,
        key: SectionKey,
    ) -> Option<ElementHandle> {
        self.forget(key);
        let element = self.element(host, registry, key)?;
        if self.active {
            match host.observe(element) {
                Ok(()) => self.observed[key.index()] = true,
                Err(err) => {
                    warn!(target: "folio.watch", section = registry.id(key), error = %err, "re-observe failed");
                }
            }
        }
        debug!(target: "folio.watch", section = registry.id(key), "section element replaced");
        Some(element)
    }

    /// Reverse lookup for observer entries.
    #[must_use]
    pub fn section_for(&self, element: ElementHandle) -> Option<SectionKey> {
        let idx = self.elements.iter().position(|e| *e == Some(element))?;
        Some(SectionKey::from_index(idx))
    }

    /// Start the observer (if needed) and observe every section not yet
    /// observed.
    pub fn setup<H: NavigationHost + ?Sized>(
        &mut self,
        host: &mut H,
        registry: &SectionRegistry,
        observer: &ObserverConfig,
        container_id: Option<&str>,
    ) -> WatchReport {
        if !self.active {
            let root = ScrollRoot::detect(host, container_id);
            let init = ObserverInit {
                root,
                threshold: observer.threshold,
                root_margin: observer.root_margin.clone(),
            };
            if let Err(err) = host.start_observer(&init) {
                warn!(target: "folio.watch", error = %err, "intersection observer unavailable");
                return WatchReport {
                    observed: Vec::new(),
                    missing: registry.iter().map(|(key, _)| key).collect(),
                };
            }
            debug!(target: "folio.watch", root = ?root, threshold = observer.threshold, "observer started");
            self.active = true;
            self.root = Some(root);
        }
        self.observe_pending(host, registry)
    }

    /// Second and final pass for sections that were missing at setup.
    pub fn retry<H: NavigationHost + ?Sized>(
        &mut self,
        host: &mut H,
        registry: &SectionRegistry,
    ) -> WatchReport {
        self.retry_pending = false;
        if !self.active {
            trace!(target: "folio.watch", "retry after teardown dropped");
            return WatchReport::default();
        }
        let report = self.observe_pending(host, registry);
        for &key in &report.missing {
            debug!(target: "folio.watch", section = registry.id(key), "section never mounted; not observed");
        }
        report
    }

    fn observe_pending<H: NavigationHost + ?Sized>(
        &mut self,
        host: &mut H,
        registry: &SectionRegistry,
    ) -> WatchReport {
        let mut report = WatchReport::default();
        for (key, section) in registry.iter() {
            if self.observed[key.index()] {
                continue;
            }
            let Some(element) = self.element(host, registry, key) else {
                report.missing.push(key);
                continue;
            };
            match host.observe(element) {
                Ok(()) => {
                    self.observed[key.index()] = true;
                    report.observed.push(key);
                }
                Err(err) => {
                    warn!(target: "folio.watch", section = section.id(), error = %err, "observe failed");
                    self.forget(key);
                    report.missing.push(key);
                }
            }
        }
        report
    }

    /// Disconnect the observer. Safe when setup never ran.
    pub fn teardown<H: NavigationHost + ?Sized>(&mut self, host: &mut H) {
        if self.active {
            host.disconnect_observer();
            debug!(target: "folio.watch", "observer disconnected");
        }
        self.active = false;
        self.root = None;
        self.retry_pending = false;
        self.observed.iter_mut().for_each(|o| *o = false);
    }
}
