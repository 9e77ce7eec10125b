#![forbid(unsafe_code)]

//! In-memory host for deterministic tests.
//!
//! [`FakeDom`] models just enough of a browser for the navigator: a manual
//! clock, a history stack with back/forward, elements with class lists, an
//! intersection observer registry, a popstate listener count, scroll
//! metrics and the body scroll lock. Every host call is recorded so tests
//! can assert on effects rather than on internal state.

use std::collections::BTreeSet;

use core::time::Duration;

use crate::config::FolioConfig;
use crate::host::{
    ElementHandle, HistoryState, HostError, IntersectionEntry, NavigationHost, ObserverInit,
    ShellHost,
};
use crate::scroll_metrics::{ScrollMetrics, ScrollRoot};

#[derive(Debug, Clone)]
struct FakeElement {
    id: String,
    mounted: bool,
    classes: BTreeSet<String>,
}

/// One history stack entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeHistoryEntry {
    pub path: String,
    pub state: Option<HistoryState>,
}

/// Scriptable browser stand-in.
#[derive(Debug, Clone)]
pub struct FakeDom {
    now: Duration,
    elements: Vec<FakeElement>,
    history: Vec<FakeHistoryEntry>,
    history_index: usize,
    scrolled: Vec<String>,
    fail_scrolls: bool,
    observer: Option<ObserverInit>,
    observed: Vec<ElementHandle>,
    observer_starts: usize,
    pop_listeners: usize,
    metrics: ScrollMetrics,
    body_locked: bool,
    lock_toggles: usize,
}

impl Default for FakeDom {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDom {
    /// Empty document at `/`, time zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            elements: Vec::new(),
            history: vec![FakeHistoryEntry {
                path: "/".to_owned(),
                state: None,
            }],
            history_index: 0,
            scrolled: Vec::new(),
            fail_scrolls: false,
            observer: None,
            observed: Vec::new(),
            observer_starts: 0,
            pop_listeners: 0,
            metrics: ScrollMetrics::default(),
            body_locked: false,
            lock_toggles: 0,
        }
    }

    /// Document with every default portfolio section mounted and no scroll
    /// container.
    #[must_use]
    pub fn portfolio() -> Self {
        let mut dom = Self::new();
        for section in FolioConfig::default().sections {
            dom.mount(&section.id);
        }
        dom
    }

    /// Start at a deep link instead of `/`.
    #[must_use]
    pub fn at_path(mut self, path: &str) -> Self {
        self.history[0].path = path.to_owned();
        self
    }

    // --- scripting --------------------------------------------------------

    /// Add (or re-mount) an element with this id.
    pub fn mount(&mut self, id: &str) -> ElementHandle {
        if let Some(idx) = self.elements.iter().rposition(|e| e.id == id) {
            self.elements[idx].mounted = true;
            return ElementHandle::new(idx as u32);
        }
        self.elements.push(FakeElement {
            id: id.to_owned(),
            mounted: true,
            classes: BTreeSet::new(),
        });
        ElementHandle::new((self.elements.len() - 1) as u32)
    }

    /// Swap the element for a new node with the same id, as a framework
    /// re-render does. The old handle goes stale and stops being observed.
    pub fn replace_node(&mut self, id: &str) -> ElementHandle {
        self.unmount(id);
        let stale: Vec<ElementHandle> = self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.id == id)
            .map(|(idx, _)| ElementHandle::new(idx as u32))
            .collect();
        self.observed.retain(|h| !stale.contains(h));
        self.elements.push(FakeElement {
            id: id.to_owned(),
            mounted: true,
            classes: BTreeSet::new(),
        });
        ElementHandle::new((self.elements.len() - 1) as u32)
    }

    /// Remove an element from the document; its handle goes stale.
    pub fn unmount(&mut self, id: &str) {
        for el in self.elements.iter_mut().filter(|e| e.id == id) {
            el.mounted = false;
            el.classes.clear();
        }
    }

    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }

    pub fn fail_scrolls(&mut self, fail: bool) {
        self.fail_scrolls = fail;
    }

    pub fn set_scroll_metrics(&mut self, metrics: ScrollMetrics) {
        self.metrics = metrics;
    }

    /// Browser back button. Returns `false` at the start of history.
    pub fn back(&mut self) -> bool {
        if self.history_index == 0 {
            return false;
        }
        self.history_index -= 1;
        true
    }

    /// Browser forward button. Returns `false` at the end of history.
    pub fn forward(&mut self) -> bool {
        if self.history_index + 1 >= self.history.len() {
            return false;
        }
        self.history_index += 1;
        true
    }

    /// Observer entry for an element entering the viewport.
    ///
    /// # Panics
    ///
    /// Panics if no element with `id` was ever mounted.
    #[must_use]
    pub fn entered(&self, id: &str) -> IntersectionEntry {
        IntersectionEntry::entered(self.handle(id), 0.6)
    }

    /// Observer entry for an element leaving the viewport.
    #[must_use]
    pub fn left(&self, id: &str) -> IntersectionEntry {
        IntersectionEntry::left(self.handle(id))
    }

    /// Handle for an id: the mounted node if there is one, else the most
    /// recent node.
    ///
    /// # Panics
    ///
    /// Panics if no element with `id` was ever mounted.
    #[must_use]
    pub fn handle(&self, id: &str) -> ElementHandle {
        let idx = self
            .elements
            .iter()
            .rposition(|e| e.id == id && e.mounted)
            .or_else(|| self.elements.iter().rposition(|e| e.id == id))
            .unwrap_or_else(|| panic!("no element {id:?}"));
        ElementHandle::new(idx as u32)
    }

    // --- inspection -------------------------------------------------------

    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn history_entries(&self) -> &[FakeHistoryEntry] {
        &self.history
    }

    /// Ids scrolled into view, in order.
    #[must_use]
    pub fn scrolled_to(&self) -> Vec<&str> {
        self.scrolled.iter().map(String::as_str).collect()
    }

    #[must_use]
    pub fn has_class(&self, id: &str, class: &str) -> bool {
        self.elements
            .iter()
            .any(|e| e.id == id && e.classes.contains(class))
    }

    /// Running observers (0 or 1).
    #[must_use]
    pub fn observer_count(&self) -> usize {
        usize::from(self.observer.is_some())
    }

    #[must_use]
    pub fn observer_init(&self) -> Option<&ObserverInit> {
        self.observer.as_ref()
    }

    /// How many times an observer was created.
    #[must_use]
    pub fn observer_starts(&self) -> usize {
        self.observer_starts
    }

    /// Ids currently observed.
    #[must_use]
    pub fn observed_ids(&self) -> Vec<&str> {
        self.observed
            .iter()
            .map(|h| self.elements[h.raw() as usize].id.as_str())
            .collect()
    }

    #[must_use]
    pub fn pop_state_listeners(&self) -> usize {
        self.pop_listeners
    }

    #[must_use]
    pub fn body_scroll_locked(&self) -> bool {
        self.body_locked
    }

    #[must_use]
    pub fn scroll_lock_toggles(&self) -> usize {
        self.lock_toggles
    }

    fn live(&self, element: ElementHandle) -> Option<&FakeElement> {
        self.elements
            .get(element.raw() as usize)
            .filter(|e| e.mounted)
    }

    fn live_mut(&mut self, element: ElementHandle) -> Option<&mut FakeElement> {
        self.elements
            .get_mut(element.raw() as usize)
            .filter(|e| e.mounted)
    }
}

impl NavigationHost for FakeDom {
    fn now(&self) -> Duration {
        self.now
    }

    fn current_path(&self) -> String {
        self.history[self.history_index].path.clone()
    }

    fn push_history(&mut self, path: &str, state: &HistoryState) -> Result<(), HostError> {
        self.history.truncate(self.history_index + 1);
        self.history.push(FakeHistoryEntry {
            path: path.to_owned(),
            state: Some(state.clone()),
        });
        self.history_index = self.history.len() - 1;
        Ok(())
    }

    fn find_element(&mut self, id: &str) -> Option<ElementHandle> {
        self.elements
            .iter()
            .position(|e| e.id == id && e.mounted)
            .map(|idx| ElementHandle::new(idx as u32))
    }

    fn scroll_into_view(&mut self, element: ElementHandle) -> Result<(), HostError> {
        let id = self
            .live(element)
            .map(|e| e.id.clone())
            .ok_or_else(|| HostError::MissingElement(format!("#{}", element.raw())))?;
        if self.fail_scrolls {
            return Err(HostError::Js("scroll interrupted".to_owned()));
        }
        self.scrolled.push(id);
        Ok(())
    }

    fn add_class(&mut self, element: ElementHandle, class: &str) {
        if let Some(el) = self.live_mut(element) {
            el.classes.insert(class.to_owned());
        }
    }

    fn remove_class(&mut self, element: ElementHandle, class: &str) {
        if let Some(el) = self.live_mut(element) {
            el.classes.remove(class);
        }
    }

    fn start_observer(&mut self, init: &ObserverInit) -> Result<(), HostError> {
        self.observer = Some(init.clone());
        self.observed.clear();
        self.observer_starts += 1;
        Ok(())
    }

    fn observe(&mut self, element: ElementHandle) -> Result<(), HostError> {
        if self.observer.is_none() {
            return Err(HostError::Unsupported("observe without observer"));
        }
        if self.live(element).is_none() {
            return Err(HostError::MissingElement(format!("#{}", element.raw())));
        }
        if !self.observed.contains(&element) {
            self.observed.push(element);
        }
        Ok(())
    }

    fn disconnect_observer(&mut self) {
        self.observer = None;
        self.observed.clear();
    }

    fn listen_pop_state(&mut self) -> Result<(), HostError> {
        self.pop_listeners += 1;
        Ok(())
    }

    fn unlisten_pop_state(&mut self) {
        self.pop_listeners = self.pop_listeners.saturating_sub(1);
    }

    fn scroll_metrics(&mut self, _root: ScrollRoot) -> ScrollMetrics {
        self.metrics
    }
}

impl ShellHost for FakeDom {
    fn set_body_scroll_locked(&mut self, locked: bool) {
        if self.body_locked != locked {
            self.lock_toggles += 1;
        }
        self.body_locked = locked;
    }
}
