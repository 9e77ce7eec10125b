#![forbid(unsafe_code)]

//! Section navigation: the single source of truth for the active section.
//!
//! [`Navigator`] reconciles three independent writers of "where the user is":
//!
//! - **Explicit navigation** ([`Navigator::navigate_to_section`]) from links
//!   and buttons.
//! - **Intersection feedback** ([`Navigator::on_intersection`]) from the
//!   viewport observer while the user scrolls.
//! - **History navigation** ([`Navigator::on_pop_state`]) from back/forward.
//!
//! # State machine
//!
//! ```text
//!          navigate / popstate
//!   ┌──────┐ ─────────────────▶ ┌───────────────┐
//!   │ Idle │                    │ Transitioning │──┐ navigate: dropped
//!   └──────┘ ◀───────────────── └───────────────┘◀─┘ intersection/popstate: ignored
//!        scroll-end  or  settle timer
//! ```
//!
//! While transitioning, intersection entries and popstate events never write
//! the active section; that is what keeps a programmatic smooth scroll from
//! fighting the observer it passes through. Each transition carries a
//! generation number, and only the matching scroll-end signal or settle timer
//! can release it.
//!
//! # Time
//!
//! All delays run on the host clock. The host calls [`Navigator::poll_timers`]
//! when time advances and uses [`Navigator::next_deadline`] to arm a single
//! platform timeout.

use core::time::Duration;

use tracing::{debug, debug_span, trace, warn};

use crate::config::{ConfigError, FolioConfig};
use crate::history::HistorySync;
use crate::scroll_metrics::{ScrollMetrics, ScrollRoot};
use crate::host::{
    ElementHandle, HistoryState, HistoryTrigger, HostError, IntersectionEntry, NavigationHost,
};
use crate::section::{SectionKey, SectionRegistry};
use crate::timer::TimerQueue;
use crate::watcher::{IntersectionWatcher, WatchReport};

/// Why an input did not change navigation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IgnoreReason {
    /// The id or path does not name a registered section.
    InvalidSectionId,
    /// A navigation arrived while another transition was in flight.
    ReentrantNavigation,
    /// Observer or history feedback arrived while a transition was in flight.
    SuppressedDuringTransition,
    /// A popstate arrived with no listener installed.
    NotListening,
    /// An observer entry for an element that is not a registered section.
    UnknownElement,
    /// The batch had no entering sections.
    NotIntersecting,
    /// The URL already names the active section.
    AlreadyActive,
}

impl core::fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Self::InvalidSectionId => "invalid section id",
            Self::ReentrantNavigation => "navigation already in flight",
            Self::SuppressedDuringTransition => "suppressed during transition",
            Self::NotListening => "popstate listener not installed",
            Self::UnknownElement => "element is not a registered section",
            Self::NotIntersecting => "no section entered the viewport",
            Self::AlreadyActive => "section already active",
        };
        f.write_str(msg)
    }
}

/// Result of feeding one input to the navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// A transition started (explicit navigation or popstate).
    Started {
        section: SectionKey,
        /// Whether a history entry was pushed.
        pushed: bool,
    },
    /// The active section followed the observer without a transition.
    Followed { section: SectionKey, pushed: bool },
    /// Nothing changed.
    Ignored(IgnoreReason),
}

impl NavigationOutcome {
    #[must_use]
    pub const fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored(_))
    }

    #[must_use]
    pub const fn pushed(&self) -> bool {
        match self {
            Self::Started { pushed, .. } | Self::Followed { pushed, .. } => *pushed,
            Self::Ignored(_) => false,
        }
    }
}

/// What started the current transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionSource {
    Navigate,
    PopState,
    /// The URL the page was loaded at.
    Location,
}

/// An in-flight programmatic scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub generation: u64,
    pub target: SectionKey,
    pub source: TransitionSource,
    pub started_at: Duration,
}

/// The active section plus the re-entrancy guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    active: SectionKey,
    transition: Option<Transition>,
}

impl NavigationState {
    #[must_use]
    pub const fn new(initial: SectionKey) -> Self {
        Self {
            active: initial,
            transition: None,
        }
    }

    #[must_use]
    pub const fn active_section(&self) -> SectionKey {
        self.active
    }

    #[must_use]
    pub const fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    #[must_use]
    pub const fn transition(&self) -> Option<Transition> {
        self.transition
    }
}

/// Timers owned by the navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NavTimer {
    Settle { generation: u64 },
    ClearFocus { element: ElementHandle, token: u64 },
    RetryObserve,
}

/// Section coordinator bound to one host.
#[derive(Debug)]
pub struct Navigator<H: NavigationHost> {
    host: H,
    registry: SectionRegistry,
    config: FolioConfig,
    state: NavigationState,
    watcher: IntersectionWatcher,
    history: HistorySync,
    timers: TimerQueue<NavTimer>,
    next_generation: u64,
    focus_tokens: Vec<(ElementHandle, u64)>,
    next_focus_token: u64,
}

impl<H: NavigationHost> Navigator<H> {
    /// Create a navigator over an existing registry.
    ///
    /// The registry is authoritative: `config.sections` and
    /// `config.home_section` are rewritten to match it. The active section
    /// starts on the first registered section.
    pub fn new(host: H, registry: SectionRegistry, mut config: FolioConfig) -> Self {
        config.sections = registry.section_configs();
        config.home_section = Some(registry.id(registry.home()).to_owned());
        let state = NavigationState::new(registry.first());
        let watcher = IntersectionWatcher::new(&registry);
        Self {
            host,
            registry,
            config,
            state,
            watcher,
            history: HistorySync::new(),
            timers: TimerQueue::new(),
            next_generation: 1,
            focus_tokens: Vec::new(),
            next_focus_token: 1,
        }
    }

    /// Create a navigator, building the registry from `config`.
    pub fn from_config(host: H, config: FolioConfig) -> Result<Self, ConfigError> {
        let registry = SectionRegistry::from_config(&config)?;
        Ok(Self::new(host, registry, config))
    }

    // --- accessors -------------------------------------------------------

    #[must_use]
    pub const fn state(&self) -> &NavigationState {
        &self.state
    }

    #[must_use]
    pub const fn active_section(&self) -> SectionKey {
        self.state.active
    }

    /// Id of the active section.
    #[must_use]
    pub fn active_section_id(&self) -> &str {
        self.registry.id(self.state.active)
    }

    #[must_use]
    pub const fn is_transitioning(&self) -> bool {
        self.state.is_transitioning()
    }

    #[must_use]
    pub const fn registry(&self) -> &SectionRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn config(&self) -> &FolioConfig {
        &self.config
    }

    #[must_use]
    pub const fn watcher(&self) -> &IntersectionWatcher {
        &self.watcher
    }

    #[must_use]
    pub const fn history(&self) -> &HistorySync {
        &self.history
    }

    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Earliest pending timer deadline on the host clock.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    // --- explicit navigation ---------------------------------------------

    /// Navigate to a section by id.
    ///
    /// Unknown ids and calls made while a transition is in flight are
    /// dropped. Otherwise the active section changes immediately, one history
    /// entry is pushed if the path changes, the section is scrolled into view
    /// and briefly marked, and the guard is released once scrolling settles.
    pub fn navigate_to_section(&mut self, id: &str) -> NavigationOutcome {
        let Some(key) = self.registry.resolve(id) else {
            debug!(target: "folio.nav", section = id, reason = %IgnoreReason::InvalidSectionId, "navigation ignored");
            return NavigationOutcome::Ignored(IgnoreReason::InvalidSectionId);
        };
        self.navigate_to(key)
    }

    /// Navigate to an already-resolved section.
    pub fn navigate_to(&mut self, key: SectionKey) -> NavigationOutcome {
        if self.state.is_transitioning() {
            trace!(
                target: "folio.nav",
                section = self.registry.id(key),
                reason = %IgnoreReason::ReentrantNavigation,
                "navigation dropped"
            );
            return NavigationOutcome::Ignored(IgnoreReason::ReentrantNavigation);
        }

        let generation = self.begin_transition(key, TransitionSource::Navigate);
        let _span = debug_span!("nav.transition", generation, section = self.registry.id(key))
            .entered();

        let pushed = self.push_if_changed(key, HistoryTrigger::Navigation);

        // Without an element the scroll is skipped; the settle timer still
        // releases the guard.
        if let Err(err) = self.scroll_and_focus(key) {
            debug!(target: "folio.nav", error = %err, "scroll skipped");
        }

        debug!(target: "folio.nav", section = self.registry.id(key), pushed, "navigation started");
        NavigationOutcome::Started {
            section: key,
            pushed,
        }
    }

    // --- intersection feedback -------------------------------------------

    /// Start watching section visibility. Idempotent; a repeat call picks up
    /// sections that were missing before.
    pub fn setup_intersection_observer(&mut self) -> WatchReport {
        let report = self.watcher.setup(
            &mut self.host,
            &self.registry,
            &self.config.observer,
            self.config.scroll_container_id.as_deref(),
        );
        if !report.missing.is_empty() && self.watcher.is_active() && !self.watcher.retry_pending()
        {
            let at = self.host.now() + self.config.timing.retry();
            self.timers.schedule(at, NavTimer::RetryObserve);
            self.watcher.set_retry_pending(true);
            debug!(target: "folio.watch", missing = report.missing.len(), "retry scheduled");
        }
        report
    }

    /// Element for a section id, resolving and caching it on first use.
    ///
    /// Lets a page-owned observer report entries by id.
    pub fn element_for_id(&mut self, id: &str) -> Option<ElementHandle> {
        let key = self.registry.resolve(id)?;
        self.watcher.element(&mut self.host, &self.registry, key)
    }

    /// Feed a batch of observer entries.
    pub fn on_intersection(&mut self, entries: &[IntersectionEntry]) -> NavigationOutcome {
        if self.state.is_transitioning() {
            trace!(target: "folio.watch", entries = entries.len(), "observer batch suppressed");
            return NavigationOutcome::Ignored(IgnoreReason::SuppressedDuringTransition);
        }

        let mut outcome = NavigationOutcome::Ignored(IgnoreReason::NotIntersecting);
        for entry in entries.iter().filter(|e| e.is_intersecting) {
            let Some(key) = self.watcher.section_for(entry.element) else {
                outcome = NavigationOutcome::Ignored(IgnoreReason::UnknownElement);
                continue;
            };
            self.state.active = key;
            let pushed = self.push_if_changed(key, HistoryTrigger::Scroll);
            debug!(target: "folio.watch", section = self.registry.id(key), pushed, "active section followed scroll");
            outcome = NavigationOutcome::Followed {
                section: key,
                pushed,
            };
        }
        outcome
    }

    // --- history ----------------------------------------------------------

    /// Install the back/forward listener.
    pub fn setup_pop_state_listener(&mut self) -> Result<(), HostError> {
        self.history.listen(&mut self.host)
    }

    /// Reconcile after the browser moved through history.
    pub fn on_pop_state(&mut self) -> NavigationOutcome {
        if self.state.is_transitioning() {
            trace!(target: "folio.history", "popstate ignored during transition");
            return NavigationOutcome::Ignored(IgnoreReason::SuppressedDuringTransition);
        }
        let path = self.host.current_path();
        let key = match self.history.target_for(&self.registry, &path) {
            Ok(key) => key,
            Err(reason) => {
                debug!(target: "folio.history", path = %path, reason = %reason, "popstate ignored");
                return NavigationOutcome::Ignored(reason);
            }
        };
        self.restore(key, &path, TransitionSource::PopState)
    }

    /// Apply the URL the page is currently at, e.g. a deep link on load.
    ///
    /// Scrolls to the named section without pushing history. Paths that name
    /// no section, or the section already active, change nothing.
    pub fn sync_from_location(&mut self) -> NavigationOutcome {
        if self.state.is_transitioning() {
            trace!(target: "folio.history", "location sync ignored during transition");
            return NavigationOutcome::Ignored(IgnoreReason::SuppressedDuringTransition);
        }
        let path = self.host.current_path();
        let Some(key) = self.registry.resolve_path(&path) else {
            debug!(target: "folio.history", path = %path, "location names no section");
            return NavigationOutcome::Ignored(IgnoreReason::InvalidSectionId);
        };
        if key == self.state.active {
            return NavigationOutcome::Ignored(IgnoreReason::AlreadyActive);
        }
        self.restore(key, &path, TransitionSource::Location)
    }

    /// Transition to a section the URL already names. Never pushes.
    fn restore(
        &mut self,
        key: SectionKey,
        path: &str,
        source: TransitionSource,
    ) -> NavigationOutcome {
        let generation = self.begin_transition(key, source);
        let _span = debug_span!("nav.transition", generation, section = self.registry.id(key))
            .entered();

        if let Err(err) = self.scroll_and_focus(key) {
            // No scroll will run, so nothing will ever signal completion.
            debug!(target: "folio.history", error = %err, "scroll skipped; releasing now");
            self.end_transition(generation, "no-element");
        }

        debug!(target: "folio.history", path, section = self.registry.id(key), ?source, "history navigation");
        NavigationOutcome::Started {
            section: key,
            pushed: false,
        }
    }

    /// Scroll extents of the root the observer watches (or would watch).
    pub fn scroll_metrics(&mut self) -> ScrollMetrics {
        let root = match self.watcher.root() {
            Some(root) => root,
            None => ScrollRoot::detect(&mut self.host, self.config.scroll_container_id.as_deref()),
        };
        self.host.scroll_metrics(root)
    }

    // --- completion -------------------------------------------------------

    /// The host observed the programmatic scroll finish (`scrollend`).
    ///
    /// Releases the in-flight transition early. A signal delivered at the
    /// very instant the transition began belongs to an earlier scroll and is
    /// ignored. Returns whether a transition was released.
    pub fn on_scroll_settled(&mut self) -> bool {
        let Some(transition) = self.state.transition else {
            return false;
        };
        if self.host.now() <= transition.started_at {
            trace!(target: "folio.nav", "stale scroll-end ignored");
            return false;
        }
        self.end_transition(transition.generation, "scroll-end")
    }

    /// Fire every timer due at the host's current time. Returns how many
    /// fired.
    pub fn poll_timers(&mut self) -> usize {
        let now = self.host.now();
        let mut fired = 0;
        while let Some(timer) = self.timers.pop_due(now) {
            fired += 1;
            match timer {
                NavTimer::Settle { generation } => {
                    self.end_transition(generation, "settle-timer");
                }
                NavTimer::ClearFocus { element, token } => self.clear_focus(element, token),
                NavTimer::RetryObserve => {
                    let report = self.watcher.retry(&mut self.host, &self.registry);
                    debug!(
                        target: "folio.watch",
                        observed = report.observed.len(),
                        missing = report.missing.len(),
                        "retry pass complete"
                    );
                }
            }
        }
        fired
    }

    /// Release the observer and the popstate listener. Safe to call when
    /// neither was set up. Pending transition and focus timers keep running
    /// so state cannot be left mid-transition.
    pub fn cleanup(&mut self) {
        self.watcher.teardown(&mut self.host);
        self.history.unlisten(&mut self.host);
        self.timers.cancel_where(|t| matches!(t, NavTimer::RetryObserve));
    }

    // --- internals --------------------------------------------------------

    fn begin_transition(&mut self, key: SectionKey, source: TransitionSource) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        let now = self.host.now();
        self.state.transition = Some(Transition {
            generation,
            target: key,
            source,
            started_at: now,
        });
        self.state.active = key;
        self.timers
            .schedule(now + self.config.timing.settle(), NavTimer::Settle { generation });
        generation
    }

    fn end_transition(&mut self, generation: u64, cause: &'static str) -> bool {
        match self.state.transition {
            Some(t) if t.generation == generation => {
                self.state.transition = None;
                self.timers
                    .cancel_where(|timer| *timer == NavTimer::Settle { generation });
                debug!(target: "folio.nav", generation, cause, "transition released");
                true
            }
            _ => false,
        }
    }

    fn push_if_changed(&mut self, key: SectionKey, trigger: HistoryTrigger) -> bool {
        let path = self.registry.path_for(key);
        if path == self.host.current_path() {
            return false;
        }
        let state = HistoryState::new(self.registry.id(key), trigger);
        match self.host.push_history(&path, &state) {
            Ok(()) => true,
            Err(err) => {
                warn!(target: "folio.nav", path = %path, error = %err, "history push failed");
                false
            }
        }
    }

    fn scroll_and_focus(&mut self, key: SectionKey) -> Result<(), HostError> {
        let missing = || HostError::MissingElement(self.registry.id(key).to_owned());
        let mut element = self
            .watcher
            .element(&mut self.host, &self.registry, key)
            .ok_or_else(missing)?;

        let mut scrolled = self.host.scroll_into_view(element);
        if let Err(HostError::MissingElement(_)) = scrolled {
            // Cached handle went stale; the page may have replaced the node.
            element = self
                .watcher
                .refresh(&mut self.host, &self.registry, key)
                .ok_or_else(missing)?;
            scrolled = self.host.scroll_into_view(element);
            if let Err(HostError::MissingElement(_)) = scrolled {
                self.watcher.forget(key);
                return scrolled;
            }
        }

        let token = self.next_focus_token;
        self.next_focus_token += 1;
        self.focus_tokens.retain(|(el, _)| *el != element);
        self.focus_tokens.push((element, token));
        self.host.add_class(element, &self.config.focus_class);
        let at = self.host.now() + self.config.timing.focus();
        self.timers.schedule(at, NavTimer::ClearFocus { element, token });
        scrolled
    }

    fn clear_focus(&mut self, element: ElementHandle, token: u64) {
        // A newer marker on the same element owns the removal.
        let Some(idx) = self
            .focus_tokens
            .iter()
            .position(|&(el, t)| el == element && t == token)
        else {
            return;
        };
        self.focus_tokens.swap_remove(idx);
        self.host.remove_class(element, &self.config.focus_class);
    }
}
