#![forbid(unsafe_code)]

//! Page shell: one navigator plus one modal slot behind a single owner.
//!
//! UI components talk to [`PortfolioShell`] only. It is the sole path to
//! history writes (through the navigator), closes the overlay on route
//! changes, and keeps the body scroll lock in step with `is_open`. Modal
//! close may request a section navigation; navigation never opens a modal.

use tracing::debug;

use crate::config::{ConfigError, FolioConfig};
use crate::host::{ElementHandle, HostError, IntersectionEntry, ShellHost};
use crate::modal::{ContentLookup, Direction, ModalOptions, ModalState};
use crate::navigation::{NavigationOutcome, Navigator};
use crate::scroll_metrics::ScrollMetrics;
use crate::section::{SectionKey, SectionRegistry};
use crate::watcher::WatchReport;

/// Keys the shell reacts to while a modal is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellKey {
    Escape,
    ArrowLeft,
    ArrowRight,
    Other,
}

impl ShellKey {
    /// Map a DOM `KeyboardEvent.key` value.
    #[must_use]
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "Escape" | "Esc" => Self::Escape,
            "ArrowLeft" | "Left" => Self::ArrowLeft,
            "ArrowRight" | "Right" => Self::ArrowRight,
            _ => Self::Other,
        }
    }
}

/// How a `present` call was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presented {
    /// A new modal opened (or replaced a different one).
    Opened,
    /// Same identity as the open modal; content swapped in place.
    Replaced,
}

/// Owner of the page's navigation and overlay state.
#[derive(Debug)]
pub struct PortfolioShell<H: ShellHost, C> {
    nav: Navigator<H>,
    modal: ModalState<C>,
    scroll_locked: bool,
}

impl<H: ShellHost, C> PortfolioShell<H, C> {
    pub fn new(host: H, registry: SectionRegistry, config: FolioConfig) -> Self {
        Self {
            nav: Navigator::new(host, registry, config),
            modal: ModalState::new(),
            scroll_locked: false,
        }
    }

    pub fn from_config(host: H, config: FolioConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            nav: Navigator::from_config(host, config)?,
            modal: ModalState::new(),
            scroll_locked: false,
        })
    }

    #[must_use]
    pub const fn navigator(&self) -> &Navigator<H> {
        &self.nav
    }

    #[must_use]
    pub const fn modal(&self) -> &ModalState<C> {
        &self.modal
    }

    #[must_use]
    pub const fn active_section(&self) -> SectionKey {
        self.nav.active_section()
    }

    #[must_use]
    pub fn active_section_id(&self) -> &str {
        self.nav.active_section_id()
    }

    #[must_use]
    pub const fn is_scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    pub fn host_mut(&mut self) -> &mut H {
        self.nav.host_mut()
    }

    // --- lifecycle --------------------------------------------------------

    /// Install the popstate listener, apply the load-time URL, then start
    /// the observer.
    ///
    /// The deep-link transition is already in flight when the observer
    /// reports its first batch, so that batch cannot overwrite the URL.
    pub fn mount(&mut self) -> WatchReport {
        if let Err(err) = self.setup_pop_state_listener() {
            debug!(target: "folio.nav", error = %err, "mounted without history sync");
        }
        self.setup_intersection_observer()
    }

    pub fn setup_intersection_observer(&mut self) -> WatchReport {
        self.nav.setup_intersection_observer()
    }

    /// Install the back/forward listener and reconcile with the current URL.
    ///
    /// The URL is applied even when the listener cannot be installed.
    pub fn setup_pop_state_listener(&mut self) -> Result<(), HostError> {
        let listening = self.nav.setup_pop_state_listener();
        self.sync_from_location();
        listening
    }

    /// Make the section named by the current URL active (deep links).
    pub fn sync_from_location(&mut self) -> NavigationOutcome {
        let outcome = self.nav.sync_from_location();
        self.after_route_change(outcome);
        outcome
    }

    /// Release everything [`Self::mount`] installed and unlock scrolling.
    pub fn unmount(&mut self) {
        self.nav.cleanup();
        self.modal.close();
        self.sync_scroll_lock();
    }

    /// Fire due timers.
    pub fn tick(&mut self) -> usize {
        self.nav.poll_timers()
    }

    // --- navigation -------------------------------------------------------

    pub fn navigate_to_section(&mut self, id: &str) -> NavigationOutcome {
        let outcome = self.nav.navigate_to_section(id);
        self.after_route_change(outcome);
        outcome
    }

    pub fn on_pop_state(&mut self) -> NavigationOutcome {
        let outcome = self.nav.on_pop_state();
        self.after_route_change(outcome);
        outcome
    }

    /// Element for a section id; see [`Navigator::element_for_id`].
    pub fn element_for_id(&mut self, id: &str) -> Option<ElementHandle> {
        self.nav.element_for_id(id)
    }

    pub fn on_intersection(&mut self, entries: &[IntersectionEntry]) -> NavigationOutcome {
        self.nav.on_intersection(entries)
    }

    pub fn on_scroll_settled(&mut self) -> bool {
        self.nav.on_scroll_settled()
    }

    pub fn scroll_metrics(&mut self) -> ScrollMetrics {
        self.nav.scroll_metrics()
    }

    fn after_route_change(&mut self, outcome: NavigationOutcome) {
        if matches!(outcome, NavigationOutcome::Started { .. }) && self.modal.is_open() {
            debug!(target: "folio.modal", "route changed; closing modal");
            self.close_modal();
        }
    }

    // --- modal ------------------------------------------------------------

    pub fn open_modal(&mut self, content: C, options: ModalOptions<C>) {
        self.modal.open(content, options);
        self.sync_scroll_lock();
    }

    /// Open unless the key does not resolve, in which case nothing renders.
    pub fn open_resolved<K, L>(&mut self, lookup: &L, key: &K, options: ModalOptions<C>) -> bool
    where
        K: ?Sized + core::fmt::Debug,
        L: ContentLookup<K, C> + ?Sized,
    {
        let opened = self.modal.open_resolved(lookup, key, options);
        self.sync_scroll_lock();
        opened
    }

    /// Open, or swap in place when the identity matches the open modal.
    ///
    /// An in-place swap takes the new options (paging callbacks, hint and
    /// size) but keeps the transition direction.
    pub fn present(&mut self, content: C, options: ModalOptions<C>) -> Presented {
        let same = self.modal.is_open()
            && options.identity.is_some()
            && self.modal.identity() == options.identity.as_ref();
        if same {
            self.modal.replace(content, options);
            Presented::Replaced
        } else {
            self.open_modal(content, options);
            Presented::Opened
        }
    }

    pub fn close_modal(&mut self) {
        self.modal.close();
        self.sync_scroll_lock();
    }

    /// Close, then navigate to a section anchor.
    pub fn close_and_navigate(&mut self, id: &str) -> NavigationOutcome {
        self.close_modal();
        self.nav.navigate_to_section(id)
    }

    pub fn update_modal_content(&mut self, content: C, direction: Option<Direction>) -> bool {
        self.modal.update_content(content, direction)
    }

    pub fn set_modal_direction(&mut self, direction: Direction) {
        self.modal.set_direction(direction);
    }

    pub fn page_next(&mut self) -> bool {
        self.modal.page_next()
    }

    pub fn page_previous(&mut self) -> bool {
        self.modal.page_previous()
    }

    /// Keyboard handling while a modal is open. Returns whether the key was
    /// consumed.
    pub fn handle_key(&mut self, key: ShellKey) -> bool {
        if !self.modal.is_open() {
            return false;
        }
        match key {
            ShellKey::Escape => {
                self.close_modal();
                true
            }
            ShellKey::ArrowLeft => self.modal.page_previous(),
            ShellKey::ArrowRight => self.modal.page_next(),
            ShellKey::Other => false,
        }
    }

    /// A click landed outside the modal content.
    pub fn handle_backdrop_click(&mut self) {
        if self.modal.is_open() {
            self.close_modal();
        }
    }

    fn sync_scroll_lock(&mut self) {
        let want = self.modal.is_open();
        if want != self.scroll_locked {
            self.nav.host_mut().set_body_scroll_locked(want);
            self.scroll_locked = want;
        }
    }
}
