#![forbid(unsafe_code)]

//! Platform-independent runner wrapping `PortfolioShell`.
//!
//! This module contains the logic shared between the wasm-bindgen exports
//! and the native test harness. No JS/WASM types here: browser payloads
//! arrive as JSON strings and state leaves as a JSON snapshot.

use core::time::Duration;

use folio_core::{
    ConfigError, Direction, FolioConfig, IdentityKey, IntersectionEntry, ListPager, ModalOptions,
    NavbarVisibility, NavigationHost, NavigationOutcome, Page, PageHint, PortfolioShell,
    ScrollMetrics, ShellHost, ShellKey,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Paging callback supplied by the page for JS-driven modals.
pub type PageSource = Box<dyn FnMut() -> Option<Page<IdentityKey>>>;

/// One observer entry as the page reports it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEntry {
    id: String,
    is_intersecting: bool,
    #[serde(default)]
    ratio: f64,
}

/// Result of a page callback.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePage {
    key: IdentityKey,
    #[serde(default)]
    has_next: bool,
    #[serde(default)]
    has_previous: bool,
}

/// Parse a paging callback result.
///
/// Accepts `{"key": .., "hasNext": .., "hasPrevious": ..}`; `null` and
/// malformed payloads mean "no neighbour".
#[must_use]
pub fn parse_page(json: &str) -> Option<Page<IdentityKey>> {
    match serde_json::from_str::<Option<WirePage>>(json) {
        Ok(page) => page.map(|p| Page {
            content: p.key,
            hint: PageHint {
                has_next: p.has_next,
                has_previous: p.has_previous,
            },
        }),
        Err(err) => {
            warn!(target: "folio.web", error = %err, "malformed page payload");
            None
        }
    }
}

/// Parse an identity key (`"folio"` or `7`).
pub fn parse_identity(json: &str) -> Result<IdentityKey, serde_json::Error> {
    serde_json::from_str(json)
}

/// Modal part of [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalSnapshot {
    pub open: bool,
    pub content: Option<IdentityKey>,
    pub direction: Direction,
    pub revision: u64,
    pub can_close: bool,
    pub paging: bool,
    pub can_previous: bool,
    pub can_next: bool,
}

/// Everything the page needs to render navigation chrome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub active_section: String,
    pub path: String,
    pub is_transitioning: bool,
    pub scroll_locked: bool,
    pub navbar_visible: bool,
    pub scroll_progress: f64,
    pub modal: ModalSnapshot,
}

/// Host-independent page runner.
pub struct FolioRunner<H: ShellHost> {
    shell: PortfolioShell<H, IdentityKey>,
    navbar: NavbarVisibility,
    metrics: ScrollMetrics,
}

impl<H: ShellHost> FolioRunner<H> {
    pub fn new(host: H, config: FolioConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            shell: PortfolioShell::from_config(host, config)?,
            navbar: NavbarVisibility::default(),
            metrics: ScrollMetrics::default(),
        })
    }

    /// Build from an optional JSON config; blank input means defaults.
    pub fn from_config_json(host: H, json: Option<&str>) -> Result<Self, ConfigError> {
        let config = match json.map(str::trim) {
            Some(text) if !text.is_empty() => FolioConfig::from_json_str(text)?,
            _ => FolioConfig::default(),
        };
        Self::new(host, config)
    }

    #[must_use]
    pub const fn shell(&self) -> &PortfolioShell<H, IdentityKey> {
        &self.shell
    }

    pub fn host_mut(&mut self) -> &mut H {
        self.shell.host_mut()
    }

    // --- navigation -------------------------------------------------------

    pub fn navigate_to_section(&mut self, id: &str) -> bool {
        !self.shell.navigate_to_section(id).is_ignored()
    }

    #[must_use]
    pub fn active_section(&self) -> &str {
        self.shell.active_section_id()
    }

    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.shell.navigator().is_transitioning()
    }

    /// Install the observer; returns how many sections are being watched.
    pub fn setup_intersection_observer(&mut self) -> usize {
        self.shell.setup_intersection_observer();
        let navigator = self.shell.navigator();
        navigator
            .registry()
            .iter()
            .filter(|(key, _)| navigator.watcher().is_observed(*key))
            .count()
    }

    pub fn setup_pop_state_listener(&mut self) -> bool {
        match self.shell.setup_pop_state_listener() {
            Ok(()) => true,
            Err(err) => {
                warn!(target: "folio.web", error = %err, "popstate listener unavailable");
                false
            }
        }
    }

    /// Release every browser hook and unlock scrolling.
    pub fn cleanup(&mut self) {
        self.shell.unmount();
    }

    pub fn on_pop_state(&mut self) -> NavigationOutcome {
        self.shell.on_pop_state()
    }

    pub fn on_intersection(&mut self, entries: &[IntersectionEntry]) -> NavigationOutcome {
        self.shell.on_intersection(entries)
    }

    /// Apply an observer batch reported by id:
    /// `[{"id":"projects","isIntersecting":true,"ratio":0.6}]`.
    ///
    /// Works without [`Self::setup_intersection_observer`], for pages that
    /// run their own observer. Ids that name no section, or whose element is
    /// not in the document, are skipped.
    pub fn on_intersection_json(&mut self, json: &str) -> Result<NavigationOutcome, serde_json::Error> {
        let wire: Vec<WireEntry> = serde_json::from_str(json)?;
        let entries: Vec<IntersectionEntry> = wire
            .into_iter()
            .filter_map(|entry| {
                let Some(element) = self.shell.element_for_id(&entry.id) else {
                    debug!(target: "folio.web", id = %entry.id, "intersection for unknown section");
                    return None;
                };
                Some(IntersectionEntry {
                    element,
                    is_intersecting: entry.is_intersecting,
                    ratio: entry.ratio,
                })
            })
            .collect();
        Ok(self.shell.on_intersection(&entries))
    }

    pub fn on_scroll_settled(&mut self) -> bool {
        self.shell.on_scroll_settled()
    }

    /// Re-read scroll extents. Returns whether navbar visibility changed.
    pub fn on_scroll(&mut self) -> bool {
        self.metrics = self.shell.scroll_metrics();
        let before = self.navbar.is_visible();
        before != self.navbar.update(&self.metrics)
    }

    // --- time -------------------------------------------------------------

    /// Fire due timers; returns how many fired.
    pub fn tick(&mut self) -> usize {
        self.shell.tick()
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.shell.navigator().next_deadline()
    }

    // --- modal ------------------------------------------------------------

    /// Open a modal whose neighbours come from page callbacks.
    pub fn open_modal(
        &mut self,
        key: IdentityKey,
        hint: PageHint,
        on_previous: Option<PageSource>,
        on_next: Option<PageSource>,
    ) {
        let mut options = ModalOptions::new().identity(key.clone());
        options.hint = hint;
        options.has_navigation = on_previous.is_some() && on_next.is_some();
        options.on_previous = on_previous;
        options.on_next = on_next;
        self.shell.present(key, options);
    }

    /// Open a gallery over `keys` (a JSON array), starting at `index`.
    pub fn open_gallery(&mut self, keys_json: &str, index: usize) -> Result<bool, serde_json::Error> {
        let keys: Vec<IdentityKey> = serde_json::from_str(keys_json)?;
        let Some(pager) = ListPager::new(keys, index) else {
            debug!(target: "folio.web", index, "gallery index out of range");
            return Ok(false);
        };
        let first = pager.current().clone();
        self.shell.open_modal(first.clone(), pager.into_options(first));
        Ok(true)
    }

    pub fn close_modal(&mut self) {
        self.shell.close_modal();
    }

    pub fn close_and_navigate(&mut self, id: &str) -> bool {
        !self.shell.close_and_navigate(id).is_ignored()
    }

    pub fn page_next(&mut self) -> bool {
        self.shell.page_next()
    }

    pub fn page_previous(&mut self) -> bool {
        self.shell.page_previous()
    }

    /// `KeyboardEvent.key` handling; returns whether the key was consumed.
    pub fn handle_key(&mut self, key: &str) -> bool {
        self.shell.handle_key(ShellKey::from_dom_key(key))
    }

    pub fn handle_backdrop_click(&mut self) {
        self.shell.handle_backdrop_click();
    }

    // --- snapshot ---------------------------------------------------------

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let modal = self.shell.modal();
        let controls = modal.controls();
        Snapshot {
            active_section: self.active_section().to_owned(),
            path: self.shell.navigator().host().current_path(),
            is_transitioning: self.is_transitioning(),
            scroll_locked: self.shell.is_scroll_locked(),
            navbar_visible: self.navbar.is_visible(),
            scroll_progress: self.metrics.progress(),
            modal: ModalSnapshot {
                open: modal.is_open(),
                content: modal.content().cloned(),
                direction: modal.direction(),
                revision: modal.revision(),
                can_close: controls.close,
                paging: controls.paging,
                can_previous: controls.can_previous,
                can_next: controls.can_next,
            },
        }
    }

    #[must_use]
    pub fn snapshot_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_default()
    }
}
