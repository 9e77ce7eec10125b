#![forbid(unsafe_code)]

//! Back/forward reconciliation.
//!
//! [`HistorySync`] tracks whether the popstate listener is installed and maps
//! the URL path the browser landed on back to a registered section. The
//! transition itself (scroll, focus marker, settle window) is run by the
//! navigator so that explicit navigation and history navigation share one
//! code path and one re-entrancy guard.

use tracing::{debug, warn};

use crate::host::{HostError, NavigationHost};
use crate::navigation::IgnoreReason;
use crate::section::{SectionKey, SectionRegistry};

/// Popstate listener state.
#[derive(Debug, Clone, Default)]
pub struct HistorySync {
    listening: bool,
    pops_handled: u64,
}

impl HistorySync {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            listening: false,
            pops_handled: 0,
        }
    }

    #[must_use]
    pub const fn is_listening(&self) -> bool {
        self.listening
    }

    /// Back/forward events that resolved to a section.
    #[must_use]
    pub const fn pops_handled(&self) -> u64 {
        self.pops_handled
    }

    /// Install the listener. A second call is a no-op.
    pub fn listen<H: NavigationHost + ?Sized>(&mut self, host: &mut H) -> Result<(), HostError> {
        if self.listening {
            return Ok(());
        }
        host.listen_pop_state().inspect_err(|err| {
            warn!(target: "folio.history", error = %err, "popstate listener unavailable");
        })?;
        self.listening = true;
        debug!(target: "folio.history", "popstate listener installed");
        Ok(())
    }

    /// Remove the listener. Safe when it was never installed.
    pub fn unlisten<H: NavigationHost + ?Sized>(&mut self, host: &mut H) {
        if self.listening {
            host.unlisten_pop_state();
            debug!(target: "folio.history", "popstate listener removed");
        }
        self.listening = false;
    }

    /// Section the browser's current path points at.
    pub fn target_for(
        &mut self,
        registry: &SectionRegistry,
        path: &str,
    ) -> Result<SectionKey, IgnoreReason> {
        if !self.listening {
            return Err(IgnoreReason::NotListening);
        }
        let key = registry.resolve_path(path).ok_or(IgnoreReason::InvalidSectionId)?;
        self.pops_handled += 1;
        Ok(key)
    }
}
