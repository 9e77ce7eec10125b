#![forbid(unsafe_code)]

//! Single-overlay modal state with in-place paging.
//!
//! [`ModalState`] holds at most one open overlay. Opening replaces whatever
//! was shown; paging swaps the content while the overlay stays open so the
//! host can run a directional transition instead of a close/open pair.
//!
//! The content type is opaque to this module: the host decides what `C` is
//! (a rendered node, a project id, a view model) and renders it.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Last paging direction; selects the host's transition animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    None,
    Next,
    Previous,
}

/// Distinguishes "same modal, new content" from "a different modal".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdentityKey {
    Number(i64),
    Text(String),
}

impl From<&str> for IdentityKey {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for IdentityKey {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for IdentityKey {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

/// Overlay size class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModalSize {
    Small,
    #[default]
    Medium,
    Large,
    Full,
}

/// Whether neighbouring items exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageHint {
    pub has_next: bool,
    pub has_previous: bool,
}

/// Content produced by a paging callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<C> {
    pub content: C,
    pub hint: PageHint,
}

/// Paging callback: returns the neighbouring item, or `None` at the edge.
pub type PageFn<C> = Box<dyn FnMut() -> Option<Page<C>>>;

/// Options supplied when opening a modal.
pub struct ModalOptions<C> {
    pub has_navigation: bool,
    pub hint: PageHint,
    pub on_next: Option<PageFn<C>>,
    pub on_previous: Option<PageFn<C>>,
    pub size: ModalSize,
    pub identity: Option<IdentityKey>,
}

impl<C> Default for ModalOptions<C> {
    fn default() -> Self {
        Self {
            has_navigation: false,
            hint: PageHint::default(),
            on_next: None,
            on_previous: None,
            size: ModalSize::default(),
            identity: None,
        }
    }
}

impl<C> core::fmt::Debug for ModalOptions<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ModalOptions")
            .field("has_navigation", &self.has_navigation)
            .field("hint", &self.hint)
            .field("on_next", &self.on_next.is_some())
            .field("on_previous", &self.on_previous.is_some())
            .field("size", &self.size)
            .field("identity", &self.identity)
            .finish()
    }
}

impl<C> ModalOptions<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn identity(mut self, key: impl Into<IdentityKey>) -> Self {
        self.identity = Some(key.into());
        self
    }

    #[must_use]
    pub fn size(mut self, size: ModalSize) -> Self {
        self.size = size;
        self
    }

    /// Enable previous/next controls with the given callbacks.
    #[must_use]
    pub fn navigation(
        mut self,
        hint: PageHint,
        on_previous: impl FnMut() -> Option<Page<C>> + 'static,
        on_next: impl FnMut() -> Option<Page<C>> + 'static,
    ) -> Self {
        self.has_navigation = true;
        self.hint = hint;
        self.on_previous = Some(Box::new(on_previous));
        self.on_next = Some(Box::new(on_next));
        self
    }
}

/// Which controls the host should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ModalControls {
    pub close: bool,
    /// Previous/next controls are present.
    pub paging: bool,
    pub can_previous: bool,
    pub can_next: bool,
}

/// Backing data for modal triggers.
pub trait ContentLookup<K: ?Sized, C> {
    fn lookup(&self, key: &K) -> Option<C>;
}

impl<K: ?Sized, C, F> ContentLookup<K, C> for F
where
    F: Fn(&K) -> Option<C>,
{
    fn lookup(&self, key: &K) -> Option<C> {
        self(key)
    }
}

/// The one modal slot.
#[derive(Debug)]
pub struct ModalState<C> {
    is_open: bool,
    content: Option<C>,
    options: ModalOptions<C>,
    direction: Direction,
    revision: u64,
}

impl<C> Default for ModalState<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> ModalState<C> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            is_open: false,
            content: None,
            options: ModalOptions::default(),
            direction: Direction::None,
            revision: 0,
        }
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_open
    }

    /// Current (or, after close, last) content.
    #[must_use]
    pub fn content(&self) -> Option<&C> {
        self.content.as_ref()
    }

    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub const fn options(&self) -> &ModalOptions<C> {
        &self.options
    }

    #[must_use]
    pub fn identity(&self) -> Option<&IdentityKey> {
        self.options.identity.as_ref()
    }

    #[must_use]
    pub const fn hint(&self) -> PageHint {
        self.options.hint
    }

    /// Bumped on every open and content swap; usable as an animation key.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Open `content`, discarding whatever was shown.
    pub fn open(&mut self, content: C, options: ModalOptions<C>) {
        if self.is_open {
            trace!(target: "folio.modal", "replacing open modal");
        }
        debug!(target: "folio.modal", identity = ?options.identity, size = ?options.size, "modal opened");
        self.is_open = true;
        self.content = Some(content);
        self.options = options;
        self.direction = Direction::None;
        self.revision += 1;
    }

    /// Close the modal. The content stays so exit transitions can render it.
    pub fn close(&mut self) {
        if self.is_open {
            debug!(target: "folio.modal", "modal closed");
        }
        self.is_open = false;
        self.direction = Direction::None;
    }

    /// Swap content while open. `direction` is kept when `None`.
    ///
    /// Returns `false` (and changes nothing) when no modal is open.
    pub fn update_content(&mut self, content: C, direction: Option<Direction>) -> bool {
        if !self.is_open {
            trace!(target: "folio.modal", "update ignored; modal closed");
            return false;
        }
        self.content = Some(content);
        if let Some(direction) = direction {
            self.direction = direction;
        }
        self.revision += 1;
        true
    }

    /// Swap content and options while open, keeping the direction.
    ///
    /// Used when the open modal is presented again for the same entity with
    /// fresh paging state. Returns `false` when no modal is open.
    pub fn replace(&mut self, content: C, options: ModalOptions<C>) -> bool {
        if !self.is_open {
            trace!(target: "folio.modal", "replace ignored; modal closed");
            return false;
        }
        self.options = options;
        self.update_content(content, None)
    }

    /// Set the transition hint without touching content.
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Controls the host should show right now.
    #[must_use]
    pub fn controls(&self) -> ModalControls {
        let paging = self.is_open
            && self.options.has_navigation
            && self.options.on_next.is_some()
            && self.options.on_previous.is_some();
        ModalControls {
            close: self.is_open,
            paging,
            can_previous: paging && self.options.hint.has_previous,
            can_next: paging && self.options.hint.has_next,
        }
    }

    /// Page forward through the caller's callback.
    pub fn page_next(&mut self) -> bool {
        self.page(Direction::Next)
    }

    /// Page backward through the caller's callback.
    pub fn page_previous(&mut self) -> bool {
        self.page(Direction::Previous)
    }

    fn page(&mut self, direction: Direction) -> bool {
        if !self.controls().paging {
            return false;
        }
        // The host needs the direction before the new content arrives.
        self.set_direction(direction);
        let callback = match direction {
            Direction::Next => self.options.on_next.as_mut(),
            Direction::Previous => self.options.on_previous.as_mut(),
            Direction::None => None,
        };
        let Some(page) = callback.and_then(|f| f()) else {
            trace!(target: "folio.modal", ?direction, "paging hit the edge");
            return false;
        };
        self.options.hint = page.hint;
        self.update_content(page.content, None)
    }

    /// Open the modal for `key` only if it resolves. Returns whether it did.
    pub fn open_resolved<K, L>(&mut self, lookup: &L, key: &K, options: ModalOptions<C>) -> bool
    where
        K: ?Sized + core::fmt::Debug,
        L: ContentLookup<K, C> + ?Sized,
    {
        match lookup.lookup(key) {
            Some(content) => {
                self.open(content, options);
                true
            }
            None => {
                debug!(target: "folio.modal", key = ?key, "unresolved entity; nothing rendered");
                false
            }
        }
    }
}

/// Non-wrapping pager over an ordered list, e.g. related projects.
#[derive(Debug, Clone)]
pub struct ListPager<T> {
    items: Vec<T>,
    index: usize,
}

impl<T: Clone> ListPager<T> {
    /// Start at `index`; `None` if out of range.
    #[must_use]
    pub fn new(items: Vec<T>, index: usize) -> Option<Self> {
        (index < items.len()).then_some(Self { items, index })
    }

    /// Start at the first item equal to `item`.
    #[must_use]
    pub fn starting_at(items: Vec<T>, item: &T) -> Option<Self>
    where
        T: PartialEq,
    {
        let index = items.iter().position(|i| i == item)?;
        Self::new(items, index)
    }

    #[must_use]
    pub fn current(&self) -> &T {
        &self.items[self.index]
    }

    #[must_use]
    pub fn hint(&self) -> PageHint {
        PageHint {
            has_next: self.index + 1 < self.items.len(),
            has_previous: self.index > 0,
        }
    }

    pub fn next(&mut self) -> Option<Page<T>> {
        if !self.hint().has_next {
            return None;
        }
        self.index += 1;
        Some(self.page())
    }

    pub fn previous(&mut self) -> Option<Page<T>> {
        if !self.hint().has_previous {
            return None;
        }
        self.index -= 1;
        Some(self.page())
    }

    fn page(&self) -> Page<T> {
        Page {
            content: self.current().clone(),
            hint: self.hint(),
        }
    }
}

impl<T: Clone + 'static> ListPager<T> {
    /// Options wired to this pager, with the identity taken from `identity`.
    #[must_use]
    pub fn into_options(self, identity: impl Into<IdentityKey>) -> ModalOptions<T> {
        use std::cell::RefCell;
        use std::rc::Rc;

        let hint = self.hint();
        let shared = Rc::new(RefCell::new(self));
        let prev = Rc::clone(&shared);
        ModalOptions::new().identity(identity).navigation(
            hint,
            move || prev.borrow_mut().previous(),
            move || shared.borrow_mut().next(),
        )
    }
}
