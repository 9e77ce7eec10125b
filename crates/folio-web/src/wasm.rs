#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for [`FolioApp`].
//!
//! This module wraps [`super::runner_core::FolioRunner`] with JS-friendly
//! types and owns every closure the browser calls back into. Only compiled
//! on `wasm32` targets.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use folio_core::PageHint;
use js_sys::{Array, Function};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Event;

use super::browser::{BrowserHost, HostCallbacks};
use super::runner_core::{FolioRunner, PageSource, parse_identity, parse_page};

type Runner = FolioRunner<BrowserHost>;

fn console_error(msg: &str) {
    web_sys::console::error_1(&JsValue::from_str(msg));
}

/// Route Rust panics to the devtools console; wasm has no stderr.
fn install_panic_hook() {
    static HOOK: std::sync::Once = std::sync::Once::new();
    HOOK.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let place = info
                .location()
                .map(|loc| format!(" ({}:{})", loc.file(), loc.line()))
                .unwrap_or_default();
            console_error(&format!("folio: navigation runtime panicked{place}: {info}"));
        }));
    });
}

fn to_js(err: impl core::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Re-arm the single platform timeout after any state change.
fn rearm(runner: &mut Runner) {
    let deadline = runner.next_deadline();
    runner.host_mut().arm_wakeup(deadline);
}

/// Run a browser callback against the runner, if it is still alive.
fn dispatch(weak: &Weak<RefCell<Runner>>, f: impl FnOnce(&mut Runner)) {
    let Some(shared) = weak.upgrade() else {
        return;
    };
    let Ok(mut runner) = shared.try_borrow_mut() else {
        console_error("folio: browser callback arrived while the runner was busy");
        return;
    };
    f(&mut runner);
    rearm(&mut runner);
}

/// Wrap a page-supplied JS function as a paging callback.
///
/// The function returns `{key, hasNext, hasPrevious}` or `null`. It runs
/// while the app is busy, so it must not call back into [`FolioApp`].
fn page_source(f: Function) -> PageSource {
    Box::new(move || {
        let value = match f.call0(&JsValue::NULL) {
            Ok(value) => value,
            Err(err) => {
                console_error(&format!("folio: page callback threw: {err:?}"));
                return None;
            }
        };
        if value.is_null() || value.is_undefined() {
            return None;
        }
        let text = js_sys::JSON::stringify(&value).ok()?.as_string()?;
        parse_page(&text)
    })
}

fn function_of(value: &JsValue) -> Function {
    value.unchecked_ref::<Function>().clone()
}

/// Closures the browser holds references to. Dropped with the app.
struct Listeners {
    intersection: Closure<dyn FnMut(Array)>,
    pop_state: Closure<dyn FnMut(Event)>,
    scroll: Closure<dyn FnMut(Event)>,
    scroll_end: Closure<dyn FnMut(Event)>,
    wakeup: Closure<dyn FnMut()>,
}

impl Listeners {
    fn new(shared: &Rc<RefCell<Runner>>) -> Self {
        let weak = Rc::downgrade(shared);

        let w = weak.clone();
        let intersection = Closure::<dyn FnMut(Array)>::new(move |entries: Array| {
            dispatch(&w, |runner| {
                let entries = runner.host_mut().entries_from_js(&entries);
                runner.on_intersection(&entries);
            });
        });

        let w = weak.clone();
        let pop_state = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
            dispatch(&w, |runner| {
                runner.on_pop_state();
            });
        });

        let w = weak.clone();
        let scroll = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
            dispatch(&w, |runner| {
                runner.on_scroll();
            });
        });

        let w = weak.clone();
        let scroll_end = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
            dispatch(&w, |runner| {
                runner.on_scroll_settled();
            });
        });

        let wakeup = Closure::<dyn FnMut()>::new(move || {
            dispatch(&weak, |runner| {
                runner.host_mut().wakeup_fired();
                runner.tick();
            });
        });

        Self {
            intersection,
            pop_state,
            scroll,
            scroll_end,
            wakeup,
        }
    }

    fn callbacks(&self) -> HostCallbacks {
        HostCallbacks {
            intersection: function_of(self.intersection.as_ref()),
            pop_state: function_of(self.pop_state.as_ref()),
            scroll: function_of(self.scroll.as_ref()),
            scroll_end: function_of(self.scroll_end.as_ref()),
            wakeup: function_of(self.wakeup.as_ref()),
        }
    }
}

/// Section navigation and modal coordination for a single-page portfolio.
///
/// Host-driven: the page calls in for user actions; observer, history,
/// scroll and timer events are wired internally. Render from
/// `snapshotJson()`.
#[wasm_bindgen]
pub struct FolioApp {
    inner: Rc<RefCell<Runner>>,
    _listeners: Listeners,
}

#[wasm_bindgen(start)]
pub fn wasm_start() {
    install_panic_hook();
}

impl FolioApp {
    fn with<R>(&self, f: impl FnOnce(&mut Runner) -> R) -> Option<R> {
        let Ok(mut runner) = self.inner.try_borrow_mut() else {
            console_error("folio: re-entrant call ignored");
            return None;
        };
        let out = f(&mut runner);
        rearm(&mut runner);
        Some(out)
    }
}

#[wasm_bindgen]
impl FolioApp {
    /// Create the app. `config_json` overrides the default sections and
    /// timings; omit it for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<FolioApp, JsValue> {
        install_panic_hook();
        let host = BrowserHost::new().map_err(to_js)?;
        let runner = FolioRunner::from_config_json(host, config_json.as_deref()).map_err(to_js)?;
        let inner = Rc::new(RefCell::new(runner));
        let listeners = Listeners::new(&inner);
        inner
            .borrow_mut()
            .host_mut()
            .install_callbacks(listeners.callbacks());
        Ok(Self {
            inner,
            _listeners: listeners,
        })
    }

    /// Returns `false` when the id is unknown or a transition is in flight.
    #[wasm_bindgen(js_name = navigateToSection)]
    pub fn navigate_to_section(&self, id: &str) -> bool {
        self.with(|r| r.navigate_to_section(id)).unwrap_or_default()
    }

    #[wasm_bindgen(js_name = activeSection)]
    pub fn active_section(&self) -> String {
        self.with(|r| r.active_section().to_owned())
            .unwrap_or_default()
    }

    #[wasm_bindgen(js_name = isTransitioning)]
    pub fn is_transitioning(&self) -> bool {
        self.with(|r| r.is_transitioning()).unwrap_or_default()
    }

    /// Returns how many sections are observed.
    #[wasm_bindgen(js_name = setupIntersectionObserver)]
    pub fn setup_intersection_observer(&self) -> u32 {
        self.with(|r| r.setup_intersection_observer() as u32)
            .unwrap_or_default()
    }

    #[wasm_bindgen(js_name = setupPopStateListener)]
    pub fn setup_pop_state_listener(&self) -> bool {
        self.with(|r| r.setup_pop_state_listener())
            .unwrap_or_default()
    }

    /// Remove observers and listeners. Safe to call more than once.
    pub fn cleanup(&self) {
        self.with(|r| r.cleanup());
    }

    /// Feed an observer batch from a page-owned observer:
    /// `[{"id":"projects","isIntersecting":true,"ratio":0.6}]`.
    #[wasm_bindgen(js_name = pushIntersections)]
    pub fn push_intersections(&self, json: &str) -> Result<bool, JsValue> {
        match self.with(|r| r.on_intersection_json(json)) {
            Some(Ok(outcome)) => Ok(!outcome.is_ignored()),
            Some(Err(err)) => Err(to_js(err)),
            None => Ok(false),
        }
    }

    /// Open (or, for the same `identityKey`, update) the modal.
    ///
    /// `onPrevious`/`onNext` return `{key, hasNext, hasPrevious}` or `null`;
    /// paging controls are shown only when both are given.
    #[wasm_bindgen(js_name = openModal)]
    pub fn open_modal(
        &self,
        identity_key: JsValue,
        has_next: bool,
        has_previous: bool,
        on_previous: Option<Function>,
        on_next: Option<Function>,
    ) -> Result<(), JsValue> {
        let text = js_sys::JSON::stringify(&identity_key)?
            .as_string()
            .ok_or_else(|| JsValue::from_str("identity key is not serializable"))?;
        let key = parse_identity(&text).map_err(to_js)?;
        let hint = PageHint {
            has_next,
            has_previous,
        };
        self.with(|r| {
            r.open_modal(key, hint, on_previous.map(page_source), on_next.map(page_source));
        });
        Ok(())
    }

    /// Open a modal paging over `keysJson` (a JSON array), starting at
    /// `index`.
    #[wasm_bindgen(js_name = openGallery)]
    pub fn open_gallery(&self, keys_json: &str, index: usize) -> Result<bool, JsValue> {
        match self.with(|r| r.open_gallery(keys_json, index)) {
            Some(result) => result.map_err(to_js),
            None => Ok(false),
        }
    }

    #[wasm_bindgen(js_name = closeModal)]
    pub fn close_modal(&self) {
        self.with(|r| r.close_modal());
    }

    /// Close the modal, then navigate to a section.
    #[wasm_bindgen(js_name = closeAndNavigate)]
    pub fn close_and_navigate(&self, id: &str) -> bool {
        self.with(|r| r.close_and_navigate(id)).unwrap_or_default()
    }

    #[wasm_bindgen(js_name = pageNext)]
    pub fn page_next(&self) -> bool {
        self.with(|r| r.page_next()).unwrap_or_default()
    }

    #[wasm_bindgen(js_name = pagePrevious)]
    pub fn page_previous(&self) -> bool {
        self.with(|r| r.page_previous()).unwrap_or_default()
    }

    /// `KeyboardEvent.key`; returns whether the key was consumed.
    #[wasm_bindgen(js_name = handleKey)]
    pub fn handle_key(&self, key: &str) -> bool {
        self.with(|r| r.handle_key(key)).unwrap_or_default()
    }

    #[wasm_bindgen(js_name = handleBackdropClick)]
    pub fn handle_backdrop_click(&self) {
        self.with(|r| r.handle_backdrop_click());
    }

    #[wasm_bindgen(js_name = snapshotJson)]
    pub fn snapshot_json(&self) -> String {
        self.with(|r| r.snapshot_json()).unwrap_or_default()
    }
}

impl Drop for FolioApp {
    fn drop(&mut self) {
        if let Ok(mut runner) = self.inner.try_borrow_mut() {
            runner.cleanup();
            runner.host_mut().arm_wakeup(None);
        }
    }
}
