#![forbid(unsafe_code)]

//! `web-sys` implementation of the host traits.
//!
//! Elements are interned into a handle table the first time they are seen
//! (by id lookup or as an observer entry target), so both paths agree on
//! handles. Event callbacks are owned by the wasm layer and handed in through
//! [`HostCallbacks`]. Only compiled on `wasm32` targets.

use core::time::Duration;

use folio_core::{
    ElementHandle, HistoryState, HostError, IntersectionEntry, NavigationHost, ObserverInit,
    ScrollMetrics, ScrollRoot, ShellHost,
};
use js_sys::{Array, Function, Object, Reflect};
use tracing::{trace, warn};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Document, Element, EventTarget, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition,
    Window,
};

pub(crate) fn js_error(value: JsValue) -> HostError {
    let msg = value
        .dyn_ref::<js_sys::Error>()
        .map(|err| String::from(err.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| "unknown error".to_owned());
    HostError::Js(msg)
}

/// `IntersectionObserverInit` as a plain object; `root: null` means the
/// viewport.
fn observer_options(root: JsValue, init: &ObserverInit) -> Result<Object, HostError> {
    let options = Object::new();
    let fields = [
        ("root", root),
        ("threshold", JsValue::from_f64(init.threshold)),
        ("rootMargin", JsValue::from_str(&init.root_margin)),
    ];
    for (key, value) in fields {
        Reflect::set(&options, &JsValue::from_str(key), &value).map_err(js_error)?;
    }
    Ok(options)
}

/// JS functions the host registers with the browser.
pub struct HostCallbacks {
    /// `IntersectionObserver` callback (`entries`).
    pub intersection: Function,
    pub pop_state: Function,
    /// Listener for `scroll` on the scroll root.
    pub scroll: Function,
    /// Listener for `scrollend` on the scroll root.
    pub scroll_end: Function,
    /// `setTimeout` target for the next timer deadline.
    pub wakeup: Function,
}

/// Browser host backed by `window` and `document`.
pub struct BrowserHost {
    window: Window,
    document: Document,
    elements: Vec<Element>,
    observer: Option<IntersectionObserver>,
    scroll_target: Option<EventTarget>,
    callbacks: Option<HostCallbacks>,
    /// Pending `setTimeout` handle and the deadline it was armed for.
    armed: Option<(i32, Duration)>,
}

impl BrowserHost {
    pub fn new() -> Result<Self, HostError> {
        let window = web_sys::window().ok_or(HostError::Unsupported("no window"))?;
        let document = window
            .document()
            .ok_or(HostError::Unsupported("no document"))?;
        Ok(Self {
            window,
            document,
            elements: Vec::new(),
            observer: None,
            scroll_target: None,
            callbacks: None,
            armed: None,
        })
    }

    pub fn install_callbacks(&mut self, callbacks: HostCallbacks) {
        self.callbacks = Some(callbacks);
    }

    fn callbacks(&self) -> Result<&HostCallbacks, HostError> {
        self.callbacks
            .as_ref()
            .ok_or(HostError::Unsupported("browser callbacks not installed"))
    }

    fn intern(&mut self, element: Element) -> ElementHandle {
        let known = self
            .elements
            .iter()
            .position(|e| AsRef::<JsValue>::as_ref(e) == AsRef::<JsValue>::as_ref(&element));
        let idx = known.unwrap_or_else(|| {
            self.elements.push(element);
            self.elements.len() - 1
        });
        ElementHandle::new(idx as u32)
    }

    fn element(&self, handle: ElementHandle) -> Result<&Element, HostError> {
        self.elements
            .get(handle.raw() as usize)
            .filter(|el| el.is_connected())
            .ok_or_else(|| HostError::MissingElement(format!("#{}", handle.raw())))
    }

    /// Convert a native observer batch into core entries.
    pub fn entries_from_js(&mut self, entries: &Array) -> Vec<IntersectionEntry> {
        entries
            .iter()
            .filter_map(|value| value.dyn_into::<IntersectionObserverEntry>().ok())
            .map(|entry| IntersectionEntry {
                element: self.intern(entry.target()),
                is_intersecting: entry.is_intersecting(),
                ratio: entry.intersection_ratio(),
            })
            .collect()
    }

    /// Arm a single `setTimeout` for `deadline`, replacing any other.
    pub fn arm_wakeup(&mut self, deadline: Option<Duration>) {
        if self.armed.map(|(_, at)| at) == deadline {
            return;
        }
        if let Some((handle, _)) = self.armed.take() {
            self.window.clear_timeout_with_handle(handle);
        }
        let Some(at) = deadline else {
            return;
        };
        let Ok(callbacks) = self.callbacks() else {
            return;
        };
        let delay = at.saturating_sub(self.now()).as_micros().div_ceil(1000);
        let delay = i32::try_from(delay).unwrap_or(i32::MAX);
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(&callbacks.wakeup, delay)
        {
            Ok(handle) => self.armed = Some((handle, at)),
            Err(err) => warn!(target: "folio.web", error = %js_error(err), "setTimeout failed"),
        }
    }

    /// The armed timeout ran.
    pub fn wakeup_fired(&mut self) {
        self.armed = None;
    }
}

impl NavigationHost for BrowserHost {
    fn now(&self) -> Duration {
        let ms = self.window.performance().map_or(0.0, |p| p.now());
        Duration::from_secs_f64(ms.max(0.0) / 1000.0)
    }

    fn current_path(&self) -> String {
        self.window
            .location()
            .pathname()
            .unwrap_or_else(|_| "/".to_owned())
    }

    fn push_history(&mut self, path: &str, state: &HistoryState) -> Result<(), HostError> {
        let data = js_sys::JSON::parse(&state.to_json()).map_err(js_error)?;
        self.window
            .history()
            .map_err(js_error)?
            .push_state_with_url(&data, "", Some(path))
            .map_err(js_error)
    }

    fn find_element(&mut self, id: &str) -> Option<ElementHandle> {
        let element = self.document.get_element_by_id(id)?;
        Some(self.intern(element))
    }

    fn scroll_into_view(&mut self, element: ElementHandle) -> Result<(), HostError> {
        let element = self.element(element)?;
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        options.set_block(ScrollLogicalPosition::Start);
        element.scroll_into_view_with_scroll_into_view_options(&options);
        Ok(())
    }

    fn add_class(&mut self, element: ElementHandle, class: &str) {
        if let Ok(el) = self.element(element) {
            if let Err(err) = el.class_list().add_1(class) {
                trace!(target: "folio.web", error = %js_error(err), "classList.add failed");
            }
        }
    }

    fn remove_class(&mut self, element: ElementHandle, class: &str) {
        if let Ok(el) = self.element(element) {
            if let Err(err) = el.class_list().remove_1(class) {
                trace!(target: "folio.web", error = %js_error(err), "classList.remove failed");
            }
        }
    }

    fn start_observer(&mut self, init: &ObserverInit) -> Result<(), HostError> {
        self.disconnect_observer();
        let (root, target): (JsValue, EventTarget) = match init.root {
            ScrollRoot::Container(handle) => {
                let el = self.element(handle)?;
                (el.clone().into(), el.clone().into())
            }
            ScrollRoot::Viewport => (JsValue::NULL, self.window.clone().into()),
        };
        let callbacks = self.callbacks()?;

        let options = observer_options(root, init)?;
        let observer = IntersectionObserver::new_with_options(
            &callbacks.intersection,
            options.unchecked_ref::<IntersectionObserverInit>(),
        )
        .map_err(js_error)?;

        target
            .add_event_listener_with_callback("scroll", &callbacks.scroll)
            .map_err(js_error)?;
        target
            .add_event_listener_with_callback("scrollend", &callbacks.scroll_end)
            .map_err(js_error)?;

        self.observer = Some(observer);
        self.scroll_target = Some(target);
        Ok(())
    }

    fn observe(&mut self, element: ElementHandle) -> Result<(), HostError> {
        let observer = self
            .observer
            .as_ref()
            .ok_or(HostError::Unsupported("observe without observer"))?;
        observer.observe(self.element(element)?);
        Ok(())
    }

    fn disconnect_observer(&mut self) {
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
        let Some(target) = self.scroll_target.take() else {
            return;
        };
        if let Some(callbacks) = self.callbacks.as_ref() {
            let _ = target.remove_event_listener_with_callback("scroll", &callbacks.scroll);
            let _ = target.remove_event_listener_with_callback("scrollend", &callbacks.scroll_end);
        }
    }

    fn listen_pop_state(&mut self) -> Result<(), HostError> {
        let callbacks = self.callbacks()?;
        self.window
            .add_event_listener_with_callback("popstate", &callbacks.pop_state)
            .map_err(js_error)
    }

    fn unlisten_pop_state(&mut self) {
        if let Some(callbacks) = self.callbacks.as_ref() {
            let _ = self
                .window
                .remove_event_listener_with_callback("popstate", &callbacks.pop_state);
        }
    }

    fn scroll_metrics(&mut self, root: ScrollRoot) -> ScrollMetrics {
        match root {
            ScrollRoot::Container(handle) => match self.element(handle) {
                Ok(el) => ScrollMetrics::new(
                    f64::from(el.scroll_top()),
                    f64::from(el.client_height()),
                    f64::from(el.scroll_height()),
                ),
                Err(_) => ScrollMetrics::default(),
            },
            ScrollRoot::Viewport => {
                let offset = self.window.scroll_y().unwrap_or(0.0);
                let viewport = self
                    .window
                    .inner_height()
                    .ok()
                    .and_then(|v| v.as_f64())
                    .unwrap_or(0.0);
                let content = self
                    .document
                    .document_element()
                    .map_or(0.0, |el| f64::from(el.scroll_height()));
                ScrollMetrics::new(offset, viewport, content)
            }
        }
    }
}

impl ShellHost for BrowserHost {
    fn set_body_scroll_locked(&mut self, locked: bool) {
        let Some(body) = self.document.body() else {
            return;
        };
        let style = body.style();
        let result = if locked {
            style.set_property("overflow", "hidden")
        } else {
            style.remove_property("overflow").map(drop)
        };
        if let Err(err) = result {
            warn!(target: "folio.web", locked, error = %js_error(err), "body scroll lock failed");
        }
    }
}
