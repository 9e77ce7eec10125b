#![cfg(target_arch = "wasm32")]
#![forbid(unsafe_code)]

use folio_web::FolioApp;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

wasm_bindgen_test_configure!(run_in_browser);

const SECTIONS: [&str; 6] = [
    "hero",
    "tech-stack",
    "projects",
    "experience",
    "philosophy",
    "contact",
];

fn mount_sections() {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .expect("document");
    let body = document.body().expect("body");
    for id in SECTIONS {
        if document.get_element_by_id(id).is_some() {
            continue;
        }
        let el = document.create_element("section").expect("create section");
        el.set_id(id);
        body.append_child(&el).expect("append section");
    }
}

fn snapshot(app: &FolioApp) -> serde_json::Value {
    serde_json::from_str(&app.snapshot_json()).expect("snapshot json")
}

#[wasm_bindgen_test]
fn navigation_updates_url_and_state() {
    mount_sections();
    let app = FolioApp::new(None).expect("app");
    assert!(app.setup_pop_state_listener());
    assert_eq!(app.setup_intersection_observer(), 6);

    assert!(app.navigate_to_section("projects"));
    assert_eq!(app.active_section(), "projects");
    assert!(app.is_transitioning());
    assert!(!app.navigate_to_section("contact"));

    let path = web_sys::window()
        .expect("window")
        .location()
        .pathname()
        .expect("pathname");
    assert_eq!(path, "/projects");
    assert_eq!(snapshot(&app)["path"], "/projects");
    app.cleanup();
}

#[wasm_bindgen_test]
fn modal_locks_body_scroll_until_escape() {
    mount_sections();
    let app = FolioApp::new(None).expect("app");
    app.open_modal(JsValue::from_str("folio"), false, false, None, None)
        .expect("open");
    assert_eq!(snapshot(&app)["modal"]["content"], "folio");

    let body = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.body())
        .expect("body");
    assert_eq!(
        body.style().get_property_value("overflow").expect("style"),
        "hidden"
    );

    assert!(app.handle_key("Escape"));
    assert_eq!(snapshot(&app)["modal"]["open"], false);
    assert_eq!(
        body.style().get_property_value("overflow").expect("style"),
        ""
    );
}

#[wasm_bindgen_test]
fn bad_config_is_rejected() {
    assert!(FolioApp::new(Some(r#"{"sections":[]}"#.to_owned())).is_err());
}
