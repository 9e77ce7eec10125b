//! Observer setup, late-mount retry, and teardown.

use std::time::Duration;

use folio_core::testing::FakeDom;
use folio_core::{FolioConfig, Navigator, ScrollRoot, SectionRegistry};
use pretty_assertions::assert_eq;

fn navigator(dom: FakeDom) -> Navigator<FakeDom> {
    Navigator::new(dom, SectionRegistry::portfolio(), FolioConfig::default())
}

fn advance(nav: &mut Navigator<FakeDom>, ms: u64) -> usize {
    nav.host_mut().advance(Duration::from_millis(ms));
    nav.poll_timers()
}

#[test]
fn late_section_is_picked_up_by_the_retry() {
    let mut dom = FakeDom::portfolio();
    dom.unmount("contact");
    let mut nav = navigator(dom);

    let report = nav.setup_intersection_observer();
    assert_eq!(report.observed.len(), 5);
    assert_eq!(report.missing, vec![nav.registry().resolve("contact").unwrap()]);
    assert!(nav.watcher().retry_pending());
    assert_eq!(nav.next_deadline(), Some(Duration::from_millis(500)));

    advance(&mut nav, 300);
    nav.host_mut().mount("contact");
    assert_eq!(nav.host().observed_ids().len(), 5);

    assert_eq!(advance(&mut nav, 200), 1);
    assert_eq!(nav.host().observed_ids().len(), 6);
    assert!(!nav.watcher().retry_pending());
}

#[test]
fn retry_runs_once() {
    let mut dom = FakeDom::portfolio();
    dom.unmount("philosophy");
    let mut nav = navigator(dom);
    nav.setup_intersection_observer();

    advance(&mut nav, 500);
    assert_eq!(nav.host().observed_ids().len(), 5);
    assert_eq!(nav.next_deadline(), None);

    // Mounting after the retry window is not noticed.
    nav.host_mut().mount("philosophy");
    advance(&mut nav, 5_000);
    assert_eq!(nav.host().observed_ids().len(), 5);
    let philosophy = nav.registry().resolve("philosophy").unwrap();
    assert!(!nav.watcher().is_observed(philosophy));
}

#[test]
fn repeated_setup_starts_one_observer_and_one_retry() {
    let mut dom = FakeDom::portfolio();
    dom.unmount("hero");
    let mut nav = navigator(dom);
    nav.setup_intersection_observer();
    nav.setup_intersection_observer();
    assert_eq!(nav.host().observer_starts(), 1);
    assert_eq!(advance(&mut nav, 500), 1);
}

#[test]
fn cleanup_cancels_pending_retry() {
    let mut dom = FakeDom::portfolio();
    dom.unmount("tech-stack");
    let mut nav = navigator(dom);
    nav.setup_intersection_observer();
    nav.setup_pop_state_listener().unwrap();

    nav.cleanup();
    assert_eq!(nav.host().observer_count(), 0);
    assert_eq!(nav.host().pop_state_listeners(), 0);
    assert_eq!(advance(&mut nav, 500), 0);

    // A second cleanup is harmless.
    nav.cleanup();
    assert_eq!(nav.host().pop_state_listeners(), 0);
}

#[test]
fn cleanup_keeps_in_flight_transition_releasable() {
    let mut nav = navigator(FakeDom::portfolio());
    nav.setup_intersection_observer();
    nav.navigate_to_section("experience");
    nav.cleanup();
    assert!(nav.is_transitioning());
    advance(&mut nav, 800);
    assert!(!nav.is_transitioning());
}

#[test]
fn observer_uses_scroll_container_when_mounted() {
    let mut dom = FakeDom::portfolio();
    let container = dom.mount("main-scroll");
    let mut nav = navigator(dom);
    nav.setup_intersection_observer();
    let init = nav.host().observer_init().unwrap();
    assert_eq!(init.root, ScrollRoot::Container(container));
    assert_eq!(nav.watcher().root(), Some(ScrollRoot::Container(container)));
}

#[test]
fn observer_falls_back_to_viewport() {
    let mut nav = navigator(FakeDom::portfolio());
    nav.setup_intersection_observer();
    assert_eq!(nav.host().observer_init().unwrap().root, ScrollRoot::Viewport);
}

#[test]
fn configured_threshold_reaches_the_host() {
    let mut config = FolioConfig::default();
    config.observer.threshold = 0.25;
    config.observer.root_margin = "-64px 0px 0px 0px".to_owned();
    let mut nav = Navigator::from_config(FakeDom::portfolio(), config).unwrap();
    nav.setup_intersection_observer();
    let init = nav.host().observer_init().unwrap();
    assert_eq!(init.threshold, 0.25);
    assert_eq!(init.root_margin, "-64px 0px 0px 0px");
}

#[test]
fn replaced_section_node_is_scrolled_and_observed_again() {
    let mut nav = navigator(FakeDom::portfolio());
    nav.setup_intersection_observer();
    let fresh = nav.host_mut().replace_node("projects");

    assert!(!nav.navigate_to_section("projects").is_ignored());
    assert_eq!(nav.host().scrolled_to(), ["projects"]);
    assert!(nav.host().has_class("projects", "section-focus"));
    assert!(nav.host().observed_ids().contains(&"projects"));

    advance(&mut nav, 800);
    nav.navigate_to_section("contact");
    advance(&mut nav, 800);
    let entry = nav.host().entered("projects");
    assert_eq!(entry.element, fresh);
    assert!(!nav.on_intersection(&[entry]).is_ignored());
    assert_eq!(nav.active_section_id(), "projects");
}
