//! End-to-end navigation scenarios against the in-memory host.

use std::time::Duration;

use folio_core::testing::FakeDom;
use folio_core::{
    FolioConfig, HistoryTrigger, IgnoreReason, NavigationHost, NavigationOutcome, Navigator,
    SectionRegistry,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const SETTLE: Duration = Duration::from_millis(800);

fn navigator() -> Navigator<FakeDom> {
    Navigator::new(
        FakeDom::portfolio(),
        SectionRegistry::portfolio(),
        FolioConfig::default(),
    )
}

fn mounted() -> Navigator<FakeDom> {
    let mut nav = navigator();
    nav.setup_intersection_observer();
    nav.setup_pop_state_listener().unwrap();
    nav
}

fn settle(nav: &mut Navigator<FakeDom>) {
    nav.host_mut().advance(SETTLE);
    nav.poll_timers();
}

fn paths(nav: &Navigator<FakeDom>) -> Vec<String> {
    nav.host()
        .history_entries()
        .iter()
        .map(|e| e.path.clone())
        .collect()
}

#[test]
fn reentrant_navigation_is_dropped_not_queued() {
    let mut nav = mounted();
    nav.navigate_to_section("projects");
    let second = nav.navigate_to_section("contact");
    assert_eq!(
        second,
        NavigationOutcome::Ignored(IgnoreReason::ReentrantNavigation)
    );
    assert_eq!(nav.active_section_id(), "projects");
    assert_eq!(paths(&nav), ["/", "/projects"]);

    // Nothing was deferred: settling does not replay the dropped call.
    settle(&mut nav);
    assert_eq!(nav.active_section_id(), "projects");
    assert_eq!(nav.host().history_len(), 2);
}

#[test]
fn history_round_trip_returns_home() {
    let mut nav = mounted();
    nav.navigate_to_section("experience");
    settle(&mut nav);
    assert_eq!(nav.host().current_path(), "/experience");

    assert!(nav.host_mut().back());
    let outcome = nav.on_pop_state();
    assert!(matches!(outcome, NavigationOutcome::Started { pushed: false, .. }));
    assert_eq!(nav.active_section_id(), "hero");
    assert_eq!(nav.host().current_path(), "/");
    assert_eq!(nav.host().scrolled_to(), ["experience", "hero"]);
}

#[test]
fn home_projects_back_scenario() {
    let mut nav = mounted();
    assert_eq!(nav.active_section_id(), "hero");
    assert_eq!(nav.host().current_path(), "/");

    nav.navigate_to_section("projects");
    assert_eq!(nav.active_section_id(), "projects");
    assert_eq!(nav.host().current_path(), "/projects");
    assert_eq!(nav.host().history_len(), 2);
    let pushed = nav.host().history_entries()[1].state.clone().unwrap();
    assert_eq!(pushed.trigger, HistoryTrigger::Navigation);

    settle(&mut nav);
    nav.host_mut().back();
    nav.on_pop_state();
    assert_eq!(nav.active_section_id(), "hero");
    assert_eq!(nav.host().current_path(), "/");
    // Back does not push.
    assert_eq!(nav.host().history_len(), 2);
}

#[test]
fn forward_after_back_restores_section() {
    let mut nav = mounted();
    nav.navigate_to_section("contact");
    settle(&mut nav);
    nav.host_mut().back();
    nav.on_pop_state();
    settle(&mut nav);
    nav.host_mut().forward();
    nav.on_pop_state();
    assert_eq!(nav.active_section_id(), "contact");
}

#[test]
fn popstate_during_transition_is_ignored() {
    let mut nav = mounted();
    nav.navigate_to_section("projects");
    nav.host_mut().back();
    assert_eq!(
        nav.on_pop_state(),
        NavigationOutcome::Ignored(IgnoreReason::SuppressedDuringTransition)
    );
    assert_eq!(nav.active_section_id(), "projects");
}

#[test]
fn popstate_to_unknown_path_leaves_state() {
    let mut nav = Navigator::new(
        FakeDom::portfolio().at_path("/blog"),
        SectionRegistry::portfolio(),
        FolioConfig::default(),
    );
    nav.setup_pop_state_listener().unwrap();
    assert_eq!(
        nav.on_pop_state(),
        NavigationOutcome::Ignored(IgnoreReason::InvalidSectionId)
    );
    assert_eq!(nav.active_section_id(), "hero");
    assert!(!nav.is_transitioning());
}

#[test]
fn popstate_without_listener_is_ignored() {
    let mut nav = navigator();
    nav.navigate_to_section("contact");
    settle(&mut nav);
    nav.host_mut().back();
    assert_eq!(
        nav.on_pop_state(),
        NavigationOutcome::Ignored(IgnoreReason::NotListening)
    );
    assert_eq!(nav.active_section_id(), "contact");
}

#[test]
fn popstate_to_missing_element_releases_immediately() {
    let mut nav = mounted();
    nav.navigate_to_section("philosophy");
    settle(&mut nav);
    nav.host_mut().unmount("hero");
    nav.host_mut().back();
    nav.on_pop_state();
    assert_eq!(nav.active_section_id(), "hero");
    assert!(!nav.is_transitioning());
}

#[test]
fn observer_feedback_is_suppressed_while_transitioning() {
    let mut nav = mounted();
    nav.navigate_to_section("projects");
    let entry = nav.host().entered("experience");
    assert_eq!(
        nav.on_intersection(&[entry]),
        NavigationOutcome::Ignored(IgnoreReason::SuppressedDuringTransition)
    );
    assert_eq!(nav.active_section_id(), "projects");
    assert_eq!(nav.host().history_len(), 2);
}

#[test]
fn observer_feedback_follows_scroll_and_tags_history() {
    let mut nav = mounted();
    let entry = nav.host().entered("tech-stack");
    let outcome = nav.on_intersection(&[entry]);
    assert!(matches!(outcome, NavigationOutcome::Followed { pushed: true, .. }));
    assert_eq!(nav.active_section_id(), "tech-stack");
    assert!(!nav.is_transitioning());
    let last = nav.host().history_entries().last().unwrap().clone();
    assert_eq!(last.path, "/tech-stack");
    assert_eq!(last.state.unwrap().trigger, HistoryTrigger::Scroll);

    // Re-entering the same section does not push again.
    let again = nav.host().entered("tech-stack");
    assert!(!nav.on_intersection(&[again]).pushed());
    assert_eq!(nav.host().history_len(), 2);
}

#[test]
fn observer_ignores_leaving_entries_and_unknown_elements() {
    let mut nav = mounted();
    let left = nav.host().left("projects");
    assert_eq!(
        nav.on_intersection(&[left]),
        NavigationOutcome::Ignored(IgnoreReason::NotIntersecting)
    );
    let stray = nav.host_mut().mount("footer");
    assert_eq!(
        nav.on_intersection(&[folio_core::IntersectionEntry::entered(stray, 1.0)]),
        NavigationOutcome::Ignored(IgnoreReason::UnknownElement)
    );
    assert_eq!(nav.active_section_id(), "hero");
}

#[test]
fn observer_batch_applies_in_order() {
    let mut nav = mounted();
    let batch = [
        nav.host().entered("projects"),
        nav.host().left("hero"),
        nav.host().entered("experience"),
    ];
    nav.on_intersection(&batch);
    assert_eq!(nav.active_section_id(), "experience");
    assert_eq!(paths(&nav), ["/", "/projects", "/experience"]);
}

#[test]
fn navigation_resumes_observer_after_settle() {
    let mut nav = mounted();
    nav.navigate_to_section("projects");
    settle(&mut nav);
    let entry = nav.host().entered("experience");
    assert!(!nav.on_intersection(&[entry]).is_ignored());
    assert_eq!(nav.active_section_id(), "experience");
}

#[test]
fn deep_link_on_load_scrolls_without_pushing() {
    let mut nav = Navigator::new(
        FakeDom::portfolio().at_path("/projects"),
        SectionRegistry::portfolio(),
        FolioConfig::default(),
    );
    nav.setup_pop_state_listener().unwrap();
    let outcome = nav.sync_from_location();
    assert!(matches!(outcome, NavigationOutcome::Started { pushed: false, .. }));
    nav.setup_intersection_observer();

    // The observer's initial report still sees the top of the page.
    let first_batch = nav.host().entered("hero");
    assert_eq!(
        nav.on_intersection(&[first_batch]),
        NavigationOutcome::Ignored(IgnoreReason::SuppressedDuringTransition)
    );
    assert_eq!(nav.active_section_id(), "projects");
    assert_eq!(nav.host().scrolled_to(), ["projects"]);

    settle(&mut nav);
    assert_eq!(nav.active_section_id(), "projects");
    assert_eq!(paths(&nav), ["/projects"]);
}

#[test]
fn location_sync_ignores_root_and_unknown_paths() {
    let mut nav = navigator();
    assert_eq!(
        nav.sync_from_location(),
        NavigationOutcome::Ignored(IgnoreReason::AlreadyActive)
    );

    let mut nav = Navigator::new(
        FakeDom::portfolio().at_path("/blog"),
        SectionRegistry::portfolio(),
        FolioConfig::default(),
    );
    assert_eq!(
        nav.sync_from_location(),
        NavigationOutcome::Ignored(IgnoreReason::InvalidSectionId)
    );
    assert_eq!(nav.active_section_id(), "hero");
    assert!(nav.host().scrolled_to().is_empty());
}

#[test]
fn registry_overrides_disagreeing_config_sections() {
    let mut config = FolioConfig::default();
    config.sections.truncate(2);
    config.home_section = Some("tech-stack".into());
    let nav = Navigator::new(FakeDom::portfolio(), SectionRegistry::portfolio(), config);
    assert_eq!(nav.config().sections.len(), 6);
    assert_eq!(nav.config().home_section.as_deref(), Some("hero"));
    assert!(nav.config().validate().is_empty());
}

proptest! {
    #[test]
    fn unknown_ids_never_change_state(id in "\\PC{0,24}") {
        let mut nav = navigator();
        prop_assume!(nav.registry().resolve(&id).is_none());
        let outcome = nav.navigate_to_section(&id);
        prop_assert_eq!(outcome, NavigationOutcome::Ignored(IgnoreReason::InvalidSectionId));
        prop_assert_eq!(nav.active_section_id(), "hero");
        prop_assert_eq!(nav.host().current_path(), "/");
        prop_assert_eq!(nav.host().history_len(), 1);
        prop_assert!(!nav.is_transitioning());
    }

    #[test]
    fn every_push_changes_the_path(ops in proptest::collection::vec(0usize..6, 1..20)) {
        let mut nav = mounted();
        let ids: Vec<String> = nav.registry().iter().map(|(_, s)| s.id().to_owned()).collect();
        for op in ops {
            nav.navigate_to_section(&ids[op]);
            settle(&mut nav);
        }
        let entries = nav.host().history_entries();
        for pair in entries.windows(2) {
            prop_assert_ne!(&pair[0].path, &pair[1].path);
        }
        prop_assert!(!nav.is_transitioning());
    }
}
