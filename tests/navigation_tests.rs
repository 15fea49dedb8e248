//! End-to-end navigation cycles over recording boundaries.
//!
//! Each test boots a controller the way `init_client` does in the browser,
//! drives `navigate`/`submit` to completion, and asserts on the committed
//! store state plus the history and head side effects.

#![cfg(not(target_arch = "wasm32"))]

mod common;

use common::*;
use serde_json::json;
use spa_navigator::*;

#[test]
fn test_navigation_commits_state_and_pushes_history() {
    let fetcher = ScriptedFetcher::new();
    let loader = RecordingLoader::new();
    let h = boot(fetcher.clone(), loader.clone(), &["root.js", "home.js"]);
    fetcher.on("/docs", response_body(&["root.js", "docs.js"], "Docs", BUILD));

    let outcome = pollster::block_on(h.controller.navigate(
        "/docs",
        true,
        &LoadIndicator::none(),
    ));

    assert!(outcome.is_completed(), "cycle should commit: {outcome:?}");
    assert_eq!(h.chain_keys(), ["root.js", "docs.js"]);
    assert_eq!(h.store().title().get(), "Docs");
    assert_eq!(h.morph.titles.borrow().as_slice(), ["Docs"]);
    assert_eq!(h.history.pushes.borrow().as_slice(), ["/docs"]);
    assert!(h.history.replaces.borrow().is_empty());
}

#[test]
fn test_reused_layer_keeps_component_instance() {
    let fetcher = ScriptedFetcher::new();
    let loader = RecordingLoader::new();
    let h = boot(fetcher.clone(), loader.clone(), &["root.js", "home.js"]);
    fetcher.on("/docs", response_body(&["root.js", "docs.js"], "Docs", BUILD));

    let root_before = h.store().active_components().get()[0].clone();
    pollster::block_on(h.controller.navigate("/docs", true, &LoadIndicator::none()));

    let components = h.store().active_components().get();
    assert!(
        components[0].same_instance(&root_before),
        "reused root layer must keep its mounted instance"
    );
    assert_eq!(
        components[1].downcast_ref::<String>().map(String::as_str),
        Some("docs.js")
    );
    // Hydration loaded the bootstrap pair; the navigation loaded only the
    // replaced leaf.
    assert_eq!(loader.loaded(), ["root.js", "home.js", "docs.js"]);
}

#[test]
fn test_chain_truncation_drops_deeper_layers() {
    let fetcher = ScriptedFetcher::new();
    let loader = RecordingLoader::new();
    let h = boot(fetcher.clone(), loader.clone(), &["root.js", "a.js", "b.js"]);
    fetcher.on("/", response_body(&["root.js"], "Root", BUILD));

    let outcome =
        pollster::block_on(h.controller.navigate("/", true, &LoadIndicator::none()));

    assert!(outcome.is_completed());
    assert_eq!(h.chain_keys(), ["root.js"]);
    assert_eq!(h.store().active_components().get().len(), 1);
    assert_eq!(h.store().active_error_boundaries().get().len(), 1);
    // Nothing was replaced, so no loads beyond hydration.
    assert_eq!(loader.loaded(), ["root.js", "a.js", "b.js"]);
}

#[test]
fn test_same_href_replaces_instead_of_pushing() {
    let fetcher = ScriptedFetcher::new();
    let loader = RecordingLoader::new();
    let h = boot(fetcher.clone(), loader.clone(), &["root.js"]);
    fetcher.on("/docs", response_body(&["root.js", "docs.js"], "Docs", BUILD));

    *h.history.current.borrow_mut() = "/docs".to_string();
    pollster::block_on(h.controller.navigate("/docs", true, &LoadIndicator::none()));

    assert!(h.history.pushes.borrow().is_empty());
    assert_eq!(h.history.replaces.borrow().as_slice(), ["/docs"]);
}

#[test]
fn test_popstate_navigation_never_touches_history() {
    let fetcher = ScriptedFetcher::new();
    let loader = RecordingLoader::new();
    let h = boot(fetcher.clone(), loader.clone(), &["root.js"]);
    fetcher.on("/back", response_body(&["root.js", "back.js"], "Back", BUILD));

    let outcome =
        pollster::block_on(h.controller.navigate("/back", false, &LoadIndicator::none()));

    assert!(outcome.is_completed());
    assert!(h.history.is_untouched());
    assert_eq!(h.store().title().get(), "Back");
}

#[test]
fn test_failed_fetch_leaves_state_untouched() {
    let fetcher = ScriptedFetcher::new();
    let loader = RecordingLoader::new();
    let h = boot(fetcher.clone(), loader.clone(), &["root.js", "home.js"]);
    fetcher.fail("/broken", "status 502");
    let (indicator, begins, ends) = counting_indicator();

    let outcome = pollster::block_on(h.controller.navigate("/broken", true, &indicator));

    assert!(outcome.is_failed());
    assert!(matches!(
        outcome.error(),
        Some(NavigationError::Network { .. })
    ));
    assert_eq!(h.chain_keys(), ["root.js", "home.js"]);
    assert!(h.morph.titles.borrow().is_empty());
    assert!(h.history.is_untouched());
    // The indicator must not hang in a loading state after a failure.
    assert_eq!(begins.get(), 1);
    assert_eq!(ends.get(), 1);
}

#[test]
fn test_component_load_failure_aborts_commit() {
    let fetcher = ScriptedFetcher::new();
    let loader = RecordingLoader::new();
    let h = boot(fetcher.clone(), loader.clone(), &["root.js", "home.js"]);
    fetcher.on("/docs", response_body(&["root.js", "docs.js"], "Docs", BUILD));
    loader.fail_on("docs.js");

    let outcome =
        pollster::block_on(h.controller.navigate("/docs", true, &LoadIndicator::none()));

    assert!(matches!(
        outcome.error(),
        Some(NavigationError::ComponentLoad { .. })
    ));
    // The previously active view stays mounted.
    assert_eq!(h.chain_keys(), ["root.js", "home.js"]);
    assert_eq!(h.store().title().get(), "Boot");
    assert!(h.history.is_untouched());
}

#[test]
fn test_build_mismatch_escalates_to_hard_load() {
    let fetcher = ScriptedFetcher::new();
    let loader = RecordingLoader::new();
    let h = boot(fetcher.clone(), loader.clone(), &["root.js", "home.js"]);
    fetcher.on("/docs", response_body(&["root.js", "docs.js"], "Docs", "build-2"));

    let seen = std::rc::Rc::new(std::cell::RefCell::new(None));
    let seen_in = std::rc::Rc::clone(&seen);
    h.controller.on_build_mismatch(move |current, received| {
        *seen_in.borrow_mut() = Some((current.to_string(), received.to_string()));
    });

    let outcome =
        pollster::block_on(h.controller.navigate("/docs", true, &LoadIndicator::none()));

    assert!(outcome.is_hard_reload());
    assert_eq!(h.history.hard_loads.borrow().as_slice(), ["/docs"]);
    assert!(h.history.pushes.borrow().is_empty());
    // Nothing was committed in place.
    assert_eq!(h.chain_keys(), ["root.js", "home.js"]);
    assert!(h.morph.titles.borrow().is_empty());
    assert_eq!(
        *seen.borrow(),
        Some(("build-1".to_string(), "build-2".to_string()))
    );
}

#[test]
fn test_submit_only_updates_action_payload() {
    let fetcher = ScriptedFetcher::new();
    let loader = RecordingLoader::new();
    let h = boot(fetcher.clone(), loader.clone(), &["root.js", "form.js"]);
    fetcher.on("/form", json!({"actionData": {"saved": true}}).to_string());

    let chain_before = h.chain_keys();
    let outcome = pollster::block_on(h.controller.submit("/form", &LoadIndicator::none()));

    assert!(outcome.is_completed());
    assert_eq!(h.store().action_payload().get(), Some(json!({"saved": true})));
    assert_eq!(h.chain_keys(), chain_before);
    assert!(h.history.is_untouched());
    assert!(h.morph.titles.borrow().is_empty());
    assert!(h.morph.heads.borrow().is_empty());
}

#[test]
fn test_head_elements_are_sanitized_before_morphing() {
    let fetcher = ScriptedFetcher::new();
    let loader = RecordingLoader::new();
    let h = boot(fetcher.clone(), loader.clone(), &["root.js"]);
    fetcher.on(
        "/docs",
        json!({
            "activePaths": ["root.js", "docs.js"],
            "activeData": [null, null],
            "newTitle": "Docs",
            "buildId": BUILD,
            "head": [
                {"tag": "meta", "attributes": {"name": "description", "content": "docs"}},
                {"tag": "iframe", "attributes": {"src": "evil"}},
                {"tag": "meta", "attributes": {"name": "description", "content": "docs"}},
            ],
        })
        .to_string(),
    );

    pollster::block_on(h.controller.navigate("/docs", true, &LoadIndicator::none()));

    let heads = h.morph.heads.borrow();
    assert_eq!(heads.len(), 1);
    assert_eq!(heads[0].len(), 1, "iframe dropped, duplicate meta collapsed");
    assert_eq!(heads[0][0].tag, "meta");
}

#[test]
fn test_prefetched_response_skips_the_fetch() {
    let fetcher = ScriptedFetcher::new();
    let loader = RecordingLoader::new();
    let h = boot(fetcher.clone(), loader.clone(), &["root.js", "home.js"]);
    let prefetched = parse_response(&response_body(&["root.js", "docs.js"], "Docs", BUILD));

    let outcome = pollster::block_on(h.controller.navigate_with_prefetched(
        "/docs",
        true,
        &LoadIndicator::none(),
        prefetched,
    ));

    assert!(outcome.is_completed());
    assert_eq!(fetcher.request_count(), 0, "no network round trip");
    assert_eq!(h.store().title().get(), "Docs");
    assert_eq!(h.history.pushes.borrow().as_slice(), ["/docs"]);
}

#[test]
fn test_prefetched_stale_build_still_hard_reloads() {
    let fetcher = ScriptedFetcher::new();
    let loader = RecordingLoader::new();
    let h = boot(fetcher.clone(), loader.clone(), &["root.js"]);
    let prefetched = parse_response(&response_body(&["root.js"], "Stale", "build-9"));

    let outcome = pollster::block_on(h.controller.navigate_with_prefetched(
        "/docs",
        true,
        &LoadIndicator::none(),
        prefetched,
    ));

    assert!(outcome.is_hard_reload());
    assert_eq!(h.history.hard_loads.borrow().as_slice(), ["/docs"]);
}

#[test]
fn test_navigation_updates_params_and_splat() {
    let fetcher = ScriptedFetcher::new();
    let loader = RecordingLoader::new();
    let h = boot(fetcher.clone(), loader.clone(), &["root.js"]);
    fetcher.on(
        "/posts/42",
        json!({
            "activePaths": ["root.js", "post.js"],
            "activeData": [null, {"id": 42}],
            "params": {"id": "42"},
            "splatSegments": ["posts", "42"],
            "newTitle": "Post 42",
            "buildId": BUILD,
        })
        .to_string(),
    );

    pollster::block_on(h.controller.navigate("/posts/42", true, &LoadIndicator::none()));

    let store = h.store();
    assert_eq!(store.params().get().get("id"), Some(&"42".to_string()));
    assert_eq!(store.splat_segments().get(), ["posts", "42"]);
    assert_eq!(
        store.active_chain().get().get(1).unwrap().data,
        json!({"id": 42})
    );
}
