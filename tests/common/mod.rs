//! Shared fixtures for the integration suites.
//!
//! Provides scripted/gated mocks for every boundary trait plus a harness
//! that boots a controller over them, mirroring what `init_client` does in
//! the browser.

#![allow(dead_code)]

use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use serde_json::{json, Value};
use spa_navigator::*;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

pub const BUILD: &str = "build-1";

/// JSON body of a navigation response for `paths` with null loader data.
pub fn response_body(paths: &[&str], title: &str, build_id: &str) -> String {
    json!({
        "activePaths": paths,
        "activeData": paths.iter().map(|_| Value::Null).collect::<Vec<Value>>(),
        "newTitle": title,
        "buildId": build_id,
    })
    .to_string()
}

/// Parse a response body into the structured payload.
pub fn parse_response(body: &str) -> NavigationResponse {
    serde_json::from_str(body).expect("fixture body parses")
}

// ============================================================================
// Fetchers
// ============================================================================

/// Answers from a pre-scripted href -> body table; unknown hrefs fail with a
/// network error.
#[derive(Default)]
pub struct ScriptedFetcher {
    bodies: RefCell<HashMap<String, Result<String, String>>>,
    pub requests: RefCell<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Script a successful body for `href`.
    pub fn on(&self, href: &str, body: String) {
        self.bodies
            .borrow_mut()
            .insert(with_json_marker(href), Ok(body));
    }

    /// Script a transport failure for `href`.
    pub fn fail(&self, href: &str, message: &str) {
        self.bodies
            .borrow_mut()
            .insert(with_json_marker(href), Err(message.to_string()));
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl Fetcher for ScriptedFetcher {
    fn fetch(
        &self,
        url: String,
        _method: Method,
        _token: CancellationToken,
    ) -> LocalBoxFuture<'static, Result<String, NavigationError>> {
        self.requests.borrow_mut().push(url.clone());
        let scripted = self.bodies.borrow().get(&url).cloned();
        Box::pin(async move {
            match scripted {
                Some(Ok(body)) => Ok(body),
                Some(Err(message)) => Err(NavigationError::Network { message }),
                None => Err(NavigationError::Network {
                    message: format!("no scripted response for {url}"),
                }),
            }
        })
    }
}

/// Holds each request open until the test resolves its gate, so tests can
/// interleave navigation cycles deterministically.
#[derive(Default)]
pub struct GatedFetcher {
    gates: RefCell<HashMap<String, oneshot::Receiver<String>>>,
    pub requests: RefCell<Vec<String>>,
}

impl GatedFetcher {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Gate the next request for `href`; the returned sender releases it.
    pub fn gate(&self, href: &str) -> oneshot::Sender<String> {
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().insert(with_json_marker(href), rx);
        tx
    }
}

impl Fetcher for GatedFetcher {
    fn fetch(
        &self,
        url: String,
        _method: Method,
        token: CancellationToken,
    ) -> LocalBoxFuture<'static, Result<String, NavigationError>> {
        self.requests.borrow_mut().push(url.clone());
        let gate = self.gates.borrow_mut().remove(&url);
        Box::pin(async move {
            let Some(gate) = gate else {
                return Err(NavigationError::Network {
                    message: format!("no gate for {url}"),
                });
            };
            match gate.await {
                Ok(body) if !token.is_cancelled() => Ok(body),
                // Dropped sender or a cancelled token both read as an abort,
                // matching what AbortController does to a real request.
                _ => Err(NavigationError::Aborted),
            }
        })
    }
}

// ============================================================================
// Loaders
// ============================================================================

/// Resolves every import key immediately; the component payload is the key
/// itself so tests can assert identity and content.
#[derive(Default)]
pub struct RecordingLoader {
    pub loads: RefCell<Vec<String>>,
    fail_on: RefCell<Option<String>>,
}

impl RecordingLoader {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Make loads of `import_key` fail.
    pub fn fail_on(&self, import_key: &str) {
        *self.fail_on.borrow_mut() = Some(import_key.to_string());
    }

    pub fn loaded(&self) -> Vec<String> {
        self.loads.borrow().clone()
    }
}

impl ModuleLoader for RecordingLoader {
    fn load(
        &self,
        import_key: String,
    ) -> LocalBoxFuture<'static, Result<LoadedModule, NavigationError>> {
        self.loads.borrow_mut().push(import_key.clone());
        let fail = self.fail_on.borrow().as_deref() == Some(import_key.as_str());
        Box::pin(async move {
            if fail {
                Err(NavigationError::ComponentLoad {
                    import_key,
                    message: "not found".to_string(),
                })
            } else {
                Ok(LoadedModule {
                    component: Component::new(import_key),
                    error_boundary: None,
                })
            }
        })
    }
}

/// Like [`RecordingLoader`] but holds gated keys open until released.
#[derive(Default)]
pub struct GatedLoader {
    gates: RefCell<HashMap<String, oneshot::Receiver<()>>>,
    pub loads: RefCell<Vec<String>>,
}

impl GatedLoader {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Gate the next load of `import_key`.
    pub fn gate(&self, import_key: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().insert(import_key.to_string(), rx);
        tx
    }
}

impl ModuleLoader for GatedLoader {
    fn load(
        &self,
        import_key: String,
    ) -> LocalBoxFuture<'static, Result<LoadedModule, NavigationError>> {
        self.loads.borrow_mut().push(import_key.clone());
        let gate = self.gates.borrow_mut().remove(&import_key);
        Box::pin(async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            Ok(LoadedModule {
                component: Component::new(import_key),
                error_boundary: None,
            })
        })
    }
}

// ============================================================================
// History & head
// ============================================================================

pub struct RecordingHistory {
    pub current: RefCell<String>,
    pub pushes: RefCell<Vec<String>>,
    pub replaces: RefCell<Vec<String>>,
    pub hard_loads: RefCell<Vec<String>>,
}

impl RecordingHistory {
    pub fn new(current: &str) -> Rc<Self> {
        Rc::new(Self {
            current: RefCell::new(current.to_string()),
            pushes: RefCell::new(Vec::new()),
            replaces: RefCell::new(Vec::new()),
            hard_loads: RefCell::new(Vec::new()),
        })
    }

    pub fn is_untouched(&self) -> bool {
        self.pushes.borrow().is_empty()
            && self.replaces.borrow().is_empty()
            && self.hard_loads.borrow().is_empty()
    }
}

impl HistoryApi for RecordingHistory {
    fn current_href(&self) -> String {
        self.current.borrow().clone()
    }
    fn push(&self, href: &str) {
        self.pushes.borrow_mut().push(href.to_string());
        *self.current.borrow_mut() = href.to_string();
    }
    fn replace(&self, href: &str) {
        self.replaces.borrow_mut().push(href.to_string());
        *self.current.borrow_mut() = href.to_string();
    }
    fn hard_load(&self, href: &str) {
        self.hard_loads.borrow_mut().push(href.to_string());
    }
}

#[derive(Default)]
pub struct RecordingMorph {
    pub titles: RefCell<Vec<String>>,
    pub heads: RefCell<Vec<Vec<HeadElement>>>,
}

impl RecordingMorph {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }
}

impl HeadMorph for RecordingMorph {
    fn set_title(&self, title: &str) {
        self.titles.borrow_mut().push(title.to_string());
    }
    fn morph_head(&self, desired: &[HeadElement]) {
        self.heads.borrow_mut().push(desired.to_vec());
    }
}

// ============================================================================
// Harness
// ============================================================================

/// A booted controller with recording boundaries, bootstrap already
/// hydrated.
pub struct Harness {
    pub controller: Rc<NavigationController>,
    pub history: Rc<RecordingHistory>,
    pub morph: Rc<RecordingMorph>,
}

impl Harness {
    pub fn store(&self) -> Rc<NavigationStore> {
        Rc::clone(self.controller.store())
    }

    pub fn chain_keys(&self) -> Vec<String> {
        self.store()
            .active_chain()
            .get()
            .import_keys()
            .map(str::to_string)
            .collect()
    }
}

/// Boot a controller over the given transport and loader, with a bootstrap
/// chain of `bootstrap_paths`, and run initial hydration.
pub fn boot(
    fetcher: Rc<dyn Fetcher>,
    loader: Rc<dyn ModuleLoader>,
    bootstrap_paths: &[&str],
) -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();
    let bootstrap = parse_response(&response_body(bootstrap_paths, "Boot", BUILD));
    let store = NavigationStore::from_bootstrap(&bootstrap).expect("bootstrap parses");
    let history = RecordingHistory::new("https://app.test/");
    let morph = RecordingMorph::new();
    let controller = NavigationController::new(
        store,
        fetcher,
        loader,
        Rc::clone(&history) as Rc<dyn HistoryApi>,
        Rc::clone(&morph) as Rc<dyn HeadMorph>,
    );
    pollster::block_on(controller.hydrate()).expect("hydration succeeds");
    Harness {
        controller,
        history,
        morph,
    }
}

/// Timers are held until the test fires them by hand.
#[cfg(feature = "cache")]
#[derive(Default)]
pub struct ManualScheduler {
    next_id: Cell<u64>,
    pending: RefCell<HashMap<u64, Box<dyn FnOnce()>>>,
}

#[cfg(feature = "cache")]
impl ManualScheduler {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn fire_all(&self) {
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        for (_, callback) in pending {
            callback();
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }
}

#[cfg(feature = "cache")]
impl Scheduler for ManualScheduler {
    fn set_timeout(&self, _delay_ms: u32, callback: Box<dyn FnOnce()>) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.pending.borrow_mut().insert(id, callback);
        id
    }
    fn clear_timeout(&self, id: u64) {
        self.pending.borrow_mut().remove(&id);
    }
}

/// [`Spawner`] over a `futures` local pool, so spawned navigations are
/// driven by the test's own `run_until_stalled` calls.
pub struct PoolSpawner(pub futures::executor::LocalSpawner);

impl Spawner for PoolSpawner {
    fn spawn(&self, future: LocalBoxFuture<'static, ()>) {
        futures::task::LocalSpawnExt::spawn_local(&self.0, future).expect("pool alive");
    }
}

/// A [`LoadIndicator`] whose begin/end counts the test can read back.
pub fn counting_indicator() -> (LoadIndicator, Rc<Cell<usize>>, Rc<Cell<usize>>) {
    let begins = Rc::new(Cell::new(0));
    let ends = Rc::new(Cell::new(0));
    let begins_in = Rc::clone(&begins);
    let ends_in = Rc::clone(&ends);
    let indicator = LoadIndicator::new(
        move || begins_in.set(begins_in.get() + 1),
        move || ends_in.set(ends_in.get() + 1),
    );
    (indicator, begins, ends)
}
