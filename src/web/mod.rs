//! Browser implementations of the engine's boundary traits, plus the
//! client entry point. Compiles on `wasm32-unknown-unknown` only.
//!
//! [`init_client`] is the engine's first act in the tab: it reads the
//! server-embedded bootstrap global, wraps every field into reactive cells,
//! hydrates the bootstrap chain's component modules, and wires the
//! document-wide click listener and the window `popstate` listener. The
//! returned [`ClientHandle`] owns the event closures; dropping it detaches
//! the engine from the page.

mod dom;
mod fetch;
mod history;
mod loader;
mod schedule;

pub use dom::DomHeadMorpher;
pub use fetch::WebFetcher;
pub use history::WebHistory;
pub use loader::WebModuleLoader;
pub use schedule::WasmSpawner;
#[cfg(feature = "cache")]
pub use schedule::WebScheduler;

use crate::controller::{LoadIndicator, NavigationController};
use crate::error::NavigationError;
use crate::head::HeadMorph;
use crate::history::HistoryApi;
use crate::link::popstate_intent;
use crate::loader::ModuleLoader;
#[cfg(feature = "cache")]
use crate::link::PrefetchHandlers;
#[cfg(feature = "cache")]
use crate::prefetch::{Prefetcher, DEFAULT_PREFETCH_MAX_AGE_MS, DEFAULT_PREFETCH_TIMEOUT_MS};
use crate::response::NavigationResponse;
use crate::store::NavigationStore;
use serde::Deserialize;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlAnchorElement, MouseEvent, PopStateEvent};

/// Name of the global the server embeds the bootstrap payload under.
pub const BOOTSTRAP_GLOBAL: &str = "__NAV_BOOTSTRAP__";

/// Server-embedded bootstrap object: the initial navigation state plus the
/// build system's hashed-asset map.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BootstrapPayload {
    /// Initial values for every navigation-state field, same shape as a
    /// `GET` navigation response.
    #[serde(flatten)]
    pub state: NavigationResponse,

    /// Logical asset path → content-hashed served path.
    pub public_map: HashMap<String, String>,
}

/// Options for [`init_client`].
pub struct ClientOptions {
    /// Name of the bootstrap global. Defaults to [`BOOTSTRAP_GLOBAL`].
    pub bootstrap_global: String,
    /// Load indicator for intercepted link clicks.
    pub indicator: LoadIndicator,
    /// Load indicator for back/forward re-navigations (typically a
    /// progress-bar start/done pair).
    pub popstate_indicator: LoadIndicator,
    /// Arm-to-fire window for intent-based prefetching, in milliseconds.
    #[cfg(feature = "cache")]
    pub prefetch_timeout_ms: u32,
    /// How long a completed prefetch result stays consumable, in
    /// milliseconds.
    #[cfg(feature = "cache")]
    pub prefetch_max_age_ms: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            bootstrap_global: BOOTSTRAP_GLOBAL.to_string(),
            indicator: LoadIndicator::none(),
            popstate_indicator: LoadIndicator::none(),
            #[cfg(feature = "cache")]
            prefetch_timeout_ms: DEFAULT_PREFETCH_TIMEOUT_MS,
            #[cfg(feature = "cache")]
            prefetch_max_age_ms: DEFAULT_PREFETCH_MAX_AGE_MS,
        }
    }
}

/// The booted engine: store, controller, prefetcher, and the live event
/// listeners.
pub struct ClientHandle {
    controller: Rc<NavigationController>,
    #[cfg(feature = "cache")]
    prefetcher: Rc<Prefetcher>,
    #[cfg(feature = "cache")]
    indicator: LoadIndicator,
    _click: Closure<dyn FnMut(MouseEvent)>,
    _popstate: Closure<dyn FnMut(PopStateEvent)>,
}

impl ClientHandle {
    /// The shared reactive store, for mounting the view tree.
    pub fn store(&self) -> Rc<NavigationStore> {
        Rc::clone(self.controller.store())
    }

    /// The navigation controller, for imperative `navigate`/`submit`.
    pub fn controller(&self) -> Rc<NavigationController> {
        Rc::clone(&self.controller)
    }

    /// Build the intent-prefetch handler bundle for one link.
    #[cfg(feature = "cache")]
    pub fn prefetch_handlers(&self, href: impl Into<String>) -> PrefetchHandlers {
        PrefetchHandlers::new(
            Rc::clone(&self.controller),
            Rc::clone(&self.prefetcher),
            Rc::new(WasmSpawner),
            href,
            self.indicator.clone(),
        )
    }
}

/// Boot the engine in the current tab.
///
/// Reads the bootstrap global, builds the store and controller over the
/// `web-sys` boundary implementations, hydrates the bootstrap chain, and
/// installs the click and popstate listeners.
pub async fn init_client(options: ClientOptions) -> Result<ClientHandle, NavigationError> {
    let bootstrap = read_bootstrap(&options.bootstrap_global)?;
    let store = NavigationStore::from_bootstrap(&bootstrap.state)?;
    let loader: Rc<dyn ModuleLoader> = Rc::new(WebModuleLoader::new(bootstrap.public_map));
    let history: Rc<dyn HistoryApi> = Rc::new(WebHistory);
    let morph: Rc<dyn HeadMorph> = Rc::new(DomHeadMorpher::new());
    let controller =
        NavigationController::new(store, Rc::new(WebFetcher), loader, history, morph);

    controller.hydrate().await?;

    #[cfg(feature = "cache")]
    let prefetcher = Prefetcher::with_config(
        controller.orchestrator().clone(),
        Rc::new(WebScheduler::new()),
        Rc::new(WasmSpawner),
        options.prefetch_timeout_ms,
        options.prefetch_max_age_ms,
    );

    let click = install_click_listener(&controller, &options.indicator)?;
    let popstate = install_popstate_listener(&controller, &options.popstate_indicator)?;

    Ok(ClientHandle {
        controller,
        #[cfg(feature = "cache")]
        prefetcher,
        #[cfg(feature = "cache")]
        indicator: options.indicator,
        _click: click,
        _popstate: popstate,
    })
}

fn read_bootstrap(global_name: &str) -> Result<BootstrapPayload, NavigationError> {
    let value = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str(global_name))
        .map_err(|_| NavigationError::Deserialize {
            message: format!("bootstrap global '{global_name}' is unreadable"),
        })?;
    if value.is_undefined() || value.is_null() {
        return Err(NavigationError::Deserialize {
            message: format!("bootstrap global '{global_name}' is missing"),
        });
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| NavigationError::Deserialize {
        message: e.to_string(),
    })
}

/// Build an [`crate::AnchorActivation`] from a document-level click, if the
/// click landed on (or inside) an anchor.
fn activation_from_event(event: &MouseEvent) -> Option<crate::AnchorActivation> {
    let target = event.target()?;
    let element = target.dyn_ref::<web_sys::Element>()?;
    let anchor = element.closest("a").ok().flatten()?;
    let anchor: &HtmlAnchorElement = anchor.dyn_ref()?;
    let origin = web_sys::window()?.location().origin().ok()?;
    Some(crate::AnchorActivation {
        href: anchor.href(),
        same_origin: anchor.origin() == origin,
        target: Some(anchor.target()).filter(|t| !t.is_empty()),
        download: !anchor.download().is_empty(),
        modifier_held: event.ctrl_key() || event.meta_key() || event.shift_key() || event.alt_key(),
        primary_button: event.button() == 0,
    })
}

fn install_click_listener(
    controller: &Rc<NavigationController>,
    indicator: &LoadIndicator,
) -> Result<Closure<dyn FnMut(MouseEvent)>, NavigationError> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| NavigationError::Network {
            message: "no document".to_string(),
        })?;
    let closure = Closure::<dyn FnMut(MouseEvent)>::new({
        let controller = Rc::clone(controller);
        let indicator = indicator.clone();
        move |event: MouseEvent| {
            let Some(activation) = activation_from_event(&event) else {
                return;
            };
            let Some(intent) = activation.intent() else {
                return;
            };
            event.prevent_default();
            let controller = Rc::clone(&controller);
            let indicator = indicator.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let outcome = controller
                    .navigate(&intent.href, intent.update_history, &indicator)
                    .await;
                crate::trace_log!("click navigation resolved: {:?}", outcome);
            });
        }
    });
    document
        .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
        .map_err(|_| NavigationError::Network {
            message: "failed to install click listener".to_string(),
        })?;
    Ok(closure)
}

fn install_popstate_listener(
    controller: &Rc<NavigationController>,
    indicator: &LoadIndicator,
) -> Result<Closure<dyn FnMut(PopStateEvent)>, NavigationError> {
    let window = web_sys::window().ok_or_else(|| NavigationError::Network {
        message: "no window".to_string(),
    })?;
    let closure = Closure::<dyn FnMut(PopStateEvent)>::new({
        let controller = Rc::clone(controller);
        let indicator = indicator.clone();
        move |_event: PopStateEvent| {
            let Some(href) = web_sys::window().and_then(|w| w.location().href().ok()) else {
                return;
            };
            // The browser already moved the location; never touch history.
            let intent = popstate_intent(href);
            let controller = Rc::clone(&controller);
            let indicator = indicator.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let outcome = controller
                    .navigate(&intent.href, intent.update_history, &indicator)
                    .await;
                crate::trace_log!("popstate navigation resolved: {:?}", outcome);
            });
        }
    });
    window
        .add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref())
        .map_err(|_| NavigationError::Network {
            message: "failed to install popstate listener".to_string(),
        })?;
    Ok(closure)
}
