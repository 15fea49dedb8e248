//! Dynamic-`import()` backed [`ModuleLoader`].

use crate::error::NavigationError;
use crate::loader::{Component, LoadedModule, ModuleLoader};
use futures::future::LocalBoxFuture;
use std::collections::HashMap;
use wasm_bindgen::prelude::wasm_bindgen;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

// wasm-bindgen has no native dynamic import; go through a one-line shim.
#[wasm_bindgen(inline_js = "export function dynamicImport(specifier) { return import(specifier); }")]
extern "C" {
    #[wasm_bindgen(js_name = dynamicImport, catch)]
    fn dynamic_import(specifier: &str) -> Result<js_sys::Promise, JsValue>;
}

/// Loads component modules with the browser's dynamic `import()`.
///
/// Import keys are logical asset paths; the build system's hashed-asset map
/// (from the bootstrap payload) rewrites them to the content-hashed paths
/// actually served. A key missing from the map is imported as-is, which
/// covers dev servers that do not hash.
pub struct WebModuleLoader {
    public_map: HashMap<String, String>,
}

impl WebModuleLoader {
    /// Create a loader over the server's hashed-asset map.
    pub fn new(public_map: HashMap<String, String>) -> Self {
        Self { public_map }
    }

    fn resolve(&self, import_key: &str) -> String {
        match self.public_map.get(import_key) {
            Some(hashed) => format!("/{}", hashed.trim_start_matches('/')),
            None => import_key.to_string(),
        }
    }
}

fn load_error(import_key: &str, value: &JsValue) -> NavigationError {
    NavigationError::ComponentLoad {
        import_key: import_key.to_string(),
        message: value
            .as_string()
            .unwrap_or_else(|| format!("{value:?}")),
    }
}

impl ModuleLoader for WebModuleLoader {
    fn load(
        &self,
        import_key: String,
    ) -> LocalBoxFuture<'static, Result<LoadedModule, NavigationError>> {
        let specifier = self.resolve(&import_key);
        crate::trace_log!("importing '{}' as '{}'", import_key, specifier);
        Box::pin(async move {
            let promise =
                dynamic_import(&specifier).map_err(|e| load_error(&import_key, &e))?;
            let module = JsFuture::from(promise)
                .await
                .map_err(|e| load_error(&import_key, &e))?;

            let default_export = js_sys::Reflect::get(&module, &JsValue::from_str("default"))
                .map_err(|e| load_error(&import_key, &e))?;
            if default_export.is_undefined() {
                return Err(NavigationError::ComponentLoad {
                    import_key,
                    message: "module has no default export".to_string(),
                });
            }

            let error_boundary =
                js_sys::Reflect::get(&module, &JsValue::from_str("ErrorBoundary"))
                    .ok()
                    .filter(|v| !v.is_undefined() && !v.is_null())
                    .map(Component::new);

            Ok(LoadedModule {
                component: Component::new(default_export),
                error_boundary,
            })
        })
    }
}
