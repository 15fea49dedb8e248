//! `fetch()`-backed [`Fetcher`] with `AbortController` cancellation.

use crate::error::NavigationError;
use crate::fetch::{CancellationToken, Fetcher, Method};
use futures::future::LocalBoxFuture;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, RequestInit, Response};

/// Issues navigation requests through the browser's `fetch()`.
///
/// Each request gets its own `AbortController`, hooked to the cycle's
/// [`CancellationToken`] so supersession tears down the in-flight request at
/// the network layer, not just in the engine.
pub struct WebFetcher;

fn js_message(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn network(value: JsValue) -> NavigationError {
    NavigationError::Network {
        message: js_message(&value),
    }
}

/// A rejected fetch on a cancelled token is an abort, whatever the browser
/// called it.
fn transport_error(token: &CancellationToken, value: JsValue) -> NavigationError {
    if token.is_cancelled() {
        NavigationError::Aborted
    } else {
        network(value)
    }
}

impl Fetcher for WebFetcher {
    fn fetch(
        &self,
        url: String,
        method: Method,
        token: CancellationToken,
    ) -> LocalBoxFuture<'static, Result<String, NavigationError>> {
        Box::pin(async move {
            let window = web_sys::window().ok_or_else(|| NavigationError::Network {
                message: "no window".to_string(),
            })?;
            let aborter = AbortController::new().map_err(network)?;
            {
                let aborter = aborter.clone();
                token.on_cancel(move || aborter.abort());
            }
            if token.is_cancelled() {
                return Err(NavigationError::Aborted);
            }

            let init = RequestInit::new();
            init.set_method(method.as_str());
            init.set_signal(Some(&aborter.signal()));

            let response = JsFuture::from(window.fetch_with_str_and_init(&url, &init))
                .await
                .map_err(|e| transport_error(&token, e))?;
            let response: Response =
                response
                    .dyn_into()
                    .map_err(|_| NavigationError::Network {
                        message: "fetch did not yield a Response".to_string(),
                    })?;
            if !response.ok() {
                return Err(NavigationError::Network {
                    message: format!("unexpected status {}", response.status()),
                });
            }

            let body = JsFuture::from(response.text().map_err(network)?)
                .await
                .map_err(|e| transport_error(&token, e))?;
            body.as_string().ok_or_else(|| NavigationError::Network {
                message: "response body is not text".to_string(),
            })
        })
    }
}
