use anyhow::{anyhow, Result};
use futures::channel::oneshot::channel;
use serde::de::DeserializeOwned;
use std::future::Future;
use wasm_bindgen::closure::{Closure, WasmClosureFnOnce};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Response, Window};

// ELI5: format!() first, then hand the finished line to whoever is listening
// - in the browser that is the devtools console
// - natively (tests, tools) it goes through tracing
macro_rules! log {
    ($($t:tt)*) => {
        $crate::browser::log_line(&format!($($t)*))
    }
}

pub fn log_line(line: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::log_1(&JsValue::from_str(line));
    #[cfg(not(target_arch = "wasm32"))]
    tracing::info!("{}", line);
}

pub fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| anyhow!("Window not found"))
}

pub fn closure_once<F, A, R>(f: F) -> Closure<F::FnMut>
where
    F: 'static + WasmClosureFnOnce<A, R>,
{
    Closure::once(f)
}

pub fn spawn_local<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

/// Resolves after `ms` milliseconds, using the window's `setTimeout`
pub async fn sleep(ms: i32) -> Result<()> {
    let (tx, rx) = channel::<()>();
    let callback = closure_once(move || {
        let _ = tx.send(());
    });

    window()?
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            ms,
        )
        .map_err(|err| anyhow!("Could not set timeout : {:#?}", err))?;

    // keep callback alive until the timer fires
    callback.forget();

    rx.await
        .map_err(|_| anyhow!("Timer dropped before firing"))
}

pub async fn fetch_json<T>(json_path: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let resp_value = fetch_with_str(json_path).await?;
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|element| anyhow!("error converting [{:#?}] to Response", element))?;
    let json = resp
        .json()
        .map_err(|err| anyhow!("Could not get JSON from response [{:#?}]", err))?;

    let json_value = JsFuture::from(json)
        .await
        .map_err(|err| anyhow!("error fetching [{:#?}]", err))?;

    serde_wasm_bindgen::from_value(json_value)
        .map_err(|err| anyhow!("error converting response : {:#?}", err))
}

async fn fetch_with_str(resource: &str) -> Result<JsValue> {
    let resp = window()?.fetch_with_str(resource);

    JsFuture::from(resp)
        .await
        .map_err(|err| anyhow!("error fetching : {:#?}", err))
}
