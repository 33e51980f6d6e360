// ==================== Modules ====================
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsValue;

#[macro_use]
mod browser;
pub mod config;
pub mod dirs;
pub mod error;
pub mod rooms;
pub mod script;
pub mod tiles;

pub use config::EngineConfig;
pub use dirs::{Coord, Dir};
pub use error::{Cancel, Fault, RegionError, RunError};
pub use script::{Act, Action, Actions, Runner, RunnerState};
pub use tiles::{ExpandOptions, Path, Region, Weights};

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - installs the panic hook
/// - loads `engine.json`, falling back to the defaults
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();

    browser::spawn_local(async move {
        let config = match EngineConfig::fetch_default().await {
            Ok(config) => config,
            Err(err) => {
                log!("Using default engine config : {:#}", err);
                EngineConfig::default()
            }
        };
        log!("DuskWolf ready : {:?}", config);
    });

    Ok(())
}
