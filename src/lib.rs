//! Word Rain core crate.
//!
//! A falling-word typing game: a capital city or a footballer's name drops down
//! the canvas with its picture, and the player types it before it lands. Game
//! rules (`game`) are plain Rust and testable natively; `web` binds them to the
//! page and is exposed to JS as `start_game()`.

use wasm_bindgen::prelude::*;

pub mod config;
pub mod game;
pub mod surface;
pub mod web;

pub use config::{GameConfig, LevelRule};
pub use game::target::{ImageHandle, ImageStatus, Target};
pub use game::theme::{Datasets, Theme};
pub use game::{InputOutcome, LoopControl, Session, StartError, TickReport};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("logger already set: {e}").into());
    }
}

/// Changes the console log level ("off", "error" .. "trace"). Returns false for
/// an unknown name.
#[wasm_bindgen]
pub fn set_log_level(level: &str) -> bool {
    match level.parse::<log::LevelFilter>() {
        Ok(filter) => {
            log::set_max_level(filter);
            true
        }
        Err(_) => false,
    }
}
