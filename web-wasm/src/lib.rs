//! Virtual Try-On Web App (Leptos + WASM)

mod app;
pub mod api;
mod components;

use wasm_bindgen::prelude::*;

/// パニックフックと console へのログ出力を設定する
pub fn init_logging() {
    console_error_panic_hook::set_once();
    // 二重初期化は無視
    let _ = console_log::init_with_level(log::Level::Info);
}

#[wasm_bindgen(start)]
pub fn main() {
    init_logging();
    leptos::mount::mount_to_body(app::App);
}
