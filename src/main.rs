//! ページ側エントリーポイント（app.js相当）

use voltix_audit_web::page;
use voltix_audit_web::utils::log_trace;
use wasm_bindgen::prelude::*;

/// トレースログをJSON文字列で取得（サポート用）
#[wasm_bindgen]
pub fn voltix_logs() -> String {
    log_trace::get_logs_json()
}

#[wasm_bindgen]
pub fn voltix_clear_logs() {
    log_trace::clear_logs();
}

fn main() {
    console_error_panic_hook::set_once();
    page::start(page::config_from_window());
}
