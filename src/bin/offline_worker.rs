//! Service Worker エントリーポイント（sw.js相当）
//!
//! ブラウザはスクリプトの初回評価中に登録された install / activate / fetch
//! ハンドラしか採用しない。ローダー（sw.js）はトップレベルで `initSync` を呼び、
//! wasmのインスタンス化と `main` の実行を初回評価中に済ませること。
//! 非同期の `init()` を待ってから登録すると fetch は一切横取りされない。
//!
//! ```js
//! importScripts('/static/wasm/offline_worker.js');
//! wasm_bindgen.initSync({ module: /* 同期取得した WebAssembly.Module */ });
//! ```

use voltix_audit_web::config::WorkerConfig;
use voltix_audit_web::utils::log_trace::log_error;
use voltix_audit_web::worker::browser;

fn main() {
    console_error_panic_hook::set_once();
    if let Err(e) = browser::start(WorkerConfig::default()) {
        log_error("worker", &format!("起動失敗: {}", e));
    }
}
