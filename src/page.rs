//! ページ側コントローラ
//!
//! DOMContentLoaded時にアラート自動消去・テーマ適用・スクロール表示を設定する。

use crate::alerts::schedule_auto_dismiss;
use crate::config::{PageConfig, APP_NAME};
use crate::dom::{self, BootstrapAlert, DomThemeSurface};
use crate::reveal::{Intersection, RevealTracker};
use crate::schedule::TimerScheduler;
use crate::theme::{animate_toggle, ThemeManager};
use crate::utils::log_trace::{enable_persistence, log_debug, log_info, log_info_with_data, log_warn};
use crate::utils::storage::LocalStore;
use gloo::events::EventListener;
use leptos::{create_effect, create_signal, SignalGet, SignalSet};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

/// ページ側で設定を上書きするグローバル変数名
const CONFIG_GLOBAL: &str = "voltixPageConfig";

/// `window.voltixPageConfig` があれば読み込む（不正なら既定値）
pub fn config_from_window() -> PageConfig {
    let Some(window) = web_sys::window() else {
        return PageConfig::default();
    };
    let value = js_sys::Reflect::get(&window, &JsValue::from_str(CONFIG_GLOBAL)).unwrap_or(JsValue::UNDEFINED);
    if value.is_undefined() || value.is_null() {
        return PageConfig::default();
    }
    match serde_wasm_bindgen::from_value::<PageConfig>(value) {
        Ok(config) => config,
        Err(e) => {
            log_warn("page", &format!("{}の解析エラー: {}", CONFIG_GLOBAL, e));
            PageConfig::default()
        }
    }
}

/// コントローラ起動（DOM構築済みなら即時実行）
pub fn start(config: PageConfig) {
    enable_persistence();
    log_info("page", &format!("⚡ {} chargé !", APP_NAME));

    let Some(document) = dom::document() else {
        log_warn("page", "documentがありません");
        return;
    };

    if is_loading(&document.ready_state()) {
        let ready_document = document.clone();
        EventListener::once(&document, "DOMContentLoaded", move |_| {
            on_dom_ready(&ready_document, &config);
        })
        .forget();
    } else {
        on_dom_ready(&document, &config);
    }
}

/// `document.readyState` が解析中（DOMContentLoaded前）か
fn is_loading(ready_state: &str) -> bool {
    ready_state == "loading"
}

fn on_dom_ready(document: &Document, config: &PageConfig) {
    init_alerts(document, config);
    init_theme(document, config);
    init_reveal(document, config);
}

// ============================================
// アラート
// ============================================

fn init_alerts(document: &Document, config: &PageConfig) {
    let alerts: Vec<BootstrapAlert> = dom::query_all(document, &config.alert_selector)
        .into_iter()
        .map(BootstrapAlert::new)
        .collect();
    if alerts.is_empty() {
        return;
    }
    let count = alerts.len();
    schedule_auto_dismiss(alerts, &TimerScheduler, config.alert_dismiss_delay());
    log_debug("alerts", &format!("{}件のアラートを{}ms後に閉じます", count, config.alert_dismiss_delay_ms));
}

// ============================================
// テーマ
// ============================================

fn init_theme(document: &Document, config: &PageConfig) {
    let manager = Rc::new(
        ThemeManager::new(LocalStore::new(), DomThemeSurface::new(config)).with_key(&config.theme_storage_key),
    );

    // テーマの変更をDOMとlocalStorageに反映
    let (theme, set_theme) = create_signal(manager.get_theme());
    let effect_manager = manager.clone();
    create_effect(move |_| {
        effect_manager.set_theme(theme.get());
    });

    let Some(toggle) = dom::query_one(document, &config.theme_toggle_selector)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    else {
        log_debug("theme", "テーマ切替ボタンがありません");
        return;
    };

    let animation = config.toggle_animation();
    let control = toggle.clone();
    EventListener::new(&toggle, "click", move |_| {
        // 保存値を基準に切り替える
        let next = manager.get_theme().toggled();
        set_theme.set(next);
        animate_toggle(&control, &TimerScheduler, animation);
        log_info_with_data("theme", "テーマ切替", serde_json::json!({ "theme": next }));
    })
    .forget();
}

// ============================================
// スクロール表示
// ============================================

fn init_reveal(document: &Document, config: &PageConfig) {
    let cards = dom::query_all(document, &config.card_selector);
    if cards.is_empty() {
        return;
    }

    let tracker = Rc::new(RevealTracker::new(&config.reveal_class, config.reveal_threshold));
    let threshold = tracker.threshold();
    let callback_tracker = tracker.clone();
    let callback = Closure::wrap(Box::new(move |entries: js_sys::Array, _observer: IntersectionObserver| {
        let entries = entries
            .iter()
            .filter_map(|value| value.dyn_into::<IntersectionObserverEntry>().ok())
            .map(|entry| Intersection {
                target: entry.target(),
                is_intersecting: entry.is_intersecting(),
            });
        callback_tracker.handle(entries);
    }) as Box<dyn FnMut(js_sys::Array, IntersectionObserver)>);

    let options = IntersectionObserverInit::new();
    options.set_threshold(&JsValue::from_f64(threshold));
    let observer = match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options) {
        Ok(observer) => observer,
        Err(e) => {
            log_warn("reveal", &format!("IntersectionObserver作成失敗: {:?}", e));
            return;
        }
    };
    // 監視は解除しない
    callback.forget();

    for card in &cards {
        observer.observe(card);
    }
    log_debug("reveal", &format!("{}枚のカードを監視", cards.len()));
}
