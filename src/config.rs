//! 設定値モジュール
//!
//! DOM契約（セレクタ・クラス名）とキャッシュ契約（バケット名・事前キャッシュURL）。
//! サーバー側テンプレートと手動で同期する必要がある値はここに集約する。

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const APP_NAME: &str = "Voltix Audit";

/// テーマ設定の保存キー
pub const THEME_STORAGE_KEY: &str = "theme";

/// キャッシュバケット名の接頭辞（古いバケットの判定にも使う）
pub const CACHE_PREFIX: &str = "voltix-audit-";

/// キャッシュバケットのバージョン（ビルド時に埋め込み）
pub const CACHE_VERSION: &str = env!("VOLTIX_CACHE_VERSION");

/// インストール時に事前キャッシュするURL
pub const PRECACHE_URLS: [&str; 4] = [
    "/",
    "/static/css/style.css",
    "/static/js/app.js",
    "/static/images/logo_512.png",
];

/// 現在のキャッシュバケット名（例: voltix-audit-v1）
pub fn cache_name() -> String {
    format!("{}{}", CACHE_PREFIX, CACHE_VERSION)
}

// ============================================
// ページ側設定
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub alert_selector: String,
    pub alert_dismiss_delay_ms: u32,
    pub theme_storage_key: String,
    pub theme_attribute: String,
    pub theme_toggle_selector: String,
    pub theme_icon_selector: String,
    pub toggle_animation_ms: u32,
    pub card_selector: String,
    pub reveal_class: String,
    pub reveal_threshold: f64,
}

impl Default for PageConfig {
    fn default() -> Self {
        PageConfig {
            alert_selector: ".alert".to_string(),
            alert_dismiss_delay_ms: 5000,
            theme_storage_key: THEME_STORAGE_KEY.to_string(),
            theme_attribute: "data-theme".to_string(),
            theme_toggle_selector: ".theme-toggle".to_string(),
            theme_icon_selector: ".theme-toggle i".to_string(),
            toggle_animation_ms: 300,
            card_selector: ".card".to_string(),
            reveal_class: "fade-in".to_string(),
            reveal_threshold: 0.1,
        }
    }
}

impl PageConfig {
    pub fn alert_dismiss_delay(&self) -> Duration {
        Duration::from_millis(self.alert_dismiss_delay_ms as u64)
    }

    pub fn toggle_animation(&self) -> Duration {
        Duration::from_millis(self.toggle_animation_ms as u64)
    }
}

// ============================================
// Service Worker側設定
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub cache_name: String,
    pub cache_prefix: String,
    pub precache_urls: Vec<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            cache_name: cache_name(),
            cache_prefix: CACHE_PREFIX.to_string(),
            precache_urls: PRECACHE_URLS.iter().map(|u| u.to_string()).collect(),
        }
    }
}

impl WorkerConfig {
    /// 自アプリの旧バージョンのバケットか
    pub fn is_stale_bucket(&self, name: &str) -> bool {
        name.starts_with(&self.cache_prefix) && name != self.cache_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_match_markup_contract() {
        let config = PageConfig::default();
        assert_eq!(config.alert_dismiss_delay(), Duration::from_millis(5000));
        assert_eq!(config.toggle_animation(), Duration::from_millis(300));
        assert_eq!(config.theme_storage_key, "theme");
        assert_eq!(config.reveal_class, "fade-in");
        assert!((config.reveal_threshold - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_page_config_keeps_defaults() {
        let config: PageConfig =
            serde_json::from_str(r#"{"alert_dismiss_delay_ms": 8000, "card_selector": ".panel"}"#)
                .unwrap();
        assert_eq!(config.alert_dismiss_delay_ms, 8000);
        assert_eq!(config.card_selector, ".panel");
        assert_eq!(config.alert_selector, ".alert");
        assert_eq!(config.theme_icon_selector, ".theme-toggle i");
    }

    #[test]
    fn worker_defaults_precache_four_assets() {
        let config = WorkerConfig::default();
        assert_eq!(config.cache_name, format!("voltix-audit-{}", CACHE_VERSION));
        assert_eq!(config.precache_urls.len(), 4);
        assert_eq!(config.precache_urls[0], "/");
        assert!(config.precache_urls.contains(&"/static/js/app.js".to_string()));
    }

    #[test]
    fn stale_bucket_detection_ignores_foreign_caches() {
        let config = WorkerConfig {
            cache_name: "voltix-audit-v2".to_string(),
            ..WorkerConfig::default()
        };
        assert!(config.is_stale_bucket("voltix-audit-v1"));
        assert!(!config.is_stale_bucket("voltix-audit-v2"));
        assert!(!config.is_stale_bucket("other-app-v1"));
    }
}
