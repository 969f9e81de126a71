//! ライト/ダークテーマの管理
//!
//! 設定値は `PreferenceStore`（本番はlocalStorage、テストはメモリ）に保存し、
//! DOMへの反映は `ThemeSurface` 経由で行う。

use crate::config::THEME_STORAGE_KEY;
use crate::error::{GlueError, Result};
use crate::schedule::{Scheduler, TaskHandle};
use crate::utils::log_trace::{log_debug, log_warn};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// トグルボタンのアイコン（切り替え先を示す）
    pub fn icon_class(self) -> &'static str {
        match self {
            Theme::Dark => "fas fa-sun",
            Theme::Light => "fas fa-moon",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = GlueError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(GlueError::Storage(format!("未知のテーマ値: {}", other))),
        }
    }
}

// ============================================
// 保存先
// ============================================

pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// メモリ上の保存先（テスト・ストレージ非対応環境用）
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.entries.borrow_mut().insert(key.to_string(), value.to_string());
        store
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ============================================
// DOM反映先
// ============================================

pub trait ThemeSurface {
    /// ルート要素のテーマ属性を設定
    fn apply_theme_attribute(&self, theme: Theme);
    /// トグルボタン内アイコンのクラスを設定（アイコンがなければ何もしない）
    fn set_toggle_icon(&self, class: &str);
}

pub struct ThemeManager<S, D> {
    store: S,
    surface: D,
    key: String,
}

impl<S: PreferenceStore, D: ThemeSurface> ThemeManager<S, D> {
    pub fn new(store: S, surface: D) -> Self {
        ThemeManager {
            store,
            surface,
            key: THEME_STORAGE_KEY.to_string(),
        }
    }

    pub fn with_key(mut self, key: &str) -> Self {
        self.key = key.to_string();
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn surface(&self) -> &D {
        &self.surface
    }

    /// 保存済みテーマ（未保存・読めない・未知の値はライト）。
    /// 未知の値はページ読み込み時の `apply_persisted` で "light" に上書きされる
    pub fn get_theme(&self) -> Theme {
        match self.store.get(&self.key) {
            Ok(Some(value)) => value.parse::<Theme>().unwrap_or_else(|e| {
                log_warn("theme", &e.to_string());
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(e) => {
                log_warn("theme", &format!("テーマ読み込み失敗: {}", e));
                Theme::default()
            }
        }
    }

    /// テーマを保存してDOMに反映（保存失敗時もDOMは更新する）
    pub fn set_theme(&self, theme: Theme) {
        if let Err(e) = self.store.set(&self.key, theme.as_str()) {
            log_warn("theme", &format!("テーマ保存失敗: {}", e));
        }
        self.surface.apply_theme_attribute(theme);
        self.surface.set_toggle_icon(theme.icon_class());
    }

    /// ページ読み込み時: 保存済みテーマを適用
    pub fn apply_persisted(&self) -> Theme {
        let theme = self.get_theme();
        self.set_theme(theme);
        log_debug("theme", &format!("テーマ適用: {}", theme));
        theme
    }

    pub fn toggle(&self) -> Theme {
        let next = self.get_theme().toggled();
        self.set_theme(next);
        next
    }
}

// ============================================
// トグルボタンのアニメーション
// ============================================

pub const TOGGLE_PRESSED_TRANSFORM: &str = "scale(1.2) rotate(360deg)";
pub const TOGGLE_RESTING_TRANSFORM: &str = "scale(1) rotate(0deg)";

pub trait Transformable {
    fn set_transform(&self, value: &str);
}

/// 拡大＋回転し、`duration` 後に元に戻す（見た目のみ）
pub fn animate_toggle<T>(control: &T, scheduler: &dyn Scheduler, duration: Duration) -> TaskHandle
where
    T: Transformable + Clone + 'static,
{
    control.set_transform(TOGGLE_PRESSED_TRANSFORM);
    let control = control.clone();
    scheduler.schedule(
        duration,
        Box::new(move || control.set_transform(TOGGLE_RESTING_TRANSFORM)),
    )
}
