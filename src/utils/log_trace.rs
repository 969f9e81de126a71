//! 時系列トレースログ
//! ページ・Service Workerの動作を記録し、コンソールにも出力する。
//! ページ側ではlocalStorageに保存し、Worker側（windowなし）ではメモリのみ。

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const MAX_LOG_ENTRIES: usize = 500;
const STORAGE_KEY: &str = "voltix_audit_log_trace";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub category: String, // "page", "theme", "alerts", "reveal", "worker"
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

pub struct LogTrace {
    logs: VecDeque<LogEntry>,
    persist: bool,
}

impl LogTrace {
    /// メモリのみのトレース
    pub fn in_memory() -> Self {
        LogTrace {
            logs: VecDeque::with_capacity(MAX_LOG_ENTRIES),
            persist: false,
        }
    }

    /// localStorageがあれば復元・保存するトレース
    pub fn persistent() -> Self {
        let mut trace = LogTrace {
            logs: VecDeque::with_capacity(MAX_LOG_ENTRIES),
            persist: true,
        };
        trace.load_from_storage();
        trace
    }

    pub fn log(&mut self, level: LogLevel, category: &str, message: &str, data: Option<serde_json::Value>) {
        echo_to_console(level, category, message);

        if self.logs.len() >= MAX_LOG_ENTRIES {
            self.logs.pop_front();
        }
        self.logs.push_back(LogEntry {
            timestamp: now_iso(),
            level,
            category: category.to_string(),
            message: message.to_string(),
            data,
        });

        if self.persist && level != LogLevel::Debug {
            self.save_to_storage();
        }
    }

    /// 既存エントリを時刻・内容そのままで追加（コンソールには再出力しない）
    fn absorb(&mut self, entries: Vec<LogEntry>) {
        for entry in entries {
            if self.logs.len() >= MAX_LOG_ENTRIES {
                self.logs.pop_front();
            }
            self.logs.push_back(entry);
        }
        if self.persist {
            self.save_to_storage();
        }
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    pub fn get_logs(&self) -> Vec<LogEntry> {
        self.logs.iter().cloned().collect()
    }

    pub fn get_logs_json(&self) -> String {
        let logs: Vec<&LogEntry> = self.logs.iter().collect();
        serde_json::to_string_pretty(&logs).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn clear(&mut self) {
        self.logs.clear();
        if self.persist {
            self.save_to_storage();
        }
    }

    fn load_from_storage(&mut self) {
        if let Some(storage) = local_storage() {
            if let Ok(Some(json_str)) = storage.get_item(STORAGE_KEY) {
                if let Ok(logs) = serde_json::from_str::<Vec<LogEntry>>(&json_str) {
                    let skip = logs.len().saturating_sub(MAX_LOG_ENTRIES);
                    self.logs = logs.into_iter().skip(skip).collect();
                }
            }
        }
    }

    fn save_to_storage(&self) {
        if let Some(storage) = local_storage() {
            let json_str = serde_json::to_string(&self.get_logs()).unwrap_or_else(|_| "[]".to_string());
            let _ = storage.set_item(STORAGE_KEY, &json_str);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

#[cfg(not(target_arch = "wasm32"))]
fn local_storage() -> Option<web_sys::Storage> {
    None
}

#[cfg(target_arch = "wasm32")]
fn now_iso() -> String {
    js_sys::Date::new_0().to_iso_string().as_string().unwrap_or_default()
}

#[cfg(not(target_arch = "wasm32"))]
fn now_iso() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{}", secs)
}

#[cfg(target_arch = "wasm32")]
fn echo_to_console(level: LogLevel, category: &str, message: &str) {
    let line = wasm_bindgen::JsValue::from_str(&format!("[{}] {}", category, message));
    match level {
        LogLevel::Error => web_sys::console::error_1(&line),
        LogLevel::Warn => web_sys::console::warn_1(&line),
        LogLevel::Debug => web_sys::console::debug_1(&line),
        LogLevel::Info => web_sys::console::log_1(&line),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn echo_to_console(_level: LogLevel, _category: &str, _message: &str) {}

// グローバルなログトレースインスタンス
thread_local! {
    static LOG_TRACE: std::cell::RefCell<LogTrace> = std::cell::RefCell::new(LogTrace::in_memory());
}

/// ページ側の起動時に呼ぶ（localStorageへの保存を有効化）
pub fn enable_persistence() {
    LOG_TRACE.with(|trace| {
        let mut persistent = LogTrace::persistent();
        persistent.absorb(trace.borrow().get_logs());
        *trace.borrow_mut() = persistent;
    });
}

pub fn log_debug(category: &str, message: &str) {
    LOG_TRACE.with(|trace| trace.borrow_mut().log(LogLevel::Debug, category, message, None));
}

pub fn log_info(category: &str, message: &str) {
    LOG_TRACE.with(|trace| trace.borrow_mut().log(LogLevel::Info, category, message, None));
}

pub fn log_info_with_data(category: &str, message: &str, data: serde_json::Value) {
    LOG_TRACE.with(|trace| trace.borrow_mut().log(LogLevel::Info, category, message, Some(data)));
}

pub fn log_warn(category: &str, message: &str) {
    LOG_TRACE.with(|trace| trace.borrow_mut().log(LogLevel::Warn, category, message, None));
}

pub fn log_error(category: &str, message: &str) {
    LOG_TRACE.with(|trace| trace.borrow_mut().log(LogLevel::Error, category, message, None));
}

pub fn get_logs_json() -> String {
    LOG_TRACE.with(|trace| trace.borrow().get_logs_json())
}

pub fn clear_logs() {
    LOG_TRACE.with(|trace| trace.borrow_mut().clear());
}
