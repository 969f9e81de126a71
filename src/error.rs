//! エラー型

use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GlueError {
    #[error("localStorageが利用できません")]
    StorageUnavailable,

    #[error("ストレージ操作失敗: {0}")]
    Storage(String),

    #[error("fetch失敗 ({url}): {reason}")]
    Fetch { url: String, reason: String },

    #[error("HTTPエラー ({url}): {status}")]
    BadStatus { url: String, status: u16 },

    #[error("キャッシュ操作失敗: {0}")]
    Cache(String),

    #[error("JS例外: {0}")]
    Js(String),
}

impl GlueError {
    /// JS側の例外をメッセージ化
    pub fn js(value: &JsValue) -> Self {
        GlueError::Js(format!("{:?}", value))
    }
}

impl From<GlueError> for JsValue {
    fn from(err: GlueError) -> JsValue {
        JsValue::from_str(&err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GlueError>;
