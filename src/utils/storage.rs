//! localStorage による設定値の保存

use crate::error::{GlueError, Result};
use crate::theme::PreferenceStore;

/// オリジン単位のlocalStorage
///
/// 取得できない環境（プライベートモード等）では読み込みは `None`、
/// 書き込みは `StorageUnavailable` になる。
#[derive(Debug, Clone, Default)]
pub struct LocalStore;

impl LocalStore {
    pub fn new() -> Self {
        LocalStore
    }

    fn storage(&self) -> Result<web_sys::Storage> {
        let window = web_sys::window().ok_or(GlueError::StorageUnavailable)?;
        window
            .local_storage()
            .map_err(|e| GlueError::Storage(format!("{:?}", e)))?
            .ok_or(GlueError::StorageUnavailable)
    }
}

impl PreferenceStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage()?
            .get_item(key)
            .map_err(|e| GlueError::Storage(format!("{:?}", e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| GlueError::Storage(format!("{:?}", e)))
    }
}
