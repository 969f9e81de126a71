//! Voltix Audit フロントエンド補助モジュール
//!
//! ページ側コントローラ（アラート自動消去・テーマ切替・スクロール表示）と
//! オフラインキャッシュ用 Service Worker のロジックをまとめたライブラリ。
//! ブラウザ依存部分は `dom` / `page` / `worker::browser` に閉じ込め、
//! それ以外はネイティブの `cargo test` で検証できる。

pub mod alerts;
pub mod config;
pub mod dom;
pub mod error;
pub mod page;
pub mod reveal;
pub mod schedule;
pub mod theme;
pub mod utils;
pub mod worker;

pub use error::{GlueError, Result};
