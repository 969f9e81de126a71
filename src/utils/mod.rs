//! ユーティリティモジュール

pub mod log_trace;
pub mod storage;
