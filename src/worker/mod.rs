//! オフラインキャッシュ Service Worker
//!
//! インストール時に静的アセットを事前キャッシュし、fetchはキャッシュ優先で応答する。
//! キャッシュミス時のネットワーク応答はキャッシュに書き戻さない。

pub mod browser;

use crate::config::WorkerConfig;
use crate::error::Result;
use crate::utils::log_trace::{log_error, log_info, log_info_with_data, log_warn};
use futures::future::try_join_all;
use serde::Serialize;
use std::cell::Cell;

/// ネットワーク取得
#[allow(async_fn_in_trait)]
pub trait AssetNetwork {
    type Request;
    type Response;

    /// 事前キャッシュ用。成功ステータス以外はエラー
    async fn fetch_url(&self, url: &str) -> Result<Self::Response>;
    /// ページからのリクエストをそのまま転送（ステータスは問わない）
    async fn fetch(&self, request: &Self::Request) -> Result<Self::Response>;
}

/// キャッシュストレージ（名前付きバケットの集合）
#[allow(async_fn_in_trait)]
pub trait AssetCacheStorage {
    type Request;
    type Response;

    /// バケットを開いて（なければ作成して）全エントリを格納
    async fn store_all(&self, bucket: &str, entries: Vec<(String, Self::Response)>) -> Result<()>;
    /// 全バケットから一致するエントリを探す
    async fn lookup(&self, request: &Self::Request) -> Result<Option<Self::Response>>;
    async fn bucket_names(&self) -> Result<Vec<String>>;
    async fn delete_bucket(&self, name: &str) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    /// 事前キャッシュ中（または失敗してブラウザの再試行待ち）
    Installing,
    /// 事前キャッシュ完了
    Active,
}

pub struct OfflineWorker<C, N> {
    config: WorkerConfig,
    cache: C,
    network: N,
    lifecycle: Cell<Lifecycle>,
}

impl<C, N> OfflineWorker<C, N>
where
    N: AssetNetwork,
    C: AssetCacheStorage<Request = N::Request, Response = N::Response>,
{
    pub fn new(config: WorkerConfig, cache: C, network: N) -> Self {
        OfflineWorker {
            config,
            cache,
            network,
            lifecycle: Cell::new(Lifecycle::Installing),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.get()
    }

    /// 事前キャッシュ。1件でも失敗したら何も格納せずエラーを返す。
    /// 格納途中で失敗した場合はバケットごと削除する（lookupは全バケットを見るため）
    pub async fn install(&self) -> Result<()> {
        self.lifecycle.set(Lifecycle::Installing);
        let urls = &self.config.precache_urls;

        let responses = try_join_all(urls.iter().map(|url| self.network.fetch_url(url)))
            .await
            .map_err(|e| {
                log_error("worker", &format!("事前キャッシュ失敗: {}", e));
                e
            })?;

        let entries: Vec<(String, N::Response)> = urls.iter().cloned().zip(responses).collect();
        if let Err(e) = self.cache.store_all(&self.config.cache_name, entries).await {
            log_error("worker", &format!("キャッシュ格納失敗: {}", e));
            if let Err(cleanup) = self.cache.delete_bucket(&self.config.cache_name).await {
                log_warn("worker", &format!("不完全なバケットの削除失敗: {}", cleanup));
            }
            return Err(e);
        }

        self.lifecycle.set(Lifecycle::Active);
        log_info_with_data(
            "worker",
            "インストール完了",
            serde_json::json!({ "cache": self.config.cache_name, "assets": urls.len() }),
        );
        Ok(())
    }

    /// キャッシュ優先で応答。ミス時はネットワーク応答をそのまま返す
    pub async fn respond(&self, request: &N::Request) -> Result<N::Response> {
        match self.cache.lookup(request).await {
            Ok(Some(hit)) => return Ok(hit),
            Ok(None) => {}
            Err(e) => log_warn("worker", &format!("キャッシュ参照失敗: {}", e)),
        }
        self.network.fetch(request).await
    }

    /// 自アプリの旧バージョンのバケットを削除。戻り値は削除数
    pub async fn activate(&self) -> Result<usize> {
        let names = self.cache.bucket_names().await?;
        let mut removed = 0;
        for name in names.iter().filter(|n| self.config.is_stale_bucket(n)) {
            if self.cache.delete_bucket(name).await? {
                log_info("worker", &format!("旧キャッシュ削除: {}", name));
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GlueError;
    use futures::executor::block_on;
    use std::cell::RefCell;
    use std::collections::{BTreeMap, HashMap};

    /// URL→本文の固定レスポンスを返すネットワーク
    #[derive(Default)]
    struct FakeNetwork {
        bodies: HashMap<String, String>,
        failing: Vec<String>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeNetwork {
        fn serving(urls: &[&str]) -> Self {
            FakeNetwork {
                bodies: urls.iter().map(|u| (u.to_string(), format!("body of {}", u))).collect(),
                ..Default::default()
            }
        }

        fn failing_on(mut self, url: &str) -> Self {
            self.failing.push(url.to_string());
            self
        }

        fn get(&self, url: &str) -> Result<String> {
            self.calls.borrow_mut().push(url.to_string());
            if self.failing.iter().any(|f| f == url) {
                return Err(GlueError::Fetch {
                    url: url.to_string(),
                    reason: "connection reset".to_string(),
                });
            }
            self.bodies.get(url).cloned().ok_or_else(|| GlueError::BadStatus {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    impl AssetNetwork for FakeNetwork {
        type Request = String;
        type Response = String;

        async fn fetch_url(&self, url: &str) -> Result<String> {
            self.get(url)
        }

        async fn fetch(&self, request: &String) -> Result<String> {
            self.get(request)
        }
    }

    #[derive(Default)]
    struct MemoryCacheStorage {
        buckets: RefCell<BTreeMap<String, HashMap<String, String>>>,
        /// この件数を格納した後の書き込みを失敗させる（容量超過の再現）
        fail_after: Option<usize>,
    }

    impl MemoryCacheStorage {
        fn failing_after(puts: usize) -> Self {
            MemoryCacheStorage {
                fail_after: Some(puts),
                ..Default::default()
            }
        }

        fn with_bucket(self, name: &str, entries: &[(&str, &str)]) -> Self {
            self.buckets.borrow_mut().insert(
                name.to_string(),
                entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            );
            self
        }

        fn entry_count(&self) -> usize {
            self.buckets.borrow().values().map(|b| b.len()).sum()
        }
    }

    impl AssetCacheStorage for MemoryCacheStorage {
        type Request = String;
        type Response = String;

        async fn store_all(&self, bucket: &str, entries: Vec<(String, String)>) -> Result<()> {
            let mut buckets = self.buckets.borrow_mut();
            let target = buckets.entry(bucket.to_string()).or_default();
            for (stored, (url, body)) in entries.into_iter().enumerate() {
                if self.fail_after.is_some_and(|limit| stored >= limit) {
                    return Err(GlueError::Cache("QuotaExceededError".to_string()));
                }
                target.insert(url, body);
            }
            Ok(())
        }

        async fn lookup(&self, request: &String) -> Result<Option<String>> {
            Ok(self.buckets.borrow().values().find_map(|b| b.get(request).cloned()))
        }

        async fn bucket_names(&self) -> Result<Vec<String>> {
            Ok(self.buckets.borrow().keys().cloned().collect())
        }

        async fn delete_bucket(&self, name: &str) -> Result<bool> {
            Ok(self.buckets.borrow_mut().remove(name).is_some())
        }
    }

    fn config() -> WorkerConfig {
        WorkerConfig {
            cache_name: "voltix-audit-v2".to_string(),
            ..WorkerConfig::default()
        }
    }

    fn all_assets() -> Vec<&'static str> {
        crate::config::PRECACHE_URLS.to_vec()
    }

    #[test]
    fn install_precaches_every_asset_then_activates() {
        let worker = OfflineWorker::new(
            config(),
            MemoryCacheStorage::default(),
            FakeNetwork::serving(&all_assets()),
        );
        assert_eq!(worker.lifecycle(), Lifecycle::Installing);

        block_on(worker.install()).unwrap();

        assert_eq!(worker.lifecycle(), Lifecycle::Active);
        let buckets = worker.cache.buckets.borrow();
        let bucket = buckets.get("voltix-audit-v2").unwrap();
        assert_eq!(bucket.len(), 4);
        assert_eq!(bucket.get("/static/css/style.css").unwrap(), "body of /static/css/style.css");
    }

    #[test]
    fn one_failed_asset_fails_whole_install() {
        let worker = OfflineWorker::new(
            config(),
            MemoryCacheStorage::default(),
            FakeNetwork::serving(&all_assets()).failing_on("/static/images/logo_512.png"),
        );

        let err = block_on(worker.install()).unwrap_err();

        assert!(matches!(err, GlueError::Fetch { ref url, .. } if url == "/static/images/logo_512.png"));
        assert_eq!(worker.lifecycle(), Lifecycle::Installing);
        assert_eq!(worker.cache.entry_count(), 0);
    }

    #[test]
    fn missing_asset_status_fails_install() {
        let mut assets = all_assets();
        assets.retain(|u| *u != "/static/js/app.js");
        let worker = OfflineWorker::new(config(), MemoryCacheStorage::default(), FakeNetwork::serving(&assets));

        let err = block_on(worker.install()).unwrap_err();

        assert_eq!(
            err,
            GlueError::BadStatus {
                url: "/static/js/app.js".to_string(),
                status: 404
            }
        );
        assert_eq!(worker.cache.entry_count(), 0);
    }

    #[test]
    fn failed_cache_write_leaves_no_partial_bucket() {
        let worker = OfflineWorker::new(
            config(),
            MemoryCacheStorage::failing_after(2),
            FakeNetwork::serving(&all_assets()),
        );

        let err = block_on(worker.install()).unwrap_err();

        assert_eq!(err, GlueError::Cache("QuotaExceededError".to_string()));
        assert_eq!(worker.lifecycle(), Lifecycle::Installing);
        assert_eq!(worker.cache.entry_count(), 0);
        assert!(block_on(worker.cache.bucket_names()).unwrap().is_empty());
        // 旧バージョンのワーカーからも参照されない
        let hit = block_on(worker.cache.lookup(&"/static/css/style.css".to_string())).unwrap();
        assert_eq!(hit, None);
    }

    #[test]
    fn cached_request_never_reaches_network() {
        let worker = OfflineWorker::new(
            config(),
            MemoryCacheStorage::default().with_bucket("voltix-audit-v2", &[("/static/css/style.css", "cached css")]),
            FakeNetwork::serving(&["/static/css/style.css"]),
        );

        let response = block_on(worker.respond(&"/static/css/style.css".to_string())).unwrap();

        assert_eq!(response, "cached css");
        assert!(worker.network.calls.borrow().is_empty());
    }

    #[test]
    fn miss_falls_through_without_write_back() {
        let worker = OfflineWorker::new(
            config(),
            MemoryCacheStorage::default().with_bucket("voltix-audit-v2", &[("/", "cached index")]),
            FakeNetwork::serving(&["/audits/42"]),
        );

        let response = block_on(worker.respond(&"/audits/42".to_string())).unwrap();

        assert_eq!(response, "body of /audits/42");
        assert_eq!(*worker.network.calls.borrow(), vec!["/audits/42".to_string()]);
        assert_eq!(worker.cache.entry_count(), 1);
    }

    #[test]
    fn network_error_on_miss_is_propagated() {
        let worker = OfflineWorker::new(
            config(),
            MemoryCacheStorage::default(),
            FakeNetwork::default().failing_on("/api/sync"),
        );

        let err = block_on(worker.respond(&"/api/sync".to_string())).unwrap_err();
        assert!(matches!(err, GlueError::Fetch { .. }));
    }

    #[test]
    fn activate_prunes_only_stale_app_buckets() {
        let worker = OfflineWorker::new(
            config(),
            MemoryCacheStorage::default()
                .with_bucket("voltix-audit-v1", &[("/", "old")])
                .with_bucket("voltix-audit-v2", &[("/", "new")])
                .with_bucket("third-party-cache", &[("/x", "x")]),
            FakeNetwork::default(),
        );

        let removed = block_on(worker.activate()).unwrap();

        assert_eq!(removed, 1);
        let names = block_on(worker.cache.bucket_names()).unwrap();
        assert_eq!(names, vec!["third-party-cache".to_string(), "voltix-audit-v2".to_string()]);
    }
}
