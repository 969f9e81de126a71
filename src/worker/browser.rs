//! Service Worker グローバルスコープへの接続（install / activate / fetch）

use super::{AssetCacheStorage, AssetNetwork, OfflineWorker};
use crate::config::WorkerConfig;
use crate::error::{GlueError, Result};
use crate::utils::log_trace::{log_info, log_warn};
use gloo::events::EventListener;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{Cache, CacheStorage, ExtendableEvent, FetchEvent, Request, Response, ServiceWorkerGlobalScope};

pub struct BrowserNetwork {
    scope: ServiceWorkerGlobalScope,
}

impl BrowserNetwork {
    pub fn new(scope: ServiceWorkerGlobalScope) -> Self {
        BrowserNetwork { scope }
    }
}

async fn to_response(promise: js_sys::Promise, url: &str) -> Result<Response> {
    let value = JsFuture::from(promise).await.map_err(|e| GlueError::Fetch {
        url: url.to_string(),
        reason: format!("{:?}", e),
    })?;
    value
        .dyn_into::<Response>()
        .map_err(|_| GlueError::Js("Responseへの変換失敗".to_string()))
}

impl AssetNetwork for BrowserNetwork {
    type Request = Request;
    type Response = Response;

    async fn fetch_url(&self, url: &str) -> Result<Response> {
        let resp = to_response(self.scope.fetch_with_str(url), url).await?;
        if !resp.ok() {
            return Err(GlueError::BadStatus {
                url: url.to_string(),
                status: resp.status(),
            });
        }
        Ok(resp)
    }

    async fn fetch(&self, request: &Request) -> Result<Response> {
        to_response(self.scope.fetch_with_request(request), &request.url()).await
    }
}

pub struct BrowserCacheStorage {
    caches: CacheStorage,
}

impl BrowserCacheStorage {
    pub fn new(scope: &ServiceWorkerGlobalScope) -> Result<Self> {
        let caches = scope.caches().map_err(|e| GlueError::Cache(format!("{:?}", e)))?;
        Ok(BrowserCacheStorage { caches })
    }
}

async fn await_cache(promise: js_sys::Promise) -> Result<JsValue> {
    JsFuture::from(promise)
        .await
        .map_err(|e| GlueError::Cache(format!("{:?}", e)))
}

impl AssetCacheStorage for BrowserCacheStorage {
    type Request = Request;
    type Response = Response;

    async fn store_all(&self, bucket: &str, entries: Vec<(String, Response)>) -> Result<()> {
        let cache: Cache = await_cache(self.caches.open(bucket))
            .await?
            .dyn_into()
            .map_err(|_| GlueError::Cache("Cacheへの変換失敗".to_string()))?;
        for (url, response) in &entries {
            await_cache(cache.put_with_str(url, response)).await?;
        }
        Ok(())
    }

    async fn lookup(&self, request: &Request) -> Result<Option<Response>> {
        let value = await_cache(self.caches.match_with_request(request)).await?;
        if value.is_undefined() {
            return Ok(None);
        }
        value
            .dyn_into::<Response>()
            .map(Some)
            .map_err(|_| GlueError::Cache("Responseへの変換失敗".to_string()))
    }

    async fn bucket_names(&self) -> Result<Vec<String>> {
        let keys: js_sys::Array = await_cache(self.caches.keys())
            .await?
            .dyn_into()
            .map_err(|_| GlueError::Cache("キー一覧の変換失敗".to_string()))?;
        Ok(keys.iter().filter_map(|k| k.as_string()).collect())
    }

    async fn delete_bucket(&self, name: &str) -> Result<bool> {
        let deleted = await_cache(self.caches.delete(name)).await?;
        Ok(deleted.as_bool().unwrap_or(false))
    }
}

type BrowserWorker = OfflineWorker<BrowserCacheStorage, BrowserNetwork>;

/// Service Worker のイベントハンドラを登録
pub fn start(config: WorkerConfig) -> Result<()> {
    let scope: ServiceWorkerGlobalScope = js_sys::global()
        .dyn_into()
        .map_err(|_| GlueError::Js("ServiceWorkerGlobalScopeではありません".to_string()))?;

    let cache = BrowserCacheStorage::new(&scope)?;
    let worker: Rc<BrowserWorker> = Rc::new(OfflineWorker::new(config, cache, BrowserNetwork::new(scope.clone())));

    // install: 事前キャッシュが終わるまで待たせる（失敗ならインストール失敗）
    let install_worker = worker.clone();
    EventListener::new(&scope, "install", move |event| {
        let event = event.unchecked_ref::<ExtendableEvent>();
        let worker = install_worker.clone();
        let promise = future_to_promise(async move {
            worker.install().await?;
            Ok(JsValue::UNDEFINED)
        });
        if let Err(e) = event.wait_until(&promise) {
            log_warn("worker", &format!("waitUntil失敗: {:?}", e));
        }
    })
    .forget();

    // activate: 旧バケット削除（失敗してもアクティブ化は止めない）
    let activate_worker = worker.clone();
    EventListener::new(&scope, "activate", move |event| {
        let event = event.unchecked_ref::<ExtendableEvent>();
        let worker = activate_worker.clone();
        let promise = future_to_promise(async move {
            if let Err(e) = worker.activate().await {
                log_warn("worker", &format!("旧キャッシュ削除失敗: {}", e));
            }
            Ok(JsValue::UNDEFINED)
        });
        let _ = event.wait_until(&promise);
    })
    .forget();

    // fetch: キャッシュ優先
    let fetch_worker = worker;
    EventListener::new(&scope, "fetch", move |event| {
        let event = event.unchecked_ref::<FetchEvent>();
        let request = event.request();
        let worker = fetch_worker.clone();
        let promise = future_to_promise(async move {
            let response = worker.respond(&request).await?;
            Ok(response.into())
        });
        if let Err(e) = event.respond_with(&promise) {
            log_warn("worker", &format!("respondWith失敗: {:?}", e));
        }
    })
    .forget();

    log_info("worker", "Service Worker起動");
    Ok(())
}
