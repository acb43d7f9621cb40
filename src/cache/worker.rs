//! Background asset worker.
//!
//! Intercepts outgoing requests, picks the first matching rule and runs its strategy
//! against the shared [`AssetStore`] and the [`Network`].

use std::mem;
use std::sync::{Arc, Mutex};

use metrics::counter;
use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use super::lock::mutex_lock;
use super::network::{AssetRequest, AssetResponse, Network, WorkerError};
use super::policy::{CachePolicy, CacheRule, Strategy};
use super::store::AssetStore;

const SOURCE: &str = "cache::worker";

pub struct AssetWorker {
    policy: Arc<CachePolicy>,
    store: Arc<AssetStore>,
    network: Arc<dyn Network>,
    enabled: bool,
    revalidations: Mutex<JoinSet<()>>,
}

impl AssetWorker {
    pub fn new(policy: CachePolicy, network: Arc<dyn Network>) -> Self {
        Self {
            policy: Arc::new(policy),
            store: Arc::new(AssetStore::new()),
            network,
            enabled: true,
            revalidations: Mutex::new(JoinSet::new()),
        }
    }

    /// A worker that never caches and forwards every request.
    ///
    /// The policy is kept so rule lookups and the published manifest match an
    /// enabled worker built from the same settings.
    pub fn disabled(policy: CachePolicy, network: Arc<dyn Network>) -> Self {
        Self {
            enabled: false,
            ..Self::new(policy, network)
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    /// Serve `request` according to the policy.
    ///
    /// Non-GET requests, URLs matching no rule, and every request while the worker
    /// is disabled go straight to the network.
    #[instrument(skip_all, fields(url = %request.url))]
    pub async fn handle(&self, request: &AssetRequest) -> Result<AssetResponse, WorkerError> {
        if !self.enabled || !request.is_get() {
            return self.network.fetch(request).await;
        }
        let Some(rule) = self.policy.rule_for(&request.url) else {
            return self.network.fetch(request).await;
        };

        match rule.strategy {
            Strategy::CacheFirst => self.cache_first(rule, request).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(rule, request).await,
            Strategy::NetworkFirst => self.network_first(rule, request).await,
        }
    }

    /// Background refreshes spawned and not yet joined.
    pub fn pending_revalidations(&self) -> usize {
        mutex_lock(&self.revalidations, SOURCE, "pending_revalidations").len()
    }

    /// Wait for every in-flight background refresh to finish.
    pub async fn settle(&self) {
        loop {
            let mut pending = mem::take(&mut *mutex_lock(&self.revalidations, SOURCE, "settle"));
            if pending.is_empty() {
                return;
            }
            while let Some(result) = pending.join_next().await {
                report_revalidation(result);
            }
        }
    }

    async fn cache_first(
        &self,
        rule: &CacheRule,
        request: &AssetRequest,
    ) -> Result<AssetResponse, WorkerError> {
        if let Some(fresh) = self.fresh_entry(rule, &request.url) {
            record_hit(rule);
            return Ok(fresh);
        }
        record_miss(rule);

        let response = self.network.fetch(request).await?;
        store_if_allowed(&self.store, rule, &request.url, &response);
        Ok(response)
    }

    async fn stale_while_revalidate(
        &self,
        rule: &CacheRule,
        request: &AssetRequest,
    ) -> Result<AssetResponse, WorkerError> {
        if let Some(entry) = self.store.get(rule, &request.url) {
            record_hit(rule);
            self.spawn_revalidation(rule, request);
            return Ok(entry.response);
        }
        record_miss(rule);

        let response = self.network.fetch(request).await?;
        store_if_allowed(&self.store, rule, &request.url, &response);
        Ok(response)
    }

    async fn network_first(
        &self,
        rule: &CacheRule,
        request: &AssetRequest,
    ) -> Result<AssetResponse, WorkerError> {
        let fetched = match rule.network_timeout {
            Some(limit) => tokio::time::timeout(limit, self.network.fetch(request))
                .await
                .unwrap_or_else(|_| {
                    counter!("agency_asset_network_timeout_total", "cache" => rule.cache_name)
                        .increment(1);
                    Err(WorkerError::Timeout {
                        seconds: limit.as_secs(),
                    })
                }),
            None => self.network.fetch(request).await,
        };

        match fetched {
            Ok(response) => {
                store_if_allowed(&self.store, rule, &request.url, &response);
                Ok(response)
            }
            Err(err) => {
                debug!(cache = rule.cache_name, error = %err, "network failed, trying cache");
                match self.fresh_entry(rule, &request.url) {
                    Some(cached) => {
                        record_hit(rule);
                        Ok(cached)
                    }
                    None => {
                        record_miss(rule);
                        Err(err)
                    }
                }
            }
        }
    }

    /// Unexpired entry for `url`; an expired entry is dropped on sight.
    fn fresh_entry(&self, rule: &CacheRule, url: &str) -> Option<AssetResponse> {
        let entry = self.store.get(rule, url)?;
        if entry.is_expired(rule.max_age, Instant::now()) {
            debug!(cache = rule.cache_name, url, "dropping expired asset");
            self.store.remove(rule, url);
            return None;
        }
        Some(entry.response)
    }

    fn spawn_revalidation(&self, rule: &CacheRule, request: &AssetRequest) {
        let store = Arc::clone(&self.store);
        let network = Arc::clone(&self.network);
        let rule = rule.clone();
        let request = request.clone();

        let mut revalidations = mutex_lock(&self.revalidations, SOURCE, "spawn_revalidation");
        // Finished tasks stay in the set until joined.
        while let Some(result) = revalidations.try_join_next() {
            report_revalidation(result);
        }
        revalidations.spawn(async move {
            match network.fetch(&request).await {
                Ok(response) => store_if_allowed(&store, &rule, &request.url, &response),
                Err(err) => {
                    debug!(cache = rule.cache_name, url = %request.url, error = %err, "background refresh failed");
                }
            }
        });
    }
}

fn store_if_allowed(store: &AssetStore, rule: &CacheRule, url: &str, response: &AssetResponse) {
    if response.is_storable() {
        store.put(rule, url, response.clone());
    } else {
        debug!(
            cache = rule.cache_name,
            url,
            status = response.status,
            "response not cacheable"
        );
    }
}

fn report_revalidation(result: Result<(), JoinError>) {
    if let Err(err) = result {
        warn!(error = %err, "asset revalidation task failed");
    }
}

fn record_hit(rule: &CacheRule) {
    counter!("agency_asset_cache_hit_total", "cache" => rule.cache_name).increment(1);
}

fn record_miss(rule: &CacheRule) {
    counter!("agency_asset_cache_miss_total", "cache" => rule.cache_name).increment(1);
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    struct EchoNetwork {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Network for EchoNetwork {
        async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, WorkerError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AssetResponse::new(200, format!("{} #{n}", request.url)))
        }
    }

    fn worker(enabled: bool) -> (AssetWorker, Arc<EchoNetwork>) {
        let network = Arc::new(EchoNetwork {
            calls: AtomicUsize::new(0),
        });
        let policy = CachePolicy::standard("cdn.sanity.io", Duration::from_secs(10));
        let worker = if enabled {
            AssetWorker::new(policy, network.clone())
        } else {
            AssetWorker::disabled(policy, network.clone())
        };
        (worker, network)
    }

    #[tokio::test]
    async fn non_get_requests_bypass_the_cache() {
        let (worker, network) = worker(true);
        let request = AssetRequest::new("POST", "https://cdn.sanity.io/images/a.png");

        worker.handle(&request).await.expect("response");
        worker.handle(&request).await.expect("response");

        assert_eq!(network.calls.load(Ordering::SeqCst), 2);
        assert_eq!(worker.store().len("images"), 0);
    }

    #[tokio::test]
    async fn unmatched_urls_bypass_the_cache() {
        let (worker, network) = worker(true);
        let request = AssetRequest::get("ftp://files.example/a.bin");

        worker.handle(&request).await.expect("response");
        worker.handle(&request).await.expect("response");

        assert_eq!(network.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn disabled_worker_always_passes_through() {
        let (worker, network) = worker(false);
        let request = AssetRequest::get("https://cdn.sanity.io/images/a.png");

        worker.handle(&request).await.expect("response");
        worker.handle(&request).await.expect("response");

        assert!(!worker.is_enabled());
        assert_eq!(network.calls.load(Ordering::SeqCst), 2);
        assert_eq!(worker.store().len("images"), 0);
        assert_eq!(worker.policy().rules().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn finished_revalidations_are_reaped_while_serving() {
        let (worker, network) = worker(true);
        let request = AssetRequest::get("https://agency.example/_app/main.js");
        worker.handle(&request).await.expect("initial fetch");

        for _ in 0..200 {
            worker.handle(&request).await.expect("stale hit");
            // Idle long enough for the spawned refresh to complete.
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        assert_eq!(network.calls.load(Ordering::SeqCst), 201);
        assert!(
            worker.pending_revalidations() <= 1,
            "pending revalidations: {}",
            worker.pending_revalidations()
        );

        worker.settle().await;
        assert_eq!(worker.pending_revalidations(), 0);
    }

    #[tokio::test]
    async fn settle_with_nothing_pending_returns() {
        let (worker, _) = worker(true);
        worker.settle().await;
    }
}
