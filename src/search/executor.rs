//! Search execution and orchestration

use super::models::{Mode, ProviderId, ProviderOutcome, Query};
use crate::config::Settings;
use crate::error::{Result, SearchError};
use crate::images::ImageFetcher;
use crate::metrics::Metrics;
use crate::network::HttpClient;
use crate::providers::{ProviderLoader, ProviderRegistry};
use futures::{FutureExt, Stream};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use url::Url;
use uuid::Uuid;

/// Text shown for a provider that has no adapter for the requested mode
pub const UNSUPPORTED: &str = "Search engine is not supported.";

/// Fans a query out to several providers and streams back one outcome per provider
#[derive(Clone)]
pub struct Aggregator {
    /// HTTP client shared by every adapter and image download
    client: HttpClient,
    registry: Arc<ProviderRegistry>,
    images: ImageFetcher,
    metrics: Arc<Metrics>,
    /// Upper bound on any provider's time budget
    max_timeout: Duration,
}

impl Aggregator {
    /// Create an aggregator over an existing client and registry
    pub fn new(client: HttpClient, registry: Arc<ProviderRegistry>) -> Self {
        Self {
            images: ImageFetcher::new(client.clone()),
            client,
            registry,
            metrics: Arc::new(Metrics::new()),
            max_timeout: Duration::from_secs(crate::MAX_TIMEOUT),
        }
    }

    /// Build the client, registry and image fetcher described by `settings`
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = HttpClient::with_settings(&settings.outgoing)?;
        let registry = Arc::new(ProviderLoader::load(settings));
        let max_timeout = Duration::try_from_secs_f64(settings.outgoing.max_request_timeout)
            .map_err(|e| SearchError::Config(format!("max_request_timeout: {}", e)))?;

        Ok(Self {
            images: ImageFetcher::with_settings(client.clone(), &settings.search),
            client,
            registry,
            metrics: Arc::new(Metrics::new()),
            max_timeout,
        })
    }

    pub fn with_image_fetcher(mut self, images: ImageFetcher) -> Self {
        self.images = images;
        self
    }

    /// Set maximum timeout
    pub fn with_max_timeout(mut self, timeout: Duration) -> Self {
        self.max_timeout = timeout;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Start a search on every selected provider
    ///
    /// Each provider runs in its own task and reports exactly one
    /// [`ProviderOutcome`] through the returned [`SearchRun`], in completion
    /// order. Repeated providers run once. Must be called from within a Tokio
    /// runtime.
    pub fn run(&self, query: Query, mode: Mode, providers: &[ProviderId]) -> Result<SearchRun> {
        if providers.is_empty() {
            return Err(SearchError::InvalidInput(
                "at least one provider must be selected".into(),
            ));
        }

        let mut selected: Vec<ProviderId> = Vec::with_capacity(providers.len());
        for &provider in providers {
            if !selected.contains(&provider) {
                selected.push(provider);
            }
        }

        self.metrics.inc_run();

        let id = Uuid::new_v4();
        let span = info_span!("search", run_id = %id, mode = %mode);
        info!(
            parent: &span,
            "Executing search '{}' on {} providers",
            query,
            selected.len()
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        for provider in selected.iter().copied() {
            let unit = self.clone();
            let tx = tx.clone();
            let token = cancel.clone();
            let query = query.clone();
            let provider_span = info_span!(parent: &span, "provider", provider = %provider);

            tokio::spawn(
                async move {
                    tokio::select! {
                        _ = token.cancelled() => {
                            debug!("Run cancelled before {} finished", provider);
                        }
                        outcome = unit.search_provider(provider, mode, &query) => {
                            if tx.send(outcome).is_err() {
                                debug!("Run dropped, discarding {} outcome", provider);
                            }
                        }
                    }
                }
                .instrument(provider_span),
            );
        }

        Ok(SearchRun {
            id,
            mode,
            expected: selected.len(),
            received: 0,
            outcomes: rx,
            cancel,
        })
    }

    /// Run a search and wait for every provider to report
    pub async fn search(
        &self,
        query: Query,
        mode: Mode,
        providers: &[ProviderId],
    ) -> Result<Vec<ProviderOutcome>> {
        use futures::StreamExt;

        let run = self.run(query, mode, providers)?;
        Ok(run.collect().await)
    }

    async fn search_provider(&self, provider: ProviderId, mode: Mode, query: &Query) -> ProviderOutcome {
        match mode {
            Mode::Text => ProviderOutcome::text(provider, self.search_text(provider, query).await),
            Mode::Images => {
                let urls = self.search_images(provider, query).await;
                ProviderOutcome::images(provider, self.images.fetch_all(urls).await)
            }
        }
    }

    async fn search_text(&self, provider: ProviderId, query: &Query) -> Vec<String> {
        let Some(adapter) = self.registry.text(provider) else {
            debug!("No text adapter registered for {}", provider);
            return vec![UNSUPPORTED.to_string()];
        };

        let budget = self.registry.get_timeout(provider, Mode::Text, self.max_timeout);
        debug!("Searching {} with timeout {:?}", provider, budget);

        self.metrics.record_provider_search(provider);
        let start = Instant::now();

        match guarded(budget, adapter.search(&self.client, query)).await {
            Ok(items) => {
                let elapsed = start.elapsed();
                self.metrics.record_success(provider, elapsed);
                debug!("{} returned {} results in {:?}", provider, items.len(), elapsed);
                items
            }
            Err(e) => {
                self.metrics.record_failure(provider, start.elapsed());
                warn!("{} search failed: {}", provider, e);
                adapter.fallback(&e)
            }
        }
    }

    async fn search_images(&self, provider: ProviderId, query: &Query) -> Vec<Url> {
        let Some(adapter) = self.registry.images(provider) else {
            debug!("No image adapter registered for {}", provider);
            return Vec::new();
        };

        let budget = self.registry.get_timeout(provider, Mode::Images, self.max_timeout);
        debug!("Searching {} images with timeout {:?}", provider, budget);

        self.metrics.record_provider_search(provider);
        let start = Instant::now();

        match guarded(budget, adapter.search(&self.client, query)).await {
            Ok(urls) => {
                let elapsed = start.elapsed();
                self.metrics.record_success(provider, elapsed);
                debug!("{} returned {} image URLs in {:?}", provider, urls.len(), elapsed);
                urls
            }
            Err(e) => {
                self.metrics.record_failure(provider, start.elapsed());
                warn!("{} image search failed: {}", provider, e);
                adapter.fallback(&e)
            }
        }
    }
}

/// Bound an adapter call in time and turn a panic into an error
async fn guarded<T, F>(budget: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout(budget, AssertUnwindSafe(fut).catch_unwind()).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(SearchError::Protocol("provider panicked".into())),
        Err(_) => Err(SearchError::Timeout(format!(
            "no response within {:?}",
            budget
        ))),
    }
}

/// Outcomes of one search, delivered as each provider completes
///
/// Ends once every provider has reported or the run is cancelled. Dropping a
/// run does not stop its providers; use [`SearchRun::cancel`] for that.
#[derive(Debug)]
pub struct SearchRun {
    id: Uuid,
    mode: Mode,
    expected: usize,
    received: usize,
    outcomes: mpsc::UnboundedReceiver<ProviderOutcome>,
    cancel: CancellationToken,
}

impl SearchRun {
    /// Identifier attached to this run's tracing span
    pub fn run_id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Number of providers taking part
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Stop in-flight providers; outcomes not yet yielded are discarded
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Stream for SearchRun {
    type Item = ProviderOutcome;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancel.is_cancelled() {
            return Poll::Ready(None);
        }

        match self.outcomes.poll_recv(cx) {
            Poll::Ready(Some(outcome)) => {
                self.received += 1;
                Poll::Ready(Some(outcome))
            }
            other => other,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.expected.saturating_sub(self.received)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::bing::Bing;
    use crate::providers::{ImageProvider, TextProvider};
    use async_trait::async_trait;
    use futures::StreamExt;

    struct Panicking;

    #[async_trait]
    impl TextProvider for Panicking {
        fn id(&self) -> ProviderId {
            ProviderId::Google
        }

        async fn search(&self, _client: &HttpClient, _query: &Query) -> Result<Vec<String>> {
            panic!("adapter bug");
        }
    }

    struct Stalled;

    #[async_trait]
    impl ImageProvider for Stalled {
        fn id(&self) -> ProviderId {
            ProviderId::DuckDuckGo
        }

        fn timeout(&self) -> f64 {
            0.05
        }

        async fn search(&self, _client: &HttpClient, _query: &Query) -> Result<Vec<Url>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    fn aggregator(registry: ProviderRegistry) -> Aggregator {
        Aggregator::new(HttpClient::new().unwrap(), Arc::new(registry))
    }

    #[tokio::test]
    async fn test_empty_selection_is_rejected() {
        let agg = aggregator(ProviderRegistry::new());
        let query = Query::new("rust").unwrap();
        let err = agg.run(query, Mode::Text, &[]).unwrap_err();
        assert!(matches!(err, SearchError::InvalidInput(_)));
        assert_eq!(agg.metrics().get_total_runs(), 0);
    }

    #[tokio::test]
    async fn test_unregistered_provider_is_not_supported() {
        let agg = aggregator(ProviderRegistry::new());
        let query = Query::new("rust").unwrap();

        let outcomes = agg
            .search(query.clone(), Mode::Text, &[ProviderId::Bing])
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(
            outcomes[0].results.as_text().unwrap(),
            &[UNSUPPORTED.to_string()]
        );

        let outcomes = agg
            .search(query, Mode::Images, &[ProviderId::Bing])
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].results.as_images().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_panicking_adapter_falls_back() {
        let mut registry = ProviderRegistry::new();
        registry.register_text(Arc::new(Panicking));
        registry.register_text(Arc::new(Bing::new()));
        let agg = aggregator(registry);

        let outcomes = agg
            .search(
                Query::new("rust").unwrap(),
                Mode::Text,
                &[ProviderId::Google, ProviderId::Bing],
            )
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        let google = outcomes
            .iter()
            .find(|o| o.provider == ProviderId::Google)
            .unwrap();
        assert_eq!(
            google.results.as_text().unwrap(),
            &["Error while searching Google.".to_string()]
        );

        let stats = agg.metrics().stats();
        assert_eq!(stats[&ProviderId::Google].failures, 1);
    }

    #[tokio::test]
    async fn test_stalled_adapter_times_out() {
        let mut registry = ProviderRegistry::new();
        registry.register_images(Arc::new(Stalled));
        let agg = aggregator(registry);

        let outcomes = agg
            .search(
                Query::new("cats").unwrap(),
                Mode::Images,
                &[ProviderId::DuckDuckGo],
            )
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].results.is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_budget_still_reports() {
        let mut registry = ProviderRegistry::new();
        registry.register_text(Arc::new(Bing::new()));
        registry.set_timeout(ProviderId::Bing, 1e20);
        registry.set_timeout(ProviderId::Google, f64::INFINITY);
        let agg = aggregator(registry);

        let outcomes = agg
            .search(
                Query::new("rust").unwrap(),
                Mode::Text,
                &[ProviderId::Bing, ProviderId::Google],
            )
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        let bing = outcomes
            .iter()
            .find(|o| o.provider == ProviderId::Bing)
            .unwrap();
        assert_eq!(
            bing.results.as_text().unwrap(),
            &["Bing Search API requires a key.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_duplicates_collapse() {
        let mut registry = ProviderRegistry::new();
        registry.register_text(Arc::new(Bing::new()));
        let agg = aggregator(registry);

        let run = agg
            .run(
                Query::new("rust").unwrap(),
                Mode::Text,
                &[ProviderId::Bing, ProviderId::Bing],
            )
            .unwrap();
        assert_eq!(run.expected(), 1);
        assert_eq!(run.size_hint(), (0, Some(1)));

        let outcomes: Vec<_> = run.collect().await;
        assert_eq!(outcomes.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_ends_run() {
        let mut registry = ProviderRegistry::new();
        registry.register_images(Arc::new(Stalled));
        let agg = aggregator(registry).with_max_timeout(Duration::from_secs(60));

        let mut run = agg
            .run(
                Query::new("cats").unwrap(),
                Mode::Images,
                &[ProviderId::DuckDuckGo],
            )
            .unwrap();
        run.cancel();

        assert!(run.next().await.is_none());
    }

    #[test]
    fn test_guarded_passes_errors_through() {
        let result: Result<()> = tokio_test::block_on(guarded(
            Duration::from_secs(1),
            async { Err(SearchError::Transport("refused".into())) },
        ));
        assert_eq!(result, Err(SearchError::Transport("refused".into())));
    }
}
