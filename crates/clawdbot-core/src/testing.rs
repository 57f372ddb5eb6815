//! Scripted providers shared by the unit tests.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use clawdbot_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderConfig,
};

use crate::llm::box_provider::BoxLlmProvider;
use crate::llm::provider::LlmProvider;
use crate::llm::registry::ProviderRegistry;

#[derive(Clone)]
pub(crate) enum Behavior {
    Succeed { delay: Duration },
    Fail(LlmError),
    Hang,
}

#[derive(Default)]
pub(crate) struct Calls {
    pub completions: AtomicUsize,
    pub probes: AtomicUsize,
    probes_in_flight: AtomicUsize,
    pub max_concurrent_probes: AtomicUsize,
}

impl Calls {
    pub fn completions(&self) -> usize {
        self.completions.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn max_concurrent_probes(&self) -> usize {
        self.max_concurrent_probes.load(Ordering::SeqCst)
    }
}

pub(crate) struct MockProvider {
    config: ProviderConfig,
    complete: Behavior,
    probe: Behavior,
    calls: Arc<Calls>,
}

impl MockProvider {
    pub fn local(id: &str) -> Self {
        Self::with_config(ProviderConfig::local(
            id,
            format!("http://{}.test/v1", id.to_lowercase()),
            format!("{}-model", id.to_lowercase()),
            Duration::from_secs(60),
        ))
    }

    pub fn fallback(id: &str) -> Self {
        Self::with_config(ProviderConfig::fallback(
            id,
            format!("https://{}.test/v1", id.to_lowercase()),
            format!("{}-model", id.to_lowercase()),
            Duration::from_secs(30),
            None,
        ))
    }

    fn with_config(config: ProviderConfig) -> Self {
        Self {
            config,
            complete: Behavior::Succeed {
                delay: Duration::ZERO,
            },
            probe: Behavior::Succeed {
                delay: Duration::ZERO,
            },
            calls: Arc::new(Calls::default()),
        }
    }

    pub fn completing_after(mut self, delay: Duration) -> Self {
        self.complete = Behavior::Succeed { delay };
        self
    }

    pub fn failing(mut self, error: LlmError) -> Self {
        self.complete = Behavior::Fail(error);
        self
    }

    pub fn hanging(mut self) -> Self {
        self.complete = Behavior::Hang;
        self
    }

    pub fn probing_after(mut self, delay: Duration) -> Self {
        self.probe = Behavior::Succeed { delay };
        self
    }

    pub fn probe_failing(mut self, error: LlmError) -> Self {
        self.probe = Behavior::Fail(error);
        self
    }

    pub fn probe_hanging(mut self) -> Self {
        self.probe = Behavior::Hang;
        self
    }

    pub fn calls(&self) -> Arc<Calls> {
        Arc::clone(&self.calls)
    }
}

async fn run(behavior: Behavior) -> Result<(), LlmError> {
    match behavior {
        Behavior::Succeed { delay } => {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Ok(())
        }
        Behavior::Fail(err) => Err(err),
        Behavior::Hang => std::future::pending().await,
    }
}

impl LlmProvider for MockProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, LlmError>> + Send {
        self.calls.completions.fetch_add(1, Ordering::SeqCst);
        let behavior = self.complete.clone();
        let id = self.config.id.clone();
        let model = request.model.clone();
        async move {
            run(behavior).await?;
            Ok(CompletionResponse {
                id: format!("resp-{id}"),
                content: format!("Hello from {id}"),
                model,
            })
        }
    }

    fn probe(&self) -> impl Future<Output = Result<(), LlmError>> + Send {
        let behavior = self.probe.clone();
        let calls = Arc::clone(&self.calls);
        async move {
            calls.probes.fetch_add(1, Ordering::SeqCst);
            let now = calls.probes_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            calls.max_concurrent_probes.fetch_max(now, Ordering::SeqCst);
            let result = run(behavior).await;
            calls.probes_in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }
}

pub(crate) fn registry(providers: Vec<MockProvider>) -> Arc<ProviderRegistry> {
    Arc::new(
        ProviderRegistry::new(providers.into_iter().map(BoxLlmProvider::new).collect())
            .expect("valid test registry"),
    )
}
