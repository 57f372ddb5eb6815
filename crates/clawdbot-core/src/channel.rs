//! Inbound/outbound message channel port.
//!
//! The relay is agnostic to the chat protocol: a transport adapter supplies
//! a [`MessageSource`] of `(principal, text)` pairs and a [`ReplySink`] that
//! accepts replies. [`memory_channel`] provides an in-process pair backed by
//! tokio mpsc channels.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;

use clawdbot_types::error::ChannelError;
use clawdbot_types::message::{InboundMessage, OutboundMessage, Principal};

use crate::lifecycle::Lifecycle;
use crate::relay::RelayService;

/// Stream of inbound messages. `None` means the transport is closed.
pub trait MessageSource: Send {
    fn recv(&mut self) -> impl Future<Output = Option<InboundMessage>> + Send;

    /// A message that is already buffered, without waiting.
    fn try_recv(&mut self) -> Option<InboundMessage> {
        None
    }
}

/// Delivery of replies back to the transport.
pub trait ReplySink: Send + Sync + 'static {
    fn send(
        &self,
        reply: OutboundMessage,
    ) -> impl Future<Output = Result<(), ChannelError>> + Send;
}

/// Pump messages from `source` through `service` until the transport closes
/// or the lifecycle is cancelled.
///
/// Each message runs on its own tracked task so a slow provider never stalls
/// unrelated messages, and the lifecycle drain waits for all of them. Messages
/// still buffered at cancellation get [`RelayService::rejection`] instead of
/// being handled.
pub async fn run_relay<S, R>(
    mut source: S,
    sink: Arc<R>,
    service: Arc<RelayService>,
    lifecycle: Arc<Lifecycle>,
) where
    S: MessageSource,
    R: ReplySink,
{
    loop {
        let message = tokio::select! {
            biased;
            _ = lifecycle.cancelled() => {
                let rejected = reject_buffered(&mut source, &sink, &service, &lifecycle);
                tracing::info!(rejected, "Relay stopped accepting messages");
                break;
            }
            message = source.recv() => match message {
                Some(message) => message,
                None => {
                    tracing::info!("Inbound channel closed");
                    break;
                }
            },
        };

        let service = Arc::clone(&service);
        let sink = Arc::clone(&sink);
        lifecycle.spawn(async move {
            if let Some(text) = service.handle(&message).await {
                deliver(&*sink, message.principal, text).await;
            }
        });
    }
}

fn reject_buffered<S, R>(
    source: &mut S,
    sink: &Arc<R>,
    service: &RelayService,
    lifecycle: &Lifecycle,
) -> usize
where
    S: MessageSource,
    R: ReplySink,
{
    let mut rejected = 0;
    while let Some(message) = source.try_recv() {
        let text = service.rejection(&message);
        let sink = Arc::clone(sink);
        lifecycle.spawn(async move { deliver(&*sink, message.principal, text).await });
        rejected += 1;
    }
    rejected
}

async fn deliver<R: ReplySink>(sink: &R, principal: Principal, text: String) {
    if let Err(err) = sink
        .send(OutboundMessage {
            principal: principal.clone(),
            text,
        })
        .await
    {
        tracing::warn!(%principal, error = %err, "Failed to deliver reply");
    }
}

/// Receiving half handed to [`run_relay`].
#[derive(Debug)]
pub struct MpscSource {
    rx: mpsc::Receiver<InboundMessage>,
}

impl MessageSource for MpscSource {
    fn recv(&mut self) -> impl Future<Output = Option<InboundMessage>> + Send {
        self.rx.recv()
    }

    fn try_recv(&mut self) -> Option<InboundMessage> {
        self.rx.try_recv().ok()
    }
}

/// Reply half handed to [`run_relay`].
#[derive(Debug, Clone)]
pub struct MpscSink {
    tx: mpsc::Sender<OutboundMessage>,
}

impl ReplySink for MpscSink {
    fn send(
        &self,
        reply: OutboundMessage,
    ) -> impl Future<Output = Result<(), ChannelError>> + Send {
        let tx = self.tx.clone();
        async move { tx.send(reply).await.map_err(|_| ChannelError::Closed) }
    }
}

/// The transport side of an in-process channel.
#[derive(Debug)]
pub struct ChannelHandle {
    inbound: mpsc::Sender<InboundMessage>,
    replies: mpsc::Receiver<OutboundMessage>,
}

impl ChannelHandle {
    /// Hand an inbound message to the relay.
    pub async fn deliver(&self, message: InboundMessage) -> Result<(), ChannelError> {
        self.inbound
            .send(message)
            .await
            .map_err(|_| ChannelError::Closed)
    }

    /// Next reply from the relay; `None` once the relay side is gone.
    pub async fn next_reply(&mut self) -> Option<OutboundMessage> {
        self.replies.recv().await
    }

    /// Split into the inbound sender and reply receiver, for adapters that
    /// pump each direction on its own task.
    pub fn split(self) -> (mpsc::Sender<InboundMessage>, mpsc::Receiver<OutboundMessage>) {
        (self.inbound, self.replies)
    }
}

/// Build an in-process channel with bounded buffers in both directions.
pub fn memory_channel(capacity: usize) -> (ChannelHandle, MpscSource, MpscSink) {
    let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
    let (reply_tx, reply_rx) = mpsc::channel(capacity);
    (
        ChannelHandle {
            inbound: inbound_tx,
            replies: reply_rx,
        },
        MpscSource { rx: inbound_rx },
        MpscSink { tx: reply_tx },
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clawdbot_types::command::ExitIntent;

    use super::*;
    use crate::access::{AccessGate, DENIED_REPLY};
    use crate::dispatch::{CommandDispatcher, SHUTDOWN_REPLY};
    use crate::llm::health::{DEFAULT_PROBE_TIMEOUT, HealthBoard, HealthProber};
    use crate::lifecycle::drain_grace;
    use crate::llm::registry::ProviderRegistry;
    use crate::llm::router::FailoverRouter;
    use crate::relay::SHUTTING_DOWN_REPLY;
    use crate::stats::StatsTracker;
    use crate::testing::{MockProvider, registry};

    fn service(providers: Vec<MockProvider>, lifecycle: &Arc<Lifecycle>) -> Arc<RelayService> {
        service_with(registry(providers), lifecycle)
    }

    fn service_with(
        registry: Arc<ProviderRegistry>,
        lifecycle: &Arc<Lifecycle>,
    ) -> Arc<RelayService> {
        let board = Arc::new(HealthBoard::new());
        let stats = Arc::new(StatsTracker::new());
        let prober = Arc::new(HealthProber::new(
            Arc::clone(&registry),
            Arc::clone(&board),
            DEFAULT_PROBE_TIMEOUT,
        ));
        let router = Arc::new(FailoverRouter::new(registry, board, Arc::clone(&stats)));
        let dispatcher = CommandDispatcher::new(prober, stats, Arc::clone(lifecycle));
        Arc::new(RelayService::new(
            AccessGate::new([Principal::from("111"), Principal::from("333")]),
            dispatcher,
            router,
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_request_does_not_block_others() {
        let lifecycle = Arc::new(Lifecycle::new());
        let service = service(
            vec![MockProvider::local("LOCAL").completing_after(Duration::from_secs(20))],
            &lifecycle,
        );
        let (mut handle, source, sink) = memory_channel(8);
        let relay = tokio::spawn(run_relay(
            source,
            Arc::new(sink),
            service,
            Arc::clone(&lifecycle),
        ));

        handle.deliver(InboundMessage::new("111", "slow question")).await.unwrap();
        handle.deliver(InboundMessage::new("222", "hello")).await.unwrap();

        let first = handle.next_reply().await.unwrap();
        assert_eq!(first.principal, Principal::from("222"));
        assert_eq!(first.text, DENIED_REPLY);

        let second = handle.next_reply().await.unwrap();
        assert_eq!(second.principal, Principal::from("111"));
        assert_eq!(second.text, "Hello from LOCAL");

        lifecycle.request(ExitIntent::Shutdown);
        relay.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_drains_in_flight_requests() {
        let lifecycle = Arc::new(Lifecycle::new());
        let service = service(
            vec![MockProvider::local("LOCAL").completing_after(Duration::from_secs(5))],
            &lifecycle,
        );
        let (mut handle, source, sink) = memory_channel(8);
        let relay = tokio::spawn(run_relay(
            source,
            Arc::new(sink),
            service,
            Arc::clone(&lifecycle),
        ));

        handle.deliver(InboundMessage::new("111", "long answer please")).await.unwrap();
        handle.deliver(InboundMessage::new("333", "/shutdown")).await.unwrap();

        let ack = handle.next_reply().await.unwrap();
        assert_eq!(ack.text, SHUTDOWN_REPLY);
        relay.await.unwrap();

        assert!(lifecycle.drain(Duration::from_secs(65)).await);
        let answer = handle.next_reply().await.unwrap();
        assert_eq!(answer.text, "Hello from LOCAL");
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_grace_covers_full_failover_chain() {
        let lifecycle = Arc::new(Lifecycle::new());
        let registry = registry(vec![
            MockProvider::local("LOCAL").hanging(),
            MockProvider::fallback("OPENAI").completing_after(Duration::from_secs(20)),
        ]);
        let grace = drain_grace(registry.total_timeout());
        let service = service_with(registry, &lifecycle);
        let (mut handle, source, sink) = memory_channel(8);
        let relay = tokio::spawn(run_relay(
            source,
            Arc::new(sink),
            service,
            Arc::clone(&lifecycle),
        ));

        handle.deliver(InboundMessage::new("111", "question")).await.unwrap();
        while lifecycle.in_flight() == 0 {
            tokio::task::yield_now().await;
        }
        lifecycle.request(ExitIntent::Shutdown);
        relay.await.unwrap();

        // LOCAL times out at 60s, OPENAI answers 20s later.
        assert!(lifecycle.drain(grace).await);
        let answer = handle.next_reply().await.unwrap();
        assert_eq!(answer.text, "Hello from OPENAI\n\n(via OPENAI)");
    }

    #[tokio::test]
    async fn test_messages_buffered_at_shutdown_get_rejection() {
        let lifecycle = Arc::new(Lifecycle::new());
        let local = MockProvider::local("LOCAL");
        let calls = local.calls();
        let service = service(vec![local], &lifecycle);
        let (mut handle, source, sink) = memory_channel(8);

        handle.deliver(InboundMessage::new("111", "first")).await.unwrap();
        handle.deliver(InboundMessage::new("222", "second")).await.unwrap();
        lifecycle.request(ExitIntent::Shutdown);

        run_relay(source, Arc::new(sink), service, Arc::clone(&lifecycle)).await;
        assert!(lifecycle.drain(Duration::from_secs(5)).await);

        let mut replies = vec![
            handle.next_reply().await.unwrap(),
            handle.next_reply().await.unwrap(),
        ];
        replies.sort_by(|a, b| a.principal.cmp(&b.principal));
        assert_eq!(replies[0].principal, Principal::from("111"));
        assert_eq!(replies[0].text, SHUTTING_DOWN_REPLY);
        assert_eq!(replies[1].principal, Principal::from("222"));
        assert_eq!(replies[1].text, DENIED_REPLY);
        assert_eq!(calls.completions(), 0);
    }

    #[tokio::test]
    async fn test_relay_stops_when_transport_closes() {
        let lifecycle = Arc::new(Lifecycle::new());
        let service = service(vec![MockProvider::local("LOCAL")], &lifecycle);
        let (handle, source, sink) = memory_channel(1);
        drop(handle);

        run_relay(source, Arc::new(sink), service, Arc::clone(&lifecycle)).await;
        assert!(!lifecycle.is_cancelled());
    }
}
