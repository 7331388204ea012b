//! The notification channel and its supervisor task.

use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use parking_lot::Mutex;
use secrecy::{ExposeSecret, SecretString};
use tableside_core::Notification;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span, warn};
use url::Url;

use super::poller::{Poller, UnreadCountSource};
use super::state::{ConnectionState, RetryPolicy, Signal};
use super::stomp::Frame;
use super::transport::{Connector, Transport};
use super::{ChannelConfig, ChannelError, ChannelEvent, Retry, Viewer};

const SUBSCRIPTION_ID: &str = "sub-0";
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// A real-time notification channel for one viewer.
///
/// `connect()` is idempotent: while a connection is being established, is
/// live, or a reconnect is pending, further calls do nothing. `disconnect()`
/// tears down the transport, any pending reconnect timer and the offline
/// poller. Dropping the channel does the same without waiting.
pub struct NotificationChannel {
    viewer: Viewer,
    url: Url,
    config: ChannelConfig,
    connector: Arc<dyn Connector>,
    unread_source: Option<Arc<dyn UnreadCountSource>>,
    state: Arc<watch::Sender<ConnectionState>>,
    events: broadcast::Sender<ChannelEvent>,
    tasks: Mutex<Option<Tasks>>,
}

struct Tasks {
    shutdown: oneshot::Sender<()>,
    supervisor: JoinHandle<()>,
    poller: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationChannel")
            .field("viewer", &self.viewer)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl NotificationChannel {
    /// Create a disconnected channel.
    ///
    /// `token`, when present, is passed to the endpoint as the `token` query
    /// parameter.
    #[must_use]
    pub fn new(
        viewer: Viewer,
        ws_url: &Url,
        token: Option<&SecretString>,
        config: ChannelConfig,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let mut url = ws_url.clone();
        if let Some(token) = token {
            url.query_pairs_mut()
                .append_pair("token", token.expose_secret());
        }
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            viewer,
            url,
            config,
            connector,
            unread_source: None,
            state: Arc::new(watch::Sender::new(ConnectionState::default())),
            events,
            tasks: Mutex::new(None),
        }
    }

    /// Poll `source` for the unread count while the channel is offline.
    #[must_use]
    pub fn with_unread_source(mut self, source: Arc<dyn UnreadCountSource>) -> Self {
        self.unread_source = Some(source);
        self
    }

    #[must_use]
    pub const fn viewer(&self) -> Viewer {
        self.viewer
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Observe state changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Receive events from now on. Dropping the subscription unsubscribes.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.events.subscribe(),
        }
    }

    /// Start connecting.
    ///
    /// Returns `false` (and does nothing) if the channel is already
    /// connecting, connected or waiting to reconnect. Must be called from
    /// within a Tokio runtime.
    pub fn connect(&self) -> bool {
        let policy = self.config.retry_policy();
        let mut tasks = self.tasks.lock();
        if !apply(&self.state, Signal::Connect, &policy) {
            debug!(viewer = %self.viewer, state = %self.state(), "connect() ignored");
            return false;
        }

        // A previous session may have exhausted its retries and left the
        // poller running.
        if let Some(stale) = tasks.take() {
            stale.abort();
        }

        let span = info_span!("notification_channel", viewer = %self.viewer);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let supervisor = Supervisor {
            viewer: self.viewer,
            url: self.url.clone(),
            connector: Arc::clone(&self.connector),
            state: Arc::clone(&self.state),
            events: self.events.clone(),
            policy,
            handshake_timeout: self.config.handshake_timeout,
        };
        let supervisor = tokio::spawn(supervisor.run(shutdown_rx).instrument(span.clone()));

        let poller = self.unread_source.as_ref().map(|source| {
            let poller = Poller {
                viewer: self.viewer,
                source: Arc::clone(source),
                state: self.state.subscribe(),
                events: self.events.clone(),
                grace: self.config.poll_grace,
                interval: self.config.poll_interval,
            };
            tokio::spawn(poller.run().instrument(span))
        });

        *tasks = Some(Tasks {
            shutdown: shutdown_tx,
            supervisor,
            poller,
        });
        info!(viewer = %self.viewer, "Notification channel connecting");
        true
    }

    /// Tear down the connection, pending reconnects and the poller.
    ///
    /// Returns `false` if there was nothing to tear down. Waits briefly for
    /// the transport to close politely, then aborts.
    pub async fn disconnect(&self) -> bool {
        let tasks = {
            let mut slot = self.tasks.lock();
            apply(&self.state, Signal::Disconnect, &self.config.retry_policy());
            slot.take()
        };
        let Some(tasks) = tasks else {
            return false;
        };

        if let Some(poller) = tasks.poller {
            poller.abort();
        }
        let _ = tasks.shutdown.send(());
        let mut supervisor = tasks.supervisor;
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut supervisor)
            .await
            .is_err()
        {
            warn!(viewer = %self.viewer, "Channel did not shut down in time, aborting");
            supervisor.abort();
        }
        info!(viewer = %self.viewer, "Notification channel disconnected");
        true
    }
}

impl Drop for NotificationChannel {
    fn drop(&mut self) {
        apply(&self.state, Signal::Disconnect, &self.config.retry_policy());
        if let Some(tasks) = self.tasks.get_mut().take() {
            if let Some(poller) = tasks.poller {
                poller.abort();
            }
            // The supervisor owns its own handles and exits once signalled.
            let _ = tasks.shutdown.send(());
        }
    }
}

impl Tasks {
    fn abort(self) {
        if let Some(poller) = self.poller {
            poller.abort();
        }
        self.supervisor.abort();
    }
}

/// Apply a signal; returns whether the state changed.
fn apply(state: &watch::Sender<ConnectionState>, signal: Signal, policy: &RetryPolicy) -> bool {
    state.send_if_modified(|current| match current.next(signal, policy) {
        Some(next) => {
            debug!(from = %current, to = %next, ?signal, "Channel state change");
            *current = next;
            true
        }
        None => false,
    })
}

// =============================================================================
// Supervisor
// =============================================================================

struct Supervisor {
    viewer: Viewer,
    url: Url,
    connector: Arc<dyn Connector>,
    state: Arc<watch::Sender<ConnectionState>>,
    events: broadcast::Sender<ChannelEvent>,
    policy: RetryPolicy,
    handshake_timeout: Duration,
}

enum PumpEnd {
    Shutdown,
    Closed,
}

impl Supervisor {
    /// Drive the state machine until it goes idle, gives up, or is told to
    /// stop.
    async fn run(self, mut shutdown: oneshot::Receiver<()>) {
        loop {
            let current = *self.state.borrow();
            match current {
                ConnectionState::Connecting { attempt } => {
                    let outcome = tokio::select! {
                        biased;
                        _ = &mut shutdown => return,
                        outcome = tokio::time::timeout(self.handshake_timeout, self.handshake()) => outcome,
                    };
                    match outcome {
                        Ok(Ok(transport)) => {
                            if !apply(&self.state, Signal::HandshakeSucceeded, &self.policy) {
                                return;
                            }
                            info!(attempt, topic = %self.viewer.topic(), "Subscribed");
                            match self.pump(transport, &mut shutdown).await {
                                PumpEnd::Shutdown => return,
                                PumpEnd::Closed => {
                                    apply(&self.state, Signal::TransportClosed, &self.policy);
                                }
                            }
                        }
                        Ok(Err(e)) => {
                            warn!(attempt, error = %e, "Handshake failed");
                            apply(&self.state, Signal::HandshakeFailed, &self.policy);
                        }
                        Err(_elapsed) => {
                            warn!(attempt, error = %ChannelError::Timeout, "Handshake failed");
                            apply(&self.state, Signal::HandshakeFailed, &self.policy);
                        }
                    }
                }
                ConnectionState::Disconnected {
                    retry: Retry::Scheduled { attempt, delay },
                } => {
                    debug!(attempt, delay_ms = delay.as_millis(), "Reconnect scheduled");
                    tokio::select! {
                        biased;
                        _ = &mut shutdown => return,
                        () = tokio::time::sleep(delay) => {
                            apply(&self.state, Signal::RetryDue, &self.policy);
                        }
                    }
                }
                ConnectionState::Disconnected {
                    retry: Retry::Exhausted,
                } => {
                    warn!(
                        attempts = self.policy.max_attempts,
                        "Giving up on real-time channel until reconnected manually"
                    );
                    return;
                }
                ConnectionState::Disconnected { retry: Retry::Idle } | ConnectionState::Connected => {
                    return;
                }
            }
        }
    }

    /// Open a transport, complete the STOMP handshake and subscribe.
    async fn handshake(&self) -> Result<Box<dyn Transport>, ChannelError> {
        let mut transport = self.connector.connect(self.url.clone()).await?;
        let host = self.url.host_str().unwrap_or("localhost");
        transport.send(Frame::connect(host).encode()).await?;

        loop {
            let text = match transport.recv().await {
                Some(result) => result?,
                None => return Err(ChannelError::Closed),
            };
            match Frame::parse(&text) {
                Ok(None) => {}
                Ok(Some(frame)) if frame.command == "CONNECTED" => break,
                Ok(Some(frame)) if frame.command == "ERROR" => {
                    let reason = frame
                        .get_header("message")
                        .map_or_else(|| frame.body.clone(), str::to_string);
                    return Err(ChannelError::Handshake(reason));
                }
                Ok(Some(frame)) => {
                    debug!(command = %frame.command, "Ignoring frame during handshake");
                }
                Err(e) => return Err(ChannelError::Handshake(e.to_string())),
            }
        }

        transport
            .send(Frame::subscribe(SUBSCRIPTION_ID, &self.viewer.destination()).encode())
            .await?;
        Ok(transport)
    }

    /// Forward inbound messages until the transport ends or shutdown is
    /// requested.
    async fn pump(
        &self,
        mut transport: Box<dyn Transport>,
        shutdown: &mut oneshot::Receiver<()>,
    ) -> PumpEnd {
        loop {
            tokio::select! {
                biased;
                _ = &mut *shutdown => {
                    if let Err(e) = transport.send(Frame::disconnect().encode()).await {
                        debug!(error = %e, "DISCONNECT not delivered");
                    }
                    transport.close().await;
                    return PumpEnd::Shutdown;
                }
                inbound = transport.recv() => match inbound {
                    Some(Ok(text)) => dispatch(&text, &self.events),
                    Some(Err(e)) => {
                        warn!(error = %e, "Transport failed");
                        return PumpEnd::Closed;
                    }
                    None => {
                        info!("Transport closed by peer");
                        return PumpEnd::Closed;
                    }
                },
            }
        }
    }
}

/// Handle one inbound message. Anything malformed is logged and dropped.
fn dispatch(text: &str, events: &broadcast::Sender<ChannelEvent>) {
    let frame = match Frame::parse(text) {
        Ok(Some(frame)) => frame,
        Ok(None) => return,
        Err(e) => {
            warn!(error = %e, "Dropping malformed frame");
            return;
        }
    };

    match frame.command.as_str() {
        "MESSAGE" => match serde_json::from_str::<Notification>(&frame.body) {
            Ok(notification) => {
                debug!(notification_id = %notification.id, "Notification received");
                let _ = events.send(ChannelEvent::Notification(notification));
            }
            Err(e) => warn!(error = %e, "Dropping malformed notification payload"),
        },
        "ERROR" => warn!(
            reason = frame.get_header("message").unwrap_or_default(),
            "Broker reported an error"
        ),
        "RECEIPT" => {}
        other => debug!(command = other, "Ignoring frame"),
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// A subscriber's view of the channel's events.
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<ChannelEvent>,
}

impl Subscription {
    /// Next event, or `None` once the channel is gone. Events missed because
    /// this subscriber fell behind are skipped with a warning.
    pub async fn recv(&mut self) -> Option<ChannelEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Subscriber lagged, events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-delivered event, without waiting.
    pub fn try_recv(&mut self) -> Option<ChannelEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Subscriber lagged, events dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Consume the subscription as a stream.
    pub fn into_stream(mut self) -> impl Stream<Item = ChannelEvent> + Send {
        async_stream::stream! {
            while let Some(event) = self.recv().await {
                yield event;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use futures::future::BoxFuture;
    use tableside_core::{NotificationId, StoreId};
    use tokio::sync::mpsc;

    use super::*;
    use crate::gateway::GatewayError;

    const NOTIFICATION_JSON: &str = r#"{"id":9,"orderId":100,"storeId":1,"targetType":"ADMIN","message":"New order A-001","type":"ORDER_RECEIVED","isRead":false,"sentAt":"2024-05-01T10:00:00"}"#;

    /// In-memory broker: answers CONNECT, counts SUBSCRIBE/DISCONNECT and
    /// lets the test push raw frames.
    #[derive(Default)]
    struct MockBroker {
        refuse: AtomicBool,
        attempts: AtomicU32,
        subscribes: AtomicU32,
        disconnects: AtomicU32,
        push: Mutex<Option<mpsc::UnboundedSender<Option<String>>>>,
    }

    impl MockBroker {
        fn push(&self, raw: &str) {
            let tx = self.push.lock();
            tx.as_ref().unwrap().send(Some(raw.to_string())).unwrap();
        }

        fn close(&self) {
            let tx = self.push.lock();
            tx.as_ref().unwrap().send(None).unwrap();
        }
    }

    struct MockConnector(Arc<MockBroker>);

    impl Connector for MockConnector {
        fn connect(&self, _url: Url) -> BoxFuture<'static, Result<Box<dyn Transport>, ChannelError>> {
            let broker = Arc::clone(&self.0);
            Box::pin(async move {
                broker.attempts.fetch_add(1, Ordering::SeqCst);
                if broker.refuse.load(Ordering::SeqCst) {
                    return Err(ChannelError::Transport("connection refused".into()));
                }
                let (tx, rx) = mpsc::unbounded_channel();
                *broker.push.lock() = Some(tx);
                Ok(Box::new(MockTransport {
                    broker,
                    inbound: rx,
                    pending: VecDeque::new(),
                }) as Box<dyn Transport>)
            })
        }
    }

    struct MockTransport {
        broker: Arc<MockBroker>,
        inbound: mpsc::UnboundedReceiver<Option<String>>,
        pending: VecDeque<String>,
    }

    impl Transport for MockTransport {
        fn send(&mut self, text: String) -> BoxFuture<'_, Result<(), ChannelError>> {
            Box::pin(async move {
                let frame = Frame::parse(&text).unwrap().unwrap();
                match frame.command.as_str() {
                    "CONNECT" => self
                        .pending
                        .push_back("CONNECTED\nversion:1.2\n\n\0".to_string()),
                    "SUBSCRIBE" => {
                        self.broker.subscribes.fetch_add(1, Ordering::SeqCst);
                    }
                    "DISCONNECT" => {
                        self.broker.disconnects.fetch_add(1, Ordering::SeqCst);
                    }
                    _ => {}
                }
                Ok(())
            })
        }

        fn recv(&mut self) -> BoxFuture<'_, Option<Result<String, ChannelError>>> {
            Box::pin(async move {
                if let Some(text) = self.pending.pop_front() {
                    return Some(Ok(text));
                }
                self.inbound.recv().await.flatten().map(Ok)
            })
        }

        fn close(&mut self) -> BoxFuture<'_, ()> {
            Box::pin(async {})
        }
    }

    struct FixedCount(u64);

    impl UnreadCountSource for FixedCount {
        fn fetch_unread_count(&self, _viewer: Viewer) -> BoxFuture<'_, Result<u64, GatewayError>> {
            let count = self.0;
            Box::pin(async move { Ok(count) })
        }
    }

    fn channel(broker: &Arc<MockBroker>) -> NotificationChannel {
        NotificationChannel::new(
            Viewer::Admin {
                store_id: StoreId::new(1),
            },
            &Url::parse("ws://localhost:8080/ws").unwrap(),
            Some(&SecretString::from("tok")),
            ChannelConfig::default(),
            Arc::new(MockConnector(Arc::clone(broker))),
        )
    }

    async fn wait_until(channel: &NotificationChannel, f: impl FnMut(&ConnectionState) -> bool) {
        let mut rx = channel.watch_state();
        rx.wait_for(f).await.unwrap();
    }

    fn message(body: &str) -> String {
        format!("MESSAGE\ndestination:/topic/admin/1\nsubscription:sub-0\n\n{body}\0")
    }

    #[test]
    fn test_token_is_passed_as_query() {
        let broker = Arc::new(MockBroker::default());
        let channel = channel(&broker);
        assert_eq!(channel.url.as_str(), "ws://localhost:8080/ws?token=tok");
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_twice_subscribes_once() {
        let broker = Arc::new(MockBroker::default());
        let channel = channel(&broker);

        assert!(channel.connect());
        assert!(!channel.connect());
        wait_until(&channel, ConnectionState::is_connected).await;
        assert!(!channel.connect());

        assert_eq!(broker.attempts.load(Ordering::SeqCst), 1);
        assert_eq!(broker.subscribes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_payloads_are_dropped() {
        let broker = Arc::new(MockBroker::default());
        let channel = channel(&broker);
        let mut events = channel.subscribe();
        channel.connect();
        wait_until(&channel, ConnectionState::is_connected).await;

        broker.push("this is not stomp");
        broker.push(&message("{not json"));
        broker.push(&message(r#"{"id":"nine"}"#));
        broker.push(&message(NOTIFICATION_JSON));

        let Some(ChannelEvent::Notification(notification)) = events.recv().await else {
            panic!("expected a notification");
        };
        assert_eq!(notification.id, NotificationId::new(9));
        assert!(events.try_recv().is_none());
        assert_eq!(channel.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_undecodable_binary_frame_keeps_connection() {
        use futures::{SinkExt, StreamExt};
        use tokio::net::TcpListener;
        use tokio_tungstenite::tungstenite::Message;

        use crate::realtime::WsConnector;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (pushed_tx, pushed_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            // CONNECT, then SUBSCRIBE.
            ws.next().await.unwrap().unwrap();
            ws.send(Message::Text("CONNECTED\nversion:1.2\n\n\0".into()))
                .await
                .unwrap();
            ws.next().await.unwrap().unwrap();
            pushed_rx.await.unwrap();
            ws.send(Message::Binary(vec![0xff, 0xfe, 0x00].into())).await.unwrap();
            ws.send(Message::Text(message(NOTIFICATION_JSON).into()))
                .await
                .unwrap();
            // Hold the socket open until the client leaves.
            while let Some(Ok(_)) = ws.next().await {}
        });

        let channel = NotificationChannel::new(
            Viewer::Admin {
                store_id: StoreId::new(1),
            },
            &Url::parse(&format!("ws://{addr}/ws")).unwrap(),
            None,
            ChannelConfig::default(),
            Arc::new(WsConnector),
        );
        let mut events = channel.subscribe();
        let mut state = channel.watch_state();
        channel.connect();
        state.wait_for(ConnectionState::is_connected).await.unwrap();
        state.mark_unchanged();
        pushed_tx.send(()).unwrap();

        let received = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap();
        let Some(ChannelEvent::Notification(notification)) = received else {
            panic!("expected a notification");
        };
        assert_eq!(notification.id, NotificationId::new(9));
        assert!(!state.has_changed().unwrap());
        assert_eq!(channel.state(), ConnectionState::Connected);

        assert!(channel.disconnect().await);
        server.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_five_failed_handshakes() {
        let broker = Arc::new(MockBroker::default());
        broker.refuse.store(true, Ordering::SeqCst);
        let channel = channel(&broker);

        channel.connect();
        wait_until(&channel, |s| {
            *s == ConnectionState::Disconnected {
                retry: Retry::Exhausted,
            }
        })
        .await;
        tokio::time::sleep(Duration::from_secs(600)).await;

        assert_eq!(broker.attempts.load(Ordering::SeqCst), 5);

        // A manual connect starts a fresh round.
        broker.refuse.store(false, Ordering::SeqCst);
        assert!(channel.connect());
        wait_until(&channel, ConnectionState::is_connected).await;
        assert_eq!(broker.attempts.load(Ordering::SeqCst), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnects_after_transport_close() {
        let broker = Arc::new(MockBroker::default());
        let channel = channel(&broker);
        channel.connect();
        wait_until(&channel, ConnectionState::is_connected).await;

        broker.close();
        wait_until(&channel, |s| !s.is_connected()).await;
        wait_until(&channel, ConnectionState::is_connected).await;

        assert_eq!(broker.attempts.load(Ordering::SeqCst), 2);
        assert_eq!(broker.subscribes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_tears_down_once() {
        let broker = Arc::new(MockBroker::default());
        let channel = channel(&broker);
        channel.connect();
        wait_until(&channel, ConnectionState::is_connected).await;

        assert!(channel.disconnect().await);
        assert!(!channel.disconnect().await);
        assert_eq!(channel.state(), ConnectionState::default());
        assert_eq!(broker.disconnects.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(broker.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_cancels_pending_reconnect() {
        let broker = Arc::new(MockBroker::default());
        broker.refuse.store(true, Ordering::SeqCst);
        let channel = channel(&broker);
        channel.connect();
        wait_until(&channel, |s| {
            matches!(
                s,
                ConnectionState::Disconnected {
                    retry: Retry::Scheduled { .. }
                }
            )
        })
        .await;

        assert!(channel.disconnect().await);
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(broker.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_unread_count_while_offline() {
        let broker = Arc::new(MockBroker::default());
        broker.refuse.store(true, Ordering::SeqCst);
        let channel = channel(&broker).with_unread_source(Arc::new(FixedCount(7)));
        let mut events = channel.subscribe();

        channel.connect();
        assert_eq!(events.recv().await, Some(ChannelEvent::UnreadCount(7)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_polling_while_connected() {
        let broker = Arc::new(MockBroker::default());
        let channel = channel(&broker).with_unread_source(Arc::new(FixedCount(7)));
        let mut events = channel.subscribe();

        channel.connect();
        wait_until(&channel, ConnectionState::is_connected).await;
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(events.try_recv().is_none());
    }
}
