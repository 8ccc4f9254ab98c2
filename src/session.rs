//! Peer session: one live connection to a remote Lightning node.
//!
//! A session owns three tasks that share a [`Transport`]:
//!
//! - the receive loop reads, decodes and reacts to inbound messages,
//! - the send loop drains the outbound queue in arrival order,
//! - the keepalive timer periodically queues a `ping`.
//!
//! The tasks only talk to each other through the outbound queue. Stopping
//! the session cancels all three and waits for them to finish.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::Rng;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::SessionConfig;
use crate::error::{SessionError, TransportError};
use crate::peer::PeerAddress;
use crate::transport::Transport;
use crate::wire::constants::PONG_SUPPRESS_THRESHOLD;
use crate::wire::{codec, payload, Message, MessageView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// `init` has been sent and the tasks are running.
    Ready,
    Stopped,
}

/// Producer side of a session's outbound queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Outbound {
    tx: mpsc::UnboundedSender<Message>,
    running: Arc<AtomicBool>,
}

impl Outbound {
    /// Queues a message behind everything already queued.
    pub fn send(&self, message: Message) -> Result<(), SessionError> {
        if !self.running.load(Ordering::Acquire) {
            return Err(SessionError::NotRunning);
        }
        self.tx.send(message).map_err(|_| SessionError::NotRunning)
    }
}

/// Decoded messages received from the peer, in arrival order.
///
/// Holds at most [`SessionConfig::inbound_capacity`] undelivered messages.
/// While it is full, newly received messages are still answered but are
/// dropped instead of delivered, so an owner that never drains it costs
/// bounded memory.
#[derive(Debug)]
pub struct Inbound {
    rx: mpsc::Receiver<Message>,
}

impl Inbound {
    /// Waits for the next message. Returns `None` once the session has
    /// stopped and every delivered message has been taken.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Message> {
        self.rx.try_recv().ok()
    }
}

/// Handle to a running session.
#[derive(Debug)]
pub struct PeerSession {
    peer: PeerAddress,
    outbound: Outbound,
    running: Arc<AtomicBool>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<Result<(), SessionError>>>,
}

impl PeerSession {
    /// Sends the opening `init` over `transport` and starts the session
    /// tasks.
    ///
    /// The `init` goes out before anything else, so nothing queued later can
    /// overtake it.
    ///
    /// # Errors
    ///
    /// Fails if the `init` cannot be built from `config` or the transport
    /// rejects it. No task is started in that case.
    pub async fn start<T: Transport>(
        peer: PeerAddress,
        transport: Arc<T>,
        config: SessionConfig,
    ) -> Result<(Self, Inbound), SessionError> {
        let init = payload::build_init(&[], &config.init_local_features, &[])?;
        let bytes = init.encode();
        transport.send_message(&bytes).await?;
        debug!(peer = %peer, type_id = init.type_id(), len = bytes.len(), "sent init");

        let running = Arc::new(AtomicBool::new(true));
        let cancel = CancellationToken::new();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::channel(config.inbound_capacity.max(1));

        let mut tasks = vec![
            spawn_task(
                "receive",
                &peer,
                &running,
                &cancel,
                receive_loop(
                    peer.clone(),
                    cancel.clone(),
                    Arc::clone(&transport),
                    config.clone(),
                    out_tx.clone(),
                    in_tx,
                ),
            ),
            spawn_task(
                "send",
                &peer,
                &running,
                &cancel,
                send_loop(peer.clone(), cancel.clone(), transport, out_rx),
            ),
        ];

        if config.ping_interval_secs > 0 {
            tasks.push(spawn_task(
                "keepalive",
                &peer,
                &running,
                &cancel,
                keepalive_loop(peer.clone(), cancel.clone(), config, out_tx.clone()),
            ));
        }

        info!(peer = %peer, "session started");

        let session = Self {
            peer,
            outbound: Outbound {
                tx: out_tx,
                running: Arc::clone(&running),
            },
            running,
            cancel,
            tasks,
        };

        Ok((session, Inbound { rx: in_rx }))
    }

    pub fn peer(&self) -> &PeerAddress {
        &self.peer
    }

    /// A producer for the outbound queue that can be moved to other tasks.
    pub fn outbound(&self) -> Outbound {
        self.outbound.clone()
    }

    /// Queues `message` for sending.
    pub fn send(&self, message: Message) -> Result<(), SessionError> {
        self.outbound.send(message)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn state(&self) -> SessionState {
        if self.is_running() {
            SessionState::Ready
        } else {
            SessionState::Stopped
        }
    }

    /// Resolves once the session has stopped, either through [`stop`] or
    /// because a task hit a fatal error.
    ///
    /// [`stop`]: PeerSession::stop
    pub async fn closed(&self) {
        self.cancel.cancelled().await
    }

    /// Cancels every task and waits for them to finish.
    ///
    /// Returns the fatal error that ended the session, if any. Calling this
    /// again after the tasks have been joined is a no-op.
    pub async fn stop(&mut self) -> Result<(), SessionError> {
        if self.tasks.is_empty() {
            return Ok(());
        }

        // Refuse new sends before the send loop goes away.
        self.running.store(false, Ordering::Release);
        self.cancel.cancel();

        let mut first_error = None;
        for task in self.tasks.drain(..) {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
                Err(e) => warn!(peer = %self.peer, error = %e, "session task panicked"),
            }
        }

        info!(peer = %self.peer, "session stopped");

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for PeerSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawns one session task. When it returns, for any reason, the whole
/// session is marked stopped and the other tasks are cancelled.
fn spawn_task<F>(
    name: &'static str,
    peer: &PeerAddress,
    running: &Arc<AtomicBool>,
    cancel: &CancellationToken,
    task: F,
) -> JoinHandle<Result<(), SessionError>>
where
    F: Future<Output = Result<(), SessionError>> + Send + 'static,
{
    let peer = peer.clone();
    let running = Arc::clone(running);
    let cancel = cancel.clone();

    tokio::spawn(async move {
        let result = task.await;
        if let Err(e) = &result {
            error!(peer = %peer, task = name, error = %e, "session failed");
        }
        running.store(false, Ordering::Release);
        cancel.cancel();
        result
    })
}

async fn receive_loop<T: Transport>(
    peer: PeerAddress,
    cancel: CancellationToken,
    transport: Arc<T>,
    config: SessionConfig,
    outbound: mpsc::UnboundedSender<Message>,
    inbound: mpsc::Sender<Message>,
) -> Result<(), SessionError> {
    let max_failures = config.max_consecutive_failures;
    let mut failures = 0u32;

    loop {
        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            read = transport.read_message() => read,
        };

        let bytes = match read {
            Ok(bytes) => bytes,
            Err(TransportError::Closed) => return Err(TransportError::Closed.into()),
            Err(e) => {
                failures += 1;
                warn!(peer = %peer, error = %e, failures, "read failed");
                check_failures(failures, max_failures)?;

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Ok(()),
                    _ = time::sleep(config.read_retry_delay()) => {}
                }
                continue;
            }
        };

        let message = match codec::dispatch(&bytes) {
            Ok(message) => message,
            Err(e) => {
                failures += 1;
                warn!(
                    peer = %peer,
                    error = %e,
                    len = bytes.len(),
                    failures,
                    "dropping undecodable message"
                );
                check_failures(failures, max_failures)?;
                continue;
            }
        };
        failures = 0;

        debug!(
            peer = %peer,
            type_id = message.type_id(),
            len = bytes.len(),
            "received {}",
            message.type_name()
        );

        if let Some(reply) = respond_to(&message) {
            if outbound.send(reply).is_err() {
                return Ok(());
            }
        }

        // A dropped Inbound is fine: the peer is still served.
        if let Err(TrySendError::Full(dropped)) = inbound.try_send(message) {
            warn!(
                peer = %peer,
                type_id = dropped.type_id(),
                "inbound queue full, dropping message"
            );
        }
    }
}

fn check_failures(count: u32, max: u32) -> Result<(), SessionError> {
    if count > max {
        Err(SessionError::TooManyFailures { count })
    } else {
        Ok(())
    }
}

/// The automatic reply to an inbound message, if it calls for one.
///
/// - `ping`: a `pong` of `num_pong_bytes` zero bytes, unless the ping asks
///   for 65532 bytes or more, which by BOLT 1 means no reply.
/// - `gossip_timestamp_filter`: a `query_short_channel_ids` on the same
///   chain with an empty id list.
fn respond_to(message: &Message) -> Option<Message> {
    match message.view() {
        MessageView::Ping(ping) if ping.num_pong_bytes < PONG_SUPPRESS_THRESHOLD => {
            Some(payload::build_pong_for(&ping))
        }
        MessageView::GossipTimestampFilter(filter) => {
            payload::build_query_short_channel_ids(filter.chain_hash, &[]).ok()
        }
        _ => None,
    }
}

async fn send_loop<T: Transport>(
    peer: PeerAddress,
    cancel: CancellationToken,
    transport: Arc<T>,
    mut queue: mpsc::UnboundedReceiver<Message>,
) -> Result<(), SessionError> {
    loop {
        let message = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            next = queue.recv() => match next {
                Some(message) => message,
                None => return Ok(()),
            },
        };

        let bytes = message.encode();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            sent = transport.send_message(&bytes) => sent?,
        }

        debug!(
            peer = %peer,
            type_id = message.type_id(),
            len = bytes.len(),
            "sent {}",
            message.type_name()
        );
    }
}

async fn keepalive_loop(
    peer: PeerAddress,
    cancel: CancellationToken,
    config: SessionConfig,
    outbound: mpsc::UnboundedSender<Message>,
) -> Result<(), SessionError> {
    let mut ticker = time::interval(config.ping_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            _ = ticker.tick() => {}
        }

        let padding = random_padding(config.ping_padding_len);
        let ping = payload::build_ping(config.ping_num_pong_bytes, &padding)?;

        debug!(
            peer = %peer,
            num_pong_bytes = config.ping_num_pong_bytes,
            "queueing keepalive ping"
        );
        if outbound.send(ping).is_err() {
            return Ok(());
        }
    }
}

fn random_padding(len: u16) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.r#gen()).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time::Instant;

    use super::*;
    use crate::transport::MemoryTransport;
    use crate::wire::constants::{CHAIN_HASH_REGTEST, ENCODING_UNCOMPRESSED};

    const NODE_ID: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    fn peer() -> PeerAddress {
        format!("{NODE_ID}@127.0.0.1:9735").parse().unwrap()
    }

    /// Default config with the keepalive timer disabled.
    fn quiet() -> SessionConfig {
        SessionConfig {
            ping_interval_secs: 0,
            ..SessionConfig::default()
        }
    }

    async fn start(config: SessionConfig) -> (PeerSession, Inbound, MemoryTransport) {
        let (local, remote) = MemoryTransport::pair();
        let (session, inbound) = PeerSession::start(peer(), Arc::new(local), config)
            .await
            .unwrap();
        (session, inbound, remote)
    }

    async fn read(remote: &MemoryTransport) -> Message {
        let bytes = remote.read_message().await.unwrap();
        codec::dispatch(&bytes).unwrap()
    }

    async fn send_hex(remote: &MemoryTransport, s: &str) {
        remote.send_message(&hex::decode(s).unwrap()).await.unwrap();
    }

    /// Scripted transport: reads come from a fixed list, then never
    /// complete. Only the first `sends_allowed` sends succeed.
    struct ScriptedTransport {
        reads: Mutex<VecDeque<Result<Vec<u8>, TransportError>>>,
        sends_allowed: AtomicUsize,
        sent: mpsc::UnboundedSender<Vec<u8>>,
    }

    impl ScriptedTransport {
        fn new(
            reads: Vec<Result<Vec<u8>, TransportError>>,
            sends_allowed: usize,
        ) -> (Arc<Self>, mpsc::UnboundedReceiver<Vec<u8>>) {
            let (sent, rx) = mpsc::unbounded_channel();
            let transport = Self {
                reads: Mutex::new(reads.into()),
                sends_allowed: AtomicUsize::new(sends_allowed),
                sent,
            };
            (Arc::new(transport), rx)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn read_message(&self) -> Result<Vec<u8>, TransportError> {
            let next = self.reads.lock().unwrap().pop_front();
            match next {
                Some(read) => read,
                None => std::future::pending().await,
            }
        }

        async fn send_message(&self, bytes: &[u8]) -> Result<(), TransportError> {
            let allowed = self
                .sends_allowed
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
            if allowed.is_err() {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe").into());
            }
            let _ = self.sent.send(bytes.to_vec());
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn init_is_sent_before_queued_traffic() {
        let (session, _inbound, remote) = start(quiet()).await;
        session.send(payload::build_ping(4, &[]).unwrap()).unwrap();

        let first = remote.read_message().await.unwrap();
        assert_eq!(first, hex::decode("001000000001aa").unwrap());
        assert_eq!(read(&remote).await.type_name(), "ping");
    }

    #[tokio::test(start_paused = true)]
    async fn ping_is_answered_with_pong() {
        let (_session, mut inbound, remote) = start(quiet()).await;
        read(&remote).await; // init

        send_hex(&remote, "0012000a0001aa").await;

        let pong = read(&remote).await;
        let MessageView::Pong(p) = pong.view() else {
            panic!("expected MessageView::Pong, got {pong:?}");
        };
        assert_eq!(p.ignored, &[0u8; 10]);

        let delivered = inbound.recv().await.unwrap();
        assert_eq!(delivered.type_name(), "ping");
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_pong_request_is_not_answered() {
        let (_session, _inbound, remote) = start(quiet()).await;
        read(&remote).await;

        // num_pong_bytes = 65532
        send_hex(&remote, "0012fffc0000").await;
        let filter = payload::build_gossip_timestamp_filter(&CHAIN_HASH_REGTEST, 0, 1);
        remote.send_message(&filter.encode()).await.unwrap();

        assert_eq!(read(&remote).await.type_name(), "query_short_channel_ids");
    }

    #[tokio::test(start_paused = true)]
    async fn gossip_filter_triggers_exactly_one_query() {
        let (_session, mut inbound, remote) = start(quiet()).await;
        read(&remote).await;

        send_hex(
            &remote,
            "010906226e46111a0b59caaf126043eb5bbf28c34f3a5e332a1fc7b2b73cf188910f67c6d3e3ffffffff",
        )
        .await;

        let query = read(&remote).await;
        let MessageView::QueryShortChannelIds(q) = query.view() else {
            panic!("expected MessageView::QueryShortChannelIds, got {query:?}");
        };
        assert_eq!(q.chain_hash, &CHAIN_HASH_REGTEST);
        assert_eq!(q.encoded_short_ids, &[ENCODING_UNCOMPRESSED]);

        // the next reply belongs to the next inbound message
        send_hex(&remote, "001200020000").await;
        assert_eq!(read(&remote).await.type_name(), "pong");

        assert_eq!(inbound.recv().await.unwrap().type_name(), "gossip_timestamp_filter");
        assert_eq!(inbound.recv().await.unwrap().type_name(), "ping");
    }

    #[tokio::test(start_paused = true)]
    async fn other_messages_get_no_reaction() {
        let (_session, mut inbound, remote) = start(quiet()).await;
        read(&remote).await;

        send_hex(&remote, "0013000100").await; // pong
        send_hex(&remote, "00ffdeadbeef").await; // unknown
        send_hex(&remote, "001200010000").await; // ping

        assert_eq!(read(&remote).await.type_name(), "pong");
        for name in ["pong", "unknown", "ping"] {
            assert_eq!(inbound.recv().await.unwrap().type_name(), name);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn outbound_queue_is_fifo() {
        let (session, _inbound, remote) = start(quiet()).await;
        read(&remote).await;

        let outbound = session.outbound();
        for n in 0..5u16 {
            outbound.send(payload::build_ping(n, &[]).unwrap()).unwrap();
        }

        for n in 0..5u16 {
            let msg = read(&remote).await;
            let MessageView::Ping(ping) = msg.view() else {
                panic!("expected MessageView::Ping, got {msg:?}");
            };
            assert_eq!(ping.num_pong_bytes, n);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn every_producer_shares_one_fifo_queue() {
        let config = SessionConfig {
            ping_interval_secs: 1,
            ..quiet()
        };
        let (session, mut inbound, remote) = start(config).await;
        read(&remote).await;

        session
            .send(payload::build_gossip_timestamp_filter(&CHAIN_HASH_REGTEST, 1, 1))
            .unwrap();
        // keepalive ping is queued at one second
        tokio::time::sleep(Duration::from_millis(1500)).await;

        send_hex(&remote, "001200030000").await;
        // the pong is queued before the ping is delivered
        assert_eq!(inbound.recv().await.unwrap().type_name(), "ping");

        session
            .send(payload::build_reply_short_channel_ids_end(&CHAIN_HASH_REGTEST, true))
            .unwrap();

        assert_eq!(read(&remote).await.type_name(), "gossip_timestamp_filter");

        let keepalive = read(&remote).await;
        let MessageView::Ping(ping) = keepalive.view() else {
            panic!("expected MessageView::Ping, got {keepalive:?}");
        };
        assert_eq!(ping.num_pong_bytes, 10);
        assert_eq!(ping.ignored.len(), 1);

        let reply = read(&remote).await;
        let MessageView::Pong(pong) = reply.view() else {
            panic!("expected MessageView::Pong, got {reply:?}");
        };
        assert_eq!(pong.ignored.len(), 3);

        assert_eq!(read(&remote).await.type_name(), "reply_short_channel_ids_end");
    }

    #[tokio::test(start_paused = true)]
    async fn full_inbound_queue_drops_but_still_answers() {
        let config = SessionConfig {
            inbound_capacity: 2,
            ..quiet()
        };
        let (session, mut inbound, remote) = start(config).await;
        read(&remote).await;

        for n in 1..=5u16 {
            send_hex(&remote, &format!("0012{n:04x}0000")).await;
        }
        for n in 1..=5usize {
            let reply = read(&remote).await;
            let MessageView::Pong(pong) = reply.view() else {
                panic!("expected MessageView::Pong, got {reply:?}");
            };
            assert_eq!(pong.ignored.len(), n);
        }

        for n in 1..=2u16 {
            let msg = inbound.try_recv().unwrap();
            let MessageView::Ping(ping) = msg.view() else {
                panic!("expected MessageView::Ping, got {msg:?}");
            };
            assert_eq!(ping.num_pong_bytes, n);
        }
        assert!(inbound.try_recv().is_none());
        assert!(session.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn send_is_refused_once_stop_begins() {
        let (session, _inbound, remote) = start(quiet()).await;
        read(&remote).await;

        let outbound = session.outbound();
        let cancelled = session.cancel.clone();
        let stopping = tokio::spawn(async move {
            let mut session = session;
            session.stop().await
        });

        cancelled.cancelled().await;
        assert!(matches!(
            outbound.send(payload::build_pong(0)),
            Err(SessionError::NotRunning)
        ));
        stopping.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn keepalive_pings_on_interval() {
        let (_session, _inbound, remote) = start(SessionConfig::default()).await;
        read(&remote).await;

        let started = Instant::now();
        for _ in 0..2 {
            let msg = read(&remote).await;
            let MessageView::Ping(ping) = msg.view() else {
                panic!("expected MessageView::Ping, got {msg:?}");
            };
            assert_eq!(ping.num_pong_bytes, 10);
            assert_eq!(ping.ignored.len(), 1);
        }
        assert!(started.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn undecodable_messages_are_skipped() {
        let (session, mut inbound, remote) = start(quiet()).await;
        read(&remote).await;

        remote.send_message(&[0x00]).await.unwrap();
        send_hex(&remote, "0012000a0005aa").await; // ignored overruns
        send_hex(&remote, "001200030000").await;

        assert_eq!(read(&remote).await.encoded_len(), 2 + 2 + 3);
        assert_eq!(inbound.recv().await.unwrap().type_name(), "ping");
        assert!(session.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_decode_failures_escalate() {
        let config = SessionConfig {
            max_consecutive_failures: 2,
            ..quiet()
        };
        let (mut session, _inbound, remote) = start(config).await;
        read(&remote).await;

        for _ in 0..3 {
            remote.send_message(&[0x01]).await.unwrap();
        }

        session.closed().await;
        assert_eq!(session.state(), SessionState::Stopped);
        assert!(matches!(
            session.stop().await,
            Err(SessionError::TooManyFailures { count: 3 })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn a_good_message_resets_the_failure_count() {
        let config = SessionConfig {
            max_consecutive_failures: 2,
            ..quiet()
        };
        let (session, _inbound, remote) = start(config).await;
        read(&remote).await;

        let garbage = vec![0x01];
        let pong = vec![0x00, 0x13, 0x00, 0x00];
        for bytes in [&garbage, &garbage, &pong, &garbage, &garbage] {
            remote.send_message(bytes).await.unwrap();
        }
        send_hex(&remote, "001200010000").await;

        assert_eq!(read(&remote).await.type_name(), "pong");
        assert!(session.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn read_errors_are_retried_after_a_delay() {
        let ping = hex::decode("001200020000").unwrap();
        let (transport, mut sent) = ScriptedTransport::new(
            vec![
                Err(TransportError::Other("bad mac".into())),
                Err(io::Error::new(io::ErrorKind::TimedOut, "timed out").into()),
                Ok(ping),
            ],
            usize::MAX,
        );

        let started = Instant::now();
        let (session, _inbound) = PeerSession::start(peer(), transport, quiet()).await.unwrap();

        assert_eq!(sent.recv().await.unwrap(), hex::decode("001000000001aa").unwrap());
        assert_eq!(sent.recv().await.unwrap(), hex::decode("001300020000").unwrap());
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert!(session.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn closed_transport_is_fatal() {
        let (mut session, _inbound, remote) = start(quiet()).await;
        read(&remote).await;

        remote.close();
        session.closed().await;

        assert!(matches!(
            session.stop().await,
            Err(SessionError::Transport(TransportError::Closed))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn send_failure_is_fatal() {
        let (transport, _sent) = ScriptedTransport::new(vec![], 1);
        let (mut session, _inbound) = PeerSession::start(peer(), transport, quiet()).await.unwrap();

        session.send(payload::build_pong(0)).unwrap();
        session.closed().await;

        assert!(!session.is_running());
        assert!(matches!(
            session.stop().await,
            Err(SessionError::Transport(TransportError::Io(_)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn start_fails_when_init_cannot_be_sent() {
        let (transport, _sent) = ScriptedTransport::new(vec![], 0);
        let err = PeerSession::start(peer(), transport, quiet()).await.unwrap_err();
        assert!(matches!(err, SessionError::Transport(TransportError::Io(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_joins_every_task() {
        let (mut session, mut inbound, _remote) = start(SessionConfig::default()).await;
        assert_eq!(session.state(), SessionState::Ready);

        session.stop().await.unwrap();

        assert_eq!(session.state(), SessionState::Stopped);
        assert!(session.tasks.is_empty());
        assert!(matches!(
            session.send(payload::build_pong(0)),
            Err(SessionError::NotRunning)
        ));
        assert!(inbound.recv().await.is_none());

        // second stop is a no-op
        session.stop().await.unwrap();
    }

    #[test]
    fn respond_to_ignores_pong_and_unknown() {
        let pong = payload::build_pong(3);
        assert!(respond_to(&pong).is_none());

        let unknown = codec::dispatch(&[0x00, 0xff, 0x01]).unwrap();
        assert!(respond_to(&unknown).is_none());
    }

    #[test]
    fn pong_threshold_boundary() {
        let below = payload::build_ping(PONG_SUPPRESS_THRESHOLD - 1, &[]).unwrap();
        let at = payload::build_ping(PONG_SUPPRESS_THRESHOLD, &[]).unwrap();

        let pong = respond_to(&below).unwrap();
        assert_eq!(pong.encoded_len(), 2 + 2 + (PONG_SUPPRESS_THRESHOLD as usize - 1));
        assert!(respond_to(&at).is_none());
    }
}
