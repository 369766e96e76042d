//! Push channel: a receive-only Socket.IO client over WebSocket.
//!
//! The client is constructed explicitly and owned by whoever renders the
//! data. Construction does not connect; handlers are registered per event
//! kind and a second registration for the same kind replaces the first.

pub mod backoff;
pub mod packet;
mod transport;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};
use url::Url;

use crate::telemetry::StatusSnapshot;
use packet::PacketError;

/// Socket.IO event carrying a full status snapshot.
pub const STATUS_UPDATE: &str = "status_update";

const CLOSE_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("unsupported url scheme {0:?}, expected http, https, ws or wss")]
    UnsupportedScheme(String),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error(transparent)]
    Packet(#[from] PacketError),
    #[error("unexpected packet during handshake: {0}")]
    Handshake(String),
    #[error("no handshake from server within {0:?}")]
    HandshakeTimeout(Duration),
    #[error("no ping from server within {0:?}")]
    PingTimeout(Duration),
    #[error("server refused namespace: {0}")]
    Rejected(String),
    #[error("connection closed")]
    Closed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connect,
    Disconnect,
    StatusUpdate,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        EventKind::Connect,
        EventKind::Disconnect,
        EventKind::StatusUpdate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Connect => "connect",
            EventKind::Disconnect => "disconnect",
            EventKind::StatusUpdate => STATUS_UPDATE,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ChannelEvent {
    Connect,
    Disconnect,
    StatusUpdate(StatusSnapshot),
}

impl ChannelEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ChannelEvent::Connect => EventKind::Connect,
            ChannelEvent::Disconnect => EventKind::Disconnect,
            ChannelEvent::StatusUpdate(_) => EventKind::StatusUpdate,
        }
    }
}

type Handler = Arc<dyn Fn(ChannelEvent) + Send + Sync>;

/// At most one handler per event kind, shared with the transport task.
#[derive(Clone, Default)]
pub(crate) struct Handlers {
    inner: Arc<Mutex<HashMap<EventKind, Handler>>>,
}

impl Handlers {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<EventKind, Handler>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set(&self, kind: EventKind, handler: Handler) {
        self.lock().insert(kind, handler);
    }

    fn remove(&self, kind: EventKind) {
        self.lock().remove(&kind);
    }

    fn clear(&self) {
        self.lock().clear();
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn dispatch(&self, event: ChannelEvent) {
        // Clone out so the handler runs without the lock held
        let handler = self.lock().get(&event.kind()).cloned();
        match handler {
            Some(handler) => handler(event),
            None => trace!(event = event.kind().name(), "no handler registered"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ChannelOptions {
    /// Base server URL, e.g. `https://status.example.com`.
    pub url: String,
    pub namespace: String,
    pub reconnect: bool,
    pub reconnect_initial_ms: u64,
    pub reconnect_max_ms: u64,
    pub handshake_timeout: Duration,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            url: String::new(),
            namespace: "/".to_string(),
            reconnect: true,
            reconnect_initial_ms: 500,
            reconnect_max_ms: 5000,
            handshake_timeout: Duration::from_secs(10),
        }
    }
}

/// Build the WebSocket-only Socket.IO endpoint for a base URL.
///
/// `https://host` becomes `wss://host/socket.io/?EIO=4&transport=websocket`.
/// There is no polling fallback, so the transport is pinned in the query.
pub fn endpoint_url(base: &str) -> Result<Url, ChannelError> {
    let mut url = Url::parse(base)?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(ChannelError::UnsupportedScheme(other.to_string())),
    };
    url.set_scheme(scheme)
        .map_err(|_| ChannelError::UnsupportedScheme(scheme.to_string()))?;

    let path = url.path().trim_end_matches('/').to_string();
    url.set_path(&format!("{}/socket.io/", path));
    url.set_query(Some("EIO=4&transport=websocket"));
    url.set_fragment(None);
    Ok(url)
}

pub struct ChannelClient {
    options: ChannelOptions,
    handlers: Handlers,
    task: Option<JoinHandle<()>>,
    shutdown: Option<watch::Sender<bool>>,
}

impl ChannelClient {
    pub fn new(options: ChannelOptions) -> Self {
        Self {
            options,
            handlers: Handlers::default(),
            task: None,
            shutdown: None,
        }
    }

    /// Register the handler for `kind`, replacing any previous one.
    pub fn on<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(ChannelEvent) + Send + Sync + 'static,
    {
        self.handlers.set(kind, Arc::new(handler));
    }

    pub fn off(&self, kind: EventKind) {
        self.handlers.remove(kind);
    }

    pub fn off_all(&self) {
        self.handlers.clear();
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Start the transport task. A no-op while a previous task is alive.
    /// Must be called from within a tokio runtime.
    pub fn connect(&mut self) -> Result<(), ChannelError> {
        if self.is_active() {
            debug!("connect called while already active");
            return Ok(());
        }
        let endpoint = endpoint_url(&self.options.url)?;
        info!(endpoint = %endpoint, "opening push channel");

        let (tx, rx) = watch::channel(false);
        let handlers = self.handlers.clone();
        let options = self.options.clone();
        self.task = Some(tokio::spawn(transport::run(
            endpoint, options, handlers, rx,
        )));
        self.shutdown = Some(tx);
        Ok(())
    }

    /// Stop the transport and drop the socket.
    pub async fn close(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(true);
        }
        if let Some(mut task) = self.task.take() {
            if tokio::time::timeout(CLOSE_GRACE, &mut task).await.is_err() {
                debug!("transport did not stop in time, aborting");
                task.abort();
            }
        }
    }
}

impl Drop for ChannelClient {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
