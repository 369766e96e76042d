use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use super::backoff::Backoff;
use super::packet::{self, EnginePacket, SocketPacket};
use super::{ChannelError, ChannelEvent, ChannelOptions, Handlers, STATUS_UPDATE};
use crate::telemetry;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum SessionEnd {
    /// The owner asked us to stop.
    Shutdown,
    /// The server left the namespace on purpose; do not reconnect.
    ServerDisconnect,
}

/// Transport task: connect, pump events, reconnect with backoff.
pub(super) async fn run(
    endpoint: Url,
    options: ChannelOptions,
    handlers: Handlers,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut backoff = Backoff::new(options.reconnect_initial_ms, options.reconnect_max_ms);

    loop {
        if *shutdown.borrow() {
            break;
        }
        match session(&endpoint, &options, &handlers, &mut shutdown, &mut backoff).await {
            Ok(SessionEnd::Shutdown) => break,
            Ok(SessionEnd::ServerDisconnect) => {
                info!("server closed the namespace, not reconnecting");
                break;
            }
            Err(err) => warn!(error = %err, "push channel connection lost"),
        }

        if !options.reconnect {
            break;
        }
        let delay = backoff.next_delay();
        debug!(delay_ms = delay.as_millis() as u64, "reconnecting");
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.changed() => break,
        }
    }
    debug!("push channel transport stopped");
}

/// One connection lifetime. Emits `Disconnect` on the way out if `Connect`
/// was emitted on the way in.
async fn session(
    endpoint: &Url,
    options: &ChannelOptions,
    handlers: &Handlers,
    shutdown: &mut watch::Receiver<bool>,
    backoff: &mut Backoff,
) -> Result<SessionEnd, ChannelError> {
    let socket = tokio::select! {
        res = connect_async(endpoint.as_str()) => res?.0,
        _ = shutdown.changed() => return Ok(SessionEnd::Shutdown),
    };
    let (mut sink, mut stream) = socket.split();

    let handshake = match next_frame(&mut stream, options.handshake_timeout).await {
        Ok(text) => match EnginePacket::decode(&text)? {
            EnginePacket::Open(handshake) => handshake,
            other => return Err(ChannelError::Handshake(format!("{:?}", other))),
        },
        Err(ChannelError::PingTimeout(d)) => return Err(ChannelError::HandshakeTimeout(d)),
        Err(err) => return Err(err),
    };
    debug!(sid = %handshake.sid, ping_interval = handshake.ping_interval, "engine.io open");
    sink.send(Message::Text(packet::connect_frame(&options.namespace)))
        .await?;

    // The server pings every interval; missing one by the timeout means dead
    let liveness = Duration::from_millis(handshake.ping_interval + handshake.ping_timeout);
    let mut connected = false;

    let outcome = loop {
        let text = tokio::select! {
            _ = shutdown.changed() => {
                let _ = sink.send(Message::Close(None)).await;
                break Ok(SessionEnd::Shutdown);
            }
            next = next_frame(&mut stream, liveness) => match next {
                Ok(text) => text,
                Err(err) => break Err(err),
            },
        };

        let engine = match EnginePacket::decode(&text) {
            Ok(p) => p,
            Err(err) => {
                warn!(error = %err, "dropping undecodable frame");
                continue;
            }
        };

        match engine {
            EnginePacket::Ping(data) => {
                if let Err(err) = sink.send(Message::Text(EnginePacket::Pong(data).encode())).await {
                    break Err(err.into());
                }
            }
            EnginePacket::Close => break Err(ChannelError::Closed),
            EnginePacket::Message(body) => match SocketPacket::decode(&body) {
                Ok(SocketPacket::Connect { .. }) => {
                    if !connected {
                        connected = true;
                        backoff.reset();
                        info!("push channel connected");
                        handlers.dispatch(ChannelEvent::Connect);
                    }
                }
                Ok(SocketPacket::Disconnect { .. }) => break Ok(SessionEnd::ServerDisconnect),
                Ok(SocketPacket::ConnectError { message, .. }) => {
                    break Err(ChannelError::Rejected(message))
                }
                Ok(SocketPacket::Event { name, args, .. }) => {
                    if name == STATUS_UPDATE {
                        deliver_status(handlers, args);
                    } else {
                        debug!(event = %name, "ignoring event");
                    }
                }
                Ok(SocketPacket::Ack { .. }) => {}
                Err(err) => warn!(error = %err, "dropping undecodable socket.io packet"),
            },
            EnginePacket::Open(_)
            | EnginePacket::Pong(_)
            | EnginePacket::Upgrade
            | EnginePacket::Noop => {}
        }
    };

    if connected {
        info!("push channel disconnected");
        handlers.dispatch(ChannelEvent::Disconnect);
    }
    outcome
}

fn deliver_status(handlers: &Handlers, args: Vec<serde_json::Value>) {
    let Some(payload) = args.into_iter().next() else {
        warn!("status_update without payload");
        return;
    };
    match telemetry::normalize(payload) {
        Ok(snapshot) => handlers.dispatch(ChannelEvent::StatusUpdate(snapshot)),
        Err(err) => warn!(error = %err, "dropping malformed status_update"),
    }
}

/// Next text frame, skipping websocket-level control frames.
async fn next_frame(
    stream: &mut futures::stream::SplitStream<Socket>,
    within: Duration,
) -> Result<String, ChannelError> {
    loop {
        let next = tokio::time::timeout(within, stream.next())
            .await
            .map_err(|_| ChannelError::PingTimeout(within))?;
        match next {
            None => return Err(ChannelError::Closed),
            Some(Err(err)) => return Err(err.into()),
            Some(Ok(Message::Text(text))) => return Ok(text),
            Some(Ok(Message::Close(_))) => return Err(ChannelError::Closed),
            Some(Ok(_)) => continue,
        }
    }
}
