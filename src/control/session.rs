use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at, sleep_until, timeout};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, warn};

use crate::error::ControlError;
use crate::shutdown::ShutdownReceiver;

use super::plane::ControlPlane;
use super::wire::{StatusMessage, encode_status};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Closed,
    ReadFailed,
    /// Nothing, not even a pong, arrived within the idle timeout.
    IdleTimeout,
    Shutdown,
}

/// Keep-alive settings for a control session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Liveness {
    /// Interval between pings sent to the controller.
    pub heartbeat_interval: Duration,
    /// Longest silence tolerated from the controller. Also bounds each write.
    pub idle_timeout: Duration,
}

/// Serves one controller until it disconnects, goes silent, the transport
/// fails, or the process shuts down. Every inbound data frame is answered
/// with one status message.
pub async fn run_session<S>(
    ws: WebSocketStream<S>,
    plane: &ControlPlane,
    status_interval: Option<Duration>,
    liveness: Liveness,
    mut shutdown_rx: ShutdownReceiver,
) -> SessionEnd
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut sink, mut stream) = ws.split();
    let mut ticker = status_interval.map(periodic);
    let mut heartbeat = periodic(liveness.heartbeat_interval);
    let mut idle_deadline = deadline_after(liveness.idle_timeout);

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                drop(bounded_send(&mut sink, Message::Close(None), liveness.idle_timeout).await);
                return SessionEnd::Shutdown;
            }
            () = sleep_until(idle_deadline) => {
                warn!(
                    "Controller silent for {:?}, closing session",
                    liveness.idle_timeout
                );
                return SessionEnd::IdleTimeout;
            }
            _ = heartbeat.tick() => {
                if let Err(err) = bounded_send(&mut sink, Message::Ping(Vec::new()), liveness.idle_timeout).await {
                    warn!("{}", err);
                }
            }
            () = next_tick(&mut ticker) => {
                send_status(&mut sink, &StatusMessage::from(plane.snapshot()), liveness.idle_timeout).await;
            }
            message = stream.next() => {
                let Some(message) = message else {
                    return SessionEnd::Closed;
                };
                if message.is_ok() {
                    idle_deadline = deadline_after(liveness.idle_timeout);
                }
                match message {
                    Ok(Message::Text(text)) => {
                        let reply = plane.handle_message(&text);
                        send_status(&mut sink, &reply, liveness.idle_timeout).await;
                    }
                    Ok(Message::Binary(_)) => {
                        warn!("{}", ControlError::BinaryFrame);
                        let reply = StatusMessage {
                            state: plane.snapshot(),
                            error: Some(ControlError::BinaryFrame.to_string()),
                        };
                        send_status(&mut sink, &reply, liveness.idle_timeout).await;
                    }
                    Ok(Message::Close(frame)) => {
                        debug!("Controller closed the session: {:?}", frame);
                        return SessionEnd::Closed;
                    }
                    Ok(Message::Ping(_)) => {
                        // Flush the queued pong.
                        drop(timeout(liveness.idle_timeout, sink.flush()).await);
                    }
                    Ok(Message::Pong(_) | Message::Frame(_)) => {}
                    Err(err) => {
                        warn!(
                            "{}",
                            ControlError::WebSocket {
                                context: "read control message",
                                source: err,
                            }
                        );
                        return SessionEnd::ReadFailed;
                    }
                }
            }
        }
    }
}

fn deadline_after(period: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(period).unwrap_or(now)
}

fn periodic(period: Duration) -> Interval {
    let mut ticker = interval_at(deadline_after(period), period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Sends one frame, giving up when the peer stops draining the socket.
async fn bounded_send<S>(
    sink: &mut SplitSink<WebSocketStream<S>, Message>,
    message: Message,
    limit: Duration,
) -> Result<(), ControlError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match timeout(limit, sink.send(message)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(ControlError::WebSocket {
            context: "write control frame",
            source: err,
        }),
        Err(_elapsed) => Err(ControlError::WriteTimeout { limit }),
    }
}

async fn send_status<S>(
    sink: &mut SplitSink<WebSocketStream<S>, Message>,
    status: &StatusMessage,
    limit: Duration,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let payload = match encode_status(status) {
        Ok(payload) => payload,
        Err(err) => {
            error!("{}", err);
            return;
        }
    };
    if let Err(err) = bounded_send(sink, Message::Text(payload), limit).await {
        warn!("{}", err);
    }
}
