use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::handshake::derive_accept_key;
use tokio_tungstenite::tungstenite::protocol::Role;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, ControlError};
use crate::shutdown::{ShutdownReceiver, ShutdownSender};

use super::http::{
    HttpRequest, read_http_request, write_error_response, write_switching_protocols,
};
use super::plane::ControlPlane;
use super::session::{Liveness, run_session};
use super::static_files::serve_file;

pub const CONTROL_ROUTE: &str = "/ws";
/// How long a new connection may take to send its request head.
pub const DEFAULT_HEAD_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub public_dir: PathBuf,
    pub status_interval: Option<Duration>,
    pub liveness: Liveness,
    pub head_timeout: Duration,
}

struct ServerContext {
    plane: Arc<ControlPlane>,
    settings: ServerSettings,
    // One permit: at most one controller session at a time.
    controller_slot: Arc<Semaphore>,
}

/// Dashboard listener. Serves static assets and upgrades `/ws` to the
/// control session.
pub struct ControlServer {
    listener: TcpListener,
    context: Arc<ServerContext>,
}

impl ControlServer {
    /// Binds the listener.
    ///
    /// # Errors
    ///
    /// Returns an error when the address cannot be bound.
    pub async fn bind(
        addr: SocketAddr,
        plane: Arc<ControlPlane>,
        settings: ServerSettings,
    ) -> AppResult<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|err| {
            AppError::control(ControlError::Bind {
                addr: addr.to_string(),
                source: err,
            })
        })?;
        Ok(Self {
            listener,
            context: Arc::new(ServerContext {
                plane,
                settings,
                controller_slot: Arc::new(Semaphore::new(1)),
            }),
        })
    }

    /// # Errors
    ///
    /// Returns an error when the bound address cannot be read back.
    pub fn local_addr(&self) -> AppResult<SocketAddr> {
        self.listener.local_addr().map_err(|err| {
            AppError::control(ControlError::Io {
                context: "read listener address",
                source: err,
            })
        })
    }

    /// Runs [`ControlServer::serve`] on its own task.
    pub fn spawn(self, shutdown_tx: &ShutdownSender) -> tokio::task::JoinHandle<()> {
        let shutdown_tx = shutdown_tx.clone();
        tokio::spawn(async move { self.serve(&shutdown_tx).await })
    }

    /// Accepts connections until shutdown is broadcast.
    pub async fn serve(self, shutdown_tx: &ShutdownSender) {
        let mut shutdown_rx = shutdown_tx.subscribe();
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    debug!("Control listener stopping");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((socket, peer)) => {
                        let context = Arc::clone(&self.context);
                        let session_shutdown = shutdown_tx.subscribe();
                        tokio::spawn(async move {
                            handle_connection(socket, peer, &context, session_shutdown).await;
                        });
                    }
                    Err(err) => warn!("Failed to accept connection: {}", err),
                }
            }
        }
    }
}

async fn handle_connection(
    mut socket: TcpStream,
    peer: SocketAddr,
    context: &ServerContext,
    shutdown_rx: ShutdownReceiver,
) {
    let limit = context.settings.head_timeout;
    let request = match timeout(limit, read_http_request(&mut socket)).await {
        Ok(Ok(request)) => request,
        Ok(Err(err)) => {
            respond_with_error(&mut socket, &err).await;
            return;
        }
        Err(_elapsed) => {
            debug!("{} sent no request head within {:?}", peer, limit);
            respond_with_error(&mut socket, &ControlError::http(408, "Request timeout")).await;
            return;
        }
    };

    let with_body = match request.method.as_str() {
        "GET" => true,
        "HEAD" if request.route() != CONTROL_ROUTE => false,
        _ => {
            respond_with_error(&mut socket, &ControlError::http(405, "Method not allowed")).await;
            return;
        }
    };

    if request.route() == CONTROL_ROUTE {
        upgrade_control(socket, peer, request, context, shutdown_rx).await;
        return;
    }

    if let Err(err) = serve_file(
        &mut socket,
        &context.settings.public_dir,
        request.route(),
        with_body,
    )
    .await
    {
        debug!("Failed to serve {} to {}: {}", request.route(), peer, err);
    }
}

async fn upgrade_control(
    mut socket: TcpStream,
    peer: SocketAddr,
    request: HttpRequest,
    context: &ServerContext,
    shutdown_rx: ShutdownReceiver,
) {
    if !origin_allowed(&request) {
        respond_with_error(&mut socket, &ControlError::http(403, "Origin not allowed")).await;
        return;
    }

    let Some(key) = request
        .header("sec-websocket-key")
        .filter(|_| is_websocket_upgrade(&request))
    else {
        respond_with_error(
            &mut socket,
            &ControlError::http(400, "Could not open websocket connection"),
        )
        .await;
        return;
    };

    let Ok(slot) = Arc::clone(&context.controller_slot).try_acquire_owned() else {
        warn!("Rejecting controller {}: another session is active", peer);
        respond_with_error(
            &mut socket,
            &ControlError::http(409, "Another controller is already connected"),
        )
        .await;
        return;
    };

    let accept_key = derive_accept_key(key.as_bytes());
    if let Err(err) = write_switching_protocols(&mut socket, &accept_key).await {
        warn!("Upgrade for {} failed: {}", peer, err);
        return;
    }

    let ws =
        WebSocketStream::from_partially_read(socket, request.remainder, Role::Server, None).await;
    info!("Controller {} connected", peer);
    let end = run_session(
        ws,
        &context.plane,
        context.settings.status_interval,
        context.settings.liveness,
        shutdown_rx,
    )
    .await;
    info!("Controller {} disconnected ({:?})", peer, end);
    drop(slot);
}

/// The dashboard must be served from the same host it controls.
pub(super) fn origin_allowed(request: &HttpRequest) -> bool {
    let Some(host) = request.header("host") else {
        return false;
    };
    request.header("origin") == Some(format!("http://{}", host).as_str())
}

pub(super) fn is_websocket_upgrade(request: &HttpRequest) -> bool {
    let upgrade = request
        .header("upgrade")
        .is_some_and(|value| value.eq_ignore_ascii_case("websocket"));
    let connection = request.header("connection").is_some_and(|value| {
        value
            .split(',')
            .any(|token| token.trim().eq_ignore_ascii_case("upgrade"))
    });
    upgrade && connection
}

async fn respond_with_error(socket: &mut TcpStream, err: &ControlError) {
    let (status, message) = if let ControlError::Http { status, message } = err {
        (*status, message.clone())
    } else {
        (500, err.to_string())
    };
    if write_error_response(socket, status, &message).await.is_err() {
        // Socket closed while writing error response.
    }
}
