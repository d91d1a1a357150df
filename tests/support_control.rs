use std::ffi::OsStr;
use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use surge::control::{ControlPlane, ControlServer, DEFAULT_HEAD_TIMEOUT, Liveness, ServerSettings};
use surge::driver::{Driver, DriverReport};
use surge::lifecycle::lifecycle_channel;
use surge::shutdown::ShutdownSender;
use surge::state::RunState;
use surge::system::shutdown_handlers::shutdown_channel;
use surge::work::HttpWork;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

pub struct ServerHandle {
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
    hits: Arc<AtomicUsize>,
}

impl ServerHandle {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _send_result = self.shutdown.send(());
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

/// Spawn a lightweight HTTP target that counts the requests it answers.
///
/// # Errors
///
/// Returns an error if the listener cannot be created or configured.
pub fn spawn_http_server() -> Result<(String, ServerHandle), String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("set_nonblocking failed: {}", err))?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    let hits = Arc::new(AtomicUsize::new(0));
    let server_hits = Arc::clone(&hits);

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            match listener.accept() {
                Ok((stream, _)) => {
                    let hits = Arc::clone(&server_hits);
                    thread::spawn(move || handle_client(stream, &hits));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(5));
                }
                Err(_) => break,
            }
        }
    });

    Ok((
        format!("http://{}/", addr),
        ServerHandle {
            shutdown: shutdown_tx,
            thread: Some(handle),
            hits,
        },
    ))
}

fn handle_client(mut stream: TcpStream, hits: &AtomicUsize) {
    if stream.set_nonblocking(false).is_err() {
        return;
    }
    let mut buffer = [0u8; 1024];
    if stream.read(&mut buffer).is_err() {
        return;
    }
    if stream
        .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nOK")
        .is_err()
    {
        return;
    }
    if stream.flush().is_err() {
        return;
    }
    hits.fetch_add(1, Ordering::SeqCst);
    drop(stream.shutdown(Shutdown::Both));
}

/// A control server and driver wired together in-process.
pub struct ControlHarness {
    pub addr: SocketAddr,
    pub state: Arc<RunState>,
    shutdown_tx: ShutdownSender,
    server: tokio::task::JoinHandle<()>,
    driver: tokio::task::JoinHandle<DriverReport>,
}

impl ControlHarness {
    /// Broadcast shutdown and wait for the listener and driver to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if either task fails to stop in time.
    pub async fn shutdown(self) -> Result<DriverReport, String> {
        drop(self.shutdown_tx.send(()));
        tokio::time::timeout(Duration::from_secs(5), self.server)
            .await
            .map_err(|_elapsed| "control server did not stop".to_owned())?
            .map_err(|err| format!("control server panicked: {}", err))?;
        tokio::time::timeout(Duration::from_secs(5), self.driver)
            .await
            .map_err(|_elapsed| "driver did not stop".to_owned())?
            .map_err(|err| format!("driver panicked: {}", err))
    }
}

/// Keep-alive settings loose enough that no test controller goes idle.
pub const RELAXED_LIVENESS: Liveness = Liveness {
    heartbeat_interval: Duration::from_secs(30),
    idle_timeout: Duration::from_secs(60),
};

/// Bind a control server on an ephemeral port, driving `target`.
///
/// # Errors
///
/// Returns an error if the target is invalid or the listener cannot bind.
pub async fn spawn_control(
    target: &str,
    public_dir: PathBuf,
    max_concurrency: u32,
) -> Result<ControlHarness, String> {
    spawn_control_with(
        target,
        public_dir,
        max_concurrency,
        RELAXED_LIVENESS,
        DEFAULT_HEAD_TIMEOUT,
    )
    .await
}

/// Like [`spawn_control`], with explicit keep-alive and request-head limits.
///
/// # Errors
///
/// Returns an error if the target is invalid or the listener cannot bind.
pub async fn spawn_control_with(
    target: &str,
    public_dir: PathBuf,
    max_concurrency: u32,
    liveness: Liveness,
    head_timeout: Duration,
) -> Result<ControlHarness, String> {
    let target = Url::parse(target).map_err(|err| format!("bad target url: {}", err))?;
    let state = Arc::new(RunState::new());
    let (lifecycle_tx, lifecycle_rx) = lifecycle_channel();
    let plane = Arc::new(ControlPlane::new(
        Arc::clone(&state),
        Arc::new(lifecycle_tx),
        max_concurrency,
    ));
    let work = Arc::new(
        HttpWork::new(target, Duration::from_secs(2), Arc::clone(&state))
            .map_err(|err| format!("client build failed: {}", err))?,
    );

    let (shutdown_tx, driver_shutdown) = shutdown_channel();
    let server = ControlServer::bind(
        SocketAddr::from(([127, 0, 0, 1], 0)),
        plane,
        ServerSettings {
            public_dir,
            status_interval: None,
            liveness,
            head_timeout,
        },
    )
    .await
    .map_err(|err| format!("bind control server failed: {}", err))?;
    let addr = server
        .local_addr()
        .map_err(|err| format!("control addr failed: {}", err))?;
    let server = server.spawn(&shutdown_tx);
    let driver = tokio::spawn(
        Driver::new(work, lifecycle_rx, Duration::from_secs(3)).run(driver_shutdown),
    );

    Ok(ControlHarness {
        addr,
        state,
        shutdown_tx,
        server,
        driver,
    })
}

pub type ControlSocket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Open the control socket with the given `Origin` header.
///
/// # Errors
///
/// Returns the handshake error unchanged so callers can inspect rejections.
pub async fn connect_control(
    addr: SocketAddr,
    origin: &str,
) -> Result<ControlSocket, tokio_tungstenite::tungstenite::Error> {
    let mut request = format!("ws://{}/ws", addr).into_client_request()?;
    if let Ok(value) = HeaderValue::from_str(origin) {
        request.headers_mut().insert("Origin", value);
    }
    let (socket, _response) = connect_async(request).await?;
    Ok(socket)
}

/// Run the `surge` binary and capture output.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_surge<I, S>(args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = surge_bin()?;
    Command::new(bin)
        .args(args)
        .env("RUST_LOG", "error")
        .env_remove("SURGE_LOG")
        .output()
        .map_err(|err| format!("run surge failed: {}", err))
}

fn surge_bin() -> Result<String, String> {
    option_env!("CARGO_BIN_EXE_surge").map_or_else(
        || Err("CARGO_BIN_EXE_surge missing at compile time.".to_owned()),
        |path| Ok(path.to_owned()),
    )
}
