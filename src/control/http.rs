use std::collections::HashMap;

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ControlError;

const MAX_HEADER_BYTES: usize = 64 * 1024;

pub(super) struct HttpRequest {
    pub(super) method: String,
    pub(super) path: String,
    pub(super) headers: HashMap<String, String>,
    /// Bytes that arrived after the blank line, e.g. a client's first
    /// WebSocket frame sent together with the upgrade request.
    pub(super) remainder: Vec<u8>,
}

impl HttpRequest {
    pub(super) fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Request path without the query string.
    pub(super) fn route(&self) -> &str {
        self.path
            .split_once('?')
            .map_or(self.path.as_str(), |(route, _)| route)
    }
}

/// Reads the request line and headers. Anything read past the head is kept in
/// [`HttpRequest::remainder`]; request bodies are otherwise ignored.
pub(super) async fn read_http_request<S>(socket: &mut S) -> Result<HttpRequest, ControlError>
where
    S: AsyncRead + Unpin,
{
    let mut buffer: Vec<u8> = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    let header_end;

    loop {
        let bytes = socket
            .read(&mut chunk)
            .await
            .map_err(|err| ControlError::http(400, format!("Failed to read request: {}", err)))?;
        if bytes == 0 {
            return Err(ControlError::http(400, "Empty request"));
        }
        let read_slice = chunk
            .get(..bytes)
            .ok_or_else(|| ControlError::http(400, "Invalid read length"))?;
        buffer.extend_from_slice(read_slice);
        if let Some(pos) = find_header_end(&buffer) {
            header_end = pos;
            break;
        }
        if buffer.len() > MAX_HEADER_BYTES {
            return Err(ControlError::http(431, "Request headers too large"));
        }
    }

    let header_bytes = buffer
        .get(..header_end)
        .ok_or_else(|| ControlError::http(400, "Malformed request headers"))?;
    let remainder = buffer
        .get(header_end.saturating_add(4)..)
        .map(<[u8]>::to_vec)
        .unwrap_or_default();
    let header_text = std::str::from_utf8(header_bytes)
        .map_err(|err| ControlError::http(400, format!("Invalid request encoding: {}", err)))?;
    let mut lines = header_text.split("\r\n");
    let request_line = lines
        .next()
        .ok_or_else(|| ControlError::http(400, "Missing request line"))?;
    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| ControlError::http(400, "Missing HTTP method"))?;
    let path = parts
        .next()
        .ok_or_else(|| ControlError::http(400, "Missing request path"))?;

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            return Err(ControlError::http(400, "Malformed header"));
        };
        headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_owned());
    }

    Ok(HttpRequest {
        method: method.to_owned(),
        path: path.to_owned(),
        headers,
        remainder,
    })
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n")
}

fn status_text(status: u16) -> &'static str {
    ::http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Unknown")
}

pub(super) async fn write_switching_protocols<S>(
    socket: &mut S,
    accept_key: &str,
) -> Result<(), ControlError>
where
    S: AsyncWrite + Unpin,
{
    let response = format!(
        "HTTP/1.1 101 {}\r\nConnection: Upgrade\r\nUpgrade: websocket\r\nSec-WebSocket-Accept: {}\r\n\r\n",
        status_text(101),
        accept_key
    );
    socket
        .write_all(response.as_bytes())
        .await
        .map_err(|err| ControlError::Io {
            context: "write upgrade response",
            source: err,
        })
}

pub(super) async fn write_error_response<S>(
    socket: &mut S,
    status: u16,
    message: &str,
) -> Result<(), ControlError>
where
    S: AsyncWrite + Unpin,
{
    #[derive(Serialize)]
    struct ErrorResponse<'msg> {
        error: &'msg str,
    }
    let body = serde_json::to_vec(&ErrorResponse { error: message })
        .map_err(|err| ControlError::Encode { source: err })?;
    write_response(socket, status, "application/json", &body).await
}

pub(super) async fn write_response<S>(
    socket: &mut S,
    status: u16,
    content_type: &str,
    body: &[u8],
) -> Result<(), ControlError>
where
    S: AsyncWrite + Unpin,
{
    write_head(socket, status, content_type, body.len()).await?;
    socket.write_all(body).await.map_err(|err| ControlError::Io {
        context: "write response body",
        source: err,
    })?;
    socket.flush().await.map_err(|err| ControlError::Io {
        context: "flush response",
        source: err,
    })
}

/// Writes the status line and headers only, as the answer to a HEAD request.
pub(super) async fn write_head<S>(
    socket: &mut S,
    status: u16,
    content_type: &str,
    content_length: usize,
) -> Result<(), ControlError>
where
    S: AsyncWrite + Unpin,
{
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        status_text(status),
        content_type,
        content_length
    );
    socket
        .write_all(response.as_bytes())
        .await
        .map_err(|err| ControlError::Io {
            context: "write response head",
            source: err,
        })?;
    socket.flush().await.map_err(|err| ControlError::Io {
        context: "flush response head",
        source: err,
    })
}
