use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;
use tokio::io::AsyncWrite;
use tracing::debug;

use crate::error::ControlError;

use super::http::{write_error_response, write_head, write_response};

const INDEX_FILE: &str = "index.html";

/// Maps a request route onto a file below `root`. The route is
/// percent-decoded first; routes that try to leave the root, or that do not
/// decode to UTF-8, resolve to `None`.
pub(super) fn resolve_path(root: &Path, route: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(route).decode_utf8().ok()?;
    let relative = decoded.trim_start_matches('/');
    let mut resolved = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(segment) => resolved.push(segment),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if relative.is_empty() || relative.ends_with('/') {
        resolved.push(INDEX_FILE);
    }
    Some(resolved)
}

pub(super) fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Answers a GET (or, with `with_body == false`, a HEAD) for a static file.
pub(super) async fn serve_file<S>(
    socket: &mut S,
    root: &Path,
    route: &str,
    with_body: bool,
) -> Result<(), ControlError>
where
    S: AsyncWrite + Unpin,
{
    let Some(mut path) = resolve_path(root, route) else {
        return not_found(socket, with_body).await;
    };
    if tokio::fs::metadata(&path)
        .await
        .is_ok_and(|metadata| metadata.is_dir())
    {
        path.push(INDEX_FILE);
    }

    match tokio::fs::read(&path).await {
        Ok(body) if with_body => write_response(socket, 200, content_type(&path), &body).await,
        Ok(body) => write_head(socket, 200, content_type(&path), body.len()).await,
        Err(err) => {
            debug!("Static file {} unavailable: {}", path.display(), err);
            not_found(socket, with_body).await
        }
    }
}

async fn not_found<S>(socket: &mut S, with_body: bool) -> Result<(), ControlError>
where
    S: AsyncWrite + Unpin,
{
    if with_body {
        write_error_response(socket, 404, "Not found").await
    } else {
        write_head(socket, 404, "application/json", 0).await
    }
}
