//! Embedded page and static assets
//!
//! Release builds serve from the binary; a configured UI directory on disk
//! is the fallback for files that were not embedded (development).

use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use rust_embed::Embed;
use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

#[derive(Embed)]
#[folder = "ui"]
struct Assets;

/// Look up `path` in the embedded assets, then under `ui_dir`
pub fn load(ui_dir: &Path, path: &str) -> Option<Cow<'static, [u8]>> {
    if let Some(content) = Assets::get(path) {
        return Some(content.data);
    }

    let fs_path = safe_join(ui_dir, path)?;
    std::fs::read(fs_path).ok().map(Cow::Owned)
}

/// Serve a static asset with a content type guessed from its extension
pub fn serve(ui_dir: &Path, path: &str) -> Option<Response> {
    let content = load(ui_dir, path)?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Some(([(header::CONTENT_TYPE, mime.to_string())], content.into_owned()).into_response())
}

/// Get the index.html content (embedded or from filesystem)
pub fn index_html(ui_dir: &Path) -> Option<String> {
    load(ui_dir, "index.html").and_then(|bytes| String::from_utf8(bytes.into_owned()).ok())
}

/// Join a request path onto `root`, refusing anything that could escape it
fn safe_join(root: &Path, path: &str) -> Option<PathBuf> {
    let relative = Path::new(path);
    if relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        Some(root.join(relative))
    } else {
        None
    }
}
