//! Loading a host page for the preview CLI.
//!
//! A source is either an `http(s)` URL, fetched with a blocking client, or a
//! path on disk. Either way the page's own location becomes the surface base
//! href so relative stylesheet links still resolve in the printed document.

use crate::{Error, Result};
use log::debug;
use reqwest::blocking::Client;
use std::path::Path;
use std::time::Duration;

const USER_AGENT: &str = concat!("printframe/", env!("CARGO_PKG_VERSION"));

/// A host page and where it came from
#[derive(Debug, Clone)]
pub struct LoadedPage {
    pub html: String,
    /// Absolute URL of the page, usable as a base href
    pub base_href: Option<String>,
}

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Load `source` (URL or file path).
pub fn load_source(source: &str, timeout: Duration) -> Result<LoadedPage> {
    if is_remote(source) {
        fetch_url(source, timeout)
    } else {
        read_file(Path::new(source))
    }
}

fn fetch_url(url: &str, timeout: Duration) -> Result<LoadedPage> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::NetworkError(format!("Failed to build HTTP client: {}", e)))?;

    let resp = client
        .get(url)
        .send()
        .map_err(|e| Error::NetworkError(format!("Failed to fetch {}: {}", url, e)))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(Error::LoadError(format!("{} returned {}", url, status)));
    }
    let final_url = resp.url().to_string();
    let html = resp
        .text()
        .map_err(|e| Error::LoadError(format!("Failed to read response body: {}", e)))?;
    debug!("fetched {} bytes from {}", html.len(), final_url);

    Ok(LoadedPage {
        html,
        base_href: Some(final_url),
    })
}

fn read_file(path: &Path) -> Result<LoadedPage> {
    let html = std::fs::read_to_string(path)
        .map_err(|e| Error::LoadError(format!("{}: {}", path.display(), e)))?;
    let base_href = path
        .canonicalize()
        .ok()
        .and_then(|abs| url::Url::from_file_path(abs).ok())
        .map(|u| u.to_string());
    debug!("read {} bytes from {}", html.len(), path.display());
    Ok(LoadedPage { html, base_href })
}
