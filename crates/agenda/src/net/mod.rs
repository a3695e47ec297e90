//! Network access for schedule documents
//!
//! This module provides:
//! - Classification of download attempts into [`HttpOutcome`]
//! - A conditional (ETag based) downloader
//! - URL helpers

mod downloader;
mod outcome;

pub use downloader::{Download, ScheduleDownloader};
pub use outcome::HttpOutcome;

use anyhow::{Context, Result};

/// Host name of `url`, or an error when the URL is malformed or host-less
pub fn host_name(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url).with_context(|| format!("Invalid URL '{}'", url))?;
    parsed
        .host_str()
        .map(str::to_string)
        .with_context(|| format!("Host is missing in URL '{}'", url))
}
