//! Conditional HTTP download of schedule documents
//!
//! Uses synchronous HTTP (ureq); callers on an async runtime run it on a
//! blocking worker. The body is read in chunks so a cancelled download drops
//! its connection without waiting for the request timeout.

use log::{debug, error};
use std::io::{self, Read};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::HttpOutcome;

const HEADER_IF_NONE_MATCH: &str = "If-None-Match";
const HEADER_ETAG: &str = "ETag";

/// Upper bound for establishing a connection, whatever the request timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const CHUNK_SIZE: usize = 8 * 1024;
const MAX_DOCUMENT_SIZE: u64 = 10 * 1024 * 1024;

/// Result of one download attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Download {
    /// Fresh document and the ETag to remember for the next request
    Ok { document: String, etag: String },
    /// The server still has the document matching the sent ETag
    NotModified,
    /// Anything else, already classified
    Failure { outcome: HttpOutcome, message: String },
    /// The token was cancelled; the connection has been dropped
    Cancelled,
}

/// Downloads schedule documents, honouring ETags
pub struct ScheduleDownloader {
    agent: ureq::Agent,
}

impl ScheduleDownloader {
    /// Create a downloader whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .timeout_connect(Some(timeout.min(CONNECT_TIMEOUT)))
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.into(),
        }
    }

    /// Download `url`, sending `etag` as `If-None-Match` when non-empty.
    ///
    /// `cancel` is checked before the request and between body chunks.
    pub fn download(&self, url: &str, etag: &str, cancel: &CancellationToken) -> Download {
        if cancel.is_cancelled() {
            return Download::Cancelled;
        }
        debug!("Downloading url='{}' etag='{}'", url, etag);

        let mut request = self.agent.get(url);
        if !etag.is_empty() {
            request = request.header(HEADER_IF_NONE_MATCH, etag);
        }

        let mut response = match request.call() {
            Ok(response) => response,
            Err(e) => {
                let outcome = HttpOutcome::from_transport_error(&e);
                error!("Download of {} failed: {} ({})", url, outcome, e);
                return Download::Failure {
                    outcome,
                    message: e.to_string(),
                };
            }
        };

        let status = response.status().as_u16();
        match HttpOutcome::from_status(status) {
            HttpOutcome::Ok => {}
            HttpOutcome::NotModified => return Download::NotModified,
            outcome => {
                error!("Download error statusCode={} -> {}", status, outcome);
                return Download::Failure {
                    outcome,
                    message: format!("HTTP status {}", status),
                };
            }
        }

        let updated_etag = response
            .headers()
            .get(HEADER_ETAG)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        debug!("New etag='{}'", updated_etag);

        let reader = response
            .body_mut()
            .with_config()
            .limit(MAX_DOCUMENT_SIZE)
            .reader();
        match read_document(reader, cancel) {
            Ok(Some(document)) => {
                debug!("Download finished ({} bytes)", document.len());
                Download::Ok {
                    document,
                    etag: updated_etag,
                }
            }
            Ok(None) => {
                debug!("Download of {} cancelled", url);
                Download::Cancelled
            }
            Err(e) => Download::Failure {
                outcome: HttpOutcome::CannotParseContent,
                message: e.to_string(),
            },
        }
    }
}

/// Read a UTF-8 document, giving up with `None` once `cancel` fires
fn read_document(mut reader: impl Read, cancel: &CancellationToken) -> io::Result<Option<String>> {
    let mut bytes = Vec::new();
    let mut chunk = [0u8; CHUNK_SIZE];
    loop {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => bytes.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    String::from_utf8(bytes)
        .map(Some)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
