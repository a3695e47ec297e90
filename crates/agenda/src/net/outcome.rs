//! Classification of a finished download attempt
//!
//! Every attempt ends in exactly one [`HttpOutcome`]. Only `Ok` leads to a
//! parse step, `NotModified` ends the cycle successfully, and every other
//! value ends it as a failure without a retry of its own.

use std::fmt;
use std::io::ErrorKind;

/// Transport-level result of one schedule download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpOutcome {
    Ok,
    NotModified,
    UntrustedCertificate,
    DnsFailure,
    CouldNotConnect,
    SslSetupFailure,
    CannotParseContent,
    WrongCredentials,
    ConnectTimeout,
    NotFound,
    CleartextNotPermitted,
}

impl HttpOutcome {
    /// Every variant, for exhaustive checks in callers and tests
    pub const ALL: [HttpOutcome; 11] = [
        HttpOutcome::Ok,
        HttpOutcome::NotModified,
        HttpOutcome::UntrustedCertificate,
        HttpOutcome::DnsFailure,
        HttpOutcome::CouldNotConnect,
        HttpOutcome::SslSetupFailure,
        HttpOutcome::CannotParseContent,
        HttpOutcome::WrongCredentials,
        HttpOutcome::ConnectTimeout,
        HttpOutcome::NotFound,
        HttpOutcome::CleartextNotPermitted,
    ];

    /// True only for a fresh document that should be parsed
    pub fn is_successful(self) -> bool {
        self == HttpOutcome::Ok
    }

    /// True when the server reported the stored document is still current
    pub fn is_not_modified(self) -> bool {
        self == HttpOutcome::NotModified
    }

    /// True for every value that ends the cycle as a failure
    pub fn is_failure(self) -> bool {
        !self.is_successful() && !self.is_not_modified()
    }

    /// Map a response status code to an outcome.
    ///
    /// 200 is reported as `Ok`; reading the body can still downgrade it to
    /// `CannotParseContent`.
    pub fn from_status(status: u16) -> Self {
        match status {
            200 => HttpOutcome::Ok,
            304 => HttpOutcome::NotModified,
            401 => HttpOutcome::WrongCredentials,
            404 => HttpOutcome::NotFound,
            _ => HttpOutcome::CouldNotConnect,
        }
    }

    /// Map a transport error raised before a response arrived
    pub fn from_transport_error(error: &ureq::Error) -> Self {
        match error {
            ureq::Error::StatusCode(code) => Self::from_status(*code),
            ureq::Error::Timeout(_) => HttpOutcome::ConnectTimeout,
            ureq::Error::HostNotFound => HttpOutcome::DnsFailure,
            ureq::Error::RequireHttpsOnly(_) => HttpOutcome::CleartextNotPermitted,
            ureq::Error::ConnectionFailed => HttpOutcome::CouldNotConnect,
            ureq::Error::Io(io) => Self::from_io_error(io),
            other => Self::from_message(&other.to_string()),
        }
    }

    fn from_io_error(error: &std::io::Error) -> Self {
        match error.kind() {
            ErrorKind::TimedOut => HttpOutcome::ConnectTimeout,
            ErrorKind::InvalidData | ErrorKind::UnexpectedEof => HttpOutcome::CannotParseContent,
            _ => Self::from_message(&error.to_string()),
        }
    }

    /// TLS errors surface with backend specific types; fall back on their text.
    fn from_message(message: &str) -> Self {
        let message = message.to_ascii_lowercase();
        if message.contains("certificate") || message.contains("unknownissuer") {
            HttpOutcome::UntrustedCertificate
        } else if message.contains("tls")
            || message.contains("ssl")
            || message.contains("handshake")
        {
            HttpOutcome::SslSetupFailure
        } else if message.contains("dns") || message.contains("resolve") {
            HttpOutcome::DnsFailure
        } else if message.contains("timed out") || message.contains("timeout") {
            HttpOutcome::ConnectTimeout
        } else {
            HttpOutcome::CouldNotConnect
        }
    }
}

impl fmt::Display for HttpOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HttpOutcome::Ok => "ok",
            HttpOutcome::NotModified => "not modified",
            HttpOutcome::UntrustedCertificate => "untrusted certificate",
            HttpOutcome::DnsFailure => "dns failure",
            HttpOutcome::CouldNotConnect => "could not connect",
            HttpOutcome::SslSetupFailure => "ssl setup failure",
            HttpOutcome::CannotParseContent => "cannot parse content",
            HttpOutcome::WrongCredentials => "wrong credentials",
            HttpOutcome::ConnectTimeout => "connect timeout",
            HttpOutcome::NotFound => "not found",
            HttpOutcome::CleartextNotPermitted => "cleartext not permitted",
        };
        f.write_str(label)
    }
}
