//! Blocking HTTP client for the cube server.

use std::io::Cursor;
use std::time::Duration;

use reqwest::blocking::Client;

use super::error::{TransportError, TransportResult};
use super::{wire, ByteStream, Descriptor, Transport};
use crate::config::{ConnectionSettings, SettingsError};

/// Default timeout for requests (30 seconds).
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP transport speaking the semicolon-CSV protocol.
///
/// Every request is a `GET` of `<base_url><path>` with the descriptor's
/// parameters in the query string. A session id, when configured, is added as
/// the `sid` parameter; obtaining it is the caller's business.
///
/// # Example
///
/// ```ignore
/// use cubeport::transport::{Descriptor, HttpTransport, Transport};
///
/// let transport = HttpTransport::new("http://localhost:7777")?.with_session("abcd");
/// let rows = transport.send(&Descriptor::new("/server/databases"))?;
/// ```
pub struct HttpTransport {
    client: Client,
    base_url: String,
    session: Option<String>,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport for a server base URL.
    pub fn new(base_url: impl Into<String>) -> TransportResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Create a transport from a named connection in the settings file.
    pub fn from_settings(settings: &ConnectionSettings) -> Result<Self, SettingsError> {
        let base_url = settings.resolved_base_url()?;
        let mut transport = Self::new(base_url)
            .map_err(|e| SettingsError::InvalidConfig(e.to_string()))?
            .with_timeout(Duration::from_secs(settings.timeout_secs));
        if let Some(session) = settings.resolved_session()? {
            transport = transport.with_session(session);
        }
        Ok(transport)
    }

    /// Attach a session id to every request.
    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }

    /// Set the per-request timeout.
    ///
    /// It covers connecting, the response headers and the body transfer.
    /// Bodies are read in full before [`Transport::send_raw`] returns, so a
    /// slow consumer of an export page never hits it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the current request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Classify a failed response into a transport error.
    ///
    /// The server reports failures as a single `code;message;...` row.
    fn classify_error(status: u16, body: &str) -> TransportError {
        match wire::parse_rows(body.as_bytes()) {
            Ok(rows) => match rows.first().map(Vec::as_slice) {
                Some([code, message, ..]) if !code.is_empty() => {
                    TransportError::remote(code.as_str(), message.as_str())
                }
                _ => TransportError::Status { status },
            },
            Err(_) => TransportError::Status { status },
        }
    }
}

impl Transport for HttpTransport {
    fn send_raw(&self, descriptor: &Descriptor) -> TransportResult<ByteStream> {
        let url = format!("{}{}", self.base_url, descriptor.path());
        log::debug!("GET {}", descriptor);

        let mut request = self
            .client
            .get(&url)
            .query(descriptor.params())
            .timeout(self.timeout);
        if let Some(session) = &self.session {
            request = request.query(&[("sid", session.as_str())]);
        }

        let failed = |e: reqwest::Error| {
            if e.is_timeout() {
                TransportError::Timeout(self.timeout.as_secs())
            } else {
                TransportError::RequestFailed(e)
            }
        };
        let response = request.send().map_err(failed)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Self::classify_error(status.as_u16(), &body));
        }

        // The timeout runs until the body is read, so a page is buffered
        // here rather than left to the pace of the caller.
        let body = response.bytes().map_err(failed)?;
        Ok(Box::new(Cursor::new(body)))
    }
}
