//! Blocking HTTP GET for source adapters.
//!
//! Uses async reqwest internally on a shared tokio runtime, but presents a
//! sync interface: every adapter call blocks the calling thread until the
//! response body arrives or the per-request timeout elapses.

use std::sync::LazyLock;
use std::time::Duration;

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sent with every upstream request
pub const USER_AGENT: &str = concat!("litstream/", env!("CARGO_PKG_VERSION"));

/// Error types for upstream requests
#[derive(Debug)]
pub enum StreamError {
    /// HTTP error with optional status code
    Http {
        status: Option<u16>,
        message: String,
    },
    /// I/O error
    Io(std::io::Error),
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for StreamError {}

impl StreamError {
    /// Create HTTP error from reqwest error.
    ///
    /// The URL is stripped: query strings may carry an API key.
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        let message = if e.is_timeout() {
            "request timed out".to_string()
        } else {
            e.without_url_ref().to_string()
        };
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Http { message, .. } => message == "request timed out",
            Self::Io(e) => e.kind() == std::io::ErrorKind::TimedOut,
        }
    }
}

impl From<std::io::Error> for StreamError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Strip the URL from a reqwest error without consuming it.
trait WithoutUrlRef {
    fn without_url_ref(&self) -> String;
}

impl WithoutUrlRef for reqwest::Error {
    fn without_url_ref(&self) -> String {
        let full = self.to_string();
        match self.url() {
            Some(url) => full.replace(&format!(" ({url})"), "").replace(url.as_str(), "<url>"),
            None => full,
        }
    }
}

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(USER_AGENT)
        .pool_max_idle_per_host(4)
        .build()
        .expect("failed to build HTTP client")
});

/// Get shared HTTP client.
pub fn http_client() -> &'static reqwest::Client {
    &SHARED_CLIENT
}

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Read-only upstream access used by the adapters.
///
/// Implemented over HTTP in production and by recording fakes in tests.
pub trait Transport {
    /// GET `url` with query `params`, returning the body text on 2xx.
    fn get(
        &self,
        url: &str,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> Result<String, StreamError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(
        &self,
        url: &str,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> Result<String, StreamError> {
        (**self).get(url, params, timeout)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn get(
        &self,
        url: &str,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> Result<String, StreamError> {
        (**self).get(url, params, timeout)
    }
}

/// [`Transport`] over the shared reqwest client.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTransport;

impl Transport for HttpTransport {
    fn get(
        &self,
        url: &str,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> Result<String, StreamError> {
        SHARED_RUNTIME.handle().block_on(async {
            let response = http_client()
                .get(url)
                .query(params)
                .timeout(timeout)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| StreamError::from_reqwest(&e))?;
            response
                .text()
                .await
                .map_err(|e| StreamError::from_reqwest(&e))
        })
    }
}
