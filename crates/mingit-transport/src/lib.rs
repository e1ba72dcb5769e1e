//! Smart HTTP transport for git fetch.
//!
//! Two requests make up a clone: `GET /info/refs?service=git-upload-pack`
//! for ref discovery, and `POST /git-upload-pack` carrying the want/done
//! negotiation. Both responses are buffered fully in memory; protocol
//! parsing happens a layer up.

/// Errors that can occur during transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("HTTP error {status} from {url}")]
    Http { status: u16, url: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The service this client speaks. Only fetch is supported.
const UPLOAD_PACK: &str = "git-upload-pack";

/// A Smart HTTP connection to one remote repository.
#[derive(Debug)]
pub struct HttpTransport {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Create a transport for the repository at `url`
    /// (e.g. `https://example.com/repo.git`).
    pub fn new(url: &str) -> Result<Self, TransportError> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(TransportError::InvalidUrl(format!(
                "unsupported URL scheme: {url}"
            )));
        }
        Ok(Self {
            base_url: url.trim_end_matches('/').to_string(),
            client: reqwest::blocking::Client::new(),
        })
    }

    /// Fetch the ref advertisement: `GET <url>/info/refs?service=git-upload-pack`.
    pub fn info_refs(&self) -> Result<Vec<u8>, TransportError> {
        let url = format!("{}/info/refs?service={}", self.base_url, UPLOAD_PACK);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                url,
            });
        }

        let body = response
            .bytes()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        Ok(body.to_vec())
    }

    /// Send the upload-pack request: `POST <url>/git-upload-pack`.
    ///
    /// Returns the raw response body (acknowledgment preamble + pack).
    pub fn upload_pack(&self, request: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let url = format!("{}/{}", self.base_url, UPLOAD_PACK);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", format!("application/x-{UPLOAD_PACK}-request"))
            .header("Accept", format!("application/x-{UPLOAD_PACK}-result"))
            .body(request)
            .send()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                url,
            });
        }

        let body = response
            .bytes()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        Ok(body.to_vec())
    }
}
