//! S3-compatible metadata fetch over plain HTTP `HEAD` via libcurl.
//!
//! Requests are unsigned: this targets public buckets and S3-compatible
//! endpoints that allow anonymous `HEAD`.

use std::str;
use std::time::Duration;

use url::Url;

use crate::config::{Addressing, ObjmetaConfig};
use crate::control::CancelToken;
use crate::error::ConfigError;
use crate::key_source::Key;
use crate::retry::FetchError;

use super::parse;
use super::{MetadataClient, ObjectMetadata, ObjectStore};

/// Shared configuration for HTTP clients: endpoint, addressing style, timeouts.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    endpoint: Url,
    addressing: Addressing,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl HttpObjectStore {
    /// Validate `endpoint` (must be an absolute http/https URL with a host).
    pub fn new(endpoint: &str, addressing: Addressing) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        };
        let url = Url::parse(endpoint).map_err(|e| invalid(&e.to_string()))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(invalid("scheme must be http or https"));
        }
        if url.host_str().is_none() || url.cannot_be_a_base() {
            return Err(invalid("missing host"));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("query and fragment are not allowed"));
        }
        Ok(Self {
            endpoint: url,
            addressing,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        })
    }

    pub fn from_config(cfg: &ObjmetaConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(&cfg.endpoint, cfg.addressing)?.with_timeouts(
            Duration::from_secs(cfg.connect_timeout_secs),
            Duration::from_secs(cfg.request_timeout_secs),
        ))
    }

    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// URL of `key` in `bucket` under this store's addressing style.
    pub fn object_url(&self, bucket: &str, key: &Key) -> Result<String, FetchError> {
        object_url(&self.endpoint, self.addressing, bucket, key)
    }
}

/// Bucket URL ending in `/`, followed by the key with every `/`-separated
/// segment percent-encoded. Built as a string because `Url` removes `.` and
/// `..` segments (encoded or not), which are legal in object keys.
fn object_url(
    endpoint: &Url,
    addressing: Addressing,
    bucket: &str,
    key: &Key,
) -> Result<String, FetchError> {
    let mut base = endpoint.clone();
    if addressing == Addressing::Virtual {
        let host = endpoint
            .host_str()
            .ok_or_else(|| FetchError::InvalidUrl(format!("{endpoint} has no host")))?;
        base.set_host(Some(&format!("{bucket}.{host}")))
            .map_err(|e| FetchError::InvalidUrl(format!("bucket {bucket:?}: {e}")))?;
    }
    {
        let mut segments = base
            .path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(format!("{endpoint} cannot be a base")))?;
        segments.pop_if_empty();
        if addressing == Addressing::Path {
            segments.push(bucket);
        }
        segments.push("");
    }

    let mut url = String::from(base.as_str());
    for (i, segment) in key.as_str().split('/').enumerate() {
        if i > 0 {
            url.push('/');
        }
        url.push_str(&encode_segment(segment));
    }
    Ok(url)
}

fn encode_segment(segment: &str) -> String {
    match segment {
        "." => "%2E".to_string(),
        ".." => "%2E%2E".to_string(),
        // form encoding turns spaces into `+` and escapes literal `+`, so any
        // `+` left in the output was a space.
        _ => url::form_urlencoded::byte_serialize(segment.as_bytes())
            .collect::<String>()
            .replace('+', "%20"),
    }
}

impl ObjectStore for HttpObjectStore {
    type Client = HttpClient;

    fn connect(&self, cancel: &CancelToken) -> Result<HttpClient, FetchError> {
        let mut easy = curl::easy::Easy::new();
        easy.nobody(true)?; // HEAD request
        // Send `.`/`..` key segments verbatim instead of resolving them.
        easy.path_as_is(true)?;
        easy.follow_location(true)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.request_timeout)?;
        // Needed for the progress callback that aborts on cancellation.
        easy.progress(true)?;
        Ok(HttpClient {
            easy,
            endpoint: self.endpoint.clone(),
            addressing: self.addressing,
            cancel: cancel.clone(),
        })
    }
}

/// One worker's curl handle. Reused across keys so connections are kept alive.
pub struct HttpClient {
    easy: curl::easy::Easy,
    endpoint: Url,
    addressing: Addressing,
    cancel: CancelToken,
}

impl MetadataClient for HttpClient {
    fn fetch(&mut self, bucket: &str, key: &Key) -> Result<ObjectMetadata, FetchError> {
        if self.cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        let url = object_url(&self.endpoint, self.addressing, bucket, key)?;
        self.easy.url(&url)?;

        let mut headers: Vec<String> = Vec::new();
        let cancel = &self.cancel;
        {
            // The transfer (and its callbacks' borrows) ends with this scope on every path.
            let mut transfer = self.easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    headers.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.progress_function(|_, _, _, _| !cancel.is_cancelled())?;
            transfer.perform().map_err(|e| {
                if e.is_aborted_by_callback() {
                    FetchError::Cancelled
                } else {
                    FetchError::Curl(e)
                }
            })?;
        }

        let code = self.easy.response_code()?;
        tracing::trace!(url = %url, code, "HEAD complete");
        match code {
            200..=299 => {}
            404 => return Err(FetchError::NotFound),
            _ => return Err(FetchError::Http(code)),
        }

        let fields = parse::parse_headers(&headers);
        let size = fields.content_length.ok_or(FetchError::MissingSize)?;
        Ok(ObjectMetadata {
            size,
            encoding: fields.server_side_encryption,
        })
    }
}
