//! Blocking HTTP GET over libcurl, body buffered in memory.

use super::Transport;
use crate::error::InstallError;
use std::time::Duration;
use url::Url;

/// Timeouts applied to every request.
#[derive(Debug, Clone, Copy)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    /// Whole-transfer limit. Hitting it is reported as a fetch failure.
    pub timeout: Duration,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Production transport: one `curl::easy::Easy` per request.
#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    opts: CurlOptions,
}

impl CurlTransport {
    pub fn new(opts: CurlOptions) -> Self {
        Self { opts }
    }
}

impl Transport for CurlTransport {
    fn get(&self, url: &Url) -> Result<Vec<u8>, InstallError> {
        let fail = |reason: String| InstallError::RemoteFetchError {
            url: url.to_string(),
            reason,
        };
        let curl_err = |e: curl::Error| fail(e.to_string());

        let mut body = Vec::new();
        let mut easy = curl::easy::Easy::new();
        easy.url(url.as_str()).map_err(curl_err)?;
        easy.follow_location(true).map_err(curl_err)?;
        easy.max_redirections(10).map_err(curl_err)?;
        easy.connect_timeout(self.opts.connect_timeout)
            .map_err(curl_err)?;
        easy.timeout(self.opts.timeout).map_err(curl_err)?;
        easy.useragent(concat!("rebarup/", env!("CARGO_PKG_VERSION")))
            .map_err(curl_err)?;

        {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(curl_err)?;
            transfer.perform().map_err(|e| {
                if e.is_operation_timedout() {
                    fail(format!("timed out: {e}"))
                } else {
                    fail(e.to_string())
                }
            })?;
        }

        let code = easy.response_code().map_err(curl_err)?;
        if !(200..300).contains(&code) {
            return Err(fail(format!("HTTP {code}")));
        }
        tracing::debug!(%url, bytes = body.len(), "GET complete");
        Ok(body)
    }
}
