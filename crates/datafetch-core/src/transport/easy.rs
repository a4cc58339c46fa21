//! libcurl-backed transport (one Easy handle per transfer).

use super::classify;
use super::{TransferReport, Transport, TransportOptions};
use crate::cancel::CancelToken;
use crate::error::{FetchError, FetchErrorKind};
use std::io::{self, Write};
use url::Url;

/// Plain or TLS transfer via libcurl, chosen by the URL scheme.
/// Peer and host verification stay on for `https`.
#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    options: TransportOptions,
}

impl CurlTransport {
    pub fn new(options: TransportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    fn configure(
        &self,
        easy: &mut curl::easy::Easy,
        url: &Url,
        headers: &[(String, String)],
    ) -> Result<(), curl::Error> {
        let opts = &self.options;
        easy.url(url.as_str())?;
        easy.follow_location(true)?;
        easy.max_redirections(opts.max_redirections)?;
        easy.connect_timeout(opts.connect_timeout())?;
        // Low-speed abort catches stalled links; the hard timeout is the safety net.
        easy.low_speed_limit(opts.low_speed_limit_bytes)?;
        easy.low_speed_time(opts.low_speed_time())?;
        easy.timeout(opts.timeout())?;
        easy.useragent(&opts.user_agent)?;
        // Progress callback is how cancellation is observed.
        easy.progress(true)?;

        if !headers.is_empty() {
            let mut list = curl::easy::List::new();
            for (k, v) in headers {
                list.append(&format!("{}: {}", k.trim(), v.trim()))?;
            }
            easy.http_headers(list)?;
        }
        Ok(())
    }
}

impl Transport for CurlTransport {
    fn transfer(
        &self,
        url: &Url,
        headers: &[(String, String)],
        sink: &mut dyn Write,
        cancel: Option<&CancelToken>,
    ) -> Result<TransferReport, FetchError> {
        let remote = url.as_str();
        let mut easy = curl::easy::Easy::new();
        self.configure(&mut easy, url, headers)
            .map_err(|e| classify::fetch_error(e, remote))?;

        let mut bytes = 0u64;
        let mut sink_error: Option<io::Error> = None;
        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| match sink.write_all(data) {
                    Ok(()) => {
                        bytes += data.len() as u64;
                        Ok(data.len())
                    }
                    Err(e) => {
                        sink_error = Some(e);
                        // Short count makes libcurl abort with a write error.
                        Ok(0)
                    }
                })
                .map_err(|e| classify::fetch_error(e, remote))?;
            transfer
                .progress_function(|_, _, _, _| !cancel.is_some_and(CancelToken::is_cancelled))
                .map_err(|e| classify::fetch_error(e, remote))?;
            transfer.perform()
        };

        if let Err(e) = performed {
            if e.is_write_error() {
                if let Some(io_err) = sink_error {
                    return Err(FetchError::new(FetchErrorKind::Io, remote).with_source(io_err));
                }
            }
            tracing::debug!(url = %remote, "transfer failed: {}", e);
            return Err(classify::fetch_error(e, remote));
        }

        sink.flush()
            .map_err(|e| FetchError::new(FetchErrorKind::Io, remote).with_source(e))?;
        let status = easy
            .response_code()
            .map_err(|e| classify::fetch_error(e, remote))?;
        tracing::debug!(url = %remote, status, bytes, "transfer complete");
        Ok(TransferReport { status, bytes })
    }
}
