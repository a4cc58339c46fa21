//! Map libcurl failures onto `FetchErrorKind`.

use crate::error::{FetchError, FetchErrorKind};

pub(super) fn classify_curl_error(e: &curl::Error) -> FetchErrorKind {
    if e.is_aborted_by_callback() {
        return FetchErrorKind::Cancelled;
    }
    if e.is_operation_timedout() {
        return FetchErrorKind::Timeout;
    }
    if e.is_couldnt_resolve_host() || e.is_couldnt_resolve_proxy() {
        return FetchErrorKind::Resolve;
    }
    if e.is_couldnt_connect() {
        return FetchErrorKind::Connect;
    }
    if e.is_ssl_connect_error()
        || e.is_peer_failed_verification()
        || e.is_ssl_certproblem()
        || e.is_ssl_cipher()
    {
        return FetchErrorKind::Tls;
    }
    if e.is_partial_file()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_read_error()
    {
        return FetchErrorKind::Interrupted;
    }
    if e.is_url_malformed() || e.is_unsupported_protocol() {
        return FetchErrorKind::InvalidAddress;
    }
    FetchErrorKind::Other
}

pub(super) fn fetch_error(e: curl::Error, remote: &str) -> FetchError {
    FetchError::new(classify_curl_error(&e), remote).with_source(e)
}
