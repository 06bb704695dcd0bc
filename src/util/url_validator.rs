use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors from URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    MissingHost,
    #[error("Private or local address not allowed: {0}")]
    PrivateHost(String),
}

fn parse_http(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }
    Ok(url)
}

/// Validate the posts endpoint.
///
/// Only the scheme and host are checked: a local development server is a
/// legitimate endpoint.
pub fn validate_endpoint(url_str: &str) -> Result<Url, UrlValidationError> {
    parse_http(url_str)
}

/// Validate a media URL from the feed before asking the OS to open it.
///
/// Media URLs come from other users' posts, so anything pointing at the
/// local machine or a private network is refused.
pub fn validate_url_for_open(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = parse_http(url_str)?;
    let host = url.host_str().unwrap_or_default();

    if host.eq_ignore_ascii_case("localhost") {
        return Err(UrlValidationError::PrivateHost(host.to_owned()));
    }

    let bare = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if let Ok(ip) = bare.parse::<IpAddr>() {
        if is_local_ip(&ip) {
            return Err(UrlValidationError::PrivateHost(ip.to_string()));
        }
    }
    Ok(url)
}

fn is_local_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00 // unique local
                || (first & 0xffc0) == 0xfe80 // link local
        }
    }
}
