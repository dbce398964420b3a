//! Link normalization
//!
//! Rewrites non-ASCII host labels to their punycode form so the link can be
//! requested. Everything outside the host is left byte-for-byte intact.

use crate::error::NormalizationError;
use url::{ParseError, Url};

/// Turn a matched link into a request-safe URL.
///
/// ASCII-only links are returned unchanged without parsing; they are the
/// common case.
pub fn normalize(raw: &str) -> Result<String, NormalizationError> {
    if raw.is_ascii() {
        return Ok(raw.to_string());
    }

    let parsed = Url::parse(raw).map_err(|e| match e {
        ParseError::IdnaError => NormalizationError::HostEncoding(raw.to_string()),
        other => NormalizationError::InvalidUrl {
            url: raw.to_string(),
            reason: other.to_string(),
        },
    })?;

    let ascii_host = parsed
        .host_str()
        .ok_or_else(|| NormalizationError::MissingHost(raw.to_string()))?;

    splice_host(raw, ascii_host).ok_or_else(|| NormalizationError::InvalidUrl {
        url: raw.to_string(),
        reason: "could not locate host".to_string(),
    })
}

/// Replace the host portion of `raw` with `host`, keeping scheme, userinfo,
/// port, path, query and fragment exactly as written.
fn splice_host(raw: &str, host: &str) -> Option<String> {
    let authority_start = raw.find("://")? + 3;
    let rest = &raw[authority_start..];
    let authority_len = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..authority_len];

    let host_offset = authority.rfind('@').map_or(0, |at| at + 1);
    let host_and_port = &authority[host_offset..];
    let host_len = if host_and_port.starts_with('[') {
        host_and_port.find(']')? + 1
    } else {
        host_and_port.find(':').unwrap_or(host_and_port.len())
    };

    let host_start = authority_start + host_offset;
    let host_end = host_start + host_len;

    let mut out = String::with_capacity(raw.len() + host.len());
    out.push_str(&raw[..host_start]);
    out.push_str(host);
    out.push_str(&raw[host_end..]);
    Some(out)
}
