use crate::error::{FetchError, Result};

const NETWORK_SCHEMES: &[&str] = &["http:", "https:", "ftp:"];

/// Fail with `UnsupportedScheme` unless `url` is an http, https or ftp URL.
pub fn check_scheme(url: &str) -> Result<()> {
    if NETWORK_SCHEMES.iter().any(|s| url.starts_with(s)) {
        Ok(())
    } else {
        Err(FetchError::UnsupportedScheme {
            url: url.to_string(),
        })
    }
}

/// Location of `feed_url` on the mirror at `mirror`.
///
/// `http://example.com/feeds/prog.xml` maps to
/// `<mirror>/feeds/http/example.com/feeds%23prog.xml/latest.xml`.
pub fn feed_mirror_url(mirror: &str, feed_url: &str) -> Result<String> {
    let invalid = |reason| FetchError::InvalidUrl {
        url: feed_url.to_string(),
        reason,
    };

    if feed_url.contains('#') {
        return Err(invalid("feed URLs may not contain '#'"));
    }
    let (scheme, rest) = feed_url
        .split_once("://")
        .ok_or_else(|| invalid("missing scheme"))?;
    let (domain, path) = rest
        .split_once('/')
        .ok_or_else(|| invalid("missing path"))?;

    for component in [scheme, domain, path] {
        if component.is_empty() {
            return Err(invalid("empty URL component"));
        }
        if component.starts_with(',') {
            return Err(invalid("URL component may not start with ','"));
        }
    }

    Ok(format!(
        "{}/feeds/{}/{}/{}/latest.xml",
        mirror.trim_end_matches('/'),
        scheme,
        domain,
        path.replace('/', "%23")
    ))
}

/// Where keys for feeds fetched from `mirror` are found.
pub fn key_mirror_url(mirror: &str) -> String {
    format!("{}/keys/", mirror.trim_end_matches('/'))
}

/// The host part of a URL, used to scope key trust.
pub fn domain_from_url(url: &str) -> Option<&str> {
    let rest = url.split_once("://")?.1;
    let host = rest.split('/').next()?;
    let host = host.rsplit_once('@').map_or(host, |(_, h)| h);
    (!host.is_empty()).then_some(host)
}

/// Escape `uri` for use as a single file name: every byte outside
/// `[A-Za-z0-9._-]` becomes `%xx`.
pub fn escape_uri(uri: &str) -> String {
    let mut out = String::with_capacity(uri.len());
    for b in uri.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02x}", b));
        }
    }
    out
}
