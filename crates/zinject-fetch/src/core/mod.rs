//! Pure functions: URL rules, mirror locations and error aggregation.

mod aggregate;
mod url;

pub use aggregate::FirstError;
pub use url::{check_scheme, domain_from_url, escape_uri, feed_mirror_url, key_mirror_url};
