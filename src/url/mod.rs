//! # URL Adapter Module
//!
//! The router never parses wire bytes. It consumes two already-parsed
//! views defined here:
//!
//! - [`RequestUrl`] - a read-only view of the inbound request (scheme,
//!   host, path, base path, query mapping) with a modifier that
//!   produces a re-based view for path-scoped lists.
//! - [`RefUrl`] - an immutable reference URL anchoring outbound
//!   construction, with `with_host` / `with_path` modifiers returning
//!   new views.
//!
//! Both types offer `from_url` constructors so applications can hand
//! over a [`url::Url`] and let that crate do the parsing.
//!
//! The module also hosts the `%tld%` / `%domain%` / `%sld%` host
//! expansion used for domain-scoped routing.

mod domain;
mod reference;
mod request;

pub use domain::expand_domain;
pub(crate) use domain::host_parts;
pub use reference::RefUrl;
pub use request::RequestUrl;

use std::borrow::Cow;

/// Percent-encode a value destined for a path segment.
///
/// Unlike query encoding, a `/` produced by a wildcard-style
/// placeholder (one whose regex admits slashes) must survive encoding
/// so the constructed path round-trips through a re-match.
pub(crate) fn encode_path_component(value: &str) -> String {
    let encoded: Cow<'_, str> = urlencoding::encode(value);
    if encoded.contains("%2F") {
        encoded.replace("%2F", "/")
    } else {
        encoded.into_owned()
    }
}

/// Percent-encode a query-string key or value.
pub(crate) fn encode_query_component(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_encoding_preserves_slashes() {
        assert_eq!(encode_path_component("a b"), "a%20b");
        assert_eq!(encode_path_component("a/b c"), "a/b%20c");
    }

    #[test]
    fn query_encoding_escapes_slashes() {
        assert_eq!(encode_query_component("a/b"), "a%2Fb");
    }
}
