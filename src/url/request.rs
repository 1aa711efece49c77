//! Read-only view of an inbound request URL.

use crate::params::Params;
use serde_json::Value;

/// Inbound request view consumed by `match_request`.
///
/// The path is split into a *base path* (the prefix owned by whatever
/// mounted the router, always starting and ending with `/`) and a
/// *relative path* (what masks are matched against). The router never
/// mutates a view; path-scoped lists call [`RequestUrl::with_base_path`]
/// to derive a re-based copy for their children.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestUrl {
    scheme: String,
    host: String,
    path: String,
    base_path: String,
    query: Params,
}

impl RequestUrl {
    /// Create a view with the root base path `/` and an empty query.
    #[must_use]
    pub fn new(scheme: &str, host: &str, path: &str) -> Self {
        Self {
            scheme: scheme.to_string(),
            host: host.to_string(),
            path: normalize_path(path),
            base_path: "/".to_string(),
            query: Params::new(),
        }
    }

    /// Adapt an already-parsed [`url::Url`].
    ///
    /// The query string is decoded by the `url` crate; duplicate keys
    /// keep the last occurrence.
    #[must_use]
    pub fn from_url(url: &url::Url) -> Self {
        let mut query = Params::new();
        for (key, value) in url.query_pairs() {
            query.insert(key.into_owned(), Value::String(value.into_owned()));
        }
        Self {
            scheme: url.scheme().to_string(),
            host: url.host_str().unwrap_or_default().to_string(),
            path: normalize_path(url.path()),
            base_path: "/".to_string(),
            query,
        }
    }

    /// Attach a decoded query mapping, replacing any existing one.
    #[must_use]
    pub fn with_query(mut self, query: Params) -> Self {
        self.query = query;
        self
    }

    /// Derive a view with a different path, keeping host and query.
    #[must_use]
    pub fn with_path(&self, path: &str) -> Self {
        let mut view = self.clone();
        view.path = normalize_path(path);
        view
    }

    /// Derive a view with a different base path.
    ///
    /// The path itself is untouched; only the split between base and
    /// relative part moves. The base is normalised to start and end
    /// with `/`.
    #[must_use]
    pub fn with_base_path(&self, base_path: &str) -> Self {
        let mut view = self.clone();
        view.base_path = normalize_base(base_path);
        view
    }

    #[inline]
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Absolute request path, always starting with `/`.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// The path with the base prefix removed; never starts with `/`.
    #[must_use]
    pub fn relative_path(&self) -> &str {
        self.path
            .strip_prefix(self.base_path.as_str())
            .unwrap_or_else(|| self.path.trim_start_matches('/'))
    }

    /// Decoded query mapping.
    #[inline]
    #[must_use]
    pub fn query(&self) -> &Params {
        &self.query
    }
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

fn normalize_base(base: &str) -> String {
    let mut base = normalize_path(base);
    if !base.ends_with('/') {
        base.push('/');
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_strips_base() {
        let request = RequestUrl::new("http", "example.com", "/admin/users");
        assert_eq!(request.relative_path(), "admin/users");

        let scoped = request.with_base_path("/admin");
        assert_eq!(scoped.base_path(), "/admin/");
        assert_eq!(scoped.relative_path(), "users");
    }

    #[test]
    fn from_url_decodes_query() {
        let url = url::Url::parse("http://example.com/a?x=1&y=a%20b").unwrap();
        let request = RequestUrl::from_url(&url);
        assert_eq!(request.query().get_str("x"), Some("1"));
        assert_eq!(request.query().get_str("y"), Some("a b"));
    }
}
