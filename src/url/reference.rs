//! Immutable reference URL for outbound construction.

use std::fmt;

/// Anchor for absolute URL construction.
///
/// Carries the scheme, host and base path that constructed URLs are
/// rooted at. Immutable; `with_host` and `with_path` return new views,
/// which is how domain- and path-scoped lists adjust the anchor for
/// their children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefUrl {
    scheme: String,
    host: String,
    path: String,
}

impl RefUrl {
    /// Create a reference URL. The path is normalised to start and end
    /// with `/`; it acts as the base that relative routes prepend.
    #[must_use]
    pub fn new(scheme: &str, host: &str, path: &str) -> Self {
        Self {
            scheme: scheme.to_string(),
            host: host.to_string(),
            path: normalize(path),
        }
    }

    /// Adapt an already-parsed [`url::Url`].
    #[must_use]
    pub fn from_url(url: &url::Url) -> Self {
        Self::new(
            url.scheme(),
            url.host_str().unwrap_or_default(),
            url.path(),
        )
    }

    /// A new view with the host replaced.
    #[must_use]
    pub fn with_host(&self, host: &str) -> Self {
        Self {
            scheme: self.scheme.clone(),
            host: host.to_string(),
            path: self.path.clone(),
        }
    }

    /// A new view with the base path replaced.
    #[must_use]
    pub fn with_path(&self, path: &str) -> Self {
        Self {
            scheme: self.scheme.clone(),
            host: self.host.clone(),
            path: normalize(path),
        }
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

    /// Base path, starting and ending with `/`.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for RefUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.host, self.path)
    }
}

fn normalize(path: &str) -> String {
    let mut path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    if !path.ends_with('/') {
        path.push('/');
    }
    path
}
