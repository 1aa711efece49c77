//! Router broker.

use super::cache::DispatchCache;
use crate::error::RouterError;
use crate::params::Params;
use crate::route::Route;
use crate::router::{Router, ONE_WAY};
use crate::runtime_config::RuntimeConfig;
use crate::url::{expand_domain, RefUrl, RequestUrl};
use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{OnceLock, RwLock};
use tracing::{debug, info, warn};

/// Ordered composition of routers with optional domain/path scoping
/// and a construction-time dispatch cache.
///
/// Matching walks children in insertion order and returns the first
/// hit; construction consults the cache to probe only the children
/// that can possibly produce a URL for the given parameters. The list
/// is mutable during setup; after [`Router::warm_up`] it is safe for
/// shared concurrent reads as long as it is no longer mutated.
///
/// A `RouteList` is itself a [`Router`], so lists nest arbitrarily -
/// either explicitly via [`RouteList::add`] or with the scoped
/// [`RouteList::with_domain`] / [`RouteList::with_path`] builders.
pub struct RouteList {
    entries: Vec<Entry>,
    domain: Option<String>,
    path: Option<String>,
    cache: OnceLock<DispatchCache>,
    /// Domain/path-adjusted reference URLs, keyed by their string form
    ref_memo: RwLock<HashMap<String, RefUrl>>,
    use_cache: bool,
}

pub(crate) struct Entry {
    child: Child,
    flags: u32,
}

enum Child {
    Router(Box<dyn Router>),
    List(RouteList),
}

impl Entry {
    pub(crate) fn router(&self) -> &dyn Router {
        match &self.child {
            Child::Router(router) => router.as_ref(),
            Child::List(list) => list,
        }
    }

    pub(crate) fn is_one_way(&self) -> bool {
        self.flags & ONE_WAY != 0
    }
}

impl Default for RouteList {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteList {
    /// Create an empty list configured from the environment.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::from_env())
    }

    /// Create an empty list with an explicit runtime configuration.
    #[must_use]
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            entries: Vec::new(),
            domain: None,
            path: None,
            cache: OnceLock::new(),
            ref_memo: RwLock::new(HashMap::new()),
            use_cache: config.dispatch_cache,
        }
    }

    /// Append a router. Invalidates the dispatch cache.
    pub fn add(&mut self, router: impl Router + 'static, flags: u32) -> &mut Self {
        self.invalidate();
        self.entries.push(Entry {
            child: Child::Router(Box::new(router)),
            flags,
        });
        self
    }

    /// Insert a router at the front. Invalidates the dispatch cache.
    pub fn prepend(&mut self, router: impl Router + 'static, flags: u32) -> &mut Self {
        self.invalidate();
        self.entries.insert(
            0,
            Entry {
                child: Child::Router(Box::new(router)),
                flags,
            },
        );
        self
    }

    /// Compile `mask` and append the resulting [`Route`].
    ///
    /// # Errors
    ///
    /// Propagates mask compilation failures.
    pub fn add_route(&mut self, mask: &str, flags: u32) -> Result<&mut Self, RouterError> {
        let route = Route::new(mask)?;
        Ok(self.add(route, flags))
    }

    /// Replace (`Some`) or delete (`None`) the router at `index`.
    ///
    /// Replacement keeps the flags of the slot; deletion shifts later
    /// entries down. Invalidates the dispatch cache.
    ///
    /// # Errors
    ///
    /// `OutOfRange` when `index` is past the end.
    pub fn modify(
        &mut self,
        index: usize,
        router: Option<Box<dyn Router>>,
    ) -> Result<(), RouterError> {
        if index >= self.entries.len() {
            return Err(RouterError::OutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        self.invalidate();
        match router {
            Some(router) => self.entries[index].child = Child::Router(router),
            None => {
                warn!(index, "removing router from the list");
                self.entries.remove(index);
            }
        }
        Ok(())
    }

    /// Open a nested list gated on a domain pattern.
    ///
    /// The pattern may use `%tld%` / `%domain%` / `%sld%`, expanded
    /// from the request host on match and from the reference host on
    /// construction. Call [`Nested::end`] to return to `self`.
    pub fn with_domain(&mut self, pattern: &str) -> Nested<'_> {
        self.invalidate();
        let mut child = RouteList::with_config(RuntimeConfig {
            dispatch_cache: self.use_cache,
        });
        child.domain = Some(pattern.to_string());
        self.attach(child)
    }

    /// Open a nested list gated on a path prefix.
    ///
    /// The prefix is normalised to end in `/` at registration; request
    /// paths are never rewritten to compensate for a missing slash.
    pub fn with_path(&mut self, prefix: &str) -> Nested<'_> {
        self.invalidate();
        let mut child = RouteList::with_config(RuntimeConfig {
            dispatch_cache: self.use_cache,
        });
        child.path = Some(normalize_prefix(prefix));
        self.attach(child)
    }

    fn attach(&mut self, child: RouteList) -> Nested<'_> {
        self.entries.push(Entry {
            child: Child::List(child),
            flags: 0,
        });
        let index = self.entries.len() - 1;
        Nested {
            parent: self,
            index,
        }
    }

    fn nested_at(&self, index: usize) -> &RouteList {
        match &self.entries[index].child {
            Child::List(list) => list,
            Child::Router(_) => unreachable!("scoped entries always hold nested lists"),
        }
    }

    fn nested_at_mut(&mut self, index: usize) -> &mut RouteList {
        match &mut self.entries[index].child {
            Child::List(list) => list,
            Child::Router(_) => unreachable!("scoped entries always hold nested lists"),
        }
    }

    /// Number of child routers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The dispatch-cache discriminator, once the cache is warm.
    #[must_use]
    pub fn cache_key(&self) -> Option<&str> {
        self.cache.get().and_then(|cache| cache.key.as_deref())
    }

    fn invalidate(&mut self) {
        self.cache = OnceLock::new();
    }

    fn dispatch_cache(&self) -> &DispatchCache {
        let entries = &self.entries;
        self.cache.get_or_init(|| {
            let cache = DispatchCache::build(entries);
            info!(
                children = entries.len(),
                cache_key = ?cache.key,
                buckets = cache.bucket_count(),
                "dispatch cache warmed"
            );
            cache
        })
    }

    /// Domain/path-adjusted reference URL, memoised per reference URL.
    fn adjust_ref(&self, ref_url: &RefUrl) -> RefUrl {
        if self.domain.is_none() && self.path.is_none() {
            return ref_url.clone();
        }
        let key = ref_url.to_string();
        let hit = self
            .ref_memo
            .read()
            .ok()
            .and_then(|memo| memo.get(&key).cloned());
        if let Some(hit) = hit {
            return hit;
        }
        let mut adjusted = ref_url.clone();
        if let Some(domain) = &self.domain {
            adjusted = adjusted.with_host(&expand_domain(domain, ref_url.host()));
        }
        if let Some(prefix) = &self.path {
            adjusted = adjusted.with_path(&format!("{}{}", adjusted.path(), prefix));
        }
        if let Ok(mut memo) = self.ref_memo.write() {
            memo.insert(key, adjusted.clone());
        }
        adjusted
    }
}

impl Router for RouteList {
    fn match_request(&self, request: &RequestUrl) -> Option<Params> {
        if let Some(domain) = &self.domain {
            if expand_domain(domain, request.host()) != request.host() {
                debug!(
                    domain = %domain,
                    host = request.host(),
                    "domain gate rejected request"
                );
                return None;
            }
        }
        let scoped;
        let request = match &self.path {
            Some(prefix) => {
                if !request.relative_path().starts_with(prefix.as_str()) {
                    debug!(
                        prefix = %prefix,
                        path = request.relative_path(),
                        "path gate rejected request"
                    );
                    return None;
                }
                scoped = request.with_base_path(&format!("{}{}", request.base_path(), prefix));
                &scoped
            }
            None => request,
        };
        self.entries
            .iter()
            .filter(|entry| !entry.is_one_way())
            .find_map(|entry| entry.router().match_request(request))
    }

    fn construct_url(&self, params: &Params, ref_url: &RefUrl) -> Option<String> {
        let ref_url = self.adjust_ref(ref_url);
        if self.use_cache {
            let cache = self.dispatch_cache();
            for &index in cache.bucket_for(params) {
                if let Some(url) = self.entries[index].router().construct_url(params, &ref_url) {
                    return Some(url);
                }
            }
        } else {
            // cache disabled: the transparent linear scan
            for entry in &self.entries {
                if let Some(url) = entry.router().construct_url(params, &ref_url) {
                    return Some(url);
                }
            }
        }
        None
    }

    fn warm_up(&self) {
        for entry in &self.entries {
            entry.router().warm_up();
        }
        if self.use_cache {
            let _ = self.dispatch_cache();
        }
    }
}

impl fmt::Debug for RouteList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteList")
            .field("children", &self.entries.len())
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("warmed", &self.cache.get().is_some())
            .finish()
    }
}

/// Borrow guard over a nested scoped list.
///
/// Dereferences to the nested [`RouteList`] so routes can be added
/// directly; [`Nested::end`] hands the parent back. The guard borrow
/// is the back-reference: the nested list itself is owned by the
/// parent, never by the guard.
pub struct Nested<'p> {
    parent: &'p mut RouteList,
    index: usize,
}

impl<'p> Nested<'p> {
    /// Finish the scoped block and return to the parent list.
    pub fn end(self) -> &'p mut RouteList {
        self.parent
    }
}

impl Deref for Nested<'_> {
    type Target = RouteList;

    fn deref(&self) -> &RouteList {
        self.parent.nested_at(self.index)
    }
}

impl DerefMut for Nested<'_> {
    fn deref_mut(&mut self) -> &mut RouteList {
        self.parent.nested_at_mut(self.index)
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let mut prefix = prefix.trim_start_matches('/').to_string();
    if !prefix.ends_with('/') {
        prefix.push('/');
    }
    prefix
}
