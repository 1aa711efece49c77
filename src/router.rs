//! The router contract.
//!
//! Anything that can resolve an inbound request view into a parameter
//! mapping and rebuild a URL from one is a [`Router`]. Both [`Route`]
//! and [`RouteList`] implement it, so brokers nest arbitrarily.
//!
//! [`Route`]: crate::route::Route
//! [`RouteList`]: crate::list::RouteList

use crate::params::Params;
use crate::url::{RefUrl, RequestUrl};

/// Construction only: the router never contributes to `match_request`
/// and does not vote on the broker's cache key.
pub const ONE_WAY: u32 = 1;

/// Bidirectional resolver between request URLs and parameter mappings.
///
/// All routing-time failures are silent: `match_request` returns `None`
/// when the request does not fit, `construct_url` returns `None` when
/// the mapping cannot produce a URL. Only registration
/// (mask compilation, list mutation) can error.
pub trait Router: Send + Sync {
    /// Resolve a request into a parameter mapping, or `None`.
    fn match_request(&self, request: &RequestUrl) -> Option<Params>;

    /// Build an absolute URL from a parameter mapping, or `None`.
    fn construct_url(&self, params: &Params, ref_url: &RefUrl) -> Option<String>;

    /// Parameters whose values this router pins to constants.
    ///
    /// The broker consults these when choosing its dispatch cache key.
    fn constant_parameters(&self) -> Params {
        Params::new()
    }

    /// Build any internal caches ahead of the first `construct_url`.
    ///
    /// Calling this once after setup makes the router safe for shared
    /// concurrent reads without a first-call initialisation race.
    fn warm_up(&self) {}
}
