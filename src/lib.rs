//! # Maskroute
//!
//! **Maskroute** is a bidirectional URL router: it parses an incoming
//! request URL into a structured parameter mapping and reconstructs a
//! canonical URL from such a mapping.
//!
//! ## Overview
//!
//! Routing tables are built from *masks* - compact pattern strings
//! describing path segments, placeholders with per-parameter regular
//! expressions and defaults, nestable optional sections, and an
//! optional host prefix:
//!
//! ```text
//! <presenter>/<action>[/<id \d{1,3}>]
//! //<subdomain>.example.com/<presenter>
//! ```
//!
//! A single [`Route`] compiles one mask. The [`RouteList`] broker
//! composes routers in insertion order, optionally scoped by domain
//! pattern or path prefix, and accelerates outbound URL construction
//! with a dispatch cache keyed on a discriminating constant parameter.
//!
//! ## Architecture
//!
//! - **[`mask`]** - mask parsing and compilation into immutable
//!   pattern values
//! - **[`route`]** - the single-route matcher/constructor with its
//!   filter pipeline
//! - **[`list`]** - the broker: ordered composition, scoping, and the
//!   construction-time dispatch cache
//! - **[`url`]** - the adapter boundary: inbound request view,
//!   reference URL view, and `%tld%`/`%domain%`/`%sld%` host expansion
//! - **[`params`]** - the ordered, loosely typed parameter mapping
//! - **[`filters`]** - per-parameter and whole-mapping transform
//!   capabilities
//! - **[`runtime_config`]** - environment-driven knobs
//!
//! ## Quick Start
//!
//! ```
//! use maskroute::{RefUrl, RequestUrl, Route, RouteList, Router};
//!
//! let mut list = RouteList::new();
//! list.add(
//!     Route::builder("<presenter>/<action>")
//!         .default("action", "default")
//!         .build()?,
//!     0,
//! );
//! list.warm_up();
//!
//! let request = RequestUrl::new("http", "example.com", "/product/detail");
//! let params = list.match_request(&request).unwrap();
//! assert_eq!(params.get_str("presenter"), Some("product"));
//! assert_eq!(params.get_str("action"), Some("detail"));
//!
//! let reference = RefUrl::new("http", "example.com", "/");
//! let url = list.construct_url(&params, &reference);
//! assert_eq!(url.as_deref(), Some("http://example.com/product/detail"));
//! # Ok::<(), maskroute::RouterError>(())
//! ```
//!
//! ## Failure Model
//!
//! Only registration fails loudly: mask compilation and list mutation
//! return [`RouterError`]. Routing-time failures - host or path
//! mismatch, filter rejection, a missing required parameter on
//! construction - are silent `None`s, so a broker distinguishes "no
//! route matched" from "all routes failed" only by its overall result.
//!
//! ## Sharing
//!
//! Routes are immutable after construction. A [`RouteList`] is mutable
//! during setup; call [`Router::warm_up`] once at boot and the list is
//! safe for concurrent `match_request` / `construct_url` across
//! threads for as long as no further mutation occurs.

pub mod error;
pub mod filters;
pub mod list;
pub mod mask;
pub mod params;
pub mod route;
pub mod router;
pub mod runtime_config;
pub mod url;

pub use error::RouterError;
pub use filters::{FilterIn, FilterOut, GlobalFilter};
pub use list::{Nested, RouteList};
pub use mask::{Mask, ParamOptions};
pub use params::{Params, MAX_INLINE_PARAMS};
pub use route::{Route, RouteBuilder};
pub use router::{Router, ONE_WAY};
pub use runtime_config::RuntimeConfig;
pub use url::{expand_domain, RefUrl, RequestUrl};

// the loosely typed scalar used for parameter values
pub use serde_json::Value;
