//! # Route Module
//!
//! A [`Route`] is one compiled mask plus its metadata: per-parameter
//! defaults, patterns and filters, constant parameters, and a pair of
//! global filters over the whole mapping. It resolves inbound requests
//! with `match_request` and rebuilds canonical URLs with
//! `construct_url` (both via the [`Router`](crate::Router) trait).

mod builder;
mod core;

pub use builder::RouteBuilder;
pub use core::Route;
