//! # RouteList Module
//!
//! The broker: an ordered collection of routers dispatched first-hit
//! for matching and through a cached, constant-parameter-keyed bucket
//! structure for construction. Lists can be scoped to a domain pattern
//! or a path prefix and nest to arbitrary depth.

mod cache;
mod core;

pub use core::{Nested, RouteList};
