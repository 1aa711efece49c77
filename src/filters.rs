//! Parameter filter capabilities.
//!
//! Filters are owned function objects registered on a route at
//! construction time. A per-parameter filter transforms one value on
//! its way in (raw path component to scalar) or out (scalar to path
//! component); a global filter transforms the whole mapping after the
//! inbound per-parameter pass or before the outbound one. Returning
//! `None` expresses rejection: an inbound rejection makes the route
//! report no match, an outbound rejection makes construction fail.

use crate::params::Params;
use serde_json::Value;
use std::sync::Arc;

/// Inbound per-parameter transform: decoded path component to scalar.
pub type FilterIn = Arc<dyn Fn(&str) -> Option<Value> + Send + Sync>;

/// Outbound per-parameter transform: scalar to path component.
pub type FilterOut = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Whole-mapping transform; may add, remove or rewrite parameters.
pub type GlobalFilter = Arc<dyn Fn(Params) -> Option<Params> + Send + Sync>;
