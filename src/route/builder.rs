//! Route builder.
//!
//! Collects per-parameter metadata and global filters, then compiles
//! the mask once in `build()`. All validation happens there; the
//! setter methods never fail.

use super::Route;
use crate::error::RouterError;
use crate::mask::{Mask, ParamOptions};
use crate::params::Params;
use serde_json::Value;
use std::sync::Arc;

/// Builder returned by [`Route::builder`].
///
/// ```rust,ignore
/// let route = Route::builder("<presenter>/<action>[/<id \\d+>]")
///     .default("presenter", "homepage")
///     .default("action", "default")
///     .filter_in("presenter", |s| Some(Value::String(s.replace('-', ""))))
///     .build()?;
/// ```
pub struct RouteBuilder {
    mask: String,
    metadata: Vec<(String, ParamOptions)>,
    global_in: Option<crate::filters::GlobalFilter>,
    global_out: Option<crate::filters::GlobalFilter>,
}

impl RouteBuilder {
    pub(crate) fn new(mask: &str) -> Self {
        Self {
            mask: mask.to_string(),
            metadata: Vec::new(),
            global_in: None,
            global_out: None,
        }
    }

    fn options_mut(&mut self, name: &str) -> &mut ParamOptions {
        let index = match self.metadata.iter().position(|(n, _)| n == name) {
            Some(index) => index,
            None => {
                self.metadata.push((name.to_string(), ParamOptions::default()));
                self.metadata.len() - 1
            }
        };
        &mut self.metadata[index].1
    }

    /// Default value for a placeholder.
    ///
    /// For a name that does not appear in the mask this pins a
    /// *constant parameter* instead (see [`RouteBuilder::constant`]).
    #[must_use]
    pub fn default(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.options_mut(name).default = Some(value.into());
        self
    }

    /// Pin a parameter absent from the mask to a fixed value.
    ///
    /// Constant parameters appear in every match result, reject
    /// construction when a differing value is supplied, and feed the
    /// broker's cache-key selection.
    #[must_use]
    pub fn constant(self, name: &str, value: impl Into<Value>) -> Self {
        self.default(name, value)
    }

    /// Override the regex fragment of a placeholder.
    #[must_use]
    pub fn pattern(mut self, name: &str, pattern: &str) -> Self {
        self.options_mut(name).pattern = Some(pattern.to_string());
        self
    }

    /// Inbound transform for one parameter. Returning `None` rejects
    /// the whole match.
    #[must_use]
    pub fn filter_in(
        mut self,
        name: &str,
        filter: impl Fn(&str) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        self.options_mut(name).filter_in = Some(Arc::new(filter));
        self
    }

    /// Outbound transform for one parameter. Returning `None` makes
    /// construction fail for this route.
    #[must_use]
    pub fn filter_out(
        mut self,
        name: &str,
        filter: impl Fn(&Value) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.options_mut(name).filter_out = Some(Arc::new(filter));
        self
    }

    /// Whole-mapping transform applied after the per-parameter inbound
    /// pass; may add, remove or rewrite parameters.
    #[must_use]
    pub fn global_filter_in(
        mut self,
        filter: impl Fn(Params) -> Option<Params> + Send + Sync + 'static,
    ) -> Self {
        self.global_in = Some(Arc::new(filter));
        self
    }

    /// Whole-mapping transform applied before the per-parameter
    /// outbound pass.
    #[must_use]
    pub fn global_filter_out(
        mut self,
        filter: impl Fn(Params) -> Option<Params> + Send + Sync + 'static,
    ) -> Self {
        self.global_out = Some(Arc::new(filter));
        self
    }

    /// Compile the mask and produce the route.
    ///
    /// # Errors
    ///
    /// Propagates [`RouterError`] from mask compilation.
    pub fn build(self) -> Result<Route, RouterError> {
        let mask = Mask::compile(&self.mask, &self.metadata)?;
        Ok(Route::from_parts(mask, self.global_in, self.global_out))
    }
}
