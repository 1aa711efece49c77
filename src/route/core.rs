//! Single-route matching and construction - hot path.

use crate::filters::GlobalFilter;
use crate::mask::{domain_part_value, Fixity, Location, Mask, MaskItem};
use crate::params::{is_scalar, scalar_to_string, Params};
use crate::router::Router;
use crate::url::{encode_path_component, encode_query_component, RefUrl, RequestUrl};
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

/// One compiled mask plus its metadata and filters.
///
/// Created once at registration via [`Route::new`] or
/// [`Route::builder`] and read-only afterwards; a `Route` is safe to
/// share across threads.
pub struct Route {
    mask: Mask,
    global_in: Option<GlobalFilter>,
    global_out: Option<GlobalFilter>,
    constants: Params,
}

impl Route {
    /// Compile a mask with no extra metadata.
    ///
    /// # Errors
    ///
    /// Fails when the mask does not compile; see
    /// [`RouterError`](crate::RouterError).
    pub fn new(mask: &str) -> Result<Self, crate::RouterError> {
        Route::builder(mask).build()
    }

    /// Start a builder for a mask with defaults, patterns and filters.
    #[must_use]
    pub fn builder(mask: &str) -> super::RouteBuilder {
        super::RouteBuilder::new(mask)
    }

    pub(crate) fn from_parts(
        mask: Mask,
        global_in: Option<GlobalFilter>,
        global_out: Option<GlobalFilter>,
    ) -> Self {
        let mut constants = Params::new();
        for info in mask.params() {
            if info.fixity == Fixity::Constant {
                if let Some(value) = &info.default {
                    constants.insert(info.name.clone(), value.clone());
                }
            }
        }
        Self {
            mask,
            global_in,
            global_out,
            constants,
        }
    }

    /// The original mask string.
    #[inline]
    #[must_use]
    pub fn mask(&self) -> &str {
        self.mask.source()
    }

    /// Decode a raw captured component and run its inbound filter.
    fn filter_component_in(&self, name: &str, raw: &str) -> Option<Value> {
        match self.mask.param(name).and_then(|p| p.filter_in.as_ref()) {
            Some(filter) => {
                let value = filter(raw)?;
                if !is_scalar(&value) {
                    debug!(param = name, "filter-in returned a non-scalar value");
                    return None;
                }
                Some(value)
            }
            None => Some(Value::String(raw.to_string())),
        }
    }

    /// Resolve one placeholder for construction.
    ///
    /// Returns the emitted text and whether the value sat at its
    /// default (which decides optional-group elision).
    fn render_placeholder(
        &self,
        name: &str,
        params: &Params,
        encode: bool,
    ) -> Option<(String, bool)> {
        let info = self.mask.param(name)?;
        let (value, at_default) = match params.get(name) {
            None | Some(Value::Null) => {
                let default = info.default.as_ref()?;
                (default.clone(), true)
            }
            Some(value) => {
                if !is_scalar(value) {
                    debug!(param = name, "non-scalar value for a path parameter");
                    return None;
                }
                (value.clone(), info.default.as_ref() == Some(value))
            }
        };
        let text = match &info.filter_out {
            Some(filter) => match filter(&value) {
                Some(text) => text,
                None => {
                    warn!(param = name, "filter-out rejected a value");
                    return None;
                }
            },
            None => scalar_to_string(&value)?,
        };
        if let Some(validator) = &info.validator {
            if !validator.is_match(&text) {
                debug!(
                    param = name,
                    value = %text,
                    "value does not round-trip through its pattern"
                );
                return None;
            }
        }
        let text = if encode {
            encode_path_component(&text)
        } else {
            text
        };
        Some((text, at_default))
    }

    fn render_sequence(&self, items: &[MaskItem], params: &Params) -> Option<Rendered> {
        let mut out = Rendered::default();
        for item in items {
            match item {
                MaskItem::Slash => out.text.push('/'),
                MaskItem::Literal(text) => out.text.push_str(text),
                MaskItem::Placeholder(spec) => {
                    let (text, at_default) = self.render_placeholder(&spec.name, params, true)?;
                    out.text.push_str(&text);
                    out.consumed.push(spec.name.clone());
                    if !at_default {
                        out.nondefault = true;
                    }
                }
                MaskItem::Optional(inner) => match self.render_sequence(inner, params) {
                    // taken only when something inside is off its default
                    Some(inner) if inner.nondefault => {
                        out.text.push_str(&inner.text);
                        out.consumed.extend(inner.consumed);
                        out.nondefault = true;
                    }
                    // everything at defaults: elide the text, keep the
                    // parameters out of the query tail
                    Some(inner) => out.consumed.extend(inner.consumed),
                    // a required placeholder inside is missing
                    None => {}
                },
                MaskItem::DomainPart(_) => {}
            }
        }
        Some(out)
    }

    fn render_host(
        &self,
        items: &[MaskItem],
        params: &Params,
        ref_host: &str,
        consumed: &mut Vec<String>,
    ) -> Option<String> {
        let mut out = String::new();
        for item in items {
            match item {
                MaskItem::Literal(text) => out.push_str(text),
                MaskItem::DomainPart(part) => {
                    out.push_str(&domain_part_value(*part, ref_host));
                }
                MaskItem::Placeholder(spec) => {
                    let (text, _) = self.render_placeholder(&spec.name, params, false)?;
                    consumed.push(spec.name.clone());
                    out.push_str(&text);
                }
                MaskItem::Optional(inner) => {
                    let mut sub_consumed = Vec::new();
                    if let Some(text) =
                        self.render_host(inner, params, ref_host, &mut sub_consumed)
                    {
                        out.push_str(&text);
                        consumed.append(&mut sub_consumed);
                    }
                }
                MaskItem::Slash => {}
            }
        }
        Some(out)
    }
}

#[derive(Default)]
struct Rendered {
    text: String,
    nondefault: bool,
    consumed: Vec<String>,
}

impl Router for Route {
    fn match_request(&self, request: &RequestUrl) -> Option<Params> {
        let host_pairs = match self.mask.host() {
            Some(host) => match host.matches(request.host(), self.mask.params()) {
                Some(pairs) => pairs,
                None => {
                    debug!(
                        mask = self.mask.source(),
                        host = request.host(),
                        "host did not match"
                    );
                    return None;
                }
            },
            None => Vec::new(),
        };

        // absolute routes own the whole path, relative ones start at
        // the base path
        let relative = if self.mask.is_absolute() {
            request.path().trim_start_matches('/')
        } else {
            request.relative_path()
        };
        let Some(path_pairs) = self.mask.match_path(relative) else {
            debug!(
                mask = self.mask.source(),
                path = relative,
                "path did not match"
            );
            return None;
        };

        let mut params = Params::new();
        for (name, raw) in host_pairs
            .iter()
            .map(|(name, raw)| (name.as_str(), raw.as_str()))
            .chain(path_pairs.iter().copied())
        {
            let decoded = urlencoding::decode(raw).ok()?;
            let value = self.filter_component_in(name, &decoded)?;
            params.insert(name, value);
        }

        // residual query parameters; path captures win, constants stay fixed
        for (key, value) in request.query().iter() {
            if params.contains(key) {
                continue;
            }
            match self.mask.param(key) {
                Some(info) if info.fixity == Fixity::Constant => {}
                Some(info) if info.filter_in.is_some() => {
                    let Some(raw) = scalar_to_string(value) else {
                        continue;
                    };
                    let filtered = self.filter_component_in(key, &raw)?;
                    params.insert(key, filtered);
                }
                _ => params.insert(key, value.clone()),
            }
        }

        // defaults for absent placeholders, constants, explicit nulls
        for info in self.mask.params() {
            if params.contains(&info.name) {
                continue;
            }
            if info.location == Location::Meta && info.fixity != Fixity::Constant {
                continue;
            }
            match &info.default {
                Some(value) => params.insert(info.name.clone(), value.clone()),
                None => params.insert(info.name.clone(), Value::Null),
            }
        }

        let params = match &self.global_in {
            Some(filter) => filter(params)?,
            None => params,
        };
        debug!(mask = self.mask.source(), params = ?params, "route matched");
        Some(params)
    }

    fn construct_url(&self, params: &Params, ref_url: &RefUrl) -> Option<String> {
        let params = match &self.global_out {
            Some(filter) => filter(params.clone())?,
            None => params.clone(),
        };

        // every constant must be supplied and agree, or the route does
        // not apply; this keeps the cached bucket dispatch and the
        // linear scan in lockstep
        let mut consumed: Vec<String> = Vec::new();
        for info in self.mask.params() {
            if info.fixity != Fixity::Constant {
                continue;
            }
            match params.get(&info.name) {
                Some(supplied) if !supplied.is_null() && Some(supplied) == info.default.as_ref() => {
                    consumed.push(info.name.clone());
                }
                _ => {
                    debug!(
                        mask = self.mask.source(),
                        param = %info.name,
                        "constant parameter absent or mismatched"
                    );
                    return None;
                }
            }
        }

        let rendered = self.render_sequence(self.mask.items(), &params)?;
        consumed.extend(rendered.consumed);
        let mut path = rendered.text;
        if self.mask.trailing_slash() && !path.is_empty() {
            path.push('/');
        }

        let mut url = match self.mask.host() {
            Some(host) => {
                let authority =
                    self.render_host(host.items(), &params, ref_url.host(), &mut consumed)?;
                format!("{}://{}/{}", ref_url.scheme(), authority, path)
            }
            None => format!(
                "{}://{}{}{}",
                ref_url.scheme(),
                ref_url.host(),
                ref_url.path(),
                path
            ),
        };

        // leftover parameters go to the query string; values equal to
        // their defaults are elided
        let mut first = true;
        for (name, value) in params.iter() {
            if value.is_null() || consumed.iter().any(|c| c == name) {
                continue;
            }
            if let Some(info) = self.mask.param(name) {
                if info.default.as_ref() == Some(value) {
                    continue;
                }
            }
            let Some(text) = scalar_to_string(value) else {
                debug!(param = name, "skipping non-scalar query parameter");
                continue;
            };
            url.push(if first { '?' } else { '&' });
            url.push_str(&encode_query_component(name));
            url.push('=');
            url.push_str(&encode_query_component(&text));
            first = false;
        }
        Some(url)
    }

    fn constant_parameters(&self) -> Params {
        self.constants.clone()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("mask", &self.mask.source())
            .field("constants", &self.constants)
            .finish()
    }
}
