//! Mask compilation.
//!
//! # Overview
//!
//! [`Mask::compile`] is a pure function from a mask string plus
//! per-parameter metadata to an immutable [`Mask`] value:
//!
//! 1. **Parse** the mask into a token tree (see `parser`).
//! 2. **Resolve parameters**: merge inline regex/default fragments with
//!    the metadata, classify fixity, and pre-compile a per-placeholder
//!    validator regex used for the outbound round-trip check.
//! 3. **Auto-optionalise** the trailing run of path segments whose
//!    placeholders all carry defaults, so `<presenter>/<action>` with
//!    defaults matches `/`, `/homepage` and `/homepage/other` alike.
//! 4. **Derive** one anchored regex over the relative path with a
//!    synthetic named capture group per placeholder.
//!
//! Host patterns compile into their own template. When a host pattern
//! contains `%tld%`-style substitutions its regex depends on the
//! concrete request host, so the rendered form is memoised per host
//! behind a read-write lock; otherwise it is compiled once up front.
//!
//! Compilation is the only fallible stage of routing. Everything it
//! can reject (unbalanced brackets, bad names, duplicate parameters,
//! invalid regex fragments) surfaces as [`RouterError`] at
//! registration time; matching and construction never fail loudly.

use super::parser::{self, DomainPart, MaskItem, PlaceholderSpec};
use crate::error::RouterError;
use crate::filters::{FilterIn, FilterOut};
use crate::url::host_parts;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

/// Default pattern for a path placeholder: one segment.
const PATH_PATTERN: &str = "[^/]+";
/// Default pattern for a host placeholder: one label.
const HOST_PATTERN: &str = "[^.]+";

/// Per-parameter metadata supplied at route registration.
///
/// A `default` for a name that appears in the mask is the value the
/// placeholder falls back to; a `default` for a name absent from the
/// mask pins a *constant parameter*. `pattern` overrides the
/// placeholder regex; the filters are applied on the way in and out.
#[derive(Clone, Default)]
pub struct ParamOptions {
    pub default: Option<Value>,
    pub pattern: Option<String>,
    pub filter_in: Option<FilterIn>,
    pub filter_out: Option<FilterOut>,
}

/// How a parameter participates in the mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fixity {
    /// Path placeholder without a default; must be supplied to construct
    Required,
    /// Placeholder or metadata-only parameter with optional presence
    Optional,
    /// Placeholder inside an `[...]` group
    PathOptional,
    /// Fixed by metadata, never present in the path
    Constant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Location {
    Path,
    Host,
    Meta,
}

/// Resolved view of one parameter: placeholder or metadata entry.
pub(crate) struct ParamInfo {
    pub name: String,
    pub fixity: Fixity,
    pub location: Location,
    /// Default value; for `Fixity::Constant` the fixed value itself
    pub default: Option<Value>,
    pub filter_in: Option<FilterIn>,
    pub filter_out: Option<FilterOut>,
    /// Effective regex fragment (placeholders only)
    pub pattern: Option<String>,
    /// Anchored validator for the outbound round-trip check
    pub validator: Option<Regex>,
}

impl fmt::Debug for ParamInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamInfo")
            .field("name", &self.name)
            .field("fixity", &self.fixity)
            .field("location", &self.location)
            .field("default", &self.default)
            .field("pattern", &self.pattern)
            .finish()
    }
}

/// Immutable compiled form of a mask string.
pub struct Mask {
    source: String,
    host: Option<HostTemplate>,
    items: Vec<MaskItem>,
    regex: Regex,
    /// `(capture group, parameter name)` in capture order
    captures: Vec<(String, String)>,
    trailing_slash: bool,
    params: Vec<ParamInfo>,
}

impl Mask {
    /// Compile a mask string with its parameter metadata.
    ///
    /// # Errors
    ///
    /// `MaskSyntax` for structural problems and invalid regex
    /// fragments; `DuplicateParameter` when a placeholder name repeats
    /// or an inline default conflicts with a metadata default.
    pub fn compile(mask: &str, metadata: &[(String, ParamOptions)]) -> Result<Self, RouterError> {
        let parsed = parser::parse(mask)?;
        let mut params: Vec<ParamInfo> = Vec::new();

        if let Some(host_items) = &parsed.host {
            let mut found = Vec::new();
            collect_placeholders(host_items, 0, &mut found);
            for (spec, _) in found {
                let info = resolve_placeholder(mask, spec, Location::Host, 0, metadata, &params)?;
                params.push(info);
            }
        }

        let mut found = Vec::new();
        collect_placeholders(&parsed.path, 0, &mut found);
        for (spec, depth) in found {
            let info = resolve_placeholder(mask, spec, Location::Path, depth, metadata, &params)?;
            params.push(info);
        }

        for (name, options) in metadata {
            if params.iter().any(|p| &p.name == name) {
                continue;
            }
            let validator = options
                .pattern
                .as_deref()
                .map(|fragment| compile_validator(mask, name, fragment))
                .transpose()?;
            params.push(ParamInfo {
                name: name.clone(),
                fixity: if options.default.is_some() {
                    Fixity::Constant
                } else {
                    Fixity::Optional
                },
                location: Location::Meta,
                default: options.default.clone(),
                filter_in: options.filter_in.clone(),
                filter_out: options.filter_out.clone(),
                pattern: options.pattern.clone(),
                validator,
            });
        }

        let items = auto_optionalize(parsed.path, &params);

        let mut captures = Vec::new();
        let mut body = String::new();
        build_pattern(&items, &params, &mut captures, &mut body);
        let mut anchored = String::with_capacity(body.len() + 4);
        anchored.push('^');
        anchored.push_str(&body);
        if parsed.trailing_slash {
            anchored.push('/');
        }
        anchored.push('$');
        let regex = Regex::new(&anchored).map_err(|e| RouterError::MaskSyntax {
            mask: mask.to_string(),
            reason: format!("derived path regex does not compile: {}", e),
        })?;

        let host = parsed
            .host
            .map(|items| HostTemplate::build(mask, items, &params))
            .transpose()?;

        Ok(Self {
            source: mask.to_string(),
            host,
            items,
            regex,
            captures,
            trailing_slash: parsed.trailing_slash,
            params,
        })
    }

    /// The original mask string.
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the mask carries a `//host/` prefix.
    #[inline]
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.host.is_some()
    }

    pub(crate) fn host(&self) -> Option<&HostTemplate> {
        self.host.as_ref()
    }

    pub(crate) fn items(&self) -> &[MaskItem] {
        &self.items
    }

    pub(crate) fn trailing_slash(&self) -> bool {
        self.trailing_slash
    }

    pub(crate) fn params(&self) -> &[ParamInfo] {
        &self.params
    }

    pub(crate) fn param(&self, name: &str) -> Option<&ParamInfo> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Match the relative path, yielding `(parameter, raw capture)`
    /// pairs for every participating placeholder.
    pub(crate) fn match_path<'m, 'h>(
        &'m self,
        relative: &'h str,
    ) -> Option<Vec<(&'m str, &'h str)>> {
        let caps = self.regex.captures(relative)?;
        let mut out = Vec::with_capacity(self.captures.len());
        for (group, param) in &self.captures {
            if let Some(m) = caps.name(group) {
                out.push((param.as_str(), m.as_str()));
            }
        }
        Some(out)
    }
}

impl fmt::Debug for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mask")
            .field("source", &self.source)
            .field("absolute", &self.is_absolute())
            .field("params", &self.params)
            .finish()
    }
}

/// Compiled host pattern of an absolute mask.
pub(crate) struct HostTemplate {
    items: Vec<MaskItem>,
    captures: Vec<(String, String)>,
    /// Present when the pattern has no `%…%` substitutions
    static_regex: Option<Regex>,
    /// Per-request-host rendered regexes for substitution patterns
    rendered: RwLock<HashMap<String, Regex>>,
}

impl HostTemplate {
    fn build(
        mask: &str,
        items: Vec<MaskItem>,
        params: &[ParamInfo],
    ) -> Result<Self, RouterError> {
        let mut captures = Vec::new();
        let static_regex = if contains_domain_parts(&items) {
            // rendered lazily per host; still record the capture layout
            let mut scratch = String::new();
            host_body(&items, params, &mut captures, "", &mut scratch);
            None
        } else {
            let mut body = String::new();
            host_body(&items, params, &mut captures, "", &mut body);
            let anchored = format!("^{}$", body);
            Some(Regex::new(&anchored).map_err(|e| RouterError::MaskSyntax {
                mask: mask.to_string(),
                reason: format!("derived host regex does not compile: {}", e),
            })?)
        };
        Ok(Self {
            items,
            captures,
            static_regex,
            rendered: RwLock::new(HashMap::new()),
        })
    }

    pub(crate) fn items(&self) -> &[MaskItem] {
        &self.items
    }

    /// Match a request host, yielding `(parameter, raw capture)` pairs.
    pub(crate) fn matches(&self, host: &str, params: &[ParamInfo]) -> Option<Vec<(String, String)>> {
        let regex = match &self.static_regex {
            Some(regex) => regex.clone(),
            None => {
                let hit = self
                    .rendered
                    .read()
                    .ok()
                    .and_then(|map| map.get(host).cloned());
                match hit {
                    Some(regex) => regex,
                    None => {
                        let mut scratch = Vec::new();
                        let mut body = String::new();
                        host_body(&self.items, params, &mut scratch, host, &mut body);
                        let regex = Regex::new(&format!("^{}$", body)).ok()?;
                        if let Ok(mut map) = self.rendered.write() {
                            map.insert(host.to_string(), regex.clone());
                        }
                        regex
                    }
                }
            }
        };
        let caps = regex.captures(host)?;
        let mut out = Vec::with_capacity(self.captures.len());
        for (group, param) in &self.captures {
            if let Some(m) = caps.name(group) {
                out.push((param.clone(), m.as_str().to_string()));
            }
        }
        Some(out)
    }
}

fn collect_placeholders<'a>(
    items: &'a [MaskItem],
    depth: usize,
    out: &mut Vec<(&'a PlaceholderSpec, usize)>,
) {
    for item in items {
        match item {
            MaskItem::Placeholder(spec) => out.push((spec, depth)),
            MaskItem::Optional(inner) => collect_placeholders(inner, depth + 1, out),
            _ => {}
        }
    }
}

fn resolve_placeholder(
    mask: &str,
    spec: &PlaceholderSpec,
    location: Location,
    depth: usize,
    metadata: &[(String, ParamOptions)],
    seen: &[ParamInfo],
) -> Result<ParamInfo, RouterError> {
    if seen.iter().any(|p| p.name == spec.name) {
        return Err(RouterError::DuplicateParameter {
            name: spec.name.clone(),
        });
    }
    let options = metadata
        .iter()
        .find(|(name, _)| *name == spec.name)
        .map(|(_, o)| o);

    let inline_default = spec.default.clone().map(Value::String);
    let meta_default = options.and_then(|o| o.default.clone());
    if let (Some(inline), Some(meta)) = (&inline_default, &meta_default) {
        if inline != meta {
            return Err(RouterError::DuplicateParameter {
                name: spec.name.clone(),
            });
        }
    }
    let default = meta_default.or(inline_default);

    let fragment = spec
        .pattern
        .clone()
        .or_else(|| options.and_then(|o| o.pattern.clone()))
        .unwrap_or_else(|| {
            if location == Location::Host {
                HOST_PATTERN.to_string()
            } else {
                PATH_PATTERN.to_string()
            }
        });
    let validator = compile_validator(mask, &spec.name, &fragment)?;

    Ok(ParamInfo {
        name: spec.name.clone(),
        fixity: if depth > 0 {
            Fixity::PathOptional
        } else if default.is_some() {
            Fixity::Optional
        } else {
            Fixity::Required
        },
        location,
        default,
        filter_in: options.and_then(|o| o.filter_in.clone()),
        filter_out: options.and_then(|o| o.filter_out.clone()),
        pattern: Some(fragment),
        validator: Some(validator),
    })
}

fn compile_validator(mask: &str, name: &str, fragment: &str) -> Result<Regex, RouterError> {
    Regex::new(&format!("^(?:{})$", fragment)).map_err(|e| RouterError::MaskSyntax {
        mask: mask.to_string(),
        reason: format!("invalid regex for parameter '{}': {}", name, e),
    })
}

/// Wrap the maximal trailing run of segments whose placeholders all
/// carry defaults into nested optional groups, so matching and
/// construction both treat them as elidable.
fn auto_optionalize(items: Vec<MaskItem>, params: &[ParamInfo]) -> Vec<MaskItem> {
    if items.is_empty() {
        return items;
    }
    let mut segments: Vec<Vec<MaskItem>> = vec![Vec::new()];
    for item in items {
        if matches!(item, MaskItem::Slash) {
            segments.push(Vec::new());
        } else if let Some(last) = segments.last_mut() {
            last.push(item);
        }
    }

    let has_default = |name: &str| {
        params
            .iter()
            .find(|p| p.name == name)
            .is_some_and(|p| p.default.is_some())
    };
    let mut first_omittable = segments.len();
    while first_omittable > 0 && segment_omittable(&segments[first_omittable - 1], &has_default) {
        first_omittable -= 1;
    }
    if first_omittable == segments.len() {
        return rejoin(&segments);
    }

    let mut out = rejoin(&segments[..first_omittable]);
    out.push(wrap_tail(&segments[first_omittable..], first_omittable > 0));
    out
}

fn segment_omittable(segment: &[MaskItem], has_default: &impl Fn(&str) -> bool) -> bool {
    let mut saw_placeholder = false;
    for item in segment {
        match item {
            MaskItem::Literal(text) if !text.is_empty() => return false,
            MaskItem::Placeholder(spec) => {
                if !has_default(&spec.name) {
                    return false;
                }
                saw_placeholder = true;
            }
            _ => {}
        }
    }
    saw_placeholder
}

fn rejoin(segments: &[Vec<MaskItem>]) -> Vec<MaskItem> {
    let mut out = Vec::new();
    for (index, segment) in segments.iter().enumerate() {
        if index > 0 {
            out.push(MaskItem::Slash);
        }
        out.extend(segment.iter().cloned());
    }
    out
}

fn wrap_tail(segments: &[Vec<MaskItem>], leading_slash: bool) -> MaskItem {
    let mut inner = Vec::new();
    if leading_slash {
        inner.push(MaskItem::Slash);
    }
    inner.extend(segments[0].iter().cloned());
    if segments.len() > 1 {
        inner.push(wrap_tail(&segments[1..], true));
    }
    MaskItem::Optional(inner)
}

fn build_pattern(
    items: &[MaskItem],
    params: &[ParamInfo],
    captures: &mut Vec<(String, String)>,
    buf: &mut String,
) {
    for item in items {
        match item {
            MaskItem::Slash => buf.push('/'),
            MaskItem::Literal(text) => buf.push_str(&regex::escape(text)),
            MaskItem::Placeholder(spec) => {
                let fragment = params
                    .iter()
                    .find(|p| p.name == spec.name)
                    .and_then(|p| p.pattern.as_deref())
                    .unwrap_or(PATH_PATTERN);
                let group = format!("p{}", captures.len());
                buf.push_str("(?P<");
                buf.push_str(&group);
                buf.push('>');
                buf.push_str(fragment);
                buf.push(')');
                captures.push((group, spec.name.clone()));
            }
            MaskItem::Optional(inner) => {
                buf.push_str("(?:");
                build_pattern(inner, params, captures, buf);
                buf.push_str(")?");
            }
            MaskItem::DomainPart(_) => {}
        }
    }
}

/// Render the host regex body; `%…%` parts expand from `host`.
fn host_body(
    items: &[MaskItem],
    params: &[ParamInfo],
    captures: &mut Vec<(String, String)>,
    host: &str,
    buf: &mut String,
) {
    for item in items {
        match item {
            MaskItem::Literal(text) => buf.push_str(&regex::escape(text)),
            MaskItem::Placeholder(spec) => {
                let fragment = params
                    .iter()
                    .find(|p| p.name == spec.name)
                    .and_then(|p| p.pattern.as_deref())
                    .unwrap_or(HOST_PATTERN);
                let group = format!("h{}", captures.len());
                buf.push_str("(?P<");
                buf.push_str(&group);
                buf.push('>');
                buf.push_str(fragment);
                buf.push(')');
                captures.push((group, spec.name.clone()));
            }
            MaskItem::DomainPart(part) => {
                buf.push_str(&regex::escape(domain_part_value(*part, host).as_ref()));
            }
            MaskItem::Optional(inner) => {
                buf.push_str("(?:");
                host_body(inner, params, captures, host, buf);
                buf.push_str(")?");
            }
            MaskItem::Slash => {}
        }
    }
}

fn contains_domain_parts(items: &[MaskItem]) -> bool {
    items.iter().any(|item| match item {
        MaskItem::DomainPart(_) => true,
        MaskItem::Optional(inner) => contains_domain_parts(inner),
        _ => false,
    })
}

pub(crate) fn domain_part_value(part: DomainPart, host: &str) -> String {
    let (tld, sld, domain) = host_parts(host);
    match part {
        DomainPart::Tld => tld.to_string(),
        DomainPart::Sld => sld.to_string(),
        DomainPart::Domain => domain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(default: Option<Value>) -> ParamOptions {
        ParamOptions {
            default,
            ..ParamOptions::default()
        }
    }

    fn raw_params<'m, 'h>(mask: &'m Mask, path: &'h str) -> Option<Vec<(&'m str, &'h str)>> {
        mask.match_path(path)
    }

    #[test]
    fn matches_plain_segments() {
        let mask = Mask::compile("<presenter>/<action>", &[]).unwrap();
        let caps = raw_params(&mask, "product/detail").unwrap();
        assert_eq!(caps, vec![("presenter", "product"), ("action", "detail")]);
        assert!(raw_params(&mask, "product").is_none());
        assert!(raw_params(&mask, "product/detail/extra").is_none());
    }

    #[test]
    fn inline_regex_constrains_match() {
        let mask = Mask::compile(r"<id \d{1,3}>", &[]).unwrap();
        assert!(raw_params(&mask, "42").is_some());
        assert!(raw_params(&mask, "abcd").is_none());
        assert!(raw_params(&mask, "9999").is_none());
    }

    #[test]
    fn optional_group_may_be_absent() {
        let mask = Mask::compile("<presenter>[/<id>]", &[]).unwrap();
        assert_eq!(
            raw_params(&mask, "article").unwrap(),
            vec![("presenter", "article")]
        );
        assert_eq!(
            raw_params(&mask, "article/7").unwrap(),
            vec![("presenter", "article"), ("id", "7")]
        );
    }

    #[test]
    fn defaults_make_trailing_segments_optional() {
        let metadata = vec![
            ("presenter".to_string(), options(Some(json!("homepage")))),
            ("action".to_string(), options(Some(json!("default")))),
        ];
        let mask = Mask::compile("<presenter>/<action>", &metadata).unwrap();
        assert!(raw_params(&mask, "").is_some());
        assert_eq!(
            raw_params(&mask, "homepage").unwrap(),
            vec![("presenter", "homepage")]
        );
        assert_eq!(
            raw_params(&mask, "homepage/edit").unwrap(),
            vec![("presenter", "homepage"), ("action", "edit")]
        );
    }

    #[test]
    fn required_segment_blocks_auto_optional() {
        let metadata = vec![("action".to_string(), options(Some(json!("default"))))];
        let mask = Mask::compile("<presenter>/<action>", &metadata).unwrap();
        assert!(raw_params(&mask, "").is_none());
        assert!(raw_params(&mask, "homepage").is_some());
    }

    #[test]
    fn trailing_slash_is_significant() {
        let with = Mask::compile("<presenter>/", &[]).unwrap();
        assert!(raw_params(&with, "homepage/").is_some());
        assert!(raw_params(&with, "homepage").is_none());

        let without = Mask::compile("<presenter>", &[]).unwrap();
        assert!(raw_params(&without, "homepage").is_some());
        assert!(raw_params(&without, "homepage/").is_none());
    }

    #[test]
    fn duplicate_placeholder_rejected() {
        assert!(matches!(
            Mask::compile("<id>/<id>", &[]),
            Err(RouterError::DuplicateParameter { name }) if name == "id"
        ));
    }

    #[test]
    fn conflicting_defaults_rejected() {
        let metadata = vec![("action".to_string(), options(Some(json!("view"))))];
        let result = Mask::compile("<action list>", &metadata);
        assert!(matches!(
            result,
            Err(RouterError::DuplicateParameter { .. })
        ));
    }

    #[test]
    fn agreeing_defaults_accepted() {
        let metadata = vec![("action".to_string(), options(Some(json!("list"))))];
        let mask = Mask::compile("<action list>", &metadata).unwrap();
        assert_eq!(
            mask.param("action").unwrap().default,
            Some(json!("list"))
        );
    }

    #[test]
    fn invalid_fragment_rejected() {
        assert!(matches!(
            Mask::compile(r"<id [a->", &[]),
            Err(RouterError::MaskSyntax { .. })
        ));
    }

    #[test]
    fn metadata_only_name_becomes_constant() {
        let metadata = vec![("module".to_string(), options(Some(json!("admin"))))];
        let mask = Mask::compile("<presenter>", &metadata).unwrap();
        let info = mask.param("module").unwrap();
        assert_eq!(info.fixity, Fixity::Constant);
        assert_eq!(info.location, Location::Meta);
    }

    #[test]
    fn host_template_static_match() {
        let mask = Mask::compile("//<subdomain>.example.com/<presenter>", &[]).unwrap();
        assert!(mask.is_absolute());
        let host = mask.host().unwrap();
        assert_eq!(
            host.matches("api.example.com", mask.params()).unwrap(),
            vec![("subdomain".to_string(), "api".to_string())]
        );
        assert!(host.matches("api.other.org", mask.params()).is_none());
    }

    #[test]
    fn host_template_with_substitutions() {
        let mask = Mask::compile("//www.%domain%/<presenter>", &[]).unwrap();
        let host = mask.host().unwrap();
        assert!(host.matches("www.acme.org", mask.params()).is_some());
        assert!(host.matches("www.example.com", mask.params()).is_some());
        assert!(host.matches("api.acme.org", mask.params()).is_none());
    }

    #[test]
    fn wildcard_style_tail() {
        let mask = Mask::compile("files/<path .+>", &[]).unwrap();
        assert_eq!(
            raw_params(&mask, "files/a/b/c.txt").unwrap(),
            vec![("path", "a/b/c.txt")]
        );
    }
}
