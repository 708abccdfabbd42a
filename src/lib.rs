//! URI route templates with bidirectional match/generate.
//!
//! A [`Route`] compiles a path template such as `/users/:id` or
//! `/files/*path?` into an anchored matcher, extracts named parameters from
//! concrete URIs, and renders URIs back from parameter mappings. A
//! [`Router`] dispatches over an ordered collection of routes and builds
//! URIs by route name.

use std::fmt;
use std::ops::Range;
use std::sync::{LazyLock, OnceLock};

use parse_display::{Display, FromStr};
use regex::{Regex, escape};
use serde::Serialize;

mod params;
mod router;

pub use params::Params;
pub use router::{RouteMatch, RouteRef, Router};

/// One placeholder: optional leading `/`, optional `.` separator, `:` or `*`
/// sigil, word name, optional `?` marker.
const IDENT_PATTERN: &str = r"(/)?(\.)?([:*])(\w+)(\?)?";
static IDENT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(IDENT_PATTERN).unwrap());

const SEGMENT_PATTERN: &str = r"[\w\-\s]+";
static SEGMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^(?:{SEGMENT_PATTERN})$")).unwrap());

const GLOB_PATTERN: &str = r"[\w\-\s/]+";
static GLOB_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^(?:{GLOB_PATTERN})$")).unwrap());

/// Methods a route may be bound to.
///
/// `HEAD` requests are always served by `GET` routes, so `Head` is accepted
/// by [`Route::parse`] but rejected at registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, FromStr, Serialize)]
#[display(style = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
}

/// The `controller.action` pair a matched route resolves to.
#[derive(Clone, Debug, PartialEq, Eq, Display, FromStr, Serialize)]
#[display("{controller}.{action}")]
#[from_str(regex = r"(?<controller>[^.]+)\.(?<action>[^.]+)")]
pub struct Target {
    controller: String,
    action: String,
}

impl Target {
    pub fn controller(&self) -> &str {
        &self.controller
    }
    pub fn action(&self) -> &str {
        &self.action
    }
}

/// A value pattern bound to one identifier, overriding its default.
#[derive(Clone, Debug)]
pub enum Constraint {
    /// A literal pattern string.
    Pattern(String),
    /// Alternatives, joined with `|`.
    OneOf(Vec<String>),
    /// An existing regex; its anchors are stripped before splicing.
    Source(Regex),
}

impl Constraint {
    fn into_pattern(self) -> String {
        match self {
            Constraint::Pattern(pattern) => pattern,
            Constraint::OneOf(alternatives) => alternatives.join("|"),
            Constraint::Source(regex) => strip_anchors(regex.as_str()).to_string(),
        }
    }
}

impl From<&str> for Constraint {
    fn from(pattern: &str) -> Self {
        Constraint::Pattern(pattern.to_string())
    }
}
impl From<String> for Constraint {
    fn from(pattern: String) -> Self {
        Constraint::Pattern(pattern)
    }
}
impl From<Vec<String>> for Constraint {
    fn from(alternatives: Vec<String>) -> Self {
        Constraint::OneOf(alternatives)
    }
}
impl From<Vec<&str>> for Constraint {
    fn from(alternatives: Vec<&str>) -> Self {
        Constraint::OneOf(alternatives.iter().map(|a| a.to_string()).collect())
    }
}
impl From<&[&str]> for Constraint {
    fn from(alternatives: &[&str]) -> Self {
        Constraint::OneOf(alternatives.iter().map(|a| a.to_string()).collect())
    }
}
impl From<Regex> for Constraint {
    fn from(regex: Regex) -> Self {
        Constraint::Source(regex)
    }
}

fn strip_anchors(source: &str) -> &str {
    let source = source.strip_prefix('^').unwrap_or(source);
    if source.ends_with('$') && !source.ends_with(r"\$") {
        &source[..source.len() - 1]
    } else {
        source
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum IdentKind {
    Segment,
    Glob,
}

impl IdentKind {
    fn default_pattern(self) -> &'static str {
        match self {
            IdentKind::Segment => SEGMENT_PATTERN,
            IdentKind::Glob => GLOB_PATTERN,
        }
    }
    fn default_regex(self) -> &'static Regex {
        match self {
            IdentKind::Segment => &SEGMENT_REGEX,
            IdentKind::Glob => &GLOB_REGEX,
        }
    }
}

/// One named identifier of a template. Duplicate placeholder names within a
/// template alias a single record; the kind picked at scan time is encoded
/// in the pattern.
#[derive(Clone, Debug)]
struct Ident {
    name: String,
    pattern: String,
    regex: Regex,
}

impl Ident {
    fn new(name: &str, kind: IdentKind) -> Self {
        Self {
            name: name.to_string(),
            pattern: kind.default_pattern().to_string(),
            regex: kind.default_regex().clone(),
        }
    }
    fn reset(&mut self, kind: IdentKind) {
        self.pattern = kind.default_pattern().to_string();
        self.regex = kind.default_regex().clone();
    }
}

/// One placeholder occurrence, in template order. Capture group `i + 1` of
/// the compiled regex corresponds to occurrence `i`.
#[derive(Clone, Debug)]
struct Occurrence {
    name: String,
    range: Range<usize>,
    slash: bool,
    sep: bool,
    optional: bool,
}

/// A single route template.
///
/// The template regex is compiled on first use and memoized; constraints
/// must be bound before the first `test`/`parse`/`stringify` call.
#[derive(Clone)]
pub struct Route {
    uri: String,
    method: Option<Method>,
    idents: Vec<Ident>,
    occurrences: Vec<Occurrence>,
    target: Option<Target>,
    name: Option<String>,
    regex: OnceLock<Regex>,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\"", self.uri)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.uri)
    }
}

impl Route {
    pub fn new(uri: &str, method: Option<Method>) -> Result<Self> {
        if method == Some(Method::Head) {
            return Err(Error::new(ErrorKind::InvalidMethod, Method::Head));
        }
        let mut idents: Vec<Ident> = Vec::new();
        let mut occurrences = Vec::new();
        for caps in IDENT_REGEX.captures_iter(uri) {
            let kind = if &caps[3] == ":" {
                IdentKind::Segment
            } else {
                IdentKind::Glob
            };
            let name = &caps[4];
            occurrences.push(Occurrence {
                name: name.to_string(),
                range: caps.get(0).unwrap().range(),
                slash: caps.get(1).is_some(),
                sep: caps.get(2).is_some(),
                optional: caps.get(5).is_some(),
            });
            match idents.iter_mut().find(|ident| ident.name == name) {
                // last occurrence wins for the shared record
                Some(ident) => ident.reset(kind),
                None => idents.push(Ident::new(name, kind)),
            }
        }
        Ok(Self {
            uri: uri.to_string(),
            method,
            idents,
            occurrences,
            target: None,
            name: None,
            regex: OnceLock::new(),
        })
    }

    /// Overrides the value pattern of the named identifier.
    pub fn constrain(
        &mut self,
        name: &str,
        constraint: impl Into<Constraint>,
    ) -> Result<&mut Self> {
        let Some(ident) = self.idents.iter_mut().find(|ident| ident.name == name) else {
            return Err(Error::new(ErrorKind::UnknownIdentifier, name));
        };
        let pattern = constraint.into().into_pattern();
        let regex = Regex::new(&format!("^(?:{pattern})$"))
            .map_err(|_| Error::new(ErrorKind::InvalidPattern, &pattern))?;
        ident.pattern = pattern;
        ident.regex = regex;
        Ok(self)
    }

    /// Sets the `controller.action` target this route resolves to.
    pub fn to(&mut self, target: &str) -> Result<&mut Self> {
        let target = target
            .parse()
            .map_err(|_| Error::new(ErrorKind::InvalidTarget, target))?;
        self.target = Some(target);
        Ok(self)
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
    pub fn method(&self) -> Option<Method> {
        self.method
    }
    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
    pub fn ident_names(&self) -> impl Iterator<Item = &str> {
        self.idents.iter().map(|ident| ident.name.as_str())
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    fn ident(&self, name: &str) -> Option<&Ident> {
        self.idents.iter().find(|ident| ident.name == name)
    }

    /// The compiled template regex, built on first use and never recomputed.
    fn regex(&self) -> &Regex {
        self.regex.get_or_init(|| {
            let mut re = String::from("^");
            let mut last = 0;
            for occ in &self.occurrences {
                re.push_str(&escape(&self.uri[last..occ.range.start]));
                last = occ.range.end;
                let pattern = &self.ident(&occ.name).unwrap().pattern;
                let slash = if occ.slash { "/" } else { "" };
                let sep = if occ.sep { r"\." } else { "" };
                if occ.optional {
                    // the slash vanishes with the whole unit when absent
                    re.push_str(&format!("(?:{slash}{sep}({pattern}))?"));
                } else {
                    re.push_str(&format!("{slash}(?:{sep}({pattern}))"));
                }
            }
            re.push_str(&escape(&self.uri[last..]));
            re.push('$');
            Regex::new(&re).unwrap()
        })
    }

    pub fn test(&self, uri: &str) -> bool {
        self.regex().is_match(uri)
    }

    /// Matches a URI, extracting named parameters.
    ///
    /// `HEAD` is reconciled to `GET` before the method pre-filter. Captured
    /// values are percent-decoded; empty or absent captures are omitted from
    /// the result. Returns `None` on any mismatch, never an error.
    pub fn parse(&self, uri: &str, method: Option<Method>) -> Option<Params> {
        let method = match method {
            Some(Method::Head) => Some(Method::Get),
            other => other,
        };
        if let (Some(requested), Some(bound)) = (method, self.method) {
            if requested != bound {
                return None;
            }
        }
        let caps = self.regex().captures(uri)?;
        let mut params = Params::new();
        for (i, occ) in self.occurrences.iter().enumerate() {
            if let Some(m) = caps.get(i + 1) {
                let value = urlencoding::decode(m.as_str()).ok()?;
                if !value.is_empty() {
                    params.set(occ.name.as_str(), value);
                }
            }
        }
        Some(params)
    }

    /// Renders a URI from a parameter mapping, the inverse of [`parse`].
    ///
    /// Each substituted value is validated against its identifier's pattern
    /// and consumed from a working copy of `params`. Missing optional
    /// identifiers substitute as empty. Returns the URI and the unconsumed
    /// remainder, or `None` if a required identifier is missing or a value
    /// is rejected; a partially substituted URI is never exposed.
    ///
    /// [`parse`]: Route::parse
    pub fn stringify(&self, params: &Params) -> Option<(String, Params)> {
        let mut remainder = params.clone();
        let mut uri = self.uri.clone();
        let mut ok = true;
        loop {
            let Some(caps) = IDENT_REGEX.captures(&uri) else {
                break;
            };
            let range = caps.get(0).unwrap().range();
            let name = caps[4].to_string();
            let optional = caps.get(5).is_some();
            let slash = if caps.get(1).is_some() { "/" } else { "" };
            let sep = if caps.get(2).is_some() { "." } else { "" };
            let replacement = match remainder.remove(&name) {
                None => {
                    if !optional {
                        ok = false;
                    }
                    String::new()
                }
                Some(value) => match self.ident(&name) {
                    Some(ident) if ident.regex.is_match(&value) => {
                        format!("{slash}{sep}{value}")
                    }
                    _ => {
                        ok = false;
                        String::new()
                    }
                },
            };
            uri.replace_range(range, &replacement);
        }
        if ok { Some((uri, remainder)) } else { None }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// What a configuration [`Error`] is about. Match and generation failures
/// are reported as `None` values, never as errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum ErrorKind {
    #[display("method not bindable to a route")]
    InvalidMethod,
    #[display("target must be `controller.action`")]
    InvalidTarget,
    #[display("constraint pattern is not a valid regex")]
    InvalidPattern,
    #[display("template has no such identifier")]
    UnknownIdentifier,
    #[display("no route registered under this name")]
    UnknownRouteName,
}

#[derive(Clone, Debug)]
pub struct Error {
    kind: ErrorKind,
    subject: String,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, subject: impl fmt::Display) -> Self {
        Self {
            kind,
            subject: subject.to_string(),
        }
    }
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (`{}`)", self.kind, self.subject)
    }
}

impl std::error::Error for Error {}
