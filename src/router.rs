//! Ordered route collection: first/all dispatch and reverse URI building.

use std::collections::HashMap;

use serde::Serialize;

use crate::{Constraint, Error, ErrorKind, Method, Params, Result, Route, Target};

/// An append-only sequence of [`Route`]s plus a name index.
///
/// Registration order is the sole precedence rule: the first route whose
/// matcher accepts a URI wins.
#[derive(Clone, Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
    names: HashMap<String, usize>,
}

/// A successful dispatch: what to invoke, the method as requested, the
/// extracted parameters, and the index to resume scanning after.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    pub target: Option<Target>,
    pub method: Option<Method>,
    pub params: Params,
    pub next: usize,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a route; builder calls on the returned handle configure it.
    pub fn register(&mut self, uri: &str, method: Option<Method>) -> Result<RouteRef<'_>> {
        let route = Route::new(uri, method)?;
        self.routes.push(route);
        let index = self.routes.len() - 1;
        Ok(RouteRef {
            router: self,
            index,
        })
    }

    pub fn get(&mut self, uri: &str) -> Result<RouteRef<'_>> {
        self.register(uri, Some(Method::Get))
    }
    pub fn post(&mut self, uri: &str) -> Result<RouteRef<'_>> {
        self.register(uri, Some(Method::Post))
    }
    pub fn put(&mut self, uri: &str) -> Result<RouteRef<'_>> {
        self.register(uri, Some(Method::Put))
    }
    pub fn delete(&mut self, uri: &str) -> Result<RouteRef<'_>> {
        self.register(uri, Some(Method::Delete))
    }
    pub fn options(&mut self, uri: &str) -> Result<RouteRef<'_>> {
        self.register(uri, Some(Method::Options))
    }

    /// Linear scan from `from`, returning the first match. `next` of the
    /// result resumes strictly after the matched route.
    pub fn find_next(&self, uri: &str, method: Option<Method>, from: usize) -> Option<RouteMatch> {
        for (index, route) in self.routes.iter().enumerate().skip(from) {
            if let Some(params) = route.parse(uri, method) {
                return Some(RouteMatch {
                    target: route.target().cloned(),
                    method,
                    params,
                    next: index + 1,
                });
            }
        }
        None
    }

    pub fn find_first(&self, uri: &str, method: Option<Method>) -> Option<RouteMatch> {
        self.find_next(uri, method, 0)
    }

    /// All matches, in registration order.
    pub fn find_all(&self, uri: &str, method: Option<Method>) -> Vec<RouteMatch> {
        let mut all = Vec::new();
        let mut from = 0;
        while let Some(found) = self.find_next(uri, method, from) {
            from = found.next;
            all.push(found);
        }
        all
    }

    /// Builds a URI for the named route. Parameters not consumed by the
    /// template become the query string unless `skip_query` is set.
    ///
    /// Returns `Ok(None)` when generation fails; an unknown name is a
    /// configuration error.
    pub fn url(&self, name: &str, params: &Params, skip_query: bool) -> Result<Option<String>> {
        let &index = self
            .names
            .get(name)
            .ok_or_else(|| Error::new(ErrorKind::UnknownRouteName, name))?;
        let Some((uri, remainder)) = self.routes[index].stringify(params) else {
            return Ok(None);
        };
        if skip_query || remainder.is_empty() {
            Ok(Some(uri))
        } else {
            Ok(Some(format!("{uri}?{}", encode_query(&remainder))))
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn route_named(&self, name: &str) -> Option<&Route> {
        self.names.get(name).map(|&index| &self.routes[index])
    }
}

/// Mutable handle to a just-registered route, for builder-style chaining.
#[derive(Debug)]
pub struct RouteRef<'a> {
    router: &'a mut Router,
    index: usize,
}

impl RouteRef<'_> {
    /// See [`Route::constrain`].
    pub fn constrain(self, name: &str, constraint: impl Into<Constraint>) -> Result<Self> {
        self.router.routes[self.index].constrain(name, constraint)?;
        Ok(self)
    }

    /// See [`Route::to`].
    pub fn to(self, target: &str) -> Result<Self> {
        self.router.routes[self.index].to(target)?;
        Ok(self)
    }

    /// Names the route for reverse lookup. A later route registered under
    /// the same name takes over the name; the sequence is untouched.
    pub fn name(self, name: &str) -> Self {
        self.router.routes[self.index].set_name(name);
        self.router.names.insert(name.to_string(), self.index);
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn route(&self) -> &Route {
        &self.router.routes[self.index]
    }
}

fn encode_query(params: &Params) -> String {
    let mut out = String::new();
    for (name, value) in params.iter() {
        if !out.is_empty() {
            out.push('&');
        }
        out.push_str(&urlencoding::encode(name));
        out.push('=');
        out.push_str(&urlencoding::encode(value));
    }
    out
}
