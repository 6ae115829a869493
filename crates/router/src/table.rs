//! The route table and its dispatch algorithm.
//!
//! Entries are kept per method in registration order and matched linearly: the first entry whose
//! pattern matches wins. When two patterns can match the same path, register the more specific one
//! first.
//!
//! ## Thread Safety
//!
//! The table is read-mostly. Readers load an immutable snapshot through [`ArcSwap`]; writers take a
//! single lock, copy the snapshot, append to the copy and swap it in. A concurrent reader therefore
//! sees a table either with or without a new entry, never a partial one.

use crate::collector::RouteCollector;
use crate::error::RouteError;
use crate::handler::Handler;
use crate::lookup::{AllowedMethods, RouteMatch};
use crate::pattern::{Pattern, normalize_path, split_path};
use arc_swap::ArcSwap;
use http::Method;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// The methods registered by `any` and by convention routes.
pub const ALL_METHODS: [Method; 7] =
    [Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::HEAD, Method::OPTIONS];

/// One registered `(method, pattern, handler)` triple.
#[derive(Debug)]
pub struct RouteEntry {
    method: Method,
    pattern: Pattern,
    handler: Handler,
}

impl RouteEntry {
    pub fn new(method: Method, pattern: Pattern, handler: Handler) -> Self {
        Self { method, pattern, handler }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

/// A registered path as shown by route listings.
#[derive(Debug, Clone, Serialize)]
pub struct ListedRoute {
    path: String,
    handlers: Vec<ListedHandler>,
}

impl ListedRoute {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn handlers(&self) -> &[ListedHandler] {
        &self.handlers
    }
}

/// The handler registered for one method of a [`ListedRoute`].
#[derive(Debug, Clone, Serialize)]
pub struct ListedHandler {
    #[serde(serialize_with = "serialize_method")]
    method: Method,
    handler: String,
}

impl ListedHandler {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn handler(&self) -> &str {
        &self.handler
    }
}

fn serialize_method<S: Serializer>(method: &Method, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(method.as_str())
}

/// An immutable snapshot of the table.
#[derive(Debug, Clone, Default)]
struct Routes {
    by_method: HashMap<Method, Vec<Arc<RouteEntry>>>,
    listing: Vec<ListedRoute>,
    len: usize,
}

impl Routes {
    fn push(&mut self, path: &str, entry: RouteEntry) {
        let position = match self.listing.iter().position(|route| route.path == path) {
            Some(position) => position,
            None => {
                self.listing.push(ListedRoute { path: path.to_string(), handlers: Vec::new() });
                self.listing.len() - 1
            }
        };

        // the first registration for a method is the one that answers requests
        let handlers = &mut self.listing[position].handlers;
        if !handlers.iter().any(|listed| listed.method == entry.method) {
            handlers.push(ListedHandler { method: entry.method.clone(), handler: entry.handler.describe() });
        }

        self.by_method.entry(entry.method.clone()).or_default().push(Arc::new(entry));
        self.len += 1;
    }

    fn lookup(&self, method: &Method, path: &str) -> RouteMatch {
        let Some(segments) = split_path(normalize_path(path)) else {
            return RouteMatch::NotFound;
        };

        if let Some(entries) = self.by_method.get(method) {
            for entry in entries {
                if let Some(params) = entry.pattern.match_segments(&segments) {
                    return RouteMatch::Found { entry: Arc::clone(entry), params };
                }
            }
        }

        let allowed = self
            .by_method
            .iter()
            .filter(|(other, _)| *other != method)
            .filter(|(_, entries)| entries.iter().any(|entry| entry.pattern.is_match(&segments)))
            .map(|(other, _)| other.clone())
            .collect::<Vec<_>>();

        if allowed.is_empty() { RouteMatch::NotFound } else { RouteMatch::MethodNotAllowed(AllowedMethods::new(allowed)) }
    }
}

/// Maps HTTP methods to ordered route entries.
pub struct RouteTable {
    routes: ArcSwap<Routes>,
    write_lock: Mutex<()>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self { routes: ArcSwap::from_pointee(Routes::default()), write_lock: Mutex::new(()) }
    }

    /// Returns a collector registering routes into this table.
    pub fn collector(&self) -> RouteCollector<'_> {
        RouteCollector::new(self)
    }

    /// Compiles `pattern` and appends it for `method`.
    ///
    /// # Errors
    /// Returns [`RouteError::Pattern`] if the pattern does not compile, nothing is registered then.
    pub fn add(&self, method: Method, pattern: &str, handler: impl Into<Handler>) -> Result<(), RouteError> {
        let compiled = Pattern::compile(pattern).map_err(|source| RouteError::Pattern {
            method: method.clone(),
            path: pattern.to_string(),
            source,
        })?;
        let path = compiled.as_str().to_string();
        self.insert(&path, vec![RouteEntry::new(method, compiled, handler.into())]);
        Ok(())
    }

    /// Appends entries listed under `path`, as one atomic update.
    pub(crate) fn insert(&self, path: &str, entries: Vec<RouteEntry>) {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut routes = Routes::clone(&self.routes.load());
        for entry in entries {
            debug!(method = %entry.method, path, handler = %entry.handler.describe(), "register route");
            routes.push(path, entry);
        }
        self.routes.store(Arc::new(routes));
    }

    /// Like [`RouteTable::insert`], but only if `method` and `path` still resolve to
    /// [`RouteMatch::NotFound`] once the write lock is held.
    ///
    /// Returns whether the entries were inserted.
    pub(crate) fn insert_if_not_found(&self, method: &Method, path: &str, entries: Vec<RouteEntry>) -> bool {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.routes.load();
        if !current.lookup(method, path).is_not_found() {
            return false;
        }

        let mut routes = Routes::clone(&current);
        for entry in entries {
            routes.push(path, entry);
        }
        self.routes.store(Arc::new(routes));
        true
    }

    /// Finds the route for `method` and `path`.
    ///
    /// The query string is ignored and an empty path is treated as `/`. If no route of `method`
    /// matches, the other methods are checked to tell a wrong method apart from an unknown path.
    pub fn lookup(&self, method: &Method, path: &str) -> RouteMatch {
        self.routes.load().lookup(method, path)
    }

    /// Registered paths in registration order, with the handler for each method.
    pub fn list_routes(&self) -> Vec<ListedRoute> {
        self.routes.load().listing.clone()
    }

    /// The number of route entries, one per method and pattern.
    pub fn len(&self) -> usize {
        self.routes.load().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable").field("routes", &self.list_routes()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::RouteTable;
    use crate::handler::handler_fn;
    use crate::lookup::RouteMatch;
    use crate::{Handler, PathParams, RouteError};
    use http::Method;

    fn handler(name: &'static str) -> Handler {
        Handler::from(handler_fn(move |_params: PathParams| async move { name }))
    }

    fn found(table: &RouteTable, method: Method, path: &str) -> Vec<(String, Option<String>)> {
        match table.lookup(&method, path) {
            RouteMatch::Found { params, .. } => {
                params.iter().map(|(name, value)| (name.to_string(), value.map(str::to_string))).collect()
            }
            other => panic!("expected {method} {path} to be found, got {other:?}"),
        }
    }

    #[test]
    fn test_first_registered_wins() {
        let table = RouteTable::new();
        table.add(Method::GET, "/articles/{id:\\d+}", handler("by id")).unwrap();
        table.add(Method::GET, "/articles/{category}[/{title}]", handler("by category")).unwrap();

        let RouteMatch::Found { entry, .. } = table.lookup(&Method::GET, "/articles/12") else { panic!() };
        assert_eq!(entry.pattern().as_str(), "/articles/{id:\\d+}");

        let RouteMatch::Found { entry, .. } = table.lookup(&Method::GET, "/articles/tech") else { panic!() };
        assert_eq!(entry.pattern().as_str(), "/articles/{category}[/{title}]");
    }

    #[test]
    fn test_found_params() {
        let table = RouteTable::new();
        table.add(Method::GET, "/test/{id:\\d+}/{test:\\d+}", handler("test")).unwrap();

        assert_eq!(
            found(&table, Method::GET, "/test/12/34"),
            vec![("id".to_string(), Some("12".to_string())), ("test".to_string(), Some("34".to_string()))]
        );
        assert!(table.lookup(&Method::GET, "/test/abc/34").is_not_found());
    }

    #[test]
    fn test_method_not_allowed() {
        let table = RouteTable::new();
        table.add(Method::POST, "/multiple", handler("post")).unwrap();
        table.add(Method::PUT, "/multiple", handler("put")).unwrap();
        table.add(Method::GET, "/other", handler("get")).unwrap();

        let RouteMatch::MethodNotAllowed(allowed) = table.lookup(&Method::DELETE, "/multiple") else { panic!() };
        assert_eq!(allowed.methods(), &[Method::POST, Method::PUT]);
    }

    #[test]
    fn test_not_found() {
        let table = RouteTable::new();
        table.add(Method::GET, "/somewhere", handler("here")).unwrap();

        assert!(table.lookup(&Method::GET, "/nowhere").is_not_found());
        assert!(table.lookup(&Method::POST, "/nowhere").is_not_found());
        assert!(table.lookup(&Method::GET, "somewhere").is_not_found());
    }

    #[test]
    fn test_trailing_slash_is_distinct() {
        let table = RouteTable::new();
        table.add(Method::GET, "/somewhere", handler("here")).unwrap();
        table.add(Method::GET, "/users[/]", handler("users")).unwrap();

        assert!(table.lookup(&Method::GET, "/somewhere/").is_not_found());
        assert!(table.lookup(&Method::GET, "/users").is_found());
        assert!(table.lookup(&Method::GET, "/users/").is_found());
    }

    #[test]
    fn test_empty_path_and_query_string() {
        let table = RouteTable::new();
        table.add(Method::GET, "/", handler("root")).unwrap();
        table.add(Method::GET, "/somewhere", handler("here")).unwrap();

        assert!(table.lookup(&Method::GET, "").is_found());
        assert!(table.lookup(&Method::GET, "/somewhere?x=1").is_found());
    }

    #[test]
    fn test_empty_pattern_is_listed_as_root() {
        let table = RouteTable::new();
        table.add(Method::GET, "", handler("root")).unwrap();
        table.collector().post("", handler("root")).unwrap();

        assert!(table.lookup(&Method::GET, "/").is_found());
        let listed = table.list_routes();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].path(), "/");
        assert_eq!(listed[0].handlers().len(), 2);
    }

    #[test]
    fn test_invalid_pattern_registers_nothing() {
        let table = RouteTable::new();
        let error = table.add(Method::GET, "/users/{id", handler("bad")).unwrap_err();
        assert!(matches!(error, RouteError::Pattern { .. }));
        assert!(table.is_empty());
        assert!(table.list_routes().is_empty());
    }

    #[test]
    fn test_listing_keeps_registration_order_and_first_handler() {
        let table = RouteTable::new();
        table.add(Method::GET, "/b", handler("b")).unwrap();
        table.add(Method::GET, "/a", Handler::controller("Test", "index")).unwrap();
        table.add(Method::POST, "/b", handler("b")).unwrap();
        table.add(Method::GET, "/a", handler("shadowed")).unwrap();

        let listed = table.list_routes();
        assert_eq!(listed.iter().map(|route| route.path()).collect::<Vec<_>>(), vec!["/b", "/a"]);
        assert_eq!(listed[0].handlers().len(), 2);
        assert_eq!(listed[1].handlers().len(), 1);
        assert_eq!(listed[1].handlers()[0].handler(), "Test@index");
        assert_eq!(table.len(), 4);
    }
}
