//! The route registration surface.
//!
//! A [`RouteCollector`] borrows a [`RouteTable`] and owns the stack of group prefixes, so prefix
//! state never outlives a registration session.
//!
//! # Example
//!
//! ```
//! use light_router::{PathParams, RouteTable, handler_fn};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), light_router::RouteError> {
//! let table = RouteTable::new();
//! let mut routes = table.collector();
//!
//! routes.group("/admin", |routes| {
//!     routes.get("/profile", handler_fn(|_: PathParams| async { vec!["admin/profile"] }))?;
//!     routes.group("/manage", |routes| {
//!         routes.get("/users", handler_fn(|_: PathParams| async { vec!["admin/manage/users"] }))?;
//!         Ok(())
//!     })?;
//!     Ok(())
//! })?;
//! routes.redirect("/go", "/admin/manage/users")?;
//! routes.get("/test/{id:\\d+}", handler_fn(|params: PathParams| async move { json!({ "id": params.get("id") }) }))?;
//!
//! assert!(table.lookup(&http::Method::GET, "/admin/manage/users").is_found());
//! # Ok(())
//! # }
//! ```

use crate::error::RouteError;
use crate::handler::{Handler, RedirectHandler};
use crate::pattern::Pattern;
use crate::responder::Redirect;
use crate::table::{ALL_METHODS, RouteEntry, RouteTable};
use http::Method;
use std::fmt;

pub struct RouteCollector<'table> {
    table: &'table RouteTable,
    prefixes: Vec<String>,
}

macro_rules! method_route {
    ($method:ident, $upper_case_method:ident) => {
        #[doc = concat!("Registers a ", stringify!($upper_case_method), " route.")]
        ///
        /// # Errors
        /// Returns [`RouteError::Pattern`] if the prefixed pattern does not compile.
        pub fn $method(&mut self, path: &str, handler: impl Into<Handler>) -> Result<&mut Self, RouteError> {
            self.route(Method::$upper_case_method, path, handler)
        }
    };
}

impl<'table> RouteCollector<'table> {
    pub(crate) fn new(table: &'table RouteTable) -> Self {
        Self { table, prefixes: Vec::new() }
    }

    /// Registers `handler` for a single method.
    ///
    /// # Errors
    /// Returns [`RouteError::Pattern`] if the prefixed pattern does not compile.
    pub fn route(&mut self, method: Method, path: &str, handler: impl Into<Handler>) -> Result<&mut Self, RouteError> {
        self.map([method], path, handler)
    }

    /// Registers the same handler under each of `methods`. The pattern is compiled once, with the
    /// active group prefixes concatenated in front of it.
    ///
    /// # Errors
    /// Returns [`RouteError::NoMethods`] if `methods` is empty, or [`RouteError::Pattern`] if the
    /// prefixed pattern does not compile. In both cases none of the methods is registered.
    pub fn map<I>(&mut self, methods: I, path: &str, handler: impl Into<Handler>) -> Result<&mut Self, RouteError>
    where
        I: IntoIterator<Item = Method>,
    {
        let methods = methods.into_iter().collect::<Vec<_>>();
        let path = self.prefixed(path);
        let Some(first) = methods.first() else {
            return Err(RouteError::NoMethods(path));
        };

        let pattern = Pattern::compile(&path).map_err(|source| RouteError::Pattern { method: first.clone(), path, source })?;

        let handler = handler.into();
        let entries = methods
            .into_iter()
            .map(|method| RouteEntry::new(method, pattern.clone(), handler.clone()))
            .collect::<Vec<_>>();
        self.table.insert(pattern.as_str(), entries);
        Ok(self)
    }

    /// Registers `handler` under `GET POST PUT PATCH DELETE HEAD OPTIONS`.
    ///
    /// # Errors
    /// Returns [`RouteError::Pattern`] if the prefixed pattern does not compile.
    pub fn any(&mut self, path: &str, handler: impl Into<Handler>) -> Result<&mut Self, RouteError> {
        self.map(ALL_METHODS, path, handler)
    }

    method_route!(get, GET);
    method_route!(post, POST);
    method_route!(put, PUT);
    method_route!(patch, PATCH);
    method_route!(delete, DELETE);
    method_route!(head, HEAD);
    method_route!(options, OPTIONS);

    /// Registers a `GET` route answering with a `302 Found` redirect to `location`.
    ///
    /// # Errors
    /// Returns [`RouteError::Pattern`] if the prefixed pattern does not compile.
    pub fn redirect(&mut self, path: &str, location: &str) -> Result<&mut Self, RouteError> {
        self.get(path, RedirectHandler::new(Redirect::to(location)))
    }

    /// Registers a `GET` route answering with a redirect using `status`.
    ///
    /// # Errors
    /// Returns [`RouteError::InvalidRedirectStatus`] if `status` is not a 3xx code, or
    /// [`RouteError::Pattern`] if the prefixed pattern does not compile.
    pub fn redirect_with_status(&mut self, path: &str, location: &str, status: u16) -> Result<&mut Self, RouteError> {
        let redirect = Redirect::with_status(location, status)?;
        self.get(path, RedirectHandler::new(redirect))
    }

    /// Runs `f` with `prefix` prepended to every route it registers.
    ///
    /// Groups nest, prefixes are concatenated outermost first. The prefix is removed again when `f`
    /// returns, whether it succeeded or not.
    ///
    /// # Errors
    /// Returns the error returned by `f`.
    pub fn group<F>(&mut self, prefix: &str, f: F) -> Result<&mut Self, RouteError>
    where
        F: FnOnce(&mut Self) -> Result<(), RouteError>,
    {
        self.prefixes.push(prefix.to_string());
        let result = f(self);
        self.prefixes.pop();
        result.map(|()| self)
    }

    /// The prefix currently applied to registered paths.
    pub fn prefix(&self) -> String {
        self.prefixes.concat()
    }

    fn prefixed(&self, path: &str) -> String {
        let mut prefixed = self.prefix();
        prefixed.push_str(path);
        prefixed
    }
}

impl fmt::Debug for RouteCollector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteCollector").field("prefix", &self.prefix()).finish_non_exhaustive()
    }
}
