//! Convention based routing.
//!
//! When no explicit route matches, a path is read as a controller name followed by an optional
//! action name: `/admin/users` tries controller `Admin::Users` with action `index` first, then
//! controller `Admin` with action `users`. The root path maps to the `Welcome` controller.
//!
//! A resolved route is registered for the literal path under every method, so later requests for
//! the same path are answered by the route table directly.

use crate::controller::ControllerLookup;
use crate::handler::Handler;
use crate::lookup::RouteMatch;
use crate::pattern::{Pattern, normalize_path, split_path};
use crate::table::{ALL_METHODS, RouteEntry, RouteTable};
use http::Method;
use tracing::{debug, info};

/// The controller serving `/`.
pub const WELCOME_CONTROLLER: &str = "Welcome";

/// The action used when the path names a controller only.
pub const INDEX_ACTION: &str = "index";

/// A controller and action derived from a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionRoute {
    controller: String,
    action: String,
}

impl ConventionRoute {
    pub fn controller(&self) -> &str {
        &self.controller
    }

    pub fn action(&self) -> &str {
        &self.action
    }
}

/// Derives routes from path segments.
#[derive(Debug, Clone)]
pub struct ConventionResolver {
    namespace: String,
}

impl ConventionResolver {
    /// Controller names are qualified with `namespace`, for example `app::controller`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self { namespace: namespace.into() }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Resolves `path` against `lookup`. A miss is a normal outcome and yields `None`.
    pub fn resolve(&self, path: &str, lookup: &dyn ControllerLookup) -> Option<ConventionRoute> {
        let path = normalize_path(path);
        let segments = split_path(path)?;

        if path == "/" {
            return self.candidate(&[WELCOME_CONTROLLER.to_string()], INDEX_ACTION, lookup);
        }
        if segments.iter().any(|segment| segment.is_empty()) {
            return None;
        }

        let names = segments.iter().map(|segment| title_case(segment)).collect::<Vec<_>>();
        if let Some(route) = self.candidate(&names, INDEX_ACTION, lookup) {
            return Some(route);
        }

        match segments.split_last() {
            Some((action, rest)) if !rest.is_empty() => self.candidate(&names[..rest.len()], action, lookup),
            _ => None,
        }
    }

    fn candidate(&self, names: &[String], action: &str, lookup: &dyn ControllerLookup) -> Option<ConventionRoute> {
        let controller = format!("{}::{}", self.namespace, names.join("::"));
        (lookup.has_controller(&controller) && lookup.has_action(&controller, action))
            .then(|| ConventionRoute { controller, action: action.to_string() })
    }

    /// Resolves `path` and, on success, registers it in `table` under every method before looking
    /// `method` and `path` up again.
    ///
    /// Returns [`RouteMatch::NotFound`] when nothing resolves.
    pub fn resolve_into(
        &self,
        table: &RouteTable,
        method: &Method,
        path: &str,
        lookup: &dyn ControllerLookup,
    ) -> RouteMatch {
        let Some(route) = self.resolve(path, lookup) else {
            debug!(%method, path, "no convention route");
            return RouteMatch::NotFound;
        };

        let path = normalize_path(path);
        let pattern = Pattern::literal(path);
        let handler = Handler::controller(route.controller.as_str(), route.action.as_str());
        let entries = ALL_METHODS
            .into_iter()
            .map(|method| RouteEntry::new(method, pattern.clone(), handler.clone()))
            .collect::<Vec<_>>();

        if table.insert_if_not_found(method, path, entries) {
            info!(path, controller = %route.controller, action = %route.action, "cached convention route");
        }
        table.lookup(method, path)
    }
}

impl Default for ConventionResolver {
    fn default() -> Self {
        Self::new(crate::controller::DEFAULT_NAMESPACE)
    }
}

/// Upper-cases the first character and keeps the rest as is.
fn title_case(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
