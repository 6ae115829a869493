//! Route lookup results.

use crate::PathParams;
use crate::handler::Handler;
use crate::table::RouteEntry;
use http::Method;
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// Result of looking up a method and path in the route table.
#[derive(Debug, Clone)]
pub enum RouteMatch {
    /// A route matched by path and method.
    Found { entry: Arc<RouteEntry>, params: PathParams },
    /// No route matched the path.
    NotFound,
    /// Path matched, but not for the requested method.
    MethodNotAllowed(AllowedMethods),
}

impl RouteMatch {
    #[inline]
    pub fn is_found(&self) -> bool {
        matches!(self, RouteMatch::Found { .. })
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, RouteMatch::NotFound)
    }

    /// The matched handler, if any.
    pub fn handler(&self) -> Option<&Handler> {
        match self {
            RouteMatch::Found { entry, .. } => Some(entry.handler()),
            _ => None,
        }
    }

    /// The bound parameters, if any.
    pub fn params(&self) -> Option<&PathParams> {
        match self {
            RouteMatch::Found { params, .. } => Some(params),
            _ => None,
        }
    }
}

/// The set of methods a path is registered for.
///
/// Kept in a canonical order and free of duplicates so that listings and `Allow` headers are
/// stable regardless of registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedMethods {
    methods: Vec<Method>,
}

impl AllowedMethods {
    pub fn new(mut methods: Vec<Method>) -> Self {
        methods.sort_by(|a, b| method_order(a).cmp(&method_order(b)).then_with(|| a.as_str().cmp(b.as_str())));
        methods.dedup();
        Self { methods }
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn contains(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    /// Format as an HTTP Allow header value.
    pub fn header_value(&self) -> String {
        self.methods.iter().map(Method::as_str).collect::<Vec<_>>().join(", ")
    }
}

impl Serialize for AllowedMethods {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.methods.iter().map(Method::as_str))
    }
}

fn method_order(method: &Method) -> u8 {
    match *method {
        Method::GET => 0,
        Method::HEAD => 1,
        Method::POST => 2,
        Method::PUT => 3,
        Method::DELETE => 4,
        Method::PATCH => 5,
        Method::OPTIONS => 6,
        _ => u8::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::AllowedMethods;
    use http::Method;

    #[test]
    fn test_allowed_methods_are_sorted_and_deduplicated() {
        let allowed = AllowedMethods::new(vec![Method::PUT, Method::GET, Method::POST, Method::GET]);
        assert_eq!(allowed.methods(), &[Method::GET, Method::POST, Method::PUT]);
        assert_eq!(allowed.header_value(), "GET, POST, PUT");
        assert!(allowed.contains(&Method::POST));
        assert!(!allowed.contains(&Method::DELETE));
    }

    #[test]
    fn test_extension_methods_sort_last() {
        let allowed = AllowedMethods::new(vec![Method::from_bytes(b"PURGE").unwrap(), Method::OPTIONS]);
        assert_eq!(allowed.header_value(), "OPTIONS, PURGE");
    }

    #[test]
    fn test_serialize() {
        let allowed = AllowedMethods::new(vec![Method::POST, Method::GET]);
        assert_eq!(serde_json::to_string(&allowed).unwrap(), r#"["GET","POST"]"#);
    }
}
