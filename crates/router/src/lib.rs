//! Request routing for the light framework.
//!
//! This crate answers one question: given an HTTP method and a path, what should handle the request
//! and with which path parameters.
//!
//! # Features
//!
//! - Patterns with literal segments, named parameters, regex constraints and trailing optional
//!   groups: `/articles/{id:\d+}`, `/articles/{category}[/{title}]`
//! - Nested group prefixes, `any`, multi-method and redirect registrations
//! - First-match-wins dispatch that tells an unknown path from a wrong method
//! - Convention routing from path segments to registered controller actions
//! - Lock-free reads, copy-on-write updates
//!
//! # Example
//!
//! ```
//! use http::Method;
//! use light_router::{PathParams, RouteMatch, RouteTable, handler_fn};
//! use serde_json::json;
//!
//! let table = RouteTable::new();
//! table
//!     .collector()
//!     .get("/articles/{category}[/{title}]", handler_fn(|params: PathParams| async move {
//!         json!({ "category": params.get("category"), "title": params.get("title") })
//!     }))
//!     .expect("pattern is valid");
//!
//! match table.lookup(&Method::GET, "/articles/tech") {
//!     RouteMatch::Found { params, .. } => {
//!         assert_eq!(params.get("category"), Some("tech"));
//!         assert_eq!(params.get("title"), None);
//!     }
//!     other => panic!("unexpected {other:?}"),
//! }
//! assert!(matches!(table.lookup(&Method::POST, "/articles/tech"), RouteMatch::MethodNotAllowed(_)));
//! assert!(table.lookup(&Method::GET, "/articles").is_not_found());
//! ```

mod collector;
mod controller;
mod convention;
mod error;
mod handler;
mod lookup;
mod params;
mod responder;
mod table;

pub mod pattern;

pub use collector::RouteCollector;
pub use controller::{Controller, ControllerLookup, ControllerRegistry, DEFAULT_NAMESPACE};
pub use convention::{ConventionResolver, ConventionRoute, INDEX_ACTION, WELCOME_CONTROLLER};
pub use error::{BoxError, ControllerError, HttpError, PatternError, RouteError};
pub use handler::{FnHandler, Handler, RedirectHandler, RequestHandler, handler_fn};
pub use lookup::{AllowedMethods, RouteMatch};
pub use params::PathParams;
pub use pattern::Pattern;
pub use responder::{Json, Outcome, Redirect, Responder};
pub use table::{ALL_METHODS, ListedHandler, ListedRoute, RouteEntry, RouteTable};
