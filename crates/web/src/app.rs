//! The application: a route table, the controllers its routes refer to and the convention
//! fallback, turned into envelopes and HTTP responses.

use crate::config::{ConfigError, LightConfig};
use crate::envelope::Envelope;
use futures::FutureExt;
use http::header::{ALLOW, CACHE_CONTROL, CONTENT_TYPE, EXPIRES, LOCATION};
use http::{HeaderValue, Method, Request, Response};
use light_router::{ControllerRegistry, ConventionResolver, Outcome, RouteMatch, RouteTable};
use mime::Mime;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, warn};

const NO_CACHE: &str = "no-cache, must-revalidate";
const EXPIRED: &str = "Sat, 26 Jul 1997 05:00:00 GMT";

/// A fallback body in case the envelope cannot be serialized.
const UNHANDLED_BODY: &str = "{\n  \"code\": 500,\n  \"status\": \"error\",\n  \"message\": \"Unhandled response.\"\n}";

pub struct AppBuilder {
    routes: RouteTable,
    controllers: ControllerRegistry,
    convention: Option<ConventionResolver>,
    content_type: Mime,
}

impl AppBuilder {
    fn new() -> Self {
        Self {
            routes: RouteTable::new(),
            controllers: ControllerRegistry::new(),
            convention: None,
            content_type: mime::APPLICATION_JSON,
        }
    }

    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    pub fn controllers(mut self, controllers: ControllerRegistry) -> Self {
        self.controllers = controllers;
        self
    }

    /// Resolves unmatched paths to controllers by convention.
    pub fn convention(mut self, resolver: ConventionResolver) -> Self {
        self.convention = Some(resolver);
        self
    }

    pub fn content_type(mut self, content_type: Mime) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn build(self) -> App {
        let content_type = HeaderValue::from_str(self.content_type.as_ref())
            .unwrap_or_else(|_invalid| HeaderValue::from_static("application/json"));
        App { routes: self.routes, controllers: self.controllers, convention: self.convention, content_type }
    }
}

pub struct App {
    routes: RouteTable,
    controllers: ControllerRegistry,
    convention: Option<ConventionResolver>,
    content_type: HeaderValue,
}

impl App {
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    /// Builds an application from `config`, registering its routes against `controllers`.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if a configured route cannot be registered or the content type is
    /// not valid.
    pub fn from_config(config: &LightConfig, controllers: ControllerRegistry) -> Result<App, ConfigError> {
        if controllers.namespace() != config.app.namespace {
            warn!(
                registry = controllers.namespace(),
                config = %config.app.namespace,
                "controller registry and convention routing use different namespaces"
            );
        }

        let routes = RouteTable::new();
        config.apply(&mut routes.collector())?;

        let mut builder = App::builder().routes(routes).controllers(controllers).content_type(config.app.mime()?);
        if config.app.convention {
            builder = builder.convention(ConventionResolver::new(config.app.namespace.as_str()));
        }
        Ok(builder.build())
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn controllers(&self) -> &ControllerRegistry {
        &self.controllers
    }

    /// Matches `method` and `path`, runs the handler and wraps the result.
    ///
    /// An unmatched path is tried once more through the convention resolver, if enabled. Handler
    /// errors and panics end up in the envelope, this never fails.
    pub async fn dispatch(&self, method: &Method, path: &str) -> Envelope {
        let matched = match self.routes.lookup(method, path) {
            RouteMatch::NotFound => match &self.convention {
                Some(convention) => convention.resolve_into(&self.routes, method, path, &self.controllers),
                None => RouteMatch::NotFound,
            },
            matched => matched,
        };

        match matched {
            RouteMatch::Found { entry, params } => {
                debug!(%method, path, pattern = %entry.pattern(), handler = %entry.handler().describe(), "route matched");
                let invocation = AssertUnwindSafe(entry.handler().invoke(params, &self.controllers)).catch_unwind();
                match invocation.await {
                    Ok(Ok(Outcome::Data(data))) => Envelope::success(data),
                    Ok(Ok(Outcome::Redirect(redirect))) => Envelope::redirect(&redirect),
                    Ok(Err(e)) => {
                        warn!(cause = %e, %method, path, "handler returned error");
                        Envelope::handler_error(e.as_ref())
                    }
                    Err(panic) => {
                        error!(cause = panic_message(panic.as_ref()), %method, path, "handler panicked");
                        Envelope::unhandled()
                    }
                }
            }
            RouteMatch::NotFound => {
                debug!(%method, path, "no route found");
                Envelope::not_found()
            }
            RouteMatch::MethodNotAllowed(allowed) => {
                debug!(%method, path, allowed = %allowed.header_value(), "method not allowed");
                Envelope::method_not_allowed(allowed)
            }
        }
    }

    /// Dispatches an HTTP request. The body is never read, the query string is ignored.
    pub async fn handle<B>(&self, request: Request<B>) -> Response<String> {
        let envelope = self.dispatch(request.method(), request.uri().path()).await;
        self.respond(&envelope)
    }

    /// Renders `envelope` as a response: status from the envelope code, no-cache headers, and the
    /// pretty printed envelope as body.
    pub fn respond(&self, envelope: &Envelope) -> Response<String> {
        let body = envelope.to_json_pretty().unwrap_or_else(|e| {
            error!(cause = %e, "failed to serialize envelope");
            UNHANDLED_BODY.to_string()
        });

        let mut response = Response::new(body);
        *response.status_mut() = envelope.code();

        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, self.content_type.clone());
        headers.insert(CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
        headers.insert(EXPIRES, HeaderValue::from_static(EXPIRED));

        if let Some(location) = envelope.location() {
            match HeaderValue::from_str(location) {
                Ok(location) => {
                    headers.insert(LOCATION, location);
                }
                Err(e) => warn!(cause = %e, location, "invalid redirect location"),
            }
        }
        if let Some(allowed) = envelope.allowed_methods()
            && let Ok(allow) = HeaderValue::from_str(&allowed.header_value())
        {
            headers.insert(ALLOW, allow);
        }

        response
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("routes", &self.routes.len())
            .field("controllers", &self.controllers)
            .field("convention", &self.convention)
            .field("content_type", &self.content_type)
            .finish()
    }
}

impl std::fmt::Debug for AppBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppBuilder")
            .field("convention", &self.convention)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::App;
    use crate::config::LightConfig;
    use async_trait::async_trait;
    use http::header::{ALLOW, CACHE_CONTROL, CONTENT_TYPE, EXPIRES, LOCATION};
    use http::{Method, Request, StatusCode};
    use light_router::{
        BoxError, Controller, ControllerRegistry, ConventionResolver, Handler, HttpError, Outcome, PathParams,
        RouteTable, handler_fn,
    };
    use serde_json::{Value, json};

    struct Test;

    #[async_trait]
    impl Controller for Test {
        async fn call(&self, action: &str, params: PathParams) -> Result<Outcome, BoxError> {
            match action {
                "index" => Ok(Outcome::Data(json!({ "foo": "bar" }))),
                "show" => Ok(Outcome::Data(json!({ "id": params.get("id") }))),
                _ => Err(HttpError::new(StatusCode::NOT_IMPLEMENTED, "Not implemented.").into()),
            }
        }
    }

    fn controllers() -> ControllerRegistry {
        let mut controllers = ControllerRegistry::new();
        controllers.register("Test", &["index", "show", "missing"], || Test);
        controllers.register("Welcome", &["index"], || Test);
        controllers
    }

    async fn broken(_params: PathParams) -> Result<Value, BoxError> {
        Err("storage unavailable".into())
    }

    async fn boom(_params: PathParams) -> &'static str {
        panic!("boom")
    }

    fn app() -> App {
        let routes = RouteTable::new();
        let mut collector = routes.collector();
        collector.get("/somewhere", handler_fn(|_params: PathParams| async { vec!["here"] })).unwrap();
        collector.map([Method::POST, Method::PUT], "/multiple", handler_fn(|_params: PathParams| async { "multiple" })).unwrap();
        collector.get("/test/{id:\\d+}", Handler::controller("Test", "show")).unwrap();
        collector.get("/todo", Handler::controller("Test", "missing")).unwrap();
        collector.get("/broken", handler_fn(broken)).unwrap();
        collector.get("/boom", handler_fn(boom)).unwrap();
        collector.redirect("/go", "/somewhere").unwrap();

        App::builder().routes(routes).controllers(controllers()).convention(ConventionResolver::default()).build()
    }

    #[tokio::test]
    async fn test_dispatch_found() {
        let app = app();
        let envelope = app.dispatch(&Method::GET, "/somewhere").await;
        assert_eq!(envelope.code(), StatusCode::OK);
        assert_eq!(envelope.data(), Some(&json!(["here"])));

        let envelope = app.dispatch(&Method::GET, "/test/42").await;
        assert_eq!(envelope.data(), Some(&json!({ "id": "42" })));
    }

    #[tokio::test]
    async fn test_dispatch_not_found_and_method_not_allowed() {
        let app = app();
        let envelope = app.dispatch(&Method::GET, "/nowhere").await;
        assert_eq!(envelope.code(), StatusCode::NOT_FOUND);
        assert_eq!(envelope.message(), Some("Not found."));

        let envelope = app.dispatch(&Method::DELETE, "/multiple").await;
        assert_eq!(envelope.code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(envelope.allowed_methods().map(|allowed| allowed.header_value()), Some("POST, PUT".to_string()));
    }

    #[tokio::test]
    async fn test_dispatch_handler_failures() {
        let app = app();

        let envelope = app.dispatch(&Method::GET, "/broken").await;
        assert_eq!(envelope.code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(envelope.message(), Some("storage unavailable"));

        let envelope = app.dispatch(&Method::GET, "/todo").await;
        assert_eq!(envelope.code(), StatusCode::NOT_IMPLEMENTED);

        let envelope = app.dispatch(&Method::GET, "/boom").await;
        assert_eq!(envelope.code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(envelope.message(), Some("Unhandled response."));
    }

    #[tokio::test]
    async fn test_dispatch_convention_is_cached() {
        let app = app();
        assert!(app.routes().list_routes().iter().all(|route| route.path() != "/test"));

        let envelope = app.dispatch(&Method::PATCH, "/test").await;
        assert_eq!(envelope.data(), Some(&json!({ "foo": "bar" })));
        assert!(app.routes().list_routes().iter().any(|route| route.path() == "/test"));

        let envelope = app.dispatch(&Method::GET, "/").await;
        assert_eq!(envelope.code(), StatusCode::OK);

        let without_convention = App::builder().controllers(controllers()).build();
        assert_eq!(without_convention.dispatch(&Method::GET, "/test").await.code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_handle_headers() {
        let app = app();

        let response = app.handle(Request::get("/somewhere?page=2").body(()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(response.headers()[CACHE_CONTROL], "no-cache, must-revalidate");
        assert_eq!(response.headers()[EXPIRES], "Sat, 26 Jul 1997 05:00:00 GMT");
        let body: Value = serde_json::from_str(response.body()).unwrap();
        assert_eq!(body["data"], json!(["here"]));
        assert!(response.body().contains("\n  \"code\": 200"));

        let response = app.handle(Request::get("/go").body(()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/somewhere");

        let response = app.handle(Request::delete("/multiple").body(()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "POST, PUT");
    }

    #[tokio::test]
    async fn test_from_config() {
        let config = LightConfig::from_toml(
            r#"
            [app]
            content_type = "application/vnd.light+json"
            convention = false

            [[routes]]
            methods = ["GET"]
            path = "/control"
            controller = "Test@index"
            "#,
        )
        .unwrap();
        let app = App::from_config(&config, controllers()).unwrap();

        let response = app.handle(Request::get("/control").body(()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/vnd.light+json");

        assert_eq!(app.dispatch(&Method::GET, "/test").await.code(), StatusCode::NOT_FOUND);
    }
}
