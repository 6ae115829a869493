//! TOML application configuration.
//!
//! ```toml
//! [app]
//! content_type = "application/json"
//! namespace = "app::controller"
//! convention = true
//!
//! [log]
//! level = "info"
//!
//! [[routes]]
//! methods = ["GET"]
//! path = "/control"
//! controller = "Test@index"
//!
//! [[redirects]]
//! path = "/go"
//! location = "/admin/manage/users"
//!
//! [[groups]]
//! prefix = "/admin"
//!
//! [[groups.routes]]
//! methods = "ANY"
//! path = "/dashboard"
//! controller = "Admin@dashboard"
//! ```

use http::Method;
use light_router::{ALL_METHODS, DEFAULT_NAMESPACE, Handler, RouteCollector, RouteError};
use mime::Mime;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid route config: {0}")]
    Route(#[from] RouteError),

    #[error("invalid content type '{value}': {source}")]
    ContentType {
        value: String,
        #[source]
        source: mime::FromStrError,
    },
}

/// Loads and parses a TOML configuration file.
///
/// # Errors
/// Returns [`ConfigError::Io`] if the file cannot be read or [`ConfigError::Parse`] if it is not
/// a valid configuration.
pub fn load_config(path: impl AsRef<Path>) -> Result<LightConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    let config = LightConfig::from_toml(&content)?;
    info!(path = %path.display(), routes = config.route_count(), "loaded config");
    Ok(config)
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub app: AppConfig,
    pub log: LogConfig,
    pub routes: Vec<RouteConfig>,
    pub redirects: Vec<RedirectConfig>,
    pub groups: Vec<GroupConfig>,
}

impl LightConfig {
    /// # Errors
    /// Returns [`ConfigError::Parse`] if `content` is not a valid configuration.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Registers every configured route, redirect and group into `routes`.
    ///
    /// # Errors
    /// Stops at the first route that cannot be registered. Routes registered before it stay in the
    /// table.
    pub fn apply(&self, routes: &mut RouteCollector<'_>) -> Result<(), ConfigError> {
        apply_entries(routes, &self.routes, &self.redirects, &self.groups)?;
        Ok(())
    }

    /// Number of configured routes and redirects, groups included.
    pub fn route_count(&self) -> usize {
        self.routes.len() + self.redirects.len() + self.groups.iter().map(GroupConfig::route_count).sum::<usize>()
    }

    /// Every `(controller, action)` pair named by a configured route, groups included, in
    /// declaration order. Malformed handlers are skipped, [`LightConfig::apply`] reports them.
    pub fn controller_actions(&self) -> Vec<(&str, &str)> {
        let mut actions = Vec::new();
        collect_controller_actions(&self.routes, &self.groups, &mut actions);
        actions
    }
}

fn collect_controller_actions<'a>(
    routes: &'a [RouteConfig],
    groups: &'a [GroupConfig],
    actions: &mut Vec<(&'a str, &'a str)>,
) {
    actions.extend(routes.iter().filter_map(|route| route.controller.split_once('@')));
    for group in groups {
        collect_controller_actions(&group.routes, &group.groups, actions);
    }
}

fn apply_entries(
    collector: &mut RouteCollector<'_>,
    routes: &[RouteConfig],
    redirects: &[RedirectConfig],
    groups: &[GroupConfig],
) -> Result<(), RouteError> {
    for route in routes {
        collector.map(route.methods.resolve()?, &route.path, Handler::parse_controller(&route.controller)?)?;
    }
    for redirect in redirects {
        collector.redirect_with_status(&redirect.path, &redirect.location, redirect.code)?;
    }
    for group in groups {
        collector.group(&group.prefix, |collector| {
            apply_entries(collector, &group.routes, &group.redirects, &group.groups)
        })?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Value of the `Content-Type` response header.
    pub content_type: String,
    /// Namespace convention routes qualify controller names with.
    pub namespace: String,
    /// Whether unmatched paths are resolved to controllers by convention.
    pub convention: bool,
}

impl AppConfig {
    /// # Errors
    /// Returns [`ConfigError::ContentType`] if the content type is not a valid mime type.
    pub fn mime(&self) -> Result<Mime, ConfigError> {
        self.content_type
            .parse()
            .map_err(|source| ConfigError::ContentType { value: self.content_type.clone(), source })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            content_type: mime::APPLICATION_JSON.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            convention: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directives, `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RouteConfig {
    pub methods: MethodsConfig,
    pub path: String,
    /// `Controller@action`
    pub controller: String,
}

/// Either a list of methods or a single one, `"ANY"` standing for every method.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MethodsConfig {
    One(String),
    Many(Vec<String>),
}

impl MethodsConfig {
    /// # Errors
    /// Returns [`RouteError::InvalidMethod`] for a name that is not an HTTP method.
    pub fn resolve(&self) -> Result<Vec<Method>, RouteError> {
        match self {
            MethodsConfig::One(method) => parse_methods(method),
            MethodsConfig::Many(methods) => {
                let mut resolved = Vec::new();
                for method in methods {
                    for method in parse_methods(method)? {
                        if !resolved.contains(&method) {
                            resolved.push(method);
                        }
                    }
                }
                Ok(resolved)
            }
        }
    }
}

fn parse_methods(method: &str) -> Result<Vec<Method>, RouteError> {
    let method = method.trim();
    if method.eq_ignore_ascii_case("any") {
        return Ok(ALL_METHODS.to_vec());
    }
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map(|method| vec![method])
        .map_err(|_invalid| RouteError::InvalidMethod(method.to_string()))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RedirectConfig {
    pub path: String,
    pub location: String,
    #[serde(default = "default_redirect_code")]
    pub code: u16,
}

fn default_redirect_code() -> u16 {
    302
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GroupConfig {
    pub prefix: String,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
    #[serde(default)]
    pub redirects: Vec<RedirectConfig>,
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

impl GroupConfig {
    fn route_count(&self) -> usize {
        self.routes.len() + self.redirects.len() + self.groups.iter().map(GroupConfig::route_count).sum::<usize>()
    }
}
