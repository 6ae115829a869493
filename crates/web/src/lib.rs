//! The light application layer.
//!
//! [`App`] ties a [`light_router::RouteTable`] to a [`light_router::ControllerRegistry`]: it
//! dispatches a method and path, falls back to convention routing, and wraps whatever happened in
//! an [`Envelope`]. [`App::handle`] adapts that to `http::Request` / `http::Response`.

mod app;

pub mod config;
pub mod envelope;
pub mod logging;

pub use app::{App, AppBuilder};
pub use config::{ConfigError, LightConfig, load_config};
pub use envelope::{Envelope, EnvelopeStatus};

pub use async_trait::async_trait;
pub use light_router as router;
