//! `light`: inspect a route configuration from the command line.
//!
//! ```text
//! light --config light.toml routes
//! light --config light.toml dispatch GET /articles/tech/rust
//! ```
//!
//! Controllers named by the configuration are served by an echo controller that answers with the
//! controller, action and bound parameters, which makes `dispatch` show what a request would reach.

use clap::{Parser, Subcommand};
use http::Method;
use light_web::router::{BoxError, Controller, ControllerRegistry, Outcome, PathParams, RouteTable};
use light_web::{App, LightConfig, async_trait, load_config, logging};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "light")]
#[command(about = "List and dispatch the routes of a light configuration", long_about = None, version)]
struct Cli {
    /// Path to the TOML configuration
    #[arg(short, long, default_value = "light.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List all registered routes
    Routes {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },
    /// Dispatch a request and print the response envelope
    Dispatch {
        /// HTTP method, case insensitive
        method: String,
        /// Request path, query string allowed
        path: String,
    },
}

struct Echo {
    name: String,
}

#[async_trait]
impl Controller for Echo {
    async fn call(&self, action: &str, params: PathParams) -> Result<Outcome, BoxError> {
        Ok(Outcome::Data(json!({ "controller": self.name, "action": action, "params": params })))
    }
}

fn echo_controllers(config: &LightConfig) -> ControllerRegistry {
    let mut actions = BTreeMap::<&str, Vec<&str>>::new();
    for (controller, action) in config.controller_actions() {
        actions.entry(controller).or_default().push(action);
    }

    let mut controllers = ControllerRegistry::with_namespace(config.app.namespace.as_str());
    for (controller, actions) in actions {
        let name = controller.to_string();
        controllers.register(controller, &actions, move || Echo { name: name.clone() });
    }
    controllers
}

fn print_routes(routes: &RouteTable, as_json: bool) -> Result<(), BoxError> {
    let listed = routes.list_routes();
    if as_json {
        println!("{}", serde_json::to_string_pretty(&listed)?);
        return Ok(());
    }

    let width = listed.iter().map(|route| route.path().len()).max().unwrap_or(0);
    for route in &listed {
        for handler in route.handlers() {
            println!("{:<8} {:<width$} {}", handler.method().as_str(), route.path(), handler.handler());
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<ExitCode, BoxError> {
    let config = load_config(&cli.config)?;
    logging::init(&config.log)?;

    let app = App::from_config(&config, echo_controllers(&config))?;
    info!(routes = app.routes().len(), "routes registered");

    match cli.command {
        Commands::Routes { json } => print_routes(app.routes(), json)?,
        Commands::Dispatch { method, path } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
            let envelope = app.dispatch(&method, &path).await;
            println!("{}", envelope.code());
            println!("{}", envelope.to_json_pretty()?);
            if envelope.code().is_server_error() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(cause = %e, "light failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
