//! Controllers and the registry that resolves them by name.
//!
//! Controllers are registered explicitly with a factory and the set of actions they expose. The
//! registry answers "does this controller/action exist" for the convention resolver and creates a
//! fresh controller instance for every invocation.

use crate::error::{BoxError, ControllerError};
use crate::responder::Outcome;
use crate::PathParams;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// The namespace controller names are qualified with when no other is configured.
pub const DEFAULT_NAMESPACE: &str = "app::controller";

/// A controller exposing named actions.
#[async_trait]
pub trait Controller: Send + Sync {
    /// Runs `action`. Only actions registered with the controller are ever passed in.
    async fn call(&self, action: &str, params: PathParams) -> Result<Outcome, BoxError>;
}

/// Answers whether a controller or one of its actions exists.
#[cfg_attr(test, mockall::automock)]
pub trait ControllerLookup: Send + Sync {
    fn has_controller(&self, name: &str) -> bool;

    fn has_action(&self, controller: &str, action: &str) -> bool;
}

type ControllerFactory = Box<dyn Fn() -> Box<dyn Controller> + Send + Sync>;

struct Registered {
    factory: ControllerFactory,
    actions: HashSet<String>,
}

/// Maps fully qualified controller names to factories and exposed actions.
pub struct ControllerRegistry {
    namespace: String,
    controllers: HashMap<String, Registered>,
}

impl ControllerRegistry {
    /// Creates an empty registry using [`DEFAULT_NAMESPACE`].
    pub fn new() -> Self {
        Self::with_namespace(DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), controllers: HashMap::new() }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Registers a controller under `name`, which is qualified with the namespace unless it
    /// already is. Registering the same name again replaces the previous controller.
    pub fn register<C, F>(&mut self, name: &str, actions: &[&str], factory: F) -> &mut Self
    where
        C: Controller + 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        let factory: ControllerFactory = Box::new(move || Box::new(factory()));
        let actions = actions.iter().map(ToString::to_string).collect();
        self.controllers.insert(self.qualify(name), Registered { factory, actions });
        self
    }

    /// Qualified names of all registered controllers, sorted.
    pub fn controller_names(&self) -> Vec<&str> {
        let mut names = self.controllers.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    fn qualify(&self, name: &str) -> String {
        match name.strip_prefix(self.namespace.as_str()) {
            Some(rest) if rest.starts_with("::") => name.to_string(),
            _ => format!("{}::{}", self.namespace, name),
        }
    }

    fn find(&self, name: &str) -> Option<&Registered> {
        self.controllers.get(&self.qualify(name))
    }

    /// Instantiates the controller and runs `action`.
    ///
    /// # Errors
    /// Returns a [`ControllerError`] if the controller or action is not registered, otherwise
    /// whatever the action returned.
    pub async fn invoke(&self, controller: &str, action: &str, params: PathParams) -> Result<Outcome, BoxError> {
        let registered = self.find(controller).ok_or_else(|| ControllerError::UnknownController(controller.to_string()))?;
        if !registered.actions.contains(action) {
            return Err(ControllerError::UnknownAction { controller: controller.to_string(), action: action.to_string() }
                .into());
        }

        let instance = (registered.factory)();
        instance.call(action, params).await
    }
}

impl Default for ControllerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerLookup for ControllerRegistry {
    fn has_controller(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    fn has_action(&self, controller: &str, action: &str) -> bool {
        self.find(controller).is_some_and(|registered| registered.actions.contains(action))
    }
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerRegistry")
            .field("namespace", &self.namespace)
            .field("controllers", &self.controller_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{Controller, ControllerLookup, ControllerRegistry};
    use crate::error::{BoxError, ControllerError};
    use crate::responder::Outcome;
    use crate::PathParams;
    use async_trait::async_trait;
    use serde_json::json;

    struct Test;

    #[async_trait]
    impl Controller for Test {
        async fn call(&self, action: &str, _params: PathParams) -> Result<Outcome, BoxError> {
            Ok(Outcome::Data(json!({ "action": action })))
        }
    }

    fn registry() -> ControllerRegistry {
        let mut registry = ControllerRegistry::new();
        registry.register("Test", &["index", "show"], || Test);
        registry
    }

    #[test]
    fn test_lookup_qualifies_names() {
        let registry = registry();
        assert!(registry.has_controller("Test"));
        assert!(registry.has_controller("app::controller::Test"));
        assert!(!registry.has_controller("app::controllerTest"));
        assert!(!registry.has_controller("Missing"));

        assert!(registry.has_action("Test", "show"));
        assert!(!registry.has_action("Test", "destroy"));
        assert!(!registry.has_action("Missing", "index"));
        assert_eq!(registry.controller_names(), vec!["app::controller::Test"]);
    }

    #[tokio::test]
    async fn test_invoke() {
        let registry = registry();
        let outcome = registry.invoke("Test", "show", PathParams::empty()).await.unwrap();
        assert_eq!(outcome, Outcome::Data(json!({ "action": "show" })));
    }

    #[tokio::test]
    async fn test_invoke_unknown() {
        let registry = registry();

        let error = registry.invoke("Missing", "index", PathParams::empty()).await.unwrap_err();
        assert!(matches!(error.downcast_ref::<ControllerError>(), Some(ControllerError::UnknownController(_))));

        let error = registry.invoke("Test", "destroy", PathParams::empty()).await.unwrap_err();
        assert!(matches!(error.downcast_ref::<ControllerError>(), Some(ControllerError::UnknownAction { .. })));
    }
}
