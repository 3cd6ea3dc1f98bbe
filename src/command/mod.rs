//! Command entity - one named operation the CLI can run.
//!
//! A command is addressed either by a flat name (`deploy`) or by a
//! namespace/method pair (`build:linux`). Commands are constructed through
//! [`CommandBuilder`], which enforces the naming and callable invariants.

mod builder;
mod error;

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

pub use builder::CommandBuilder;
pub use error::CommandError;

use crate::common::SourceType;
use crate::common::namespace;

pub type CommandFuture = BoxFuture<'static, crate::Result<()>>;

/// Zero-argument callable.
pub type CommandFn = Arc<dyn Fn() -> CommandFuture + Send + Sync>;

/// Callable receiving the remaining command-line arguments.
pub type ArgsCommandFn = Arc<dyn Fn(Vec<String>) -> CommandFuture + Send + Sync>;

/// An option or environment variable a command understands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOption {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// `bool`, `string`, `int` or `duration`
    #[serde(default)]
    pub value_type: String,
}

impl CommandOption {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            value_type: "string".into(),
            ..Default::default()
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_type(mut self, value_type: impl Into<String>) -> Self {
        self.value_type = value_type.into();
        self
    }
}

#[derive(Clone, Default)]
pub struct Command {
    /// Flat command name (e.g. "deploy"). Empty for namespace commands.
    pub name: String,
    /// Namespace half of a `namespace:method` command.
    pub namespace: String,
    /// Method half of a `namespace:method` command.
    pub method: String,
    pub description: String,
    pub long_description: String,
    pub usage: String,
    pub examples: Vec<String>,
    pub options: Vec<CommandOption>,
    pub see_also: Vec<String>,
    pub tags: Vec<String>,
    pub aliases: Vec<String>,
    pub func: Option<CommandFn>,
    pub func_with_args: Option<ArgsCommandFn>,
    pub hidden: bool,
    /// Replacement hint shown when the command runs.
    pub deprecated: Option<String>,
    /// Commands that must succeed before this one runs.
    pub dependencies: Vec<String>,
    pub category: String,
    pub since: String,
    pub source: SourceType,
}

impl Command {
    /// Start building a flat command.
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder::new(name)
    }

    /// Start building a `namespace:method` command.
    pub fn namespace_builder(
        namespace: impl Into<String>,
        method: impl Into<String>,
    ) -> CommandBuilder {
        CommandBuilder::namespace(namespace, method)
    }

    /// Canonical lookup key: `namespace:method` or `name`, lower-cased.
    pub fn full_name(&self) -> String {
        if !self.namespace.is_empty() && !self.method.is_empty() {
            namespace::namespaced(&self.namespace, &self.method)
        } else {
            self.name.to_lowercase()
        }
    }

    pub fn is_namespaced(&self) -> bool {
        !self.namespace.is_empty() && !self.method.is_empty()
    }

    /// True for the entry point of a namespace (`build:default`).
    pub fn is_namespace_default(&self) -> bool {
        !self.namespace.is_empty()
            && (self.method.is_empty() || self.method.eq_ignore_ascii_case("default"))
    }

    pub fn is_builtin(&self) -> bool {
        self.source.is_builtin()
    }

    pub fn validate(&self) -> Result<(), CommandError> {
        let has_name = !self.name.is_empty();
        let has_namespace = !self.namespace.is_empty();
        let has_method = !self.method.is_empty();

        match (has_name, has_namespace, has_method) {
            (false, false, false) => return Err(CommandError::MissingName),
            (false, true, false) | (false, false, true) => {
                return Err(CommandError::IncompleteNamespace {
                    namespace: self.namespace.clone(),
                    method: self.method.clone(),
                });
            }
            (true, true, _) | (true, _, true) => {
                return Err(CommandError::AmbiguousName {
                    name: self.name.clone(),
                    namespace: self.namespace.clone(),
                    method: self.method.clone(),
                });
            }
            _ => {}
        }

        if self.func.is_none() && self.func_with_args.is_none() {
            return Err(CommandError::NoCallable {
                name: self.full_name(),
            });
        }
        Ok(())
    }

    /// Run the command.
    ///
    /// Arguments go to the argument-taking callable when there is one; a
    /// zero-argument callable is preferred when no arguments were given.
    pub async fn execute(&self, args: Vec<String>) -> crate::Result<()> {
        let full_name = self.full_name();
        if let Some(hint) = &self.deprecated {
            tracing::warn!(command = %full_name, "'{}' is deprecated. {}", full_name, hint);
        }

        let span = crate::observability::command_span(&full_name, self.source);
        let future = match (&self.func, &self.func_with_args, args.is_empty()) {
            (_, Some(with_args), false) => with_args(args),
            (Some(func), _, true) => func(),
            (Some(func), None, false) => {
                tracing::debug!(command = %full_name, "Command takes no arguments; ignoring {:?}", args);
                func()
            }
            (None, Some(with_args), true) => with_args(args),
            (None, None, _) => {
                return Err(CommandError::NoCallable { name: full_name }.into());
            }
        };

        future.instrument(span).await
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("full_name", &self.full_name())
            .field("description", &self.description)
            .field("aliases", &self.aliases)
            .field("category", &self.category)
            .field("source", &self.source)
            .field("hidden", &self.hidden)
            .field("has_func", &self.func.is_some())
            .field("has_func_with_args", &self.func_with_args.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn noop() -> CommandFn {
        Arc::new(|| Box::pin(async { Ok(()) }))
    }

    #[test]
    fn test_full_name_flat() {
        let cmd = Command {
            name: "Deploy".into(),
            ..Default::default()
        };
        assert_eq!(cmd.full_name(), "deploy");
        assert_eq!(cmd.full_name(), cmd.full_name());
    }

    #[test]
    fn test_full_name_namespaced() {
        let cmd = Command {
            namespace: "Build".into(),
            method: "LINUX".into(),
            ..Default::default()
        };
        assert_eq!(cmd.full_name(), "build:linux");
        assert!(cmd.is_namespaced());
    }

    #[test]
    fn test_validate_naming_modes() {
        let neither = Command {
            func: Some(noop()),
            ..Default::default()
        };
        assert_eq!(neither.validate(), Err(CommandError::MissingName));

        let half = Command {
            namespace: "build".into(),
            func: Some(noop()),
            ..Default::default()
        };
        assert!(matches!(
            half.validate(),
            Err(CommandError::IncompleteNamespace { .. })
        ));

        let both = Command {
            name: "deploy".into(),
            namespace: "ship".into(),
            method: "it".into(),
            func: Some(noop()),
            ..Default::default()
        };
        assert!(matches!(
            both.validate(),
            Err(CommandError::AmbiguousName { .. })
        ));

        let name_and_namespace_only = Command {
            name: "deploy".into(),
            namespace: "ship".into(),
            func: Some(noop()),
            ..Default::default()
        };
        assert!(matches!(
            name_and_namespace_only.validate(),
            Err(CommandError::AmbiguousName { .. })
        ));
    }

    #[test]
    fn test_validate_requires_callable() {
        let cmd = Command {
            name: "deploy".into(),
            ..Default::default()
        };
        assert_eq!(
            cmd.validate(),
            Err(CommandError::NoCallable {
                name: "deploy".into()
            })
        );
    }

    #[test]
    fn test_is_namespace_default() {
        let cmd = Command {
            namespace: "build".into(),
            method: "Default".into(),
            ..Default::default()
        };
        assert!(cmd.is_namespace_default());

        let cmd = Command {
            namespace: "build".into(),
            method: "linux".into(),
            ..Default::default()
        };
        assert!(!cmd.is_namespace_default());
    }

    fn recording_command(log: Arc<Mutex<Vec<String>>>, with_func: bool, with_args: bool) -> Command {
        let mut cmd = Command {
            name: "rec".into(),
            ..Default::default()
        };
        if with_func {
            let log = Arc::clone(&log);
            cmd.func = Some(Arc::new(move || {
                log.lock().unwrap().push("func".into());
                Box::pin(async { Ok(()) })
            }));
        }
        if with_args {
            let log = Arc::clone(&log);
            cmd.func_with_args = Some(Arc::new(move |args: Vec<String>| {
                log.lock().unwrap().push(format!("args:{}", args.join(",")));
                Box::pin(async { Ok(()) })
            }));
        }
        cmd
    }

    #[tokio::test]
    async fn test_execute_routing() {
        let log = Arc::new(Mutex::new(Vec::new()));

        let both = recording_command(Arc::clone(&log), true, true);
        both.execute(vec![]).await.unwrap();
        both.execute(vec!["a".into(), "b".into()]).await.unwrap();

        let func_only = recording_command(Arc::clone(&log), true, false);
        func_only.execute(vec!["ignored".into()]).await.unwrap();

        let args_only = recording_command(Arc::clone(&log), false, true);
        args_only.execute(vec![]).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["func", "args:a,b", "func", "args:"]
        );
    }

    #[tokio::test]
    async fn test_execute_without_callable() {
        let cmd = Command {
            name: "empty".into(),
            ..Default::default()
        };
        let err = cmd.execute(vec![]).await.unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
