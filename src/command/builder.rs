use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;

use super::{Command, CommandError, CommandOption};
use crate::common::SourceType;

/// Fluent constructor for [`Command`].
///
/// ```
/// use taskforge::Command;
///
/// let cmd = Command::builder("deploy")
///     .description("Deploy the application")
///     .with_alias("d")
///     .with_func(|| async { Ok(()) })
///     .build()
///     .unwrap();
/// assert_eq!(cmd.full_name(), "deploy");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandBuilder {
    cmd: Command,
}

impl CommandBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            cmd: Command {
                name: name.into(),
                ..Default::default()
            },
        }
    }

    pub fn namespace(namespace: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            cmd: Command {
                namespace: namespace.into(),
                method: method.into(),
                ..Default::default()
            },
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.cmd.description = description.into();
        self
    }

    pub fn long_description(mut self, text: impl Into<String>) -> Self {
        self.cmd.long_description = text.into();
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.cmd.usage = usage.into();
        self
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.cmd.examples.push(example.into());
        self
    }

    pub fn with_option(mut self, option: CommandOption) -> Self {
        self.cmd.options.push(option);
        self
    }

    pub fn with_see_also(mut self, name: impl Into<String>) -> Self {
        self.cmd.see_also.push(name.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.cmd.tags.push(tag.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.cmd.aliases.push(alias.into());
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cmd.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn with_dependency(mut self, name: impl Into<String>) -> Self {
        self.cmd.dependencies.push(name.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.cmd.category = category.into();
        self
    }

    pub fn since(mut self, version: impl Into<String>) -> Self {
        self.cmd.since = version.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.cmd.hidden = true;
        self
    }

    pub fn deprecated(mut self, hint: impl Into<String>) -> Self {
        self.cmd.deprecated = Some(hint.into());
        self
    }

    pub fn with_source(mut self, source: SourceType) -> Self {
        self.cmd.source = source;
        self
    }

    pub fn with_func<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = crate::Result<()>> + Send + 'static,
    {
        self.cmd.func = Some(Arc::new(move || f().boxed()));
        self
    }

    pub fn with_args_func<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = crate::Result<()>> + Send + 'static,
    {
        self.cmd.func_with_args = Some(Arc::new(move |args| f(args).boxed()));
        self
    }

    pub fn build(self) -> Result<Command, CommandError> {
        self.cmd.validate()?;
        Ok(self.cmd)
    }

    /// Like [`build`](Self::build) but panics on an invalid command.
    ///
    /// Intended for static built-in catalogs where a failure is a programming error.
    pub fn must_build(self) -> Command {
        match self.build() {
            Ok(cmd) => cmd,
            Err(e) => panic!("failed to build command: {e}"),
        }
    }
}
