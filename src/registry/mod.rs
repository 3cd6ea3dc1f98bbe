//! Thread-safe command catalog.
//!
//! The registry is an explicit context object: construct one at the process
//! entry point and share it (`Arc<Registry>`) with the dispatcher and the
//! discovery façade. All mutations happen inside one write critical section,
//! so readers never observe a partially inserted command and a rejected
//! registration leaves the catalog untouched.

mod category;
mod error;

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

pub use category::{CategoryInfo, DEFAULT_CATEGORY_ORDER, UNCATEGORIZED, category_info};
pub use error::RegistryError;

use crate::command::Command;
use crate::common::SourceType;

const MAX_SUGGESTIONS: usize = 5;

#[derive(Default)]
struct State {
    commands: HashMap<String, Command>,
    /// Full names in registration order.
    order: Vec<String>,
    /// Lower-cased alias → full name.
    aliases: HashMap<String, String>,
    /// Category → full names in registration order.
    categories: HashMap<String, Vec<String>>,
    category_info: HashMap<String, CategoryInfo>,
    /// Built-ins replaced through the override path, keyed by full name.
    shadowed: HashMap<String, Command>,
    registered: bool,
}

impl State {
    fn resolve(&self, name: &str) -> Option<&Command> {
        let key = name.to_lowercase();
        self.commands.get(&key).or_else(|| {
            self.aliases
                .get(&key)
                .and_then(|full| self.commands.get(full))
        })
    }

    /// Aliases of `cmd` normalized for indexing: lower-cased, deduplicated,
    /// and without the command's own full name.
    fn alias_keys(cmd: &Command, full_name: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        cmd.aliases
            .iter()
            .map(|a| a.to_lowercase())
            .filter(|a| !a.is_empty() && a != full_name && seen.insert(a.clone()))
            .collect()
    }

    /// Collision check for a new entry. `replacing` names an entry whose
    /// own aliases are about to be released.
    fn check_aliases(
        &self,
        full_name: &str,
        aliases: &[String],
        replacing: Option<&str>,
    ) -> Result<(), RegistryError> {
        if let Some(existing) = self.aliases.get(full_name)
            && Some(existing.as_str()) != replacing
        {
            return Err(RegistryError::AlreadyRegistered {
                name: full_name.to_string(),
            });
        }
        for alias in aliases {
            if let Some(existing) = self.aliases.get(alias)
                && Some(existing.as_str()) != replacing
            {
                return Err(RegistryError::AliasExists {
                    alias: alias.clone(),
                    existing: existing.clone(),
                });
            }
            if self.commands.contains_key(alias) && Some(alias.as_str()) != replacing {
                return Err(RegistryError::AliasExists {
                    alias: alias.clone(),
                    existing: alias.clone(),
                });
            }
        }
        Ok(())
    }

    fn index(&mut self, full_name: &str, aliases: Vec<String>, cmd: &Command) {
        for alias in aliases {
            self.aliases.insert(alias, full_name.to_string());
        }
        if !cmd.category.is_empty() {
            self.categories
                .entry(cmd.category.clone())
                .or_default()
                .push(full_name.to_string());
            self.category_info
                .entry(cmd.category.clone())
                .or_insert_with(|| category_info(&cmd.category));
        }
    }

    fn unindex(&mut self, full_name: &str) {
        self.aliases.retain(|_, target| target != full_name);
        self.categories.retain(|_, names| {
            names.retain(|n| n != full_name);
            !names.is_empty()
        });
        let live: HashSet<&String> = self.categories.keys().collect();
        self.category_info.retain(|k, _| live.contains(k));
    }

    fn ordered(&self) -> impl Iterator<Item = &Command> {
        self.order.iter().filter_map(|name| self.commands.get(name))
    }

    fn namespaces(&self) -> Vec<String> {
        let mut namespaces: Vec<String> = self
            .commands
            .values()
            .filter(|c| !c.namespace.is_empty())
            .map(|c| c.namespace.to_lowercase())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        namespaces.sort();
        namespaces
    }

    fn category_order(&self) -> Vec<String> {
        let mut categories: Vec<(u32, String)> = self
            .categories
            .keys()
            .map(|c| {
                let order = self
                    .category_info
                    .get(c)
                    .map(|i| i.order)
                    .unwrap_or(DEFAULT_CATEGORY_ORDER);
                (order, c.clone())
            })
            .collect();
        categories.sort();
        categories.into_iter().map(|(_, c)| c).collect()
    }
}

/// Point-in-time copy of registry statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryMetadata {
    pub total_commands: usize,
    pub namespaces: Vec<String>,
    pub categories: HashMap<String, usize>,
    pub category_info: HashMap<String, CategoryInfo>,
}

#[derive(Default)]
pub struct Registry {
    state: RwLock<State>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether the built-in bulk registration has already run.
    pub fn is_registered(&self) -> bool {
        self.read().registered
    }

    pub fn set_registered(&self, registered: bool) {
        self.write().registered = registered;
    }

    /// Add a command. Fails without side effects when the command is invalid
    /// or its full name or any alias is already taken.
    pub fn register(&self, cmd: Command) -> Result<(), RegistryError> {
        cmd.validate()?;
        let full_name = cmd.full_name();
        let aliases = State::alias_keys(&cmd, &full_name);

        let mut state = self.write();
        if state.commands.contains_key(&full_name) {
            return Err(RegistryError::AlreadyRegistered { name: full_name });
        }
        state.check_aliases(&full_name, &aliases, None)?;

        state.index(&full_name, aliases, &cmd);
        state.order.push(full_name.clone());
        state.commands.insert(full_name, cmd);
        Ok(())
    }

    /// Add a command, panicking on failure. Reserved for built-ins.
    pub fn must_register(&self, cmd: Command) {
        if let Err(e) = self.register(cmd) {
            panic!("failed to register command: {e}");
        }
    }

    /// Let an extension command replace the built-in of the same full name.
    ///
    /// The replacement takes the built-in's position in listings and the
    /// built-in's aliases are released. When no command of that name exists
    /// this is a plain [`register`](Self::register). Replacing anything other
    /// than a built-in with an extension command is rejected.
    pub fn register_override(&self, cmd: Command) -> Result<(), RegistryError> {
        cmd.validate()?;
        let full_name = cmd.full_name();
        let aliases = State::alias_keys(&cmd, &full_name);

        let mut state = self.write();
        let Some(existing) = state.commands.get(&full_name) else {
            drop(state);
            return self.register(cmd);
        };

        if cmd.source != SourceType::Extension {
            return Err(RegistryError::OverrideRejected {
                name: full_name,
                reason: "only extension commands may override".into(),
            });
        }
        if existing.source != SourceType::Builtin {
            return Err(RegistryError::AlreadyRegistered { name: full_name });
        }
        state.check_aliases(&full_name, &aliases, Some(&full_name))?;

        state.unindex(&full_name);
        state.index(&full_name, aliases, &cmd);
        if let Some(builtin) = state.commands.insert(full_name.clone(), cmd) {
            state.shadowed.insert(full_name.clone(), builtin);
        }
        tracing::debug!(command = %full_name, "Extension command replaced built-in");
        Ok(())
    }

    /// Case-insensitive lookup by full name or alias.
    pub fn get(&self, name: &str) -> Option<Command> {
        self.read().resolve(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().resolve(name).is_some()
    }

    /// Visible commands in registration order.
    pub fn list(&self) -> Vec<Command> {
        self.read().ordered().filter(|c| !c.hidden).cloned().collect()
    }

    /// Every command, hidden ones included, in registration order.
    pub fn list_all(&self) -> Vec<Command> {
        self.read().ordered().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().commands.is_empty()
    }

    /// Visible commands of `namespace`, sorted by method.
    pub fn list_by_namespace(&self, namespace: &str) -> Vec<Command> {
        let mut commands: Vec<Command> = self
            .read()
            .ordered()
            .filter(|c| !c.hidden && c.namespace.eq_ignore_ascii_case(namespace))
            .cloned()
            .collect();
        commands.sort_by_key(|c| c.method.to_lowercase());
        commands
    }

    /// Visible commands of `category` in registration order.
    pub fn list_by_category(&self, category: &str) -> Vec<Command> {
        let state = self.read();
        state
            .categories
            .get(category)
            .into_iter()
            .flatten()
            .filter_map(|name| state.commands.get(name))
            .filter(|c| !c.hidden)
            .cloned()
            .collect()
    }

    /// Distinct lower-cased namespaces, sorted.
    pub fn namespaces(&self) -> Vec<String> {
        self.read().namespaces()
    }

    /// Categories in display order (standard order, then name).
    pub fn categories(&self) -> Vec<String> {
        self.read().category_order()
    }

    /// Visible commands grouped by category in display order. Commands
    /// without a category are collected under [`UNCATEGORIZED`] at the end.
    pub fn categorized(&self) -> Vec<(String, Vec<Command>)> {
        let state = self.read();
        let mut groups: Vec<(String, Vec<Command>)> = state
            .category_order()
            .into_iter()
            .map(|category| {
                let commands = state.categories[&category]
                    .iter()
                    .filter_map(|name| state.commands.get(name))
                    .filter(|c| !c.hidden)
                    .cloned()
                    .collect();
                (category, commands)
            })
            .filter(|(_, commands): &(String, Vec<Command>)| !commands.is_empty())
            .collect();

        let other: Vec<Command> = state
            .ordered()
            .filter(|c| !c.hidden && c.category.is_empty())
            .cloned()
            .collect();
        if !other.is_empty() {
            match groups.iter_mut().find(|(name, _)| name == UNCATEGORIZED) {
                Some((_, commands)) => commands.extend(other),
                None => groups.push((UNCATEGORIZED.to_string(), other)),
            }
        }
        groups
    }

    /// Case-insensitive substring search over names (bare and `ns:method`),
    /// descriptions and tags.
    pub fn search(&self, query: &str) -> Vec<Command> {
        let query = query.to_lowercase();
        let matches = |field: &String| field.to_lowercase().contains(&query);
        self.read()
            .ordered()
            .filter(|c| !c.hidden)
            .filter(|c| {
                let full_name = c.full_name();
                [&full_name, &c.name, &c.namespace, &c.method, &c.description, &c.long_description]
                    .into_iter()
                    .chain(&c.tags)
                    .any(&matches)
            })
            .cloned()
            .collect()
    }

    pub fn metadata(&self) -> RegistryMetadata {
        let state = self.read();
        RegistryMetadata {
            total_commands: state.commands.len(),
            namespaces: state.namespaces(),
            categories: state
                .categories
                .iter()
                .map(|(k, v)| (k.clone(), v.len()))
                .collect(),
            category_info: state.category_info.clone(),
        }
    }

    /// Remove every extension command, restoring the built-ins they
    /// replaced. Returns how many commands were removed.
    pub fn remove_extensions(&self) -> usize {
        let mut guard = self.write();
        let state = &mut *guard;
        let names: Vec<String> = state
            .order
            .iter()
            .filter(|name| {
                state
                    .commands
                    .get(*name)
                    .is_some_and(|c| c.source == SourceType::Extension)
            })
            .cloned()
            .collect();

        for name in &names {
            state.unindex(name);
            state.commands.remove(name);
        }
        for name in &names {
            match state.shadowed.remove(name) {
                Some(builtin) => {
                    let aliases: Vec<String> = State::alias_keys(&builtin, name)
                        .into_iter()
                        .filter(|a| !state.aliases.contains_key(a) && !state.commands.contains_key(a))
                        .collect();
                    state.index(name, aliases, &builtin);
                    state.commands.insert(name.clone(), builtin);
                }
                None => state.order.retain(|n| n != name),
            }
        }
        names.len()
    }

    /// Remove every command. The bulk-registration flag is kept.
    pub fn clear(&self) {
        let mut state = self.write();
        let registered = state.registered;
        *state = State {
            registered,
            ..State::default()
        };
    }

    /// Run `name` with `args`, after running its dependencies (without
    /// arguments) in declaration order. Each command runs at most once per
    /// call, so dependency cycles terminate.
    pub async fn execute(&self, name: &str, args: Vec<String>) -> crate::Result<()> {
        let Some(target) = self.get(name) else {
            return Err(self.unknown(name).into());
        };

        let mut plan = Vec::new();
        let mut visited = HashSet::from([target.full_name()]);
        self.plan_dependencies(&target, &mut visited, &mut plan)?;

        for (dependency, cmd) in plan {
            tracing::debug!(command = %target.full_name(), dependency = %dependency, "Running dependency");
            cmd.execute(Vec::new())
                .await
                .map_err(|e| RegistryError::DependencyFailed {
                    dependency,
                    source: Box::new(e),
                })?;
        }
        target.execute(args).await
    }

    fn plan_dependencies(
        &self,
        cmd: &Command,
        visited: &mut HashSet<String>,
        plan: &mut Vec<(String, Command)>,
    ) -> Result<(), RegistryError> {
        for dependency in &cmd.dependencies {
            let Some(dep) = self.get(dependency) else {
                return Err(RegistryError::DependencyFailed {
                    dependency: dependency.clone(),
                    source: Box::new(self.unknown(dependency).into()),
                });
            };
            if !visited.insert(dep.full_name()) {
                continue;
            }
            self.plan_dependencies(&dep, visited, plan)?;
            plan.push((dependency.clone(), dep));
        }
        Ok(())
    }

    fn unknown(&self, name: &str) -> RegistryError {
        let suggestions = self
            .search(name)
            .iter()
            .take(MAX_SUGGESTIONS)
            .map(Command::full_name)
            .collect();
        RegistryError::UnknownCommand {
            name: name.to_string(),
            suggestions,
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("Registry")
            .field("commands", &state.commands.len())
            .field("aliases", &state.aliases.len())
            .field("registered", &state.registered)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn cmd(name: &str) -> Command {
        Command::builder(name)
            .description(format!("{name} command"))
            .with_func(|| async { Ok(()) })
            .must_build()
    }

    fn ns(namespace: &str, method: &str) -> Command {
        Command::namespace_builder(namespace, method)
            .with_func(|| async { Ok(()) })
            .must_build()
    }

    fn snapshot(registry: &Registry) -> (Vec<String>, Vec<(String, String)>) {
        let state = registry.read();
        let mut aliases: Vec<(String, String)> = state
            .aliases
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        aliases.sort();
        (state.order.clone(), aliases)
    }

    #[test]
    fn test_register_and_get() {
        let registry = Registry::new();
        registry.register(ns("Build", "Linux")).unwrap();

        assert!(registry.get("build:linux").is_some());
        assert!(registry.get("BUILD:LINUX").is_some());
        assert!(registry.get("build").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let registry = Registry::new();
        registry.register(cmd("build")).unwrap();

        let err = registry.register(cmd("build")).unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyRegistered { name } if name == "build"));
        assert_eq!(
            registry
                .list()
                .iter()
                .filter(|c| c.full_name() == "build")
                .count(),
            1
        );
    }

    #[test]
    fn test_alias_collision_is_atomic() {
        let registry = Registry::new();
        let first = Command::builder("test")
            .with_alias("t")
            .with_func(|| async { Ok(()) })
            .must_build();
        registry.register(first).unwrap();
        let before = snapshot(&registry);

        let clashing = Command::builder("lint")
            .with_aliases(["l", "check", "T"])
            .with_func(|| async { Ok(()) })
            .must_build();
        let err = registry.register(clashing).unwrap_err();
        assert!(matches!(err, RegistryError::AliasExists { ref alias, .. } if alias == "t"));

        assert_eq!(snapshot(&registry), before);
        assert!(registry.get("l").is_none());
        assert!(registry.get("lint").is_none());
    }

    #[test]
    fn test_alias_may_not_shadow_command() {
        let registry = Registry::new();
        registry.register(cmd("lint")).unwrap();

        let shadow = Command::builder("check")
            .with_alias("lint")
            .with_func(|| async { Ok(()) })
            .must_build();
        assert!(matches!(
            registry.register(shadow),
            Err(RegistryError::AliasExists { .. })
        ));

        let aliased = Command::builder("fmt")
            .with_alias("format")
            .with_func(|| async { Ok(()) })
            .must_build();
        registry.register(aliased).unwrap();
        assert!(matches!(
            registry.register(cmd("format")),
            Err(RegistryError::AlreadyRegistered { .. })
        ));
    }

    #[test]
    fn test_alias_resolves_to_same_command() {
        let registry = Registry::new();
        let command = Command::namespace_builder("deps", "update")
            .with_aliases(["up", "Upgrade"])
            .with_func(|| async { Ok(()) })
            .must_build();
        registry.register(command).unwrap();

        for c in registry.list() {
            for alias in &c.aliases {
                let via_alias = registry.get(alias).unwrap();
                assert_eq!(via_alias.full_name(), c.full_name());
            }
        }
        assert_eq!(registry.get("UPGRADE").unwrap().full_name(), "deps:update");
    }

    #[test]
    fn test_invalid_command_rejected() {
        let registry = Registry::new();
        let invalid = Command {
            name: "nothing".into(),
            ..Default::default()
        };
        assert!(matches!(
            registry.register(invalid),
            Err(RegistryError::Invalid(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    #[should_panic(expected = "failed to register command")]
    fn test_must_register_panics_on_collision() {
        let registry = Registry::new();
        registry.must_register(cmd("build"));
        registry.must_register(cmd("build"));
    }

    #[test]
    fn test_list_order_and_hidden() {
        let registry = Registry::new();
        registry.register(cmd("zeta")).unwrap();
        registry.register(cmd("alpha")).unwrap();
        let hidden = Command::builder("secret")
            .hidden()
            .with_func(|| async { Ok(()) })
            .must_build();
        registry.register(hidden).unwrap();
        registry.register(cmd("mid")).unwrap();

        let names: Vec<String> = registry.list().iter().map(Command::full_name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(registry.list_all().len(), 4);
        assert_eq!(registry.len(), 4);
        assert!(registry.get("secret").is_some());
    }

    #[test]
    fn test_registered_flag() {
        let registry = Registry::new();
        assert!(!registry.is_registered());
        registry.set_registered(true);
        assert!(registry.is_registered());
        registry.register(cmd("a")).unwrap();
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.is_registered());
    }

    #[test]
    fn test_override_builtin() {
        let registry = Registry::new();
        let builtin = Command::builder("deploy")
            .with_alias("ship")
            .category("core")
            .with_func(|| async { Ok(()) })
            .must_build();
        registry.register(cmd("first")).unwrap();
        registry.register(builtin).unwrap();
        registry.register(cmd("last")).unwrap();

        let user = Command::builder("Deploy")
            .description("project deploy")
            .with_source(SourceType::Extension)
            .with_func(|| async { Ok(()) })
            .must_build();
        registry.register_override(user).unwrap();

        let names: Vec<String> = registry.list().iter().map(Command::full_name).collect();
        assert_eq!(names, vec!["first", "deploy", "last"]);
        let deploy = registry.get("deploy").unwrap();
        assert_eq!(deploy.source, SourceType::Extension);
        assert_eq!(deploy.description, "project deploy");
        assert!(registry.get("ship").is_none());
        assert!(registry.categories().is_empty());

        let extra = Command::builder("Extra")
            .with_source(SourceType::Extension)
            .with_func(|| async { Ok(()) })
            .must_build();
        registry.register(extra).unwrap();
        assert_eq!(registry.remove_extensions(), 2);

        let names: Vec<String> = registry.list().iter().map(Command::full_name).collect();
        assert_eq!(names, vec!["first", "deploy", "last"]);
        assert!(registry.get("deploy").unwrap().is_builtin());
        assert_eq!(registry.get("ship").unwrap().full_name(), "deploy");
        assert_eq!(registry.categories(), vec!["core"]);
        assert_eq!(registry.remove_extensions(), 0);
    }

    #[test]
    fn test_override_rules() {
        let registry = Registry::new();
        registry.register(cmd("deploy")).unwrap();

        // built-in replacing built-in
        assert!(matches!(
            registry.register_override(cmd("deploy")),
            Err(RegistryError::OverrideRejected { .. })
        ));

        let ext = |name: &str| {
            Command::builder(name)
                .with_source(SourceType::Extension)
                .with_func(|| async { Ok(()) })
                .must_build()
        };
        registry.register_override(ext("deploy")).unwrap();

        // extension replacing extension
        assert!(matches!(
            registry.register_override(ext("deploy")),
            Err(RegistryError::AlreadyRegistered { .. })
        ));

        // nothing to replace: plain registration
        registry.register_override(ext("fresh")).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_namespaces_and_categories() {
        let registry = Registry::new();
        for (namespace, method, category) in [
            ("test", "unit", "test"),
            ("build", "linux", "build"),
            ("build", "darwin", "build"),
            ("release", "notes", "release"),
        ] {
            let command = Command::namespace_builder(namespace, method)
                .category(category)
                .with_func(|| async { Ok(()) })
                .must_build();
            registry.register(command).unwrap();
        }
        registry.register(cmd("misc")).unwrap();

        assert_eq!(registry.namespaces(), vec!["build", "release", "test"]);
        assert_eq!(registry.categories(), vec!["build", "test", "release"]);

        let methods: Vec<String> = registry
            .list_by_namespace("BUILD")
            .iter()
            .map(|c| c.method.clone())
            .collect();
        assert_eq!(methods, vec!["darwin", "linux"]);

        let build: Vec<String> = registry
            .list_by_category("build")
            .iter()
            .map(Command::full_name)
            .collect();
        assert_eq!(build, vec!["build:linux", "build:darwin"]);

        let groups: Vec<String> = registry
            .categorized()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(groups, vec!["build", "test", "release", UNCATEGORIZED]);

        let metadata = registry.metadata();
        assert_eq!(metadata.total_commands, 5);
        assert_eq!(metadata.categories["build"], 2);
        assert_eq!(metadata.category_info["build"].order, 2);
        assert_eq!(metadata.category_info["release"].order, DEFAULT_CATEGORY_ORDER);
    }

    #[test]
    fn test_search() {
        let registry = Registry::new();
        let tagged = Command::namespace_builder("lint", "fix")
            .description("Apply automatic fixes")
            .with_tag("clippy")
            .with_func(|| async { Ok(()) })
            .must_build();
        registry.register(tagged).unwrap();
        registry.register(cmd("build")).unwrap();

        assert_eq!(registry.search("CLIPPY").len(), 1);
        assert_eq!(registry.search("automatic")[0].full_name(), "lint:fix");
        assert_eq!(registry.search("LINT:F")[0].full_name(), "lint:fix");
        assert!(registry.search("nomatch").is_empty());
    }

    fn recorder(log: &Arc<Mutex<Vec<String>>>, name: &str, deps: &[&str]) -> Command {
        let log = Arc::clone(log);
        let label = name.to_string();
        let mut builder = Command::builder(name).with_args_func(move |args| {
            let log = Arc::clone(&log);
            let entry = if args.is_empty() {
                label.clone()
            } else {
                format!("{}({})", label, args.join(" "))
            };
            async move {
                log.lock().unwrap().push(entry);
                Ok(())
            }
        });
        for dep in deps {
            builder = builder.with_dependency(*dep);
        }
        builder.must_build()
    }

    #[tokio::test]
    async fn test_execute_runs_dependencies_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = Registry::new();
        registry.register(recorder(&log, "fmt", &[])).unwrap();
        registry.register(recorder(&log, "lint", &["fmt"])).unwrap();
        registry
            .register(recorder(&log, "ci", &["lint", "fmt"]))
            .unwrap();

        registry
            .execute("CI", vec!["--fast".into()])
            .await
            .unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["fmt", "lint", "ci(--fast)"]);
    }

    #[tokio::test]
    async fn test_execute_dependency_cycle_terminates() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = Registry::new();
        registry.register(recorder(&log, "a", &["b"])).unwrap();
        registry.register(recorder(&log, "b", &["a"])).unwrap();

        registry.execute("a", vec![]).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_execute_failures() {
        let registry = Registry::new();
        let failing = Command::builder("broken")
            .with_func(|| async { Err(crate::Error::Command("exploded".into())) })
            .must_build();
        registry.register(failing).unwrap();
        let dependent = Command::builder("release")
            .with_dependency("broken")
            .with_func(|| async { Ok(()) })
            .must_build();
        registry.register(dependent).unwrap();

        let err = registry.execute("release", vec![]).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("dependency 'broken' failed"), "{msg}");
        assert!(msg.contains("exploded"), "{msg}");

        let err = registry.execute("brokn", vec![]).await.unwrap_err();
        assert!(err.to_string().contains("unknown command"));
    }

    #[tokio::test]
    async fn test_unknown_command_suggestions() {
        let registry = Registry::new();
        for method in ["a", "b", "c", "d", "e", "f"] {
            registry.register(ns("lint", method)).unwrap();
        }
        let err = registry.execute("lint", vec![]).await.unwrap_err();
        match err {
            crate::Error::Registry(RegistryError::UnknownCommand { suggestions, .. }) => {
                assert_eq!(suggestions.len(), MAX_SUGGESTIONS);
                assert_eq!(suggestions[0], "lint:a");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let registry = Arc::new(Registry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for j in 0..25 {
                        registry.register(cmd(&format!("cmd{i}_{j}"))).unwrap();
                        let listed = registry.list();
                        assert!(listed.iter().all(|c| c.validate().is_ok()));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 200);
    }
}
