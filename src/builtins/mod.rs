//! Built-in command catalog.
//!
//! Thin wrappers around `cargo` and `git`, registered once per registry
//! through the same builder and registry API extension commands use.

mod process;

use std::path::{Path, PathBuf};

pub use process::run_tool;

use crate::command::{Command, CommandOption};
use crate::registry::Registry;

/// One external-tool wrapper.
struct ToolSpec {
    namespace: &'static str,
    /// Empty for a flat command.
    method: &'static str,
    description: &'static str,
    category: &'static str,
    program: &'static str,
    args: &'static [&'static str],
    /// Whether user arguments are appended to `args`.
    passthrough: bool,
    aliases: &'static [&'static str],
}

const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        namespace: "build",
        method: "",
        description: "Build the project",
        category: "build",
        program: "cargo",
        args: &["build"],
        passthrough: true,
        aliases: &["b"],
    },
    ToolSpec {
        namespace: "build",
        method: "release",
        description: "Build with optimizations",
        category: "build",
        program: "cargo",
        args: &["build", "--release"],
        passthrough: true,
        aliases: &[],
    },
    ToolSpec {
        namespace: "test",
        method: "",
        description: "Run all tests",
        category: "test",
        program: "cargo",
        args: &["test"],
        passthrough: true,
        aliases: &["t"],
    },
    ToolSpec {
        namespace: "test",
        method: "unit",
        description: "Run library unit tests",
        category: "test",
        program: "cargo",
        args: &["test", "--lib"],
        passthrough: true,
        aliases: &[],
    },
    ToolSpec {
        namespace: "test",
        method: "doc",
        description: "Run documentation tests",
        category: "test",
        program: "cargo",
        args: &["test", "--doc"],
        passthrough: false,
        aliases: &[],
    },
    ToolSpec {
        namespace: "lint",
        method: "",
        description: "Run clippy with warnings denied",
        category: "quality",
        program: "cargo",
        args: &["clippy", "--all-targets", "--", "-D", "warnings"],
        passthrough: false,
        aliases: &["l"],
    },
    ToolSpec {
        namespace: "lint",
        method: "fix",
        description: "Apply clippy suggestions",
        category: "quality",
        program: "cargo",
        args: &["clippy", "--fix", "--allow-dirty", "--allow-staged"],
        passthrough: false,
        aliases: &[],
    },
    ToolSpec {
        namespace: "format",
        method: "",
        description: "Format all sources",
        category: "quality",
        program: "cargo",
        args: &["fmt", "--all"],
        passthrough: false,
        aliases: &["fmt"],
    },
    ToolSpec {
        namespace: "format",
        method: "check",
        description: "Check formatting without writing",
        category: "quality",
        program: "cargo",
        args: &["fmt", "--all", "--", "--check"],
        passthrough: false,
        aliases: &[],
    },
    ToolSpec {
        namespace: "deps",
        method: "update",
        description: "Update dependencies in Cargo.lock",
        category: "deps",
        program: "cargo",
        args: &["update"],
        passthrough: true,
        aliases: &[],
    },
    ToolSpec {
        namespace: "deps",
        method: "tree",
        description: "Show the dependency tree",
        category: "deps",
        program: "cargo",
        args: &["tree"],
        passthrough: true,
        aliases: &[],
    },
    ToolSpec {
        namespace: "docs",
        method: "",
        description: "Build API documentation",
        category: "docs",
        program: "cargo",
        args: &["doc", "--no-deps"],
        passthrough: true,
        aliases: &[],
    },
    ToolSpec {
        namespace: "docs",
        method: "open",
        description: "Build API documentation and open it",
        category: "docs",
        program: "cargo",
        args: &["doc", "--no-deps", "--open"],
        passthrough: false,
        aliases: &[],
    },
    ToolSpec {
        namespace: "bench",
        method: "",
        description: "Run benchmarks",
        category: "test",
        program: "cargo",
        args: &["bench"],
        passthrough: true,
        aliases: &[],
    },
    ToolSpec {
        namespace: "git",
        method: "status",
        description: "Show working tree status",
        category: "git",
        program: "git",
        args: &["status", "--short", "--branch"],
        passthrough: false,
        aliases: &[],
    },
    ToolSpec {
        namespace: "git",
        method: "tag",
        description: "Create a tag",
        category: "git",
        program: "git",
        args: &["tag"],
        passthrough: true,
        aliases: &[],
    },
    ToolSpec {
        namespace: "install",
        method: "",
        description: "Install the project's binaries",
        category: "core",
        program: "cargo",
        args: &["install", "--path", "."],
        passthrough: true,
        aliases: &[],
    },
];

const TASKFILE_TEMPLATE: &str = r#"//! Project commands. Every `pub fn` here is runnable as `taskforge <name>`.

/// Print a greeting
pub fn hello() {
    println!("Hello from taskfile.rs");
}

/// Release checklist steps
pub struct Release;

impl Release {
    /// Print the release checklist
    pub fn notes(&self) -> Result<(), String> {
        println!("1. bump the version\n2. tag\n3. publish");
        Ok(())
    }
}
"#;

fn tool_command(spec: &'static ToolSpec) -> Command {
    let builder = if spec.method.is_empty() {
        Command::builder(spec.namespace)
    } else {
        Command::namespace_builder(spec.namespace, spec.method)
    };
    let fixed: Vec<String> = spec.args.iter().map(|a| a.to_string()).collect();
    let usage = if spec.passthrough {
        format!("{} {} [args...]", spec.program, spec.args.join(" "))
    } else {
        format!("{} {}", spec.program, spec.args.join(" "))
    };
    let builder = builder
        .description(spec.description)
        .usage(usage)
        .category(spec.category)
        .with_aliases(spec.aliases.iter().copied())
        .with_tag(spec.program)
        .since("0.1.0");

    let builder = if spec.passthrough {
        builder.with_args_func(move |args| {
            let mut all = fixed.clone();
            all.extend(args);
            run_tool(spec.program, all)
        })
    } else {
        builder.with_func(move || run_tool(spec.program, fixed.clone()))
    };
    builder.must_build()
}

fn version_command() -> Command {
    Command::builder("version")
        .description("Show the taskforge version")
        .category("version")
        .with_alias("v")
        .since("0.1.0")
        .with_func(|| async {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
            Ok(())
        })
        .must_build()
}

/// Write a starter `taskfile.rs` into `dir` unless extension sources exist.
pub async fn init_taskfile(dir: &Path) -> crate::Result<PathBuf> {
    let config = crate::config::LoaderConfig::default();
    let target = dir.join(&config.root_file);
    if dir.join(&config.extensions_dir).is_dir() || tokio::fs::try_exists(&target).await? {
        return Err(crate::Error::Command(format!(
            "extension sources already exist in {}",
            dir.display()
        )));
    }
    tokio::fs::write(&target, TASKFILE_TEMPLATE).await?;
    tracing::info!(path = %target.display(), "Created taskfile");
    Ok(target)
}

fn init_command() -> Command {
    Command::builder("init")
        .description("Create a starter taskfile.rs")
        .usage("init [dir]")
        .with_example("taskforge init")
        .with_option(CommandOption::new("dir", "Target directory").with_default("."))
        .category("init")
        .since("0.1.0")
        .with_args_func(|args: Vec<String>| async move {
            let dir = PathBuf::from(args.first().map(String::as_str).unwrap_or("."));
            let path = init_taskfile(&dir).await?;
            println!("Created {}", path.display());
            Ok::<(), crate::Error>(())
        })
        .must_build()
}

/// Every built-in command, in listing order.
pub fn catalog() -> Vec<Command> {
    let mut commands: Vec<Command> = TOOLS.iter().map(tool_command).collect();
    commands.push(version_command());
    commands.push(init_command());
    commands
}

/// Register the catalog unless this registry already has it. Returns how
/// many commands were added.
pub fn register_all(registry: &Registry) -> usize {
    if registry.is_registered() {
        tracing::trace!("Built-in commands already registered");
        return 0;
    }
    let commands = catalog();
    let count = commands.len();
    for cmd in commands {
        registry.must_register(cmd);
    }
    registry.set_registered(true);
    tracing::debug!(count, "Registered built-in commands");
    count
}
