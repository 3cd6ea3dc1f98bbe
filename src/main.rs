use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use taskforge::config::{ConfigBuilder, verbose_from_env};
use taskforge::registry::category_info;
use taskforge::{Command, CommandDiscovery, LoaderConfig, Registry, TracingConfig, builtins};

#[derive(Parser, Debug)]
#[clap(
    name = "taskforge",
    version = env!("CARGO_PKG_VERSION"),
    about = "Run built-in and project-defined build commands"
)]
struct Cli {
    /// Log discovery diagnostics.
    #[clap(short, long)]
    verbose: bool,
    /// List available commands.
    #[clap(short, long)]
    list: bool,
    /// Search commands by name, description or tag.
    #[clap(long, value_name = "QUERY")]
    search: Option<String>,
    /// Project directory.
    #[clap(short = 'd', long = "dir", default_value = ".")]
    dir: PathBuf,
    /// Command to run (`build`, `deploy`, `pipeline:ci`).
    command: Option<String>,
    /// Arguments passed to the command.
    #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = cli.verbose || verbose_from_env();
    init_tracing(verbose);

    match run(cli, verbose).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

fn init_tracing(verbose: bool) {
    let directive = TracingConfig::from_verbose(verbose).filter_directive();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli, verbose: bool) -> taskforge::Result<()> {
    std::env::set_current_dir(&cli.dir)?;
    let project_dir = std::env::current_dir()?;

    let provider = ConfigBuilder::standard(&project_dir).build();
    let config = LoaderConfig::from_provider(&provider).await?;
    let verbose = config.verbose || verbose;
    let config = config.with_verbose(verbose);

    let registry = Arc::new(Registry::new());
    builtins::register_all(&registry);
    let discovery = CommandDiscovery::with_registry(&project_dir, config, Arc::clone(&registry));

    if let Some(query) = &cli.search {
        discover_quietly(&discovery).await;
        search(&registry, query);
        return Ok(());
    }

    let Some(command) = cli.command else {
        return list(&registry, &discovery).await;
    };
    if cli.list {
        return list(&registry, &discovery).await;
    }

    // Built-ins run without compiling anything unless the project has
    // extension sources that may shadow them.
    if has_sources(&discovery, &project_dir)?
        && let Err(e) = discovery.discover().await
    {
        if !registry.contains(&command) {
            return Err(e);
        }
        tracing::warn!(error = %e, "Extension discovery failed, running built-in");
    }
    registry.execute(&command, cli.args).await
}

fn has_sources(discovery: &CommandDiscovery, project_dir: &Path) -> taskforge::Result<bool> {
    Ok(!discovery.loader().resolve_source(project_dir)?.is_none())
}

async fn discover_quietly(discovery: &CommandDiscovery) {
    if let Err(e) = discovery.discover().await {
        tracing::warn!(error = %e, "Extension discovery failed");
    }
}

fn print_command(cmd: &Command) {
    let suffix = if cmd.is_builtin() { "" } else { " (custom)" };
    println!("  {:<20} {}{}", cmd.full_name(), cmd.description, suffix);
}

async fn list(registry: &Registry, discovery: &CommandDiscovery) -> taskforge::Result<()> {
    let custom = match discovery.list_commands().await {
        Ok(_) => discovery.get_commands_for_help().await,
        Err(e) => {
            tracing::warn!(error = %e, "Extension discovery failed");
            Vec::new()
        }
    };

    for (category, commands) in registry.categorized() {
        let builtin: Vec<&Command> = commands.iter().filter(|c| c.is_builtin()).collect();
        if builtin.is_empty() {
            continue;
        }
        println!("{}:", category_info(&category).name);
        for cmd in builtin {
            print_command(cmd);
        }
        println!();
    }

    if !custom.is_empty() {
        println!("{}:", category_info("custom").name);
        for line in custom {
            println!("{}", line);
        }
    }
    Ok(())
}

fn search(registry: &Registry, query: &str) {
    let matches = registry.search(query);
    if matches.is_empty() {
        println!("No commands match '{}'", query);
        return;
    }
    for cmd in &matches {
        print_command(cmd);
    }
}
