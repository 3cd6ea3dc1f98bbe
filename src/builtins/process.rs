//! External tool invocation for built-in commands.

use std::process::Stdio;

use tokio::process::Command;

/// Run `program` with `args` in the current directory, inheriting stdio.
pub async fn run_tool(program: &str, args: Vec<String>) -> crate::Result<()> {
    let shown = std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");
    tracing::debug!(command = %shown, "Running tool");

    let status = Command::new(program)
        .args(&args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .status()
        .await
        .map_err(|e| crate::Error::Command(format!("failed to run {}: {}", program, e)))?;

    if status.success() {
        Ok(())
    } else {
        Err(crate::Error::ExitStatus {
            command: shown,
            code: status.code(),
        })
    }
}
