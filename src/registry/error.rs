use crate::command::CommandError;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid command: {0}")]
    Invalid(#[from] CommandError),

    #[error("command already registered: {name}")]
    AlreadyRegistered { name: String },

    #[error("alias already registered: {alias} for command {existing}")]
    AliasExists { alias: String, existing: String },

    #[error("{}", unknown_message(name, suggestions))]
    UnknownCommand {
        name: String,
        suggestions: Vec<String>,
    },

    #[error("dependency '{dependency}' failed: {source}")]
    DependencyFailed {
        dependency: String,
        #[source]
        source: Box<crate::Error>,
    },

    #[error("cannot override '{name}': {reason}")]
    OverrideRejected { name: String, reason: String },
}

fn unknown_message(name: &str, suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        format!("unknown command: {}", name)
    } else {
        format!(
            "unknown command '{}'. Did you mean: {}?",
            name,
            suggestions.join(", ")
        )
    }
}
