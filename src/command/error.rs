#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("command must have either a name or a namespace and method")]
    MissingName,

    #[error("namespace command needs both parts (namespace: '{namespace}', method: '{method}')")]
    IncompleteNamespace { namespace: String, method: String },

    #[error("command '{name}' sets both a flat name and a namespace/method ('{namespace}:{method}')")]
    AmbiguousName {
        name: String,
        namespace: String,
        method: String,
    },

    #[error("command has no executable function: {name}")]
    NoCallable { name: String },
}
