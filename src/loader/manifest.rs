//! Wire format of the sidecar's `manifest` reply.

use serde::{Deserialize, Serialize};

use super::LoaderError;

pub const MANIFEST_VERSION: u32 = 1;

/// Invocation key of a namespace method: `Type:method`, original case.
pub fn method_symbol(namespace: &str, method: &str) -> String {
    format!("{}:{}", namespace, method)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    /// Zero-argument function.
    Func,
    /// Function taking the remaining arguments.
    Args,
    /// Namespace type whose methods are individual commands.
    Namespace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestMethod {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestCommand {
    /// Invocation key: the function or type identifier.
    pub symbol: String,
    pub kind: CommandKind,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<ManifestMethod>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub commands: Vec<ManifestCommand>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            commands: Vec::new(),
        }
    }
}

impl Manifest {
    pub fn parse(json: &str) -> Result<Self, LoaderError> {
        let manifest: Manifest =
            serde_json::from_str(json.trim()).map_err(|e| LoaderError::Manifest(e.to_string()))?;
        if manifest.version != MANIFEST_VERSION {
            return Err(LoaderError::Manifest(format!(
                "unsupported version {} (expected {})",
                manifest.version, MANIFEST_VERSION
            )));
        }
        Ok(manifest)
    }

    pub fn to_json(&self) -> Result<String, LoaderError> {
        serde_json::to_string(self).map_err(|e| LoaderError::Manifest(e.to_string()))
    }

    pub fn find(&self, symbol: &str) -> Option<&ManifestCommand> {
        self.commands.iter().find(|c| c.symbol == symbol)
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
