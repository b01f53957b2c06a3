//! API credential retrieval.
//!
//! The relay never embeds the ClimaCell key in its configuration file;
//! the config names a source and the key is resolved once at startup.

use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{RelayError, Result};

/// Where the ClimaCell API key comes from.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretSource {
    /// Read the key from an environment variable.
    Env { var: String },
    /// Read the key from a file (e.g. a mounted secret volume).
    File { path: PathBuf },
}

impl Default for SecretSource {
    fn default() -> Self {
        SecretSource::Env {
            var: "CLIMACELL_API_KEY".to_string(),
        }
    }
}

impl SecretSource {
    /// Resolve the secret payload. Surrounding whitespace is trimmed since
    /// mounted secret files and copy-pasted env values often carry a
    /// trailing newline.
    pub fn resolve(&self) -> Result<String> {
        let raw = match self {
            SecretSource::Env { var } => std::env::var(var)
                .map_err(|_| RelayError::Config(format!("secret env var '{var}' is not set")))?,
            SecretSource::File { path } => std::fs::read_to_string(path).map_err(|e| {
                RelayError::Config(format!("failed to read secret file '{}': {e}", path.display()))
            })?,
        };

        let secret = raw.trim().to_string();
        if secret.is_empty() {
            return Err(RelayError::Config("resolved secret is empty".to_string()));
        }
        Ok(secret)
    }
}
