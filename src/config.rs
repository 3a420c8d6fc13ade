// SPDX-License-Identifier: Apache-2.0

//! Persisted settings
//!
//! One JSON document in the user's config directory holding the Hasura
//! endpoint, its admin secret and the two repository checkouts.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use copilot_core::{CopilotError, CopilotResult};

use crate::observability::Sensitive;

const CONFIG_FILE: &str = "permission-copilot.json";
const GQLS_DIR: &str = "packages/gqls";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Hasura admin secret; serialized redacted
    #[serde(default)]
    pub secret: Sensitive<String>,
    #[serde(default)]
    pub graphql_uri: String,
    /// Hasura project checkout holding `metadata/`
    #[serde(default)]
    pub hasura_source: PathBuf,
    /// Front-end checkout holding `packages/gqls`
    #[serde(default, rename = "coreUISource")]
    pub core_ui_source: PathBuf,
}

/// On-disk form; unlike `AppConfig` it carries the secret in clear.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredConfig<'a> {
    secret: &'a str,
    graphql_uri: &'a str,
    hasura_source: &'a Path,
    #[serde(rename = "coreUISource")]
    core_ui_source: &'a Path,
}

impl AppConfig {
    pub fn default_path() -> CopilotResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_FILE))
            .ok_or_else(|| CopilotError::config("No config directory for this platform"))
    }

    /// Loads the default config file; `None` when it does not exist yet.
    pub fn load() -> CopilotResult<Option<Self>> {
        Self::from_path(&Self::default_path()?)
    }

    pub fn from_path(path: &Path) -> CopilotResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|e| {
            CopilotError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = serde_json::from_str(&content).map_err(|e| {
            CopilotError::config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        Ok(Some(config))
    }

    pub fn store(&self) -> CopilotResult<()> {
        self.store_to(&Self::default_path()?)
    }

    pub fn store_to(&self, path: &Path) -> CopilotResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CopilotError::config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let stored = StoredConfig {
            secret: self.secret.expose(),
            graphql_uri: &self.graphql_uri,
            hasura_source: &self.hasura_source,
            core_ui_source: &self.core_ui_source,
        };
        let content = serde_json::to_string_pretty(&stored)
            .map_err(|e| CopilotError::config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)
            .map_err(|e| CopilotError::config(format!("Failed to write {}: {}", path.display(), e)))
    }

    pub fn validate(&self) -> CopilotResult<()> {
        let url = Url::parse(&self.graphql_uri).map_err(|e| {
            CopilotError::config(format!("Invalid graphqlUri {:?}: {}", self.graphql_uri, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CopilotError::config(format!(
                "graphqlUri must be http(s), got {}",
                url.scheme()
            )));
        }
        if self.hasura_source.as_os_str().is_empty() {
            return Err(CopilotError::config("hasuraSource is not set"));
        }
        Ok(())
    }

    /// Directory scanned for query modules
    pub fn gqls_dir(&self) -> PathBuf {
        self.core_ui_source.join(GQLS_DIR)
    }
}
