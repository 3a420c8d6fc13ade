// SPDX-License-Identifier: Apache-2.0

//! Settings commands. These work on the config file directly, so a broken
//! configuration can still be inspected and repaired.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::observability::Sensitive;

/// Secret is redacted when serialized
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub success: bool,
    pub config: Option<AppConfig>,
    pub error: Option<String>,
}

/// Fields to overwrite; `None` keeps the stored value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    pub secret: Option<String>,
    pub graphql_uri: Option<String>,
    pub hasura_source: Option<PathBuf>,
    #[serde(rename = "coreUISource")]
    pub core_ui_source: Option<PathBuf>,
}

pub async fn show_config(path: &Path) -> Result<ConfigResponse, String> {
    match AppConfig::from_path(path) {
        Ok(Some(config)) => Ok(ConfigResponse {
            success: true,
            config: Some(config),
            error: None,
        }),
        Ok(None) => Ok(ConfigResponse {
            success: false,
            config: None,
            error: Some(format!("No configuration at {}", path.display())),
        }),
        Err(e) => Ok(ConfigResponse {
            success: false,
            config: None,
            error: Some(e.to_string()),
        }),
    }
}

pub async fn update_config(path: &Path, update: ConfigUpdate) -> Result<ConfigResponse, String> {
    let result = AppConfig::from_path(path).and_then(|existing| {
        let mut config = existing.unwrap_or_default();
        if let Some(secret) = update.secret {
            config.secret = Sensitive::new(secret);
        }
        if let Some(graphql_uri) = update.graphql_uri {
            config.graphql_uri = graphql_uri;
        }
        if let Some(hasura_source) = update.hasura_source {
            config.hasura_source = hasura_source;
        }
        if let Some(core_ui_source) = update.core_ui_source {
            config.core_ui_source = core_ui_source;
        }
        config.store_to(path)?;
        Ok(config)
    });

    match result {
        Ok(config) => Ok(ConfigResponse {
            success: true,
            config: Some(config),
            error: None,
        }),
        Err(e) => Ok(ConfigResponse {
            success: false,
            config: None,
            error: Some(e.to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_merges_into_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("permission-copilot.json");

        let first = ConfigUpdate {
            secret: Some("hasura-admin".to_string()),
            graphql_uri: Some("http://localhost:8080/v1/graphql".to_string()),
            ..Default::default()
        };
        assert!(update_config(&path, first).await.unwrap().success);

        let second = ConfigUpdate {
            hasura_source: Some(PathBuf::from("/src/hasura")),
            ..Default::default()
        };
        let response = update_config(&path, second).await.unwrap();
        let config = response.config.unwrap();
        assert_eq!(config.secret.expose(), "hasura-admin");
        assert_eq!(config.graphql_uri, "http://localhost:8080/v1/graphql");
        assert_eq!(config.hasura_source, PathBuf::from("/src/hasura"));

        let shown = show_config(&path).await.unwrap();
        let json = serde_json::to_string(&shown).unwrap();
        assert!(!json.contains("hasura-admin"));
    }

    #[tokio::test]
    async fn test_show_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let response = show_config(&dir.path().join("missing.json")).await.unwrap();
        assert!(!response.success);
        assert!(response.error.is_some());
    }
}
