// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::Value;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use copilot_core::{
    ActionsFile, CopilotError, CopilotResult, MetadataStore, RecordHandle, TableRecord,
};

use crate::discovery::discover_files;

const ACTIONS_FILE: &str = "actions.yaml";
const TABLES_FILE: &str = "tables.yaml";

/// Hasura metadata directory, one YAML document per tracked table.
///
/// Files are discovered once, on first lookup. A table is found by file
/// name (`schema_table.yaml`), then by its configured `custom_name`, then by
/// its bare table name when that name is unique across schemas.
pub struct YamlMetadataStore {
    root: PathBuf,
    index: OnceCell<MetadataIndex>,
}

#[derive(Default)]
struct MetadataIndex {
    /// Table records keyed by file stem
    tables: HashMap<String, PathBuf>,
    /// `custom_name` and unique bare table names
    aliases: HashMap<String, PathBuf>,
    actions: Option<PathBuf>,
    /// Table record paths in discovery order
    ordered: Vec<PathBuf>,
}

impl YamlMetadataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index: OnceCell::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn index(&self) -> CopilotResult<&MetadataIndex> {
        self.index.get_or_try_init(|| self.build_index()).await
    }

    async fn build_index(&self) -> CopilotResult<MetadataIndex> {
        let files = discover_files(&self.root)
            .await
            .map_err(|e| {
                CopilotError::store_io(self.root.display().to_string(), e.to_string())
            })?;

        let mut index = MetadataIndex::default();
        let mut custom_names: HashMap<String, PathBuf> = HashMap::new();
        let mut bare_names: HashMap<String, Vec<PathBuf>> = HashMap::new();

        for path in files {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if file_name == ACTIONS_FILE {
                index.actions.get_or_insert(path);
                continue;
            }
            if file_name == TABLES_FILE || !is_yaml(&path) {
                continue;
            }

            let head = match table_head(&path).await {
                FileHead::Table(head) => Some(head),
                FileHead::Unusable => None,
                FileHead::Other => continue,
            };
            let stem = file_stem(&path);
            if index.tables.contains_key(&stem) {
                debug!(path = %path.display(), "Shadowed table record ignored");
                continue;
            }

            // Unusable files stay reachable by stem so reading them fails.
            if let Some(head) = head {
                if let Some(custom_name) = head.custom_name {
                    custom_names.entry(custom_name).or_insert_with(|| path.clone());
                }
                bare_names.entry(head.name).or_default().push(path.clone());
            }
            index.tables.insert(stem, path.clone());
            index.ordered.push(path);
        }

        for (name, paths) in bare_names {
            if let [path] = paths.as_slice() {
                index.aliases.insert(name, path.clone());
            }
        }
        // Configured names take precedence over bare names.
        index.aliases.extend(custom_names);

        debug!(
            root = %self.root.display(),
            tables = index.tables.len(),
            actions = index.actions.is_some(),
            "Metadata directory indexed"
        );
        Ok(index)
    }

    async fn read_document<T: DeserializeOwned>(
        &self,
        handle: &RecordHandle,
    ) -> CopilotResult<T> {
        let content = tokio::fs::read_to_string(handle.path())
            .await
            .map_err(|e| CopilotError::store_io(handle.to_string(), e.to_string()))?;
        serde_yaml::from_str(&content)
            .map_err(|e| CopilotError::store_format(handle.to_string(), e.to_string()))
    }

    /// Writes through a sibling temp file so readers never see a partial
    /// document.
    async fn write_document<T: Serialize>(
        &self,
        handle: &RecordHandle,
        value: &T,
    ) -> CopilotResult<()> {
        let content = serde_yaml::to_string(value)
            .map_err(|e| CopilotError::store_format(handle.to_string(), e.to_string()))?;

        let path = handle.path();
        let mut tmp = path.as_os_str().to_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| CopilotError::store_io(handle.to_string(), e.to_string()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| CopilotError::store_io(handle.to_string(), e.to_string()))
    }
}

#[async_trait]
impl MetadataStore for YamlMetadataStore {
    async fn find_table_file(&self, key: &str) -> CopilotResult<Option<RecordHandle>> {
        let index = self.index().await?;
        let key = key
            .strip_suffix(".yaml")
            .or_else(|| key.strip_suffix(".yml"))
            .unwrap_or(key);

        Ok(index
            .tables
            .get(key)
            .or_else(|| index.aliases.get(key))
            .map(RecordHandle::new))
    }

    async fn read_table(&self, handle: &RecordHandle) -> CopilotResult<TableRecord> {
        self.read_document(handle).await
    }

    async fn write_table(
        &self,
        handle: &RecordHandle,
        record: &TableRecord,
    ) -> CopilotResult<()> {
        self.write_document(handle, record).await
    }

    async fn find_action_file(&self) -> CopilotResult<Option<RecordHandle>> {
        Ok(self.index().await?.actions.as_ref().map(RecordHandle::new))
    }

    async fn read_actions(&self, handle: &RecordHandle) -> CopilotResult<ActionsFile> {
        self.read_document(handle).await
    }

    async fn write_actions(
        &self,
        handle: &RecordHandle,
        actions: &ActionsFile,
    ) -> CopilotResult<()> {
        self.write_document(handle, actions).await
    }

    async fn list_tables(&self) -> CopilotResult<Vec<RecordHandle>> {
        Ok(self
            .index()
            .await?
            .ordered
            .iter()
            .map(RecordHandle::new)
            .collect())
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    )
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

struct TableHead {
    name: String,
    custom_name: Option<String>,
}

enum FileHead {
    Table(TableHead),
    /// Parses but is not a table record
    Other,
    /// Unreadable, or not valid YAML
    Unusable,
}

/// Identifies table records without committing to their full shape.
async fn table_head(path: &Path) -> FileHead {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unreadable metadata file");
            return FileHead::Unusable;
        }
    };
    let value: Value = match serde_yaml::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Malformed metadata file");
            return FileHead::Unusable;
        }
    };
    let Some(table) = value.get("table") else {
        return FileHead::Other;
    };
    let name = match table {
        Value::String(name) => Some(name.clone()),
        other => other.get("name").and_then(Value::as_str).map(str::to_string),
    };
    let Some(name) = name else {
        return FileHead::Unusable;
    };
    let custom_name = value
        .get("configuration")
        .and_then(|c| c.get("custom_name"))
        .and_then(Value::as_str)
        .map(str::to_string);

    FileHead::Table(TableHead { name, custom_name })
}
