// SPDX-License-Identifier: Apache-2.0

//! Collaborator traits
//!
//! The walker only talks to documents, metadata and the GraphQL schema
//! through these traits, so the file-backed implementations can be swapped
//! for in-memory ones in tests or for another metadata backend.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::CopilotResult;
use crate::types::{ActionsFile, QueryDocument, SchemaDirectory, TableRecord};

/// Opaque locator of one metadata record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordHandle(PathBuf);

impl RecordHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for RecordHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Turns a source file into a parsed GraphQL document
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Fails with `CopilotError::Load` when the file cannot be read or parsed
    async fn load(&self, path: &Path) -> CopilotResult<QueryDocument>;
}

/// Persisted Hasura metadata, one record per table plus the actions list
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Locates the record whose combined key (`schema_name`) is `key`
    async fn find_table_file(&self, key: &str) -> CopilotResult<Option<RecordHandle>>;

    async fn read_table(&self, handle: &RecordHandle) -> CopilotResult<TableRecord>;

    async fn write_table(&self, handle: &RecordHandle, record: &TableRecord) -> CopilotResult<()>;

    /// Locates `actions.yaml`; `None` when the project declares no actions
    async fn find_action_file(&self) -> CopilotResult<Option<RecordHandle>>;

    async fn read_actions(&self, handle: &RecordHandle) -> CopilotResult<ActionsFile>;

    async fn write_actions(
        &self,
        handle: &RecordHandle,
        actions: &ActionsFile,
    ) -> CopilotResult<()>;

    /// Lists every table record handle, in a stable order
    async fn list_tables(&self) -> CopilotResult<Vec<RecordHandle>>;
}

/// Source of the GraphQL type directory
#[async_trait]
pub trait SchemaService: Send + Sync {
    /// Fails with `CopilotError::SchemaUnavailable` on transport failure
    async fn introspect(&self) -> CopilotResult<SchemaDirectory>;
}
