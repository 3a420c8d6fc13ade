// SPDX-License-Identifier: Apache-2.0

//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use copilot_core::{
    ActionsFile, CopilotError, CopilotResult, MetadataStore, RecordHandle, Relationship,
    SchemaDirectory, SchemaField, SchemaService, TableRecord, TableRef,
};

const ACTIONS_KEY: &str = "actions.yaml";

/// Table records keyed by combined key; a bare table name resolves when it
/// is unique.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<BTreeMap<String, TableRecord>>,
    actions: Mutex<Option<ActionsFile>>,
    pub table_writes: AtomicUsize,
    pub action_writes: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: TableRecord) {
        self.tables.lock().insert(record.key(), record);
    }

    pub fn set_actions(&self, actions: ActionsFile) {
        *self.actions.lock() = Some(actions);
    }

    pub fn table(&self, key: &str) -> TableRecord {
        self.tables.lock()[key].clone()
    }

    pub fn actions(&self) -> Option<ActionsFile> {
        self.actions.lock().clone()
    }

    pub fn table_writes(&self) -> usize {
        self.table_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataStore for InMemoryStore {
    async fn find_table_file(&self, key: &str) -> CopilotResult<Option<RecordHandle>> {
        let tables = self.tables.lock();
        if tables.contains_key(key) {
            return Ok(Some(RecordHandle::new(key)));
        }
        let mut by_name = tables.values().filter(|r| r.table.name == key);
        Ok(match (by_name.next(), by_name.next()) {
            (Some(record), None) => Some(RecordHandle::new(record.key())),
            _ => None,
        })
    }

    async fn read_table(&self, handle: &RecordHandle) -> CopilotResult<TableRecord> {
        let key = handle.path().to_string_lossy().into_owned();
        self.tables
            .lock()
            .get(&key)
            .cloned()
            .ok_or_else(|| CopilotError::store_io(key.clone(), "no such record"))
    }

    async fn write_table(&self, handle: &RecordHandle, record: &TableRecord) -> CopilotResult<()> {
        self.table_writes.fetch_add(1, Ordering::SeqCst);
        let key = handle.path().to_string_lossy().into_owned();
        self.tables.lock().insert(key, record.clone());
        Ok(())
    }

    async fn find_action_file(&self) -> CopilotResult<Option<RecordHandle>> {
        Ok(self
            .actions
            .lock()
            .as_ref()
            .map(|_| RecordHandle::new(ACTIONS_KEY)))
    }

    async fn read_actions(&self, _handle: &RecordHandle) -> CopilotResult<ActionsFile> {
        self.actions
            .lock()
            .clone()
            .ok_or_else(|| CopilotError::store_io(ACTIONS_KEY, "no actions file"))
    }

    async fn write_actions(&self, _handle: &RecordHandle, actions: &ActionsFile) -> CopilotResult<()> {
        self.action_writes.fetch_add(1, Ordering::SeqCst);
        *self.actions.lock() = Some(actions.clone());
        Ok(())
    }

    async fn list_tables(&self) -> CopilotResult<Vec<RecordHandle>> {
        Ok(self.tables.lock().keys().map(RecordHandle::new).collect())
    }
}

/// Store whose reads all fail
pub struct FailingStore {
    pub inner: InMemoryStore,
}

#[async_trait]
impl MetadataStore for FailingStore {
    async fn find_table_file(&self, key: &str) -> CopilotResult<Option<RecordHandle>> {
        self.inner.find_table_file(key).await
    }

    async fn read_table(&self, handle: &RecordHandle) -> CopilotResult<TableRecord> {
        Err(CopilotError::store_format(handle.to_string(), "truncated document"))
    }

    async fn write_table(&self, handle: &RecordHandle, record: &TableRecord) -> CopilotResult<()> {
        self.inner.write_table(handle, record).await
    }

    async fn find_action_file(&self) -> CopilotResult<Option<RecordHandle>> {
        self.inner.find_action_file().await
    }

    async fn read_actions(&self, handle: &RecordHandle) -> CopilotResult<ActionsFile> {
        Err(CopilotError::store_format(handle.to_string(), "truncated document"))
    }

    async fn write_actions(&self, handle: &RecordHandle, actions: &ActionsFile) -> CopilotResult<()> {
        self.inner.write_actions(handle, actions).await
    }

    async fn list_tables(&self) -> CopilotResult<Vec<RecordHandle>> {
        self.inner.list_tables().await
    }
}

/// Store that reads through to `inner` and rejects every write
pub struct ReadOnlyStore {
    pub inner: Arc<InMemoryStore>,
}

#[async_trait]
impl MetadataStore for ReadOnlyStore {
    async fn find_table_file(&self, key: &str) -> CopilotResult<Option<RecordHandle>> {
        self.inner.find_table_file(key).await
    }

    async fn read_table(&self, handle: &RecordHandle) -> CopilotResult<TableRecord> {
        self.inner.read_table(handle).await
    }

    async fn write_table(&self, handle: &RecordHandle, _record: &TableRecord) -> CopilotResult<()> {
        Err(CopilotError::store_io(handle.to_string(), "disk full"))
    }

    async fn find_action_file(&self) -> CopilotResult<Option<RecordHandle>> {
        self.inner.find_action_file().await
    }

    async fn read_actions(&self, handle: &RecordHandle) -> CopilotResult<ActionsFile> {
        self.inner.read_actions(handle).await
    }

    async fn write_actions(
        &self,
        handle: &RecordHandle,
        _actions: &ActionsFile,
    ) -> CopilotResult<()> {
        Err(CopilotError::store_io(handle.to_string(), "disk full"))
    }

    async fn list_tables(&self) -> CopilotResult<Vec<RecordHandle>> {
        self.inner.list_tables().await
    }
}

/// Fixed type directory, counting introspection calls
pub struct StaticSchema {
    directory: SchemaDirectory,
    pub calls: AtomicUsize,
}

impl StaticSchema {
    pub fn new(types: &[(&str, &[&str])]) -> Self {
        let types = types
            .iter()
            .map(|(name, fields)| copilot_core::SchemaType {
                name: name.to_string(),
                kind: Some("OBJECT".to_string()),
                fields: Some(
                    fields
                        .iter()
                        .map(|f| SchemaField { name: f.to_string() })
                        .collect(),
                ),
            })
            .collect();
        Self {
            directory: SchemaDirectory { types },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchemaService for StaticSchema {
    async fn introspect(&self) -> CopilotResult<SchemaDirectory> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.directory.clone())
    }
}

pub struct FailingSchema;

#[async_trait]
impl SchemaService for FailingSchema {
    async fn introspect(&self) -> CopilotResult<SchemaDirectory> {
        Err(CopilotError::schema_unavailable("connection refused"))
    }
}

/// Types of the inbound fixture: inbound rows carry both tenant columns,
/// lines only the warehouse, tenants only the company.
pub fn inbound_schema() -> Arc<StaticSchema> {
    Arc::new(StaticSchema::new(&[
        ("inbound_inbound", &["id", "company_id", "warehouse_id"]),
        ("inbound_line", &["id", "qty", "warehouse_id"]),
        ("company_tenant", &["id", "name", "company_id"]),
        ("product_product", &["id", "sku"]),
    ]))
}

/// inbound.inbound
///   tenant  -> company.tenant   (manual)
///   creator -> local column     (unresolvable)
///   lines   -> inbound.line     (remote foreign key)
/// inbound.line
///   product -> product.product  (manual)
///   inbound -> inbound.inbound  (manual, back reference)
pub fn inbound_store() -> Arc<InMemoryStore> {
    let store = InMemoryStore::new();

    let mut inbound = TableRecord::new(TableRef::new("inbound", "inbound"));
    inbound.object_relationships = vec![
        Relationship::manual("tenant", TableRef::new("company", "tenant")),
        serde_yaml::from_str("name: creator\nusing:\n  foreign_key_constraint_on: created_by\n")
            .expect("creator relationship"),
    ];
    inbound.array_relationships = vec![Relationship::foreign_key(
        "lines",
        TableRef::new("inbound", "line"),
        "inbound_id",
    )];
    store.insert(inbound);

    let mut line = TableRecord::new(TableRef::new("inbound", "line"));
    line.object_relationships = vec![
        Relationship::manual("product", TableRef::new("product", "product")),
        Relationship::manual("inbound", TableRef::new("inbound", "inbound")),
    ];
    store.insert(line);

    store.insert(TableRecord::new(TableRef::new("company", "tenant")));
    store.insert(TableRecord::new(TableRef::new("product", "product")));

    Arc::new(store)
}

pub fn write_document(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).expect("write document");
    path
}
