// SPDX-License-Identifier: Apache-2.0

//! Permission propagation walk
//!
//! Starting at the root of a query's relation tree, every reachable table
//! gets the role's select permission. Children are followed through the
//! relationships declared on the parent's metadata record; names that are
//! not tables are tried as actions.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use futures::future::{try_join_all, BoxFuture, FutureExt};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use copilot_core::{
    merge_action_permission, merge_permission, resolve_relation_target, CopilotResult,
    DocumentLoader, MetadataStore, RecordHandle, RelationNode, SchemaService, TableDef,
};
use copilot_graphql::{extract_with, FragmentPolicy};

use super::context::ContextResolver;

/// Knobs for one walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    /// Grant each table and action at most once per walk. When off, a table
    /// reachable through two paths is rewritten and reported twice.
    pub dedupe_tables: bool,
    pub fragment_policy: FragmentPolicy,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            dedupe_tables: true,
            fragment_policy: FragmentPolicy::LastWins,
        }
    }
}

/// Drives permission propagation over the metadata store
pub struct Walker {
    loader: Arc<dyn DocumentLoader>,
    store: Arc<dyn MetadataStore>,
    schema: Arc<dyn SchemaService>,
    options: WalkOptions,
}

impl Walker {
    pub fn new(
        loader: Arc<dyn DocumentLoader>,
        store: Arc<dyn MetadataStore>,
        schema: Arc<dyn SchemaService>,
        options: WalkOptions,
    ) -> Self {
        Self {
            loader,
            store,
            schema,
            options,
        }
    }

    /// Grants `role` on every table the document at `document_path` touches.
    ///
    /// Any failure aborts the walk. Records written before the failure stay
    /// written.
    #[instrument(skip(self), fields(document = %document_path.display()))]
    pub async fn propagate(
        &self,
        document_path: &Path,
        role: &str,
    ) -> CopilotResult<Vec<TableDef>> {
        let document = self.loader.load(document_path).await?;
        let tree = extract_with(&document, self.options.fragment_policy)?;
        debug!(root = %tree.name, relations = tree.relations.len(), "Relation tree extracted");
        self.propagate_tree(&tree, role).await
    }

    /// Walks an already extracted relation tree.
    pub async fn propagate_tree(
        &self,
        tree: &RelationNode,
        role: &str,
    ) -> CopilotResult<Vec<TableDef>> {
        let walk = Walk {
            store: self.store.as_ref(),
            resolver: ContextResolver::new(Arc::clone(&self.schema)),
            role,
            dedupe: self.options.dedupe_tables,
            visits: Mutex::new(VisitLog::default()),
            results: Mutex::new(Vec::new()),
            actions_lock: tokio::sync::Mutex::new(()),
        };

        walk.visit(tree, tree.name.clone()).await?;

        let results = walk.results.into_inner();
        info!(root = %tree.name, role, granted = results.len(), "Permission propagation finished");
        Ok(results)
    }
}

#[derive(Default)]
struct VisitLog {
    tables: HashSet<RecordHandle>,
    actions: HashSet<String>,
}

/// State of a single walk; dropped when the walk completes
struct Walk<'w> {
    store: &'w dyn MetadataStore,
    resolver: ContextResolver,
    role: &'w str,
    dedupe: bool,
    visits: Mutex<VisitLog>,
    results: Mutex<Vec<TableDef>>,
    /// Serializes read-modify-write cycles on the shared actions file
    actions_lock: tokio::sync::Mutex<()>,
}

impl<'w> Walk<'w> {
    fn visit<'a>(
        &'a self,
        node: &'a RelationNode,
        key: String,
    ) -> BoxFuture<'a, CopilotResult<()>> {
        async move {
            match self.store.find_table_file(&key).await? {
                Some(handle) => self.visit_table(node, handle).await,
                None => self.visit_action(node, &key).await,
            }
        }
        .boxed()
    }

    async fn visit_table(&self, node: &RelationNode, handle: RecordHandle) -> CopilotResult<()> {
        let first_visit = self.visits.lock().tables.insert(handle.clone()) || !self.dedupe;
        let mut record = self.store.read_table(&handle).await?;

        if first_visit {
            let context = self.resolver.resolve(&record.key()).await?;
            let existing = std::mem::take(&mut record.select_permissions);
            record.select_permissions = merge_permission(existing, self.role, context);
            self.store.write_table(&handle, &record).await?;

            debug!(table = %record.table, context = ?context, "Select permission granted");
            self.results.lock().push(TableDef::table(&record.table, context));
        } else {
            // Still descend: this path may select relations the first one did not.
            debug!(table = %record.table, "Table already granted in this walk");
        }

        let children = node.relations.iter().filter_map(|child| {
            match resolve_relation_target(
                &child.name,
                &record.object_relationships,
                &record.array_relationships,
            ) {
                Some(target) => Some(self.visit(child, target.key())),
                None => {
                    debug!(
                        table = %record.table,
                        relation = %child.name,
                        "Relation has no resolvable target"
                    );
                    None
                }
            }
        });

        try_join_all(children).await?;
        Ok(())
    }

    /// A name without a table record is treated as an action. Actions carry
    /// no relationship metadata, so children are looked up by their own name.
    async fn visit_action(&self, node: &RelationNode, name: &str) -> CopilotResult<()> {
        let first_visit = self.visits.lock().actions.insert(name.to_string()) || !self.dedupe;
        if first_visit {
            self.grant_action(name).await?;
        }

        let children = node
            .relations
            .iter()
            .map(|child| self.visit(child, child.name.clone()));

        try_join_all(children).await?;
        Ok(())
    }

    async fn grant_action(&self, name: &str) -> CopilotResult<()> {
        let _guard = self.actions_lock.lock().await;

        let Some(handle) = self.store.find_action_file().await? else {
            warn!(action = name, "No table or actions file matches; skipping");
            return Ok(());
        };

        let mut actions = self.store.read_actions(&handle).await?;
        let Some(action) = actions.find_mut(name) else {
            debug!(action = name, "No table or action matches; skipping");
            return Ok(());
        };

        let existing = std::mem::take(&mut action.permissions);
        action.permissions = merge_action_permission(existing, self.role);
        self.store.write_actions(&handle, &actions).await?;

        debug!(action = name, "Action permission granted");
        self.results.lock().push(TableDef::action(name));
        Ok(())
    }
}
