// SPDX-License-Identifier: Apache-2.0

//! Role administration over the metadata store: the role map, manual
//! grants and copying one role's table access to another.

use std::collections::BTreeMap;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use copilot_core::{
    merge_permission_with, Context, CopilotError, CopilotResult, MetadataStore, PermissionRule,
    RecordHandle, TableDef,
};

/// Tables one role can select from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleTables {
    pub role: String,
    pub tables: Vec<RoleTable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleTable {
    pub name: String,
    pub schema: String,
    pub permission: PermissionRule,
}

/// Manual grant of one role on one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRequest {
    pub role: String,
    /// Combined key, `schema_name`
    pub table: String,
    pub allow_aggregations: bool,
    pub context: Option<Context>,
}

/// Every role found in select permissions, sorted by name, with its tables
/// in store order.
pub async fn roles_map(store: &dyn MetadataStore) -> CopilotResult<Vec<RoleTables>> {
    let mut roles: BTreeMap<String, Vec<RoleTable>> = BTreeMap::new();

    for handle in store.list_tables().await? {
        let record = store.read_table(&handle).await?;
        for entry in record.select_permissions {
            roles.entry(entry.role).or_default().push(RoleTable {
                name: record.table.name.clone(),
                schema: record.table.schema.clone(),
                permission: entry.permission,
            });
        }
    }

    Ok(roles
        .into_iter()
        .map(|(role, tables)| RoleTables { role, tables })
        .collect())
}

#[instrument(skip(store, request), fields(role = %request.role, table = %request.table))]
pub async fn grant_table(
    store: &dyn MetadataStore,
    request: &GrantRequest,
) -> CopilotResult<TableDef> {
    let not_found = || CopilotError::not_found(format!("table {}", request.table));

    let handle = store.find_table_file(&request.table).await?.ok_or_else(not_found)?;
    let mut record = store.read_table(&handle).await?;
    // Aliases resolve bare names too; a manual grant wants the exact table.
    if record.key() != request.table {
        return Err(not_found());
    }

    let rule = PermissionRule::scoped(request.context, request.allow_aggregations);
    let existing = std::mem::take(&mut record.select_permissions);
    record.select_permissions = merge_permission_with(existing, &request.role, rule);
    store.write_table(&handle, &record).await?;

    info!("Select permission granted");
    Ok(TableDef::table(&record.table, request.context))
}

/// Grants `to` on every table `from` can select, keeping the aggregation
/// flag and the row scope of `from`'s filter. Custom filters that are not a
/// tenant scope become unrestricted.
#[instrument(skip(store))]
pub async fn merge_role(
    store: &dyn MetadataStore,
    from: &str,
    to: &str,
) -> CopilotResult<Vec<TableDef>> {
    if from == to {
        return Ok(Vec::new());
    }

    let handles = store.list_tables().await?;
    let granted =
        try_join_all(handles.iter().map(|handle| copy_grant(store, handle, from, to))).await?;
    let granted: Vec<TableDef> = granted.into_iter().flatten().collect();

    info!(granted = granted.len(), "Role merged");
    Ok(granted)
}

async fn copy_grant(
    store: &dyn MetadataStore,
    handle: &RecordHandle,
    from: &str,
    to: &str,
) -> CopilotResult<Option<TableDef>> {
    let mut record = store.read_table(handle).await?;
    let Some(source) = record.permission_for(from) else {
        return Ok(None);
    };

    let context = source.filter.inferred_context();
    let rule = PermissionRule::scoped(context, source.allow_aggregations);
    let existing = std::mem::take(&mut record.select_permissions);
    record.select_permissions = merge_permission_with(existing, to, rule);
    store.write_table(handle, &record).await?;

    debug!(table = %record.table, context = ?context, "Role permission copied");
    Ok(Some(TableDef::table(&record.table, context)))
}
