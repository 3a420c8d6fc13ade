// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use serde::Serialize;

use copilot_core::TableDef;

use crate::roles::{self, GrantRequest, RoleTables};
use crate::schema::RemoteRole;
use crate::SharedState;

#[derive(Debug, Serialize)]
pub struct RolesResponse {
    pub success: bool,
    pub roles: Option<Vec<RoleTables>>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RemoteRolesResponse {
    pub success: bool,
    pub roles: Option<Vec<RemoteRole>>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RoleMutationResponse {
    pub success: bool,
    pub tables: Option<Vec<TableDef>>,
    pub error: Option<String>,
}

/// Roles granted in the metadata, with the tables each one reaches
pub async fn list_roles(state: &SharedState) -> Result<RolesResponse, String> {
    let store = {
        let state = state.lock().await;
        Arc::clone(&state.store)
    };

    match roles::roles_map(store.as_ref()).await {
        Ok(roles) => Ok(RolesResponse {
            success: true,
            roles: Some(roles),
            error: None,
        }),
        Err(e) => Ok(RolesResponse {
            success: false,
            roles: None,
            error: Some(e.to_string()),
        }),
    }
}

/// Roles defined in the application database
pub async fn list_remote_roles(state: &SharedState) -> Result<RemoteRolesResponse, String> {
    let remote = {
        let state = state.lock().await;
        state.remote.clone()
    };
    let Some(remote) = remote else {
        return Ok(RemoteRolesResponse {
            success: false,
            roles: None,
            error: Some("No GraphQL endpoint configured".to_string()),
        });
    };

    match remote.fetch_roles().await {
        Ok(roles) => Ok(RemoteRolesResponse {
            success: true,
            roles: Some(roles),
            error: None,
        }),
        Err(e) => Ok(RemoteRolesResponse {
            success: false,
            roles: None,
            error: Some(e.to_string()),
        }),
    }
}

pub async fn grant_table(
    state: &SharedState,
    request: GrantRequest,
) -> Result<RoleMutationResponse, String> {
    let store = {
        let state = state.lock().await;
        Arc::clone(&state.store)
    };

    match roles::grant_table(store.as_ref(), &request).await {
        Ok(table) => Ok(RoleMutationResponse {
            success: true,
            tables: Some(vec![table]),
            error: None,
        }),
        Err(e) => Ok(RoleMutationResponse {
            success: false,
            tables: None,
            error: Some(e.to_string()),
        }),
    }
}

/// Gives role `to` every table access role `from` has
pub async fn merge_role(
    state: &SharedState,
    from: &str,
    to: &str,
) -> Result<RoleMutationResponse, String> {
    let store = {
        let state = state.lock().await;
        Arc::clone(&state.store)
    };

    match roles::merge_role(store.as_ref(), from, to).await {
        Ok(tables) => Ok(RoleMutationResponse {
            success: true,
            tables: Some(tables),
            error: None,
        }),
        Err(e) => Ok(RoleMutationResponse {
            success: false,
            tables: None,
            error: Some(e.to_string()),
        }),
    }
}
