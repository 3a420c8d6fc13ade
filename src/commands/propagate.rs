// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use serde::Serialize;

use copilot_core::TableDef;

use crate::SharedState;

#[derive(Debug, Serialize)]
pub struct PropagateResponse {
    pub success: bool,
    pub tables: Option<Vec<TableDef>>,
    pub error: Option<String>,
}

/// Grants `role` on every table reachable from the query in `document`.
pub async fn propagate_role(
    state: &SharedState,
    document: &Path,
    role: &str,
) -> Result<PropagateResponse, String> {
    let walker = {
        let state = state.lock().await;
        state.walker()
    };

    match walker.propagate(document, role).await {
        Ok(tables) => Ok(PropagateResponse {
            success: true,
            tables: Some(tables),
            error: None,
        }),
        Err(e) => Ok(PropagateResponse {
            success: false,
            tables: None,
            error: Some(e.to_string()),
        }),
    }
}
