// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;

use crate::sources::{self, QuerySource};
use crate::SharedState;

#[derive(Debug, Serialize)]
pub struct QuerySourcesResponse {
    pub success: bool,
    pub sources: Option<Vec<QuerySource>>,
    pub error: Option<String>,
}

/// Query modules of the configured front-end checkout
pub async fn list_query_sources(state: &SharedState) -> Result<QuerySourcesResponse, String> {
    let gqls_dir = {
        let state = state.lock().await;
        state.config.gqls_dir()
    };

    match sources::list_query_sources(&gqls_dir).await {
        Ok(sources) => Ok(QuerySourcesResponse {
            success: true,
            sources: Some(sources),
            error: None,
        }),
        Err(e) => Ok(QuerySourcesResponse {
            success: false,
            sources: None,
            error: Some(e.to_string()),
        }),
    }
}
