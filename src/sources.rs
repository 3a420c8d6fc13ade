// SPDX-License-Identifier: Apache-2.0

//! Query modules available in the front-end checkout.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use copilot_core::{CopilotError, CopilotResult};

use crate::discovery::discover_files;

const QUERY_SUFFIXES: &[&str] = &["query.ts", "mutation.ts", ".graphql"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySource {
    pub name: String,
    pub path: PathBuf,
}

/// Lists query and mutation modules below `gqls_dir`, sorted by file name
/// ignoring case.
pub async fn list_query_sources(gqls_dir: &Path) -> CopilotResult<Vec<QuerySource>> {
    if !gqls_dir.is_dir() {
        return Err(CopilotError::not_found(format!(
            "query directory {}",
            gqls_dir.display()
        )));
    }

    let files = discover_files(gqls_dir)
        .await
        .map_err(|e| CopilotError::load(gqls_dir.display().to_string(), e.to_string()))?;

    let mut sources: Vec<QuerySource> = files
        .into_iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?.to_string();
            QUERY_SUFFIXES
                .iter()
                .any(|suffix| name.ends_with(suffix))
                .then_some(QuerySource { name, path })
        })
        .collect();

    sources.sort_by_cached_key(|s| s.name.to_lowercase());
    Ok(sources)
}
