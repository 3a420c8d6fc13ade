// SPDX-License-Identifier: Apache-2.0

//! Query document loading from the front-end repository.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use copilot_core::{CopilotError, CopilotResult, DocumentLoader, QueryDocument};
use copilot_graphql::{graphql_source, SourceKind};

/// Reads `.graphql` documents and `gql` templates from script modules
#[derive(Debug, Default, Clone, Copy)]
pub struct FileDocumentLoader;

#[async_trait]
impl DocumentLoader for FileDocumentLoader {
    async fn load(&self, path: &Path) -> CopilotResult<QueryDocument> {
        let shown = path.display().to_string();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CopilotError::load(&shown, e.to_string()))?;

        let kind = SourceKind::from_path(path);
        let source = graphql_source(&text, kind)
            .ok_or_else(|| CopilotError::load(&shown, "no gql template found"))?;
        debug!(path = %shown, ?kind, "Query source read");

        let document = graphql_parser::parse_query::<String>(&source)
            .map_err(|e| CopilotError::load(&shown, e.to_string()))?;
        Ok(document.into_static())
    }
}
