// SPDX-License-Identifier: Apache-2.0

//! Schema context resolution
//!
//! Decides the row scope of a table from its GraphQL object type. The type
//! directory is fetched once per walk and shared by every visit.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use copilot_core::{Context, CopilotError, CopilotResult, SchemaDirectory, SchemaService};

/// Walk-scoped resolver holding the memoized introspection result
pub struct ContextResolver {
    schema: Arc<dyn SchemaService>,
    directory: OnceCell<SchemaDirectory>,
}

impl ContextResolver {
    pub fn new(schema: Arc<dyn SchemaService>) -> Self {
        Self {
            schema,
            directory: OnceCell::new(),
        }
    }

    /// Scope of the type named after `table_key` (`schema_name`).
    ///
    /// The first call introspects; concurrent callers wait for that fetch
    /// instead of issuing their own. A failed fetch is not cached.
    pub async fn resolve(&self, table_key: &str) -> CopilotResult<Option<Context>> {
        let directory = self
            .directory
            .get_or_try_init(|| async {
                debug!("Fetching schema introspection");
                let directory = self.schema.introspect().await?;
                debug!(types = directory.types.len(), "Schema introspection cached");
                Ok::<_, CopilotError>(directory)
            })
            .await?;

        Ok(directory.context_of(table_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use copilot_core::{SchemaField, SchemaType};

    struct CountingSchema {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SchemaService for CountingSchema {
        async fn introspect(&self) -> CopilotResult<SchemaDirectory> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CopilotError::schema_unavailable("connection refused"));
            }
            let object = |name: &str, fields: &[&str]| SchemaType {
                name: name.to_string(),
                kind: Some("OBJECT".to_string()),
                fields: Some(
                    fields
                        .iter()
                        .map(|f| SchemaField { name: f.to_string() })
                        .collect(),
                ),
            };
            Ok(SchemaDirectory {
                types: vec![
                    object("inbound_inbound", &["id", "company_id", "warehouse_id"]),
                    object("company_tenant", &["id", "company_id"]),
                    object("product_product", &["id", "sku"]),
                ],
            })
        }
    }

    fn resolver(fail: bool) -> (ContextResolver, Arc<CountingSchema>) {
        let schema = Arc::new(CountingSchema {
            calls: AtomicUsize::new(0),
            fail,
        });
        (ContextResolver::new(schema.clone()), schema)
    }

    #[tokio::test]
    async fn test_warehouse_wins_over_company() {
        let (resolver, _) = resolver(false);
        assert_eq!(
            resolver.resolve("inbound_inbound").await.unwrap(),
            Some(Context::Warehouse)
        );
        assert_eq!(
            resolver.resolve("company_tenant").await.unwrap(),
            Some(Context::Company)
        );
        assert_eq!(resolver.resolve("product_product").await.unwrap(), None);
        assert_eq!(resolver.resolve("unknown_table").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_introspection_is_fetched_once() {
        let (resolver, schema) = resolver(false);
        let (a, b) = tokio::join!(
            resolver.resolve("inbound_inbound"),
            resolver.resolve("company_tenant")
        );
        assert!(a.is_ok() && b.is_ok());
        resolver.resolve("product_product").await.unwrap();
        assert_eq!(schema.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unavailable_schema_is_an_error() {
        let (resolver, _) = resolver(true);
        let err = resolver.resolve("inbound_inbound").await.unwrap_err();
        assert!(matches!(err, CopilotError::SchemaUnavailable { .. }));
    }
}
