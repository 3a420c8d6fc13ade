// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use copilot_core::{CopilotError, CopilotResult, SchemaDirectory, SchemaService};

use crate::observability::Sensitive;

const ADMIN_SECRET_HEADER: &str = "x-hasura-admin-secret";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const INTROSPECTION_QUERY: &str = r#"
query IntrospectionQuery {
  __schema {
    types {
      name
      kind
      fields {
        name
      }
    }
  }
}
"#;

const ROLES_QUERY: &str = r#"
query Roles {
  user_role {
    id
    name
  }
}
"#;

/// Role row of the application's `user_role` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRole {
    pub id: Value,
    pub name: String,
}

/// Client for the Hasura GraphQL endpoint, authenticated with the admin
/// secret.
pub struct HasuraSchemaClient {
    client: Client,
    endpoint: Url,
    secret: Sensitive<String>,
}

impl HasuraSchemaClient {
    pub fn new(endpoint: &str, secret: Sensitive<String>) -> CopilotResult<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            CopilotError::config(format!("Invalid GraphQL endpoint {}: {}", endpoint, e))
        })?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CopilotError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            secret,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Lists the roles defined in the application's `user_role` table.
    pub async fn fetch_roles(&self) -> CopilotResult<Vec<RemoteRole>> {
        #[derive(Deserialize)]
        struct RolesData {
            user_role: Vec<RemoteRole>,
        }

        let data: RolesData = self.query(ROLES_QUERY).await?;
        Ok(data.user_role)
    }

    async fn query<T: DeserializeOwned>(&self, query: &str) -> CopilotResult<T> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header("Content-Type", "application/json")
            .json(&json!({ "query": query }));
        if !self.secret.is_empty() {
            request = request.header(ADMIN_SECRET_HEADER, self.secret.expose());
        }

        let response = request
            .send()
            .await
            .map_err(|e| {
                CopilotError::schema_unavailable(format!(
                    "Request to {} failed: {}",
                    self.endpoint, e
                ))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| {
                CopilotError::schema_unavailable(format!("Failed to read response: {}", e))
            })?;
        debug!(endpoint = %self.endpoint, %status, bytes = body.len(), "GraphQL response received");

        decode_response(status.as_u16(), &body)
    }
}

#[async_trait]
impl SchemaService for HasuraSchemaClient {
    async fn introspect(&self) -> CopilotResult<SchemaDirectory> {
        #[derive(Deserialize)]
        struct IntrospectionData {
            #[serde(rename = "__schema")]
            schema: SchemaDirectory,
        }

        let data: IntrospectionData = self.query(INTROSPECTION_QUERY).await?;
        Ok(data.schema)
    }
}

#[derive(Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

/// GraphQL errors win over partial data.
fn decode_response<T: DeserializeOwned>(status: u16, body: &str) -> CopilotResult<T> {
    let parsed: Result<GraphqlResponse<T>, _> = serde_json::from_str(body);

    match parsed {
        Ok(response) if !response.errors.is_empty() => {
            let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();
            Err(CopilotError::schema_unavailable(messages.join("; ")))
        }
        Ok(_) if !(200..300).contains(&status) => {
            Err(CopilotError::schema_unavailable(format!("HTTP {}: {}", status, body)))
        }
        Ok(GraphqlResponse { data: Some(data), .. }) => Ok(data),
        Ok(GraphqlResponse { data: None, .. }) => {
            Err(CopilotError::schema_unavailable("Response carried no data"))
        }
        Err(_) if !(200..300).contains(&status) => {
            Err(CopilotError::schema_unavailable(format!("HTTP {}: {}", status, body)))
        }
        Err(e) => Err(CopilotError::schema_unavailable(format!("Malformed response: {}", e))),
    }
}
