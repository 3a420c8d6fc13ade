// Permission Copilot - propagate Hasura select permissions along the
// relations a GraphQL query touches
// Core library

pub mod cli;
pub mod commands;
pub mod config;
mod discovery;
pub mod engine;
pub mod loader;
pub mod observability;
pub mod roles;
pub mod schema;
pub mod sources;
pub mod store;

use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::Mutex;

use copilot_core::{CopilotResult, DocumentLoader, MetadataStore, SchemaService};

use config::AppConfig;
use engine::{WalkOptions, Walker};
use loader::FileDocumentLoader;
use schema::HasuraSchemaClient;
use store::YamlMetadataStore;

pub type SharedState = Arc<Mutex<AppState>>;
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn MetadataStore>,
    pub schema: Arc<dyn SchemaService>,
    pub loader: Arc<dyn DocumentLoader>,
    /// Set when the schema service is the Hasura endpoint itself
    pub remote: Option<Arc<HasuraSchemaClient>>,
    pub options: WalkOptions,
}

impl AppState {
    /// Wires the file-backed store and the Hasura client from `config`.
    pub fn from_config(config: AppConfig) -> CopilotResult<Self> {
        config.validate()?;

        let remote = Arc::new(HasuraSchemaClient::new(
            &config.graphql_uri,
            config.secret.clone(),
        )?);
        let store = Arc::new(YamlMetadataStore::new(config.hasura_source.clone()));

        Ok(Self {
            store,
            schema: remote.clone(),
            loader: Arc::new(FileDocumentLoader),
            remote: Some(remote),
            options: WalkOptions::default(),
            config,
        })
    }

    pub fn with_services(
        config: AppConfig,
        store: Arc<dyn MetadataStore>,
        schema: Arc<dyn SchemaService>,
        loader: Arc<dyn DocumentLoader>,
    ) -> Self {
        Self {
            config,
            store,
            schema,
            loader,
            remote: None,
            options: WalkOptions::default(),
        }
    }

    pub fn walker(&self) -> Walker {
        Walker::new(
            Arc::clone(&self.loader),
            Arc::clone(&self.store),
            Arc::clone(&self.schema),
            self.options,
        )
    }
}

pub fn run() -> ExitCode {
    observability::init_tracing();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };
    runtime.block_on(cli::run())
}
