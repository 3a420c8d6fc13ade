// SPDX-License-Identifier: Apache-2.0

//! Command line front end. Every command prints its response as JSON on
//! stdout and exits non-zero when the response reports a failure.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::sync::Mutex;

use copilot_core::Context;
use copilot_graphql::FragmentPolicy;

use crate::commands;
use crate::commands::config::ConfigUpdate;
use crate::config::AppConfig;
use crate::roles::GrantRequest;
use crate::{AppState, SharedState};

#[derive(Parser)]
#[command(
    name = "permission-copilot",
    version,
    about = "Propagate Hasura select permissions along the relations a GraphQL query touches"
)]
struct Cli {
    /// Config file (defaults to permission-copilot.json in the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Grant a role on every table a query document reaches
    Propagate {
        /// `.graphql` file or TypeScript query module
        document: PathBuf,
        #[arg(long)]
        role: String,
        /// Rewrite tables reached through several relation paths once per path
        #[arg(long)]
        no_dedupe: bool,
        /// Union repeated fragment spreads instead of keeping the last one
        #[arg(long)]
        merge_fragments: bool,
    },
    /// List roles and the tables they can select
    Roles {
        /// Read the application's `user_role` table instead of the metadata
        #[arg(long)]
        remote: bool,
    },
    /// Grant a role on one table
    Grant {
        #[arg(long)]
        role: String,
        /// Combined key, `schema_table`
        #[arg(long)]
        table: String,
        #[arg(long)]
        aggregations: bool,
        #[arg(long)]
        context: Option<Context>,
    },
    /// Give a role every table access another role has
    MergeRole {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// List query modules of the front-end checkout
    Queries,
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    Logs {
        #[command(subcommand)]
        action: LogsAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the configuration, secret redacted
    Show,
    Set {
        #[arg(long)]
        secret: Option<String>,
        #[arg(long)]
        graphql_uri: Option<String>,
        #[arg(long)]
        hasura_source: Option<PathBuf>,
        #[arg(long)]
        core_ui_source: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum LogsAction {
    Export,
}

#[derive(Serialize)]
struct FailureResponse {
    success: bool,
    error: String,
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    let config_path = match cli.config.clone().map(Ok).unwrap_or_else(AppConfig::default_path) {
        Ok(path) => path,
        Err(e) => return fail(e.to_string()),
    };

    match cli.command {
        Command::Config { action } => {
            let response = match action {
                ConfigAction::Show => commands::config::show_config(&config_path).await,
                ConfigAction::Set {
                    secret,
                    graphql_uri,
                    hasura_source,
                    core_ui_source,
                } => {
                    let update = ConfigUpdate {
                        secret,
                        graphql_uri,
                        hasura_source,
                        core_ui_source,
                    };
                    commands::config::update_config(&config_path, update).await
                }
            };
            report(response.map(|r| (r.success, to_json(&r))))
        }
        Command::Logs {
            action: LogsAction::Export,
        } => {
            let response = commands::logs::export_logs().await;
            report(response.map(|r| (r.success, to_json(&r))))
        }
        command => {
            let state = match load_state(&config_path) {
                Ok(state) => state,
                Err(e) => return fail(e),
            };
            run_with_state(&state, command).await
        }
    }
}

fn load_state(config_path: &Path) -> Result<SharedState, String> {
    let config = AppConfig::from_path(config_path)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| {
            format!(
                "No configuration at {}; run `permission-copilot config set` first",
                config_path.display()
            )
        })?;
    let state = AppState::from_config(config).map_err(|e| e.to_string())?;
    Ok(Arc::new(Mutex::new(state)))
}

async fn run_with_state(state: &SharedState, command: Command) -> ExitCode {
    let response = match command {
        Command::Propagate {
            document,
            role,
            no_dedupe,
            merge_fragments,
        } => {
            {
                let mut state = state.lock().await;
                state.options.dedupe_tables = !no_dedupe;
                if merge_fragments {
                    state.options.fragment_policy = FragmentPolicy::Merge;
                }
            }
            commands::propagate::propagate_role(state, &document, &role)
                .await
                .map(|r| (r.success, to_json(&r)))
        }
        Command::Roles { remote: true } => commands::roles::list_remote_roles(state)
            .await
            .map(|r| (r.success, to_json(&r))),
        Command::Roles { remote: false } => commands::roles::list_roles(state)
            .await
            .map(|r| (r.success, to_json(&r))),
        Command::Grant {
            role,
            table,
            aggregations,
            context,
        } => {
            let request = GrantRequest {
                role,
                table,
                allow_aggregations: aggregations,
                context,
            };
            commands::roles::grant_table(state, request)
                .await
                .map(|r| (r.success, to_json(&r)))
        }
        Command::MergeRole { from, to } => commands::roles::merge_role(state, &from, &to)
            .await
            .map(|r| (r.success, to_json(&r))),
        Command::Queries => commands::sources::list_query_sources(state)
            .await
            .map(|r| (r.success, to_json(&r))),
        Command::Config { .. } | Command::Logs { .. } => {
            Err("Command does not need a loaded configuration".to_string())
        }
    };

    report(response)
}

fn to_json<T: Serialize>(response: &T) -> String {
    serde_json::to_string_pretty(response)
        .unwrap_or_else(|e| format!("{{\"success\":false,\"error\":\"{}\"}}", e))
}

fn report(response: Result<(bool, String), String>) -> ExitCode {
    match response {
        Ok((success, json)) => {
            println!("{json}");
            if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => fail(e),
    }
}

fn fail(error: String) -> ExitCode {
    println!(
        "{}",
        to_json(&FailureResponse {
            success: false,
            error,
        })
    );
    ExitCode::FAILURE
}
