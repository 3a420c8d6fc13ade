use std::path::PathBuf;

use copilot_core::CopilotError;
use permission_copilot::config::AppConfig;
use permission_copilot::observability::Sensitive;
use permission_copilot::AppState;

fn config() -> AppConfig {
    AppConfig {
        secret: Sensitive::new("hasura-admin".to_string()),
        graphql_uri: "http://localhost:8080/v1/graphql".to_string(),
        hasura_source: PathBuf::from("/src/hasura"),
        core_ui_source: PathBuf::from("/src/core-ui"),
    }
}

#[tokio::test]
async fn test_app_state_initialization() {
    // Wiring only: nothing is read from disk or the network until a command runs.
    let state = AppState::from_config(config()).unwrap();

    let remote = state.remote.as_ref().expect("Hasura client should be wired");
    assert_eq!(remote.endpoint().as_str(), "http://localhost:8080/v1/graphql");
    assert!(state.options.dedupe_tables, "Dedupe should be on by default");
    let _walker = state.walker();
}

#[test]
fn test_app_state_rejects_invalid_config() {
    let mut bad = config();
    bad.graphql_uri = "localhost:8080".to_string();
    assert!(matches!(AppState::from_config(bad), Err(CopilotError::Config { .. })));
}
