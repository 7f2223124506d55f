use std::io::Write;
use std::path::PathBuf;

use psynka_config::MigrateConfig;
use psynka_migrate::{MigrationRunner, SplitMode, StatementStatus};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SERVICE_KEY: &str = "sk-service-test";
const RPC_PATH: &str = "/rest/v1/rpc/exec_sql";

const MIGRATION_SQL: &str = "\
CREATE TABLE studio_user_profiles (id uuid PRIMARY KEY);
CREATE TABLE studio_user_credits (id uuid PRIMARY KEY);
CREATE INDEX idx_profiles_user ON studio_user_profiles(id);
";

/// Build a config pointing at the mock server.
fn test_config(mock_url: &str, migration_file: PathBuf, tables: &[&str]) -> MigrateConfig {
    let mut config = MigrateConfig::default();
    config.supabase.url = mock_url.to_string();
    config.supabase.service_role_key = SERVICE_KEY.to_string();
    config.migration.file = migration_file;
    config.migration.expected_tables = tables.iter().map(|s| s.to_string()).collect();
    config
}

/// Write a migration script into a temp dir and return its path.
fn write_migration(dir: &tempfile::TempDir, sql: &str) -> PathBuf {
    let path = dir.path().join("migration.sql");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(sql.as_bytes()).unwrap();
    path
}

/// Mount a 200 for any exec_sql call whose body contains `token`.
async fn mock_rpc_ok(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .and(body_string_contains(token))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(null)))
        .mount(server)
        .await;
}

/// Mount a 200 zero-row probe for `table`.
async fn mock_probe_ok(server: &MockServer, table: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/rest/v1/{table}")))
        .and(query_param("limit", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn all_statements_apply_and_tables_verify() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let file = write_migration(&dir, MIGRATION_SQL);

    // The mock only matches when both auth headers and the JSON `sql`
    // field are present, so a passing run proves the request shape.
    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .and(header("apikey", SERVICE_KEY))
        .and(header("authorization", format!("Bearer {SERVICE_KEY}")))
        .and(body_string_contains("\"sql\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(null)))
        .mount(&server)
        .await;
    mock_probe_ok(&server, "studio_user_profiles").await;
    mock_probe_ok(&server, "studio_user_credits").await;

    let config = test_config(
        &server.uri(),
        file,
        &["studio_user_profiles", "studio_user_credits"],
    );
    let runner = MigrationRunner::new(config, SplitMode::Naive).unwrap();
    let summary = runner.run(|_| {}).await.unwrap();

    assert!(summary.bootstrap_attempted);
    assert!(summary.bootstrap_ok);
    assert_eq!(summary.report.total(), 3);
    assert_eq!(summary.report.succeeded(), 3);
    assert_eq!(summary.report.failed(), 0);
    assert!(summary.fully_applied());
    assert!(summary.checks.iter().all(|c| c.ok));
}

#[tokio::test]
async fn failing_statement_does_not_stop_the_run() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let file = write_migration(&dir, MIGRATION_SQL);

    mock_rpc_ok(&server, "update_updated_at_column").await;
    mock_rpc_ok(&server, "CREATE TABLE studio_user_profiles").await;
    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .and(body_string_contains("CREATE TABLE studio_user_credits"))
        .respond_with(
            ResponseTemplate::new(500).set_body_string("permission denied for schema public"),
        )
        .mount(&server)
        .await;
    mock_rpc_ok(&server, "CREATE INDEX idx_profiles_user").await;
    mock_probe_ok(&server, "studio_user_profiles").await;
    mock_probe_ok(&server, "studio_user_credits").await;

    let config = test_config(
        &server.uri(),
        file,
        &["studio_user_profiles", "studio_user_credits"],
    );
    let runner = MigrationRunner::new(config, SplitMode::Naive).unwrap();

    let mut progress = Vec::new();
    let summary = runner
        .run(|outcome| progress.push(outcome.applied()))
        .await
        .unwrap();

    // The third statement must still have been attempted.
    assert_eq!(summary.report.total(), 3);
    assert_eq!(summary.report.succeeded(), 2);
    assert_eq!(summary.report.failed(), 1);
    assert!(!summary.fully_applied());
    assert_eq!(progress, vec![true, false, true]);

    let failed = &summary.report.outcomes[1];
    assert_eq!(failed.index, 1);
    match &failed.status {
        StatementStatus::Failed { status, detail } => {
            assert_eq!(*status, Some(500));
            assert!(detail.contains("permission denied"));
        }
        other => panic!("expected failure, got: {other:?}"),
    }

    // Verification still runs and reports both tables as queryable.
    assert!(summary.checks.iter().all(|c| c.ok));
}

#[tokio::test]
async fn missing_migration_file_is_fatal_before_any_statement() {
    let server = MockServer::start().await;

    let mut config = test_config(
        &server.uri(),
        PathBuf::from("/nonexistent/migration.sql"),
        &["studio_user_profiles"],
    );
    config.migration.bootstrap_trigger_function = false;

    let runner = MigrationRunner::new(config, SplitMode::Naive).unwrap();
    let err = runner.run(|_| {}).await.unwrap_err();
    assert!(err.to_string().contains("failed to read migration file"));

    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty(), "no statements should be attempted");
}

#[tokio::test]
async fn bootstrap_failure_is_logged_not_fatal() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let file = write_migration(&dir, "CREATE TABLE studio_user_profiles (id uuid);\n");

    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .and(body_string_contains("update_updated_at_column"))
        .respond_with(ResponseTemplate::new(500).set_body_string("must be owner of schema"))
        .mount(&server)
        .await;
    mock_rpc_ok(&server, "CREATE TABLE studio_user_profiles").await;
    mock_probe_ok(&server, "studio_user_profiles").await;

    let config = test_config(&server.uri(), file, &["studio_user_profiles"]);
    let runner = MigrationRunner::new(config, SplitMode::Naive).unwrap();
    let summary = runner.run(|_| {}).await.unwrap();

    assert!(summary.bootstrap_attempted);
    assert!(!summary.bootstrap_ok);
    assert_eq!(summary.report.succeeded(), 1);
    assert!(summary.fully_applied());
}

#[tokio::test]
async fn verification_reports_missing_tables_without_failing_the_run() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let file = write_migration(&dir, "CREATE TABLE studio_user_profiles (id uuid);\n");

    mock_rpc_ok(&server, "update_updated_at_column").await;
    mock_rpc_ok(&server, "CREATE TABLE studio_user_profiles").await;
    mock_probe_ok(&server, "studio_user_profiles").await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/studio_user_credits"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string("relation \"studio_user_credits\" does not exist"),
        )
        .mount(&server)
        .await;

    let config = test_config(
        &server.uri(),
        file,
        &["studio_user_profiles", "studio_user_credits"],
    );
    let runner = MigrationRunner::new(config, SplitMode::Naive).unwrap();
    let summary = runner.run(|_| {}).await.unwrap();

    assert_eq!(summary.checks.len(), 2);
    assert!(summary.checks[0].ok);
    assert!(!summary.checks[1].ok);
    let detail = summary.checks[1].detail.as_deref().unwrap();
    assert!(detail.contains("404"));
    assert!(detail.contains("does not exist"));
    // Advisory only: the run itself completed.
    assert!(summary.fully_applied());
}

#[tokio::test]
async fn lexed_mode_sends_dollar_quoted_function_as_one_statement() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let sql = "CREATE FUNCTION touch() RETURNS trigger AS $$\n\
               BEGIN NEW.updated_at = NOW(); RETURN NEW; END;\n\
               $$ LANGUAGE plpgsql;\n";
    let file = write_migration(&dir, sql);

    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(null)))
        .mount(&server)
        .await;
    mock_probe_ok(&server, "studio_user_profiles").await;

    let mut config = test_config(&server.uri(), file, &["studio_user_profiles"]);
    config.migration.bootstrap_trigger_function = false;

    let runner = MigrationRunner::new(config, SplitMode::Lexed).unwrap();
    let summary = runner.run(|_| {}).await.unwrap();

    assert_eq!(summary.report.total(), 1);
    assert!(summary.fully_applied());
}
