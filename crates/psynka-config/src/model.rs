use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration for a migration run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MigrateConfig {
    #[serde(default)]
    pub supabase: SupabaseConfig,
    #[serde(default)]
    pub migration: MigrationConfig,
}

/// Connection settings for the Supabase project the migration targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project base URL, e.g. `https://abcdefgh.supabase.co`.
    #[serde(default)]
    pub url: String,
    /// Service-role key. Carried in both the `apikey` header and as a
    /// bearer token; grants elevated access, so prefer the env override
    /// over writing it into a config file.
    #[serde(default)]
    pub service_role_key: String,
    /// Name of the RPC function that executes raw SQL.
    #[serde(default = "default_exec_function")]
    pub exec_sql_function: String,
    /// Per-request timeout in seconds. A hung statement otherwise blocks
    /// the whole run indefinitely.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// What to run and what to check afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Path to the SQL migration script.
    #[serde(default = "default_migration_file")]
    pub file: PathBuf,
    /// Tables probed after execution to confirm the schema landed.
    #[serde(default = "default_expected_tables")]
    pub expected_tables: Vec<String>,
    /// Attempt to create the shared `updated_at` trigger function before
    /// running the script. Failure is never fatal.
    #[serde(default = "default_bootstrap")]
    pub bootstrap_trigger_function: bool,
}

fn default_exec_function() -> String {
    "exec_sql".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_migration_file() -> PathBuf {
    PathBuf::from("supabase/migration.sql")
}

fn default_expected_tables() -> Vec<String> {
    [
        "studio_user_profiles",
        "studio_user_credits",
        "studio_generations",
        "studio_payments",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_bootstrap() -> bool {
    true
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            service_role_key: String::new(),
            exec_sql_function: default_exec_function(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            file: default_migration_file(),
            expected_tables: default_expected_tables(),
            bootstrap_trigger_function: default_bootstrap(),
        }
    }
}
