//! The migration driver: bootstrap, read, execute, verify, report.
//!
//! The driver is deliberately best-effort. It attempts everything and
//! reports comprehensively instead of stopping on the first error; the
//! only fatal conditions are an unreadable migration file and errors
//! outside the per-statement path. There is no migration-state table, so
//! a script is only safely re-runnable if its SQL is idempotent
//! (`IF NOT EXISTS`, `CREATE OR REPLACE`).

use psynka_common::{Error, Result};
use psynka_config::MigrateConfig;
use tracing::{info, warn};

use crate::client::SupabaseClient;
use crate::executor::{self, ExecutionReport, StatementOutcome};
use crate::splitter::{self, SplitMode};
use crate::verify::{self, TableCheck};

/// Shared trigger-support function created before the script runs. The
/// script's `updated_at` triggers reference it, but creation is
/// best-effort: it may already exist, or the credential may lack the
/// privilege, and the run proceeds either way.
pub const TRIGGER_FUNCTION_SQL: &str = "\
CREATE OR REPLACE FUNCTION update_updated_at_column()
RETURNS TRIGGER AS $$
BEGIN
  NEW.updated_at = NOW();
  RETURN NEW;
END;
$$ LANGUAGE plpgsql;";

/// Everything the final report needs from one run.
#[derive(Debug)]
pub struct RunSummary {
    pub bootstrap_attempted: bool,
    pub bootstrap_ok: bool,
    pub report: ExecutionReport,
    pub checks: Vec<TableCheck>,
}

impl RunSummary {
    /// True when every statement applied cleanly.
    pub fn fully_applied(&self) -> bool {
        self.report.all_applied()
    }
}

/// Drives one migration run end to end.
pub struct MigrationRunner {
    config: MigrateConfig,
    client: SupabaseClient,
    split_mode: SplitMode,
}

impl MigrationRunner {
    pub fn new(config: MigrateConfig, split_mode: SplitMode) -> Result<Self> {
        let client = SupabaseClient::new(&config.supabase)?;
        Ok(Self {
            config,
            client,
            split_mode,
        })
    }

    /// Read the migration file and split it into statements. A read
    /// failure is fatal; nothing has been executed at that point.
    pub fn load_statements(&self) -> Result<Vec<String>> {
        let path = &self.config.migration.file;
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Migration(format!(
                "failed to read migration file {}: {e}",
                path.display()
            ))
        })?;
        Ok(splitter::split(&contents, self.split_mode))
    }

    /// Run the whole migration. `on_statement` fires once per completed
    /// statement for live progress. Returns `Err` only for fatal
    /// conditions; per-statement failures are inside the summary.
    pub async fn run(
        &self,
        on_statement: impl FnMut(&StatementOutcome),
    ) -> Result<RunSummary> {
        let bootstrap_attempted = self.config.migration.bootstrap_trigger_function;
        let bootstrap_ok = if bootstrap_attempted {
            self.bootstrap_trigger_function().await
        } else {
            false
        };

        let statements = self.load_statements()?;
        info!(
            "executing {} statement(s) from {}",
            statements.len(),
            self.config.migration.file.display()
        );

        let report = executor::execute_all(&self.client, &statements, on_statement).await;
        if report.all_applied() {
            info!("all {} statement(s) applied", report.total());
        } else {
            warn!(
                "{} of {} statement(s) failed; applied statements stay applied",
                report.failed(),
                report.total()
            );
        }

        let checks =
            verify::verify_tables(&self.client, &self.config.migration.expected_tables).await;

        Ok(RunSummary {
            bootstrap_attempted,
            bootstrap_ok,
            report,
            checks,
        })
    }

    /// Create the shared trigger function. Never fatal.
    async fn bootstrap_trigger_function(&self) -> bool {
        match self.client.exec_sql(TRIGGER_FUNCTION_SQL).await {
            Ok(()) => {
                info!("trigger support function created");
                true
            }
            Err(failure) => {
                warn!("trigger support function creation failed (continuing): {failure}");
                false
            }
        }
    }
}
