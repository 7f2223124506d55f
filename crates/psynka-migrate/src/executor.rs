//! Best-effort sequential statement execution.
//!
//! One RPC call per statement, in file order, each awaited to completion
//! before the next begins. A failing statement is recorded and execution
//! moves on; there is no rollback and no transaction spanning statements,
//! so everything applied before a failure stays applied.

use tracing::{debug, warn};

use crate::client::SupabaseClient;

/// How many leading characters of a statement to keep for diagnostics.
const PREVIEW_LEN: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementStatus {
    Applied,
    Failed { status: Option<u16>, detail: String },
}

/// The result of one statement's execution attempt.
#[derive(Debug, Clone)]
pub struct StatementOutcome {
    /// Zero-based position in the statement sequence.
    pub index: usize,
    /// Leading text of the statement, for logs and failure reports.
    pub preview: String,
    pub status: StatementStatus,
}

impl StatementOutcome {
    pub fn applied(&self) -> bool {
        self.status == StatementStatus::Applied
    }
}

/// Aggregated outcomes for a whole run, in statement order. Counters are
/// derived from the outcome list rather than tracked separately.
#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    pub outcomes: Vec<StatementOutcome>,
}

impl ExecutionReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.applied()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.applied()).count()
    }

    pub fn all_applied(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &StatementOutcome> {
        self.outcomes.iter().filter(|o| !o.applied())
    }
}

/// Run every statement in order, never aborting early. `on_statement` is
/// invoked once per completed statement, in order, for live progress.
pub async fn execute_all(
    client: &SupabaseClient,
    statements: &[String],
    mut on_statement: impl FnMut(&StatementOutcome),
) -> ExecutionReport {
    let mut outcomes = Vec::with_capacity(statements.len());

    for (index, sql) in statements.iter().enumerate() {
        let status = match client.exec_sql(sql).await {
            Ok(()) => {
                debug!("statement {index} applied");
                StatementStatus::Applied
            }
            Err(failure) => {
                warn!(
                    "statement {index} failed ({failure}): {}",
                    preview(sql)
                );
                StatementStatus::Failed {
                    status: failure.status,
                    detail: failure.detail,
                }
            }
        };

        let outcome = StatementOutcome {
            index,
            preview: preview(sql),
            status,
        };
        on_statement(&outcome);
        outcomes.push(outcome);
    }

    ExecutionReport { outcomes }
}

/// Leading text of a statement, single-spaced, truncated for display.
pub fn preview(sql: &str) -> String {
    let flattened: String = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if flattened.chars().count() <= PREVIEW_LEN {
        return flattened;
    }
    let cut: String = flattened.chars().take(PREVIEW_LEN).collect();
    format!("{cut}…")
}
