//! Post-run verification: a zero-row probe per expected table.
//!
//! Advisory only. A failed probe never changes the exit outcome; it shows
//! up in the final report so the operator knows what to look at.

use tracing::{debug, warn};

use crate::client::SupabaseClient;

/// Probe result for one expected table.
#[derive(Debug, Clone)]
pub struct TableCheck {
    pub table: String,
    pub ok: bool,
    /// Failure diagnostics when the probe did not succeed.
    pub detail: Option<String>,
}

/// Probe each table in turn, sequentially, collecting one check per table.
pub async fn verify_tables(client: &SupabaseClient, tables: &[String]) -> Vec<TableCheck> {
    let mut checks = Vec::with_capacity(tables.len());

    for table in tables {
        match client.probe_table(table).await {
            Ok(()) => {
                debug!("table {table} exists and is queryable");
                checks.push(TableCheck {
                    table: table.clone(),
                    ok: true,
                    detail: None,
                });
            }
            Err(failure) => {
                warn!("table {table} probe failed: {failure}");
                checks.push(TableCheck {
                    table: table.clone(),
                    ok: false,
                    detail: Some(failure.to_string()),
                });
            }
        }
    }

    checks
}
