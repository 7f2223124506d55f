pub mod client;
pub mod executor;
pub mod runner;
pub mod splitter;
pub mod verify;

pub use client::SupabaseClient;
pub use executor::{ExecutionReport, StatementOutcome, StatementStatus};
pub use runner::{MigrationRunner, RunSummary};
pub use splitter::SplitMode;
pub use verify::TableCheck;
