use std::io::Write;

use psynka_config::MigrateConfig;
use psynka_migrate::{RunSummary, StatementOutcome, StatementStatus};

/// Print the run header: where we are migrating to and from what file.
pub fn print_header(config: &MigrateConfig) {
    println!();
    println!("  Psynka Studio migration");
    println!("  -----------------------");
    println!("  target: {}", config.supabase.url);
    println!("  script: {}", config.migration.file.display());
    println!();
    print!("  ");
    let _ = std::io::stdout().flush();
}

/// One glyph per statement as it completes.
pub fn print_progress_glyph(outcome: &StatementOutcome) {
    if outcome.applied() {
        print!("✓");
    } else {
        print!("✗");
    }
    let _ = std::io::stdout().flush();
}

/// Numbered statement previews for `--dry-run`.
pub fn print_dry_run(config: &MigrateConfig, statements: &[String]) {
    println!();
    println!(
        "  Dry run: {} statement(s) from {}",
        statements.len(),
        config.migration.file.display()
    );
    println!();
    for (i, sql) in statements.iter().enumerate() {
        println!("  {:>3}. {}", i + 1, psynka_migrate::executor::preview(sql));
    }
    println!();
    println!("  Nothing was executed.");
}

/// Final tallies, failure details, and the per-table verification block.
pub fn print_summary(summary: &RunSummary) {
    println!();
    println!("  Summary");
    println!("  -------");
    println!("  statements: {}", summary.report.total());
    println!("  succeeded:  {}", summary.report.succeeded());
    println!("  failed:     {}", summary.report.failed());
    if summary.bootstrap_attempted && !summary.bootstrap_ok {
        println!("  note: trigger function bootstrap failed (it may already exist)");
    }
    println!();

    if summary.fully_applied() {
        println!("  All statements applied.");
    } else {
        println!(
            "  Partial: {} statement(s) failed; earlier statements stay applied (no rollback).",
            summary.report.failed()
        );
        for failure in summary.report.failures() {
            if let StatementStatus::Failed { status, detail } = &failure.status {
                let detail = match status {
                    Some(code) => format!("HTTP {code}: {detail}"),
                    None => detail.clone(),
                };
                println!("    #{} {}: {}", failure.index + 1, failure.preview, detail);
            }
        }
    }

    println!();
    println!("  Verification");
    println!("  ------------");
    let width = summary
        .checks
        .iter()
        .map(|c| c.table.len())
        .max()
        .unwrap_or(0);
    for check in &summary.checks {
        if check.ok {
            println!("  {:<width$}  OK", check.table);
        } else {
            let detail = check.detail.as_deref().unwrap_or("probe failed");
            println!("  {:<width$}  MISSING? ({detail})", check.table);
        }
    }
    println!();
}
