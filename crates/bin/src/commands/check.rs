//! Integrity check and repair.

use filekeep::storage::IntegrityReport;

use crate::backend::Backend;
use crate::cli::CheckArgs;
use crate::output::{OutputFormat, print_json, print_table};

/// Run the `check` command
pub async fn run(
    backend: &Backend,
    args: &CheckArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = backend.context();
    let report = if args.repair {
        let repaired = backend.storage.repair_integrity(&ctx).await?;
        backend.save().await?;
        repaired
    } else {
        backend.storage.verify_integrity(&ctx).await?
    };

    match format {
        OutputFormat::Human => print_report(&report, args.repair),
        OutputFormat::Json => print_json(&serde_json::json!({
            "repaired": args.repair,
            "dangling_shares": report.dangling_shares,
            "dangling_rules": report.dangling_rules,
        }))?,
    }

    if !args.repair && !report.is_consistent() {
        return Err(format!("{} dangling reference(s) found", report.len()).into());
    }
    Ok(())
}

fn print_report(report: &IntegrityReport, repaired: bool) {
    if report.is_consistent() {
        println!(
            "{}",
            if repaired { "Nothing to repair." } else { "No dangling references." }
        );
        return;
    }

    let action = if repaired { "deleted" } else { "dangling" };
    let mut rows: Vec<Vec<String>> = report
        .dangling_shares
        .iter()
        .map(|key| vec!["share".to_string(), key.to_string(), action.to_string()])
        .collect();
    let action = if repaired { "cleared" } else { "dangling" };
    rows.extend(
        report
            .dangling_rules
            .iter()
            .map(|id| vec!["auth rule".to_string(), id.to_string(), action.to_string()]),
    );
    print_table(&["KIND", "KEY", "STATE"], &rows);
}
