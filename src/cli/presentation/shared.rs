//! Shared presentation: command outcomes and integrity reports.

use crate::command::CommandOutcome;
use crate::store::IntegrityReport;

pub fn format_outcome_text(outcome: &CommandOutcome) -> String {
    let mut output = outcome.summary();
    match outcome {
        CommandOutcome::MembersAdded(added) if !added.inserted_ids.is_empty() => {
            let ids: Vec<String> = added.inserted_ids.iter().map(|id| id.to_string()).collect();
            output.push_str(&format!("\n  Inserted: {}", ids.join(", ")));
        }
        CommandOutcome::GroupCreated(saved) if !saved.members.inserted_ids.is_empty() => {
            let ids: Vec<String> = saved
                .members
                .inserted_ids
                .iter()
                .map(|id| id.to_string())
                .collect();
            output.push_str(&format!("\n  Members: {}", ids.join(", ")));
        }
        _ => {}
    }
    output
}

pub fn format_integrity_report_text(report: &IntegrityReport) -> String {
    let header = format!(
        "  Contacts: {}\n  Groups: {}\n  Memberships: {}",
        report.contacts, report.groups, report.memberships
    );
    if report.is_consistent() {
        return format!("Integrity check passed:\n{}\n  All checks passed", header);
    }
    let mut output = format!("Integrity check found issues:\n{}", header);
    output.push_str(&format!("\n\nIssues ({}):", report.issues.len()));
    for issue in &report.issues {
        output.push_str(&format!("\n  - {}", issue));
    }
    output
}
