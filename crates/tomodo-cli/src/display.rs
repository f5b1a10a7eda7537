use colored::*;
use tabled::{Table, Tabled};
use tomodo_cleaner::{ContainerAction, DataDirOutcome, TeardownReport};
use tomodo_types::MemberSummary;

use crate::cli::OutputFormat;
use crate::error::Result;

pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn warning(message: &str) {
    eprintln!("{} {}", "!".yellow(), message);
}

pub fn failure(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

#[derive(Tabled)]
struct MemberRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Port")]
    port: u16,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "Container ID")]
    container_id: String,
}

pub fn render_members(members: &[MemberSummary], format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(members)?,
        OutputFormat::Table => {
            let rows = members.iter().map(|member| MemberRow {
                name: member.name.clone(),
                port: member.port,
                kind: member.kind.clone(),
                hostname: member.hostname.clone(),
                container_id: member.container_id.clone(),
            });
            Table::new(rows).to_string()
        }
        OutputFormat::Plain => members
            .iter()
            .map(|member| {
                format!(
                    "{}\t{}\t{}\t{}\t{}",
                    member.name, member.port, member.kind, member.hostname, member.container_id
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
    };
    Ok(rendered)
}

pub fn render_names(names: &[String], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(names)?),
        OutputFormat::Table | OutputFormat::Plain => Ok(names.join("\n")),
    }
}

/// One-line summary of a teardown report
pub fn summarize(report: &TeardownReport) -> String {
    let mut parts = Vec::new();
    for (action, label) in [
        (ContainerAction::Stopped, "stopped"),
        (ContainerAction::AlreadyStopped, "already stopped"),
        (ContainerAction::Removed, "removed"),
        (ContainerAction::Vanished, "gone"),
    ] {
        let count = report.count(action);
        if count > 0 {
            parts.push(format!("{} {}", count, label));
        }
    }

    let failed = report
        .containers
        .iter()
        .filter(|outcome| outcome.result.is_err())
        .count();
    if failed > 0 {
        parts.push(format!("{} failed", failed));
    }

    match &report.data_dir {
        Some(DataDirOutcome::Removed(path)) => parts.push(format!("data removed from {}", path.display())),
        Some(DataDirOutcome::Failed(_)) => parts.push("data directory not removed".to_string()),
        Some(DataDirOutcome::Absent(_)) | None => {}
    }

    if parts.is_empty() {
        format!("{}: nothing to do", report.deployment)
    } else {
        format!("{}: {}", report.deployment, parts.join(", "))
    }
}
