//! Backup display formatting

use chrono::{DateTime, Utc};

use crate::backup::BackupMetadata;

/// Format backups as a numbered list, newest first
pub fn format_backup_list(backups: &[BackupMetadata], verbose: bool, now: DateTime<Utc>) -> String {
    if backups.is_empty() {
        return "No backups found.\nCreate one with: stateguard backup create\n".to_string();
    }

    let mut output = String::new();
    output.push_str("Available Backups\n");
    output.push_str("=================\n\n");

    for (i, backup) in backups.iter().enumerate() {
        let age = format_duration(now.signed_duration_since(backup.timestamp));
        if verbose {
            output.push_str(&format!(
                "{}. {}\n   Created: {}\n   Reason: {}\n   Tool version: {}\n   Files: {}\n   Age: {}\n\n",
                i + 1,
                backup.name(),
                backup.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
                backup.reason,
                backup.tool_version,
                backup.file_count,
                age,
            ));
        } else {
            output.push_str(&format!(
                "  {}. {} ({} ago, {}, {} files)\n",
                i + 1,
                backup.name(),
                age,
                backup.reason,
                backup.file_count,
            ));
        }
    }

    output.push_str(&format!("\nTotal: {} backup(s)\n", backups.len()));
    output
}

/// Format a single backup's metadata and file listing
pub fn format_backup_details(backup: &BackupMetadata) -> String {
    let mut output = String::new();

    output.push_str("Backup Details\n");
    output.push_str("==============\n");
    output.push_str(&format!("Name:         {}\n", backup.name()));
    output.push_str(&format!("Location:     {}\n", backup.backup_path.display()));
    output.push_str(&format!(
        "Created:      {}\n",
        backup.timestamp.format("%Y-%m-%d %H:%M:%S%.6f UTC")
    ));
    output.push_str(&format!("Reason:       {}\n", backup.reason));
    output.push_str(&format!("Tool version: {}\n", backup.tool_version));
    output.push_str(&format!("Files:        {}\n", backup.file_count));

    if !backup.files.is_empty() {
        output.push('\n');
        for file in &backup.files {
            output.push_str(&format!("  {}\n", file));
        }
    }

    output
}

/// Format a duration in human-readable form
pub fn format_duration(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{}d", days);
    }

    format!("{}mo", days / 30)
}
