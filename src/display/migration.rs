//! Migration status display formatting

use crate::migration::{AppliedMigration, Migration};

/// Format applied and pending migrations as a table
pub fn format_migration_status(
    current: i64,
    applied: &[AppliedMigration],
    pending: &[&Migration],
) -> String {
    let mut output = String::new();
    output.push_str(&format!("Current schema version: {}\n\n", current));

    if applied.is_empty() && pending.is_empty() {
        output.push_str("No migrations.\n");
        return output;
    }

    let desc_width = applied
        .iter()
        .map(|m| m.description.len())
        .chain(pending.iter().map(|m| m.description.len()))
        .max()
        .unwrap_or(11)
        .max(11);

    output.push_str(&format!(
        "{:>7}  {:<desc_width$}  {}\n",
        "Version",
        "Description",
        "Applied",
        desc_width = desc_width,
    ));
    output.push_str(&format!(
        "{:->7}  {:-<desc_width$}  {:-<20}\n",
        "",
        "",
        "",
        desc_width = desc_width,
    ));

    for m in applied {
        output.push_str(&format!(
            "{:>7}  {:<desc_width$}  {}\n",
            m.version,
            m.description,
            m.applied_at,
            desc_width = desc_width,
        ));
    }
    for m in pending {
        output.push_str(&format!(
            "{:>7}  {:<desc_width$}  pending\n",
            m.version,
            m.description,
            desc_width = desc_width,
        ));
    }

    output
}
