//! Compatibility result display formatting

use crate::version::{CompatibilityAction, CompatibilityResult, CompatibilityStatus};

/// Format a compatibility check for the terminal
pub fn format_compatibility(result: &CompatibilityResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Status:  {}\n", status_label(result)));
    output.push_str(&format!("Action:  {}\n", action_label(result.action)));
    if let Some(from) = &result.from_version {
        output.push_str(&format!("From:    {}\n", from));
    }
    if let Some(to) = &result.to_version {
        output.push_str(&format!("To:      {}\n", to));
    }
    output.push_str(&format!("\n{}\n", result.message));

    if !result.migrations.is_empty() {
        output.push_str("\nMigrations:\n");
        for (i, id) in result.migrations.iter().enumerate() {
            output.push_str(&format!("  {}. {}\n", i + 1, id));
        }
    }

    output
}

fn status_label(result: &CompatibilityResult) -> &'static str {
    match result.status {
        CompatibilityStatus::Compatible => "Compatible",
        CompatibilityStatus::NeedsMigration => "Needs migration",
        CompatibilityStatus::Incompatible => "Incompatible",
    }
}

fn action_label(action: CompatibilityAction) -> &'static str {
    match action {
        CompatibilityAction::Continue => "continue",
        CompatibilityAction::Migrate => "migrate",
        CompatibilityAction::Initialize => "initialize",
        CompatibilityAction::Error => "error",
    }
}
