use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::sync::script::{self, ImageScript};

/// Print a document's image script, optionally resolving one line.
pub fn run(document: &Path, line: Option<usize>, json: bool) -> Result<()> {
    if !document.exists() {
        anyhow::bail!("File not found: {}", document.display());
    }

    let Some(parsed) = script::parse_for_document(document) else {
        let expected = script::script_path_for(document)
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        anyhow::bail!(
            "No image script found for {} (expected {expected})",
            document.display()
        );
    };

    if json {
        println!("{}", to_json(&parsed, line)?);
        return Ok(());
    }

    println!("{} {}", "Script:".bold(), parsed.script_path.display());
    if parsed.entries.is_empty() {
        println!("{}", "No valid entries found in the image script file.".yellow());
    }
    for entry in &parsed.entries {
        println!(
            "  {:>6} - {:<6} {}",
            entry.start_line,
            entry.end_line,
            entry.image_path.display()
        );
    }

    if let Some(line) = line {
        println!();
        match script::resolve(&parsed.entries, line) {
            Some(entry) => println!(
                "Line {line}: {}",
                entry.image_path.display().to_string().green()
            ),
            None => println!(
                "Line {line}: {}",
                "no matching entry (previous image stays)".dimmed()
            ),
        }
    }
    Ok(())
}

fn to_json(parsed: &ImageScript, line: Option<usize>) -> Result<String> {
    let mut value = serde_json::to_value(parsed)?;
    if let Some(line) = line {
        let resolved = script::resolve(&parsed.entries, line).map(|e| e.image_path.clone());
        value["line"] = serde_json::json!(line);
        value["resolved"] = serde_json::to_value(resolved)?;
    }
    Ok(serde_json::to_string_pretty(&value)?)
}
