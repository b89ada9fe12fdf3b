use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory, next to the document, that holds image scripts.
pub const SCRIPT_DIR: &str = "imagescripts";
pub const SCRIPT_EXTENSION: &str = "imagescript";

/// One `start, end, image` line of an image script, with the image path resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptEntry {
    pub start_line: i64,
    pub end_line: i64,
    pub image_path: PathBuf,
}

impl ScriptEntry {
    pub fn matches(&self, line: usize) -> bool {
        let line = line as i64;
        line >= self.start_line && line <= self.end_line
    }
}

/// A parsed image script and where it was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageScript {
    pub script_path: PathBuf,
    pub entries: Vec<ScriptEntry>,
}

/// `Dir/imagescripts/N.imagescript` for a document at `Dir/N.ext`.
pub fn script_path_for(document: &Path) -> Option<PathBuf> {
    let stem = document.file_stem()?;
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(SCRIPT_EXTENSION);
    Some(document_dir(document).join(SCRIPT_DIR).join(name))
}

fn document_dir(document: &Path) -> PathBuf {
    let dir = match document.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf())
}

/// Load the image script for a document.
///
/// Returns `None` when the document has no script or the script cannot be read;
/// read failures are logged, never returned. An existing script with no usable
/// lines yields `Some` with an empty entry list. The file is re-read on every call.
pub fn parse_for_document(document: &Path) -> Option<ImageScript> {
    let script_path = script_path_for(document)?;
    if !script_path.exists() {
        log::debug!("No image script at {}", script_path.display());
        return None;
    }

    let content = match std::fs::read_to_string(&script_path) {
        Ok(content) => content,
        Err(e) => {
            log::warn!(
                "Failed to read image script {}: {e}",
                script_path.display()
            );
            return None;
        }
    };

    let entries = parse(&content, &document_dir(document));
    log::info!(
        "Loaded {} image script entries from {}",
        entries.len(),
        script_path.display()
    );
    Some(ImageScript {
        script_path,
        entries,
    })
}

/// Parse script text. Image paths are resolved against `base_dir`; entries whose
/// image does not exist are dropped, and malformed lines are skipped.
pub fn parse(content: &str, base_dir: &Path) -> Vec<ScriptEntry> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !is_comment(line))
        .filter_map(|(index, line)| parse_line(line, base_dir, index + 1))
        .collect()
}

fn is_comment(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

fn parse_line(line: &str, base_dir: &Path, line_no: usize) -> Option<ScriptEntry> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 3 {
        log::trace!("Skipping script line {line_no}: expected 3 fields");
        return None;
    }

    let (Ok(start_line), Ok(end_line)) = (fields[0].parse::<i64>(), fields[1].parse::<i64>())
    else {
        log::trace!("Skipping script line {line_no}: non-numeric bounds");
        return None;
    };

    let image_path = base_dir.join(fields[2]);
    if !image_path.is_file() {
        log::debug!(
            "Dropping script line {line_no}: image {} not found",
            image_path.display()
        );
        return None;
    }

    Some(ScriptEntry {
        start_line,
        end_line,
        image_path,
    })
}

/// First entry, in stored order, whose range contains `line`.
pub fn resolve(entries: &[ScriptEntry], line: usize) -> Option<&ScriptEntry> {
    entries.iter().find(|entry| entry.matches(line))
}
