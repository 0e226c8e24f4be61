use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Load title identifiers from a codes file, one per line
///
/// An unreadable file aborts the run; everything after that is per-item.
pub fn load_codes(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read codes file: {}", path.display()))?;
    Ok(parse_codes(&content))
}

/// Split codes file content into identifiers
///
/// Lines whose first character is `#` are comments. The line terminator is
/// dropped and lines left empty are skipped; nothing else is trimmed or
/// validated.
pub fn parse_codes(content: &str) -> Vec<String> {
    content
        .split_inclusive('\n')
        .filter(|line| !line.starts_with('#'))
        .map(|line| line.strip_suffix('\n').unwrap_or(line))
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
