use std::fs;
use std::path::Path;

/// Create an OSC8 hyperlink for terminal output
pub fn osc8_link(url: &str, text: &str) -> String {
    format!("\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\", url, text)
}

/// Create an OSC8 file:// hyperlink for terminal output
pub fn osc8_file_link(path: &Path, text: &str) -> String {
    let abs_path = fs::canonicalize(path)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| path.to_string_lossy().to_string());
    format!("\x1b]8;;file://{}\x1b\\{}\x1b]8;;\x1b\\", abs_path, text)
}

/// Render a URL for a progress line, as a hyperlink unless `plain`
pub fn display_url(url: &str, plain: bool) -> String {
    if plain {
        url.to_string()
    } else {
        osc8_link(url, url)
    }
}

/// Render a saved file for a progress line, as a hyperlink unless `plain`
pub fn display_path(path: &Path, plain: bool) -> String {
    let text = path.display().to_string();
    if plain {
        text
    } else {
        osc8_file_link(path, &text)
    }
}
