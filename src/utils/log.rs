// src/utils/log.rs

//! Log formatting helpers.
//!
//! Section headers, cycle steps and summaries are formatted here and handed
//! to the `log` facade, so whichever logger the host installs receives them.

/// Log a success message
pub fn success(message: &str) {
    log::info!("✓ {}", message);
}

/// Log a step in a process
pub fn step(step_num: usize, total: usize, message: &str) {
    log::debug!("[STEP {}/{}] {}", step_num, total, message);
}

/// Log a header
pub fn header(title: &str) {
    let border = "═".repeat(60);
    log::info!("{}", border);
    log::info!("  {}", title);
    log::info!("{}", border);
}

/// Log a sub-item (indented)
pub fn sub_item(message: &str) {
    log::info!("    {}", message);
}

/// Log a summary section
pub fn summary(title: &str, items: &[(&str, String)]) {
    log::info!("{}", format_summary(title, items));
}

fn format_summary(title: &str, items: &[(&str, String)]) -> String {
    let details = items
        .iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join(", ");
    if details.is_empty() {
        format!("[SUMMARY] {title}")
    } else {
        format!("[SUMMARY] {title} ({details})")
    }
}
