/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Render a percentage as a fixed-width bar, e.g. `[#####-----]  50%`
pub fn progress_bar(percent: u8, width: usize) -> String {
    let percent = percent.min(100) as usize;
    let filled = percent * width / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        percent
    )
}

/// Format a duration in minutes for display
pub fn format_minutes(minutes: u32) -> String {
    match minutes {
        0 => "-".to_string(),
        m if m < 60 => format!("{}m", m),
        m => format!("{}h {:02}m", m / 60, m % 60),
    }
}
