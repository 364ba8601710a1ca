use number_prefix::NumberPrefix;
use std::path::Path;

pub fn format_size(size: u64) -> String {
    match NumberPrefix::binary(size as f64) {
        NumberPrefix::Standalone(bytes) => format!("{} B", bytes),
        NumberPrefix::Prefixed(prefix, n) => format!("{:.1} {}B", n, prefix),
    }
}

/// Render a progress bar using Unicode block characters (1/8 to 8/8 precision)
pub fn render_bar(percent: f64, width: usize) -> String {
    const PARTIAL_CHARS: [char; 7] = ['▏', '▎', '▍', '▌', '▋', '▊', '▉'];

    let fraction = percent / 100.0 * width as f64;
    let full_blocks = fraction.floor() as usize;
    let partial = ((fraction - full_blocks as f64) * 8.0).round() as usize;

    let mut bar = "█".repeat(full_blocks.min(width));
    if full_blocks < width
        && partial > 0
        && let Some(c) = PARTIAL_CHARS.get((partial - 1).min(6))
    {
        bar.push(*c);
    }
    bar
}

/// Share of `total` taken by `part`, in percent
pub fn percent_of(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Keep the last `max` characters of a path, prefixed with "..." when cut
pub fn truncate_path(path: &Path, max: usize) -> String {
    let text = path.display().to_string();
    let len = text.chars().count();
    if len <= max {
        return text;
    }
    let keep = max.saturating_sub(3);
    let tail: String = text.chars().skip(len - keep).collect();
    format!("...{}", tail)
}
