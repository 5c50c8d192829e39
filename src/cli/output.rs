//! Styled terminal output.
//!
//! Data a user may pipe somewhere (secrets, entry names) goes to stdout
//! unstyled.  Status lines go through the helpers below so every command
//! looks the same; only `success` writes to stdout.

use console::style;

/// "✓ {msg}" in green.
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// "✗ {msg}" in red, on stderr.
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// "⚠ {msg}" in yellow, on stderr.
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// "ℹ {msg}" in blue, on stderr.
pub fn info(msg: &str) {
    eprintln!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Dimmed hint, on stderr.
pub fn tip(msg: &str) {
    eprintln!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Entry names one per line, or `empty_hint` when there are none.
pub fn names(names: &[String], empty_hint: &str) {
    if names.is_empty() {
        info(empty_hint);
        return;
    }
    for name in names {
        println!("{name}");
    }
}
