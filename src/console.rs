//! Operator console helpers
//!
//! Timestamps and startup banners. All operator-facing output in this crate
//! goes through plain `println!`/`eprintln!` with `colored`; `tracing` is
//! reserved for the HTTP server's request plumbing.

use chrono::Local;
use colored::Colorize;
use std::path::Path;

/// Wall-clock timestamp with second precision, `HH:MM:SS`.
pub fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Wall-clock timestamp with millisecond precision, `HH:MM:SS.mmm`.
pub fn timestamp_millis() -> String {
    Local::now().format("%H:%M:%S%.3f").to_string()
}

/// Startup banner for `ember serve`.
pub fn server_banner(port: u16, watched_files: usize, extensions: &[&str]) {
    println!("{}", crate::LOGO.red());
    println!();
    println!(
        "{} Serving on {}",
        "→".cyan().bold(),
        format!("http://127.0.0.1:{port}").underline()
    );
    println!(
        "{} Hot reload armed: {} files ({})",
        "→".cyan().bold(),
        watched_files,
        extensions.join(", ")
    );
    println!(
        "{} Browser console output will appear below",
        "→".cyan().bold()
    );
    println!("{}", "  Press Ctrl+C to stop".dimmed());
    println!();
}

/// Startup banner for `ember dev`.
pub fn dev_banner(port: u16, watched: &[impl AsRef<Path>]) {
    println!("{}", crate::LOGO.red());
    println!();
    println!(
        "{} Supervising server on {}",
        "→".cyan().bold(),
        format!("http://127.0.0.1:{port}").underline()
    );
    for path in watched {
        println!(
            "{} Watching {} for restarts",
            "→".cyan().bold(),
            path.as_ref().display()
        );
    }
    println!("{}", "  Press Ctrl+C to stop".dimmed());
    println!();
}
