//! Terminal output formatting

use colored::Colorize;
use std::time::Duration;

/// Header printed before each leaf runs
pub fn task_header(name: &str) -> String {
    format!("Running \"{}\" task", name).underline().to_string()
}

pub fn info(message: &str) -> String {
    message.to_string()
}

pub fn warn(message: &str) -> String {
    format!("{} {}", "Warning:".yellow().bold(), message)
}

pub fn error(message: &str) -> String {
    format!("{} {}", "Error:".red().bold(), message)
}

pub fn debug(message: &str) -> String {
    message.dimmed().to_string()
}

/// Line written for a file an adapter produced
pub fn created(path: &str) -> String {
    format!("File {} created.", path.cyan())
}

/// Final line of a run
pub fn summary(success: bool) -> String {
    if success {
        "Done, without errors.".green().to_string()
    } else {
        "Aborted due to errors.".red().bold().to_string()
    }
}

/// Per-leaf timing table, longest first
pub fn timings(entries: &[(String, Duration)]) -> String {
    let total: Duration = entries.iter().map(|(_, d)| *d).sum();
    let width = entries.iter().map(|(n, _)| n.len()).max().unwrap_or(0);

    let mut sorted: Vec<_> = entries.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));

    let mut out = format!("Execution Time ({:.2?} total)\n", total);
    for (name, elapsed) in sorted {
        let share = if total.is_zero() {
            0.0
        } else {
            elapsed.as_secs_f64() / total.as_secs_f64() * 100.0
        };
        out.push_str(&format!(
            "  {:width$}  {:>10.2?}  {:>3.0}%\n",
            name,
            elapsed,
            share,
            width = width
        ));
    }
    out
}
