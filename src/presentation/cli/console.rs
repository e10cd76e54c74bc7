use colored::Colorize;

use crate::application::services::ProgressReporter;

/// Progress lines on stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgress;

impl ConsoleProgress {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for ConsoleProgress {
    fn step(&self, message: &str) {
        println!("{} {}", "::".blue().bold(), message);
    }

    fn detail(&self, message: &str) {
        println!("   {}", message);
    }

    fn warn(&self, message: &str) {
        println!("{} {}", "⚠".yellow().bold(), message);
    }
}

/// Final success line
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Indented `label: value` line under a success message
pub fn print_field(label: &str, value: &str) {
    println!("  {}: {}", label, value.bold());
}
