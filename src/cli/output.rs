//! CLI output formatting utilities.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;

/// Delay between characters when printing agent replies.
const TYPING_DELAY: Duration = Duration::from_millis(20);

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print an agent reply with a typing effect.
    pub async fn agent_message(msg: &str) {
        print!("\n{} ", style("Poke:").cyan().bold());
        let mut stdout = std::io::stdout();
        for c in msg.chars() {
            print!("{}", c);
            stdout.flush().ok();
            tokio::time::sleep(TYPING_DELAY).await;
        }
        println!();
    }

    /// Print the short error tag shown after a friendly failure message.
    pub fn debug_info(kind: &str) {
        eprintln!("{}", style(format!("Debug info: {}", kind)).dim());
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

/// Trailing dots for the waiting indicator, cycling 0 to 3.
pub(crate) fn waiting_dots(attempt: u32) -> String {
    ".".repeat((attempt % 4) as usize)
}
