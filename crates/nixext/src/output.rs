//! Terminal output utilities

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use nixext_core::types::ExtensionDescriptor;
use nixext_extensions::{ExtensionOutcome, ProgressReporter, Stage};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Print a header
pub fn header(msg: &str) {
    println!("\n{}", style(msg).bold().underlined());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// `  name: message`, one line of a failure listing
pub fn failure_line(name: &str, message: &str) -> String {
    format!("  {}: {}", style(name).bold(), style(message).red())
}

/// Print one line of a failure listing
pub fn failure(name: &str, message: &str) {
    eprintln!("{}", failure_line(name, message));
}

/// Create a spinner
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(template.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn extension_bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {prefix:<32.bold} [{bar:30.cyan/blue}] {msg}")
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// `[3/12] uBlock Origin v1.60.0` or `[3/12] uBlock Origin Failed to download: ...`
pub fn status_line(position: usize, total: usize, outcome: &ExtensionOutcome) -> String {
    let counter = style(format!("[{}/{}]", position, total)).dim();
    let name = outcome.descriptor.display_name();

    match &outcome.result {
        Ok(processed) => format!(
            "{} {} {} {}",
            style("✓").green().bold(),
            counter,
            name,
            style(format!("v{}", processed.version)).dim()
        ),
        Err(message) => format!(
            "{} {} {} {}",
            style("✗").red().bold(),
            counter,
            name,
            style(message).red()
        ),
    }
}

/// One progress bar per in-flight extension, plus a status line per result
pub struct TerminalProgress {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
    completed: AtomicUsize,
    total: usize,
    quiet: bool,
}

impl TerminalProgress {
    pub fn new(total: usize, quiet: bool) -> Self {
        let multi = if quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };

        Self {
            multi,
            bars: Mutex::new(HashMap::new()),
            completed: AtomicUsize::new(0),
            total,
            quiet,
        }
    }

    fn with_bar(&self, id: &str, f: impl FnOnce(&ProgressBar)) {
        if let Ok(bars) = self.bars.lock() {
            if let Some(bar) = bars.get(id) {
                f(bar);
            }
        }
    }
}

impl ProgressReporter for TerminalProgress {
    fn started(&self, descriptor: &ExtensionDescriptor) {
        let bar = self.multi.add(ProgressBar::new(100));
        bar.set_style(extension_bar_style());
        bar.set_prefix(descriptor.display_name().to_string());
        bar.set_message("Waiting...");

        if let Ok(mut bars) = self.bars.lock() {
            bars.insert(descriptor.id.clone(), bar);
        }
    }

    fn advance(&self, descriptor: &ExtensionDescriptor, stage: Stage) {
        self.with_bar(&descriptor.id, |bar| {
            bar.inc(stage.increment());
            bar.set_message(stage.description());
        });
    }

    fn finished(&self, outcome: &ExtensionOutcome) {
        let bar = self
            .bars
            .lock()
            .ok()
            .and_then(|mut bars| bars.remove(&outcome.descriptor.id));
        if let Some(bar) = bar {
            bar.finish_and_clear();
            self.multi.remove(&bar);
        }

        let position = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.quiet {
            let _ = self
                .multi
                .println(status_line(position, self.total, outcome));
        }
    }
}
