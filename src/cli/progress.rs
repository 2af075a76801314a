//! Spinner and summary reporting for CLI transfers.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::Error;
use crate::format::{format_bytes, format_duration, format_pass};
use crate::media::{GroupInfo, MediaKind};
use crate::pipeline::{TransferProgress, TransferReport};
use crate::stats::PassStats;
use crate::storage::RemoteObject;

const SEPARATOR: &str = "────────────────────────────────────────────────────────────";

/// Creates the spinner shown while a pass is running.
pub fn make_pass_spinner(kind: MediaKind) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{elapsed_precise}] {prefix:>9} {msg}")
            .expect("progress template is valid"),
    );
    bar.set_prefix(kind.to_string());
    bar.set_message("scanning...");
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Prints one status line per transferred file, with a spinner per pass.
#[derive(Default)]
pub struct CliProgress {
    spinner: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_spinner(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.spinner.lock()
            && let Some(bar) = guard.as_ref()
        {
            f(bar);
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

impl TransferProgress for CliProgress {
    fn on_pass_start(&self, kind: MediaKind) {
        if let Ok(mut guard) = self.spinner.lock() {
            *guard = Some(make_pass_spinner(kind));
        }
    }

    fn on_downloaded(&self, _kind: MediaKind, path: &Path, size: u64) {
        self.with_spinner(|bar| {
            bar.println(format!("Downloaded: {} ({})", path.display(), format_bytes(size)));
            bar.set_message(format!("uploading {}", display_name(path)));
        });
    }

    fn on_uploaded(&self, _kind: MediaKind, path: &Path, object: &RemoteObject) {
        self.with_spinner(|bar| {
            bar.println(format!("Uploaded: {} (id {})", display_name(path), object.id));
            bar.set_message("scanning...");
        });
    }

    fn on_skipped(&self, kind: MediaKind, message_id: i32) {
        self.with_spinner(|bar| bar.set_message(format!("skipped {kind} message {message_id}")));
    }

    fn on_failed(&self, _kind: MediaKind, _message_id: i32, error: &Error) {
        self.with_spinner(|bar| bar.println(format!("Failed: {error}")));
    }

    fn on_pass_complete(&self, kind: MediaKind, stats: &PassStats) {
        if let Ok(mut guard) = self.spinner.lock()
            && let Some(bar) = guard.take()
        {
            bar.finish_and_clear();
        }
        println!("  {}", format_pass(kind, stats));
    }
}

/// Prints the resolved group.
pub fn print_group(group: &GroupInfo) {
    println!("Group ID: {}, Title: {}", group.group_id, group.title);
}

/// Prints a summary of the whole run.
pub fn print_summary(report: &TransferReport) {
    let stats = &report.stats;

    println!("\n{SEPARATOR}");
    println!("Transfer Summary");
    println!("{SEPARATOR}");

    for kind in MediaKind::ALL {
        println!("  {}", format_pass(kind, &stats.pass(kind)));
    }
    if stats.transferred() > 0 {
        println!("  Total size:        {}", format_bytes(stats.total_bytes));
        println!("  Total time:        {}", format_duration(stats.elapsed));
        println!(
            "  Average speed:     {}/s",
            format_bytes(stats.average_speed())
        );
    }

    if !report.failures.is_empty() {
        println!("{SEPARATOR}");
        println!("Failed items:");
        for failure in &report.failures {
            println!(
                "  {} message {}: {}",
                failure.kind, failure.message_id, failure.error
            );
        }
    }

    println!("{SEPARATOR}");
}
