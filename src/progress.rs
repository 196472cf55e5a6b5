//! Progress display module
//!
//! Provides styled status lines, progress bars and run statistics for the
//! pentesting aesthetic.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Print the application banner
pub fn print_banner() {
    let banner = r#"
╔══════════════════════════════════════════════════════════════════════════════╗
║                                                                              ║
║   ██╗    ██╗ ██████╗ ██████╗ ██████╗ ███████╗                               ║
║   ██║    ██║██╔═══██╗██╔══██╗██╔══██╗╚══███╔╝                               ║
║   ██║ █╗ ██║██║   ██║██████╔╝██║  ██║  ███╔╝                                ║
║   ██║███╗██║██║   ██║██╔══██╗██║  ██║ ███╔╝                                 ║
║   ╚███╔███╔╝╚██████╔╝██║  ██║██████╔╝███████╗                               ║
║    ╚══╝╚══╝  ╚═════╝ ╚═╝  ╚═╝╚═════╝ ╚══════╝                               ║
║                                                                              ║
║                 Rule Expansion · Combination · Merging                       ║
║                         For Penetration Testing                              ║
║                                                              v1.0.0          ║
╚══════════════════════════════════════════════════════════════════════════════╝
"#;

    println!("{}", banner.green());
}

/// Print a section header
pub fn print_header(text: &str) {
    println!("\n{} {}", "▶".green(), text.green().bold());
}

/// Print an info message
pub fn print_info(text: &str) {
    println!("  {} {}", "ℹ".cyan(), text);
}

/// Print an error message
pub fn print_error(text: &str) {
    eprintln!("  {} {}", "✖".red(), text.red());
}

/// Print a bullet point
pub fn print_bullet(text: &str) {
    println!("  {} {}", "•".green(), text);
}

/// Create a styled progress bar, hidden in quiet mode
pub fn create_progress_bar(total: u64, msg: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.green/dim}] {pos}/{len} ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    pb
}

/// Counters for one orchestration run
#[derive(Debug)]
pub struct RunStats {
    pub rules_expanded: AtomicU64,
    pub rules_skipped: AtomicU64,
    pub combinations_run: AtomicU64,
    pub combinations_skipped: AtomicU64,
    pub merges: AtomicU64,
    pub diffs: AtomicU64,
    pub scratch_purged: AtomicU64,
    pub start_time: Instant,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            rules_expanded: AtomicU64::new(0),
            rules_skipped: AtomicU64::new(0),
            combinations_run: AtomicU64::new(0),
            combinations_skipped: AtomicU64::new(0),
            merges: AtomicU64::new(0),
            diffs: AtomicU64::new(0),
            scratch_purged: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn add_rule_expanded(&self) {
        self.rules_expanded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_rule_skipped(&self) {
        self.rules_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_combination_run(&self) {
        self.combinations_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_combination_skipped(&self) {
        self.combinations_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_merge(&self) {
        self.merges.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_diff(&self) {
        self.diffs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_scratch_purged(&self, count: u64) {
        self.scratch_purged.fetch_add(count, Ordering::Relaxed);
    }

    pub fn get_rules_expanded(&self) -> u64 {
        self.rules_expanded.load(Ordering::Relaxed)
    }

    pub fn get_rules_skipped(&self) -> u64 {
        self.rules_skipped.load(Ordering::Relaxed)
    }

    pub fn get_combinations_run(&self) -> u64 {
        self.combinations_run.load(Ordering::Relaxed)
    }

    pub fn get_combinations_skipped(&self) -> u64 {
        self.combinations_skipped.load(Ordering::Relaxed)
    }

    pub fn get_merges(&self) -> u64 {
        self.merges.load(Ordering::Relaxed)
    }

    pub fn get_diffs(&self) -> u64 {
        self.diffs.load(Ordering::Relaxed)
    }

    pub fn get_scratch_purged(&self) -> u64 {
        self.scratch_purged.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Print final statistics
    pub fn print_summary(&self) {
        println!();
        println!("{}", "═".repeat(60).green());
        println!("{}", "                    PIPELINE COMPLETE".green().bold());
        println!("{}", "═".repeat(60).green());
        println!();

        println!(
            "  {} {} ({} skipped)",
            "Rules expanded: ".green(),
            self.get_rules_expanded(),
            self.get_rules_skipped()
        );
        println!(
            "  {} {} ({} skipped)",
            "Combinations:   ".green(),
            self.get_combinations_run(),
            self.get_combinations_skipped()
        );
        println!("  {} {}", "Merges:         ".green(), self.get_merges());
        println!("  {} {}", "Diffs:          ".green(), self.get_diffs());
        println!(
            "  {} {}",
            "Scratch purged: ".yellow(),
            self.get_scratch_purged()
        );
        println!();
        println!(
            "  {} {}",
            "Duration:       ".green(),
            format_duration(self.elapsed())
        );
        println!();
        println!("{}", "═".repeat(60).green());
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else if secs < 3600 {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    } else {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        format!("{}h {}m", hours, mins)
    }
}
