use super::DetectionRow;
use crate::aggregator::ScanObserver;
use crate::model::{Detection, ProgressUpdate, ScanPhase, ScanReport};
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct DetectionTableRow {
    #[tabled(rename = "Extension ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Overview")]
    overview: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<DetectionRow> for DetectionTableRow {
    fn from(row: DetectionRow) -> Self {
        Self {
            id: row.id,
            name: truncate(&row.name, 40),
            category: truncate(&row.category, 24),
            overview: truncate(&row.overview, 60),
            status: "\x1b[32mDetected\x1b[0m".to_string(),
        }
    }
}

/// Live status display for interactive scans.
///
/// Shows a spinner while datasets load, then a progress bar with the running
/// detected count. Detections are printed above the bar as they arrive.
pub struct TerminalObserver {
    bar: ProgressBar,
}

impl TerminalObserver {
    pub fn new(interactive: bool) -> Self {
        let bar = if interactive {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            ProgressBar::hidden()
        };

        Self { bar }
    }
}

impl ScanObserver for TerminalObserver {
    fn on_phase(&self, phase: ScanPhase) {
        match phase {
            ScanPhase::Idle => {}
            ScanPhase::Loading => self.bar.set_message("Loading extension signatures"),
            ScanPhase::Scanning { total } => {
                self.bar.set_style(
                    ProgressStyle::default_bar()
                        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("#>-"),
                );
                self.bar.set_length(total as u64);
                self.bar.set_position(0);
                self.bar.set_message("Scanning for installed extensions");
            }
            ScanPhase::Complete => self.bar.finish_with_message("Scan complete."),
            ScanPhase::Failed => self.bar.abandon_with_message("Unable to complete scan."),
        }
    }

    fn on_progress(&self, update: ProgressUpdate) {
        self.bar.set_position(update.scanned as u64);
        self.bar.set_message(format!("{} detected", update.detected));
    }

    fn on_detection(&self, detection: &Detection) {
        let row = DetectionRow::from(detection);
        self.bar
            .println(format!("  Detected {} ({})", row.name, row.id));
    }
}

pub fn print_cli_table(report: &ScanReport) -> Result<()> {
    println!();
    println!(
        "Scan completed at: {}",
        report.scan_time.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();

    if report.detections.is_empty() {
        println!("No extensions detected.");
    } else {
        println!("Detected {} extensions:", report.detections.len());
        println!();

        let rows: Vec<DetectionTableRow> = report
            .detections
            .iter()
            .map(|d| DetectionRow::from(d).into())
            .collect();

        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{}", table);
    }

    println!();
    print_summary(report);

    Ok(())
}

fn print_summary(report: &ScanReport) {
    let summary = &report.summary;
    let unlisted = report.detections.iter().filter(|d| !d.is_listed()).count();

    println!("Summary:");
    println!("  Extensions in dataset: {}", summary.total);
    println!("  Scanned: {} ({}%)", summary.scanned, summary.percent());
    if unlisted > 0 {
        println!(
            "  Detected: {} ({} without metadata)",
            summary.detected, unlisted
        );
    } else {
        println!("  Detected: {}", summary.detected);
    }
    println!("  Duration: {:.1}s", report.duration.as_secs_f64());
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
