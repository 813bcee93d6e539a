//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e le statistiche di un run.
//!
//! ## Componenti principali:
//! - `ProgressManager`: barra di progresso `indicatif` su stderr
//! - `RunStatistics`: accumulatore monotono dei risultati
//!
//! ## Contabilità:
//! Tre esiti disgiunti, contati separatamente:
//! - **processed**: file ricompressi e sostituiti
//! - **skipped**: formato non supportato, file intatto
//! - **failed**: errore di decode/encode/I/O, file intatto
//!
//! I byte originali sommano ogni file scoperto; i byte compressi sommano la
//! dimensione finale per i file processati e quella invariata per gli altri,
//! così i totali descrivono l'occupazione reale su disco.
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:02:15] [========================================] 150/150 (100%) photo.jpg
//! ```

use crate::file_manager::FileManager;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

/// Manages progress reporting for a compression run.
///
/// The bar draws on stderr; report lines go to `out` (stdout by default).
pub struct ProgressManager {
    bar: ProgressBar,
    out: Box<dyn Write + Send>,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }

        bar.enable_steady_tick(Duration::from_millis(100));

        Self {
            bar,
            out: Box::new(std::io::stdout()),
        }
    }

    /// A manager that never draws anything
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            out: Box::new(std::io::stdout()),
        }
    }

    /// Send report lines to `out` instead of stdout
    pub fn with_output(mut self, out: Box<dyn Write + Send>) -> Self {
        self.out = out;
        self
    }

    pub fn is_hidden(&self) -> bool {
        self.bar.is_hidden()
    }

    /// Print a report line without tearing the bar
    pub fn println(&mut self, line: &str) {
        let out = &mut self.out;
        self.bar.suspend(|| {
            let _ = writeln!(out, "{}", line);
        });
    }

    /// Print the start of a line and flush it, so it is visible while the file is in flight
    pub fn print(&mut self, text: &str) {
        let out = &mut self.out;
        self.bar.suspend(|| {
            let _ = write!(out, "{}", text);
            let _ = out.flush();
        });
    }

    pub fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish and clear the bar, the summary is printed separately
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// Statistics accumulated over one run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunStatistics {
    pub files_discovered: usize,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub total_original_bytes: u64,
    pub total_compressed_bytes: u64,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_discovered(&mut self, original_size: u64) {
        self.files_discovered += 1;
        self.total_original_bytes += original_size;
    }

    pub fn add_processed(&mut self, new_size: u64) {
        self.files_processed += 1;
        self.total_compressed_bytes += new_size;
    }

    pub fn add_skipped(&mut self, original_size: u64) {
        self.files_skipped += 1;
        self.total_compressed_bytes += original_size;
    }

    pub fn add_failed(&mut self, original_size: u64) {
        self.files_failed += 1;
        self.total_compressed_bytes += original_size;
    }

    /// Bytes saved; negative when re-encoding grew the total
    pub fn bytes_saved(&self) -> i64 {
        self.total_original_bytes as i64 - self.total_compressed_bytes as i64
    }

    pub fn overall_reduction_percent(&self) -> f64 {
        FileManager::calculate_reduction(self.total_original_bytes, self.total_compressed_bytes)
    }

    /// Summary lines for a real run
    pub fn format_summary(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Total files found: {}", self.files_discovered),
            format!("Successfully processed: {}", self.files_processed),
            format!("Skipped (unsupported format): {}", self.files_skipped),
            format!("Failed: {}", self.files_failed),
            format!(
                "Original total size: {}",
                FileManager::format_size(self.total_original_bytes)
            ),
            format!(
                "Compressed total size: {}",
                FileManager::format_size(self.total_compressed_bytes)
            ),
        ];
        if self.total_original_bytes > 0 {
            lines.push(format!(
                "Total savings: {} ({:.1}%)",
                FileManager::format_delta(self.total_original_bytes, self.total_compressed_bytes),
                self.overall_reduction_percent()
            ));
        }
        lines
    }

    /// Summary lines for a dry run: discovery counts only
    pub fn format_dry_run_summary(&self, would_process: usize) -> Vec<String> {
        vec![
            format!("Total files found: {}", self.files_discovered),
            format!("Would process: {}", would_process),
            format!(
                "Would skip (unsupported format): {}",
                self.files_discovered - would_process
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disjoint_outcomes() {
        let mut stats = RunStatistics::new();
        stats.add_discovered(1000);
        stats.add_processed(400);
        stats.add_discovered(300);
        stats.add_skipped(300);
        stats.add_discovered(200);
        stats.add_failed(200);

        assert_eq!(stats.files_discovered, 3);
        assert_eq!(stats.files_processed, 1);
        assert_eq!(stats.files_skipped, 1);
        assert_eq!(stats.files_failed, 1);
        assert_eq!(
            stats.files_processed + stats.files_skipped + stats.files_failed,
            stats.files_discovered
        );
        assert_eq!(stats.total_original_bytes, 1500);
        assert_eq!(stats.total_compressed_bytes, 900);
        assert_eq!(stats.bytes_saved(), 600);
        assert!((stats.overall_reduction_percent() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_growth_is_negative_saving() {
        let mut stats = RunStatistics::new();
        stats.add_discovered(100);
        stats.add_processed(150);
        assert_eq!(stats.bytes_saved(), -50);
        assert!(stats.overall_reduction_percent() < 0.0);
    }

    #[test]
    fn test_format_summary() {
        let mut stats = RunStatistics::new();
        stats.add_discovered(2048);
        stats.add_processed(1024);

        let summary = stats.format_summary();
        assert!(summary.contains(&"Total files found: 1".to_string()));
        assert!(summary.contains(&"Successfully processed: 1".to_string()));
        assert!(summary.contains(&"Total savings: 1.00 KB (50.0%)".to_string()));
    }

    #[test]
    fn test_empty_summary_has_no_savings_line() {
        let summary = RunStatistics::new().format_summary();
        assert!(summary.iter().all(|line| !line.starts_with("Total savings")));
    }

    #[test]
    fn test_dry_run_summary() {
        let mut stats = RunStatistics::new();
        stats.add_discovered(10);
        stats.add_discovered(10);
        stats.add_discovered(10);

        let summary = stats.format_dry_run_summary(2);
        assert_eq!(
            summary,
            vec![
                "Total files found: 3".to_string(),
                "Would process: 2".to_string(),
                "Would skip (unsupported format): 1".to_string(),
            ]
        );
        assert!(summary.iter().all(|line| !line.contains("savings")));
    }
}
