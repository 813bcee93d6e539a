//! # Progress Tracking Module
//!
//! Unifica statistiche, progress bar e output (umano o JSON) del batch.
//! Ogni file produce esattamente una riga su stdout, con il path relativo alla root.
//! Nei run reali la prima metà della riga (`Processing: ...`) è stampata prima della
//! trasformazione, così un'interruzione lascia visibile il file in corso. Con la barra
//! attiva il file in corso è invece il messaggio della barra e la riga esce intera.

use crate::{
    config::Config,
    file_manager::FileManager,
    format_policy::classify,
    json_output::{FileStatus, JsonMessage},
    optimizer::media_optimizer::{ImageFile, Outcome},
    progress::{ProgressManager, RunStatistics},
};
use std::io::{IsTerminal, Write};
use std::path::Path;
use tracing::warn;

const RULE_WIDTH: usize = 60;

/// Tracker del run: accumula `RunStatistics` e stampa l'avanzamento
pub struct ProgressTracker {
    dry_run: bool,
    json_output: bool,
    stats: RunStatistics,
    would_process: usize,
    /// `Processing: ...` already printed without its newline
    head_open: bool,
    progress_manager: ProgressManager,
}

impl ProgressTracker {
    /// Crea un nuovo tracker per `total_files` file
    pub fn new(config: &Config, total_files: usize) -> Self {
        Self::with_output(config, total_files, Box::new(std::io::stdout()))
    }

    /// Come [`new`](Self::new), con le righe di report scritte su `out`
    pub fn with_output(config: &Config, total_files: usize, out: Box<dyn Write + Send>) -> Self {
        let show_bar = !config.dry_run && !config.json_output && std::io::stderr().is_terminal();
        let progress_manager = if show_bar {
            ProgressManager::new(total_files as u64).with_output(out)
        } else {
            ProgressManager::hidden().with_output(out)
        };

        Self {
            dry_run: config.dry_run,
            json_output: config.json_output,
            stats: RunStatistics::new(),
            would_process: 0,
            head_open: false,
            progress_manager,
        }
    }

    pub fn stats(&self) -> &RunStatistics {
        &self.stats
    }

    /// Intestazione del run
    pub fn emit_start(&mut self, upload_path: &Path, config: &Config, total_files: usize) {
        if self.json_output {
            self.json(JsonMessage::start(
                upload_path.to_path_buf(),
                total_files,
                config.dry_run,
                config.policy,
            ));
            return;
        }

        let prefix = if config.dry_run { "DRY RUN: " } else { "" };
        self.line(&format!("{}Processing images in: {}", prefix, upload_path.display()));
        self.line(&format!(
            "Quality: {}%, Max dimensions: {}x{}",
            config.policy.quality, config.policy.max_width, config.policy.max_height
        ));
        self.line(&"-".repeat(RULE_WIDTH));
    }

    /// Registra un file scoperto in dry run (nessuna trasformazione)
    pub fn record_dry_run(&mut self, file: &ImageFile) {
        self.stats.add_discovered(file.size_before);
        let supported = classify(&file.extension).is_supported();
        if supported {
            self.would_process += 1;
        }

        if self.json_output {
            let status = if supported {
                FileStatus::WouldProcess
            } else {
                FileStatus::WouldSkip
            };
            self.json(JsonMessage::file_complete(
                file.relative_path.clone(),
                status,
                file.size_before,
                None,
                None,
            ));
        } else if supported {
            self.line(&format!(
                "Would process: {} ({})",
                file.relative_path.display(),
                FileManager::format_size(file.size_before)
            ));
        } else {
            self.line(&format!(
                "Would skip: {} ({}, unsupported format .{})",
                file.relative_path.display(),
                FileManager::format_size(file.size_before),
                file.extension
            ));
        }
    }

    /// Annuncia il file prima della trasformazione
    pub fn begin(&mut self, file: &ImageFile) {
        if self.json_output || self.dry_run {
            return;
        }
        if self.progress_manager.is_hidden() {
            self.progress_manager.print(&format!("{} -> ", Self::head(file)));
            self.head_open = true;
        } else {
            self.progress_manager
                .set_message(&format!("Processing {}", file.relative_path.display()));
        }
    }

    /// Registra l'esito di un file trasformato
    pub fn record(&mut self, file: &ImageFile) {
        self.stats.add_discovered(file.size_before);
        let outcome = file.outcome.unwrap_or(Outcome::Failed);
        let size_after = file.size_after.unwrap_or(file.size_before);

        match outcome {
            Outcome::Success => self.stats.add_processed(size_after),
            Outcome::Skipped => self.stats.add_skipped(file.size_before),
            Outcome::Failed => self.stats.add_failed(file.size_before),
        }

        let file_name = file
            .relative_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if self.json_output {
            let (status, compressed_size) = match outcome {
                Outcome::Success => (FileStatus::Success, Some(size_after)),
                Outcome::Skipped => (FileStatus::Skipped, None),
                Outcome::Failed => (FileStatus::Failed, None),
            };
            self.json(JsonMessage::file_complete(
                file.relative_path.clone(),
                status,
                file.size_before,
                compressed_size,
                file.error.clone(),
            ));
            return;
        }

        let (tail, message) = match outcome {
            Outcome::Success => (
                format!(
                    "{} (saved {}, {:.1}%)",
                    FileManager::format_size(size_after),
                    FileManager::format_delta(file.size_before, size_after),
                    FileManager::calculate_reduction(file.size_before, size_after)
                ),
                format!("[OK] {}", file_name),
            ),
            Outcome::Skipped => (
                format!("SKIPPED (unsupported format .{})", file.extension),
                format!("[SKIP] {}", file_name),
            ),
            Outcome::Failed => (
                format!("FAILED: {}", file.error.as_deref().unwrap_or("unknown error")),
                format!("[ERROR] {}", file_name),
            ),
        };

        if std::mem::take(&mut self.head_open) {
            self.line(&tail);
        } else {
            self.line(&format!("{} -> {}", Self::head(file), tail));
        }
        self.progress_manager.update(&message);
    }

    /// Chiude la progress bar e stampa il riepilogo
    pub fn finish(&mut self, duration_seconds: f64) {
        self.progress_manager.finish();

        if self.json_output {
            self.json(JsonMessage::complete(&self.stats, self.dry_run, duration_seconds));
            return;
        }

        self.line("");
        self.line(&"=".repeat(RULE_WIDTH));
        self.line("SUMMARY");
        self.line(&"=".repeat(RULE_WIDTH));

        let lines = if self.dry_run {
            self.stats.format_dry_run_summary(self.would_process)
        } else {
            self.stats.format_summary()
        };
        for line in lines {
            self.line(&line);
        }
    }

    fn line(&mut self, line: &str) {
        self.progress_manager.println(line);
    }

    fn json(&mut self, message: JsonMessage) {
        match message.to_line() {
            Ok(line) => self.line(&line),
            Err(e) => warn!("Cannot serialize JSON message: {}", e),
        }
    }

    fn head(file: &ImageFile) -> String {
        format!(
            "Processing: {} ({})",
            file.relative_path.display(),
            FileManager::format_size(file.size_before)
        )
    }
}
