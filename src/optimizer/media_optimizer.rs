//! # Media Optimizer Main Orchestrator
//!
//! Orchestratore del batch: discovery → trasformazione sequenziale → statistiche.
//!
//! ## Flusso di esecuzione:
//! 1. **Discovery**: tutti i file con estensione immagine riconosciuta sotto la root
//! 2. **Per file**: dimensione iniziale, poi (se non dry run) trasformazione in place
//! 3. **Tracking**: esito e dimensione finale registrati in `RunStatistics`
//! 4. **Report**: una riga per file e un riepilogo finale
//!
//! ## Concorrenza:
//! Un file alla volta. Ogni trasformazione gira su `spawn_blocking` ma viene
//! attesa prima di passare al file successivo.
//!
//! ## Error handling:
//! Un errore su un singolo file diventa `Outcome::Failed` e non interrompe il batch.

use crate::{
    config::Config,
    file_manager::FileManager,
    image_processor::{ImageProcessor, TransformOutcome},
    optimizer::progress_tracker::ProgressTracker,
    progress::RunStatistics,
};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Final state of a file after a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Skipped,
    Failed,
}

/// A discovered image file and what happened to it
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub path: PathBuf,
    /// Path relative to the upload root, used in every report line
    pub relative_path: PathBuf,
    /// Lower-cased extension without the dot
    pub extension: String,
    pub size_before: u64,
    /// `None` until processed
    pub size_after: Option<u64>,
    /// `None` until processed, stays `None` in dry run
    pub outcome: Option<Outcome>,
    pub error: Option<String>,
}

impl ImageFile {
    fn discovered(path: PathBuf, root: &Path, size_before: u64) -> Self {
        let relative_path = FileManager::relative_path(&path, root).to_path_buf();
        let extension = FileManager::extension_of(&path).unwrap_or_default();
        Self {
            path,
            relative_path,
            extension,
            size_before,
            size_after: None,
            outcome: None,
            error: None,
        }
    }

    fn succeeded(&mut self, compressed_size: u64) {
        self.size_after = Some(compressed_size);
        self.outcome = Some(Outcome::Success);
    }

    fn skipped(&mut self) {
        self.size_after = Some(self.size_before);
        self.outcome = Some(Outcome::Skipped);
    }

    fn failed(&mut self, error: String) {
        self.size_after = Some(self.size_before);
        self.outcome = Some(Outcome::Failed);
        self.error = Some(error);
    }
}

/// Everything a run produced
#[derive(Debug)]
pub struct RunReport {
    pub stats: RunStatistics,
    pub files: Vec<ImageFile>,
}

/// Batch walker over an upload directory
pub struct MediaOptimizer {
    config: Config,
    processor: ImageProcessor,
}

impl MediaOptimizer {
    /// Crea nuova istanza dell'ottimizzatore
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let processor = ImageProcessor::new(config.policy);
        Ok(Self { config, processor })
    }

    /// Esegue il processo di compressione su tutta la directory
    pub async fn run(&self, upload_path: &Path) -> Result<RunReport> {
        let start_time = Instant::now();

        let paths = FileManager::find_image_files(upload_path);
        info!("Found {} image files under {}", paths.len(), upload_path.display());
        if self.config.dry_run {
            info!("🧪 Dry run mode: No files will be modified");
        }

        let mut tracker = ProgressTracker::new(&self.config, paths.len());
        tracker.emit_start(upload_path, &self.config, paths.len());

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let file = self.handle_file(path, upload_path, &mut tracker).await;
            files.push(file);
        }

        tracker.finish(start_time.elapsed().as_secs_f64());
        info!(
            "Run finished in {:?}: {} processed, {} skipped, {} failed",
            start_time.elapsed(),
            tracker.stats().files_processed,
            tracker.stats().files_skipped,
            tracker.stats().files_failed
        );

        Ok(RunReport {
            stats: tracker.stats().clone(),
            files,
        })
    }

    async fn handle_file(
        &self,
        path: PathBuf,
        upload_path: &Path,
        tracker: &mut ProgressTracker,
    ) -> ImageFile {
        let size_before = match FileManager::get_file_size(&path).await {
            Ok(size) => size,
            Err(e) => {
                warn!("Cannot read size of {}: {}", path.display(), e);
                let mut file = ImageFile::discovered(path, upload_path, 0);
                if !self.config.dry_run {
                    file.failed(e.to_string());
                    tracker.record(&file);
                } else {
                    tracker.record_dry_run(&file);
                }
                return file;
            }
        };

        let mut file = ImageFile::discovered(path, upload_path, size_before);

        if self.config.dry_run {
            tracker.record_dry_run(&file);
            return file;
        }

        tracker.begin(&file);
        match self.processor.process(&file.path).await {
            Ok(TransformOutcome::Compressed {
                compressed_size,
                width,
                height,
                ..
            }) => {
                debug!(
                    "Compressed {} to {}x{}",
                    file.relative_path.display(),
                    width,
                    height
                );
                file.succeeded(compressed_size);
            }
            Ok(TransformOutcome::Skipped { .. }) => file.skipped(),
            Err(e) => {
                warn!("Error compressing {}: {}", file.path.display(), e);
                file.failed(e.to_string());
            }
        }

        tracker.record(&file);
        file
    }
}
