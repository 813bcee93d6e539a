//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON (`--json`), una riga per messaggio su stdout.
//! La scrittura passa dal `ProgressTracker`, che possiede il canale di output.
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio del run con configurazione e numero di file trovati
//! - `file_complete`: Esito di un singolo file
//! - `complete`: Fine del run con statistiche finali

use crate::config::CompressionPolicy;
use crate::progress::RunStatistics;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome label carried by `file_complete`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Success,
    Skipped,
    Failed,
    WouldProcess,
    WouldSkip,
}

/// Tipo di messaggio JSON
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum JsonMessage {
    /// Inizio del run
    #[serde(rename = "start")]
    Start {
        upload_path: PathBuf,
        total_files: usize,
        dry_run: bool,
        policy: CompressionPolicy,
    },

    /// Fine elaborazione di un file
    #[serde(rename = "file_complete")]
    FileComplete {
        path: PathBuf,
        status: FileStatus,
        original_size: u64,
        compressed_size: Option<u64>,
        reduction_percent: Option<f64>,
        error: Option<String>,
    },

    /// Run completato
    #[serde(rename = "complete")]
    Complete {
        dry_run: bool,
        #[serde(flatten)]
        stats: RunStatistics,
        bytes_saved: i64,
        duration_seconds: f64,
    },
}

impl JsonMessage {
    /// Serializza il messaggio come singola riga JSON
    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn start(upload_path: PathBuf, total_files: usize, dry_run: bool, policy: CompressionPolicy) -> Self {
        Self::Start {
            upload_path,
            total_files,
            dry_run,
            policy,
        }
    }

    pub fn file_complete(
        path: PathBuf,
        status: FileStatus,
        original_size: u64,
        compressed_size: Option<u64>,
        error: Option<String>,
    ) -> Self {
        let reduction_percent = compressed_size
            .map(|size| crate::file_manager::FileManager::calculate_reduction(original_size, size));
        Self::FileComplete {
            path,
            status,
            original_size,
            compressed_size,
            reduction_percent,
            error,
        }
    }

    pub fn complete(stats: &RunStatistics, dry_run: bool, duration_seconds: f64) -> Self {
        Self::Complete {
            dry_run,
            bytes_saved: if dry_run { 0 } else { stats.bytes_saved() },
            stats: stats.clone(),
            duration_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_complete_shape() {
        let msg = JsonMessage::file_complete(
            PathBuf::from("2024/a.jpg"),
            FileStatus::Success,
            200,
            Some(50),
            None,
        );
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "file_complete");
        assert_eq!(value["status"], "success");
        assert_eq!(value["path"], "2024/a.jpg");
        assert_eq!(value["compressed_size"], 50);
        assert_eq!(value["reduction_percent"], 75.0);
        assert!(value["error"].is_null());
    }

    #[test]
    fn test_complete_flattens_stats() {
        let mut stats = RunStatistics::new();
        stats.add_discovered(100);
        stats.add_processed(60);

        let value = serde_json::to_value(JsonMessage::complete(&stats, false, 1.5)).unwrap();
        assert_eq!(value["type"], "complete");
        assert_eq!(value["files_discovered"], 1);
        assert_eq!(value["files_processed"], 1);
        assert_eq!(value["bytes_saved"], 40);
    }

    #[test]
    fn test_start_carries_policy() {
        let msg = JsonMessage::start(PathBuf::from("/up"), 3, true, CompressionPolicy::default());
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "start");
        assert!(!msg.to_line().unwrap().contains('\n'));
        assert_eq!(value["policy"]["max_width"], 1920);
        assert_eq!(value["status"], serde_json::Value::Null);
        assert_eq!(
            serde_json::to_value(FileStatus::WouldSkip).unwrap(),
            "would_skip"
        );
    }
}
