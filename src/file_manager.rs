//! # File Management Module
//!
//! Questo modulo gestisce tutte le operazioni sui file e la discovery delle immagini.
//!
//! ## Responsabilità:
//! - Discovery ricorsiva di file immagine in una directory
//! - Sostituzione atomica di un file con la sua versione compressa
//! - Utilità per dimensioni, percentuali e path relativi
//! - Formattazione human-readable delle dimensioni
//!
//! ## Formati riconosciuti:
//! JPG, JPEG, PNG, GIF, BMP, TIFF, WebP. È un superset di ciò che viene
//! effettivamente compresso (vedi [`crate::format_policy`]): GIF, BMP e TIFF
//! vengono contati e riportati come saltati invece di essere invisibili.
//!
//! ## Sicurezza operazioni:
//! - Il nuovo contenuto viene scritto in un file temporaneo nella stessa directory
//! - `fsync` prima del rename, poi rename atomico sopra l'originale
//! - Il file temporaneo eredita i permessi dell'originale
//! - In caso di errore il temporaneo viene rimosso e l'originale resta intatto
//!
//! ## Esempio:
//! ```rust,ignore
//! let files = FileManager::find_image_files(Path::new("/var/www/wp-content/uploads"));
//! for file in files {
//!     println!("{}", FileManager::relative_path(&file, root).display());
//! }
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;
use walkdir::WalkDir;

/// Extensions counted as images during discovery.
pub const RECOGNIZED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp"];

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Get the size of a file in bytes
    pub async fn get_file_size(path: &Path) -> std::io::Result<u64> {
        Ok(tokio::fs::metadata(path).await?.len())
    }

    /// Find all recognized image files under a directory, recursively
    pub fn find_image_files(root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for entry in WalkDir::new(root).into_iter() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if Self::is_recognized_image(path) {
                files.push(path.to_path_buf());
            }
        }

        files
    }

    /// Check if a file extension is in the recognition set
    pub fn is_recognized_image(path: &Path) -> bool {
        Self::extension_of(path)
            .map(|ext| RECOGNIZED_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    /// Lower-cased extension without the dot
    pub fn extension_of(path: &Path) -> Option<String> {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    /// Path relative to `root`, or the path itself if it is outside `root`
    pub fn relative_path<'a>(path: &'a Path, root: &Path) -> &'a Path {
        path.strip_prefix(root).unwrap_or(path)
    }

    /// Replace `target` with `contents` through a temp file and a rename.
    ///
    /// Readers of `target` observe either the old or the new contents, never
    /// a partial write.
    pub fn replace_atomically(target: &Path, contents: &[u8]) -> std::io::Result<()> {
        let parent = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let permissions = std::fs::metadata(target)?.permissions();

        let mut staged = NamedTempFile::new_in(parent)?;
        staged.write_all(contents)?;
        staged.as_file().sync_all()?;
        std::fs::set_permissions(staged.path(), permissions)?;

        debug!(
            "Renaming {} over {}",
            staged.path().display(),
            target.display()
        );
        staged.persist(target).map_err(|e| e.error)?;
        Ok(())
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Human-readable signed delta, e.g. a file that grew by 2 KB is "-2.00 KB"
    pub fn format_delta(original_size: u64, new_size: u64) -> String {
        if new_size > original_size {
            format!("-{}", Self::format_size(new_size - original_size))
        } else {
            Self::format_size(original_size - new_size)
        }
    }

    /// Calculate percentage reduction
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}
