//! # Error Types Module
//!
//! Questo modulo definisce i tipi di errore custom della libreria.
//!
//! ## Responsabilità:
//! - Definisce `CompressError` per categorizzare gli errori per singolo file
//! - Mantiene il path del file coinvolto insieme alla causa originale
//! - Integra con `thiserror`; il binario li propaga con `anyhow`
//!
//! ## Categorie di errori:
//! - `Io`: Errori di I/O (lettura, scrittura del file temporaneo, rename)
//! - `Image`: Errori di decodifica/codifica del crate `image`
//! - `PngDecode` / `PngEncode`: Errori del crate `png` sulle PNG a palette o a bassa profondità
//! - `WebPEncode`: Errori dell'encoder WebP lossy
//! - `Validation`: Parametri di configurazione non validi
//! - `Join`: Il task bloccante di trasformazione è terminato in modo anomalo
//!
//! ## Esempio:
//! ```rust,ignore
//! return Err(CompressError::Validation("Quality must be between 1 and 100".to_string()));
//! ```

use std::path::PathBuf;

/// Custom error types for image compression
#[derive(thiserror::Error, Debug)]
pub enum CompressError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image processing error on {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("PNG decoding error on {path}: {source}")]
    PngDecode {
        path: PathBuf,
        #[source]
        source: png::DecodingError,
    },

    #[error("PNG encoding error on {path}: {source}")]
    PngEncode {
        path: PathBuf,
        #[source]
        source: png::EncodingError,
    },

    #[error("WebP encoding error on {path}: {message}")]
    WebPEncode { path: PathBuf, message: String },

    #[error("{0}")]
    Validation(String),

    #[error("Transform task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl CompressError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Image {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CompressError>;
