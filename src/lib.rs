//! # Upload Compressor Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per i test
//!
//! ## Architettura dei moduli:
//! - `format_policy`: Estensione → ricetta (Jpeg, Png, WebP, Unsupported)
//! - `image_processor`: Decode, normalizzazione, resize, encode, rename atomico
//! - `png_layout`: Modalità colore PNG che `image` non preserva (palette, grigi 1-4 bit)
//! - `resize`: Calcolo dimensioni bounded e resampling Lanczos3
//! - `file_manager`: Discovery, dimensioni, sostituzione atomica
//! - `optimizer`: Walker del batch e report
//! - `progress`: Statistiche del run e progress bar
//! - `json_output`: Output JSON per uso programmatico
//! - `config`: Policy di compressione e validazione
//! - `confirm`: Conferma interattiva
//! - `error`: Tipi di errore
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use upload_compressor::{Config, MediaOptimizer};
//!
//! let optimizer = MediaOptimizer::new(Config::default())?;
//! let report = optimizer.run(Path::new("/var/www/wp-content/uploads")).await?;
//! println!("{} files processed", report.stats.files_processed);
//! ```

pub mod config;
pub mod confirm;
pub mod error;
pub mod file_manager;
pub mod format_policy;
pub mod image_processor;
pub mod json_output;
pub mod optimizer;
pub mod png_layout;
pub mod progress;
pub mod resize;

pub use config::{CompressionPolicy, Config};
pub use error::CompressError;
pub use format_policy::{classify, FormatClass};
pub use image_processor::{ImageProcessor, TransformOutcome};
pub use optimizer::{MediaOptimizer, Outcome, RunReport};
pub use progress::RunStatistics;
