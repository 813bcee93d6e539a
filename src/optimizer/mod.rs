//! # Optimizer Module
//!
//! Walker del batch, separato in sottomoduli:
//! - `media_optimizer`: discovery e trasformazione sequenziale dei file
//! - `progress_tracker`: righe per file, statistiche e riepilogo finale

pub mod media_optimizer;
pub mod progress_tracker;

pub use media_optimizer::{ImageFile, MediaOptimizer, Outcome, RunReport};
pub use progress_tracker::ProgressTracker;
