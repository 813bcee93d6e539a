//! # Image Resize Module
//!
//! Questo modulo gestisce il ridimensionamento "bounded" delle immagini decodificate.
//!
//! ## Caratteristiche
//! - **Solo riduzione**: un'immagine che sta già nei limiti non viene mai toccata
//! - **Aspect ratio esatto**: la dimensione vincolante diventa esattamente il massimo,
//!   l'altra viene scalata in proporzione con arrotondamento half-up
//! - **Qualità**: filtro Lanczos3 (anti-aliased) per i pixel a colori reali;
//!   nearest-neighbor solo sugli indici delle PNG a palette, dove interpolare non ha senso
//!
//! ## Esempio
//! ```text
//! 3000x2000, limiti 1920x1080 → 1620x1080 (altezza vincolante)
//!  800x600,  limiti 1920x1080 →  800x600  (invariata)
//! ```

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use tracing::debug;

/// Resampling filters available for downscaling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResizeAlgorithm {
    /// Lanczos3 - best quality for downscaling
    #[default]
    Lanczos,
    /// Copies source samples, for palette indices
    Nearest,
}

impl ResizeAlgorithm {
    pub fn to_filter_type(self) -> FilterType {
        match self {
            ResizeAlgorithm::Lanczos => FilterType::Lanczos3,
            ResizeAlgorithm::Nearest => FilterType::Nearest,
        }
    }
}

/// Compute the dimensions that fit `width`x`height` inside the bounds.
///
/// Returns `None` when the image already fits, so callers never upscale.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> Option<(u32, u32)> {
    if width <= max_width && height <= max_height {
        return None;
    }
    if width == 0 || height == 0 {
        return None;
    }

    let (w, h) = (width as u64, height as u64);
    let (mw, mh) = (max_width as u64, max_height as u64);

    // Compare mw/w against mh/h without floating point.
    let (new_w, new_h) = if mw * h <= mh * w {
        let scaled_h = (h * mw + w / 2) / w;
        (mw, scaled_h.clamp(1, mh))
    } else {
        let scaled_w = (w * mh + h / 2) / h;
        (scaled_w.clamp(1, mw), mh)
    };

    Some((new_w as u32, new_h as u32))
}

/// Downscale `image` to fit the bounds, returning it unchanged when it already fits.
pub fn downscale(
    image: DynamicImage,
    max_width: u32,
    max_height: u32,
    algorithm: ResizeAlgorithm,
) -> DynamicImage {
    let (width, height) = image.dimensions();
    match fit_within(width, height, max_width, max_height) {
        Some((new_width, new_height)) => {
            debug!(
                "Resizing {}x{} -> {}x{} ({:?})",
                width, height, new_width, new_height, algorithm
            );
            image.resize_exact(new_width, new_height, algorithm.to_filter_type())
        }
        None => image,
    }
}
