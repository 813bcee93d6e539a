//! # Image Processing Module
//!
//! Questo modulo implementa la pipeline per singolo file:
//! decode → normalizzazione colore → orientamento EXIF → resize bounded → encode → rename atomico.
//!
//! ## Formati Supportati
//!
//! | Formato | Normalizzazione              | Encode                          |
//! |---------|------------------------------|---------------------------------|
//! | JPEG    | alpha appiattito su bianco, RGB8 | `JpegEncoder` a `quality`   |
//! | PNG     | modalità colore preservata   | `PngEncoder` Best + Adaptive    |
//! | PNG a palette / grigi 1-4 bit | indici o livelli originali | `png::Encoder` Best (vedi [`crate::png_layout`]) |
//! | WebP    | RGB8 o RGBA8 (alpha preservato) | `webp::Encoder` lossy a `quality` |
//! | Altri   | nessuna (file intatto)       | -                               |
//!
//! ## Scrittura sicura
//!
//! L'output viene codificato interamente in memoria, scritto in un file temporaneo
//! nella stessa directory e rinominato sopra l'originale solo a encode riuscito
//! (vedi [`FileManager::replace_atomically`]). Un errore a metà lascia l'originale intatto.
//!
//! ## Metadata
//!
//! Nessun metadata viene riscritto: i pixel vengono ruotati secondo il tag EXIF
//! Orientation, e il file finale non contiene più alcun tag.
//!
//! ## Esempio
//! ```rust,ignore
//! let processor = ImageProcessor::new(CompressionPolicy::default());
//! match processor.process(Path::new("/uploads/2024/photo.jpg")).await? {
//!     TransformOutcome::Compressed { compressed_size, .. } => println!("{}", compressed_size),
//!     TransformOutcome::Skipped { extension } => println!("skipped .{}", extension),
//! }
//! ```

use crate::config::CompressionPolicy;
use crate::error::{CompressError, Result};
use crate::file_manager::FileManager;
use crate::format_policy::{classify_path, FormatClass};
use crate::png_layout::{self, PngLayout};
use crate::resize::{downscale, ResizeAlgorithm};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::metadata::Orientation;
use image::{ColorType, DynamicImage, GenericImageView, ImageDecoder, ImageReader, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A decoded image, owned by a single transform call.
pub struct DecodedImage {
    /// Pixel data as produced by the decoder
    pub image: DynamicImage,
    /// Color mode before any normalization
    pub color: ColorType,
    pub width: u32,
    pub height: u32,
    /// EXIF orientation reported by the container
    pub orientation: Orientation,
}

/// Result of a successful transform call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutcome {
    /// File re-encoded and replaced in place
    Compressed {
        original_size: u64,
        compressed_size: u64,
        width: u32,
        height: u32,
    },
    /// Extension not in the whitelist, file untouched
    Skipped { extension: String },
}

/// Recompresses single image files in place.
///
/// The processor is immutable: the same [`CompressionPolicy`] applies to every
/// file handed to it during a run.
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    policy: CompressionPolicy,
}

impl ImageProcessor {
    pub fn new(policy: CompressionPolicy) -> Self {
        Self { policy }
    }

    /// Transforms one file on the blocking thread pool.
    ///
    /// The future resolves only once the file has been fully handled, so a caller
    /// awaiting each file in turn never has two files in flight.
    pub async fn process(&self, path: &Path) -> Result<TransformOutcome> {
        let processor = self.clone();
        let path: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || processor.process_blocking(&path)).await?
    }

    /// Synchronous version of [`process`](Self::process).
    pub fn process_blocking(&self, path: &Path) -> Result<TransformOutcome> {
        let class = classify_path(path);
        if !class.is_supported() {
            let extension = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            info!("Skipping unsupported format: .{} ({})", extension, path.display());
            return Ok(TransformOutcome::Skipped { extension });
        }

        let bytes = std::fs::read(path).map_err(|e| CompressError::io(path, e))?;
        let original_size = bytes.len() as u64;
        let start_time = std::time::Instant::now();

        let layout = match class {
            FormatClass::Png => png_layout::sniff(&bytes, path)?,
            _ => None,
        };

        let (encoded, (width, height)) = match &layout {
            Some(indexed @ PngLayout::Indexed { .. }) => self.reencode_indexed(indexed, &bytes, path)?,
            _ => {
                let decoded = Self::decode_bytes(&bytes, path)?;
                debug!(
                    "Decoded {} as {:?} {}x{} (orientation {:?})",
                    path.display(),
                    decoded.color,
                    decoded.width,
                    decoded.height,
                    decoded.orientation
                );
                let image = self.normalize(class, decoded);
                let dimensions = image.dimensions();
                let encoded = match (&layout, image.as_luma8()) {
                    (Some(PngLayout::LowDepthGray { bit_depth }), Some(luma)) => {
                        let gray = PngLayout::LowDepthGray {
                            bit_depth: *bit_depth,
                        };
                        png_layout::encode(&gray, &png_layout::requantize(luma, *bit_depth), path)?
                    }
                    _ => self.encode(class, &image, path)?,
                };
                (encoded, dimensions)
            }
        };
        drop(bytes);

        FileManager::replace_atomically(path, &encoded).map_err(|e| CompressError::io(path, e))?;

        let compressed_size = std::fs::metadata(path)
            .map_err(|e| CompressError::io(path, e))?
            .len();

        debug!(
            "{} compressed in {:?}: {} -> {} bytes",
            class.name(),
            start_time.elapsed(),
            original_size,
            compressed_size
        );

        Ok(TransformOutcome::Compressed {
            original_size,
            compressed_size,
            width,
            height,
        })
    }

    /// Decodes a file, detecting the container from its content.
    pub fn decode(path: &Path) -> Result<DecodedImage> {
        let bytes = std::fs::read(path).map_err(|e| CompressError::io(path, e))?;
        Self::decode_bytes(&bytes, path)
    }

    fn decode_bytes(bytes: &[u8], path: &Path) -> Result<DecodedImage> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| CompressError::io(path, e))?;

        let mut decoder = reader.into_decoder().map_err(|e| CompressError::image(path, e))?;
        let orientation = decoder.orientation().unwrap_or_else(|e| {
            debug!("Unreadable orientation in {}: {}", path.display(), e);
            Orientation::NoTransforms
        });

        let image = DynamicImage::from_decoder(decoder).map_err(|e| CompressError::image(path, e))?;
        let (width, height) = image.dimensions();

        Ok(DecodedImage {
            color: image.color(),
            image,
            width,
            height,
            orientation,
        })
    }

    /// Palette PNGs are transformed on their indices: orientation, then a
    /// nearest-neighbor downscale, so every output pixel is an existing palette entry.
    fn reencode_indexed(
        &self,
        layout: &PngLayout,
        bytes: &[u8],
        path: &Path,
    ) -> Result<(Vec<u8>, (u32, u32))> {
        let indices = png_layout::decode_indices(bytes, path)?;
        let orientation = read_orientation(bytes);
        debug!(
            "Decoded {} as indexed {}x{} (orientation {:?})",
            path.display(),
            indices.width(),
            indices.height(),
            orientation
        );

        let mut image = DynamicImage::ImageLuma8(indices);
        image.apply_orientation(orientation);
        let image = downscale(
            image,
            self.policy.max_width,
            self.policy.max_height,
            ResizeAlgorithm::Nearest,
        );

        let dimensions = image.dimensions();
        let encoded = png_layout::encode(layout, &image.into_luma8(), path)?;
        Ok((encoded, dimensions))
    }

    /// Applies color normalization, orientation and bounded resize for `class`.
    pub fn normalize(&self, class: FormatClass, decoded: DecodedImage) -> DynamicImage {
        let DecodedImage {
            image, orientation, ..
        } = decoded;

        let mut image = match class {
            FormatClass::Jpeg => to_opaque_rgb(image),
            FormatClass::Png => to_png_compatible(image),
            FormatClass::WebP => to_webp_compatible(image),
            FormatClass::Unsupported => image,
        };

        // Orientation first, so the bounds apply to the displayed image.
        image.apply_orientation(orientation);

        downscale(
            image,
            self.policy.max_width,
            self.policy.max_height,
            ResizeAlgorithm::Lanczos,
        )
    }

    /// Encodes `image` in the container of `class`.
    ///
    /// JPEG goes through the baseline encoder of `image`, which writes the
    /// standard Huffman tables: there is no optimized-table pass.
    pub fn encode(&self, class: FormatClass, image: &DynamicImage, path: &Path) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        match class {
            FormatClass::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut buffer, self.policy.quality);
                image
                    .write_with_encoder(encoder)
                    .map_err(|e| CompressError::image(path, e))?;
            }
            FormatClass::Png => {
                let encoder = PngEncoder::new_with_quality(
                    &mut buffer,
                    CompressionType::Best,
                    PngFilterType::Adaptive,
                );
                image
                    .write_with_encoder(encoder)
                    .map_err(|e| CompressError::image(path, e))?;
            }
            FormatClass::WebP => {
                let webp_error = |message: String| CompressError::WebPEncode {
                    path: path.to_path_buf(),
                    message,
                };
                let encoder =
                    webp::Encoder::from_image(image).map_err(|e| webp_error(e.to_string()))?;
                // libwebp rejects e.g. sides above 16383 px
                let memory = encoder
                    .encode_simple(false, self.policy.quality as f32)
                    .map_err(|e| webp_error(format!("{:?}", e)))?;
                buffer.extend_from_slice(&memory);
            }
            FormatClass::Unsupported => {
                return Err(CompressError::Validation(format!(
                    "No encoder for unsupported file: {}",
                    path.display()
                )));
            }
        }
        Ok(buffer)
    }
}

fn read_orientation(bytes: &[u8]) -> Orientation {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()
        .and_then(|reader| reader.into_decoder().ok())
        .and_then(|mut decoder| decoder.orientation().ok())
        .unwrap_or(Orientation::NoTransforms)
}

/// Composites an image with alpha onto opaque white.
pub fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (src, dst) in rgba.pixels().zip(out.pixels_mut()) {
        let alpha = src[3] as u32;
        for channel in 0..3 {
            let value = (src[channel] as u32 * alpha + 255 * (255 - alpha) + 127) / 255;
            dst[channel] = value as u8;
        }
    }
    out
}

fn to_opaque_rgb(image: DynamicImage) -> DynamicImage {
    if image.color().has_alpha() {
        DynamicImage::ImageRgb8(flatten_onto_white(&image))
    } else if image.color() != ColorType::Rgb8 {
        DynamicImage::ImageRgb8(image.to_rgb8())
    } else {
        image
    }
}

// The PNG encoder has no float sample support.
fn to_png_compatible(image: DynamicImage) -> DynamicImage {
    match image.color() {
        ColorType::Rgb32F => DynamicImage::ImageRgb16(image.to_rgb16()),
        ColorType::Rgba32F => DynamicImage::ImageRgba16(image.to_rgba16()),
        _ => image,
    }
}

// libwebp only takes 8-bit RGB or RGBA.
fn to_webp_compatible(image: DynamicImage) -> DynamicImage {
    match image.color() {
        ColorType::Rgb8 | ColorType::Rgba8 => image,
        color if color.has_alpha() => DynamicImage::ImageRgba8(image.to_rgba8()),
        _ => DynamicImage::ImageRgb8(image.to_rgb8()),
    }
}
