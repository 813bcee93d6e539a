//! # PNG Color Layout Module
//!
//! Il decoder di `image` espande sempre le PNG: palette → RGB(A), grigi a 1/2/4 bit → 8 bit.
//! Riscrivere quel buffer cambierebbe la modalità colore del file (e di solito lo ingrandisce).
//! Questo modulo legge l'header con il crate `png` e riscrive la modalità originale.
//!
//! ## Modalità gestite qui:
//! - **Indexed**: palette e chunk tRNS copiati identici, pixel trattati come indici
//! - **Grayscale 1/2/4 bit** (senza tRNS): campioni riquantizzati alla profondità originale
//!
//! Tutte le altre modalità (RGB, RGBA, grigi 8/16 bit, grigi con alpha) sono già
//! preservate da `image` e non passano da qui.

use crate::error::{CompressError, Result};
use image::GrayImage;
use std::io::Cursor;
use std::path::Path;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// A PNG color layout that the `image` crate would not round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PngLayout {
    Indexed {
        bit_depth: png::BitDepth,
        /// RGB triples
        palette: Vec<u8>,
        /// Per-entry alpha, possibly shorter than the palette
        trns: Option<Vec<u8>>,
    },
    LowDepthGray { bit_depth: png::BitDepth },
}

impl PngLayout {
    fn color_and_depth(&self) -> (png::ColorType, png::BitDepth) {
        match self {
            PngLayout::Indexed { bit_depth, .. } => (png::ColorType::Indexed, *bit_depth),
            PngLayout::LowDepthGray { bit_depth } => (png::ColorType::Grayscale, *bit_depth),
        }
    }
}

/// Reads the PNG header of `bytes`.
///
/// Returns `None` for content that is not a PNG, or whose layout `image` already preserves.
pub fn sniff(bytes: &[u8], path: &Path) -> Result<Option<PngLayout>> {
    if !bytes.starts_with(PNG_SIGNATURE) {
        return Ok(None);
    }

    let reader = png::Decoder::new(Cursor::new(bytes))
        .read_info()
        .map_err(|source| png_decode(path, source))?;
    let info = reader.info();

    let layout = match (info.color_type, info.bit_depth) {
        (png::ColorType::Indexed, bit_depth) => {
            info.palette.as_ref().map(|palette| PngLayout::Indexed {
                bit_depth,
                palette: palette.to_vec(),
                trns: info.trns.as_ref().map(|trns| trns.to_vec()),
            })
        }
        (png::ColorType::Grayscale, bit_depth @ (png::BitDepth::One | png::BitDepth::Two | png::BitDepth::Four))
            if info.trns.is_none() =>
        {
            Some(PngLayout::LowDepthGray { bit_depth })
        }
        _ => None,
    };

    Ok(layout)
}

/// Decodes an indexed PNG to one palette index per pixel, without expanding the palette.
pub fn decode_indices(bytes: &[u8], path: &Path) -> Result<GrayImage> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::IDENTITY);
    let mut reader = decoder.read_info().map_err(|source| png_decode(path, source))?;

    let mut buffer = vec![0; reader.output_buffer_size()];
    let frame = reader
        .next_frame(&mut buffer)
        .map_err(|source| png_decode(path, source))?;

    let samples = unpack(
        &buffer[..frame.buffer_size()],
        frame.width,
        frame.line_size,
        frame.bit_depth as u8,
    );
    GrayImage::from_raw(frame.width, frame.height, samples).ok_or_else(|| {
        CompressError::Validation(format!("Truncated PNG frame: {}", path.display()))
    })
}

/// Scales 8-bit gray samples down to `bit_depth` levels.
pub fn requantize(image: &GrayImage, bit_depth: png::BitDepth) -> GrayImage {
    let max = (1u32 << bit_depth as u8) - 1;
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let value = image.get_pixel(x, y)[0] as u32;
        image::Luma([((value * max + 127) / 255) as u8])
    })
}

/// Encodes `samples` (palette indices, or gray levels already at the target depth)
/// in `layout`, with maximum deflate compression.
pub fn encode(layout: &PngLayout, samples: &GrayImage, path: &Path) -> Result<Vec<u8>> {
    let (color, bit_depth) = layout.color_and_depth();
    let packed = pack(samples, bit_depth as u8);

    let mut buffer = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buffer, samples.width(), samples.height());
        encoder.set_color(color);
        encoder.set_depth(bit_depth);
        if let PngLayout::Indexed { palette, trns, .. } = layout {
            encoder.set_palette(palette.clone());
            if let Some(trns) = trns {
                encoder.set_trns(trns.clone());
            }
        }
        encoder.set_compression(png::Compression::Best);
        // Filtering rarely helps palette or sub-byte data
        encoder.set_filter(png::FilterType::NoFilter);

        let mut writer = encoder
            .write_header()
            .map_err(|source| png_encode(path, source))?;
        writer
            .write_image_data(&packed)
            .map_err(|source| png_encode(path, source))?;
        writer.finish().map_err(|source| png_encode(path, source))?;
    }
    Ok(buffer)
}

fn png_decode(path: &Path, source: png::DecodingError) -> CompressError {
    CompressError::PngDecode {
        path: path.to_path_buf(),
        source,
    }
}

fn png_encode(path: &Path, source: png::EncodingError) -> CompressError {
    CompressError::PngEncode {
        path: path.to_path_buf(),
        source,
    }
}

/// Splits packed rows (MSB first) into one sample per byte.
fn unpack(data: &[u8], width: u32, line_size: usize, bit_depth: u8) -> Vec<u8> {
    let width = width as usize;
    if bit_depth == 8 {
        return data
            .chunks(line_size)
            .flat_map(|row| row[..width].iter().copied())
            .collect();
    }

    let per_byte = 8 / bit_depth as usize;
    let mask = (1u8 << bit_depth) - 1;
    let mut samples = Vec::with_capacity(width * (data.len() / line_size.max(1)));
    for row in data.chunks(line_size) {
        for x in 0..width {
            let shift = 8 - bit_depth as usize * (x % per_byte + 1);
            samples.push((row[x / per_byte] >> shift) & mask);
        }
    }
    samples
}

/// Inverse of [`unpack`]: rows padded to a whole byte.
fn pack(image: &GrayImage, bit_depth: u8) -> Vec<u8> {
    if bit_depth == 8 {
        return image.as_raw().clone();
    }

    let width = image.width() as usize;
    let per_byte = 8 / bit_depth as usize;
    let line_size = width.div_ceil(per_byte);
    let mut packed = vec![0u8; line_size * image.height() as usize];
    for (y, row) in image.as_raw().chunks(width.max(1)).enumerate() {
        for (x, &sample) in row.iter().enumerate() {
            let shift = 8 - bit_depth as usize * (x % per_byte + 1);
            packed[y * line_size + x / per_byte] |= sample << shift;
        }
    }
    packed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexed_png(width: u32, height: u32, bit_depth: png::BitDepth, trns: Option<&[u8]>) -> Vec<u8> {
        let levels = 1u32 << (bit_depth as u8).min(2);
        let samples = GrayImage::from_fn(width, height, |x, y| {
            image::Luma([((x / 7 + y / 5) % levels) as u8])
        });
        let layout = PngLayout::Indexed {
            bit_depth,
            palette: vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 250, 250, 250],
            trns: trns.map(|t| t.to_vec()),
        };
        encode(&layout, &samples, Path::new("fixture.png")).unwrap()
    }

    #[test]
    fn test_sniff_indexed() {
        let bytes = indexed_png(20, 10, png::BitDepth::Four, Some(&[0, 128]));
        match sniff(&bytes, Path::new("a.png")).unwrap() {
            Some(PngLayout::Indexed {
                bit_depth,
                palette,
                trns,
            }) => {
                assert_eq!(bit_depth, png::BitDepth::Four);
                assert_eq!(palette.len(), 12);
                assert_eq!(trns, Some(vec![0, 128]));
            }
            other => panic!("unexpected layout {:?}", other),
        }
    }

    #[test]
    fn test_sniff_ignores_other_content() {
        assert_eq!(sniff(b"\xFF\xD8\xFF\xE0 jpeg", Path::new("a.png")).unwrap(), None);

        let mut rgba = Vec::new();
        image::DynamicImage::new_rgba8(4, 4)
            .write_to(&mut Cursor::new(&mut rgba), image::ImageFormat::Png)
            .unwrap();
        assert_eq!(sniff(&rgba, Path::new("b.png")).unwrap(), None);
    }

    #[test]
    fn test_sniff_truncated_header_fails() {
        let err = sniff(b"\x89PNG\r\n\x1a\nnope", Path::new("bad.png")).unwrap_err();
        assert!(err.to_string().contains("bad.png"));
    }

    #[test]
    fn test_decode_indices_keeps_sub_byte_values() {
        // 13 pixels wide: rows end mid-byte at 2 bits per sample
        let bytes = indexed_png(13, 3, png::BitDepth::Two, None);
        let indices = decode_indices(&bytes, Path::new("a.png")).unwrap();
        assert_eq!(indices.dimensions(), (13, 3));
        for (x, y, pixel) in indices.enumerate_pixels() {
            assert_eq!(pixel[0] as u32, (x / 7 + y / 5) % 4);
        }
    }

    #[test]
    fn test_requantize_levels() {
        let gray = GrayImage::from_fn(4, 1, |x, _| image::Luma([[0, 100, 128, 255][x as usize]]));
        let one_bit = requantize(&gray, png::BitDepth::One);
        assert_eq!(one_bit.as_raw(), &vec![0, 0, 1, 1]);
        let four_bit = requantize(&gray, png::BitDepth::Four);
        assert_eq!(four_bit.as_raw(), &vec![0, 6, 8, 15]);
    }
}
