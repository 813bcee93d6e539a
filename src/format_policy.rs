//! # Format Policy Module
//!
//! Tabella di decisione pura: estensione del file → ricetta di trasformazione.
//!
//! ## Formati:
//! | Estensione    | Classe        | Alpha        | Qualità |
//! |---------------|---------------|--------------|---------|
//! | jpg, jpeg     | `Jpeg`        | appiattito   | sì      |
//! | png           | `Png`         | preservato   | no      |
//! | webp          | `WebP`        | preservato   | sì      |
//! | tutto il resto| `Unsupported` | file intatto | -       |
//!
//! È una whitelist: GIF (animazioni), BMP e TIFF restano `Unsupported`.
//! Un nuovo formato richiede una nuova variante con il suo handler.

use std::path::Path;

/// Transform recipe selected from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatClass {
    Jpeg,
    Png,
    WebP,
    Unsupported,
}

/// Classify an extension, case-insensitive, leading dot optional.
pub fn classify(extension: &str) -> FormatClass {
    let ext = extension.strip_prefix('.').unwrap_or(extension);
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => FormatClass::Jpeg,
        "png" => FormatClass::Png,
        "webp" => FormatClass::WebP,
        _ => FormatClass::Unsupported,
    }
}

/// Classify a path by its extension. No extension is `Unsupported`.
pub fn classify_path(path: &Path) -> FormatClass {
    path.extension()
        .map(|ext| classify(&ext.to_string_lossy()))
        .unwrap_or(FormatClass::Unsupported)
}

impl FormatClass {
    pub fn is_supported(&self) -> bool {
        !matches!(self, FormatClass::Unsupported)
    }

    pub fn name(&self) -> &'static str {
        match self {
            FormatClass::Jpeg => "JPEG",
            FormatClass::Png => "PNG",
            FormatClass::WebP => "WebP",
            FormatClass::Unsupported => "unsupported",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        assert_eq!(classify("jpg"), FormatClass::Jpeg);
        assert_eq!(classify(".JPEG"), FormatClass::Jpeg);
        assert_eq!(classify("Jpg"), FormatClass::Jpeg);
        assert_eq!(classify(".png"), FormatClass::Png);
        assert_eq!(classify("PNG"), FormatClass::Png);
        assert_eq!(classify("webp"), FormatClass::WebP);
        assert_eq!(classify(".WebP"), FormatClass::WebP);
    }

    #[test]
    fn test_everything_else_is_unsupported() {
        for ext in [
            "gif", ".gif", "bmp", "tiff", "TIF", "svg", "", ".", "..jpg", "jpg.", "jp g", "avif",
            "heic", "pngx",
        ] {
            assert_eq!(classify(ext), FormatClass::Unsupported, "extension {:?}", ext);
        }
    }

    #[test]
    fn test_classify_path() {
        assert_eq!(classify_path(Path::new("/up/2024/01/a.JPG")), FormatClass::Jpeg);
        assert_eq!(classify_path(Path::new("b.tar.png")), FormatClass::Png);
        assert_eq!(classify_path(Path::new("c.gif")), FormatClass::Unsupported);
        assert_eq!(classify_path(Path::new("README")), FormatClass::Unsupported);
        assert_eq!(classify_path(Path::new(".png")), FormatClass::Unsupported);
    }

    #[test]
    fn test_is_supported() {
        assert!(FormatClass::Jpeg.is_supported());
        assert!(FormatClass::Png.is_supported());
        assert!(FormatClass::WebP.is_supported());
        assert!(!FormatClass::Unsupported.is_supported());
        assert_eq!(FormatClass::WebP.name(), "WebP");
    }
}
