//! Image fetch support.
//!
//! The app only needs to know that a downloaded body really is an image
//! before handing it to the platform decoder, so formats are recognised by
//! their file signature rather than fully decoded.

/// Image formats served for recipe thumbnails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl ImageFormat {
    /// Detects the format from the leading bytes of `data`.
    ///
    /// Only the signature is checked. A truncated or corrupt body with a
    /// valid signature is still detected.
    pub fn detect(data: &[u8]) -> Option<Self> {
        const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];

        if data.starts_with(PNG) {
            Some(ImageFormat::Png)
        } else if data.starts_with(JPEG) {
            Some(ImageFormat::Jpeg)
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Some(ImageFormat::WebP)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::WebP => "webp",
        }
    }
}

/// A downloaded image whose body starts with a known image signature.
///
/// The bytes are not decoded here. The platform decoder can still reject
/// them, and callers must handle that failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

impl FetchedImage {
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        let format = ImageFormat::detect(&bytes)?;
        Some(FetchedImage { format, bytes })
    }
}
