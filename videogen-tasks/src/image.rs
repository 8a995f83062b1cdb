use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ::image::codecs::jpeg::JpegEncoder;

use crate::consts::{JPEG_QUALITY, MAX_IMAGE_BASE64_BYTES};
use crate::types::ImageInput;
use crate::VideoGenError;

/// Re-encode arbitrary image bytes as JPEG and wrap them in a base64 data URI
pub fn to_jpeg_data_uri(bytes: &[u8]) -> Result<String, VideoGenError> {
    let decoded = ::image::load_from_memory(bytes)
        .map_err(|e| VideoGenError::InvalidInput(format!("Unreadable image: {e}")))?;

    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut jpeg), JPEG_QUALITY);
    // JPEG has no alpha channel
    decoded
        .to_rgb8()
        .write_with_encoder(encoder)
        .map_err(|e| VideoGenError::InvalidInput(format!("JPEG encoding failed: {e}")))?;

    let encoded = BASE64.encode(&jpeg);
    check_encoded_size(&encoded)?;

    Ok(format!("data:image/jpeg;base64,{encoded}"))
}

fn check_encoded_size(encoded: &str) -> Result<(), VideoGenError> {
    if encoded.len() > MAX_IMAGE_BASE64_BYTES {
        return Err(VideoGenError::ImageTooLarge {
            size: encoded.len(),
            limit: MAX_IMAGE_BASE64_BYTES,
        });
    }
    Ok(())
}

/// The string a provider expects for an image field: the URL itself or a data URI
pub fn image_reference(image: &ImageInput) -> Result<String, VideoGenError> {
    match image {
        ImageInput::Url(url) => Ok(url.to_string()),
        ImageInput::Bytes(bytes) => to_jpeg_data_uri(bytes),
    }
}
