//! Raw frame to 8-bit grayscale conversion.
//!
//! Only the high byte of each 16-bit sample is kept. The sensor reports
//! brightness (unimpeded x-rays), so values are inverted to give the usual
//! radiograph look where dense material is white.

use tracing::debug;

use crate::error::{GxsError, Result};
use crate::frame::{DecodedImage, FrameGeometry, SampleOrder};

/// Decode `raw` laid out as `geometry` into a grayscale image.
///
/// The input must be exactly `width * height * bytes_per_pixel` bytes.
pub fn decode(raw: &[u8], geometry: &FrameGeometry) -> Result<DecodedImage> {
    let expected = geometry.frame_size();
    if raw.len() != expected || geometry.bytes_per_pixel != 2 {
        return Err(GxsError::FrameSize {
            expected,
            actual: raw.len(),
        });
    }

    let high = match geometry.sample_order {
        SampleOrder::BigEndian => 0,
        SampleOrder::LittleEndian => 1,
    };
    let pixels: Vec<u8> = raw
        .chunks_exact(2)
        .map(|sample| 0xFF - sample[high])
        .collect();

    debug!(
        width = geometry.width,
        height = geometry.height,
        order = ?geometry.sample_order,
        "Frame decoded"
    );
    Ok(DecodedImage::new(geometry.width, geometry.height, pixels))
}
