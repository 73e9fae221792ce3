//! Frame geometry and the raw / decoded frame buffers.

use serde::{Deserialize, Serialize};

use crate::protocol::constants::{FRAME_BYTES_PER_PIXEL, FRAME_HEIGHT, FRAME_WIDTH};

/// Byte order of one 16-bit sample in the raw frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SampleOrder {
    /// High byte first
    #[default]
    BigEndian,
    /// Low byte first, the layout older captures were decoded with
    LittleEndian,
}

/// Sensor raster layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub width: u16,
    pub height: u16,
    pub bytes_per_pixel: usize,
    pub sample_order: SampleOrder,
}

impl FrameGeometry {
    /// The only geometry the sensor is known to produce.
    pub const GXS700: FrameGeometry = FrameGeometry {
        width: FRAME_WIDTH,
        height: FRAME_HEIGHT,
        bytes_per_pixel: FRAME_BYTES_PER_PIXEL,
        sample_order: SampleOrder::BigEndian,
    };

    pub fn with_sample_order(mut self, order: SampleOrder) -> Self {
        self.sample_order = order;
        self
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Raw frame size in bytes.
    pub fn frame_size(&self) -> usize {
        self.pixel_count() * self.bytes_per_pixel
    }
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self::GXS700
    }
}

/// One complete raw sensor readout, in bulk delivery order.
#[derive(Clone, PartialEq, Eq)]
pub struct RawFrame {
    data: Vec<u8>,
}

impl RawFrame {
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl AsRef<[u8]> for RawFrame {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl std::fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawFrame").field("len", &self.data.len()).finish()
    }
}

/// 8-bit grayscale image, row major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u16,
    height: u16,
    pixels: Vec<u8>,
}

impl DecodedImage {
    pub(crate) fn new(width: u16, height: u16, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn pixel(&self, x: u16, y: u16) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'_, u8> {
        self.pixels.chunks_exact(self.width.max(1) as usize)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::FRAME_SZ;

    #[test]
    fn test_default_geometry() {
        let g = FrameGeometry::default();
        assert_eq!(g.frame_size(), FRAME_SZ);
        assert_eq!(g.pixel_count(), 1344 * 1850);
        assert_eq!(g.sample_order, SampleOrder::BigEndian);
    }

    #[test]
    fn test_pixel_access() {
        let img = DecodedImage::new(3, 2, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(img.pixel(2, 1), Some(5));
        assert_eq!(img.pixel(3, 0), None);
        let rows: Vec<&[u8]> = img.rows().collect();
        assert_eq!(rows, vec![&[0u8, 1, 2][..], &[3u8, 4, 5][..]]);
    }

    #[test]
    fn test_raw_frame_debug_hides_payload() {
        let raw = RawFrame::from_vec(vec![0u8; 16]);
        assert_eq!(format!("{:?}", raw), "RawFrame { len: 16 }");
    }
}
