//! Raw 32-bit pixel buffers handed from the codec layer to the renderer.

use crate::codec::ChannelMasks;

/// Byte order of the four channels inside each pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelOrder {
    /// Blue, green, red, alpha. What the codec produces with
    /// [`ChannelMasks::RGBA`] on a little-endian word.
    #[default]
    Bgra,
    /// Red, green, blue, alpha.
    Rgba,
}

impl ChannelOrder {
    /// Byte offsets of (r, g, b, a) within a pixel.
    pub fn offsets(self) -> (usize, usize, usize, usize) {
        match self {
            ChannelOrder::Bgra => (2, 1, 0, 3),
            ChannelOrder::Rgba => (0, 1, 2, 3),
        }
    }

    /// Channel order implied by a set of masks, if it is one we can name.
    pub fn from_masks(masks: ChannelMasks) -> Option<Self> {
        match masks.byte_offsets()? {
            (2, 1, 0, 3) => Some(ChannelOrder::Bgra),
            (0, 1, 2, 3) => Some(ChannelOrder::Rgba),
            _ => None,
        }
    }

    /// Masks that make the codec produce (or consume) this order.
    pub fn masks(self) -> ChannelMasks {
        match self {
            ChannelOrder::Bgra => ChannelMasks::RGBA,
            ChannelOrder::Rgba => ChannelMasks {
                red: 0x0000_00FF,
                green: 0x0000_FF00,
                blue: 0x00FF_0000,
            },
        }
    }
}

/// A row-major buffer of 4-byte pixels.
///
/// Rows start every `stride` bytes; `stride` may exceed `width * 4` when rows
/// are padded, so always index rows through [`PixelBuffer::row`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Raw pixel bytes, at least `stride * height` long
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bytes per row
    pub stride: usize,
    /// Channel order of each pixel
    pub order: ChannelOrder,
}

impl PixelBuffer {
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Tightly packed buffer (`stride == width * 4`).
    pub fn packed(data: Vec<u8>, width: u32, height: u32, order: ChannelOrder) -> Self {
        Self {
            data,
            width,
            height,
            stride: width as usize * Self::BYTES_PER_PIXEL,
            order,
        }
    }

    /// Number of bytes the buffer must hold: `stride * height`.
    pub fn required_len(&self) -> usize {
        self.stride * self.height as usize
    }

    /// Whether the buffer is large enough and its stride can hold a row.
    pub fn is_well_formed(&self) -> bool {
        self.stride >= self.width as usize * Self::BYTES_PER_PIXEL
            && self.data.len() >= self.required_len()
    }

    /// The `width * 4` meaningful bytes of row `y`, without padding.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride;
        let end = start + self.width as usize * Self::BYTES_PER_PIXEL;
        self.data.get(start..end)
    }

    /// Channels of the pixel at (x, y) as (r, g, b, a).
    pub fn pixel(&self, x: u32, y: u32) -> Option<(u8, u8, u8, u8)> {
        if x >= self.width {
            return None;
        }
        let row = self.row(y)?;
        let base = x as usize * Self::BYTES_PER_PIXEL;
        let (r, g, b, a) = self.order.offsets();
        Some((row[base + r], row[base + g], row[base + b], row[base + a]))
    }
}
