//! Pixel-to-markup renderer.
//!
//! Turns a 32-bit pixel buffer into a [`Document`] with one cell per pixel:
//!
//! 1. **Background** - the pixel's own RGB color
//! 2. **Foreground** - a gray chosen by [`contrast_gray`] from the pixel's
//!    [`luminance`]
//! 3. **Character** - taken cyclically from the render text by
//!    [`TextCycle`]
//!
//! Rendering is pure; it never touches the codec layer.

mod document;
pub mod html;
mod luminance;
mod text;

pub use document::{Cell, Document, Row, Rgb};
pub use html::{write_html, HtmlLayout, HtmlOptions};
pub use luminance::{contrast_gray, luminance, BRIGHT_THRESHOLD, CONTRAST_OFFSET};
pub use text::{CharIndexing, TextCycle, NBSP};

use std::io::Write;

use crate::error::RenderError;
use crate::pixels::{ChannelOrder, PixelBuffer};

/// Knobs that change what a render produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub indexing: CharIndexing,
}

/// Render an extracted pixel buffer.
pub fn render(
    buffer: &PixelBuffer,
    text: &str,
    options: &RenderOptions,
) -> Result<Document, RenderError> {
    render_raw(
        &buffer.data,
        buffer.width,
        buffer.height,
        buffer.stride,
        buffer.order,
        text,
        options,
    )
}

/// Render raw bytes laid out as `height` rows of `stride` bytes.
///
/// Fails with [`RenderError::InvalidBuffer`] when `data` is shorter than
/// `stride * height` or a row cannot hold `width` pixels.
pub fn render_raw(
    data: &[u8],
    width: u32,
    height: u32,
    stride: usize,
    order: ChannelOrder,
    text: &str,
    options: &RenderOptions,
) -> Result<Document, RenderError> {
    let row_bytes = width as usize * PixelBuffer::BYTES_PER_PIXEL;
    let fits = stride
        .checked_mul(height as usize)
        .is_some_and(|needed| needed <= data.len());
    if stride < row_bytes || !fits {
        return Err(RenderError::InvalidBuffer {
            width,
            height,
            stride,
            len: data.len(),
        });
    }

    let cycle = TextCycle::new(text, options.indexing)?;
    let (ro, go, bo, _) = order.offsets();

    let mut rows = Vec::with_capacity(height as usize);
    for y in 0..height as usize {
        let start = y * stride;
        let row = &data[start..start + row_bytes];
        let cells = row
            .chunks_exact(PixelBuffer::BYTES_PER_PIXEL)
            .enumerate()
            .map(|(x, px)| {
                let (r, g, b) = (px[ro], px[go], px[bo]);
                Cell {
                    background: Rgb::new(r, g, b),
                    foreground: Rgb::gray(contrast_gray(luminance(r, g, b))),
                    character: cycle.char_at(y * width as usize + x),
                }
            })
            .collect();
        rows.push(Row::new(cells));
    }

    log::debug!("Rendered {}x{} document", width, height);
    Ok(Document::new(width, height, rows))
}

/// Serialize a document as pretty-printed JSON.
pub fn write_json<W: Write>(document: &Document, out: &mut W) -> Result<(), RenderError> {
    serde_json::to_writer_pretty(&mut *out, document).map_err(std::io::Error::from)?;
    writeln!(out)?;
    Ok(())
}
