//! HTML serialization of a [`Document`].
//!
//! Each cell becomes a fixed-size floated `div` with the cell's colors, so a
//! browser lays the page out as a grid of `cell_size` pixel squares.

use std::io::Write;

use super::document::{Document, Rgb};
use super::text::NBSP;
use crate::error::RenderError;

pub const DEFAULT_CELL_SIZE: u32 = 16;
pub const DEFAULT_FONT_FAMILY: &str = "Helvetica";
pub const DEFAULT_FONT_SIZE: u32 = 12;

/// Right padding inside each cell, in pixels.
const CELL_PADDING: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlOptions {
    /// Edge length of one cell in CSS pixels
    pub cell_size: u32,
    pub font_family: String,
    /// Font size in CSS pixels
    pub font_size: u32,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl HtmlOptions {
    pub fn layout(&self) -> HtmlLayout {
        HtmlLayout {
            cell_size: self.cell_size,
        }
    }
}

/// Geometry of the rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HtmlLayout {
    pub cell_size: u32,
}

impl Default for HtmlLayout {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
        }
    }
}

impl HtmlLayout {
    /// Page size in pixels, for sizing a browser viewport to the document.
    pub fn page_size(&self, document: &Document) -> (u32, u32) {
        (
            document.width().saturating_mul(self.cell_size),
            document.height().saturating_mul(self.cell_size),
        )
    }
}

fn css(color: Rgb) -> String {
    format!("rgb({}, {}, {})", color.r, color.g, color.b)
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        NBSP => out.push_str("&nbsp;"),
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        other => out.push(other),
    }
}

/// Escape a string for use inside an HTML attribute or text node.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        push_escaped(&mut out, c);
    }
    out
}

/// Write `document` as a standalone HTML page.
pub fn write_html<W: Write>(
    document: &Document,
    options: &HtmlOptions,
    out: &mut W,
) -> Result<(), RenderError> {
    write!(
        out,
        r#"<html><body style="margin:0; padding:0"><div style="font-family: {}; font-size: {}px; text-align: right">"#,
        escape(&options.font_family),
        options.font_size
    )?;

    let width = options.cell_size.saturating_sub(CELL_PADDING);
    let mut cell_html = String::new();
    for row in document.rows() {
        write!(out, r#"<div class="row" style="padding:0; margin:0; clear:both">"#)?;
        for cell in row.cells() {
            cell_html.clear();
            push_escaped(&mut cell_html, cell.character);
            write!(
                out,
                r#"<div class="pixel" style="float:left; width: {}px; height: {}px; padding-right: {}px; color: {}; background-color: {}">{}</div>"#,
                width,
                options.cell_size,
                CELL_PADDING,
                css(cell.foreground),
                css(cell.background),
                cell_html
            )?;
        }
        write!(out, "</div>")?;
    }

    writeln!(out, "</div></body></html>")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixels::{ChannelOrder, PixelBuffer};
    use crate::render::{render, RenderOptions};

    fn doc(text: &str, width: u32, height: u32) -> Document {
        let data = vec![255u8; (width * height * 4) as usize];
        let buffer = PixelBuffer::packed(data, width, height, ChannelOrder::Bgra);
        render(&buffer, text, &RenderOptions::default()).unwrap()
    }

    fn to_string(document: &Document, options: &HtmlOptions) -> String {
        let mut out = Vec::new();
        write_html(document, options, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_structure_counts() {
        let html = to_string(&doc("ab", 3, 2), &HtmlOptions::default());
        assert_eq!(html.matches(r#"class="row""#).count(), 2);
        assert_eq!(html.matches(r#"class="pixel""#).count(), 6);
        assert!(html.starts_with("<html>"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_cell_styles() {
        let html = to_string(&doc("A", 1, 1), &HtmlOptions::default());
        assert!(html.contains("width: 14px; height: 16px"));
        assert!(html.contains("color: rgb(159, 159, 159)"));
        assert!(html.contains("background-color: rgb(255, 255, 255)\">A</div>"));
    }

    #[test]
    fn test_nbsp_and_escaping() {
        let html = to_string(&doc(" <", 2, 1), &HtmlOptions::default());
        // legacy indexing: pixel 0 takes '<', pixel 1 takes ' '
        assert!(html.contains(">&lt;</div>"));
        assert!(html.contains(">&nbsp;</div>"));
    }

    #[test]
    fn test_page_size() {
        let document = doc("x", 4, 3);
        assert_eq!(HtmlLayout::default().page_size(&document), (64, 48));
        let options = HtmlOptions {
            cell_size: 10,
            ..HtmlOptions::default()
        };
        assert_eq!(options.layout().page_size(&document), (40, 30));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a&b\"c"), "a&amp;b&quot;c");
    }
}
