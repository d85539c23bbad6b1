//! Brightness and contrast color selection using the ITU-R BT.601 weights.

/// Luminance above which a cell counts as bright.
pub const BRIGHT_THRESHOLD: u8 = 128;

/// Distance between a cell's luminance and its text gray.
pub const CONTRAST_OFFSET: u8 = 96;

/// Perceived brightness of an RGB color.
///
/// Y = 0.299*R + 0.587*G + 0.114*B, in integer math with the coefficients
/// scaled by 1000 and the result truncated.
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let (r, g, b) = (r as u32, g as u32, b as u32);
    ((299 * r + 587 * g + 114 * b) / 1000) as u8
}

/// Gray level of text drawn on a background of the given luminance.
///
/// Bright backgrounds (strictly above 128) get text 96 levels darker,
/// everything else 96 levels lighter. The result always lies in 33..=224,
/// so no clamping happens.
pub fn contrast_gray(luminance: u8) -> u8 {
    if luminance > BRIGHT_THRESHOLD {
        luminance - CONTRAST_OFFSET
    } else {
        luminance + CONTRAST_OFFSET
    }
}
