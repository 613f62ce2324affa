//! Text watermark compositing
//!
//! Text is drawn with a built-in 3x5 bitmap face scaled by [`GLYPH_SCALE`],
//! alpha-blended over the image. Letters are rendered as capitals; characters
//! without a glyph render as `?`.

use image::RgbaImage;

const GLYPH_WIDTH: u32 = 3;
const GLYPH_HEIGHT: u32 = 5;

/// Pixel scale applied to each glyph cell
pub const GLYPH_SCALE: u32 = 2;

/// Horizontal advance per character, in output pixels
pub const ADVANCE: u32 = (GLYPH_WIDTH + 1) * GLYPH_SCALE;

/// Rows of a glyph, top to bottom; bit 2 is the leftmost column
fn glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        ' ' => [0; 5],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        _ => [0b111, 0b001, 0b010, 0b000, 0b010],
    }
}

/// Width in pixels that `text` occupies when stamped
pub fn text_width(text: &str) -> u32 {
    let chars = text.chars().count() as u32;
    (chars * ADVANCE).saturating_sub(GLYPH_SCALE)
}

/// Composite `text` onto `img` with its top-left corner at `origin`
///
/// Pixels falling outside the image are clipped.
pub fn stamp(img: &mut RgbaImage, text: &str, origin: (u32, u32), color: [u8; 4]) {
    let (width, height) = img.dimensions();

    for (index, c) in text.chars().enumerate() {
        let glyph_x = origin.0 + index as u32 * ADVANCE;
        if glyph_x >= width {
            break;
        }

        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }

                let cell_x = glyph_x + col * GLYPH_SCALE;
                let cell_y = origin.1 + row as u32 * GLYPH_SCALE;
                for dy in 0..GLYPH_SCALE {
                    for dx in 0..GLYPH_SCALE {
                        let (x, y) = (cell_x + dx, cell_y + dy);
                        if x < width && y < height {
                            blend(img.get_pixel_mut(x, y), color);
                        }
                    }
                }
            }
        }
    }
}

/// Source-over blend of `color` onto `pixel`
fn blend(pixel: &mut image::Rgba<u8>, color: [u8; 4]) {
    let alpha = color[3] as u32;
    let inverse = 255 - alpha;

    for channel in 0..3 {
        let dst = pixel.0[channel] as u32;
        pixel.0[channel] = ((color[channel] as u32 * alpha + dst * inverse) / 255) as u8;
    }
    pixel.0[3] = (alpha + pixel.0[3] as u32 * inverse / 255) as u8;
}
