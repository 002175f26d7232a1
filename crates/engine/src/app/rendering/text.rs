use crate::app::Rgba;

use super::raster::fill_rect;

pub(crate) const GLYPH_WIDTH: i32 = 3;
pub(crate) const GLYPH_HEIGHT: i32 = 5;

type Glyph = [u8; GLYPH_HEIGHT as usize];

const SPACE: Glyph = [0, 0, 0, 0, 0];
const UNKNOWN: Glyph = [0b111, 0b001, 0b010, 0b000, 0b010];

const DIGITS: [Glyph; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b001, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

const LETTERS: [Glyph; 26] = [
    [0b010, 0b101, 0b111, 0b101, 0b101],
    [0b110, 0b101, 0b110, 0b101, 0b110],
    [0b011, 0b100, 0b100, 0b100, 0b011],
    [0b110, 0b101, 0b101, 0b101, 0b110],
    [0b111, 0b100, 0b110, 0b100, 0b111],
    [0b111, 0b100, 0b110, 0b100, 0b100],
    [0b011, 0b100, 0b101, 0b101, 0b011],
    [0b101, 0b101, 0b111, 0b101, 0b101],
    [0b111, 0b010, 0b010, 0b010, 0b111],
    [0b001, 0b001, 0b001, 0b101, 0b010],
    [0b101, 0b101, 0b110, 0b101, 0b101],
    [0b100, 0b100, 0b100, 0b100, 0b111],
    [0b101, 0b111, 0b111, 0b101, 0b101],
    [0b110, 0b101, 0b101, 0b101, 0b101],
    [0b010, 0b101, 0b101, 0b101, 0b010],
    [0b110, 0b101, 0b110, 0b100, 0b100],
    [0b010, 0b101, 0b101, 0b110, 0b011],
    [0b110, 0b101, 0b110, 0b101, 0b101],
    [0b011, 0b100, 0b010, 0b001, 0b110],
    [0b111, 0b010, 0b010, 0b010, 0b010],
    [0b101, 0b101, 0b101, 0b101, 0b111],
    [0b101, 0b101, 0b101, 0b101, 0b010],
    [0b101, 0b101, 0b111, 0b111, 0b101],
    [0b101, 0b101, 0b010, 0b101, 0b101],
    [0b101, 0b101, 0b010, 0b010, 0b010],
    [0b111, 0b001, 0b010, 0b100, 0b111],
];

/// Uppercase-only 3x5 font; lowercase folds to uppercase.
fn glyph_for(ch: char) -> Glyph {
    match ch {
        ' ' => SPACE,
        '0'..='9' => DIGITS[(ch as u8 - b'0') as usize],
        'A'..='Z' => LETTERS[(ch as u8 - b'A') as usize],
        'a'..='z' => LETTERS[(ch as u8 - b'a') as usize],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '#' => [0b101, 0b111, 0b101, 0b111, 0b101],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        _ => UNKNOWN,
    }
}

pub(crate) const fn glyph_advance(scale: i32) -> i32 {
    (GLYPH_WIDTH + 1) * scale
}

pub(crate) const fn line_advance(scale: i32) -> i32 {
    (GLYPH_HEIGHT + 2) * scale
}

pub(crate) fn text_width_px(text: &str, scale: i32) -> i32 {
    let chars = text.chars().count() as i32;
    if chars == 0 {
        0
    } else {
        chars * glyph_advance(scale) - scale
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_text_clipped(
    frame: &mut [u8],
    width: u32,
    height: u32,
    mut x: i32,
    y: i32,
    text: &str,
    scale: i32,
    color: Rgba,
) {
    let scale = scale.max(1);
    for ch in text.chars() {
        let glyph = glyph_for(ch);
        for (row_index, row_bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if (row_bits & (1 << (GLYPH_WIDTH - 1 - col))) == 0 {
                    continue;
                }
                fill_rect(
                    frame,
                    width,
                    height,
                    x + col * scale,
                    y + row_index as i32 * scale,
                    scale,
                    scale,
                    color,
                );
            }
        }
        x += glyph_advance(scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba = [255, 255, 255, 255];

    #[test]
    fn digits_and_letters_have_distinct_glyphs() {
        assert_ne!(glyph_for('3'), glyph_for('5'));
        assert_ne!(glyph_for('O'), glyph_for('0'));
        assert_eq!(glyph_for('f'), glyph_for('F'));
    }

    #[test]
    fn unsupported_characters_use_the_unknown_glyph() {
        assert_eq!(glyph_for('\u{1f642}'), UNKNOWN);
        assert_eq!(glyph_for(' '), SPACE);
    }

    #[test]
    fn text_width_excludes_trailing_gap() {
        assert_eq!(text_width_px("", 2), 0);
        assert_eq!(text_width_px("1", 2), 6);
        assert_eq!(text_width_px("12", 2), 14);
    }

    #[test]
    fn drawing_outside_the_frame_is_safe() {
        let mut frame = vec![0u8; 8 * 8 * 4];
        draw_text_clipped(&mut frame, 8, 8, -20, -20, "FPS 60", 3, WHITE);
        draw_text_clipped(&mut frame, 8, 8, 64, 64, "LINK", 3, WHITE);
        assert!(frame.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn tiny_frames_never_write_out_of_bounds() {
        let mut frame = vec![0u8; 4];
        draw_text_clipped(&mut frame, 1, 1, 0, 0, "8", 1, WHITE);
        assert_eq!(frame, WHITE.to_vec());
    }
}
