//! Bitmap text for the splash screen, help overlay and status line
//!
//! Glyphs are 8x8 and upper-case only; text is upper-cased before drawing.

use crate::keymap::key_label;

const FONT_WIDTH: usize = 8;
const FONT_HEIGHT: usize = 8;

const BACKGROUND: u32 = 0xFF0A140A;
const TITLE: u32 = 0xFF00FF00;
const TEXT: u32 = 0xFFF0F0F0;
const OVERLAY: u32 = 0xFF000000;

fn get_char_bitmap(c: char) -> [u8; 8] {
    match c {
        ' ' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        '!' => [0x18, 0x18, 0x18, 0x18, 0x00, 0x00, 0x18, 0x00],
        '(' => [0x0C, 0x18, 0x30, 0x30, 0x30, 0x18, 0x0C, 0x00],
        ')' => [0x30, 0x18, 0x0C, 0x0C, 0x0C, 0x18, 0x30, 0x00],
        '+' => [0x00, 0x18, 0x18, 0x7E, 0x18, 0x18, 0x00, 0x00],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x18, 0x30],
        '-' => [0x00, 0x00, 0x00, 0x7E, 0x00, 0x00, 0x00, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x18, 0x00],
        '/' => [0x00, 0x03, 0x06, 0x0C, 0x18, 0x30, 0x60, 0x00],
        '0' => [0x3C, 0x66, 0x6E, 0x7E, 0x76, 0x66, 0x3C, 0x00],
        '1' => [0x18, 0x38, 0x18, 0x18, 0x18, 0x18, 0x7E, 0x00],
        '2' => [0x3C, 0x66, 0x06, 0x0C, 0x18, 0x30, 0x7E, 0x00],
        '3' => [0x3C, 0x66, 0x06, 0x1C, 0x06, 0x66, 0x3C, 0x00],
        '4' => [0x0C, 0x1C, 0x3C, 0x6C, 0x7E, 0x0C, 0x0C, 0x00],
        '5' => [0x7E, 0x60, 0x7C, 0x06, 0x06, 0x66, 0x3C, 0x00],
        '6' => [0x1C, 0x30, 0x60, 0x7C, 0x66, 0x66, 0x3C, 0x00],
        '7' => [0x7E, 0x06, 0x0C, 0x18, 0x30, 0x30, 0x30, 0x00],
        '8' => [0x3C, 0x66, 0x66, 0x3C, 0x66, 0x66, 0x3C, 0x00],
        '9' => [0x3C, 0x66, 0x66, 0x3E, 0x06, 0x0C, 0x38, 0x00],
        ':' => [0x00, 0x18, 0x18, 0x00, 0x00, 0x18, 0x18, 0x00],
        '<' => [0x06, 0x0C, 0x18, 0x30, 0x18, 0x0C, 0x06, 0x00],
        '=' => [0x00, 0x00, 0x7E, 0x00, 0x7E, 0x00, 0x00, 0x00],
        '>' => [0x60, 0x30, 0x18, 0x0C, 0x18, 0x30, 0x60, 0x00],
        'A' => [0x3C, 0x66, 0x66, 0x7E, 0x66, 0x66, 0x66, 0x00],
        'B' => [0x7C, 0x66, 0x66, 0x7C, 0x66, 0x66, 0x7C, 0x00],
        'C' => [0x3C, 0x66, 0x60, 0x60, 0x60, 0x66, 0x3C, 0x00],
        'D' => [0x78, 0x6C, 0x66, 0x66, 0x66, 0x6C, 0x78, 0x00],
        'E' => [0x7E, 0x60, 0x60, 0x7C, 0x60, 0x60, 0x7E, 0x00],
        'F' => [0x7E, 0x60, 0x60, 0x7C, 0x60, 0x60, 0x60, 0x00],
        'G' => [0x3C, 0x66, 0x60, 0x6E, 0x66, 0x66, 0x3C, 0x00],
        'H' => [0x66, 0x66, 0x66, 0x7E, 0x66, 0x66, 0x66, 0x00],
        'I' => [0x7E, 0x18, 0x18, 0x18, 0x18, 0x18, 0x7E, 0x00],
        'J' => [0x3E, 0x0C, 0x0C, 0x0C, 0x0C, 0x6C, 0x38, 0x00],
        'K' => [0x66, 0x6C, 0x78, 0x70, 0x78, 0x6C, 0x66, 0x00],
        'L' => [0x60, 0x60, 0x60, 0x60, 0x60, 0x60, 0x7E, 0x00],
        'M' => [0x63, 0x77, 0x7F, 0x6B, 0x63, 0x63, 0x63, 0x00],
        'N' => [0x66, 0x76, 0x7E, 0x6E, 0x66, 0x66, 0x66, 0x00],
        'O' => [0x3C, 0x66, 0x66, 0x66, 0x66, 0x66, 0x3C, 0x00],
        'P' => [0x7C, 0x66, 0x66, 0x7C, 0x60, 0x60, 0x60, 0x00],
        'Q' => [0x3C, 0x66, 0x66, 0x66, 0x6A, 0x6C, 0x36, 0x00],
        'R' => [0x7C, 0x66, 0x66, 0x7C, 0x6C, 0x66, 0x66, 0x00],
        'S' => [0x3C, 0x66, 0x60, 0x3C, 0x06, 0x66, 0x3C, 0x00],
        'T' => [0x7E, 0x18, 0x18, 0x18, 0x18, 0x18, 0x18, 0x00],
        'U' => [0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x3C, 0x00],
        'V' => [0x66, 0x66, 0x66, 0x66, 0x66, 0x3C, 0x18, 0x00],
        'W' => [0x63, 0x63, 0x63, 0x6B, 0x7F, 0x77, 0x63, 0x00],
        'X' => [0x66, 0x66, 0x3C, 0x18, 0x3C, 0x66, 0x66, 0x00],
        'Y' => [0x66, 0x66, 0x66, 0x3C, 0x18, 0x18, 0x18, 0x00],
        'Z' => [0x7E, 0x06, 0x0C, 0x18, 0x30, 0x60, 0x7E, 0x00],
        '#' => [0x6C, 0x6C, 0xFE, 0x6C, 0xFE, 0x6C, 0x6C, 0x00],
        '*' => [0x00, 0x66, 0x3C, 0xFF, 0x3C, 0x66, 0x00, 0x00],
        '?' => [0x3C, 0x66, 0x06, 0x0C, 0x18, 0x00, 0x18, 0x00],
        '[' => [0x3C, 0x30, 0x30, 0x30, 0x30, 0x30, 0x3C, 0x00],
        ']' => [0x3C, 0x0C, 0x0C, 0x0C, 0x0C, 0x0C, 0x3C, 0x00],
        '|' => [0x18, 0x18, 0x18, 0x18, 0x18, 0x18, 0x18, 0x00],
        _ => [0x00; 8],
    }
}

/// Width in pixels of `text` at `scale`
pub fn text_width(text: &str, scale: usize) -> usize {
    text.chars().count() * FONT_WIDTH * scale
}

/// Draw one line of text with its top-left corner at (x, y). Clipped to the buffer.
#[allow(clippy::too_many_arguments)]
pub fn draw_text(
    buffer: &mut [u32],
    width: usize,
    height: usize,
    text: &str,
    x: usize,
    y: usize,
    scale: usize,
    color: u32,
) {
    let glyph_w = FONT_WIDTH * scale;
    for (n, c) in text.chars().enumerate() {
        let left = x + n * glyph_w;
        if left >= width {
            break;
        }
        let bitmap = get_char_bitmap(c.to_ascii_uppercase());
        for py in 0..FONT_HEIGHT * scale {
            let row = bitmap[py / scale];
            for px in 0..glyph_w {
                let (dx, dy) = (left + px, y + py);
                if dx >= width || dy >= height {
                    continue;
                }
                if (row >> (7 - px / scale)) & 1 == 1 {
                    buffer[dy * width + dx] = color;
                }
            }
        }
    }
}

/// Draw lines `spacing` pixels apart, stopping at the bottom edge
#[allow(clippy::too_many_arguments)]
pub fn draw_text_lines<S: AsRef<str>>(
    buffer: &mut [u32],
    width: usize,
    height: usize,
    lines: &[S],
    x: usize,
    y: usize,
    scale: usize,
    spacing: usize,
    color: u32,
) {
    for (i, line) in lines.iter().enumerate() {
        let top = y + i * spacing;
        if top + FONT_HEIGHT * scale > height {
            break;
        }
        draw_text(buffer, width, height, line.as_ref(), x, top, scale, color);
    }
}

fn draw_centered(
    buffer: &mut [u32],
    width: usize,
    height: usize,
    text: &str,
    y: usize,
    scale: usize,
    color: u32,
) {
    let x = width.saturating_sub(text_width(text, scale)) / 2;
    draw_text(buffer, width, height, text, x, y, scale, color);
}

/// Nearest-neighbour upscale of a `src_w` x `src_h` frame
pub fn upscale(src: &[u32], src_w: usize, src_h: usize, scale: usize) -> Vec<u32> {
    let width = src_w * scale;
    let mut out = vec![0; width * src_h * scale];
    for (y, row) in out.chunks_exact_mut(width).enumerate() {
        let src_row = &src[(y / scale) * src_w..(y / scale + 1) * src_w];
        for (x, px) in row.iter_mut().enumerate() {
            *px = src_row[x / scale];
        }
    }
    out
}

/// Screen shown while no program is mounted
pub fn create_splash_screen(width: usize, height: usize) -> Vec<u32> {
    let mut buffer = vec![BACKGROUND; width * height];
    let line = FONT_HEIGHT * 2 + 8;

    let logo_y = height / 4;
    draw_centered(&mut buffer, width, height, "HEMU8", logo_y, 4, TITLE);
    let subtitle_y = logo_y + FONT_HEIGHT * 4 + 12;
    draw_centered(&mut buffer, width, height, "CHIP-8 Interpreter", subtitle_y, 2, TITLE);

    let inst_y = height * 3 / 5;
    draw_centered(&mut buffer, width, height, "No program loaded", inst_y, 2, TEXT);
    for (i, text) in ["Run: hemu8 path/to/rom.ch8", "Press F1 for help"]
        .iter()
        .enumerate()
    {
        draw_centered(&mut buffer, width, height, text, inst_y + line * (i + 1), 2, TEXT);
    }

    buffer
}

/// Hotkeys and the keypad layout
pub fn help_lines() -> Vec<String> {
    let mut lines = vec![
        "HEMU8 - Help".to_string(),
        String::new(),
        "Keypad:".to_string(),
    ];
    const ROWS: [[u8; 4]; 4] = [
        [0x1, 0x2, 0x3, 0xC],
        [0x4, 0x5, 0x6, 0xD],
        [0x7, 0x8, 0x9, 0xE],
        [0xA, 0x0, 0xB, 0xF],
    ];
    for row in ROWS {
        let keys: Vec<&str> = row.iter().map(|&k| key_label(k)).collect();
        let pad: Vec<String> = row.iter().map(|k| format!("{:X}", k)).collect();
        lines.push(format!("  {}  =  {}", keys.join(" "), pad.join(" ")));
    }
    lines.extend(
        [
            "",
            "Ctrl+R Reset     Ctrl+P Pause",
            "Ctrl+S Quick save Ctrl+L Quick load",
            "Ctrl+F Favorite",
            "F5 Save slot  F6 Next slot  F7 Load slot",
            "F1 Help       Esc Quit",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    lines
}

pub fn create_help_overlay(width: usize, height: usize) -> Vec<u32> {
    let mut buffer = vec![OVERLAY; width * height];
    let spacing = FONT_HEIGHT * 2 + 4;
    draw_text_lines(&mut buffer, width, height, &help_lines(), 16, 16, 2, spacing, TEXT);
    buffer
}

/// Status message on a dark bar along the bottom edge
pub fn draw_status(buffer: &mut [u32], width: usize, height: usize, text: &str) {
    let bar = FONT_HEIGHT * 2 + 8;
    let top = height.saturating_sub(bar);
    for px in &mut buffer[top * width..] {
        *px = OVERLAY;
    }
    draw_text(buffer, width, height, text, 8, top + 4, 2, TEXT);
}
