//! Logical 64x32 monochrome framebuffer.
//!
//! This is the machine's own pixel state: each pixel is on or off, and only
//! the clear and draw instructions change it. Visual effects are layered on
//! top by the [`Compositor`](crate::Compositor) and never written back here.

use crate::constants::{DISPLAY_HEIGHT, DISPLAY_PIXELS, DISPLAY_WIDTH};

/// Row-major grid of logical pixels, indexed `y * DISPLAY_WIDTH + x`.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: [bool; DISPLAY_PIXELS],
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("lit", &self.lit_count())
            .finish()
    }
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            pixels: [false; DISPLAY_PIXELS],
        }
    }

    pub(crate) fn from_pixels(pixels: [bool; DISPLAY_PIXELS]) -> Self {
        Self { pixels }
    }

    /// Pixel state; coordinates wrap around the screen edges
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.pixels[Self::index(x, y)]
    }

    pub fn clear(&mut self) {
        self.pixels = [false; DISPLAY_PIXELS];
    }

    /// XOR one pixel on; returns true if it was lit and is now off (collision)
    #[inline]
    pub fn toggle(&mut self, x: usize, y: usize) -> bool {
        let pixel = &mut self.pixels[Self::index(x, y)];
        let was_lit = *pixel;
        *pixel = !was_lit;
        was_lit
    }

    pub fn pixels(&self) -> &[bool] {
        &self.pixels
    }

    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|&&p| p).count()
    }

    pub fn is_blank(&self) -> bool {
        !self.pixels.iter().any(|&p| p)
    }

    /// Rows of the screen as text, `#` for lit and `.` for unlit
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity((DISPLAY_WIDTH + 1) * DISPLAY_HEIGHT);
        for row in self.pixels.chunks(DISPLAY_WIDTH) {
            out.extend(row.iter().map(|&p| if p { '#' } else { '.' }));
            out.push('\n');
        }
        out
    }

    #[inline]
    fn index(x: usize, y: usize) -> usize {
        (y % DISPLAY_HEIGHT) * DISPLAY_WIDTH + (x % DISPLAY_WIDTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_blank() {
        let fb = FrameBuffer::new();
        assert!(fb.is_blank());
        assert_eq!(fb.pixels().len(), DISPLAY_PIXELS);
    }

    #[test]
    fn test_toggle_reports_collision() {
        let mut fb = FrameBuffer::new();
        assert!(!fb.toggle(3, 4));
        assert!(fb.get(3, 4));
        assert!(fb.toggle(3, 4));
        assert!(!fb.get(3, 4));
    }

    #[test]
    fn test_coordinates_wrap() {
        let mut fb = FrameBuffer::new();
        fb.toggle(DISPLAY_WIDTH + 1, DISPLAY_HEIGHT + 2);
        assert!(fb.get(1, 2));
    }

    #[test]
    fn test_clear() {
        let mut fb = FrameBuffer::new();
        fb.toggle(0, 0);
        fb.toggle(63, 31);
        assert_eq!(fb.lit_count(), 2);
        fb.clear();
        assert!(fb.is_blank());
    }

    #[test]
    fn test_to_text() {
        let mut fb = FrameBuffer::new();
        fb.toggle(0, 0);
        let text = fb.to_text();
        let first_line = text.lines().next().unwrap();
        assert_eq!(first_line.len(), DISPLAY_WIDTH);
        assert!(first_line.starts_with("#."));
        assert_eq!(text.lines().count(), DISPLAY_HEIGHT);
    }
}
