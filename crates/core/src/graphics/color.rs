//! Colour helpers for mapping display intensities onto ARGB8888 pixels.
//!
//! Colours are `0xAARRGGBB`. Profiles store them as `#rrggbb` strings, so
//! parsing and formatting of that form live here too.

/// Colour operation utilities
pub struct ColorOps;

impl ColorOps {
    /// Linear interpolation between two ARGB colors
    ///
    /// * `c0` - colour at `t = 0.0`
    /// * `c1` - colour at `t = 1.0`
    /// * `t` - interpolation factor, clamped to [0, 1]
    ///
    /// ```
    /// use emu_core::graphics::ColorOps;
    ///
    /// let background = 0xFF0A140A;
    /// let foreground = 0xFF00FF00;
    /// assert_eq!(ColorOps::lerp(background, foreground, 1.0), foreground);
    /// ```
    #[inline]
    pub fn lerp(c0: u32, c1: u32, t: f32) -> u32 {
        let t = t.clamp(0.0, 1.0);
        let channel = |shift: u32| {
            let a = ((c0 >> shift) & 0xFF) as f32;
            let b = ((c1 >> shift) & 0xFF) as f32;
            ((a + (b - a) * t).round() as u32) << shift
        };
        channel(24) | channel(16) | channel(8) | channel(0)
    }

    /// Parse `#rrggbb` (leading `#` optional) into an opaque colour
    pub fn parse_hex(s: &str) -> Option<u32> {
        let digits = s.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(digits, 16)
            .ok()
            .map(|rgb| 0xFF000000 | rgb)
    }

    /// Format the RGB part of a colour as `#rrggbb`
    pub fn to_hex(color: u32) -> String {
        format!("#{:06x}", color & 0x00FF_FFFF)
    }

    /// Fully saturated colour at 50% lightness for a hue in degrees
    pub fn from_hue(degrees: f32) -> u32 {
        let h = degrees.rem_euclid(360.0) / 60.0;
        let x = 1.0 - ((h % 2.0) - 1.0).abs();
        let (r, g, b) = match h as u32 {
            0 => (1.0, x, 0.0),
            1 => (x, 1.0, 0.0),
            2 => (0.0, 1.0, x),
            3 => (0.0, x, 1.0),
            4 => (x, 0.0, 1.0),
            _ => (1.0, 0.0, x),
        };
        let to_byte = |v: f32| (v * 255.0).round() as u8;
        Self::from_rgb(to_byte(r), to_byte(g), to_byte(b))
    }

    #[inline]
    pub fn red(color: u32) -> u8 {
        ((color >> 16) & 0xFF) as u8
    }

    #[inline]
    pub fn green(color: u32) -> u8 {
        ((color >> 8) & 0xFF) as u8
    }

    #[inline]
    pub fn blue(color: u32) -> u8 {
        (color & 0xFF) as u8
    }

    #[inline]
    pub fn alpha(color: u32) -> u8 {
        ((color >> 24) & 0xFF) as u8
    }

    /// Construct RGB color with full alpha
    #[inline]
    pub fn from_rgb(r: u8, g: u8, b: u8) -> u32 {
        0xFF000000 | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
    }
}
