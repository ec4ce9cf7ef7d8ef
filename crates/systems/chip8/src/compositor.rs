//! Visual display model.
//!
//! The machine's framebuffer is strictly on/off. Phosphor-style ghosting is
//! a presentation effect: the compositor keeps a per-pixel intensity that
//! jumps to full brightness while a pixel is lit and fades by a constant
//! factor once it goes dark. It reads the logical framebuffer and never
//! writes back to it.

use emu_core::logging::{log, LogCategory, LogLevel};

use crate::constants::{
    DEFAULT_DECAY_FACTOR, DISPLAY_HEIGHT, DISPLAY_PIXELS, DISPLAY_WIDTH, INTENSITY_EPSILON,
};
use crate::framebuffer::FrameBuffer;

#[derive(Debug, Clone)]
pub struct Compositor {
    intensities: Vec<f32>,
    decay_factor: f32,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(DEFAULT_DECAY_FACTOR)
    }
}

impl Compositor {
    pub fn new(decay_factor: f32) -> Self {
        Self {
            intensities: vec![0.0; DISPLAY_PIXELS],
            decay_factor: decay_factor.clamp(0.0, 1.0),
        }
    }

    /// Fold one frame of logical pixels into the visual buffer.
    ///
    /// Lit pixels go to 1.0. Unlit pixels are multiplied by the decay factor
    /// when `decay_enabled`, otherwise they drop straight to 0.0.
    pub fn composite(&mut self, framebuffer: &FrameBuffer, decay_enabled: bool) -> &[f32] {
        let fade = if decay_enabled { self.decay_factor } else { 0.0 };
        for (intensity, &lit) in self.intensities.iter_mut().zip(framebuffer.pixels()) {
            *intensity = if lit { 1.0 } else { *intensity * fade };
        }
        &self.intensities
    }

    /// Current intensities, row-major
    pub fn intensities(&self) -> &[f32] {
        &self.intensities
    }

    pub fn intensity(&self, x: usize, y: usize) -> f32 {
        self.intensities[(y % DISPLAY_HEIGHT) * DISPLAY_WIDTH + (x % DISPLAY_WIDTH)]
    }

    /// Drop all afterglow
    pub fn clear(&mut self) {
        self.intensities.fill(0.0);
    }

    pub fn decay_factor(&self) -> f32 {
        self.decay_factor
    }

    pub fn set_decay_factor(&mut self, factor: f32) {
        let clamped = factor.clamp(0.0, 1.0);
        if clamped != factor {
            log(LogCategory::Display, LogLevel::Warn, || {
                format!("decay factor {} clamped to {}", factor, clamped)
            });
        }
        self.decay_factor = clamped;
    }

    /// Renderers paint the background for pixels that are not visible
    #[inline]
    pub fn is_visible(intensity: f32) -> bool {
        intensity > INTENSITY_EPSILON
    }
}
